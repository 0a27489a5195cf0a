//! Reconciliation of forecast snapshots against observed outcomes.
//!
//! Forecasts and observations are collected by independent jobs at different
//! cadences, so neither side can assume the other exists. The engine joins
//! the two by (city, target hour), labels every joined pair with its lead
//! time, resolves overlapping forecasts for the same lead time and scores
//! each (city, parameter, horizon) bucket.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use log::{info, warn};
use crate::city::City;
use crate::config::Config;
use crate::errors::StoreError;
use crate::horizon::{horizon_hours, MAX_HORIZON_HOURS, MIN_HORIZON_HOURS};
use crate::metrics::{mae, mape, rmse};
use crate::parameters::{canonical_observation_column, Parameter};
use crate::store::{list_snapshots, load_records_from, save_records, Record, SnapshotId, KIND_ACTUAL, KIND_DAILY, KIND_HOURLY};

/// Report identifiers under the results directory
const HOURLY_REPORT: &str = "hourly_horizon_accuracy";
const DAILY_REPORT: &str = "daily_accuracy_results";

/// One forecast snapshot, reduced to what reconciliation needs: who issued
/// it for which city and when, plus its rows. Parameters a row has no
/// numeric value for are simply absent from the map.
#[derive(Debug, Clone)]
pub struct ForecastSnapshot {
    pub city: City,
    pub generation: NaiveDateTime,
    pub rows: Vec<ForecastRow>,
}

#[derive(Debug, Clone)]
pub struct ForecastRow {
    pub target: NaiveDateTime,
    pub values: BTreeMap<Parameter, f64>,
}

/// One observed truth row, already normalized: source-specific field names
/// renamed to canonical parameters and the timestamp floored to the hour.
#[derive(Debug, Clone)]
pub struct Observation {
    pub city: City,
    pub time: NaiveDateTime,
    pub values: BTreeMap<Parameter, f64>,
}

/// One scored (city, parameter, horizon) bucket. Metrics are None when
/// undefined, never zero.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRow {
    pub city: City,
    pub parameter: Parameter,
    pub horizon_hours: i64,
    pub mae: Option<f64>,
    pub rmse: Option<f64>,
    pub mape: Option<f64>,
    pub count: usize,
}

/// Per-city tally of what happened to the rows of a run. Skips are counted
/// by reason and reported in one summary log line instead of being raised
/// and caught one by one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CitySummary {
    /// Forecast snapshots whose identifier could not be parsed
    pub malformed_snapshots: usize,
    /// Rows without a parseable target time
    pub missing_time: usize,
    /// Forecast rows scanned by the engine
    pub rows: usize,
    /// Rows outside the supported horizon window
    pub out_of_window: usize,
    /// Rows with no observation for their target time (expected; the truth
    /// usually lags behind the forecast)
    pub unmatched: usize,
    /// Parameter pairs where only one side had a numeric value
    pub missing_value: usize,
    /// Comparisons replaced by a later forecast for the same bucket
    pub superseded: usize,
    /// Comparisons that survived into scoring
    pub compared: usize,
}

impl CitySummary {
    fn merge_load(&mut self, stats: LoadStats) {
        self.malformed_snapshots += stats.malformed_snapshots;
        self.missing_time += stats.missing_time;
    }
}

/// Counters from the load stage, merged into the city summary
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadStats {
    pub malformed_snapshots: usize,
    pub missing_time: usize,
}

/// Joins forecast rows to observations, deduplicates and scores.
///
/// Dedup key is (city, parameter, horizon, target time); when several
/// snapshots land in the same bucket the one with the latest generation time
/// wins. Equal generation times are resolved in favour of the snapshot later
/// in 'forecasts', so callers passing snapshots in identifier order get a
/// deterministic last-ingested-wins rule.
///
/// Output is sorted by (city, parameter, horizon) ascending.
///
/// # Arguments
///
/// * 'forecasts' - forecast snapshots, any cities, any order of rows
/// * 'observations' - normalized observations; on duplicate (city, time)
///   the first one in the slice wins
/// * 'parameters' - the canonical parameters to compare
/// * 'window' - horizon window to retain, or None for no constraint
pub fn reconcile(
    forecasts: &[ForecastSnapshot],
    observations: &[Observation],
    parameters: &[Parameter],
    window: Option<RangeInclusive<i64>>,
) -> (Vec<MetricRow>, BTreeMap<City, CitySummary>) {
    let mut summaries: BTreeMap<City, CitySummary> = BTreeMap::new();

    let mut truth: BTreeMap<(City, NaiveDateTime), &BTreeMap<Parameter, f64>> = BTreeMap::new();
    for obs in observations {
        truth.entry((obs.city, obs.time)).or_insert(&obs.values);
    }

    // Dedup map; the BTreeMap key order is exactly the report sort order,
    // with the target time as the innermost grouping component.
    let mut survivors: BTreeMap<(City, Parameter, i64, NaiveDateTime), (NaiveDateTime, f64, f64)> =
        BTreeMap::new();

    for snapshot in forecasts {
        let summary = summaries.entry(snapshot.city).or_default();

        for row in &snapshot.rows {
            summary.rows += 1;

            let horizon = horizon_hours(snapshot.generation, row.target);
            if window.as_ref().is_some_and(|w| !w.contains(&horizon)) {
                summary.out_of_window += 1;
                continue;
            }

            let Some(actuals) = truth.get(&(snapshot.city, row.target)) else {
                summary.unmatched += 1;
                continue;
            };

            for &parameter in parameters {
                match (row.values.get(&parameter), actuals.get(&parameter)) {
                    (Some(&forecast), Some(&actual)) => {
                        let key = (snapshot.city, parameter, horizon, row.target);
                        match survivors.get(&key) {
                            Some(&(generation, _, _)) if snapshot.generation < generation => {
                                summary.superseded += 1;
                            }
                            Some(_) => {
                                summary.superseded += 1;
                                survivors.insert(key, (snapshot.generation, forecast, actual));
                            }
                            None => {
                                survivors.insert(key, (snapshot.generation, forecast, actual));
                            }
                        }
                    }
                    (Some(_), None) | (None, Some(_)) => summary.missing_value += 1,
                    (None, None) => {}
                }
            }
        }
    }

    // One ordered pass over the survivors emits groups in final sort order
    let mut rows = Vec::new();
    let mut current: Option<(City, Parameter, i64)> = None;
    let mut actual = Vec::new();
    let mut forecast = Vec::new();

    let mut flush = |group: Option<(City, Parameter, i64)>, actual: &mut Vec<f64>, forecast: &mut Vec<f64>| {
        if let Some((city, parameter, horizon)) = group {
            rows.push(MetricRow {
                city,
                parameter,
                horizon_hours: horizon,
                mae: mae(actual, forecast),
                rmse: rmse(actual, forecast),
                mape: mape(actual, forecast),
                count: actual.len(),
            });
            actual.clear();
            forecast.clear();
        }
    };

    for (&(city, parameter, horizon, _), &(_, f, a)) in &survivors {
        let group = (city, parameter, horizon);
        if current != Some(group) {
            flush(current, &mut actual, &mut forecast);
            current = Some(group);
        }
        actual.push(a);
        forecast.push(f);
        summaries.entry(city).or_default().compared += 1;
    }
    flush(current, &mut actual, &mut forecast);

    (rows, summaries)
}

/// Loads all hourly forecast snapshots for a city. A snapshot with a
/// malformed identifier is skipped as a whole since its generation time,
/// and with it every horizon, is unknown; so is one whose body cannot be
/// read, leaving the rest of the batch intact.
///
/// # Arguments
///
/// * 'config' - the application configuration
/// * 'city' - the city to load for
pub fn load_hourly_forecasts(
    config: &Config,
    city: City,
) -> Result<(Vec<ForecastSnapshot>, LoadStats), StoreError> {
    let mut stats = LoadStats::default();
    let mut snapshots = Vec::new();

    let pattern = format!("{}_{}_*.csv", KIND_HOURLY, city);
    for path in list_snapshots(&config.files.hourly_dir, &pattern)? {
        let id = match SnapshotId::from_path(&path) {
            Ok(id) => id,
            Err(e) => {
                warn!("skipping snapshot {}: {}", path.display(), e);
                stats.malformed_snapshots += 1;
                continue;
            }
        };

        let records = match load_records_from(&path) {
            Ok(records) => records,
            Err(e) => {
                warn!("skipping snapshot {}: {}", path.display(), e);
                stats.malformed_snapshots += 1;
                continue;
            }
        };

        let mut rows = Vec::new();
        for record in records {
            let Some(target) = record.get("time").and_then(parse_time) else {
                stats.missing_time += 1;
                continue;
            };

            let mut values = BTreeMap::new();
            for parameter in Parameter::HOURLY {
                if let Some(value) = record.numeric(parameter.as_str()) {
                    values.insert(parameter, value);
                }
            }
            rows.push(ForecastRow { target, values });
        }

        snapshots.push(ForecastSnapshot { city, generation: id.generation_time(), rows });
    }

    Ok((snapshots, stats))
}

/// Loads and normalizes all observation snapshots for a city: source field
/// names are renamed to canonical parameters and the API-reported time is
/// floored to the hour. On several observations within the same hour the
/// earliest is kept, being closest to the instant the forecast predicted.
///
/// # Arguments
///
/// * 'config' - the application configuration
/// * 'city' - the city to load for
pub fn load_observations(
    config: &Config,
    city: City,
) -> Result<(Vec<Observation>, LoadStats), StoreError> {
    let mut stats = LoadStats::default();
    let mut timed = Vec::new();

    let pattern = format!("{}_{}_*.csv", KIND_ACTUAL, city);
    for path in list_snapshots(&config.files.actual_dir, &pattern)? {
        if let Err(e) = SnapshotId::from_path(&path) {
            warn!("skipping snapshot {}: {}", path.display(), e);
            stats.malformed_snapshots += 1;
            continue;
        }

        let records = match load_records_from(&path) {
            Ok(records) => records,
            Err(e) => {
                warn!("skipping snapshot {}: {}", path.display(), e);
                stats.malformed_snapshots += 1;
                continue;
            }
        };

        for record in records {
            let api_time = record.get("api_time").or_else(|| record.get("time"));
            let Some(time) = api_time.and_then(parse_time) else {
                stats.missing_time += 1;
                continue;
            };

            let mut values = BTreeMap::new();
            for column in record.columns() {
                let canonical = canonical_observation_column(column);
                if let Some(parameter) = Parameter::from_canonical(canonical) {
                    if let Some(value) = record.numeric(column) {
                        values.insert(parameter, value);
                    }
                }
            }
            timed.push((time, values));
        }
    }

    // Earliest first, so the engine's first-wins indexing keeps the
    // observation closest to each hour boundary
    timed.sort_by_key(|(time, _)| *time);
    let observations = timed
        .into_iter()
        .map(|(time, values)| Observation { city, time: floor_to_hour(time), values })
        .collect();

    Ok((observations, stats))
}

/// Loads all daily forecast snapshots for a city. Each row becomes a
/// midnight-to-midnight comparison target; with generation pinned to
/// midnight of the issue date, day offsets map onto whole-day horizons
/// (24h, 48h, ...).
pub fn load_daily_forecasts(
    config: &Config,
    city: City,
) -> Result<(Vec<ForecastSnapshot>, LoadStats), StoreError> {
    let mut stats = LoadStats::default();
    let mut snapshots = Vec::new();

    let pattern = format!("{}_{}_*.csv", KIND_DAILY, city);
    for path in list_snapshots(&config.files.daily_dir, &pattern)? {
        let id = match SnapshotId::from_path(&path) {
            Ok(id) => id,
            Err(e) => {
                warn!("skipping snapshot {}: {}", path.display(), e);
                stats.malformed_snapshots += 1;
                continue;
            }
        };

        let records = match load_records_from(&path) {
            Ok(records) => records,
            Err(e) => {
                warn!("skipping snapshot {}: {}", path.display(), e);
                stats.malformed_snapshots += 1;
                continue;
            }
        };

        let mut rows = Vec::new();
        for record in records {
            let target = record
                .get("time")
                .and_then(|t| NaiveDate::parse_from_str(t, "%Y-%m-%d").ok());
            let Some(target) = target else {
                stats.missing_time += 1;
                continue;
            };

            let mut values = BTreeMap::new();
            for parameter in Parameter::DAILY {
                if let Some(value) = record.numeric(parameter.as_str()) {
                    values.insert(parameter, value);
                }
            }
            rows.push(ForecastRow { target: target.and_time(NaiveTime::MIN), values });
        }

        snapshots.push(ForecastSnapshot { city, generation: id.generation_time(), rows });
    }

    Ok((snapshots, stats))
}

/// Builds daily truth rows by aggregating each day's observation snapshots.
///
/// The current weather feed carries temperature and wind speed, so the
/// computable daily truths are min/max/mean temperature and max wind speed.
/// Daily parameters with no observable counterpart (precipitation sum,
/// mean cloud cover) stay absent and drop out through the paired presence
/// rule rather than being guessed.
pub fn load_daily_observations(
    config: &Config,
    city: City,
) -> Result<(Vec<Observation>, LoadStats), StoreError> {
    let (hourly, stats) = load_observations(config, city)?;

    let mut per_day: BTreeMap<NaiveDate, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for obs in hourly {
        let (temps, winds) = per_day.entry(obs.time.date()).or_default();
        if let Some(&t) = obs.values.get(&Parameter::Temperature2m) {
            temps.push(t);
        }
        if let Some(&w) = obs.values.get(&Parameter::WindSpeed10m) {
            winds.push(w);
        }
    }

    let mut observations = Vec::new();
    for (date, (temps, winds)) in per_day {
        let mut values = BTreeMap::new();
        if !temps.is_empty() {
            values.insert(Parameter::TemperatureMin, temps.iter().cloned().fold(f64::INFINITY, f64::min));
            values.insert(Parameter::TemperatureMax, temps.iter().cloned().fold(f64::NEG_INFINITY, f64::max));
            values.insert(Parameter::TemperatureMean, temps.iter().sum::<f64>() / temps.len() as f64);
        }
        if !winds.is_empty() {
            values.insert(Parameter::WindSpeedMax, winds.iter().cloned().fold(f64::NEG_INFINITY, f64::max));
        }
        if !values.is_empty() {
            observations.push(Observation { city, time: date.and_time(NaiveTime::MIN), values });
        }
    }

    Ok((observations, stats))
}

/// Runs the hourly reconciliation over every city and writes the report.
///
/// A malformed snapshot or an absent city never aborts the batch; each city
/// ends with one summary log line. Returns the report rows.
pub fn run_hourly(config: &Config) -> Result<Vec<MetricRow>, StoreError> {
    let mut forecasts = Vec::new();
    let mut observations = Vec::new();
    let mut load_stats: BTreeMap<City, LoadStats> = BTreeMap::new();

    for city in City::ALL {
        let (f, fs) = load_hourly_forecasts(config, city)?;
        let (o, os) = load_observations(config, city)?;
        forecasts.extend(f);
        observations.extend(o);
        let entry = load_stats.entry(city).or_default();
        entry.malformed_snapshots += fs.malformed_snapshots + os.malformed_snapshots;
        entry.missing_time += fs.missing_time + os.missing_time;
    }

    let (rows, summaries) = reconcile(
        &forecasts,
        &observations,
        &Parameter::HOURLY,
        Some(MIN_HORIZON_HOURS..=MAX_HORIZON_HOURS),
    );

    log_summaries(&summaries, &load_stats);
    write_report(config, HOURLY_REPORT, &rows)?;

    Ok(rows)
}

/// Runs the daily reconciliation over every city and writes the report.
/// Horizons are whole days expressed in hours, with no upper bound.
pub fn run_daily(config: &Config) -> Result<Vec<MetricRow>, StoreError> {
    let mut forecasts = Vec::new();
    let mut observations = Vec::new();
    let mut load_stats: BTreeMap<City, LoadStats> = BTreeMap::new();

    for city in City::ALL {
        let (f, fs) = load_daily_forecasts(config, city)?;
        let (o, os) = load_daily_observations(config, city)?;
        forecasts.extend(f);
        observations.extend(o);
        let entry = load_stats.entry(city).or_default();
        entry.malformed_snapshots += fs.malformed_snapshots + os.malformed_snapshots;
        entry.missing_time += fs.missing_time + os.missing_time;
    }

    // Day-ahead forecasts only; rows for the issue date itself are horizon 0
    let (rows, summaries) = reconcile(
        &forecasts,
        &observations,
        &Parameter::DAILY,
        Some(24..=i64::MAX),
    );

    log_summaries(&summaries, &load_stats);
    write_report(config, DAILY_REPORT, &rows)?;

    Ok(rows)
}

fn log_summaries(summaries: &BTreeMap<City, CitySummary>, load_stats: &BTreeMap<City, LoadStats>) {
    for city in City::ALL {
        let mut summary = summaries.get(&city).copied().unwrap_or_default();
        if let Some(&stats) = load_stats.get(&city) {
            summary.merge_load(stats);
        }
        info!(
            "{}: {} rows processed, {} compared, skipped: {} malformed snapshots, \
             {} without target time, {} out of window, {} without observation, \
             {} missing values, {} superseded",
            city,
            summary.rows,
            summary.compared,
            summary.malformed_snapshots,
            summary.missing_time,
            summary.out_of_window,
            summary.unmatched,
            summary.missing_value,
            summary.superseded,
        );
    }
}

/// Writes the report rows through the record store. Undefined metrics render
/// as empty cells; an empty result set is a warning, not an error.
fn write_report(config: &Config, name: &str, rows: &[MetricRow]) -> Result<(), StoreError> {
    if rows.is_empty() {
        warn!("no comparable data, report {} has zero rows", name);
        return Ok(());
    }

    let records = rows
        .iter()
        .map(|row| {
            let mut record = Record::new();
            record.set("city", row.city.to_string());
            record.set("parameter", row.parameter.to_string());
            record.set("horizon_hours", row.horizon_hours.to_string());
            record.set("mae", metric_cell(row.mae));
            record.set("rmse", metric_cell(row.rmse));
            record.set("mape", metric_cell(row.mape));
            record.set("count", row.count.to_string());
            record
        })
        .collect::<Vec<Record>>();

    save_records(&config.files.results_dir, name, &records)?;
    info!("report {} written with {} rows", name, records.len());

    Ok(())
}

fn metric_cell(value: Option<f64>) -> String {
    value.map(|v| format!("{:.4}", v)).unwrap_or_default()
}

fn floor_to_hour(time: NaiveDateTime) -> NaiveDateTime {
    time.date()
        .and_hms_opt(time.hour(), 0, 0)
        .unwrap_or(time)
}

fn parse_time(text: &str) -> Option<NaiveDateTime> {
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(time) = NaiveDateTime::parse_from_str(text, format) {
            return Some(time);
        }
    }
    None
}
