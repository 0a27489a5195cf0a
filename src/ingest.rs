//! Ingestors: fetch a payload for one city, flatten it into flat records
//! and persist it as a named snapshot.

use chrono::{NaiveDate, NaiveDateTime};
use log::{info, warn};
use crate::city::City;
use crate::config::Config;
use crate::errors::IngestError;
use crate::manager_meteo::Meteo;
use crate::models::open_meteo::{CurrentValues, DailySeries, HourlySeries};
use crate::parameters::Parameter;
use crate::store::{save_records, Record, SnapshotId, KIND_ACTUAL, KIND_DAILY, KIND_HOURLY};

/// Fetches the hourly forecast for a city and persists it as one record per
/// forecast timestamp, identified by the fetch time
///
/// # Arguments
///
/// * 'config' - the application configuration
/// * 'meteo' - the Open-Meteo manager
/// * 'city' - the city to fetch for
/// * 'now' - the fetch time, embedded in the snapshot identifier
pub fn ingest_hourly_forecast(
    config: &Config,
    meteo: &Meteo,
    city: City,
    now: NaiveDateTime,
) -> Result<SnapshotId, IngestError> {
    let payload = meteo.hourly_forecast(&config.geo_ref(city), config.fetch.hourly_days)?;
    let records = flatten_hourly(&payload.hourly);

    let id = SnapshotId::timestamped(KIND_HOURLY, city, now);
    save_records(&config.files.hourly_dir, &id.to_string(), &records)?;
    info!("saved hourly forecast for {} ({} rows)", city, records.len());

    Ok(id)
}

/// Fetches the daily forecast for a city and persists it as one record per
/// forecast date, identified by the fetch date
///
/// # Arguments
///
/// * 'config' - the application configuration
/// * 'meteo' - the Open-Meteo manager
/// * 'city' - the city to fetch for
/// * 'today' - the fetch date, embedded in the snapshot identifier
pub fn ingest_daily_forecast(
    config: &Config,
    meteo: &Meteo,
    city: City,
    today: NaiveDate,
) -> Result<SnapshotId, IngestError> {
    let payload = meteo.daily_forecast(&config.geo_ref(city), config.fetch.daily_days)?;
    let records = flatten_daily(&payload.daily);

    let id = SnapshotId::dated(KIND_DAILY, city, today);
    save_records(&config.files.daily_dir, &id.to_string(), &records)?;
    info!("saved daily forecast for {} ({} rows)", city, records.len());

    Ok(id)
}

/// Fetches the current weather for a city and persists it as a one-record
/// snapshot carrying both the fetch time and the API's own measurement time
///
/// Returns None without error when the payload carries no current weather
/// block, which counts as no new data this cycle.
///
/// # Arguments
///
/// * 'config' - the application configuration
/// * 'meteo' - the Open-Meteo manager
/// * 'city' - the city to fetch for
/// * 'now' - the fetch time, embedded in the snapshot identifier
pub fn ingest_observation(
    config: &Config,
    meteo: &Meteo,
    city: City,
    now: NaiveDateTime,
) -> Result<Option<SnapshotId>, IngestError> {
    let payload = meteo.current_weather(&config.geo_ref(city))?;

    let Some(values) = payload.current_weather else {
        warn!("no current weather block for {}, skipping", city);
        return Ok(None);
    };

    let record = observation_record(&values, now);
    let id = SnapshotId::timestamped(KIND_ACTUAL, city, now);
    save_records(&config.files.actual_dir, &id.to_string(), &[record])?;
    info!("saved observation for {}", city);

    Ok(Some(id))
}

/// Transposes the parallel arrays of an hourly payload into one record per
/// timestamp. Null values become empty cells, not zeros.
fn flatten_hourly(series: &HourlySeries) -> Vec<Record> {
    series
        .time
        .iter()
        .enumerate()
        .map(|(i, time)| {
            let mut record = Record::new();
            record.set("time", time.clone());
            for parameter in Parameter::HOURLY {
                record.set(parameter.as_str(), cell(series.values(parameter), i));
            }
            record
        })
        .collect()
}

/// Transposes the parallel arrays of a daily payload into one record per date
fn flatten_daily(series: &DailySeries) -> Vec<Record> {
    series
        .time
        .iter()
        .enumerate()
        .map(|(i, time)| {
            let mut record = Record::new();
            record.set("time", time.clone());
            for parameter in Parameter::DAILY {
                record.set(parameter.as_str(), cell(series.values(parameter), i));
            }
            record
        })
        .collect()
}

fn cell(values: &[Option<f64>], i: usize) -> String {
    values
        .get(i)
        .copied()
        .flatten()
        .map(|v| v.to_string())
        .unwrap_or_default()
}

fn observation_record(values: &CurrentValues, fetched: NaiveDateTime) -> Record {
    let mut record = Record::new();
    record.set("time", values.time.clone());
    record.set("temperature", opt_cell(values.temperature));
    record.set("windspeed", opt_cell(values.windspeed));
    record.set("winddirection", opt_cell(values.winddirection));
    record.set("weathercode", opt_cell(values.weathercode));
    record.set("fetched_time", fetched.format("%Y-%m-%dT%H:%M:%S").to_string());
    // The API's own timestamp, authoritative when aligning to forecasts
    record.set("api_time", values.time.clone());
    record
}

fn opt_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
