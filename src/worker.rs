use std::thread;
use std::time::Duration;
use chrono::{Local, NaiveDate};
use log::{error, info};
use crate::city::City;
use crate::config::Config;
use crate::ingest::{ingest_daily_forecast, ingest_hourly_forecast, ingest_observation};
use crate::manager_meteo::Meteo;

/// Runs the fetch loop: every configured interval, fetch the hourly forecast
/// and the current observation for every city, and the daily forecast once
/// per calendar day. Cities are independent, so each one is fetched on its
/// own thread and a failing city never blocks or aborts the others.
///
/// The loop only ends with the process; reconciliation runs as a separate
/// invocation against whatever snapshots have accumulated.
///
/// # Arguments
///
/// * 'config' - the application configuration
pub fn run(config: &Config) -> ! {
    let interval = Duration::from_secs(config.general.interval_minutes * 60);
    let mut daily_fetched: Option<NaiveDate> = None;

    info!("worker started, fetching every {} minutes", config.general.interval_minutes);

    loop {
        let now = Local::now().naive_local();
        let fetch_daily = daily_fetched != Some(now.date());

        let daily_ok = thread::scope(|scope| {
            let handles: Vec<_> = City::ALL
                .into_iter()
                .map(|city| scope.spawn(move || fetch_city(config, city, fetch_daily)))
                .collect();
            handles.into_iter().any(|h| h.join().is_ok_and(|ok| ok))
        });

        daily_fetched = daily_latch(daily_fetched, now.date(), daily_ok);

        info!("fetch cycle done, sleeping {} minutes", config.general.interval_minutes);
        thread::sleep(interval);
    }
}

/// One fetch cycle for one city. Every failure is logged and dropped; a
/// failed fetch just means no new data this cycle. Returns whether the
/// daily forecast was stored, so the caller can retry it next cycle when
/// no city managed to.
fn fetch_city(config: &Config, city: City, fetch_daily: bool) -> bool {
    let meteo = Meteo::new(&config.fetch.timezone);
    let now = Local::now().naive_local();

    if let Err(e) = ingest_hourly_forecast(config, &meteo, city, now) {
        error!("hourly forecast fetch failed for {}: {}", city, e);
    }

    let mut daily_ok = false;
    if fetch_daily {
        match ingest_daily_forecast(config, &meteo, city, now.date()) {
            Ok(_) => daily_ok = true,
            Err(e) => error!("daily forecast fetch failed for {}: {}", city, e),
        }
    }

    if let Err(e) = ingest_observation(config, &meteo, city, now) {
        error!("observation fetch failed for {}: {}", city, e);
    }

    daily_ok
}

/// Latches the daily forecast only once a fetch actually stored one, so an
/// outage at the first cycle of the day leaves the fetch to a later cycle.
fn daily_latch(
    previous: Option<NaiveDate>,
    today: NaiveDate,
    stored: bool,
) -> Option<NaiveDate> {
    if stored { Some(today) } else { previous }
}
