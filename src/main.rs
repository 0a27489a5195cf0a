use std::env;
use anyhow::{bail, Context, Result};
use chrono::Local;
use crate::city::City;
use crate::ingest::{ingest_daily_forecast, ingest_hourly_forecast, ingest_observation};
use crate::manager_meteo::Meteo;

mod city;
mod config;
mod errors;
mod horizon;
mod ingest;
mod logging;
mod manager_meteo;
mod metrics;
mod models;
mod parameters;
mod reconcile;
mod store;
mod worker;

const USAGE: &str = "usage: wxscore <fetch|worker|reconcile-hourly|reconcile-daily>";

fn main() -> Result<()> {
    let command = env::args().nth(1).context(USAGE)?;

    let config_path = env::var("WXSCORE_CONFIG").unwrap_or("wxscore.toml".to_string());
    let config = config::load_config(&config_path)
        .with_context(|| format!("loading configuration from {}", config_path))?;

    logging::init(&config.general)?;
    store::init_storage(&config.files)?;

    println!("wxscore version: {}", env!("CARGO_PKG_VERSION"));

    match command.as_str() {
        "fetch" => fetch_once(&config),
        "worker" => worker::run(&config),
        "reconcile-hourly" => {
            reconcile::run_hourly(&config)?;
            Ok(())
        }
        "reconcile-daily" => {
            reconcile::run_daily(&config)?;
            Ok(())
        }
        other => bail!("unknown command '{}'\n{}", other, USAGE),
    }
}

/// One fetch pass over all cities, for use from an external scheduler.
/// Per-city failures are logged and the pass continues; the command only
/// fails when every city failed.
fn fetch_once(config: &config::Config) -> Result<()> {
    let meteo = Meteo::new(&config.fetch.timezone);
    let now = Local::now().naive_local();

    let mut failures = 0;
    for city in City::ALL {
        let mut failed = false;

        if let Err(e) = ingest_hourly_forecast(config, &meteo, city, now) {
            log::error!("hourly forecast fetch failed for {}: {}", city, e);
            failed = true;
        }
        if let Err(e) = ingest_daily_forecast(config, &meteo, city, now.date()) {
            log::error!("daily forecast fetch failed for {}: {}", city, e);
            failed = true;
        }
        if let Err(e) = ingest_observation(config, &meteo, city, now) {
            log::error!("observation fetch failed for {}: {}", city, e);
            failed = true;
        }

        if failed {
            failures += 1;
        }
    }

    if failures == City::ALL.len() {
        bail!("all {} cities failed to fetch", failures);
    }
    Ok(())
}
