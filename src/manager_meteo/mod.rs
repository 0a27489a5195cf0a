mod errors;

use std::time::Duration;
use ureq::Agent;
use crate::config::GeoRef;
use crate::models::open_meteo::{CurrentWeather, DailyForecast, HourlyForecast};
use crate::parameters::Parameter;

pub use errors::MeteoError;

const METEO_DOMAIN: &str = "https://api.open-meteo.com";
const FORECAST_PATH: &str = "/v1/forecast";

/// Struct for fetching weather forecasts and current weather from Open-Meteo
pub struct Meteo {
    agent: Agent,
    timezone: String,
}

impl Meteo {
    /// Returns a Meteo struct ready for fetching from Open-Meteo
    ///
    /// All requests share one agent with a bounded global timeout so no
    /// fetch can stall a batch indefinitely.
    ///
    /// # Arguments
    ///
    /// * 'timezone' - IANA timezone the API reports timestamps in
    pub fn new(timezone: &str) -> Meteo {
        let config = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(10)))
            .build();

        let agent = config.into();

        Meteo { agent, timezone: timezone.to_string() }
    }

    /// Retrieves an hourly forecast for the given coordinates, covering the
    /// next 'days' days (24 entries per day) for all hourly parameters
    ///
    /// # Arguments
    ///
    /// * 'geo' - coordinates of the point to get a forecast for
    /// * 'days' - number of forecast days to request
    pub fn hourly_forecast(&self, geo: &GeoRef, days: u32) -> Result<HourlyForecast, MeteoError> {
        let fields = Parameter::HOURLY.map(|p| p.as_str()).join(",");
        let url = format!(
            "{}{}?latitude={:0.4}&longitude={:0.4}&hourly={}&forecast_days={}&timezone={}",
            METEO_DOMAIN, FORECAST_PATH, geo.lat, geo.long, fields, days, self.timezone
        );

        let json = self.agent
            .get(url)
            .call()?
            .body_mut()
            .read_to_string()?;

        Ok(serde_json::from_str(&json)?)
    }

    /// Retrieves a daily forecast for the given coordinates, covering the
    /// next 'days' days for all daily parameters
    ///
    /// # Arguments
    ///
    /// * 'geo' - coordinates of the point to get a forecast for
    /// * 'days' - number of forecast days to request
    pub fn daily_forecast(&self, geo: &GeoRef, days: u32) -> Result<DailyForecast, MeteoError> {
        let fields = Parameter::DAILY.map(|p| p.as_str()).join(",");
        let url = format!(
            "{}{}?latitude={:0.4}&longitude={:0.4}&daily={}&forecast_days={}&timezone={}",
            METEO_DOMAIN, FORECAST_PATH, geo.lat, geo.long, fields, days, self.timezone
        );

        let json = self.agent
            .get(url)
            .call()?
            .body_mut()
            .read_to_string()?;

        Ok(serde_json::from_str(&json)?)
    }

    /// Retrieves the current weather for the given coordinates
    ///
    /// # Arguments
    ///
    /// * 'geo' - coordinates of the point to get current weather for
    pub fn current_weather(&self, geo: &GeoRef) -> Result<CurrentWeather, MeteoError> {
        let url = format!(
            "{}{}?latitude={:0.4}&longitude={:0.4}&current_weather=true&timezone={}",
            METEO_DOMAIN, FORECAST_PATH, geo.lat, geo.long, self.timezone
        );

        let json = self.agent
            .get(url)
            .call()?
            .body_mut()
            .read_to_string()?;

        Ok(serde_json::from_str(&json)?)
    }
}
