use std::collections::BTreeMap;
use std::fs;
use std::str::FromStr;
use log::LevelFilter;
use serde::Deserialize;
use crate::city::City;
use crate::errors::ConfigError;

#[derive(Deserialize, Debug, Clone, Copy)]
pub struct GeoRef {
    pub lat: f64,
    pub long: f64,
}

#[derive(Deserialize)]
pub struct FetchParameters {
    /// Days of hourly forecast to request per fetch (48 hourly entries for 2)
    pub hourly_days: u32,
    /// Days of daily forecast to request per fetch
    pub daily_days: u32,
    /// IANA timezone the API is queried in; snapshot timestamps are local
    /// to this zone
    pub timezone: String,
}

#[derive(Deserialize)]
pub struct Files {
    pub hourly_dir: String,
    pub daily_dir: String,
    pub actual_dir: String,
    pub results_dir: String,
}

#[derive(Deserialize)]
pub struct General {
    pub log_path: String,
    pub log_level: LevelFilter,
    pub log_to_stdout: bool,
    /// Worker fetch cadence in minutes
    pub interval_minutes: u64,
}

#[derive(Deserialize)]
pub struct Config {
    pub general: General,
    pub fetch: FetchParameters,
    pub files: Files,
    pub cities: BTreeMap<String, GeoRef>,
}

impl Config {
    /// Returns the configured coordinates for a city.
    ///
    /// Cannot fail after 'load_config' since the city table is validated
    /// against the full city set at load time.
    pub fn geo_ref(&self, city: City) -> GeoRef {
        self.cities[city.as_str()]
    }
}

/// Loads the configuration file and returns a struct with all configuration items
///
/// # Arguments
///
/// * 'config_path' - path to the configuration file
pub fn load_config(config_path: &str) -> Result<Config, ConfigError> {

    let toml = fs::read_to_string(config_path)?;
    let config: Config = toml::from_str(&toml)?;

    for name in config.cities.keys() {
        if City::from_str(name).is_err() {
            return Err(ConfigError::Invalid(format!("unknown city in config: {}", name)));
        }
    }
    for city in City::ALL {
        if !config.cities.contains_key(city.as_str()) {
            return Err(ConfigError::Invalid(format!("missing coordinates for {}", city)));
        }
    }
    if config.general.interval_minutes == 0 {
        return Err(ConfigError::from("interval_minutes must be at least 1"));
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_toml() -> String {
        r#"
            [general]
            log_path = "wxscore.log"
            log_level = "info"
            log_to_stdout = true
            interval_minutes = 60

            [fetch]
            hourly_days = 2
            daily_days = 10
            timezone = "Europe/Ljubljana"

            [files]
            hourly_dir = "data/hourly_forecasts"
            daily_dir = "data/daily_forecasts"
            actual_dir = "data/actual_data"
            results_dir = "data/results"

            [cities.Koper]
            lat = 45.5469
            long = 13.7290

            [cities.Ljubljana]
            lat = 46.0569
            long = 14.5058

            [cities.Maribor]
            lat = 46.5547
            long = 15.6459
        "#
        .to_string()
    }

    fn write_config(toml: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(toml.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_full_config() {
        let file = write_config(&sample_toml());
        let config = load_config(file.path().to_str().unwrap()).unwrap();

        assert_eq!(config.fetch.hourly_days, 2);
        assert_eq!(config.general.interval_minutes, 60);
        let geo = config.geo_ref(City::Maribor);
        assert!((geo.lat - 46.5547).abs() < 1e-9);
    }

    #[test]
    fn test_missing_city_rejected() {
        let toml = sample_toml().replace("[cities.Maribor]", "[cities.Celje]");
        let file = write_config(&toml);
        assert!(load_config(file.path().to_str().unwrap()).is_err());
    }
}
