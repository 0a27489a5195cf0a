use serde::Deserialize;
use crate::parameters::Parameter;

/// Payload of the hourly forecast endpoint. Each series is a parallel array
/// aligned with 'time'; entries the model has no value for come back as null
/// and stay None here.
#[derive(Deserialize)]
pub struct HourlyForecast {
    pub hourly: HourlySeries,
}

#[derive(Deserialize, Default)]
pub struct HourlySeries {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    pub precipitation: Vec<Option<f64>>,
    #[serde(default)]
    pub cloudcover: Vec<Option<f64>>,
    #[serde(default)]
    pub windspeed_10m: Vec<Option<f64>>,
}

impl HourlySeries {
    pub fn values(&self, parameter: Parameter) -> &[Option<f64>] {
        match parameter {
            Parameter::Temperature2m => &self.temperature_2m,
            Parameter::Precipitation => &self.precipitation,
            Parameter::CloudCover => &self.cloudcover,
            Parameter::WindSpeed10m => &self.windspeed_10m,
            _ => &[],
        }
    }
}

/// Payload of the daily forecast endpoint
#[derive(Deserialize)]
pub struct DailyForecast {
    pub daily: DailySeries,
}

#[derive(Deserialize, Default)]
pub struct DailySeries {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    pub temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    pub temperature_2m_mean: Vec<Option<f64>>,
    #[serde(default)]
    pub precipitation_sum: Vec<Option<f64>>,
    #[serde(default)]
    pub cloudcover_mean: Vec<Option<f64>>,
    #[serde(default)]
    pub windspeed_10m_max: Vec<Option<f64>>,
}

impl DailySeries {
    pub fn values(&self, parameter: Parameter) -> &[Option<f64>] {
        match parameter {
            Parameter::TemperatureMin => &self.temperature_2m_min,
            Parameter::TemperatureMax => &self.temperature_2m_max,
            Parameter::TemperatureMean => &self.temperature_2m_mean,
            Parameter::PrecipitationSum => &self.precipitation_sum,
            Parameter::CloudCoverMean => &self.cloudcover_mean,
            Parameter::WindSpeedMax => &self.windspeed_10m_max,
            _ => &[],
        }
    }
}

/// Payload of the current weather endpoint. The 'time' field is the API's
/// own timestamp for the measurement and is authoritative for alignment,
/// as opposed to the wall-clock time the fetch happened at.
#[derive(Deserialize)]
pub struct CurrentWeather {
    pub current_weather: Option<CurrentValues>,
}

#[derive(Deserialize)]
pub struct CurrentValues {
    pub time: String,
    pub temperature: Option<f64>,
    pub windspeed: Option<f64>,
    pub winddirection: Option<f64>,
    pub weathercode: Option<f64>,
}
