use std::cmp::Ordering;
use std::fmt;
use std::fmt::Formatter;

/// Canonical weather parameters, named after the forecast-side Open-Meteo
/// field names. The forecast side is authoritative; observation fields with
/// source-specific names are renamed to these before any join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parameter {
    Temperature2m,
    Precipitation,
    CloudCover,
    WindSpeed10m,
    TemperatureMin,
    TemperatureMax,
    TemperatureMean,
    PrecipitationSum,
    CloudCoverMean,
    WindSpeedMax,
}

impl Parameter {
    /// Parameters present in hourly forecast snapshots.
    pub const HOURLY: [Parameter; 4] = [
        Parameter::Temperature2m,
        Parameter::Precipitation,
        Parameter::CloudCover,
        Parameter::WindSpeed10m,
    ];

    /// Parameters present in daily forecast snapshots.
    pub const DAILY: [Parameter; 6] = [
        Parameter::TemperatureMin,
        Parameter::TemperatureMax,
        Parameter::TemperatureMean,
        Parameter::PrecipitationSum,
        Parameter::CloudCoverMean,
        Parameter::WindSpeedMax,
    ];

    /// Looks a parameter up by its canonical name
    pub fn from_canonical(name: &str) -> Option<Parameter> {
        Parameter::HOURLY
            .iter()
            .chain(Parameter::DAILY.iter())
            .copied()
            .find(|p| p.as_str() == name)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Parameter::Temperature2m => "temperature_2m",
            Parameter::Precipitation => "precipitation",
            Parameter::CloudCover => "cloudcover",
            Parameter::WindSpeed10m => "windspeed_10m",
            Parameter::TemperatureMin => "temperature_2m_min",
            Parameter::TemperatureMax => "temperature_2m_max",
            Parameter::TemperatureMean => "temperature_2m_mean",
            Parameter::PrecipitationSum => "precipitation_sum",
            Parameter::CloudCoverMean => "cloudcover_mean",
            Parameter::WindSpeedMax => "windspeed_10m_max",
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Report rows are sorted by the canonical name, so ordering follows the
/// field name rather than enum declaration order.
impl Ord for Parameter {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl PartialOrd for Parameter {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Renames a current-weather field to its canonical parameter name.
///
/// The Open-Meteo current weather block uses shorter names than the hourly
/// forecast block for the same quantities. Columns with no canonical
/// counterpart pass through unchanged.
///
/// # Arguments
///
/// * 'column' - the observation-side column name
pub fn canonical_observation_column(column: &str) -> &str {
    match column {
        "temperature" => "temperature_2m",
        "windspeed" => "windspeed_10m",
        other => other,
    }
}
