use std::fmt;
use std::fmt::Formatter;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::errors::UnsupportedCity;

/// The fixed set of cities data is collected for.
///
/// Every snapshot on disk embeds one of these names in its identifier, and
/// every fetch call is validated against this set before any network traffic.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum City {
    Koper,
    Ljubljana,
    Maribor,
}

impl City {
    pub const ALL: [City; 3] = [City::Koper, City::Ljubljana, City::Maribor];

    pub fn as_str(&self) -> &'static str {
        match self {
            City::Koper => "Koper",
            City::Ljubljana => "Ljubljana",
            City::Maribor => "Maribor",
        }
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for City {
    type Err = UnsupportedCity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Koper" => Ok(City::Koper),
            "Ljubljana" => Ok(City::Ljubljana),
            "Maribor" => Ok(City::Maribor),
            other => Err(UnsupportedCity(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_names() {
        for city in City::ALL {
            assert_eq!(City::from_str(city.as_str()).unwrap(), city);
        }
    }

    #[test]
    fn test_unknown_city_rejected() {
        let err = City::from_str("Celje").unwrap_err();
        assert!(err.to_string().contains("Celje"));
    }
}
