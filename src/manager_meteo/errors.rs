use thiserror::Error;

/// Errors from the Open-Meteo endpoints. A failed fetch simply means no new
/// data this cycle; retrying is the scheduler's business, not ours.
#[derive(Error, Debug)]
pub enum MeteoError {
    #[error("http request error: {0}")]
    Http(String),
    #[error("json document error: {0}")]
    Document(String),
}

impl From<ureq::Error> for MeteoError {
    fn from(e: ureq::Error) -> MeteoError {
        MeteoError::Http(e.to_string())
    }
}
impl From<serde_json::Error> for MeteoError {
    fn from(e: serde_json::Error) -> MeteoError {
        MeteoError::Document(e.to_string())
    }
}
