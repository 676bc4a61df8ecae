use thiserror::Error;

#[derive(Debug, Error)]
pub enum OpenMeteoError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("No data: {0}")]
    NoData(String),
}

impl From<reqwest::Error> for OpenMeteoError {
    fn from(err: reqwest::Error) -> Self {
        OpenMeteoError::Network(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum CoordinatesError {
    #[error("Failed to read coordinates: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid coordinates CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Coordinates CSV is missing required column `{0}`")]
    MissingColumn(&'static str),
}
