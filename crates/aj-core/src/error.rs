use thiserror::Error;

use crate::model_types::ModelType;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Not a model id or catalog URL: {0:?}")]
    InvalidReference(String),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{method} {url} returned HTTP {status}")]
    BadStatus {
        method: &'static str,
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Model {model_id} is a {reported}, expected {expected}")]
    TypeMismatch {
        model_id: String,
        expected: ModelType,
        reported: String,
    },

    #[error("Job has no server-assigned id")]
    MissingJobId,

    #[error("Output directory capability is stale")]
    StaleCapability,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image decode failed: {0}")]
    Decode(#[from] image::ImageError),
}

impl Error {
    /// Transport failures and non-success statuses are both request errors.
    pub fn is_request_error(&self) -> bool {
        matches!(self, Self::Request(_) | Self::BadStatus { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
