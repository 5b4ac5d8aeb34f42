use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by the location store and the match service
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocatorError {
    #[error("Facility source unavailable ({source_name}): {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    #[error("Invalid coordinate: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("Invalid radius: {0} km")]
    InvalidRadius(f64),
}

/// Stable, serializable name of a [`LocatorError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    SourceUnavailable,
    InvalidCoordinate,
    InvalidRadius,
}

impl LocatorError {
    pub fn source_unavailable(source_name: impl Into<String>, reason: impl ToString) -> Self {
        LocatorError::SourceUnavailable {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LocatorError::SourceUnavailable { .. } => ErrorKind::SourceUnavailable,
            LocatorError::InvalidCoordinate { .. } => ErrorKind::InvalidCoordinate,
            LocatorError::InvalidRadius(_) => ErrorKind::InvalidRadius,
        }
    }

    /// Request-level errors are the caller's fault and leave the service healthy
    pub fn is_request_error(&self) -> bool {
        !matches!(self, LocatorError::SourceUnavailable { .. })
    }
}

/// Why a source row was left out of the store
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    #[error("invalid latitude {0:?}")]
    InvalidLatitude(String),

    #[error("invalid longitude {0:?}")]
    InvalidLongitude(String),

    #[error("missing name")]
    MissingName,

    #[error("malformed row: {0}")]
    Malformed(String),
}
