use thiserror::Error;

use crate::common::error::HwqError::GenericError;

#[derive(Debug, Error)]
pub enum HwqError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Deserialization error: {0}")]
    DeserializationError(String),
    #[error(transparent)]
    CoreError(#[from] hwq_core::Error),
    #[error("Error: {0}")]
    GenericError(String),
}

impl HwqError {
    pub fn is_retryable(&self) -> bool {
        match self {
            HwqError::CoreError(e) => e.is_retryable(),
            _ => false,
        }
    }
}

impl From<serde_json::error::Error> for HwqError {
    fn from(e: serde_json::error::Error) -> Self {
        Self::SerializationError(e.to_string())
    }
}

impl From<anyhow::Error> for HwqError {
    fn from(error: anyhow::Error) -> Self {
        Self::GenericError(error.to_string())
    }
}

impl From<toml::de::Error> for HwqError {
    fn from(error: toml::de::Error) -> Self {
        Self::DeserializationError(error.to_string())
    }
}

pub fn error<T>(message: String) -> crate::Result<T> {
    Err(GenericError(message))
}

impl From<String> for HwqError {
    fn from(e: String) -> Self {
        GenericError(e)
    }
}
