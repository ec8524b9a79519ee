use serde_json::{Map, Value};
use thiserror::Error;

/// A rejected request: the message plus the offending input echoed back.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub message: String,
    pub details: Map<String, Value>,
}

impl Rejection {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: Map::new(),
        }
    }

    pub fn with(mut self, field: &str, value: Value) -> Self {
        self.details.insert(field.to_string(), value);
        self
    }
}

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{}", .0.message)]
    Validation(Rejection),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Store error: {0}")]
    Store(String),
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        DomainError::Validation(Rejection::new(message))
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        DomainError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        DomainError::Conflict(message.into())
    }
}
