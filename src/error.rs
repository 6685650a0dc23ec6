use thiserror::Error;

pub use anyhow::Context;

use crate::fetch::{FailureKind, FetchFailure, OrchestratorFault};
use crate::services::AdmissionError;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Admission(#[from] AdmissionError),
    #[error(transparent)]
    Fetch(#[from] FetchFailure),
    #[error(transparent)]
    Orchestrator(#[from] OrchestratorFault),
    #[error("{0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn message<T: Into<String>>(msg: T) -> Self {
        AppError::Message(msg.into())
    }

    pub fn invalid_request<T: Into<String>>(msg: T) -> Self {
        AppError::InvalidRequest(msg.into())
    }

    /// Kind of the upstream failure behind this error, if there is one.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            AppError::Fetch(failure) => Some(failure.kind()),
            _ => None,
        }
    }
}
