use crate::datamodel::MetricStatus;
use crate::spec::ValidationError;
use thiserror::Error;
use uuid::Uuid;

/// Failure categories callers can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorErrorKind {
    AlreadyExists,
    AlreadyMonitored,
    InvalidSpecification,
    NotFound,
    InvalidState,
    InvalidInput,
    BackendFailure,
}

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Metric already exists: uid={uid}")]
    MetricAlreadyExists { uid: Uuid },

    #[error("Metric is already monitored: uid={uid}")]
    MetricAlreadyMonitored { uid: Uuid },

    #[error(transparent)]
    InvalidSpecification(#[from] ValidationError),

    #[error("Metric not found: {metric}")]
    MetricNotFound { metric: String },

    #[error("Metric uid={uid} is in state {status}: {reason}")]
    InvalidState {
        uid: Uuid,
        status: MetricStatus,
        reason: String,
    },

    #[error("Data point {index} has a non-finite value: {value}")]
    InvalidDataPoint { index: usize, value: f64 },

    #[error("Backend failure: {0:#}")]
    Backend(#[from] anyhow::Error),
}

impl MonitorError {
    pub fn kind(&self) -> MonitorErrorKind {
        match self {
            MonitorError::MetricAlreadyExists { .. } => MonitorErrorKind::AlreadyExists,
            MonitorError::MetricAlreadyMonitored { .. } => MonitorErrorKind::AlreadyMonitored,
            MonitorError::InvalidSpecification(_) => MonitorErrorKind::InvalidSpecification,
            MonitorError::MetricNotFound { .. } => MonitorErrorKind::NotFound,
            MonitorError::InvalidState { .. } => MonitorErrorKind::InvalidState,
            MonitorError::InvalidDataPoint { .. } => MonitorErrorKind::InvalidInput,
            MonitorError::Backend(_) => MonitorErrorKind::BackendFailure,
        }
    }

    pub fn not_found(metric: impl ToString) -> Self {
        MonitorError::MetricNotFound {
            metric: metric.to_string(),
        }
    }

    pub fn invalid_state(uid: Uuid, status: MetricStatus, reason: impl Into<String>) -> Self {
        MonitorError::InvalidState {
            uid,
            status,
            reason: reason.into(),
        }
    }

    /// The validation failure, when the spec was rejected.
    pub fn validation_error(&self) -> Option<&ValidationError> {
        match self {
            MonitorError::InvalidSpecification(err) => Some(err),
            _ => None,
        }
    }
}

pub type MonitorResult<T> = Result<T, MonitorError>;
