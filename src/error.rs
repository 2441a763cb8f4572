use thiserror::Error;

/// Failures raised by the attendance workflow.
///
/// `Fetch` and `DataShape` are degraded to a notice by the session; the rest surface to the
/// caller as IPC errors.
#[derive(Debug, Error)]
pub enum AttendanceError {
    #[error("{0}")]
    Validation(String),
    #[error("failed to read {what}: {message}")]
    Fetch { what: &'static str, message: String },
    #[error("failed to write {what}: {message}")]
    Write { what: &'static str, message: String },
    #[error("malformed {what} document {key}: {message}")]
    DataShape {
        what: &'static str,
        key: String,
        message: String,
    },
    #[error("status is fixed to {0} for this day type")]
    StatusLocked(&'static str),
    #[error("student {0} is not on the current roster")]
    UnknownStudent(String),
    #[error("request generation {given} is stale (current {current})")]
    StaleGeneration { given: u64, current: u64 },
}

impl AttendanceError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_failed",
            Self::Fetch { .. } => "fetch_failed",
            Self::Write { .. } => "write_failed",
            Self::DataShape { .. } => "data_shape",
            Self::StatusLocked(_) => "status_locked",
            Self::UnknownStudent(_) => "not_found",
            Self::StaleGeneration { .. } => "stale_generation",
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
