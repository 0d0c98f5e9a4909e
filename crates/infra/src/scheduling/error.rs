//! Errors raised by the polling scheduler lifecycle

use faxgate_domain::FaxError;
use thiserror::Error;

use crate::errors::InfraError;

/// Failures from starting, stopping or populating the poll scheduler.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// `start` was called on a scheduler that is already running.
    #[error("Scheduler already running")]
    AlreadyRunning,

    /// `stop` was called on a scheduler that was never started.
    #[error("Scheduler not running")]
    NotRunning,

    /// The underlying cron runtime could not be constructed.
    #[error("Failed to create scheduler: {0}")]
    CreationFailed(String),

    #[error("Failed to start scheduler: {0}")]
    StartFailed(String),

    #[error("Failed to stop scheduler: {0}")]
    StopFailed(String),

    /// A polling or refresh job could not be added to the runtime.
    #[error("Failed to register job: {0}")]
    JobRegistrationFailed(String),

    /// Start or stop did not complete within its grace period.
    #[error("Operation timed out after {seconds}s")]
    Timeout { seconds: u64 },
}

impl From<SchedulerError> for InfraError {
    fn from(err: SchedulerError) -> Self {
        InfraError(FaxError::Scheduler(err.to_string()))
    }
}

impl From<SchedulerError> for FaxError {
    fn from(err: SchedulerError) -> Self {
        InfraError::from(err).into()
    }
}

/// Convenience type alias for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;
