//! Scheduling infrastructure for background fax reconciliation
//!
//! Provides the interval scheduler the daemon uses to poll the provider for
//! incoming faxes and to refresh in-flight transmission statuses. Lifecycle
//! is explicit (start/stop), spawned jobs observe a cancellation token, and
//! every job execution is wrapped in a timeout.

pub mod error;
pub mod poll_scheduler;

pub use error::{SchedulerError, SchedulerResult};
pub use poll_scheduler::{PollScheduler, PollSchedulerConfig};
