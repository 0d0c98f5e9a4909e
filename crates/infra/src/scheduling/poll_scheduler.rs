//! Interval scheduler for provider reconciliation jobs.
//!
//! Registers up to two repeated jobs on a [`JobScheduler`]: polling the
//! provider for incoming faxes and refreshing the status of in-flight
//! outbound jobs. Which jobs run is decided by the module configuration.

use std::sync::Arc;
use std::time::Duration;

use faxgate_core::FaxService;
use faxgate_domain::constants::DEFAULT_POLL_INTERVAL_SECS;
use faxgate_domain::{FaxConfig, FaxJobFilter};
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::scheduling::error::{SchedulerError, SchedulerResult};

/// Configuration for the poll scheduler.
#[derive(Debug, Clone)]
pub struct PollSchedulerConfig {
    /// Interval between job executions.
    pub poll_interval: Duration,
    /// Register the incoming-fax poll job.
    pub incoming_polling: bool,
    /// Register the in-flight status refresh job.
    pub status_polling: bool,
    /// Timeout applied to a single job execution.
    pub job_timeout: Duration,
    /// Timeout for starting the underlying scheduler.
    pub start_timeout: Duration,
    /// Timeout for stopping the scheduler.
    pub stop_timeout: Duration,
}

impl Default for PollSchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            incoming_polling: false,
            status_polling: false,
            job_timeout: Duration::from_secs(120),
            start_timeout: Duration::from_secs(5),
            stop_timeout: Duration::from_secs(5),
        }
    }
}

impl PollSchedulerConfig {
    /// Derive the schedule from the module configuration.
    pub fn from_fax_config(config: &FaxConfig) -> Self {
        Self {
            poll_interval: Duration::from_secs(config.poll_interval_secs.max(1)),
            incoming_polling: config.enable_incoming_polling,
            status_polling: config.enable_status_polling,
            ..Self::default()
        }
    }

    /// True when at least one job would be registered.
    pub fn is_active(&self) -> bool {
        self.incoming_polling || self.status_polling
    }
}

/// Poll scheduler with explicit lifecycle management.
pub struct PollScheduler {
    config: PollSchedulerConfig,
    service: Arc<FaxService>,
    scheduler: Option<JobScheduler>,
    cancellation: CancellationToken,
}

impl PollScheduler {
    /// Create a scheduler; no jobs run until [`PollScheduler::start`].
    pub fn new(config: PollSchedulerConfig, service: Arc<FaxService>) -> Self {
        Self { config, service, scheduler: None, cancellation: CancellationToken::new() }
    }

    /// Start the scheduler and register the configured jobs.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.scheduler.is_some() {
            return Err(SchedulerError::AlreadyRunning);
        }

        // Jobs capture the token, so refresh it before building them.
        self.cancellation = CancellationToken::new();

        let scheduler = JobScheduler::new()
            .await
            .map_err(|err| SchedulerError::CreationFailed(err.to_string()))?;

        if self.config.incoming_polling {
            let job = self.incoming_poll_job()?;
            scheduler
                .add(job)
                .await
                .map_err(|err| SchedulerError::JobRegistrationFailed(err.to_string()))?;
        }
        if self.config.status_polling {
            let job = self.status_refresh_job()?;
            scheduler
                .add(job)
                .await
                .map_err(|err| SchedulerError::JobRegistrationFailed(err.to_string()))?;
        }

        let start_timeout = self.config.start_timeout;
        tokio::time::timeout(start_timeout, scheduler.start())
            .await
            .map_err(|_| SchedulerError::Timeout { seconds: start_timeout.as_secs() })?
            .map_err(|err| SchedulerError::StartFailed(err.to_string()))?;

        self.scheduler = Some(scheduler);

        info!(
            interval_secs = self.config.poll_interval.as_secs(),
            incoming_polling = self.config.incoming_polling,
            status_polling = self.config.status_polling,
            "poll scheduler started"
        );
        Ok(())
    }

    /// Stop the scheduler and cancel pending job executions.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        let Some(mut scheduler) = self.scheduler.take() else {
            return Err(SchedulerError::NotRunning);
        };

        self.cancellation.cancel();

        let stop_timeout = self.config.stop_timeout;
        tokio::time::timeout(stop_timeout, scheduler.shutdown())
            .await
            .map_err(|_| SchedulerError::Timeout { seconds: stop_timeout.as_secs() })?
            .map_err(|err| SchedulerError::StopFailed(err.to_string()))?;

        info!("poll scheduler stopped");
        Ok(())
    }

    /// True while the underlying scheduler is running.
    pub fn is_running(&self) -> bool {
        self.scheduler.is_some()
    }

    fn incoming_poll_job(&self) -> SchedulerResult<Job> {
        let service = self.service.clone();
        let cancel = self.cancellation.clone();
        let job_timeout = self.config.job_timeout;

        Job::new_repeated_async(self.config.poll_interval, move |_id, _lock| {
            let service = service.clone();
            let cancel = cancel.clone();
            Box::pin(async move {
                if cancel.is_cancelled() {
                    return;
                }
                match tokio::time::timeout(job_timeout, service.poll_incoming_faxes()).await {
                    Ok(Ok(inserted)) => {
                        debug!(inserted, "scheduled incoming poll finished");
                    }
                    Ok(Err(err)) => {
                        error!(error = %err, "scheduled incoming poll failed");
                    }
                    Err(_) => {
                        warn!(
                            timeout_secs = job_timeout.as_secs(),
                            "scheduled incoming poll timed out"
                        );
                    }
                }
            })
        })
        .map_err(|err| SchedulerError::JobRegistrationFailed(err.to_string()))
    }

    fn status_refresh_job(&self) -> SchedulerResult<Job> {
        let service = self.service.clone();
        let cancel = self.cancellation.clone();
        let job_timeout = self.config.job_timeout;

        Job::new_repeated_async(self.config.poll_interval, move |_id, _lock| {
            let service = service.clone();
            let cancel = cancel.clone();
            Box::pin(async move {
                if cancel.is_cancelled() {
                    return;
                }
                let filter = FaxJobFilter::default();
                let refresh = service.list_jobs(&filter);
                match tokio::time::timeout(job_timeout, refresh).await {
                    Ok(Ok(jobs)) => {
                        debug!(jobs = jobs.len(), "scheduled status refresh finished");
                    }
                    Ok(Err(err)) => {
                        error!(error = %err, "scheduled status refresh failed");
                    }
                    Err(_) => {
                        warn!(
                            timeout_secs = job_timeout.as_secs(),
                            "scheduled status refresh timed out"
                        );
                    }
                }
            })
        })
        .map_err(|err| SchedulerError::JobRegistrationFailed(err.to_string()))
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        if self.scheduler.is_some() {
            warn!("poll scheduler dropped while running; cancelling jobs");
            self.cancellation.cancel();
        }
    }
}
