//! Expiry subsystem: delayed trigger and periodic sweep.
//!
//! Both paths converge on the engine's idempotent expire operation, so
//! duplicate delivery is harmless and lost delivery is recovered:
//!
//! - the **trigger** ([`QueueScheduler`] feeding an [`ExpiryWorker`]) fires
//!   once per created hold as soon as its deadline passes. Low latency,
//!   best-effort only.
//! - the **sweep** ([`ExpirySweeper`]) periodically scans for `PENDING`
//!   bookings past their deadline. Guaranteed to run eventually.
//!
//! Both tasks run until a shutdown signal arrives on their
//! [`tokio::sync::watch`] channel.

use crate::config::SweepConfig;
use crate::engine::ReservationEngine;
use boxoffice_core::environment::{ExpiryScheduler, ScheduleError};
use boxoffice_core::types::BookingId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// One pending expiry trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryJob {
    /// Booking to expire
    pub booking_id: BookingId,
    /// When the hold lapses
    pub deadline: DateTime<Utc>,
}

/// Production [`ExpiryScheduler`]: pushes jobs onto a bounded in-process
/// queue consumed by an [`ExpiryWorker`].
///
/// `try_send` keeps scheduling non-blocking: a full queue is reported as a
/// [`ScheduleError`], which the engine logs and swallows. The sweep covers
/// the lost trigger.
#[derive(Clone)]
pub struct QueueScheduler {
    jobs: mpsc::Sender<ExpiryJob>,
}

impl QueueScheduler {
    /// Creates the scheduler and the receiving end for its worker.
    #[must_use]
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<ExpiryJob>) {
        let (jobs, rx) = mpsc::channel(capacity);
        (Self { jobs }, rx)
    }
}

#[async_trait]
impl ExpiryScheduler for QueueScheduler {
    async fn schedule(
        &self,
        booking_id: BookingId,
        deadline: DateTime<Utc>,
    ) -> Result<(), ScheduleError> {
        self.jobs
            .try_send(ExpiryJob {
                booking_id,
                deadline,
            })
            .map_err(|err| match err {
                mpsc::error::TrySendError::Full(_) => ScheduleError::QueueFull,
                mpsc::error::TrySendError::Closed(_) => ScheduleError::Closed,
            })
    }
}

/// Consumes [`ExpiryJob`]s and delivers each once its deadline passes.
///
/// Each job sleeps on its own spawned task, so one long deadline never
/// delays another. Delivery is best-effort: jobs die with the process,
/// which is exactly why the sweep exists.
pub struct ExpiryWorker {
    engine: Arc<ReservationEngine>,
    jobs: mpsc::Receiver<ExpiryJob>,
    shutdown: watch::Receiver<bool>,
}

impl ExpiryWorker {
    /// Creates a worker and the sender used to shut it down.
    #[must_use]
    pub fn new(
        engine: Arc<ReservationEngine>,
        jobs: mpsc::Receiver<ExpiryJob>,
    ) -> (Self, watch::Sender<bool>) {
        let (shutdown_tx, shutdown) = watch::channel(false);
        (
            Self {
                engine,
                jobs,
                shutdown,
            },
            shutdown_tx,
        )
    }

    /// Run until the job queue closes or shutdown is signalled.
    pub async fn run(mut self) {
        info!("expiry worker started");
        loop {
            tokio::select! {
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        break;
                    }
                }
                job = self.jobs.recv() => {
                    let Some(job) = job else { break };
                    debug!(booking_id = %job.booking_id, deadline = %job.deadline, "expiry trigger queued");
                    let engine = Arc::clone(&self.engine);
                    tokio::spawn(deliver(engine, job));
                }
            }
        }
        info!("expiry worker stopped");
    }
}

/// Sleep out the remaining hold window, then expire.
async fn deliver(engine: Arc<ReservationEngine>, job: ExpiryJob) {
    let remaining = (job.deadline - engine.clock().now())
        .to_std()
        .unwrap_or(Duration::ZERO);
    tokio::time::sleep(remaining).await;

    match engine.expire_hold(job.booking_id).await {
        Ok(()) => {
            metrics::counter!("boxoffice.expiry.trigger_delivered").increment(1);
        }
        Err(err) => {
            // Sweep retries; the trigger does not.
            warn!(booking_id = %job.booking_id, error = %err, "expiry trigger failed");
        }
    }
}

/// Periodic sweep for lapsed holds the trigger missed.
///
/// The correctness backstop: runs on a fixed interval, expires at most one
/// batch per pass, and tolerates individual failures.
pub struct ExpirySweeper {
    engine: Arc<ReservationEngine>,
    interval: Duration,
    batch_size: u32,
    shutdown: watch::Receiver<bool>,
}

impl ExpirySweeper {
    /// Creates a sweeper and the sender used to shut it down.
    #[must_use]
    pub fn new(engine: Arc<ReservationEngine>, config: &SweepConfig) -> (Self, watch::Sender<bool>) {
        let (shutdown_tx, shutdown) = watch::channel(false);
        (
            Self {
                engine,
                interval: Duration::from_secs(config.interval_secs),
                batch_size: config.batch_size,
                shutdown,
            },
            shutdown_tx,
        )
    }

    /// Run until shutdown is signalled.
    pub async fn run(mut self) {
        info!(interval_secs = self.interval.as_secs(), "expiry sweeper started");
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    self.sweep_once().await;
                }
            }
        }
        info!("expiry sweeper stopped");
    }

    /// One sweep pass; public so tests can drive the sweep deterministically.
    pub async fn sweep_once(&self) {
        match self.engine.expire_due(self.batch_size).await {
            Ok(0) => {}
            Ok(expired) => {
                metrics::counter!("boxoffice.expiry.swept").increment(expired as u64);
                info!(expired, "sweep released lapsed holds");
            }
            Err(err) => {
                warn!(error = %err, "sweep pass failed");
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scheduler_delivers_jobs_to_the_queue() {
        let (scheduler, mut rx) = QueueScheduler::new(4);
        let booking_id = BookingId::new();
        let deadline = Utc::now();

        scheduler.schedule(booking_id, deadline).await.unwrap();

        let job = rx.recv().await.unwrap();
        assert_eq!(job.booking_id, booking_id);
        assert_eq!(job.deadline, deadline);
    }

    #[tokio::test]
    async fn full_queue_reports_queue_full() {
        let (scheduler, _rx) = QueueScheduler::new(1);
        scheduler.schedule(BookingId::new(), Utc::now()).await.unwrap();

        let err = scheduler
            .schedule(BookingId::new(), Utc::now())
            .await
            .unwrap_err();
        assert_eq!(err, ScheduleError::QueueFull);
    }

    #[tokio::test]
    async fn closed_queue_reports_closed() {
        let (scheduler, rx) = QueueScheduler::new(1);
        drop(rx);

        let err = scheduler
            .schedule(BookingId::new(), Utc::now())
            .await
            .unwrap_err();
        assert_eq!(err, ScheduleError::Closed);
    }
}
