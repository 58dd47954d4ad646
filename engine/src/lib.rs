//! # Boxoffice Engine
//!
//! The reservation and booking-lifecycle engine: sells finite, perishable
//! inventory to many concurrent buyers without overselling, giving each
//! buyer a temporary, cancellable hold.
//!
//! ## Operations
//!
//! - [`ReservationEngine::create_hold`]: atomically check capacity and
//!   create a time-bounded `PENDING` booking
//! - [`ReservationEngine::confirm_hold`]: promote a hold to a permanent sale
//! - [`ReservationEngine::expire_hold`]: idempotently release a lapsed hold
//!
//! ## Expiry subsystem
//!
//! Two cooperating mechanisms converge on the same idempotent expire
//! operation:
//!
//! - **Trigger** ([`expiry::QueueScheduler`] + [`expiry::ExpiryWorker`]):
//!   a delayed, at-least-once task enqueued when the hold is created. Pure
//!   latency optimization; delivery is best-effort.
//! - **Sweep** ([`expiry::ExpirySweeper`]): a periodic scan for `PENDING`
//!   bookings past their deadline. This is the correctness backstop.
//!
//! ## Wiring
//!
//! ```ignore
//! use boxoffice_engine::{Config, ReservationEngine};
//! use boxoffice_engine::expiry::{ExpirySweeper, ExpiryWorker, QueueScheduler};
//! use boxoffice_core::environment::SystemClock;
//! use std::sync::Arc;
//!
//! let config = Config::from_env();
//! let pool = config.postgres.connect().await?;
//! boxoffice_postgres::migrations::migrate(&pool).await?;
//!
//! let (scheduler, jobs) = QueueScheduler::new(config.trigger.queue_capacity);
//! let engine = Arc::new(ReservationEngine::new(
//!     pool,
//!     Arc::new(SystemClock),
//!     Arc::new(scheduler),
//!     &config.reservations,
//! ));
//!
//! let (worker, worker_shutdown) = ExpiryWorker::new(engine.clone(), jobs);
//! let (sweeper, sweeper_shutdown) = ExpirySweeper::new(engine.clone(), &config.sweep);
//! tokio::spawn(worker.run());
//! tokio::spawn(sweeper.run());
//! ```

pub mod config;
pub mod engine;
pub mod expiry;

pub use config::{Config, ReservationConfig, SweepConfig, TriggerConfig};
pub use engine::ReservationEngine;
