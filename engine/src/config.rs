//! Configuration for the reservation engine and expiry subsystem.
//!
//! Loads configuration from environment variables with sensible defaults.

use boxoffice_postgres::PostgresConfig;
use serde::{Deserialize, Serialize};
use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// `PostgreSQL` configuration (inventory store and booking ledger)
    pub postgres: PostgresConfig,
    /// Hold lifecycle configuration
    pub reservations: ReservationConfig,
    /// Periodic sweep configuration
    pub sweep: SweepConfig,
    /// Delayed-trigger queue configuration
    pub trigger: TriggerConfig,
}

/// Hold lifecycle configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReservationConfig {
    /// How long a hold stays `PENDING` before it lapses, in seconds
    pub hold_duration_secs: u64,
}

/// Periodic sweep configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Seconds between sweep passes
    pub interval_secs: u64,
    /// Maximum lapsed holds expired per pass
    pub batch_size: u32,
}

/// Delayed-trigger queue configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// Bounded capacity of the in-process expiry queue
    pub queue_capacity: usize,
}

impl Default for ReservationConfig {
    fn default() -> Self {
        Self {
            hold_duration_secs: 120,
        }
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval_secs: 10,
            batch_size: 100,
        }
    }
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to the
    /// `Default` values.
    #[must_use]
    pub fn from_env() -> Self {
        let reservations = ReservationConfig::default();
        let sweep = SweepConfig::default();
        let trigger = TriggerConfig::default();
        Self {
            postgres: PostgresConfig::from_env(),
            reservations: ReservationConfig {
                hold_duration_secs: env::var("HOLD_DURATION_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(reservations.hold_duration_secs),
            },
            sweep: SweepConfig {
                interval_secs: env::var("SWEEP_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(sweep.interval_secs),
                batch_size: env::var("SWEEP_BATCH_SIZE")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(sweep.batch_size),
            },
            trigger: TriggerConfig {
                queue_capacity: env::var("EXPIRY_QUEUE_CAPACITY")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(trigger.queue_capacity),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_hold_contract() {
        // Pinned defaults, independent of the ambient environment.
        let reservations = ReservationConfig::default();
        let sweep = SweepConfig::default();
        let trigger = TriggerConfig::default();

        assert_eq!(reservations.hold_duration_secs, 120);
        assert_eq!(sweep.interval_secs, 10);
        assert_eq!(sweep.batch_size, 100);
        assert_eq!(trigger.queue_capacity, 1024);
        // The sweep runs well inside the hold window.
        assert!(sweep.interval_secs < reservations.hold_duration_secs);
    }
}
