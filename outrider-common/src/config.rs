//! Environment-driven configuration, loaded once and shared immutably.
//!
//! Mirrors the validation-error style of `empath_common::error::ProtocolError`
//! (one `thiserror` enum, descriptive variants) but is sourced from
//! environment variables rather than a RON file, per spec §6.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while loading configuration from the environment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// One or more required string options were not set.
    #[error("missing required configuration: {}", .0.join(", "))]
    MissingRequired(Vec<&'static str>),

    /// A numeric option was present but not a valid positive integer.
    #[error("invalid configuration for {name}: {reason} (got {value:?})")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// The effective, immutable configuration for a worker process.
///
/// Loaded once at startup via [`Config::from_env`] and shared via `Arc`
/// across the supervisor and every worker — no process-wide mutable state,
/// per spec §9.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_host: String,
    pub db_port: String,
    pub db_name: String,
    pub worker_sleep: Duration,
    pub worker_pool: usize,
    pub connection_retries: u32,
    pub connection_timeout: Duration,
    pub send_retries: u32,
    pub send_retry_interval: Duration,
}

struct NumericOption {
    name: &'static str,
    default: u64,
}

const WORKER_SLEEP: NumericOption = NumericOption {
    name: "WORKER_SLEEP",
    default: 10,
};
const WORKER_POOL: NumericOption = NumericOption {
    name: "WORKER_POOL",
    default: 5,
};
const CONNECTION_RETRIES: NumericOption = NumericOption {
    name: "CONNECTION_RETRIES",
    default: 3,
};
const CONNECTION_TIMEOUT: NumericOption = NumericOption {
    name: "CONNECTION_TIMEOUT",
    default: 30,
};
const SEND_RETRIES: NumericOption = NumericOption {
    name: "SEND_RETRIES",
    default: 3,
};
const SEND_RETRY_INTERVAL: NumericOption = NumericOption {
    name: "SEND_RETRY_INTERVAL",
    default: 600,
};

fn read_positive(option: &NumericOption) -> Result<u64, ConfigError> {
    let Ok(raw) = std::env::var(option.name) else {
        return Ok(option.default);
    };

    let parsed: i64 = raw.parse().map_err(|_| ConfigError::InvalidValue {
        name: option.name,
        value: raw.clone(),
        reason: "must be an integer",
    })?;

    if parsed <= 0 {
        return Err(ConfigError::InvalidValue {
            name: option.name,
            value: raw,
            reason: "must be greater than zero",
        });
    }

    Ok(parsed as u64)
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// Required string options (`DB_HOST`, `DB_PORT`, `DB_NAME`) are checked
    /// first; if any are missing, the error names all of them, in table
    /// order (spec §8 scenario C2). Numeric options are then validated in
    /// table order; the first non-positive or unparsable value is reported
    /// (scenario C1).
    ///
    /// # Errors
    /// Returns [`ConfigError`] if a required option is missing or a numeric
    /// option is not a positive integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        let required = [
            ("DB_HOST", std::env::var("DB_HOST")),
            ("DB_PORT", std::env::var("DB_PORT")),
            ("DB_NAME", std::env::var("DB_NAME")),
        ];

        let missing: Vec<&'static str> = required
            .iter()
            .filter(|(_, value)| value.is_err())
            .map(|(name, _)| *name)
            .collect();

        if !missing.is_empty() {
            return Err(ConfigError::MissingRequired(missing));
        }

        let db_host = required[0].1.clone().expect("checked above");
        let db_port = required[1].1.clone().expect("checked above");
        let db_name = required[2].1.clone().expect("checked above");

        let worker_sleep = read_positive(&WORKER_SLEEP)?;
        let worker_pool = read_positive(&WORKER_POOL)?;
        let connection_retries = read_positive(&CONNECTION_RETRIES)?;
        let connection_timeout = read_positive(&CONNECTION_TIMEOUT)?;
        let send_retries = read_positive(&SEND_RETRIES)?;
        let send_retry_interval = read_positive(&SEND_RETRY_INTERVAL)?;

        Ok(Self {
            db_host,
            db_port,
            db_name,
            worker_sleep: Duration::from_secs(worker_sleep),
            worker_pool: worker_pool as usize,
            connection_retries: connection_retries as u32,
            connection_timeout: Duration::from_secs(connection_timeout),
            send_retries: send_retries as u32,
            send_retry_interval: Duration::from_secs(send_retry_interval),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    // Environment variables are process-global, so tests that touch them
    // serialize through this lock to avoid racing each other.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_all() {
        for var in [
            "DB_HOST",
            "DB_PORT",
            "DB_NAME",
            "WORKER_SLEEP",
            "WORKER_POOL",
            "CONNECTION_RETRIES",
            "CONNECTION_TIMEOUT",
            "SEND_RETRIES",
            "SEND_RETRY_INTERVAL",
        ] {
            unsafe { std::env::remove_var(var) };
        }
    }

    #[test]
    fn missing_required_names_all_three_in_order() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();

        let err = Config::from_env().unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingRequired(vec!["DB_HOST", "DB_PORT", "DB_NAME"])
        );
    }

    #[test]
    fn negative_worker_sleep_is_named() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        unsafe {
            std::env::set_var("DB_HOST", "localhost");
            std::env::set_var("DB_PORT", "27017");
            std::env::set_var("DB_NAME", "outrider");
            std::env::set_var("WORKER_SLEEP", "-1");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue { name, .. } => assert_eq!(name, "WORKER_SLEEP"),
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn defaults_are_applied_when_unset() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        unsafe {
            std::env::set_var("DB_HOST", "localhost");
            std::env::set_var("DB_PORT", "27017");
            std::env::set_var("DB_NAME", "outrider");
        }

        let cfg = Config::from_env().unwrap();
        assert_eq!(cfg.worker_sleep, Duration::from_secs(10));
        assert_eq!(cfg.worker_pool, 5);
        assert_eq!(cfg.connection_retries, 3);
        assert_eq!(cfg.connection_timeout, Duration::from_secs(30));
        assert_eq!(cfg.send_retries, 3);
        assert_eq!(cfg.send_retry_interval, Duration::from_secs(600));
    }
}
