//! Structured logging setup, mirroring `empath_common::logging`.

use chrono::Utc;
use tracing::metadata::LevelFilter;
use tracing_subscriber::{
    filter::FilterFn, fmt::time::FormatTime, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt, Layer,
};

struct Time;

impl FormatTime for Time {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        let time = Utc::now();
        w.write_fmt(format_args!("{:?}", time.timestamp_micros()))
    }
}

#[macro_export]
macro_rules! log {
    ($level:expr, $span:expr, $($msg:expr),*) => {{
        let span = $crate::tracing::span!(target: "outrider", $level, $span);
        let _enter = span.enter();

        $crate::tracing::event!(target: "outrider", $level, $($msg),*)
    }};
}

/// Logs a claim/delivery-relevant event against a record.
#[macro_export]
macro_rules! delivery {
    (level = $level:ident, $($msg:expr),*) => {
        $crate::log!($crate::tracing::Level::$level, "delivery", $($msg),*)
    };

    ($($msg:expr),*) => {
        $crate::delivery!(level = TRACE, $($msg),*)
    };
}

/// Logs a worker lifecycle event (claim, sleep, shutdown).
#[macro_export]
macro_rules! worker {
    (level = $level:ident, $($msg:expr),*) => {
        $crate::log!($crate::tracing::Level::$level, "worker", $($msg),*)
    };

    ($($msg:expr),*) => {
        $crate::worker!(level = TRACE, $($msg),*)
    };
}

/// Logs a store/gateway-level event (connect, redial, query failure).
#[macro_export]
macro_rules! store {
    (level = $level:ident, $($msg:expr),*) => {
        $crate::log!($crate::tracing::Level::$level, "store", $($msg),*)
    };

    ($($msg:expr),*) => {
        $crate::store!(level = TRACE, $($msg),*)
    };
}

/// Initialise the global `tracing` subscriber.
///
/// `LOG_LEVEL` selects the filter (`warn`, `info`, `trace`; anything else,
/// including unset in a release build, falls back to `error`/`info`). Debug
/// builds default to `trace` and keep file/line info; release builds trade
/// those for a quieter compact line.
pub fn init() {
    let level = if let Ok(level) = std::env::var("LOG_LEVEL") {
        match level.to_ascii_lowercase().as_str() {
            "warn" => LevelFilter::WARN,
            "info" => LevelFilter::INFO,
            "trace" => LevelFilter::TRACE,
            _ => LevelFilter::ERROR,
        }
    } else if cfg!(debug_assertions) {
        LevelFilter::TRACE
    } else {
        LevelFilter::INFO
    };

    tracing_subscriber::Registry::default()
        .with(
            (if cfg!(debug_assertions) {
                tracing_subscriber::fmt::layer()
            } else {
                tracing_subscriber::fmt::layer()
                    .with_file(false)
                    .with_line_number(false)
            })
            .compact()
            .with_ansi(true)
            .with_timer(Time)
            .with_target(false)
            .with_level(false)
            .with_filter(level)
            .with_filter(FilterFn::new(|metadata| {
                metadata.target().starts_with("outrider")
            })),
        )
        .init();
}
