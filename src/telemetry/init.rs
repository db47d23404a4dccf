// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Subscriber setup.
//!
//! Logs go to stderr so they never interleave with the transcript on stdout.
//! When `RUST_LOG` is set it replaces the preset's filter entirely.

use std::io;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// HTTP stack crates that are noisy below `warn`.
const QUIET_DEPENDENCIES: &[&str] = &["hyper=warn", "hyper_util=warn", "reqwest=warn", "rustyline=warn"];

/// Line layout of the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One line per event, fields inline.
    Compact,
    /// Default fmt layout, with span context.
    Full,
}

/// How the tracing subscriber is built.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Level for huddle's own events.
    pub level: Level,
    pub format: LogFormat,
    /// Emit span enter/close events (tool executions, completions).
    pub span_events: bool,
    /// Include file and line of each event.
    pub source_location: bool,
    pub show_target: bool,
    pub ansi: bool,
    /// Extra `EnvFilter` directives appended after the level.
    pub directives: Vec<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Compact,
            span_events: false,
            source_location: false,
            show_target: true,
            ansi: true,
            directives: quiet_dependencies(),
        }
    }
}

fn quiet_dependencies() -> Vec<String> {
    QUIET_DEPENDENCIES.iter().map(|d| (*d).to_string()).collect()
}

impl TelemetryConfig {
    /// Debug output with span events and source locations.
    pub fn development() -> Self {
        Self {
            level: Level::DEBUG,
            format: LogFormat::Full,
            span_events: true,
            source_location: true,
            ..Self::default()
        }
    }

    /// Warnings only, plain text.
    pub fn production() -> Self {
        Self {
            level: Level::WARN,
            show_target: false,
            ansi: false,
            ..Self::default()
        }
    }

    /// Everything from huddle, nothing from dependencies.
    pub fn testing() -> Self {
        Self {
            level: Level::WARN,
            format: LogFormat::Full,
            span_events: true,
            source_location: true,
            ansi: false,
            directives: vec!["huddle=trace".to_string()],
            ..Self::default()
        }
    }

    /// Pick a preset from the CLI verbosity flags.
    pub fn for_verbosity(verbose: bool, debug: bool, trace: bool) -> Self {
        if trace {
            Self {
                level: Level::TRACE,
                ..Self::development()
            }
        } else if debug {
            Self::development()
        } else if verbose {
            Self::default()
        } else {
            Self::production()
        }
    }

    /// Filter directive used when `RUST_LOG` is not set.
    pub fn directive(&self) -> String {
        std::iter::once(self.level.as_str().to_lowercase())
            .chain(self.directives.iter().cloned())
            .collect::<Vec<_>>()
            .join(",")
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(self.directive()))
            .unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))
    }
}

/// Returned by [`init_telemetry`]; keep it alive for the life of the program.
///
/// With the `telemetry` feature, dropping it logs the session metrics report
/// at debug level.
pub struct TelemetryGuard {
    _private: (),
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        #[cfg(feature = "telemetry")]
        tracing::debug!("{}", super::metrics::GLOBAL_METRICS.snapshot().format_report());
    }
}

/// Install the global subscriber. Call once, at startup.
pub fn init_telemetry(config: &TelemetryConfig) -> io::Result<TelemetryGuard> {
    let span_events = if config.span_events {
        FmtSpan::ENTER | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let fmt_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(config.ansi)
        .with_target(config.show_target)
        .with_file(config.source_location)
        .with_line_number(config.source_location)
        .with_span_events(span_events);

    let registry = tracing_subscriber::registry().with(config.filter());
    let installed = match config.format {
        LogFormat::Compact => registry.with(fmt_layer.compact()).try_init(),
        LogFormat::Full => registry.with(fmt_layer).try_init(),
    };
    installed.map_err(|e| io::Error::other(e.to_string()))?;

    Ok(TelemetryGuard { _private: () })
}
