// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Logging and metrics.
//!
//! - **Tracing**: `tracing` events from the orchestrator, tools and HTTP client,
//!   rendered by a `tracing-subscriber` fmt layer on stderr.
//! - **Metrics**: in-process counters for completions, tokens, tool calls and
//!   loop events (delegations, approvals, ceiling stops).
//!
//! ```rust,ignore
//! use huddle::telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(&TelemetryConfig::default())?;
//! ```
//!
//! Recording metrics is gated on the `telemetry` feature; the types are always
//! available so callers can read snapshots unconditionally.

mod init;
pub mod metrics;

pub use init::{init_telemetry, LogFormat, TelemetryConfig, TelemetryGuard};
pub use metrics::{Histogram, LoopEvent, Metrics, MetricsSnapshot, OperationMetrics, ToolMetrics, GLOBAL_METRICS};
