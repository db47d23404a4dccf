// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! In-process metrics for orchestration sessions.
//!
//! Lightweight counters and latency histograms, no exporter. The CLI prints a
//! report on request; tests read snapshots directly.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;

/// Global metrics instance.
pub static GLOBAL_METRICS: Lazy<Metrics> = Lazy::new(Metrics::new);

/// Discrete things the orchestration loop counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopEvent {
    /// Hand-over to a non-gated agent.
    Delegation,
    /// Hand-over parked behind the approval gate.
    GatedDelegation,
    Approved,
    Rejected,
    /// Completion call that failed or timed out.
    RemoteFailure,
    /// Turn stopped at the tool-call ceiling.
    ToolCeiling,
    /// Chain stopped at the delegation-depth ceiling.
    DelegationCeiling,
}

const EVENT_KINDS: usize = 7;

impl LoopEvent {
    const ALL: [LoopEvent; EVENT_KINDS] = [
        LoopEvent::Delegation,
        LoopEvent::GatedDelegation,
        LoopEvent::Approved,
        LoopEvent::Rejected,
        LoopEvent::RemoteFailure,
        LoopEvent::ToolCeiling,
        LoopEvent::DelegationCeiling,
    ];

    fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            LoopEvent::Delegation => "delegations",
            LoopEvent::GatedDelegation => "gated delegations",
            LoopEvent::Approved => "approvals",
            LoopEvent::Rejected => "rejections",
            LoopEvent::RemoteFailure => "remote failures",
            LoopEvent::ToolCeiling => "tool ceiling stops",
            LoopEvent::DelegationCeiling => "delegation ceiling stops",
        }
    }
}

/// Central metrics collection.
#[derive(Debug)]
pub struct Metrics {
    /// Tool invocations by tool name.
    tools: RwLock<HashMap<String, ToolMetrics>>,
    /// Latency by operation (`completion.<agent>`, `http.complete`).
    operations: RwLock<HashMap<String, OperationMetrics>>,
    events: [AtomicU64; EVENT_KINDS],
    input_tokens: AtomicU64,
    output_tokens: AtomicU64,
    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            tools: RwLock::new(HashMap::new()),
            operations: RwLock::new(HashMap::new()),
            events: Default::default(),
            input_tokens: AtomicU64::new(0),
            output_tokens: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a tool invocation.
    pub fn record_tool(&self, name: &str, duration: Duration, success: bool) {
        let mut tools = self.tools.write().unwrap_or_else(PoisonError::into_inner);
        tools.entry(name.to_string()).or_default().record(duration, success);
    }

    /// Record the latency of a named operation.
    pub fn record_operation(&self, name: &str, duration: Duration) {
        let mut ops = self.operations.write().unwrap_or_else(PoisonError::into_inner);
        ops.entry(name.to_string()).or_default().record(duration);
    }

    pub fn record_tokens(&self, input: u64, output: u64) {
        self.input_tokens.fetch_add(input, Ordering::Relaxed);
        self.output_tokens.fetch_add(output, Ordering::Relaxed);
    }

    pub fn record_event(&self, event: LoopEvent) {
        self.events[event.index()].fetch_add(1, Ordering::Relaxed);
    }

    pub fn event_count(&self, event: LoopEvent) -> u64 {
        self.events[event.index()].load(Ordering::Relaxed)
    }

    pub fn tool_metrics(&self, name: &str) -> Option<ToolMetrics> {
        self.tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn operation_metrics(&self, name: &str) -> Option<OperationMetrics> {
        self.operations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// `(input, output)` token totals.
    pub fn token_counts(&self) -> (u64, u64) {
        (
            self.input_tokens.load(Ordering::Relaxed),
            self.output_tokens.load(Ordering::Relaxed),
        )
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let (input_tokens, output_tokens) = self.token_counts();
        MetricsSnapshot {
            tools: self.tools.read().unwrap_or_else(PoisonError::into_inner).clone(),
            operations: self
                .operations
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
            events: LoopEvent::ALL
                .iter()
                .map(|&event| (event, self.event_count(event)))
                .collect(),
            input_tokens,
            output_tokens,
            uptime: self.start_time.elapsed(),
        }
    }

    pub fn reset(&self) {
        self.tools.write().unwrap_or_else(PoisonError::into_inner).clear();
        self.operations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        for counter in &self.events {
            counter.store(0, Ordering::Relaxed);
        }
        self.input_tokens.store(0, Ordering::Relaxed);
        self.output_tokens.store(0, Ordering::Relaxed);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Invocation counts and timings for one tool.
#[derive(Debug, Clone, Default)]
pub struct ToolMetrics {
    pub invocations: u64,
    pub failures: u64,
    pub total_duration: Duration,
}

impl ToolMetrics {
    pub fn record(&mut self, duration: Duration, success: bool) {
        self.invocations += 1;
        if !success {
            self.failures += 1;
        }
        self.total_duration += duration;
    }

    pub fn avg_duration(&self) -> Duration {
        if self.invocations == 0 {
            Duration::ZERO
        } else {
            self.total_duration / self.invocations as u32
        }
    }
}

/// Latency record for one operation.
#[derive(Debug, Clone, Default)]
pub struct OperationMetrics {
    pub count: u64,
    pub total_duration: Duration,
    pub max_duration: Duration,
    pub histogram: Histogram,
}

impl OperationMetrics {
    pub fn record(&mut self, duration: Duration) {
        self.count += 1;
        self.total_duration += duration;
        self.max_duration = self.max_duration.max(duration);
        self.histogram.record(duration);
    }

    pub fn avg_duration(&self) -> Duration {
        if self.count == 0 {
            Duration::ZERO
        } else {
            self.total_duration / self.count as u32
        }
    }
}

/// Fixed-bucket latency histogram.
///
/// Buckets are tuned for remote completions: 100ms, 500ms, 1s, 5s, 10s, 30s
/// and overflow.
#[derive(Debug, Clone)]
pub struct Histogram {
    /// Upper bounds in milliseconds.
    bounds: Vec<u64>,
    counts: Vec<u64>,
}

impl Histogram {
    pub fn with_bounds(bounds: Vec<u64>) -> Self {
        let counts = vec![0; bounds.len() + 1];
        Self { bounds, counts }
    }

    pub fn record(&mut self, duration: Duration) {
        let millis = duration.as_millis() as u64;
        let idx = self
            .bounds
            .iter()
            .position(|&b| millis <= b)
            .unwrap_or(self.bounds.len());
        self.counts[idx] += 1;
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Upper bound of the bucket holding the `p`-th percentile.
    pub fn percentile(&self, p: f64) -> Duration {
        let total: u64 = self.counts.iter().sum();
        if total == 0 {
            return Duration::ZERO;
        }
        let target = (total as f64 * p / 100.0).ceil() as u64;
        let mut cumulative = 0;
        for (i, &count) in self.counts.iter().enumerate() {
            cumulative += count;
            if cumulative >= target {
                let millis = self
                    .bounds
                    .get(i)
                    .copied()
                    .unwrap_or_else(|| self.bounds.last().copied().unwrap_or(0) * 2);
                return Duration::from_millis(millis);
            }
        }
        Duration::ZERO
    }

    pub fn p50(&self) -> Duration {
        self.percentile(50.0)
    }

    pub fn p99(&self) -> Duration {
        self.percentile(99.0)
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::with_bounds(vec![100, 500, 1_000, 5_000, 10_000, 30_000])
    }
}

/// Point-in-time copy of all metrics.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub tools: HashMap<String, ToolMetrics>,
    pub operations: HashMap<String, OperationMetrics>,
    pub events: Vec<(LoopEvent, u64)>,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub uptime: Duration,
}

impl MetricsSnapshot {
    /// Human-readable report, sorted for stable output.
    pub fn format_report(&self) -> String {
        let mut report = String::from("=== Session Metrics ===\n");
        report.push_str(&format!("Uptime: {:.2?}\n", self.uptime));
        report.push_str(&format!(
            "Tokens: {} input, {} output\n",
            self.input_tokens, self.output_tokens
        ));

        for (event, count) in self.events.iter().filter(|(_, c)| *c > 0) {
            report.push_str(&format!("{}: {count}\n", event.label()));
        }

        let mut operations: Vec<_> = self.operations.iter().collect();
        operations.sort_by(|a, b| a.0.cmp(b.0));
        for (name, m) in operations {
            report.push_str(&format!(
                "  {name}: {} calls, avg {:.2?}, p99 <= {:.2?}\n",
                m.count,
                m.avg_duration(),
                m.histogram.p99()
            ));
        }

        let mut tools: Vec<_> = self.tools.iter().collect();
        tools.sort_by(|a, b| a.0.cmp(b.0));
        for (name, m) in tools {
            report.push_str(&format!(
                "  tool {name}: {} calls, {} failed, avg {:.2?}\n",
                m.invocations,
                m.failures,
                m.avg_duration()
            ));
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_metrics() {
        let mut metrics = ToolMetrics::default();
        metrics.record(Duration::from_millis(100), true);
        metrics.record(Duration::from_millis(200), false);
        assert_eq!(metrics.invocations, 2);
        assert_eq!(metrics.failures, 1);
        assert_eq!(metrics.avg_duration(), Duration::from_millis(150));
    }

    #[test]
    fn test_histogram_buckets() {
        let mut hist = Histogram::default();
        hist.record(Duration::from_millis(50));
        hist.record(Duration::from_millis(700));
        hist.record(Duration::from_secs(45));
        assert_eq!(hist.counts()[0], 1);
        assert_eq!(hist.counts()[2], 1);
        assert_eq!(hist.counts()[6], 1);
    }

    #[test]
    fn test_histogram_percentiles() {
        let mut hist = Histogram::default();
        for _ in 0..10 {
            hist.record(Duration::from_millis(300));
        }
        assert_eq!(hist.p50(), Duration::from_millis(500));
        assert_eq!(hist.p99(), Duration::from_millis(500));
        assert_eq!(Histogram::default().p50(), Duration::ZERO);
    }

    #[test]
    fn test_events_and_tokens() {
        let metrics = Metrics::new();
        metrics.record_event(LoopEvent::GatedDelegation);
        metrics.record_event(LoopEvent::GatedDelegation);
        metrics.record_event(LoopEvent::Approved);
        metrics.record_tokens(10, 4);

        assert_eq!(metrics.event_count(LoopEvent::GatedDelegation), 2);
        assert_eq!(metrics.event_count(LoopEvent::Rejected), 0);
        assert_eq!(metrics.token_counts(), (10, 4));

        let report = metrics.snapshot().format_report();
        assert!(report.contains("gated delegations: 2"));
        assert!(!report.contains("rejections"));
    }

    #[test]
    fn test_reset() {
        let metrics = Metrics::new();
        metrics.record_tool("read_file", Duration::from_millis(1), true);
        metrics.record_operation("completion.mike", Duration::from_millis(20));
        metrics.record_event(LoopEvent::ToolCeiling);
        metrics.reset();

        assert!(metrics.tool_metrics("read_file").is_none());
        assert!(metrics.operation_metrics("completion.mike").is_none());
        assert_eq!(metrics.event_count(LoopEvent::ToolCeiling), 0);
    }
}
