// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Outcome tallies for abuse simulation results.

use std::collections::HashMap;
use std::time::Duration;

/// Collects outcomes during a simulated flood.
#[derive(Debug, Default)]
pub struct AttackMetrics {
    /// Simulated time covered by the flood, in milliseconds
    simulated_ms: u64,
    /// Count of requests by outcome
    outcomes: HashMap<Outcome, usize>,
    /// Count of requests by viewer
    requests_per_viewer: HashMap<String, usize>,
    /// Admitted requests by viewer
    allowed_per_viewer: HashMap<String, usize>,
    /// Wall-clock latency samples (microseconds)
    latencies: Vec<u64>,
}

/// Possible outcomes for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Allowed,
    RateLimited,
    InFlight,
    InvalidEmotion,
    InvalidMessage,
}

impl AttackMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a request outcome.
    pub fn record(&mut self, outcome: Outcome, viewer: &str, latency: Duration) {
        *self.outcomes.entry(outcome).or_insert(0) += 1;
        *self
            .requests_per_viewer
            .entry(viewer.to_string())
            .or_insert(0) += 1;
        if outcome == Outcome::Allowed {
            *self
                .allowed_per_viewer
                .entry(viewer.to_string())
                .or_insert(0) += 1;
        }
        self.latencies.push(latency.as_micros() as u64);
    }

    /// Set the simulated span of the flood.
    pub fn set_simulated(&mut self, span: Duration) {
        self.simulated_ms = span.as_millis() as u64;
    }

    pub fn total_requests(&self) -> usize {
        self.outcomes.values().sum()
    }

    /// Get count for a specific outcome.
    pub fn count(&self, outcome: Outcome) -> usize {
        self.outcomes.get(&outcome).copied().unwrap_or(0)
    }

    /// Ratio of requests that were not admitted.
    pub fn block_rate(&self) -> f64 {
        let total = self.total_requests();
        if total == 0 {
            return 0.0;
        }
        (total - self.count(Outcome::Allowed)) as f64 / total as f64
    }

    /// Most requests any single viewer got admitted.
    pub fn max_allowed_per_viewer(&self) -> usize {
        self.allowed_per_viewer.values().copied().max().unwrap_or(0)
    }

    pub fn unique_viewers(&self) -> usize {
        self.requests_per_viewer.len()
    }

    /// Get p99 latency in microseconds.
    pub fn p99_latency_us(&self) -> u64 {
        if self.latencies.is_empty() {
            return 0;
        }
        let mut sorted = self.latencies.clone();
        sorted.sort_unstable();
        let idx = (sorted.len() as f64 * 0.99) as usize;
        sorted[idx.min(sorted.len() - 1)]
    }

    /// Generate a summary report.
    pub fn report(&self) -> MetricsReport {
        MetricsReport {
            total_requests: self.total_requests(),
            allowed: self.count(Outcome::Allowed),
            rate_limited: self.count(Outcome::RateLimited),
            in_flight: self.count(Outcome::InFlight),
            validation_failed: self.count(Outcome::InvalidEmotion)
                + self.count(Outcome::InvalidMessage),
            simulated_ms: self.simulated_ms,
            block_rate: self.block_rate(),
            p99_latency_us: self.p99_latency_us(),
            unique_viewers: self.unique_viewers(),
            max_allowed_per_viewer: self.max_allowed_per_viewer(),
        }
    }
}

/// Summary report of a flood.
#[derive(Debug, Clone)]
pub struct MetricsReport {
    pub total_requests: usize,
    pub allowed: usize,
    pub rate_limited: usize,
    pub in_flight: usize,
    pub validation_failed: usize,
    pub simulated_ms: u64,
    pub block_rate: f64,
    pub p99_latency_us: u64,
    pub unique_viewers: usize,
    pub max_allowed_per_viewer: usize,
}

impl std::fmt::Display for MetricsReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Flood Report ===")?;
        writeln!(f, "Simulated span:    {} ms", self.simulated_ms)?;
        writeln!(f, "Total Requests:    {}", self.total_requests)?;
        writeln!(f, "Allowed:           {}", self.allowed)?;
        writeln!(f, "Rate Limited:      {}", self.rate_limited)?;
        writeln!(f, "In Flight:         {}", self.in_flight)?;
        writeln!(f, "Validation Failed: {}", self.validation_failed)?;
        writeln!(f, "Block Rate:        {:.1}%", self.block_rate * 100.0)?;
        writeln!(f, "P99 latency:       {} us", self.p99_latency_us)?;
        writeln!(f, "Unique viewers:    {}", self.unique_viewers)?;
        writeln!(f, "Max per viewer:    {}", self.max_allowed_per_viewer)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collection() {
        let mut metrics = AttackMetrics::new();
        metrics.record(Outcome::Allowed, "10.0.0.1", Duration::from_micros(100));
        metrics.record(Outcome::Allowed, "10.0.0.2", Duration::from_micros(150));
        metrics.record(Outcome::Allowed, "10.0.0.2", Duration::from_micros(150));
        metrics.record(Outcome::RateLimited, "10.0.0.2", Duration::from_micros(50));

        assert_eq!(metrics.total_requests(), 4);
        assert_eq!(metrics.count(Outcome::Allowed), 3);
        assert_eq!(metrics.unique_viewers(), 2);
        assert_eq!(metrics.max_allowed_per_viewer(), 2);
        assert!((metrics.block_rate() - 0.25).abs() < 0.01);
    }
}
