use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;

/// Counters gathered over one run, attached to the report.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStats {
    /// Units handed to the executor.
    pub units_dispatched: u64,
    /// File units answered from the cache without executing.
    pub cache_hits: u64,
    pub cache_misses: u64,
    /// Failure records appended (errors, panics and timeouts).
    pub failures: u64,
    /// Executed units by bear name.
    pub executions: HashMap<String, u64>,
    /// Average unit duration by bear name.
    pub avg_unit_duration: HashMap<String, Duration>,
    /// Wall-clock time of the whole run.
    pub elapsed: Duration,
}

impl RunStats {
    /// Record one executed unit of `bear`.
    pub fn record_execution(&mut self, bear: &str, duration: Duration) {
        *self.executions.entry(bear.to_string()).or_default() += 1;

        let count = self.executions[bear];
        let prev_avg = self.avg_unit_duration.get(bear).copied().unwrap_or_default();

        // Incremental mean: new_avg = prev_avg + (duration - prev_avg) / count
        let new_avg = if count == 1 {
            duration
        } else {
            let prev_nanos = prev_avg.as_nanos() as f64;
            let cur_nanos = duration.as_nanos() as f64;
            let avg_nanos = prev_nanos + (cur_nanos - prev_nanos) / count as f64;
            Duration::from_nanos(avg_nanos as u64)
        };

        self.avg_unit_duration.insert(bear.to_string(), new_avg);
    }

    pub fn executions_of(&self, bear: &str) -> u64 {
        self.executions.get(bear).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_single_execution() {
        let mut s = RunStats::default();
        s.record_execution("LineCountBear", Duration::from_millis(100));

        assert_eq!(s.executions_of("LineCountBear"), 1);
        assert_eq!(s.avg_unit_duration["LineCountBear"], Duration::from_millis(100));
    }

    #[test]
    fn record_multiple_executions_averages() {
        let mut s = RunStats::default();
        s.record_execution("bear", Duration::from_millis(100));
        s.record_execution("bear", Duration::from_millis(200));

        assert_eq!(s.executions_of("bear"), 2);
        let avg = s.avg_unit_duration["bear"].as_millis();
        assert!((140..=160).contains(&avg), "expected ~150ms, got {}ms", avg);
    }

    #[test]
    fn default_stats() {
        let s = RunStats::default();
        assert_eq!(s.units_dispatched, 0);
        assert_eq!(s.executions_of("missing"), 0);
        assert!(s.executions.is_empty());
    }
}
