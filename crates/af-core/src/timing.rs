//! Lightweight stage timing.
//!
//! Timers measure wall time for a labelled stage; [`StageTimings`] collects them per
//! run so the service layer can report where time went.

use std::time::Instant;

/// A simple timer that measures elapsed time.
pub struct Timer {
    label: &'static str,
    start: Instant,
}

impl Timer {
    /// Create and start a new timer with the given label.
    pub fn start(label: &'static str) -> Self {
        Self {
            label,
            start: Instant::now(),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Stop the timer and return elapsed time in seconds.
    pub fn stop(self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    /// Stop the timer, log the result at debug level, and return it.
    pub fn stop_and_log(self) -> f64 {
        let label = self.label;
        let elapsed = self.stop();
        tracing::debug!(stage = label, elapsed_s = elapsed, "stage timing");
        elapsed
    }
}

/// Ordered per-stage wall times for one run.
#[derive(Debug, Clone, Default)]
pub struct StageTimings {
    entries: Vec<(&'static str, f64)>,
}

impl StageTimings {
    pub fn record(&mut self, label: &'static str, elapsed_s: f64) {
        self.entries.push((label, elapsed_s));
    }

    /// Stop `timer` and record it under its own label.
    pub fn finish(&mut self, timer: Timer) -> f64 {
        let label = timer.label();
        let elapsed = timer.stop_and_log();
        self.record(label, elapsed);
        elapsed
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.entries
            .iter()
            .filter(|(l, _)| *l == label)
            .map(|(_, t)| *t)
            .reduce(|a, b| a + b)
    }

    pub fn total_seconds(&self) -> f64 {
        self.entries.iter().map(|(_, t)| t).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.entries.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timings_accumulate_by_label() {
        let mut timings = StageTimings::default();
        timings.record("race", 0.5);
        timings.record("flow", 0.25);
        timings.record("race", 0.25);
        assert_eq!(timings.get("race"), Some(0.75));
        assert_eq!(timings.get("missing"), None);
        assert_eq!(timings.total_seconds(), 1.0);
        assert_eq!(timings.iter().count(), 3);
    }

    #[test]
    fn timer_measures_non_negative() {
        let mut timings = StageTimings::default();
        let t = Timer::start("noop");
        let elapsed = timings.finish(t);
        assert!(elapsed >= 0.0);
        assert_eq!(timings.get("noop"), Some(elapsed));
    }
}
