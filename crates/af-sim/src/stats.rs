//! Streaming statistics using Welford's algorithm.
//!
//! O(1) memory per tracked quantity, so the premium Monte Carlo population can be
//! aggregated without a second pass.

use serde::{Deserialize, Serialize};

/// Online accumulator for count, mean, variance, min and max.
#[derive(Debug, Clone)]
pub struct RunningStats {
    count: usize,
    mean: f64,
    /// Sum of squared deviations from the current mean.
    m2: f64,
    min: f64,
    max: f64,
}

impl Default for RunningStats {
    fn default() -> Self {
        Self::new()
    }
}

impl RunningStats {
    pub fn new() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    pub fn update(&mut self, x: f64) {
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = x - self.mean;
        self.m2 += delta * delta2;
        self.min = self.min.min(x);
        self.max = self.max.max(x);
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Population variance; 0 below two samples.
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / self.count as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Aggregate where the smallest value is best (times).
    pub fn lower_is_better(&self) -> Aggregate {
        Aggregate {
            best: self.min,
            worst: self.max,
            average: self.mean,
            std_dev: self.std_dev(),
        }
    }

    /// Aggregate where the largest value is best (speeds).
    pub fn higher_is_better(&self) -> Aggregate {
        Aggregate {
            best: self.max,
            worst: self.min,
            average: self.mean,
            std_dev: self.std_dev(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub best: f64,
    pub worst: f64,
    pub average: f64,
    pub std_dev: f64,
}
