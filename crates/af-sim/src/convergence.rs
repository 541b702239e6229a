//! Synthetic solver convergence history.
//!
//! Each residual field follows `initial * exp(-rate * i) * (1 + noise(i))` with
//! `|noise| <= NOISE_AMPLITUDE`. Rates are set so a field would land on its target
//! after `samples` steps, then perturbed by one draw per field.
//!
//! Draw order: one rate draw per field in [`ResidualField::ALL`] order, then for each
//! sample one noise draw per field in the same order.

use af_core::DeterministicStream;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

pub const CONVERGED_THRESHOLD: f64 = 1e-5;
pub const RELAXED_THRESHOLD: f64 = 1e-3;
pub const NOISE_AMPLITUDE: f64 = 0.25;
/// Relative spread on each field's decay rate.
pub const RATE_SPREAD: f64 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResidualField {
    Continuity,
    XVelocity,
    YVelocity,
    ZVelocity,
}

impl ResidualField {
    pub const ALL: [ResidualField; 4] = [
        ResidualField::Continuity,
        ResidualField::XVelocity,
        ResidualField::YVelocity,
        ResidualField::ZVelocity,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ResidualField::Continuity => "continuity",
            ResidualField::XVelocity => "x_velocity",
            ResidualField::YVelocity => "y_velocity",
            ResidualField::ZVelocity => "z_velocity",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

/// Starting residual and the value the nominal decay reaches at the last sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldProfile {
    pub initial: f64,
    pub target: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceOptions {
    /// Number of recorded samples.
    pub samples: usize,
    /// Solver iterations represented by one sample.
    pub iterations_per_sample: u32,
    pub converged_threshold: f64,
    pub relaxed_threshold: f64,
    /// Per-field profiles in [`ResidualField::ALL`] order.
    pub profiles: [FieldProfile; 4],
}

impl Default for ConvergenceOptions {
    fn default() -> Self {
        Self {
            samples: 200,
            iterations_per_sample: 5,
            converged_threshold: CONVERGED_THRESHOLD,
            relaxed_threshold: RELAXED_THRESHOLD,
            profiles: [
                FieldProfile {
                    initial: 1.0,
                    target: 8.0e-7,
                },
                FieldProfile {
                    initial: 0.35,
                    target: 3.0e-7,
                },
                FieldProfile {
                    initial: 0.2,
                    target: 2.0e-7,
                },
                FieldProfile {
                    initial: 0.2,
                    target: 2.0e-7,
                },
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResidualSample {
    pub iteration: u32,
    pub continuity: f64,
    pub x_velocity: f64,
    pub y_velocity: f64,
    pub z_velocity: f64,
}

impl ResidualSample {
    pub fn get(&self, field: ResidualField) -> f64 {
        match field {
            ResidualField::Continuity => self.continuity,
            ResidualField::XVelocity => self.x_velocity,
            ResidualField::YVelocity => self.y_velocity,
            ResidualField::ZVelocity => self.z_velocity,
        }
    }

    pub fn max_residual(&self) -> f64 {
        ResidualField::ALL
            .into_iter()
            .map(|f| self.get(f))
            .fold(f64::NEG_INFINITY, f64::max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConvergenceStatus {
    Converged,
    ConvergedRelaxed,
    Diverged,
}

impl ConvergenceStatus {
    pub fn classify(final_max: f64, converged: f64, relaxed: f64) -> Self {
        if final_max <= converged {
            ConvergenceStatus::Converged
        } else if final_max <= relaxed {
            ConvergenceStatus::ConvergedRelaxed
        } else {
            ConvergenceStatus::Diverged
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ConvergenceStatus::Converged => "Converged",
            ConvergenceStatus::ConvergedRelaxed => "Converged (Relaxed)",
            ConvergenceStatus::Diverged => "Diverged",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResidualHistory {
    pub samples: Vec<ResidualSample>,
    pub final_residuals: ResidualSample,
    pub status: ConvergenceStatus,
    pub converged_threshold: f64,
}

impl ResidualHistory {
    pub fn series(&self, field: ResidualField) -> Vec<(f64, f64)> {
        self.samples
            .iter()
            .map(|s| (s.iteration as f64, s.get(field)))
            .collect()
    }
}

/// Least-squares slope of `ln(value)` against `x`. Non-positive values are skipped.
pub fn log_decay_slope(series: &[(f64, f64)]) -> f64 {
    let points: Vec<(f64, f64)> = series
        .iter()
        .filter(|(_, v)| *v > 0.0)
        .map(|&(x, v)| (x, v.ln()))
        .collect();
    if points.len() < 2 {
        return 0.0;
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;
    let (num, den) = points.iter().fold((0.0, 0.0), |(num, den), &(x, y)| {
        (num + (x - mean_x) * (y - mean_y), den + (x - mean_x).powi(2))
    });
    if den == 0.0 { 0.0 } else { num / den }
}

pub fn generate_convergence(
    stream: &mut DeterministicStream,
    opts: &ConvergenceOptions,
) -> SimResult<ResidualHistory> {
    if opts.samples == 0 {
        return Err(SimError::InvalidArg {
            what: "convergence samples must be positive",
        });
    }
    if opts.iterations_per_sample == 0 {
        return Err(SimError::InvalidArg {
            what: "iterations_per_sample must be positive",
        });
    }
    let fits = u32::try_from(opts.samples)
        .ok()
        .and_then(|n| n.checked_mul(opts.iterations_per_sample))
        .is_some();
    if !fits {
        return Err(SimError::InvalidArg {
            what: "final iteration number overflows u32",
        });
    }
    if opts
        .profiles
        .iter()
        .any(|p| !(p.initial > 0.0 && p.target > 0.0))
    {
        return Err(SimError::InvalidArg {
            what: "residual profiles must be positive",
        });
    }

    let n = opts.samples as f64;
    let mut rates = [0.0; 4];
    for (rate, profile) in rates.iter_mut().zip(opts.profiles.iter()) {
        let nominal = (profile.initial / profile.target).ln() / n;
        *rate = nominal * (1.0 + stream.draw_centered(RATE_SPREAD));
    }

    let mut samples = Vec::with_capacity(opts.samples);
    for i in 0..opts.samples {
        let mut values = [0.0; 4];
        for (k, value) in values.iter_mut().enumerate() {
            let envelope = opts.profiles[k].initial * (-rates[k] * i as f64).exp();
            *value = envelope * (1.0 + stream.draw_centered(NOISE_AMPLITUDE));
        }
        samples.push(ResidualSample {
            iteration: (i as u32 + 1) * opts.iterations_per_sample,
            continuity: values[0],
            x_velocity: values[1],
            y_velocity: values[2],
            z_velocity: values[3],
        });
    }

    let final_residuals = samples[samples.len() - 1];
    let status = ConvergenceStatus::classify(
        final_residuals.max_residual(),
        opts.converged_threshold,
        opts.relaxed_threshold,
    );
    if status != ConvergenceStatus::Converged {
        tracing::debug!(
            status = status.label(),
            final_max = final_residuals.max_residual(),
            "residuals did not reach the converged threshold"
        );
    }

    Ok(ResidualHistory {
        samples,
        final_residuals,
        status,
        converged_threshold: opts.converged_threshold,
    })
}
