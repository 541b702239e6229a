//! Phrase-table optimization narrative.
//!
//! The "correction" is a geometric series of drag reductions: the total drop is a
//! drawn fraction of the baseline and each epoch keeps a drawn ratio of the previous
//! epoch's drop, so Cd strictly falls while the per-epoch gain strictly shrinks.
//!
//! Draw order: total fraction, decay ratio, then per epoch a mutation phrase and a
//! region phrase.

use af_core::{DeterministicStream, clamp_finite};
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Most epochs a narrative can hold while every drop stays resolvable against Cd.
pub const MAX_EPOCHS: usize = 32;

pub const TOTAL_FRACTION_WINDOW: (f64, f64) = (0.08, 0.18);
pub const DECAY_RATIO_WINDOW: (f64, f64) = (0.55, 0.80);
pub const CONFIDENCE_WINDOW: (f64, f64) = (0.6, 0.98);

pub const MUTATIONS: [&str; 8] = [
    "Tapered the",
    "Raised the leading edge of the",
    "Filleted the trailing edge of the",
    "Narrowed the",
    "Smoothed the transition into the",
    "Reduced camber on the",
    "Shortened the overhang of the",
    "Enclosed the inner face of the",
];

pub const REGIONS: [&str; 8] = [
    "nose cone",
    "front wing endplates",
    "front wheel fairings",
    "sidepods",
    "canister housing",
    "rear wing mainplane",
    "rear wheel wake region",
    "underbody diffuser",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeOptions {
    pub epochs: usize,
}

impl Default for NarrativeOptions {
    fn default() -> Self {
        Self { epochs: 6 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationEpoch {
    /// 1-based.
    pub epoch: u32,
    pub mutation: String,
    pub region: String,
    pub result_cd: f64,
    /// Drop achieved by this epoch, as a percentage of the baseline Cd.
    pub improvement_pct: f64,
}

impl OptimizationEpoch {
    pub fn description(&self) -> String {
        format!("{} {}", self.mutation, self.region)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeuralCorrection {
    pub baseline_cd: f64,
    pub optimized_cd: f64,
    pub total_improvement_pct: f64,
    pub epochs: Vec<OptimizationEpoch>,
    pub confidence: f64,
    pub suggested_formula: String,
}

pub fn confidence_for(total_fraction: f64) -> f64 {
    clamp_finite(
        CONFIDENCE_WINDOW.0 + 2.0 * total_fraction,
        CONFIDENCE_WINDOW.0,
        CONFIDENCE_WINDOW.1,
    )
}

pub fn generate_narrative(
    baseline_cd: f64,
    stream: &mut DeterministicStream,
    opts: &NarrativeOptions,
) -> SimResult<NeuralCorrection> {
    if opts.epochs == 0 {
        return Err(SimError::InvalidArg {
            what: "narrative needs at least one epoch",
        });
    }
    if opts.epochs > MAX_EPOCHS {
        return Err(SimError::InvalidArg {
            what: "narrative epochs exceed the supported maximum",
        });
    }
    if !(baseline_cd > 0.0 && baseline_cd.is_finite()) {
        return Err(SimError::NonPhysical {
            what: "baseline Cd must be positive",
        });
    }

    let fraction = stream.draw_range(TOTAL_FRACTION_WINDOW.0, TOTAL_FRACTION_WINDOW.1);
    let ratio = stream.draw_range(DECAY_RATIO_WINDOW.0, DECAY_RATIO_WINDOW.1);

    let total_drop = baseline_cd * fraction;
    let first_drop = total_drop * (1.0 - ratio) / (1.0 - ratio.powi(opts.epochs as i32));

    let mut epochs = Vec::with_capacity(opts.epochs);
    let mut cd = baseline_cd;
    let mut drop = first_drop;
    for i in 0..opts.epochs {
        let mutation = MUTATIONS[stream.draw_index(MUTATIONS.len())];
        let region = REGIONS[stream.draw_index(REGIONS.len())];
        cd -= drop;
        epochs.push(OptimizationEpoch {
            epoch: i as u32 + 1,
            mutation: mutation.to_string(),
            region: region.to_string(),
            result_cd: cd,
            improvement_pct: drop / baseline_cd * 100.0,
        });
        drop *= ratio;
    }

    let optimized_cd = cd;
    let total_improvement_pct = (baseline_cd - optimized_cd) / baseline_cd * 100.0;
    let confidence = confidence_for(fraction);
    let suggested_formula = format!(
        "Cd_opt = Cd_base * (1 - {:.4}) = {:.4} over {} epochs (decay {:.2})",
        fraction, optimized_cd, opts.epochs, ratio
    );

    Ok(NeuralCorrection {
        baseline_cd,
        optimized_cd,
        total_improvement_pct,
        epochs,
        confidence,
        suggested_formula,
    })
}
