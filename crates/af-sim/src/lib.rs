//! Synthetic simulation artifacts for aeroforge.
//!
//! Provides four independent consumers of a forked [`af_core::DeterministicStream`]:
//! - solver convergence history (log-space exponential decay with bounded noise)
//! - flow-field point cloud around an ellipsoidal body
//! - closed-form Monte Carlo race-time prediction
//! - phrase-table optimization narrative
//!
//! None of these solve a physical PDE; each is a pure function of its inputs and the
//! draws it takes.

pub mod convergence;
pub mod error;
pub mod flow_field;
pub mod narrative;
pub mod race;
pub mod stats;

pub use convergence::{
    ConvergenceOptions, ConvergenceStatus, FieldProfile, ResidualField, ResidualHistory,
    ResidualSample, generate_convergence, log_decay_slope,
};
pub use error::{SimError, SimResult};
pub use flow_field::{FlowFieldOptions, FlowFieldPoint, FlowFieldSampler, synthesize_flow_field};
pub use narrative::{NarrativeOptions, NeuralCorrection, OptimizationEpoch, generate_narrative};
pub use race::{
    MonteCarloPoint, RaceInputs, RaceOptions, RaceStatistics, RaceTimePrediction, RaceTrial,
    simulate_races,
};
pub use stats::{Aggregate, RunningStats};
