//! Run stages and the progress events reported while a run executes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStage {
    CheckingCache,
    LoadingCachedResult,
    ExtractingFeatures,
    SynthesizingParameters,
    SynthesizingCoefficients,
    GeneratingConvergence,
    SynthesizingFlowField,
    SimulatingRaces,
    GeneratingNarrative,
    SavingResult,
    Completed,
}

impl RunStage {
    pub fn label(self) -> &'static str {
        match self {
            RunStage::CheckingCache => "Checking result cache",
            RunStage::LoadingCachedResult => "Loading cached result",
            RunStage::ExtractingFeatures => "Extracting geometry features",
            RunStage::SynthesizingParameters => "Synthesizing design parameters",
            RunStage::SynthesizingCoefficients => "Synthesizing aero coefficients",
            RunStage::GeneratingConvergence => "Generating convergence history",
            RunStage::SynthesizingFlowField => "Synthesizing flow field",
            RunStage::SimulatingRaces => "Simulating races",
            RunStage::GeneratingNarrative => "Generating optimization narrative",
            RunStage::SavingResult => "Saving result",
            RunStage::Completed => "Completed",
        }
    }

    /// Progress reached once this stage has finished.
    pub fn percent(self) -> u8 {
        match self {
            RunStage::CheckingCache => 2,
            RunStage::LoadingCachedResult => 50,
            RunStage::ExtractingFeatures => 10,
            RunStage::SynthesizingParameters => 20,
            RunStage::SynthesizingCoefficients => 30,
            RunStage::GeneratingConvergence => 45,
            RunStage::SynthesizingFlowField => 60,
            RunStage::SimulatingRaces => 80,
            RunStage::GeneratingNarrative => 90,
            RunStage::SavingResult => 95,
            RunStage::Completed => 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunProgressEvent {
    pub stage: RunStage,
    pub percent: u8,
    pub elapsed_wall_s: f64,
    pub message: Option<String>,
}

impl RunProgressEvent {
    pub fn stage(stage: RunStage, elapsed_wall_s: f64, message: Option<String>) -> Self {
        Self {
            stage,
            percent: stage.percent(),
            elapsed_wall_s,
            message,
        }
    }
}
