//! Result data types.

use af_config::Tier;
use af_core::Seed;
use af_design::{AeroCoefficients, DesignParameters, ScrutineeringReport};
use af_geometry::GeometryFeatures;
use af_sim::{
    ConvergenceStatus, FlowFieldPoint, NeuralCorrection, RaceTimePrediction, ResidualHistory,
};
use serde::{Deserialize, Serialize};

pub type ResultId = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMetadata {
    pub id: ResultId,
    pub filename: String,
    /// RFC 3339.
    pub timestamp: String,
    pub tier: Tier,
    pub car_class: String,
    pub thrust_model: String,
    pub engine_version: String,
    pub seed: Seed,
}

/// One completed simulation. Never edited; a later run supersedes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AeroResult {
    pub metadata: ResultMetadata,
    pub features: GeometryFeatures,
    pub parameters: DesignParameters,
    pub coefficients: AeroCoefficients,
    pub scrutineering: ScrutineeringReport,
    pub residuals: ResidualHistory,
    pub flow_field: Vec<FlowFieldPoint>,
    pub race: RaceTimePrediction,
    pub correction: NeuralCorrection,
}

impl AeroResult {
    pub fn id(&self) -> &str {
        &self.metadata.id
    }

    /// Everything except the wall-clock timestamp, for reproducibility checks.
    pub fn same_content(&self, other: &AeroResult) -> bool {
        let mut a = self.metadata.clone();
        a.timestamp = other.metadata.timestamp.clone();
        a == other.metadata
            && self.features == other.features
            && self.parameters == other.parameters
            && self.coefficients == other.coefficients
            && self.scrutineering == other.scrutineering
            && self.residuals == other.residuals
            && self.flow_field == other.flow_field
            && self.race == other.race
            && self.correction == other.correction
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTimingRecord {
    pub stage: String,
    pub seconds: f64,
}

/// Small summary stored next to the full record so listings stay cheap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultManifest {
    pub result_id: ResultId,
    pub filename: String,
    pub timestamp: String,
    pub tier: Tier,
    pub car_class: String,
    pub thrust_model: String,
    pub engine_version: String,
    pub seed: Seed,
    pub cd: f64,
    pub cl: f64,
    pub mean_race_time_s: f64,
    pub convergence: ConvergenceStatus,
    pub scrutineering_passed: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stage_timings: Vec<StageTimingRecord>,
}

impl ResultManifest {
    pub fn from_result(result: &AeroResult, stage_timings: Vec<StageTimingRecord>) -> Self {
        let meta = &result.metadata;
        Self {
            result_id: meta.id.clone(),
            filename: meta.filename.clone(),
            timestamp: meta.timestamp.clone(),
            tier: meta.tier,
            car_class: meta.car_class.clone(),
            thrust_model: meta.thrust_model.clone(),
            engine_version: meta.engine_version.clone(),
            seed: meta.seed,
            cd: result.coefficients.cd,
            cl: result.coefficients.cl,
            mean_race_time_s: result.race.statistics.time.average,
            convergence: result.residuals.status,
            scrutineering_passed: result.scrutineering.all_passed(),
            stage_timings,
        }
    }
}

/// Current time as RFC 3339 (UTC, second precision).
pub fn timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}
