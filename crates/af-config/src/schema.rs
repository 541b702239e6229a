//! Engine configuration schema.

use std::fmt;
use std::str::FromStr;

use af_core::units::constants::AIR_DENSITY_KG_M3;
use serde::{Deserialize, Serialize};

use crate::migrate::LATEST_VERSION;

/// Upper bound on the race visualization subsample.
pub const MAX_VISUALIZATION_POINTS: usize = 300;

/// Upper bound on narrative epochs. Past this the geometric drops fall below the
/// resolution of the running Cd and the series stops being strictly decreasing.
pub const MAX_NARRATIVE_EPOCHS: usize = 32;
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Standard,
    Premium,
}

impl Tier {
    pub const ALL: [Tier; 2] = [Tier::Standard, Tier::Premium];

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Standard => "standard",
            Tier::Premium => "premium",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Tier::Standard),
            "premium" => Ok(Tier::Premium),
            other => Err(format!("unknown tier '{other}' (expected standard or premium)")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub tiers: TierTable,
    #[serde(default)]
    pub convergence: ConvergenceDef,
    #[serde(default)]
    pub flow_field: FlowFieldDef,
    #[serde(default)]
    pub race: RaceDef,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            version: LATEST_VERSION,
            name: "default".to_string(),
            tiers: TierTable::default(),
            convergence: ConvergenceDef::default(),
            flow_field: FlowFieldDef::default(),
            race: RaceDef::default(),
        }
    }
}

impl EngineConfig {
    pub fn tier(&self, tier: Tier) -> &TierProfile {
        match tier {
            Tier::Standard => &self.tiers.standard,
            Tier::Premium => &self.tiers.premium,
        }
    }
}

/// Population sizes for one tier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TierProfile {
    pub convergence_samples: usize,
    pub flow_field_points: usize,
    pub race_samples: usize,
    pub narrative_epochs: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TierTable {
    pub standard: TierProfile,
    pub premium: TierProfile,
}

impl Default for TierTable {
    fn default() -> Self {
        Self {
            standard: TierProfile {
                convergence_samples: 200,
                flow_field_points: 2_000,
                race_samples: 5_000,
                narrative_epochs: 6,
            },
            premium: TierProfile {
                convergence_samples: 500,
                flow_field_points: 6_000,
                race_samples: 100_000,
                narrative_epochs: 12,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConvergenceDef {
    pub iterations_per_sample: u32,
    pub converged_threshold: f64,
    pub relaxed_threshold: f64,
}

impl Default for ConvergenceDef {
    fn default() -> Self {
        Self {
            iterations_per_sample: 5,
            converged_threshold: 1e-5,
            relaxed_threshold: 1e-3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlowFieldDef {
    pub free_stream_mps: f64,
    pub air_density_kg_m3: f64,
}

impl Default for FlowFieldDef {
    fn default() -> Self {
        Self {
            free_stream_mps: 20.0,
            air_density_kg_m3: AIR_DENSITY_KG_M3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RaceDef {
    pub track_length_m: f64,
    pub launch_force_n: f64,
    pub burn_time_s: f64,
    pub rolling_coefficient: f64,
    pub air_density_kg_m3: f64,
    pub max_time_s: f64,
    #[serde(default = "default_visualization_points")]
    pub visualization_points: usize,
}

fn default_visualization_points() -> usize {
    MAX_VISUALIZATION_POINTS
}

impl Default for RaceDef {
    fn default() -> Self {
        Self {
            track_length_m: 20.0,
            launch_force_n: 4.0,
            burn_time_s: 0.30,
            rolling_coefficient: 0.018,
            air_density_kg_m3: AIR_DENSITY_KG_M3,
            max_time_s: 5.0,
            visualization_points: MAX_VISUALIZATION_POINTS,
        }
    }
}
