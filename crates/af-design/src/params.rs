//! Design parameter synthesis.

use std::fmt;
use std::str::FromStr;

use af_core::{DeterministicStream, round_to};
use serde::{Deserialize, Serialize};

use crate::error::DesignError;
use crate::rules::{DesignRule, RULES};

/// Synthesized field targeted by a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamField {
    TotalLengthMm,
    TotalWidthMm,
    BodyHeightMm,
    TotalMassG,
    FrontWingSpanMm,
    FrontWingChordMm,
    FrontWingThicknessMm,
    RearWingSpanMm,
    RearWingChordMm,
    RearWingHeightMm,
    WheelDiameterMm,
    WheelWidthMm,
    CanisterClearanceMm,
    SurfaceFinishScore,
    StructuralIntegrityScore,
    RegulationCompliancePct,
}

impl ParamField {
    pub const ALL: [ParamField; 16] = [
        ParamField::TotalLengthMm,
        ParamField::TotalWidthMm,
        ParamField::BodyHeightMm,
        ParamField::TotalMassG,
        ParamField::FrontWingSpanMm,
        ParamField::FrontWingChordMm,
        ParamField::FrontWingThicknessMm,
        ParamField::RearWingSpanMm,
        ParamField::RearWingChordMm,
        ParamField::RearWingHeightMm,
        ParamField::WheelDiameterMm,
        ParamField::WheelWidthMm,
        ParamField::CanisterClearanceMm,
        ParamField::SurfaceFinishScore,
        ParamField::StructuralIntegrityScore,
        ParamField::RegulationCompliancePct,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ParamField::TotalLengthMm => "total_length_mm",
            ParamField::TotalWidthMm => "total_width_mm",
            ParamField::BodyHeightMm => "body_height_mm",
            ParamField::TotalMassG => "total_mass_g",
            ParamField::FrontWingSpanMm => "front_wing_span_mm",
            ParamField::FrontWingChordMm => "front_wing_chord_mm",
            ParamField::FrontWingThicknessMm => "front_wing_thickness_mm",
            ParamField::RearWingSpanMm => "rear_wing_span_mm",
            ParamField::RearWingChordMm => "rear_wing_chord_mm",
            ParamField::RearWingHeightMm => "rear_wing_height_mm",
            ParamField::WheelDiameterMm => "wheel_diameter_mm",
            ParamField::WheelWidthMm => "wheel_width_mm",
            ParamField::CanisterClearanceMm => "canister_clearance_mm",
            ParamField::SurfaceFinishScore => "surface_finish_score",
            ParamField::StructuralIntegrityScore => "structural_integrity_score",
            ParamField::RegulationCompliancePct => "regulation_compliance_pct",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            ParamField::TotalMassG => "g",
            ParamField::SurfaceFinishScore | ParamField::StructuralIntegrityScore => "pts",
            ParamField::RegulationCompliancePct => "%",
            _ => "mm",
        }
    }
}

impl fmt::Display for ParamField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ParamField {
    type Err = DesignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ParamField::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| DesignError::UnknownField {
                name: s.to_string(),
            })
    }
}

/// Synthesized physical description of the car. Lengths in mm, mass in g.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesignParameters {
    pub total_length_mm: f64,
    pub total_width_mm: f64,
    pub body_height_mm: f64,
    pub total_mass_g: f64,
    pub front_wing_span_mm: f64,
    pub front_wing_chord_mm: f64,
    pub front_wing_thickness_mm: f64,
    pub rear_wing_span_mm: f64,
    pub rear_wing_chord_mm: f64,
    pub rear_wing_height_mm: f64,
    pub wheel_diameter_mm: f64,
    pub wheel_width_mm: f64,
    pub canister_clearance_mm: f64,
    pub surface_finish_score: f64,
    pub structural_integrity_score: f64,
    pub regulation_compliance_pct: f64,
}

/// Fraction of the width × height rectangle the body actually fills head-on.
const BODY_FILL_FACTOR: f64 = 0.45;

impl DesignParameters {
    pub fn get(&self, field: ParamField) -> f64 {
        match field {
            ParamField::TotalLengthMm => self.total_length_mm,
            ParamField::TotalWidthMm => self.total_width_mm,
            ParamField::BodyHeightMm => self.body_height_mm,
            ParamField::TotalMassG => self.total_mass_g,
            ParamField::FrontWingSpanMm => self.front_wing_span_mm,
            ParamField::FrontWingChordMm => self.front_wing_chord_mm,
            ParamField::FrontWingThicknessMm => self.front_wing_thickness_mm,
            ParamField::RearWingSpanMm => self.rear_wing_span_mm,
            ParamField::RearWingChordMm => self.rear_wing_chord_mm,
            ParamField::RearWingHeightMm => self.rear_wing_height_mm,
            ParamField::WheelDiameterMm => self.wheel_diameter_mm,
            ParamField::WheelWidthMm => self.wheel_width_mm,
            ParamField::CanisterClearanceMm => self.canister_clearance_mm,
            ParamField::SurfaceFinishScore => self.surface_finish_score,
            ParamField::StructuralIntegrityScore => self.structural_integrity_score,
            ParamField::RegulationCompliancePct => self.regulation_compliance_pct,
        }
    }

    fn set(&mut self, field: ParamField, value: f64) {
        let slot = match field {
            ParamField::TotalLengthMm => &mut self.total_length_mm,
            ParamField::TotalWidthMm => &mut self.total_width_mm,
            ParamField::BodyHeightMm => &mut self.body_height_mm,
            ParamField::TotalMassG => &mut self.total_mass_g,
            ParamField::FrontWingSpanMm => &mut self.front_wing_span_mm,
            ParamField::FrontWingChordMm => &mut self.front_wing_chord_mm,
            ParamField::FrontWingThicknessMm => &mut self.front_wing_thickness_mm,
            ParamField::RearWingSpanMm => &mut self.rear_wing_span_mm,
            ParamField::RearWingChordMm => &mut self.rear_wing_chord_mm,
            ParamField::RearWingHeightMm => &mut self.rear_wing_height_mm,
            ParamField::WheelDiameterMm => &mut self.wheel_diameter_mm,
            ParamField::WheelWidthMm => &mut self.wheel_width_mm,
            ParamField::CanisterClearanceMm => &mut self.canister_clearance_mm,
            ParamField::SurfaceFinishScore => &mut self.surface_finish_score,
            ParamField::StructuralIntegrityScore => &mut self.structural_integrity_score,
            ParamField::RegulationCompliancePct => &mut self.regulation_compliance_pct,
        };
        *slot = value;
    }

    /// Head-on area: body silhouette, two visible wheels, and the front wing edge.
    pub fn frontal_area_mm2(&self) -> f64 {
        let body = self.total_width_mm * self.body_height_mm * BODY_FILL_FACTOR;
        let wheels = 2.0 * self.wheel_width_mm * self.wheel_diameter_mm;
        let wing = self.front_wing_span_mm * self.front_wing_thickness_mm;
        body + wheels + wing
    }

    pub fn front_wing_aspect_ratio(&self) -> f64 {
        self.front_wing_span_mm / self.front_wing_chord_mm
    }

    pub fn rear_wing_aspect_ratio(&self) -> f64 {
        self.rear_wing_span_mm / self.rear_wing_chord_mm
    }

    /// `(field, value)` pairs in table order.
    pub fn entries(&self) -> impl Iterator<Item = (ParamField, f64)> + '_ {
        ParamField::ALL.into_iter().map(|f| (f, self.get(f)))
    }
}

/// Apply one rule to one uniform draw.
pub fn apply_rule(rule: &DesignRule, u: f64) -> f64 {
    let (lo, hi) = rule.bound.interval();
    let skewed = u.clamp(0.0, 1.0).powf(rule.bias);
    let raw = round_to(lo + (hi - lo) * skewed, rule.precision).clamp(lo, hi);
    let mut value = raw;
    if let Some(floor) = rule.floor {
        value = value.max(floor);
    }
    if let Some(ceiling) = rule.ceiling {
        value = value.min(ceiling);
    }
    if value != raw {
        tracing::debug!(rule = rule.id, raw, value, "parameter clamped to regulatory limit");
    }
    value
}

/// Synthesize parameters from the built-in rule table.
pub fn synthesize_parameters(stream: &mut DeterministicStream) -> DesignParameters {
    synthesize_parameters_with(&RULES, stream)
}

/// Synthesize parameters from `rules`, consuming exactly one draw per rule in order.
pub fn synthesize_parameters_with(
    rules: &[DesignRule],
    stream: &mut DeterministicStream,
) -> DesignParameters {
    let mut params = DesignParameters::default();
    for rule in rules {
        let u = stream.draw();
        params.set(rule.field, apply_rule(rule, u));
    }
    params
}
