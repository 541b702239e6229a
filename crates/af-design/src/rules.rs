//! Regulation rule table.
//!
//! The bias exponents skew particular articles toward their failure threshold so that
//! a realistic share of synthesized cars sit close to, or just past, a legal limit.
//! They are tuned constants, not engineering data.

use serde::Serialize;

use crate::error::{DesignError, DesignResult};
use crate::params::ParamField;

/// Multiplier applied to a lone minimum to synthesize the upper end of the range.
pub const ONE_SIDED_UPPER_FACTOR: f64 = 1.5;
/// Multiplier applied to a lone maximum to synthesize the lower end of the range.
pub const ONE_SIDED_LOWER_FACTOR: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum RuleBound {
    Range { min: f64, max: f64 },
    AtLeast(f64),
    AtMost(f64),
}

impl RuleBound {
    /// Closed synthesis interval `[lo, hi]`.
    pub fn interval(&self) -> (f64, f64) {
        match *self {
            RuleBound::Range { min, max } => (min, max),
            RuleBound::AtLeast(min) => (min, min * ONE_SIDED_UPPER_FACTOR),
            RuleBound::AtMost(max) => (max * ONE_SIDED_LOWER_FACTOR, max),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct DesignRule {
    /// Regulation article.
    pub id: &'static str,
    pub field: ParamField,
    pub bound: RuleBound,
    /// Exponent on the uniform draw: `> 1` skews toward the lower bound, `< 1` toward the upper.
    pub bias: f64,
    /// Decimal places kept after synthesis.
    pub precision: u32,
    /// Hard regulatory floor applied after rounding.
    pub floor: Option<f64>,
    /// Hard regulatory ceiling applied after rounding.
    pub ceiling: Option<f64>,
    /// Scrutineering limits; values outside fail the check but are kept.
    pub legal_min: Option<f64>,
    pub legal_max: Option<f64>,
}

impl DesignRule {
    const fn range(id: &'static str, field: ParamField, min: f64, max: f64) -> Self {
        Self {
            id,
            field,
            bound: RuleBound::Range { min, max },
            bias: 1.0,
            precision: 1,
            floor: None,
            ceiling: None,
            legal_min: Some(min),
            legal_max: Some(max),
        }
    }

    const fn biased(mut self, bias: f64) -> Self {
        self.bias = bias;
        self
    }

    const fn precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }

    const fn legal(mut self, legal_min: Option<f64>, legal_max: Option<f64>) -> Self {
        self.legal_min = legal_min;
        self.legal_max = legal_max;
        self
    }

    const fn clamped(mut self, floor: Option<f64>, ceiling: Option<f64>) -> Self {
        self.floor = floor;
        self.ceiling = ceiling;
        self
    }

    const fn at_least(id: &'static str, field: ParamField, min: f64) -> Self {
        let mut rule = Self::range(id, field, min, min);
        rule.bound = RuleBound::AtLeast(min);
        rule.legal_max = None;
        rule
    }

    const fn at_most(id: &'static str, field: ParamField, max: f64) -> Self {
        let mut rule = Self::range(id, field, max, max);
        rule.bound = RuleBound::AtMost(max);
        rule.legal_min = None;
        rule
    }
}

/// The ordered rule table. Synthesis consumes one stream draw per row, in this order.
pub static RULES: [DesignRule; 16] = [
    DesignRule::range("T3.1", ParamField::TotalLengthMm, 170.0, 210.0),
    DesignRule::range("T3.3", ParamField::TotalWidthMm, 60.0, 85.0)
        .biased(0.55)
        .legal(Some(65.0), Some(85.0)),
    DesignRule::range("T3.5", ParamField::BodyHeightMm, 35.0, 65.0).legal(None, Some(65.0)),
    DesignRule::at_least("T4.1", ParamField::TotalMassG, 50.0)
        .biased(2.5)
        .clamped(Some(50.0), None),
    DesignRule::range("T5.2", ParamField::FrontWingSpanMm, 40.0, 85.0),
    DesignRule::range("T5.3", ParamField::FrontWingChordMm, 15.0, 25.0),
    DesignRule::range("T5.4", ParamField::FrontWingThicknessMm, 1.2, 6.0)
        .biased(1.4)
        .precision(2)
        .legal(Some(1.5), None),
    DesignRule::range("T6.2", ParamField::RearWingSpanMm, 40.0, 85.0),
    DesignRule::range("T6.3", ParamField::RearWingChordMm, 15.0, 25.0),
    DesignRule::at_most("T6.5", ParamField::RearWingHeightMm, 55.0)
        .biased(0.8)
        .clamped(None, Some(55.0)),
    DesignRule::range("T7.1", ParamField::WheelDiameterMm, 26.0, 34.0),
    DesignRule::range("T7.3", ParamField::WheelWidthMm, 15.0, 29.0),
    DesignRule::at_least("T8.1", ParamField::CanisterClearanceMm, 3.5)
        .biased(2.2)
        .precision(2)
        .clamped(Some(3.5), None),
    DesignRule::range("T9.1", ParamField::SurfaceFinishScore, 60.0, 100.0)
        .precision(0)
        .legal(Some(70.0), None),
    DesignRule::range("T10.1", ParamField::StructuralIntegrityScore, 70.0, 100.0)
        .precision(0)
        .legal(Some(75.0), None),
    DesignRule::range("T11.1", ParamField::RegulationCompliancePct, 85.0, 100.0)
        .biased(0.7)
        .clamped(None, Some(100.0))
        .legal(Some(90.0), Some(100.0)),
];

pub fn find_rule(id: &str) -> DesignResult<&'static DesignRule> {
    RULES
        .iter()
        .find(|r| r.id == id)
        .ok_or_else(|| DesignError::UnknownRule { id: id.to_string() })
}
