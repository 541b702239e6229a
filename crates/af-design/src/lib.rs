//! af-design: vehicle design synthesis.
//!
//! Provides:
//! - the ordered regulation rule table
//! - design parameter synthesis (one stream draw per rule)
//! - aerodynamic coefficient synthesis (four stream draws)
//! - scrutineering checks against legal limits

pub mod aero;
pub mod error;
pub mod params;
pub mod rules;
pub mod scrutineering;

pub use aero::{AeroCoefficients, DragBreakdown, synthesize_coefficients};
pub use error::{DesignError, DesignResult};
pub use params::{DesignParameters, ParamField, synthesize_parameters, synthesize_parameters_with};
pub use rules::{DesignRule, RULES, RuleBound};
pub use scrutineering::{RuleCheck, ScrutineeringReport, inspect};
