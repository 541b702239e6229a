//! Legal-limit checks consumed by the scrutineering checklist.

use serde::{Deserialize, Serialize};

use crate::params::{DesignParameters, ParamField};
use crate::rules::DesignRule;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleCheck {
    pub rule_id: String,
    pub field: ParamField,
    pub value: f64,
    pub legal_min: Option<f64>,
    pub legal_max: Option<f64>,
    pub passed: bool,
    /// Distance to the nearest legal limit; negative when the check fails, `None` when
    /// the rule carries no legal limit.
    pub margin: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrutineeringReport {
    pub checks: Vec<RuleCheck>,
    pub passed: usize,
    pub failed: usize,
}

impl ScrutineeringReport {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &RuleCheck> {
        self.checks.iter().filter(|c| !c.passed)
    }
}

fn check(rule: &DesignRule, value: f64) -> RuleCheck {
    let below = rule.legal_min.map(|min| value - min);
    let above = rule.legal_max.map(|max| max - value);
    let margin = match (below, above) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (Some(a), None) | (None, Some(a)) => Some(a),
        (None, None) => None,
    };
    RuleCheck {
        rule_id: rule.id.to_string(),
        field: rule.field,
        value,
        legal_min: rule.legal_min,
        legal_max: rule.legal_max,
        passed: margin.is_none_or(|m| m >= 0.0),
        margin,
    }
}

/// Check every rule in `rules` against `params`, in table order.
pub fn inspect(params: &DesignParameters, rules: &[DesignRule]) -> ScrutineeringReport {
    let checks: Vec<RuleCheck> = rules
        .iter()
        .map(|rule| check(rule, params.get(rule.field)))
        .collect();
    let passed = checks.iter().filter(|c| c.passed).count();
    ScrutineeringReport {
        failed: checks.len() - passed,
        passed,
        checks,
    }
}
