//! Query helpers for extracting data from completed results.

use std::str::FromStr;

use af_config::Tier;
use af_core::Seed;
use af_results::AeroResult;
use af_sim::{ConvergenceStatus, FlowFieldPoint, ResidualField};

use crate::error::{AppError, AppResult};

/// Headline numbers of one result.
#[derive(Debug, Clone)]
pub struct ResultSummary {
    pub result_id: String,
    pub filename: String,
    pub tier: Tier,
    pub seed: Seed,
    pub cd: f64,
    pub cl: f64,
    pub lift_to_drag_ratio: f64,
    pub mean_race_time_s: f64,
    pub best_race_time_s: f64,
    pub race_samples: usize,
    pub convergence: ConvergenceStatus,
    pub scrutineering_passed: usize,
    pub scrutineering_failed: usize,
    pub optimized_cd: f64,
    pub flow_field_points: usize,
}

pub fn summarize(result: &AeroResult) -> ResultSummary {
    ResultSummary {
        result_id: result.id().to_string(),
        filename: result.metadata.filename.clone(),
        tier: result.metadata.tier,
        seed: result.metadata.seed,
        cd: result.coefficients.cd,
        cl: result.coefficients.cl,
        lift_to_drag_ratio: result.coefficients.lift_to_drag_ratio,
        mean_race_time_s: result.race.statistics.time.average,
        best_race_time_s: result.race.statistics.time.best,
        race_samples: result.race.sample_count,
        convergence: result.residuals.status,
        scrutineering_passed: result.scrutineering.passed,
        scrutineering_failed: result.scrutineering.failed,
        optimized_cd: result.correction.optimized_cd,
        flow_field_points: result.flow_field.len(),
    }
}

/// Series names accepted by [`extract_series`].
pub const SERIES_NAMES: [&str; 8] = [
    "residual.continuity",
    "residual.x_velocity",
    "residual.y_velocity",
    "residual.z_velocity",
    "race.time_vs_start_speed",
    "race.finish_vs_start_speed",
    "epoch.cd",
    "epoch.improvement_pct",
];

/// Extract an `(x, y)` series by name.
///
/// Residual series are keyed by iteration, race series by start speed (visualization
/// subsample only) and epoch series by the 1-based epoch number.
pub fn extract_series(result: &AeroResult, name: &str) -> AppResult<Vec<(f64, f64)>> {
    if let Some(field) = name.strip_prefix("residual.") {
        let field = ResidualField::parse(field)
            .ok_or_else(|| AppError::InvalidInput(format!("Unknown residual field: {field}")))?;
        return Ok(result.residuals.series(field));
    }

    let points = &result.race.points;
    let epochs = &result.correction.epochs;
    let series = match name {
        "race.time_vs_start_speed" => points
            .iter()
            .map(|p| (p.start_speed_mps, p.time_s))
            .collect(),
        "race.finish_vs_start_speed" => points
            .iter()
            .map(|p| (p.start_speed_mps, p.finish_speed_mps))
            .collect(),
        "epoch.cd" => epochs
            .iter()
            .map(|e| (e.epoch as f64, e.result_cd))
            .collect(),
        "epoch.improvement_pct" => epochs
            .iter()
            .map(|e| (e.epoch as f64, e.improvement_pct))
            .collect(),
        _ => {
            return Err(AppError::InvalidInput(format!(
                "Unknown series: {name} (expected one of {})",
                SERIES_NAMES.join(", ")
            )));
        }
    };
    Ok(series)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceAxis {
    X,
    Y,
    Z,
}

impl SliceAxis {
    pub fn coordinate(self, point: &FlowFieldPoint) -> f64 {
        match self {
            SliceAxis::X => point.x,
            SliceAxis::Y => point.y,
            SliceAxis::Z => point.z,
        }
    }
}

impl FromStr for SliceAxis {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "x" => Ok(SliceAxis::X),
            "y" => Ok(SliceAxis::Y),
            "z" => Ok(SliceAxis::Z),
            _ => Err(AppError::InvalidInput(format!("Unknown slice axis: {s}"))),
        }
    }
}

/// Points within `half_width` mm of the plane `axis = at`, in sample order.
pub fn flow_field_slice(
    points: &[FlowFieldPoint],
    axis: SliceAxis,
    at: f64,
    half_width: f64,
) -> AppResult<Vec<FlowFieldPoint>> {
    if !at.is_finite() || !half_width.is_finite() || half_width < 0.0 {
        return Err(AppError::InvalidInput(format!(
            "Invalid slice at {at} +/- {half_width}"
        )));
    }
    Ok(points
        .iter()
        .filter(|p| (axis.coordinate(p) - at).abs() <= half_width)
        .copied()
        .collect())
}

/// One row of the design parameter table.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterRow {
    pub name: &'static str,
    pub value: f64,
    pub unit: &'static str,
    pub rule_id: Option<String>,
    pub passed: Option<bool>,
}

/// Parameters in table order, joined with their scrutineering checks.
pub fn parameter_table(result: &AeroResult) -> Vec<ParameterRow> {
    result
        .parameters
        .entries()
        .map(|(field, value)| {
            let check = result
                .scrutineering
                .checks
                .iter()
                .find(|c| c.field == field);
            ParameterRow {
                name: field.name(),
                value,
                unit: field.unit(),
                rule_id: check.map(|c| c.rule_id.clone()),
                passed: check.map(|c| c.passed),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(x: f64, y: f64, z: f64) -> FlowFieldPoint {
        FlowFieldPoint {
            x,
            y,
            z,
            pressure: 0.0,
            velocity: 20.0,
        }
    }

    #[test]
    fn slice_keeps_points_near_the_plane() {
        let points = vec![point(0.0, -5.0, 1.0), point(10.0, 0.4, 2.0), point(20.0, 3.0, 3.0)];
        let slice = flow_field_slice(&points, SliceAxis::Y, 0.0, 0.5).unwrap();
        assert_eq!(slice, vec![points[1]]);

        let all = flow_field_slice(&points, SliceAxis::X, 10.0, 10.0).unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn slice_rejects_bad_width() {
        assert!(flow_field_slice(&[], SliceAxis::Z, 0.0, -1.0).is_err());
        assert!(flow_field_slice(&[], SliceAxis::Z, f64::NAN, 1.0).is_err());
    }

    #[test]
    fn axis_parses_either_case() {
        assert_eq!("X".parse::<SliceAxis>().unwrap(), SliceAxis::X);
        assert_eq!("z".parse::<SliceAxis>().unwrap(), SliceAxis::Z);
        assert!("w".parse::<SliceAxis>().is_err());
    }
}
