//! Aerodynamic coefficient synthesis.
//!
//! Cd and Cl are smooth functions of the design geometry, each perturbed by one
//! bounded stream draw. Draw order: Cd band, Cl band, drag split, aero balance.

use af_core::{DeterministicStream, clamp_finite, round_to, units};
use serde::{Deserialize, Serialize};

use crate::params::DesignParameters;

/// Half-width of the relative perturbation band on Cd and Cl.
pub const COEFFICIENT_BAND: f64 = 0.08;
pub const CD_WINDOW: (f64, f64) = (0.08, 1.2);
pub const CL_WINDOW: (f64, f64) = (0.01, 1.5);
/// Pressure share of total drag, in percent. Kept at or above 50 so the
/// complementary skin-friction share is computed exactly.
pub const PRESSURE_SHARE_WINDOW: (f64, f64) = (55.0, 80.0);
pub const BALANCE_WINDOW: (f64, f64) = (40.0, 60.0);

const REFERENCE_AREA_MM2: f64 = 3_500.0;
const OSWALD_EFFICIENCY: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DragBreakdown {
    pub pressure: f64,
    pub skin_friction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AeroCoefficients {
    pub cd: f64,
    pub cl: f64,
    pub lift_to_drag_ratio: f64,
    pub drag_breakdown: DragBreakdown,
    /// Front share of downforce, percent.
    pub aero_balance: f64,
    pub frontal_area_m2: f64,
}

/// Unperturbed downforce coefficient from wing aspect ratios and rear wing height.
fn base_cl(params: &DesignParameters) -> f64 {
    let height_factor = 0.8 + 0.4 * (params.rear_wing_height_mm / 55.0).clamp(0.0, 1.0);
    0.04 + 0.018 * params.front_wing_aspect_ratio()
        + 0.022 * params.rear_wing_aspect_ratio() * height_factor
}

/// Unperturbed drag: profile drag from the silhouette plus induced drag of the wings.
fn base_cd(params: &DesignParameters, cl: f64) -> f64 {
    let area_ratio = params.frontal_area_mm2() / REFERENCE_AREA_MM2;
    let profile = 0.14 + 0.20 * area_ratio + 0.03 * (params.front_wing_thickness_mm / 6.0)
        - 0.02 * ((params.total_length_mm - 170.0) / 40.0);
    let mean_ar = 0.5 * (params.front_wing_aspect_ratio() + params.rear_wing_aspect_ratio());
    let induced = cl * cl / (std::f64::consts::PI * OSWALD_EFFICIENCY * mean_ar.max(1.0));
    profile + induced
}

/// Derive coefficients from parameters, consuming exactly four draws.
pub fn synthesize_coefficients(
    params: &DesignParameters,
    stream: &mut DeterministicStream,
) -> AeroCoefficients {
    let cl_nominal = base_cl(params);
    let cd_nominal = base_cd(params, cl_nominal);

    let cd_band = stream.draw_centered(COEFFICIENT_BAND);
    let cl_band = stream.draw_centered(COEFFICIENT_BAND);
    let (cd_raw, cl_raw) = (cd_nominal * (1.0 + cd_band), cl_nominal * (1.0 + cl_band));
    let cd = clamp_finite(cd_raw, CD_WINDOW.0, CD_WINDOW.1);
    let cl = clamp_finite(cl_raw, CL_WINDOW.0, CL_WINDOW.1);
    if cd != cd_raw || cl != cl_raw {
        tracing::debug!(cd_raw, cl_raw, cd, cl, "coefficients clamped to window");
    }

    let (p_lo, p_hi) = PRESSURE_SHARE_WINDOW;
    let pressure = round_to(stream.draw_range(p_lo, p_hi), 1);
    let skin_friction = 100.0 - pressure;

    let (b_lo, b_hi) = BALANCE_WINDOW;
    let aero_balance = round_to(stream.draw_range(b_lo, b_hi), 1);

    AeroCoefficients {
        cd,
        cl,
        lift_to_drag_ratio: cl / cd,
        drag_breakdown: DragBreakdown {
            pressure,
            skin_friction,
        },
        aero_balance,
        frontal_area_m2: units::area_m2(units::mm2(params.frontal_area_mm2())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::synthesize_parameters;
    use af_core::Seed;

    fn coefficients(seed: u64) -> AeroCoefficients {
        let mut stream = DeterministicStream::new(Seed(seed));
        let params = synthesize_parameters(&mut stream);
        synthesize_coefficients(&params, &mut stream)
    }

    #[test]
    fn consumes_four_draws() {
        let mut stream = DeterministicStream::new(Seed(77));
        let params = synthesize_parameters(&mut stream);
        let before = stream.draws_taken();
        let _ = synthesize_coefficients(&params, &mut stream);
        assert_eq!(stream.draws_taken() - before, 4);
    }

    #[test]
    fn invariants_hold_across_seeds() {
        for seed in 0..2_000u64 {
            let c = coefficients(seed * 7_919 + 1);
            assert!((c.lift_to_drag_ratio - c.cl / c.cd).abs() < 1e-9);
            assert_eq!(
                c.drag_breakdown.pressure + c.drag_breakdown.skin_friction,
                100.0
            );
            assert!((0.0..=100.0).contains(&c.aero_balance));
            assert!(c.cd >= CD_WINDOW.0 && c.cd <= CD_WINDOW.1);
            assert!(c.cl >= CL_WINDOW.0 && c.cl <= CL_WINDOW.1);
        }
    }

    #[test]
    fn plausible_ranges() {
        let c = coefficients(515);
        assert!(c.cd > 0.15 && c.cd < 0.8, "cd {}", c.cd);
        assert!(c.cl > 0.05 && c.cl < 0.6, "cl {}", c.cl);
        assert!(c.frontal_area_m2 > 0.001 && c.frontal_area_m2 < 0.01);
    }

    #[test]
    fn bigger_silhouette_means_more_drag() {
        let mut small = synthesize_parameters(&mut DeterministicStream::new(Seed(5)));
        small.total_width_mm = 60.0;
        small.body_height_mm = 35.0;
        let mut large = small.clone();
        large.total_width_mm = 85.0;
        large.body_height_mm = 65.0;
        let cl = base_cl(&small);
        assert!(base_cd(&large, cl) > base_cd(&small, cl));
    }
}
