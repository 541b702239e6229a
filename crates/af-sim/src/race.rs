//! Monte Carlo straight-line race prediction.
//!
//! Each trial is a closed-form two-phase run down the track:
//!
//! * thrust: `m dv/dt = F - R - k v²`, giving `v = v_t tanh(αt)` and
//!   `x = (m/k) ln cosh(αt)` with `v_t = √((F-R)/k)` and `α = √((F-R)k)/m`
//! * coast: `m dv/dt = -(k v² + R)`, giving `v = √(R/k) tan(φ0 - ωt)` and
//!   `x = (m/k) ln(cos φ / cos φ0)` with `ω = √(kR)/m`
//!
//! where `k = ½ρ Cd A` and `R = μ m g`. Trial conditions are drawn sequentially
//! (force, burn, friction, density per trial) and the physics is evaluated in parallel.

use af_core::units::{self, constants};
use af_core::{DeterministicStream, clamp_finite, ensure_finite};
use af_design::{AeroCoefficients, DesignParameters};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::stats::{Aggregate, RunningStats};

pub const CD_WINDOW: (f64, f64) = (0.05, 1.5);
pub const MASS_WINDOW_G: (f64, f64) = (45.0, 200.0);
pub const AREA_WINDOW_M2: (f64, f64) = (0.000_5, 0.02);

pub const FORCE_SPREAD: f64 = 0.10;
pub const BURN_SPREAD: f64 = 0.08;
pub const FRICTION_SPREAD: f64 = 0.25;
pub const DENSITY_SPREAD: f64 = 0.03;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceOptions {
    pub samples: usize,
    /// Upper bound on the visualization subsample.
    pub visualization_points: usize,
    pub track_length_m: f64,
    pub launch_force_n: f64,
    pub burn_time_s: f64,
    pub rolling_coefficient: f64,
    pub air_density_kg_m3: f64,
    /// Time recorded for a car that stops before the line.
    pub max_time_s: f64,
}

impl Default for RaceOptions {
    fn default() -> Self {
        Self {
            samples: 5_000,
            visualization_points: 300,
            track_length_m: 20.0,
            launch_force_n: 4.0,
            burn_time_s: 0.30,
            rolling_coefficient: 0.018,
            air_density_kg_m3: constants::AIR_DENSITY_KG_M3,
            max_time_s: 5.0,
        }
    }
}

/// Car properties after clamping into the windows the closed form is valid for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RaceInputs {
    pub cd: f64,
    pub mass_g: f64,
    pub frontal_area_m2: f64,
}

impl RaceInputs {
    pub fn new(cd: f64, mass_g: f64, frontal_area_m2: f64) -> Self {
        let inputs = Self {
            cd: clamp_finite(cd, CD_WINDOW.0, CD_WINDOW.1),
            mass_g: clamp_finite(mass_g, MASS_WINDOW_G.0, MASS_WINDOW_G.1),
            frontal_area_m2: clamp_finite(frontal_area_m2, AREA_WINDOW_M2.0, AREA_WINDOW_M2.1),
        };
        if inputs.cd != cd || inputs.mass_g != mass_g || inputs.frontal_area_m2 != frontal_area_m2
        {
            tracing::debug!(cd, mass_g, frontal_area_m2, ?inputs, "race inputs clamped");
        }
        inputs
    }

    pub fn from_design(params: &DesignParameters, coefficients: &AeroCoefficients) -> Self {
        Self::new(
            coefficients.cd,
            params.total_mass_g,
            coefficients.frontal_area_m2,
        )
    }
}

/// Perturbed conditions for one trial.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RaceTrial {
    pub launch_force_n: f64,
    pub burn_time_s: f64,
    pub friction_coefficient: f64,
    pub air_density_kg_m3: f64,
}

impl RaceTrial {
    fn draw(stream: &mut DeterministicStream, opts: &RaceOptions) -> Self {
        Self {
            launch_force_n: opts.launch_force_n * (1.0 + stream.draw_centered(FORCE_SPREAD)),
            burn_time_s: opts.burn_time_s * (1.0 + stream.draw_centered(BURN_SPREAD)),
            friction_coefficient: opts.rolling_coefficient
                * (1.0 + stream.draw_centered(FRICTION_SPREAD)),
            air_density_kg_m3: opts.air_density_kg_m3
                * (1.0 + stream.draw_centered(DENSITY_SPREAD)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloPoint {
    pub time_s: f64,
    /// Speed at burn-out, or at the line if it is reached during the burn.
    pub start_speed_mps: f64,
    pub finish_speed_mps: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceStatistics {
    pub time: Aggregate,
    pub start_speed: Aggregate,
    pub finish_speed: Aggregate,
    /// Trials that stopped short and were recorded at the maximum time.
    pub stopped_short: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceTimePrediction {
    pub sample_count: usize,
    pub statistics: RaceStatistics,
    /// Rank-stratified visualization subsample, ordered by time.
    pub points: Vec<MonteCarloPoint>,
    pub subsample_mean_time_s: f64,
    pub inputs: RaceInputs,
}

/// `ln(cosh(x))` without overflow for large `|x|`.
fn ln_cosh(x: f64) -> f64 {
    let a = x.abs();
    a + (-2.0 * a).exp().ln_1p() - std::f64::consts::LN_2
}

/// `acosh(exp(y))` for `y >= 0` without overflow.
fn acosh_exp(y: f64) -> f64 {
    y + (1.0 - (-2.0 * y).exp()).max(0.0).sqrt().ln_1p()
}

fn run_trial(inputs: &RaceInputs, trial: &RaceTrial, opts: &RaceOptions) -> MonteCarloPoint {
    let mass = units::grams(inputs.mass_g);
    let m = units::mass_kg(mass);
    let rolling = trial.friction_coefficient * units::force_n(mass * constants::g0());
    let k = 0.5 * trial.air_density_kg_m3 * inputs.cd * inputs.frontal_area_m2;
    let track = opts.track_length_m;

    let stopped = MonteCarloPoint {
        time_s: opts.max_time_s,
        start_speed_mps: 0.0,
        finish_speed_mps: 0.0,
    };

    let net = trial.launch_force_n - rolling;
    if net <= 0.0 || trial.burn_time_s <= 0.0 {
        return stopped;
    }
    let terminal = (net / k).sqrt();
    let alpha = (net * k).sqrt() / m;

    // Line reached while still under thrust.
    let line_phase = acosh_exp(k * track / m);
    if line_phase <= alpha * trial.burn_time_s {
        let v = terminal * line_phase.tanh();
        return MonteCarloPoint {
            time_s: (line_phase / alpha).min(opts.max_time_s),
            start_speed_mps: v,
            finish_speed_mps: v,
        };
    }

    let burn_phase = alpha * trial.burn_time_s;
    let v_burn = terminal * burn_phase.tanh();
    let x_burn = (m / k) * ln_cosh(burn_phase);
    let coast = track - x_burn;

    let phi0 = (v_burn * (k / rolling).sqrt()).atan();
    let c = phi0.cos() * (k * coast / m).exp();
    if c >= 1.0 {
        return MonteCarloPoint {
            start_speed_mps: v_burn,
            ..stopped
        };
    }
    let phi_f = c.acos();
    let omega = (k * rolling).sqrt() / m;
    let t = trial.burn_time_s + (phi0 - phi_f) / omega;
    if t >= opts.max_time_s {
        return MonteCarloPoint {
            start_speed_mps: v_burn,
            ..stopped
        };
    }
    MonteCarloPoint {
        time_s: t,
        start_speed_mps: v_burn,
        finish_speed_mps: (rolling / k).sqrt() * phi_f.tan(),
    }
}

/// Pick the time-rank midpoint of each of `k` equal strata.
fn stratified_subsample(points: &[MonteCarloPoint], k: usize) -> Vec<MonteCarloPoint> {
    let n = points.len();
    let k = k.min(n);
    if k == 0 {
        return Vec::new();
    }
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| points[a].time_s.total_cmp(&points[b].time_s));
    (0..k)
        .map(|j| {
            let start = j * n / k;
            let end = (j + 1) * n / k;
            points[order[(start + end) / 2]]
        })
        .collect()
}

fn validate(opts: &RaceOptions) -> SimResult<()> {
    ensure_finite(opts.burn_time_s, "race burn time")?;
    ensure_finite(opts.rolling_coefficient, "race rolling coefficient")?;
    if opts.samples == 0 {
        return Err(SimError::InvalidArg {
            what: "race samples must be positive",
        });
    }
    if !(opts.track_length_m > 0.0) {
        return Err(SimError::InvalidArg {
            what: "track length must be positive",
        });
    }
    if !(opts.max_time_s > 0.0) {
        return Err(SimError::InvalidArg {
            what: "max time must be positive",
        });
    }
    if !(opts.air_density_kg_m3 > 0.0 && opts.launch_force_n > 0.0) {
        return Err(SimError::NonPhysical {
            what: "air density and launch force must be positive",
        });
    }
    Ok(())
}

/// Run `opts.samples` trials. Takes four draws per trial from `stream`.
pub fn simulate_races(
    inputs: RaceInputs,
    stream: &mut DeterministicStream,
    opts: &RaceOptions,
) -> SimResult<RaceTimePrediction> {
    validate(opts)?;

    let trials: Vec<RaceTrial> = (0..opts.samples)
        .map(|_| RaceTrial::draw(stream, opts))
        .collect();
    let population: Vec<MonteCarloPoint> = trials
        .par_iter()
        .map(|trial| run_trial(&inputs, trial, opts))
        .collect();

    let mut time = RunningStats::new();
    let mut start = RunningStats::new();
    let mut finish = RunningStats::new();
    let mut stopped_short = 0;
    for p in &population {
        time.update(p.time_s);
        start.update(p.start_speed_mps);
        finish.update(p.finish_speed_mps);
        if p.finish_speed_mps == 0.0 {
            stopped_short += 1;
        }
    }
    if stopped_short > 0 {
        tracing::warn!(
            stopped_short,
            samples = opts.samples,
            "trials stopped before the line"
        );
    }

    let points = stratified_subsample(&population, opts.visualization_points);
    let subsample_mean_time_s =
        af_core::mean(&points.iter().map(|p| p.time_s).collect::<Vec<_>>());

    Ok(RaceTimePrediction {
        sample_count: population.len(),
        statistics: RaceStatistics {
            time: time.lower_is_better(),
            start_speed: start.higher_is_better(),
            finish_speed: finish.higher_is_better(),
            stopped_short,
        },
        points,
        subsample_mean_time_s,
        inputs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use af_core::Seed;

    fn nominal() -> RaceInputs {
        RaceInputs::new(0.3, 55.0, 0.003)
    }

    fn nominal_trial() -> RaceTrial {
        let o = RaceOptions::default();
        RaceTrial {
            launch_force_n: o.launch_force_n,
            burn_time_s: o.burn_time_s,
            friction_coefficient: o.rolling_coefficient,
            air_density_kg_m3: o.air_density_kg_m3,
        }
    }

    #[test]
    fn nominal_car_runs_about_a_second() {
        let p = run_trial(&nominal(), &nominal_trial(), &RaceOptions::default());
        assert!(p.time_s > 0.8 && p.time_s < 1.6, "{p:?}");
        assert!(p.start_speed_mps > p.finish_speed_mps);
        assert!(p.finish_speed_mps > 0.0);
    }

    #[test]
    fn short_track_finishes_under_thrust() {
        let opts = RaceOptions {
            track_length_m: 1.0,
            ..RaceOptions::default()
        };
        let p = run_trial(&nominal(), &nominal_trial(), &opts);
        assert!(p.time_s < opts.burn_time_s);
        assert_eq!(p.start_speed_mps, p.finish_speed_mps);
    }

    #[test]
    fn weak_launch_is_clamped_to_max_time() {
        let opts = RaceOptions {
            track_length_m: 500.0,
            ..RaceOptions::default()
        };
        let p = run_trial(&nominal(), &nominal_trial(), &opts);
        assert_eq!(p.time_s, opts.max_time_s);
        assert_eq!(p.finish_speed_mps, 0.0);
    }

    #[test]
    fn heavier_car_is_slower() {
        let opts = RaceOptions::default();
        let light = run_trial(&nominal(), &nominal_trial(), &opts);
        let heavy = run_trial(&RaceInputs::new(0.3, 120.0, 0.003), &nominal_trial(), &opts);
        assert!(heavy.time_s > light.time_s);
    }

    #[test]
    fn inputs_are_clamped() {
        let i = RaceInputs::new(f64::NAN, 10_000.0, -1.0);
        assert_eq!(i.cd, CD_WINDOW.0);
        assert_eq!(i.mass_g, MASS_WINDOW_G.1);
        assert_eq!(i.frontal_area_m2, AREA_WINDOW_M2.0);
    }

    #[test]
    fn ordering_and_subsample_tolerance() {
        let pred = simulate_races(
            nominal(),
            &mut DeterministicStream::new(Seed(8_675_309)),
            &RaceOptions::default(),
        )
        .unwrap();
        let t = pred.statistics.time;
        assert!(t.best <= t.average && t.average <= t.worst);
        for s in [pred.statistics.start_speed, pred.statistics.finish_speed] {
            assert!(s.worst <= s.average && s.average <= s.best);
        }
        assert_eq!(pred.sample_count, 5_000);
        assert_eq!(pred.points.len(), 300);
        assert!(pred.points.windows(2).all(|w| w[0].time_s <= w[1].time_s));
        let rel = (pred.subsample_mean_time_s - t.average).abs() / t.average;
        assert!(rel < 0.01, "{rel}");
        assert!(t.std_dev > 0.0);
    }

    #[test]
    fn subsample_never_exceeds_population() {
        let opts = RaceOptions {
            samples: 40,
            ..RaceOptions::default()
        };
        let pred =
            simulate_races(nominal(), &mut DeterministicStream::new(Seed(5)), &opts).unwrap();
        assert_eq!(pred.points.len(), 40);
    }

    #[test]
    fn four_draws_per_trial() {
        let opts = RaceOptions {
            samples: 17,
            ..RaceOptions::default()
        };
        let mut stream = DeterministicStream::new(Seed(21));
        simulate_races(nominal(), &mut stream, &opts).unwrap();
        assert_eq!(stream.draws_taken(), 68);
    }

    #[test]
    fn zero_samples_rejected() {
        let opts = RaceOptions {
            samples: 0,
            ..RaceOptions::default()
        };
        assert!(simulate_races(nominal(), &mut DeterministicStream::new(Seed(1)), &opts).is_err());
    }

    #[test]
    fn non_finite_burn_rejected() {
        let opts = RaceOptions {
            burn_time_s: f64::NAN,
            ..RaceOptions::default()
        };
        let mut stream = DeterministicStream::new(Seed(1));
        let err = simulate_races(nominal(), &mut stream, &opts).unwrap_err();
        assert!(matches!(err, SimError::Core(_)), "{err}");
        assert_eq!(stream.draws_taken(), 0);
    }

    #[test]
    fn stable_helpers() {
        assert!((ln_cosh(0.5) - 0.5f64.cosh().ln()).abs() < 1e-12);
        assert!(ln_cosh(1_000.0).is_finite());
        assert!((acosh_exp(0.3) - 0.3f64.exp().acosh()).abs() < 1e-12);
        assert_eq!(acosh_exp(0.0), 0.0);
    }
}
