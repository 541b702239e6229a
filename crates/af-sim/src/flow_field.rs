//! Flow-field point cloud around an ellipsoidal stand-in for the car body.
//!
//! Positions are in millimetres in the car frame (nose at x = 0, centreline at y = 0,
//! track surface at z = 0). Velocity is in m/s, pressure is Bernoulli gauge pressure
//! in Pa relative to the free stream.
//!
//! Speeds follow potential flow around a unit sphere in normalized body coordinates,
//! reduced by a Gaussian wake behind the body and perturbed by one bounded draw.
//! Draw order per point: x, y, z, velocity perturbation.

use af_core::DeterministicStream;
use af_core::units::{self, constants::AIR_DENSITY_KG_M3};
use af_design::DesignParameters;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Normalized radius of the shell that interior points are pushed onto.
pub const SURFACE_SHELL: f64 = 1.02;
/// Relative half-width of the per-point velocity perturbation.
pub const VELOCITY_PERTURBATION: f64 = 0.03;

const WAKE_DEPTH: f64 = 0.35;
const WAKE_WIDTH: f64 = 0.7;
const WAKE_ONSET: f64 = 3.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowFieldOptions {
    pub points: usize,
    pub free_stream_mps: f64,
    pub air_density_kg_m3: f64,
}

impl Default for FlowFieldOptions {
    fn default() -> Self {
        Self {
            points: 2_000,
            free_stream_mps: 20.0,
            air_density_kg_m3: AIR_DENSITY_KG_M3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlowFieldPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub pressure: f64,
    pub velocity: f64,
}

/// Body ellipsoid and sampling box derived from the design envelope.
#[derive(Debug, Clone, Copy)]
struct Envelope {
    centre: Vector3<f64>,
    semi_axes: Vector3<f64>,
    lo: Vector3<f64>,
    hi: Vector3<f64>,
}

impl Envelope {
    fn from_params(params: &DesignParameters) -> Self {
        let l = params.total_length_mm.max(1.0);
        let w = params.total_width_mm.max(1.0);
        let h = params.body_height_mm.max(1.0);
        Self {
            centre: Vector3::new(0.5 * l, 0.0, 0.5 * h),
            semi_axes: Vector3::new(0.5 * l, 0.5 * w, 0.5 * h),
            lo: Vector3::new(-0.25 * l, -1.5 * w, 0.0),
            hi: Vector3::new(1.75 * l, 1.5 * w, 2.5 * h),
        }
    }

    fn to_body(&self, p: &Vector3<f64>) -> Vector3<f64> {
        (p - self.centre).component_div(&self.semi_axes)
    }

    fn to_world(&self, q: &Vector3<f64>) -> Vector3<f64> {
        self.centre + q.component_mul(&self.semi_axes)
    }
}

/// Speed relative to the free stream for potential flow past a unit sphere, with the
/// flow along +x.
fn potential_speed_ratio(q: &Vector3<f64>) -> f64 {
    let r = q.norm().max(1.0);
    let cos_t = (q.x / r).clamp(-1.0, 1.0);
    let sin_t = (1.0 - cos_t * cos_t).sqrt();
    let inv_r3 = 1.0 / (r * r * r);
    let radial = cos_t * (1.0 - inv_r3);
    let tangential = sin_t * (1.0 + 0.5 * inv_r3);
    (radial * radial + tangential * tangential).sqrt()
}

/// Fractional speed loss in the wake. Zero ahead of the body centre.
fn wake_deficit(q: &Vector3<f64>) -> f64 {
    if q.x <= 0.0 {
        return 0.0;
    }
    let spread = 1.0 + 0.5 * q.x;
    let lateral2 = q.y * q.y + q.z * q.z;
    let onset = 1.0 - (-WAKE_ONSET * q.x).exp();
    WAKE_DEPTH * onset * (-lateral2 / (WAKE_WIDTH * WAKE_WIDTH * spread)).exp() / spread
}

/// Lazy generator of flow-field points. Owns its stream so it can be handed to a
/// worker or chained with other iterator adapters.
#[derive(Debug, Clone)]
pub struct FlowFieldSampler {
    stream: DeterministicStream,
    envelope: Envelope,
    remaining: usize,
    free_stream_mps: f64,
    air_density_kg_m3: f64,
}

impl FlowFieldSampler {
    pub fn new(
        params: &DesignParameters,
        stream: DeterministicStream,
        opts: &FlowFieldOptions,
    ) -> SimResult<Self> {
        if !(opts.free_stream_mps > 0.0 && opts.free_stream_mps.is_finite()) {
            return Err(SimError::InvalidArg {
                what: "free stream speed must be positive",
            });
        }
        if !(opts.air_density_kg_m3 > 0.0 && opts.air_density_kg_m3.is_finite()) {
            return Err(SimError::InvalidArg {
                what: "air density must be positive",
            });
        }
        Ok(Self {
            stream,
            envelope: Envelope::from_params(params),
            remaining: opts.points,
            free_stream_mps: opts.free_stream_mps,
            air_density_kg_m3: opts.air_density_kg_m3,
        })
    }

    fn sample(&mut self) -> FlowFieldPoint {
        let env = self.envelope;
        let u = Vector3::new(self.stream.draw(), self.stream.draw(), self.stream.draw());
        let noise = self.stream.draw_centered(VELOCITY_PERTURBATION);

        let mut p = env.lo + (env.hi - env.lo).component_mul(&u);
        let mut q = env.to_body(&p);
        let r = q.norm();
        if r < SURFACE_SHELL {
            let dir = if r > 0.0 { q / r } else { -Vector3::x() };
            p = env.to_world(&(dir * SURFACE_SHELL));
            p.z = p.z.max(0.0);
            q = env.to_body(&p);
        }

        let ratio = potential_speed_ratio(&q) * (1.0 - wake_deficit(&q));
        let velocity = (self.free_stream_mps * ratio * (1.0 + noise)).max(0.0);
        let rho = units::kg_per_m3(self.air_density_kg_m3);
        let (u, v) = (units::mps(self.free_stream_mps), units::mps(velocity));
        let pressure = units::pressure_pa(rho * (u * u - v * v) * 0.5);

        FlowFieldPoint {
            x: p.x,
            y: p.y,
            z: p.z,
            pressure,
            velocity,
        }
    }
}

impl Iterator for FlowFieldSampler {
    type Item = FlowFieldPoint;

    fn next(&mut self) -> Option<FlowFieldPoint> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(self.sample())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for FlowFieldSampler {}

/// Collect the full cloud. Takes four draws per point from `stream`.
pub fn synthesize_flow_field(
    params: &DesignParameters,
    stream: DeterministicStream,
    opts: &FlowFieldOptions,
) -> SimResult<Vec<FlowFieldPoint>> {
    let sampler = FlowFieldSampler::new(params, stream, opts)?;
    let points: Vec<FlowFieldPoint> = sampler.collect();
    tracing::debug!(points = points.len(), "flow field synthesized");
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use af_core::Seed;
    use af_design::synthesize_parameters;

    fn params() -> DesignParameters {
        synthesize_parameters(&mut DeterministicStream::new(Seed(515)))
    }

    fn cloud(seed: u64, points: usize) -> Vec<FlowFieldPoint> {
        let opts = FlowFieldOptions {
            points,
            ..FlowFieldOptions::default()
        };
        synthesize_flow_field(&params(), DeterministicStream::new(Seed(seed)), &opts).unwrap()
    }

    #[test]
    fn produces_requested_count_lazily() {
        let sampler = FlowFieldSampler::new(
            &params(),
            DeterministicStream::new(Seed(4)),
            &FlowFieldOptions::default(),
        )
        .unwrap();
        assert_eq!(sampler.len(), 2_000);
        let first: Vec<_> = sampler.take(3).collect();
        assert_eq!(first.len(), 3);
        assert_eq!(first, cloud(4, 3));
    }

    #[test]
    fn points_stay_in_the_sampling_box() {
        let p = params();
        let (l, w, h) = (p.total_length_mm, p.total_width_mm, p.body_height_mm);
        for pt in cloud(99, 3_000) {
            assert!(pt.x >= -0.25 * l - 1e-9 && pt.x <= 1.75 * l + 1e-9);
            assert!(pt.y.abs() <= 1.5 * w + 1e-9);
            assert!(pt.z >= 0.0 && pt.z <= 2.5 * h + 1e-9);
        }
    }

    #[test]
    fn no_point_inside_the_body() {
        let env = Envelope::from_params(&params());
        for pt in cloud(7_001, 3_000) {
            let q = env.to_body(&Vector3::new(pt.x, pt.y, pt.z));
            assert!(q.norm() >= 0.99, "{pt:?}");
        }
    }

    #[test]
    fn pressure_is_bernoulli() {
        let opts = FlowFieldOptions::default();
        for pt in cloud(12, 500) {
            let expected =
                0.5 * opts.air_density_kg_m3 * (opts.free_stream_mps.powi(2) - pt.velocity.powi(2));
            assert!((pt.pressure - expected).abs() < 1e-9);
            assert!(pt.velocity >= 0.0 && pt.velocity.is_finite());
        }
    }

    #[test]
    fn wake_is_slower_than_the_flanks() {
        let env = Envelope::from_params(&params());
        let mut wake = Vec::new();
        let mut flank = Vec::new();
        for pt in cloud(31_337, 6_000) {
            let q = env.to_body(&Vector3::new(pt.x, pt.y, pt.z));
            if q.x > 1.2 && (q.y * q.y + q.z * q.z).sqrt() < 0.6 {
                wake.push(pt.velocity);
            } else if q.y.abs() > 2.0 {
                flank.push(pt.velocity);
            }
        }
        assert!(!wake.is_empty() && !flank.is_empty());
        assert!(af_core::mean(&wake) < af_core::mean(&flank));
    }

    #[test]
    fn four_draws_per_point() {
        let mut sampler = FlowFieldSampler::new(
            &params(),
            DeterministicStream::new(Seed(2)),
            &FlowFieldOptions::default(),
        )
        .unwrap();
        for _ in 0..25 {
            sampler.next();
        }
        assert_eq!(sampler.stream.draws_taken(), 100);
    }

    #[test]
    fn rejects_non_positive_free_stream() {
        let opts = FlowFieldOptions {
            free_stream_mps: 0.0,
            ..FlowFieldOptions::default()
        };
        assert!(FlowFieldSampler::new(&params(), DeterministicStream::new(Seed(1)), &opts).is_err());
    }

    #[test]
    fn stagnation_is_slower_than_shoulder() {
        let nose = potential_speed_ratio(&Vector3::new(-1.0, 0.0, 0.0));
        let shoulder = potential_speed_ratio(&Vector3::new(0.0, 1.0, 0.0));
        assert!(nose < 1e-9);
        assert!((shoulder - 1.5).abs() < 1e-12);
    }
}
