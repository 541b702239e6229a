use crate::CoreError;

/// Floating point type used throughout system
pub type Real = f64;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Round to a fixed number of decimal places.
pub fn round_to(v: Real, decimals: u32) -> Real {
    let scale = 10f64.powi(decimals as i32);
    (v * scale).round() / scale
}

/// Clamp into `[lo, hi]`, mapping NaN to `lo`.
pub fn clamp_finite(v: Real, lo: Real, hi: Real) -> Real {
    if v.is_nan() {
        return lo;
    }
    v.clamp(lo, hi)
}

/// Arithmetic mean; 0 for an empty slice.
pub fn mean(values: &[Real]) -> Real {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<Real>() / values.len() as Real
}
