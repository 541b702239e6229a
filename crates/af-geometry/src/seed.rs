//! Seed derivation from geometry features.

use af_core::Seed;

use crate::features::{GeometryFeatures, keyword_weight};

/// `byte_len + Σ(count × weight)` in wrapping u64 arithmetic.
///
/// The stream reduces the result modulo its own modulus, so wrapping here never
/// produces an invalid generator state.
pub fn build_seed(features: &GeometryFeatures) -> Seed {
    let weighted = features
        .keyword_counts
        .iter()
        .map(|k| k.count.wrapping_mul(keyword_weight(&k.keyword).unwrap_or(0)))
        .fold(0u64, u64::wrapping_add);
    Seed(features.byte_len.wrapping_add(weighted))
}
