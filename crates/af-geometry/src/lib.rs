//! af-geometry: content features and seed derivation for uploaded geometry files.
//!
//! The extractor never fails on content. Empty or unparseable text degrades to the
//! nominal vehicle envelope; only reading a file from disk can return an error.

pub mod error;
pub mod features;
pub mod seed;

pub use error::{GeometryError, GeometryResult};
pub use features::{
    BoundingBox, GeometryFeatures, KEYWORDS, KeywordCount, KeywordSpec, MAX_COORDINATE_MATCHES,
    MAX_KEYWORD_MATCHES, NOMINAL_ENVELOPE, PrimitiveCounts, PrimitiveKind, extract_features,
    extract_features_from_path,
};
pub use seed::build_seed;
