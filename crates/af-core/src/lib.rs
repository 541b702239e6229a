//! af-core: stable foundation for aeroforge.
//!
//! Contains:
//! - units (uom SI types + constructors)
//! - numeric (Real + tolerances + float helpers)
//! - stream (Seed + DeterministicStream, the only randomness source)
//! - timing (stage timers)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod stream;
pub mod timing;
pub mod units;

// Flat re-exports for downstream crates
pub use error::{CoreError, CoreResult};
pub use numeric::*;
pub use stream::{DeterministicStream, Lane, Seed};
pub use timing::{StageTimings, Timer};
pub use units::*;
