//! The calculation pipeline.
//!
//! Builds sun position series, layers clear-sky irradiance onto them, casts
//! shadows for an object, and scans the assembled series for optimal periods.

pub mod irradiance;
pub mod optimizer;
pub mod pipeline;
pub mod position;
pub mod shadow;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use pipeline::calculate;
