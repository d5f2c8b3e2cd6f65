//! rime-core: shared foundation for the ice-wall coupling engine.
//!
//! Contains:
//! - units (uom SI types + constructors)
//! - numeric (Real + float helpers)
//! - profile (wall profile along the streamwise coordinate)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod profile;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{RimeError, RimeResult};
pub use numeric::*;
pub use profile::WallProfile;
pub use units::*;
