//! aq-core: stable foundation for aquanet.
//!
//! Contains:
//! - geo (geographic coordinates + great-circle distance)
//! - error (shared error types)

pub mod error;
pub mod geo;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CoreError, CoreResult};
pub use geo::GeoCoord;
