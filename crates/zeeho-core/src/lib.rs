//! zeeho-core - Core types for ZEEHO vehicle telemetry
//!
//! This crate holds everything that does not touch the network: the
//! normalized [`VehicleSnapshot`] consumers depend on, the [`Normalizer`]
//! that builds it from a loosely-typed upstream record, and the [`geo`]
//! module converting positions between WGS84, GCJ02 and BD09.

pub mod error;
pub mod geo;
pub mod models;
pub mod normalize;

pub use error::{ParseCoordSystemError, UnknownFieldError};
pub use geo::{CoordSystem, CoordinatePair, MapPositions};
pub use models::*;
pub use normalize::Normalizer;
