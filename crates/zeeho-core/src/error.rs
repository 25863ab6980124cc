//! Parse errors for the core string-keyed lookups

use thiserror::Error;

/// A snapshot field name that does not match any known field
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown snapshot field: {0}")]
pub struct UnknownFieldError(pub String);

/// A coordinate system name that is not one of wgs84, gcj02 or bd09
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown coordinate system: {0} (expected wgs84, gcj02 or bd09)")]
pub struct ParseCoordSystemError(pub String);
