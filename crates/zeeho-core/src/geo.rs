//! Geodetic coordinate transforms between WGS84, GCJ02 and BD09
//!
//! WGS84 is the raw GPS datum. GCJ02 is the obfuscated datum mandated for
//! maps inside China, and BD09 is Baidu's further offset on top of GCJ02.
//! The WGS84 ↔ GCJ02 offset is only defined inside China; outside the
//! bounding box those conversions are the identity. BD09 conversions never
//! check the box.
//!
//! All functions take and return `(longitude, latitude)` in degrees and
//! never fail.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseCoordSystemError;

/// Semi-major axis of the Krasovsky 1940 ellipsoid
const A: f64 = 6378245.0;
/// Eccentricity squared
const EE: f64 = 0.00669342162296594323;

/// Bounding box outside which the GCJ02 offset is not applied
const CHINA_LNG_MIN: f64 = 72.004;
const CHINA_LNG_MAX: f64 = 137.8347;
const CHINA_LAT_MIN: f64 = 0.8293;
const CHINA_LAT_MAX: f64 = 55.8271;

/// Convergence threshold for the iterative GCJ02 → WGS84 inverse (degrees)
const INVERSE_TOLERANCE: f64 = 1e-10;
const INVERSE_MAX_ITERATIONS: usize = 32;

/// Returns true when the point lies outside the region the GCJ02 offset covers
///
/// Non-finite input is treated as outside, so it passes through unchanged.
pub fn out_of_china(lng: f64, lat: f64) -> bool {
    !((CHINA_LNG_MIN..=CHINA_LNG_MAX).contains(&lng)
        && (CHINA_LAT_MIN..=CHINA_LAT_MAX).contains(&lat))
}

fn transform_lat(lng: f64, lat: f64) -> f64 {
    let mut ret = -100.0 + 2.0 * lng + 3.0 * lat + 0.2 * lat * lat + 0.1 * lng * lat
        + 0.2 * lng.abs().sqrt();
    ret += (20.0 * (6.0 * lng * PI).sin() + 20.0 * (2.0 * lng * PI).sin()) * 2.0 / 3.0;
    ret += (20.0 * (lat * PI).sin() + 40.0 * (lat / 3.0 * PI).sin()) * 2.0 / 3.0;
    ret += (160.0 * (lat / 12.0 * PI).sin() + 320.0 * (lat * PI / 30.0).sin()) * 2.0 / 3.0;
    ret
}

fn transform_lng(lng: f64, lat: f64) -> f64 {
    let mut ret =
        300.0 + lng + 2.0 * lat + 0.1 * lng * lng + 0.1 * lng * lat + 0.1 * lng.abs().sqrt();
    ret += (20.0 * (6.0 * lng * PI).sin() + 20.0 * (2.0 * lng * PI).sin()) * 2.0 / 3.0;
    ret += (20.0 * (lng * PI).sin() + 40.0 * (lng / 3.0 * PI).sin()) * 2.0 / 3.0;
    ret += (150.0 * (lng / 12.0 * PI).sin() + 300.0 * (lng / 30.0 * PI).sin()) * 2.0 / 3.0;
    ret
}

/// GCJ02 offset `(dlng, dlat)` evaluated at the given point
fn gcj02_offset(lng: f64, lat: f64) -> (f64, f64) {
    let dlat = transform_lat(lng - 105.0, lat - 35.0);
    let dlng = transform_lng(lng - 105.0, lat - 35.0);

    let radlat = lat / 180.0 * PI;
    let magic = 1.0 - EE * radlat.sin() * radlat.sin();
    let sqrt_magic = magic.sqrt();

    let dlat = (dlat * 180.0) / ((A * (1.0 - EE)) / (magic * sqrt_magic) * PI);
    let dlng = (dlng * 180.0) / (A / sqrt_magic * radlat.cos() * PI);
    (dlng, dlat)
}

/// WGS84 → GCJ02
pub fn wgs84_to_gcj02(lng: f64, lat: f64) -> (f64, f64) {
    if out_of_china(lng, lat) {
        return (lng, lat);
    }
    let (dlng, dlat) = gcj02_offset(lng, lat);
    (lng + dlng, lat + dlat)
}

/// GCJ02 → WGS84
///
/// Starts from the one-step estimate (offset evaluated at the GCJ02 point)
/// and refines it until the forward transform reproduces the input.
pub fn gcj02_to_wgs84(lng: f64, lat: f64) -> (f64, f64) {
    if out_of_china(lng, lat) {
        return (lng, lat);
    }
    let (dlng, dlat) = gcj02_offset(lng, lat);
    let (mut wgs_lng, mut wgs_lat) = (lng - dlng, lat - dlat);

    for _ in 0..INVERSE_MAX_ITERATIONS {
        let (fwd_lng, fwd_lat) = wgs84_to_gcj02(wgs_lng, wgs_lat);
        let (err_lng, err_lat) = (fwd_lng - lng, fwd_lat - lat);
        if err_lng.abs() < INVERSE_TOLERANCE && err_lat.abs() < INVERSE_TOLERANCE {
            break;
        }
        wgs_lng -= err_lng;
        wgs_lat -= err_lat;
    }

    (wgs_lng, wgs_lat)
}

/// GCJ02 → BD09
pub fn gcj02_to_bd09(lng: f64, lat: f64) -> (f64, f64) {
    let z = (lng * lng + lat * lat).sqrt() + 0.00002 * (lat * PI).sin();
    let theta = lat.atan2(lng) + 0.000003 * (lng * PI).cos();
    (z * theta.cos() + 0.0065, z * theta.sin() + 0.006)
}

/// BD09 → GCJ02 (closed-form inverse of [`gcj02_to_bd09`])
pub fn bd09_to_gcj02(lng: f64, lat: f64) -> (f64, f64) {
    let x = lng - 0.0065;
    let y = lat - 0.006;
    let z = (x * x + y * y).sqrt() - 0.00002 * (y * PI).sin();
    let theta = y.atan2(x) - 0.000003 * (x * PI).cos();
    (z * theta.cos(), z * theta.sin())
}

/// WGS84 → BD09 (via GCJ02)
pub fn wgs84_to_bd09(lng: f64, lat: f64) -> (f64, f64) {
    let (lng, lat) = wgs84_to_gcj02(lng, lat);
    gcj02_to_bd09(lng, lat)
}

/// BD09 → WGS84 (via GCJ02)
pub fn bd09_to_wgs84(lng: f64, lat: f64) -> (f64, f64) {
    let (lng, lat) = bd09_to_gcj02(lng, lat);
    gcj02_to_wgs84(lng, lat)
}

/// Geodetic reference system of a coordinate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordSystem {
    /// Raw GPS
    #[default]
    Wgs84,
    /// "Mars" coordinates used by most Chinese map providers
    Gcj02,
    /// Baidu Maps
    Bd09,
}

impl CoordSystem {
    pub const ALL: [CoordSystem; 3] = [CoordSystem::Wgs84, CoordSystem::Gcj02, CoordSystem::Bd09];

    pub fn as_str(&self) -> &'static str {
        match self {
            CoordSystem::Wgs84 => "wgs84",
            CoordSystem::Gcj02 => "gcj02",
            CoordSystem::Bd09 => "bd09",
        }
    }
}

impl fmt::Display for CoordSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CoordSystem {
    type Err = ParseCoordSystemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wgs84" | "gps" => Ok(CoordSystem::Wgs84),
            "gcj02" | "mars" => Ok(CoordSystem::Gcj02),
            "bd09" | "baidu" => Ok(CoordSystem::Bd09),
            _ => Err(ParseCoordSystemError(s.to_string())),
        }
    }
}

/// A (longitude, latitude) position in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoordinatePair {
    pub longitude: f64,
    pub latitude: f64,
}

impl CoordinatePair {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Convert this position from one reference system to another
    pub fn convert(self, from: CoordSystem, to: CoordSystem) -> Self {
        let (lng, lat) = convert(self.longitude, self.latitude, from, to);
        Self::new(lng, lat)
    }
}

impl From<(f64, f64)> for CoordinatePair {
    fn from((longitude, latitude): (f64, f64)) -> Self {
        Self::new(longitude, latitude)
    }
}

/// Dispatch a conversion between any two reference systems
pub fn convert(lng: f64, lat: f64, from: CoordSystem, to: CoordSystem) -> (f64, f64) {
    use CoordSystem::*;

    match (from, to) {
        (Wgs84, Wgs84) | (Gcj02, Gcj02) | (Bd09, Bd09) => (lng, lat),
        (Wgs84, Gcj02) => wgs84_to_gcj02(lng, lat),
        (Wgs84, Bd09) => wgs84_to_bd09(lng, lat),
        (Gcj02, Wgs84) => gcj02_to_wgs84(lng, lat),
        (Gcj02, Bd09) => gcj02_to_bd09(lng, lat),
        (Bd09, Wgs84) => bd09_to_wgs84(lng, lat),
        (Bd09, Gcj02) => bd09_to_gcj02(lng, lat),
    }
}

/// One position expressed in all three reference systems, for map display
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapPositions {
    pub wgs84: CoordinatePair,
    pub gcj02: CoordinatePair,
    pub bd09: CoordinatePair,
}

impl MapPositions {
    /// Build the three representations from a position reported in `source`
    pub fn from_position(position: CoordinatePair, source: CoordSystem) -> Self {
        Self {
            wgs84: position.convert(source, CoordSystem::Wgs84),
            gcj02: position.convert(source, CoordSystem::Gcj02),
            bd09: position.convert(source, CoordSystem::Bd09),
        }
    }

    pub fn get(&self, system: CoordSystem) -> CoordinatePair {
        match system {
            CoordSystem::Wgs84 => self.wgs84,
            CoordSystem::Gcj02 => self.gcj02,
            CoordSystem::Bd09 => self.bd09,
        }
    }
}
