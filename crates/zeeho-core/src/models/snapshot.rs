//! Normalized vehicle snapshot

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::{CoordSystem, CoordinatePair, MapPositions};

/// Upstream connectivity literal meaning "online"
pub const ONLINE_LITERAL: &str = "在线";

/// Network connectivity of the vehicle's telematics unit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    Online,
    #[default]
    Offline,
}

impl Connectivity {
    /// Translate the upstream `rideState` value
    pub fn from_upstream(raw: Option<&str>) -> Self {
        match raw {
            Some(ONLINE_LITERAL) => Connectivity::Online,
            _ => Connectivity::Offline,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Connectivity::Online => "online",
            Connectivity::Offline => "offline",
        }
    }
}

/// Battery charging state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeState {
    Charging,
    FullyCharged,
    #[default]
    OnBattery,
}

impl ChargeState {
    /// Translate the upstream `chargeState` value
    ///
    /// `"1"` wins regardless of the battery level; otherwise a battery
    /// reading of exactly `"100"` means fully charged.
    pub fn from_upstream(charge_state: Option<&str>, battery_text: Option<&str>) -> Self {
        if charge_state == Some("1") {
            ChargeState::Charging
        } else if battery_text == Some("100") {
            ChargeState::FullyCharged
        } else {
            ChargeState::OnBattery
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChargeState::Charging => "charging",
            ChargeState::FullyCharged => "fully_charged",
            ChargeState::OnBattery => "on_battery",
        }
    }
}

/// Head lock state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "raw")]
pub enum LockState {
    Locked,
    Unlocked,
    /// Any other upstream value, kept for diagnostics
    Unknown(Option<String>),
}

impl Default for LockState {
    fn default() -> Self {
        LockState::Unknown(None)
    }
}

impl LockState {
    /// Translate the upstream `headLockState` value
    pub fn from_upstream(raw: Option<&str>) -> Self {
        match raw {
            Some("0") => LockState::Unlocked,
            Some("1") => LockState::Locked,
            other => LockState::Unknown(other.map(str::to_string)),
        }
    }

    pub fn is_locked(&self) -> bool {
        matches!(self, LockState::Locked)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LockState::Locked => "locked",
            LockState::Unlocked => "unlocked",
            LockState::Unknown(_) => "unknown",
        }
    }
}

/// The normalized, stable-shaped record consumers depend on
///
/// Every numeric field is either a finite number or `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleSnapshot {
    // Identity
    pub location_key: String,
    pub device_model: String,
    pub vehicle_name: Option<String>,
    pub vin: Option<String>,
    pub vehicle_pic_url: Option<String>,
    pub bluetooth_address: Option<String>,

    // Battery
    /// State of charge, percent
    pub battery_percent: Option<f64>,
    pub charge_state: ChargeState,
    /// Estimated time to full charge as reported upstream
    pub full_charge_time: Option<String>,
    pub whether_charge_state: Option<String>,

    // State
    pub lock_state: LockState,
    pub connectivity: Connectivity,
    pub support_unlock: Option<bool>,
    pub support_network_unlock: Option<bool>,

    // Position
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude: Option<f64>,
    pub course: Option<f64>,
    /// Device-reported fix time, passed through verbatim
    pub location_time: Option<String>,

    // Mileage
    /// Total ride distance, km
    pub total_ride_mileage: Option<f64>,
    /// Remaining range, km
    pub remaining_range: Option<f64>,

    pub firmware_version: Option<String>,

    /// When this snapshot was captured (not the device fix time)
    pub query_time: DateTime<Utc>,
}

impl VehicleSnapshot {
    /// Reported position, if both coordinates are present
    pub fn position(&self) -> Option<CoordinatePair> {
        match (self.longitude, self.latitude) {
            (Some(lng), Some(lat)) => Some(CoordinatePair::new(lng, lat)),
            _ => None,
        }
    }

    /// Reported position in all three reference systems
    ///
    /// `source` is the reference system the upstream reports positions in.
    pub fn map_positions(&self, source: CoordSystem) -> Option<MapPositions> {
        self.position()
            .map(|position| MapPositions::from_position(position, source))
    }

    pub fn is_online(&self) -> bool {
        self.connectivity == Connectivity::Online
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connectivity_translation() {
        assert_eq!(Connectivity::from_upstream(Some("在线")), Connectivity::Online);
        assert_eq!(Connectivity::from_upstream(Some("离线")), Connectivity::Offline);
        assert_eq!(Connectivity::from_upstream(Some("online")), Connectivity::Offline);
        assert_eq!(Connectivity::from_upstream(None), Connectivity::Offline);
    }

    #[test]
    fn test_charge_state_translation() {
        assert_eq!(
            ChargeState::from_upstream(Some("1"), Some("42")),
            ChargeState::Charging
        );
        assert_eq!(
            ChargeState::from_upstream(Some("1"), Some("100")),
            ChargeState::Charging
        );
        assert_eq!(
            ChargeState::from_upstream(Some("0"), Some("100")),
            ChargeState::FullyCharged
        );
        assert_eq!(
            ChargeState::from_upstream(None, Some("100")),
            ChargeState::FullyCharged
        );
        assert_eq!(
            ChargeState::from_upstream(Some("0"), Some("99")),
            ChargeState::OnBattery
        );
        assert_eq!(ChargeState::from_upstream(None, None), ChargeState::OnBattery);
    }

    #[test]
    fn test_lock_state_translation() {
        assert_eq!(LockState::from_upstream(Some("0")), LockState::Unlocked);
        assert_eq!(LockState::from_upstream(Some("1")), LockState::Locked);
        assert_eq!(
            LockState::from_upstream(Some("2")),
            LockState::Unknown(Some("2".to_string()))
        );
        assert_eq!(LockState::from_upstream(None), LockState::Unknown(None));
        assert!(LockState::Locked.is_locked());
        assert!(!LockState::Unknown(None).is_locked());
    }

    #[test]
    fn test_lock_state_serialization_keeps_raw_value() {
        let json = serde_json::to_value(LockState::Unknown(Some("7".to_string()))).unwrap();
        assert_eq!(json, serde_json::json!({"state": "unknown", "raw": "7"}));

        let json = serde_json::to_value(LockState::Locked).unwrap();
        assert_eq!(json, serde_json::json!({"state": "locked"}));
    }
}
