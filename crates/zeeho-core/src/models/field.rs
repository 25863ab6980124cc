//! Enum-keyed lookup of snapshot fields

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::snapshot::VehicleSnapshot;
use crate::error::UnknownFieldError;

/// A consumer-visible field of [`VehicleSnapshot`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotField {
    VehicleName,
    Vin,
    BatteryPercent,
    ChargeState,
    LockState,
    Connectivity,
    Latitude,
    Longitude,
    Altitude,
    Course,
    LocationTime,
    TotalRideMileage,
    RemainingRange,
    FirmwareVersion,
    QueryTime,
}

/// Catalogue entry describing a field
#[derive(Debug, Clone, Serialize)]
pub struct FieldInfo {
    pub key: &'static str,
    pub name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<&'static str>,
    pub icon: &'static str,
}

impl SnapshotField {
    pub const ALL: [SnapshotField; 15] = [
        SnapshotField::VehicleName,
        SnapshotField::Vin,
        SnapshotField::BatteryPercent,
        SnapshotField::ChargeState,
        SnapshotField::LockState,
        SnapshotField::Connectivity,
        SnapshotField::Latitude,
        SnapshotField::Longitude,
        SnapshotField::Altitude,
        SnapshotField::Course,
        SnapshotField::LocationTime,
        SnapshotField::TotalRideMileage,
        SnapshotField::RemainingRange,
        SnapshotField::FirmwareVersion,
        SnapshotField::QueryTime,
    ];

    /// Stable machine key
    pub fn key(&self) -> &'static str {
        match self {
            SnapshotField::VehicleName => "vehicle_name",
            SnapshotField::Vin => "vin",
            SnapshotField::BatteryPercent => "battery_percent",
            SnapshotField::ChargeState => "charge_state",
            SnapshotField::LockState => "lock_state",
            SnapshotField::Connectivity => "connectivity",
            SnapshotField::Latitude => "latitude",
            SnapshotField::Longitude => "longitude",
            SnapshotField::Altitude => "altitude",
            SnapshotField::Course => "course",
            SnapshotField::LocationTime => "location_time",
            SnapshotField::TotalRideMileage => "total_ride_mileage",
            SnapshotField::RemainingRange => "remaining_range",
            SnapshotField::FirmwareVersion => "firmware_version",
            SnapshotField::QueryTime => "query_time",
        }
    }

    /// Human-readable label
    pub fn name(&self) -> &'static str {
        match self {
            SnapshotField::VehicleName => "Vehicle name",
            SnapshotField::Vin => "VIN",
            SnapshotField::BatteryPercent => "Battery",
            SnapshotField::ChargeState => "Charge state",
            SnapshotField::LockState => "Head lock",
            SnapshotField::Connectivity => "Connectivity",
            SnapshotField::Latitude => "Latitude",
            SnapshotField::Longitude => "Longitude",
            SnapshotField::Altitude => "Altitude",
            SnapshotField::Course => "Course",
            SnapshotField::LocationTime => "Location time",
            SnapshotField::TotalRideMileage => "Total ride mileage",
            SnapshotField::RemainingRange => "Remaining range",
            SnapshotField::FirmwareVersion => "Firmware version",
            SnapshotField::QueryTime => "Query time",
        }
    }

    pub fn unit(&self) -> Option<&'static str> {
        match self {
            SnapshotField::BatteryPercent => Some("%"),
            SnapshotField::Latitude | SnapshotField::Longitude | SnapshotField::Course => {
                Some("°")
            }
            SnapshotField::Altitude => Some("m"),
            SnapshotField::TotalRideMileage | SnapshotField::RemainingRange => Some("km"),
            _ => None,
        }
    }

    /// Material Design icon name
    pub fn icon(&self) -> &'static str {
        match self {
            SnapshotField::VehicleName | SnapshotField::Vin => "mdi:moped-electric",
            SnapshotField::BatteryPercent => "mdi:battery",
            SnapshotField::ChargeState => "mdi:battery-charging",
            SnapshotField::LockState => "mdi:lock",
            SnapshotField::Connectivity => "mdi:access-point-network",
            SnapshotField::Latitude | SnapshotField::Longitude => "mdi:map-marker",
            SnapshotField::Altitude => "mdi:altimeter",
            SnapshotField::Course => "mdi:compass",
            SnapshotField::LocationTime => "mdi:timer-stop",
            SnapshotField::TotalRideMileage => "mdi:counter",
            SnapshotField::RemainingRange => "mdi:map-marker-distance",
            SnapshotField::FirmwareVersion => "mdi:update",
            SnapshotField::QueryTime => "mdi:clock-outline",
        }
    }

    pub fn info(&self) -> FieldInfo {
        FieldInfo {
            key: self.key(),
            name: self.name(),
            unit: self.unit(),
            icon: self.icon(),
        }
    }

    /// Read this field from a snapshot; absent values become `null`
    pub fn value(&self, snapshot: &VehicleSnapshot) -> Value {
        match self {
            SnapshotField::VehicleName => json!(snapshot.vehicle_name),
            SnapshotField::Vin => json!(snapshot.vin),
            SnapshotField::BatteryPercent => json!(snapshot.battery_percent),
            SnapshotField::ChargeState => json!(snapshot.charge_state.as_str()),
            SnapshotField::LockState => json!(snapshot.lock_state.as_str()),
            SnapshotField::Connectivity => json!(snapshot.connectivity.as_str()),
            SnapshotField::Latitude => json!(snapshot.latitude),
            SnapshotField::Longitude => json!(snapshot.longitude),
            SnapshotField::Altitude => json!(snapshot.altitude),
            SnapshotField::Course => json!(snapshot.course),
            SnapshotField::LocationTime => json!(snapshot.location_time),
            SnapshotField::TotalRideMileage => json!(snapshot.total_ride_mileage),
            SnapshotField::RemainingRange => json!(snapshot.remaining_range),
            SnapshotField::FirmwareVersion => json!(snapshot.firmware_version),
            SnapshotField::QueryTime => json!(snapshot.query_time.to_rfc3339()),
        }
    }
}

impl fmt::Display for SnapshotField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for SnapshotField {
    type Err = UnknownFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        SnapshotField::ALL
            .into_iter()
            .find(|field| field.key() == wanted)
            .ok_or_else(|| UnknownFieldError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChargeState, Connectivity, LockState};
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    fn sample() -> VehicleSnapshot {
        VehicleSnapshot {
            location_key: "zeeho-0".to_string(),
            device_model: "ZEEHO".to_string(),
            vehicle_name: Some("AE8".to_string()),
            vin: None,
            vehicle_pic_url: None,
            bluetooth_address: None,
            battery_percent: Some(87.0),
            charge_state: ChargeState::OnBattery,
            full_charge_time: None,
            whether_charge_state: None,
            lock_state: LockState::Locked,
            connectivity: Connectivity::Online,
            support_unlock: Some(true),
            support_network_unlock: Some(true),
            latitude: Some(31.2304),
            longitude: Some(121.4737),
            altitude: None,
            course: Some(90.0),
            location_time: Some("2024-05-01 12:00:00".to_string()),
            total_ride_mileage: Some(1234.5),
            remaining_range: Some(56.0),
            firmware_version: Some("1.2.3".to_string()),
            query_time: Utc.with_ymd_and_hms(2024, 5, 1, 4, 0, 5).unwrap(),
        }
    }

    #[test]
    fn test_keys_are_unique_and_parse_back() {
        for field in SnapshotField::ALL {
            assert_eq!(field.key().parse::<SnapshotField>(), Ok(field));
        }
        let mut keys: Vec<_> = SnapshotField::ALL.iter().map(|f| f.key()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), SnapshotField::ALL.len());
    }

    #[rstest]
    #[case("battery-percent", SnapshotField::BatteryPercent)]
    #[case(" LOCK_STATE ", SnapshotField::LockState)]
    #[case("query_time", SnapshotField::QueryTime)]
    fn test_parse_is_lenient_about_case_and_dashes(
        #[case] input: &str,
        #[case] expected: SnapshotField,
    ) {
        assert_eq!(input.parse::<SnapshotField>(), Ok(expected));
    }

    #[test]
    fn test_parse_unknown_field() {
        let err = "address".parse::<SnapshotField>().unwrap_err();
        assert_eq!(err, UnknownFieldError("address".to_string()));
    }

    #[test]
    fn test_value_lookup() {
        let snapshot = sample();
        assert_eq!(SnapshotField::BatteryPercent.value(&snapshot), json!(87.0));
        assert_eq!(SnapshotField::LockState.value(&snapshot), json!("locked"));
        assert_eq!(SnapshotField::Connectivity.value(&snapshot), json!("online"));
        assert_eq!(SnapshotField::Altitude.value(&snapshot), Value::Null);
        assert_eq!(SnapshotField::Vin.value(&snapshot), Value::Null);
        assert_eq!(
            SnapshotField::QueryTime.value(&snapshot),
            json!("2024-05-01T04:00:05+00:00")
        );
    }

    #[test]
    fn test_units() {
        assert_eq!(SnapshotField::BatteryPercent.unit(), Some("%"));
        assert_eq!(SnapshotField::RemainingRange.unit(), Some("km"));
        assert_eq!(SnapshotField::ChargeState.unit(), None);
    }

    #[test]
    fn test_info_serializes_catalogue_entry() {
        let battery = serde_json::to_value(SnapshotField::BatteryPercent.info()).unwrap();
        assert_eq!(
            battery,
            json!({
                "key": "battery_percent",
                "name": "Battery",
                "unit": "%",
                "icon": "mdi:battery",
            })
        );

        let charge = serde_json::to_value(SnapshotField::ChargeState.info()).unwrap();
        assert!(charge.get("unit").is_none());
    }
}
