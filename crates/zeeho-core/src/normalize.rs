//! Response normalization
//!
//! Turns one element of the upstream per-vehicle array into a
//! [`VehicleSnapshot`]. Extraction is defensive: a missing key or a value
//! that does not coerce to the expected type becomes `None`, and never
//! fails the whole snapshot.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::trace;

use crate::models::{ChargeState, Connectivity, LockState, VehicleSnapshot};

/// Default device model label
pub const DEFAULT_DEVICE_MODEL: &str = "ZEEHO";

/// Upstream keys of the per-vehicle record
pub mod keys {
    pub const VEHICLE_NAME: &str = "vehicleName";
    pub const VIN: &str = "vin";
    pub const VEHICLE_PIC_URL: &str = "vehiclePicUrl";
    pub const BLUETOOTH_ADDRESS: &str = "bluetoothAddress";
    pub const BMSSOC: &str = "bmssoc";
    pub const CHARGE_STATE: &str = "chargeState";
    pub const FULL_CHARGE_TIME: &str = "fullChargeTime";
    pub const WHETHER_CHARGE_STATE: &str = "whetherChargeState";
    pub const HEAD_LOCK_STATE: &str = "headLockState";
    pub const RIDE_STATE: &str = "rideState";
    pub const SUPPORT_UNLOCK: &str = "supportUnlock";
    pub const SUPPORT_NETWORK_UNLOCK: &str = "supportNetworkUnlock";
    pub const TOTAL_RIDE_MILE: &str = "totalRideMile";
    pub const REMAIN_MILEAGE: &str = "remainMileage";
    pub const OTA_VERSION: &str = "otaVersion";
    pub const COURSE: &str = "course";

    pub const LOCATION: &str = "location";
    pub const LATITUDE: &str = "latitude";
    pub const LONGITUDE: &str = "longitude";
    pub const ALTITUDE: &str = "altitude";
    pub const LOCATION_TIME: &str = "locationTime";
}

/// Builds snapshots for one configured vehicle
#[derive(Debug, Clone)]
pub struct Normalizer {
    location_key: String,
    device_model: String,
}

impl Normalizer {
    pub fn new(location_key: impl Into<String>) -> Self {
        Self {
            location_key: location_key.into(),
            device_model: DEFAULT_DEVICE_MODEL.to_string(),
        }
    }

    pub fn with_device_model(mut self, device_model: impl Into<String>) -> Self {
        self.device_model = device_model.into();
        self
    }

    pub fn location_key(&self) -> &str {
        &self.location_key
    }

    /// Normalize a record, stamping it with the current time
    pub fn normalize(&self, raw: &Value) -> VehicleSnapshot {
        self.normalize_at(raw, Utc::now())
    }

    /// Normalize a record with an explicit capture time
    ///
    /// A non-object `raw` yields a snapshot with every optional field absent.
    pub fn normalize_at(&self, raw: &Value, query_time: DateTime<Utc>) -> VehicleSnapshot {
        let empty = Map::new();
        let record = raw.as_object().unwrap_or(&empty);
        let location = record
            .get(keys::LOCATION)
            .and_then(Value::as_object)
            .unwrap_or(&empty);

        let battery_text = text(record.get(keys::BMSSOC));
        let charge_state = text(record.get(keys::CHARGE_STATE));
        let head_lock = text(record.get(keys::HEAD_LOCK_STATE));
        let ride_state = text(record.get(keys::RIDE_STATE));

        let snapshot = VehicleSnapshot {
            location_key: self.location_key.clone(),
            device_model: self.device_model.clone(),
            vehicle_name: text(record.get(keys::VEHICLE_NAME)),
            vin: text(record.get(keys::VIN)),
            vehicle_pic_url: text(record.get(keys::VEHICLE_PIC_URL)),
            bluetooth_address: text(record.get(keys::BLUETOOTH_ADDRESS)),

            battery_percent: number(record.get(keys::BMSSOC)),
            charge_state: ChargeState::from_upstream(
                charge_state.as_deref(),
                battery_text.as_deref(),
            ),
            full_charge_time: text(record.get(keys::FULL_CHARGE_TIME)),
            whether_charge_state: text(record.get(keys::WHETHER_CHARGE_STATE)),

            lock_state: LockState::from_upstream(head_lock.as_deref()),
            connectivity: Connectivity::from_upstream(ride_state.as_deref()),
            support_unlock: flag(record.get(keys::SUPPORT_UNLOCK)),
            support_network_unlock: flag(record.get(keys::SUPPORT_NETWORK_UNLOCK)),

            latitude: number(location.get(keys::LATITUDE)),
            longitude: number(location.get(keys::LONGITUDE)),
            altitude: number(location.get(keys::ALTITUDE)),
            course: number(location.get(keys::COURSE)).or_else(|| number(record.get(keys::COURSE))),
            location_time: text(location.get(keys::LOCATION_TIME)),

            total_ride_mileage: number(record.get(keys::TOTAL_RIDE_MILE)),
            remaining_range: number(record.get(keys::REMAIN_MILEAGE)),
            firmware_version: text(record.get(keys::OTA_VERSION)),

            query_time,
        };

        trace!(
            location_key = %snapshot.location_key,
            battery = ?snapshot.battery_percent,
            lock = snapshot.lock_state.as_str(),
            "Normalized vehicle record"
        );
        snapshot
    }
}

/// Textual form of a scalar: strings verbatim, numbers and booleans rendered
fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Finite number from a JSON number or numeric string
fn number(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn flag(value: Option<&Value>) -> Option<bool> {
    match value? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn capture_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 4, 0, 5).unwrap()
    }

    fn full_record() -> Value {
        json!({
            "vehicleName": "AE8",
            "vin": "LCE0000000000001",
            "vehiclePicUrl": "https://example.invalid/ae8.png",
            "bluetoothAddress": "AA:BB:CC:DD:EE:FF",
            "bmssoc": "87",
            "chargeState": "0",
            "fullChargeTime": "120",
            "whetherChargeState": "0",
            "headLockState": "1",
            "rideState": "在线",
            "supportUnlock": true,
            "supportNetworkUnlock": "1",
            "totalRideMile": "1234.5",
            "remainMileage": 56,
            "otaVersion": "1.2.3",
            "location": {
                "latitude": "31.2304",
                "longitude": 121.4737,
                "altitude": "4.5",
                "course": "90",
                "locationTime": "2024-05-01 12:00:00"
            }
        })
    }

    #[test]
    fn test_normalize_full_record() {
        let snapshot = Normalizer::new("zeeho-0").normalize_at(&full_record(), capture_time());

        assert_eq!(snapshot.location_key, "zeeho-0");
        assert_eq!(snapshot.device_model, "ZEEHO");
        assert_eq!(snapshot.vehicle_name.as_deref(), Some("AE8"));
        assert_eq!(snapshot.vin.as_deref(), Some("LCE0000000000001"));
        assert_eq!(snapshot.battery_percent, Some(87.0));
        assert_eq!(snapshot.charge_state, ChargeState::OnBattery);
        assert_eq!(snapshot.lock_state, LockState::Locked);
        assert_eq!(snapshot.connectivity, Connectivity::Online);
        assert_eq!(snapshot.support_unlock, Some(true));
        assert_eq!(snapshot.support_network_unlock, Some(true));
        assert_eq!(snapshot.latitude, Some(31.2304));
        assert_eq!(snapshot.longitude, Some(121.4737));
        assert_eq!(snapshot.altitude, Some(4.5));
        assert_eq!(snapshot.course, Some(90.0));
        assert_eq!(snapshot.location_time.as_deref(), Some("2024-05-01 12:00:00"));
        assert_eq!(snapshot.total_ride_mileage, Some(1234.5));
        assert_eq!(snapshot.remaining_range, Some(56.0));
        assert_eq!(snapshot.firmware_version.as_deref(), Some("1.2.3"));
        assert_eq!(snapshot.query_time, capture_time());
    }

    #[test]
    fn test_query_time_is_capture_time_not_device_time() {
        let snapshot = Normalizer::new("k").normalize_at(&full_record(), capture_time());
        assert_eq!(snapshot.query_time, capture_time());
        assert_eq!(snapshot.location_time.as_deref(), Some("2024-05-01 12:00:00"));

        let before = Utc::now();
        let snapshot = Normalizer::new("k").normalize(&full_record());
        assert!(snapshot.query_time >= before);
    }

    #[rstest]
    #[case(json!("abc"))]
    #[case(json!(""))]
    #[case(json!(null))]
    #[case(json!([1, 2]))]
    #[case(json!({"v": 1}))]
    #[case(json!("NaN"))]
    #[case(json!("inf"))]
    fn test_malformed_numeric_becomes_absent(#[case] bad: Value) {
        let mut record = full_record();
        record["bmssoc"] = bad.clone();
        record["totalRideMile"] = bad.clone();
        record["location"]["latitude"] = bad;

        let snapshot = Normalizer::new("k").normalize_at(&record, capture_time());
        assert_eq!(snapshot.battery_percent, None);
        assert_eq!(snapshot.total_ride_mileage, None);
        assert_eq!(snapshot.latitude, None);
        // Unaffected fields survive
        assert_eq!(snapshot.longitude, Some(121.4737));
        assert_eq!(snapshot.lock_state, LockState::Locked);
    }

    #[test]
    fn test_numeric_string_is_trimmed() {
        let mut record = full_record();
        record["bmssoc"] = json!(" 42 ");
        let snapshot = Normalizer::new("k").normalize_at(&record, capture_time());
        assert_eq!(snapshot.battery_percent, Some(42.0));
    }

    #[test]
    fn test_missing_keys_become_absent() {
        let snapshot = Normalizer::new("k").normalize_at(&json!({}), capture_time());
        assert_eq!(snapshot.vehicle_name, None);
        assert_eq!(snapshot.battery_percent, None);
        assert_eq!(snapshot.latitude, None);
        assert_eq!(snapshot.location_time, None);
        assert_eq!(snapshot.charge_state, ChargeState::OnBattery);
        assert_eq!(snapshot.lock_state, LockState::Unknown(None));
        assert_eq!(snapshot.connectivity, Connectivity::Offline);
    }

    #[test]
    fn test_non_object_record_does_not_fail() {
        let snapshot = Normalizer::new("k").normalize_at(&json!("garbage"), capture_time());
        assert_eq!(snapshot.location_key, "k");
        assert_eq!(snapshot.position(), None);
    }

    #[test]
    fn test_location_not_an_object() {
        let mut record = full_record();
        record["location"] = json!("31.2,121.4");
        let snapshot = Normalizer::new("k").normalize_at(&record, capture_time());
        assert_eq!(snapshot.latitude, None);
        assert_eq!(snapshot.longitude, None);
        assert_eq!(snapshot.location_time, None);
    }

    #[rstest]
    #[case(json!("1"), json!("42"), ChargeState::Charging)]
    #[case(json!("1"), json!("100"), ChargeState::Charging)]
    #[case(json!("0"), json!("100"), ChargeState::FullyCharged)]
    #[case(json!("0"), json!(100), ChargeState::FullyCharged)]
    #[case(json!("0"), json!("100.0"), ChargeState::OnBattery)]
    #[case(json!("2"), json!("99"), ChargeState::OnBattery)]
    #[case(json!(1), json!("50"), ChargeState::Charging)]
    fn test_charge_state_rules(
        #[case] charge: Value,
        #[case] battery: Value,
        #[case] expected: ChargeState,
    ) {
        let mut record = full_record();
        record["chargeState"] = charge;
        record["bmssoc"] = battery;
        let snapshot = Normalizer::new("k").normalize_at(&record, capture_time());
        assert_eq!(snapshot.charge_state, expected);
    }

    #[rstest]
    #[case(json!("0"), LockState::Unlocked)]
    #[case(json!("1"), LockState::Locked)]
    #[case(json!("3"), LockState::Unknown(Some("3".to_string())))]
    #[case(json!("locked"), LockState::Unknown(Some("locked".to_string())))]
    fn test_lock_state_rules(#[case] raw: Value, #[case] expected: LockState) {
        let mut record = full_record();
        record["headLockState"] = raw;
        let snapshot = Normalizer::new("k").normalize_at(&record, capture_time());
        assert_eq!(snapshot.lock_state, expected);
    }

    #[rstest]
    #[case(json!("在线"), Connectivity::Online)]
    #[case(json!("离线"), Connectivity::Offline)]
    #[case(json!(1), Connectivity::Offline)]
    fn test_connectivity_rules(#[case] raw: Value, #[case] expected: Connectivity) {
        let mut record = full_record();
        record["rideState"] = raw;
        let snapshot = Normalizer::new("k").normalize_at(&record, capture_time());
        assert_eq!(snapshot.connectivity, expected);
    }

    #[test]
    fn test_custom_device_model() {
        let normalizer = Normalizer::new("k").with_device_model("AE8 S+");
        let snapshot = normalizer.normalize_at(&full_record(), capture_time());
        assert_eq!(snapshot.device_model, "AE8 S+");
    }
}
