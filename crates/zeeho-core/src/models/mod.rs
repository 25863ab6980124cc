//! Snapshot model and field catalogue

mod field;
mod snapshot;

pub use field::{FieldInfo, SnapshotField};
pub use snapshot::{ChargeState, Connectivity, LockState, VehicleSnapshot, ONLINE_LITERAL};
