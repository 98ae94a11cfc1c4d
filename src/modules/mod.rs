//! Management modules
//!
//! One module per resource type or action. Each is a thin configuration
//! layer: build the desired state from parameters, resolve the target,
//! hand it to the reconciler (or issue the action calls directly for
//! edge/power operations), and shape the result contract.

pub mod firewall;
pub mod firewall_action;
pub mod info;
pub mod ip_action;
pub mod power;
pub mod public_ip;
pub mod resize;
pub mod server;
pub mod ssh_key;
pub mod volume;
pub mod volume_action;

use serde_json::Value;

/// Strip null and empty-string entries from a request body; the API
/// rejects explicit nulls for optional fields.
pub(crate) fn compact_body(body: Value) -> Value {
    match body {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null() && v.as_str() != Some(""))
                .collect(),
        ),
        other => other,
    }
}
