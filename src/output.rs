//! Module result contract
//!
//! Every command reports the same shape: a changed flag, the resource
//! under a type-specific key, and a human-readable message.

use crate::resource::ActionResult;
use serde_json::{json, Map, Value};

/// Result of one module invocation
#[derive(Debug, Clone)]
pub struct ModuleOutput {
    pub changed: bool,
    /// Key under which the resource is surfaced (`server`, `volume`, ...)
    pub resource_key: &'static str,
    pub resource: Value,
    pub msg: String,
}

impl ModuleOutput {
    pub fn new(
        changed: bool,
        resource_key: &'static str,
        resource: Value,
        msg: impl Into<String>,
    ) -> Self {
        Self {
            changed,
            resource_key,
            resource,
            msg: msg.into(),
        }
    }

    /// Wrap a reconciler result under the module's resource key.
    pub fn from_action(result: ActionResult, resource_key: &'static str) -> Self {
        Self {
            changed: result.changed,
            resource_key,
            resource: result.resource.unwrap_or(Value::Null),
            msg: result.msg,
        }
    }

    /// Render the `{changed, <key>, msg}` contract.
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        out.insert("changed".to_string(), json!(self.changed));
        out.insert(self.resource_key.to_string(), self.resource.clone());
        out.insert("msg".to_string(), json!(self.msg));
        Value::Object(out)
    }
}
