//! Power module - drive a server toward a power state
//!
//! Idempotent by target state rather than by attribute diff: the current
//! power status is read first and a server already at the target reports
//! unchanged. There is no client-side completion polling; the provider's
//! immediate response is the result. `shutdown` with `force_power_off`
//! issues the graceful shutdown followed by a hard stop request.

use crate::api::{ApiError, CloudClient};
use crate::output::ModuleOutput;
use crate::resource::{item_id, locate_required, resource, ResourceRef};
use serde_json::{json, Value};

/// Power state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerAction {
    Start,
    /// Hard power off, similar to cutting power
    Stop,
    /// Graceful shutdown; issuing the command is guaranteed, success is not
    Shutdown,
    Reboot,
}

impl PowerAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PowerAction::Start => "start",
            PowerAction::Stop => "stop",
            PowerAction::Shutdown => "shutdown",
            PowerAction::Reboot => "reboot",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PowerParams {
    pub server_id: Option<u64>,
    pub server_hostname: Option<String>,
    pub force_power_off: bool,
}

/// Current power status of a server, from the power-management endpoint.
async fn power_status(client: &CloudClient, server_id: u64) -> Result<String, ApiError> {
    let response = client.get(&client.power_management_path(server_id)).await?;
    Ok(response
        .get("status")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown")
        .to_string())
}

/// Send a power state transition to a server.
pub async fn run(
    client: &CloudClient,
    action: PowerAction,
    params: PowerParams,
) -> Result<ModuleOutput, ApiError> {
    let def = resource("servers");
    let target = ResourceRef::from_parts(params.server_id, params.server_hostname.as_deref())
        .ok_or_else(|| {
            ApiError::Validation("one of server_id or server_hostname is required".to_string())
        })?;
    let server = locate_required(client, def, &target, true).await?;
    let server_id = item_id(&server, def)?;
    let hostname = server
        .get("hostname")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    let status = power_status(client, server_id).await?;

    // Already at the target state: no call, no change. A stopped server
    // cannot be rebooted or shut down further.
    let already_there = match action {
        PowerAction::Start => status == "running",
        PowerAction::Stop | PowerAction::Shutdown | PowerAction::Reboot => status == "stopped",
    };
    if already_there {
        return Ok(ModuleOutput::new(
            false,
            "action",
            json!({"status": status}),
            format!(
                "server {hostname} ({server_id}) not sent action '{}', it is '{status}'",
                action.as_str()
            ),
        ));
    }

    let endpoint = client.power_management_path(server_id);
    let mut result: Value = client
        .post(&endpoint, Some(&json!({"action": action.as_str()})))
        .await?;

    // Guarantee power-off without polling for shutdown completion: the
    // graceful request stands, the hard stop follows it.
    if action == PowerAction::Shutdown && params.force_power_off {
        result = client.post(&endpoint, Some(&json!({"action": "stop"}))).await?;
    }

    Ok(ModuleOutput::new(
        true,
        "action",
        result,
        format!(
            "server {hostname} ({server_id}) sent action '{}'",
            action.as_str()
        ),
    ))
}
