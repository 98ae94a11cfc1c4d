//! Firewall action module - apply a rules set to a server
//!
//! Posts the rules set and traffic policies to the server's public
//! interface. The interface always accepts a re-apply, so this action
//! reports changed whenever the call succeeds.

use crate::api::{ApiError, CloudClient};
use crate::modules::server::FW_POLICIES;
use crate::output::ModuleOutput;
use crate::resource::{item_id, locate_required, resource, ResourceRef};
use serde_json::json;

#[derive(Debug, Clone, Default)]
pub struct FirewallActionParams {
    pub server_hostname: String,
    pub rules_set_name: String,
    pub policy_in: Option<String>,
    pub policy_out: Option<String>,
}

/// Apply a firewall rules set to a server's public interface.
pub async fn run(
    client: &CloudClient,
    params: FirewallActionParams,
) -> Result<ModuleOutput, ApiError> {
    for policy in [&params.policy_in, &params.policy_out] {
        if let Some(p) = policy {
            if !FW_POLICIES.contains(&p.as_str()) {
                return Err(ApiError::Validation(format!(
                    "firewall policy must be one of {}, got {p}",
                    FW_POLICIES.join("|")
                )));
            }
        }
    }

    let def = resource("servers");
    let server = locate_required(
        client,
        def,
        &ResourceRef::Name(params.server_hostname.clone()),
        true,
    )
    .await?;
    let server_id = item_id(&server, def)?;

    let body = json!({
        "fw_rules_set": params.rules_set_name,
        "fw_policy_in": params.policy_in,
        "fw_policy_out": params.policy_out,
    });
    let interface = client
        .post(
            &client.public_interface_path(server_id),
            Some(&super::compact_body(body)),
        )
        .await?;

    Ok(ModuleOutput::new(
        true,
        "firewall",
        interface,
        format!(
            "firewall rules set {} has been applied to server {}",
            params.rules_set_name, params.server_hostname
        ),
    ))
}
