//! Public IP module - report a server's public IPv4

use crate::api::{ApiError, CloudClient};
use crate::output::ModuleOutput;
use crate::resource::{locate_required, resource, ResourceRef};
use serde_json::json;

/// Look up the public IPv4 of a server by hostname. Read-only.
pub async fn run(client: &CloudClient, server_hostname: &str) -> Result<ModuleOutput, ApiError> {
    let def = resource("servers");
    let server = locate_required(
        client,
        def,
        &ResourceRef::Name(server_hostname.to_string()),
        true,
    )
    .await?;

    let id = server.get("id").and_then(|v| v.as_u64()).unwrap_or_default();
    let address = server
        .get("networks")
        .and_then(|n| n.get("public"))
        .and_then(|p| p.get("ipv4"))
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    Ok(ModuleOutput::new(
        false,
        "server",
        json!(address),
        format!("found server id: {id} with ip address: {address}"),
    ))
}
