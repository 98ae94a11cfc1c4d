//! IP action module - attach or detach public addresses
//!
//! The provider allows at most one IPv4 and one IPv6 per server and its
//! attach call errors instead of auto-detaching. Conflicting edges are
//! therefore removed client-side first: the address's current holder and
//! the server's current address of that family are both detached before
//! the attach is issued. That ordering is deliberate business logic, not
//! transport plumbing.

use crate::api::{ApiError, CloudClient, IpFamily};
use crate::output::ModuleOutput;
use crate::resource::{
    extract_list, item_id, locate_required, resource, ResourceRef,
};
use serde_json::{json, Value};
use std::net::{Ipv4Addr, Ipv6Addr};

#[derive(Debug, Clone, Default)]
pub struct IpActionParams {
    pub ip_address: String,
    pub server_id: Option<u64>,
    pub server_hostname: Option<String>,
}

/// Infer the address family by parsing the address itself.
fn detect_family(address: &str) -> Result<IpFamily, ApiError> {
    if address.parse::<Ipv4Addr>().is_ok() {
        return Ok(IpFamily::V4);
    }
    if address.parse::<Ipv6Addr>().is_ok() {
        return Ok(IpFamily::V6);
    }
    Err(ApiError::Validation(format!(
        "{address} is not a valid IPv4 or IPv6 address"
    )))
}

/// One entry of the account's address pool
#[derive(Debug, Clone)]
struct PoolEntry {
    id: u64,
    attached: bool,
    /// Hostname of the holding server, when attached
    server: Option<String>,
}

async fn address_pool(client: &CloudClient, family: IpFamily) -> Result<Vec<Value>, ApiError> {
    let key = match family {
        IpFamily::V4 => "ipv4",
        IpFamily::V6 => "ipv6",
    };
    let def = resource(key);
    let response = client.get(&def.endpoint).await?;
    Ok(extract_list(&response, &def.list_key))
}

fn find_entry(pool: &[Value], address: &str) -> Option<PoolEntry> {
    pool.iter()
        .find(|ip| ip.get("address").and_then(|v| v.as_str()) == Some(address))
        .map(|ip| PoolEntry {
            id: ip.get("id").and_then(|v| v.as_u64()).unwrap_or_default(),
            attached: ip.get("attached").and_then(|v| v.as_bool()).unwrap_or(false),
            server: ip
                .get("server")
                .and_then(|v| v.as_str())
                .map(String::from),
        })
}

async fn detach(client: &CloudClient, family: IpFamily, ip_id: u64) -> Result<(), ApiError> {
    client
        .post(&client.ip_detach_path(family, ip_id), Some(&json!({})))
        .await?;
    Ok(())
}

/// Ensure the address is attached to the given server.
pub async fn attach(client: &CloudClient, params: IpActionParams) -> Result<ModuleOutput, ApiError> {
    let family = detect_family(&params.ip_address)?;

    let server_def = resource("servers");
    let target = ResourceRef::from_parts(params.server_id, params.server_hostname.as_deref())
        .ok_or_else(|| {
            ApiError::Validation("one of server_id or server_hostname is required".to_string())
        })?;
    let server = locate_required(client, server_def, &target, true).await?;
    let server_id = item_id(&server, server_def)?;
    let server_hostname = server
        .get("hostname")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    let pool = address_pool(client, family).await?;
    let entry = find_entry(&pool, &params.ip_address).ok_or_else(|| {
        ApiError::Validation(format!("IP ({}) is not in your ips", params.ip_address))
    })?;

    if entry.attached && entry.server.as_deref() == Some(server_hostname.as_str()) {
        return Ok(ModuleOutput::new(
            false,
            "ip",
            json!({"address": params.ip_address, "server": server_hostname}),
            format!(
                "IP ({}) already attached to ({server_hostname})",
                params.ip_address
            ),
        ));
    }

    // Remove conflicting edges before attaching: the address's current
    // holder, then the server's current address of this family.
    if entry.attached {
        tracing::debug!(
            "detaching {} from its current server before reattach",
            params.ip_address
        );
        detach(client, family, entry.id).await?;
    }

    let current = server
        .get("networks")
        .and_then(|n| n.get("public"))
        .and_then(|p| p.get(family.as_str()))
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(String::from);
    if let Some(current) = current {
        if let Some(held) = find_entry(&pool, &current) {
            tracing::debug!("detaching current {} ({current}) from server", family.as_str());
            detach(client, family, held.id).await?;
        }
    }

    let mut body = serde_json::Map::new();
    body.insert(family.as_str().to_string(), json!(params.ip_address));
    let body = Value::Object(body);
    let attached = client
        .post(&client.attach_ip_path(server_id, family), Some(&body))
        .await?;

    Ok(ModuleOutput::new(
        true,
        "ip",
        attached,
        format!(
            "IP ({}) attached to ({server_hostname})",
            params.ip_address
        ),
    ))
}

/// Ensure the address is not attached anywhere.
pub async fn detach_address(
    client: &CloudClient,
    params: IpActionParams,
) -> Result<ModuleOutput, ApiError> {
    let family = detect_family(&params.ip_address)?;
    let pool = address_pool(client, family).await?;
    let entry = find_entry(&pool, &params.ip_address).ok_or_else(|| {
        ApiError::Validation(format!("IP ({}) is not in your ips", params.ip_address))
    })?;

    if !entry.attached {
        return Ok(ModuleOutput::new(
            false,
            "ip",
            json!({"address": params.ip_address}),
            format!("IP ({}) is not attached to any server", params.ip_address),
        ));
    }

    detach(client, family, entry.id).await?;
    let holder = entry.server.unwrap_or_default();
    Ok(ModuleOutput::new(
        true,
        "ip",
        json!({"address": params.ip_address, "server": holder}),
        format!("IP ({}) detached from server ({holder})", params.ip_address),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_detection() {
        assert_eq!(detect_family("176.124.106.104").unwrap(), IpFamily::V4);
        assert_eq!(detect_family("2001:67c:744:1::22").unwrap(), IpFamily::V6);
        assert!(detect_family("not-an-ip").is_err());
    }

    #[test]
    fn pool_entry_lookup() {
        let pool = vec![
            serde_json::json!({"id": 599, "address": "176.124.106.79", "attached": false, "server": null}),
            serde_json::json!({"id": 685, "address": "176.124.106.104", "attached": true, "server": "h1"}),
        ];
        let entry = find_entry(&pool, "176.124.106.104").unwrap();
        assert_eq!(entry.id, 685);
        assert!(entry.attached);
        assert_eq!(entry.server.as_deref(), Some("h1"));
        assert!(find_entry(&pool, "10.0.0.1").is_none());
    }
}
