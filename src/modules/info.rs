//! Info modules - read-only collection queries
//!
//! Every query is a pure read (`changed` is always false). Some accept an
//! optional server scope applied as a path parameter; without it the full
//! collection is returned.

use crate::api::{ApiError, CloudClient, IpFamily};
use crate::output::ModuleOutput;
use crate::resource::{extract_list, resource};
use serde_json::{json, Value};

/// Read-only query kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoKind {
    Servers,
    Volumes,
    Images,
    Packages,
    Profile,
    Ips,
    SshKeys,
    Firewalls,
    VolumesProducts,
    PublicInterface,
}

/// Run a read-only query.
pub async fn run(
    client: &CloudClient,
    kind: InfoKind,
    server_id: Option<u64>,
) -> Result<ModuleOutput, ApiError> {
    match kind {
        InfoKind::Servers => collection(client, "servers", "servers").await,
        InfoKind::Volumes => match server_id {
            // Scoped to one server's volumes
            Some(id) => {
                let response = client.get(&client.server_volumes_path(id)).await?;
                let items = extract_list(&response, "volumes");
                Ok(listing("volumes", items))
            }
            None => collection(client, "volumes", "volumes").await,
        },
        InfoKind::Images => collection(client, "images", "images").await,
        InfoKind::Packages => collection(client, "packages", "packages").await,
        InfoKind::Profile => {
            let profile = client.get(&client.profile_path()).await?;
            Ok(ModuleOutput::new(false, "profile", profile, "account profile"))
        }
        InfoKind::Ips => {
            let v4 = client.get(&client.ips_path(IpFamily::V4)).await?;
            let v6 = client.get(&client.ips_path(IpFamily::V6)).await?;
            let combined = json!({
                "ipv4": extract_list(&v4, "results"),
                "ipv6": extract_list(&v6, "results"),
            });
            Ok(ModuleOutput::new(false, "ips", combined, "public addresses"))
        }
        InfoKind::SshKeys => collection(client, "ssh-keys", "ssh_keys").await,
        InfoKind::Firewalls => collection(client, "firewalls", "firewalls").await,
        InfoKind::VolumesProducts => collection(client, "storage-products", "products").await,
        InfoKind::PublicInterface => {
            let Some(id) = server_id else {
                return Err(ApiError::Validation(
                    "server_id is required for the public-interface query".to_string(),
                ));
            };
            let interface = client.get(&client.public_interface_path(id)).await?;
            Ok(ModuleOutput::new(
                false,
                "public_interface",
                interface,
                "server public interface",
            ))
        }
    }
}

async fn collection(
    client: &CloudClient,
    resource_key: &str,
    output_key: &'static str,
) -> Result<ModuleOutput, ApiError> {
    let def = resource(resource_key);
    let response = client.get(&def.endpoint).await?;
    let items = extract_list(&response, &def.list_key);
    Ok(listing(output_key, items))
}

fn listing(output_key: &'static str, items: Vec<Value>) -> ModuleOutput {
    let msg = format!("fetched {} {}", items.len(), output_key);
    ModuleOutput::new(false, output_key, Value::Array(items), msg)
}
