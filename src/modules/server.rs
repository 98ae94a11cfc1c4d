//! Server module - create or delete cloud servers
//!
//! Creation is validated client-side before any network call: at least
//! one access credential (password or SSH key) must be supplied, and the
//! chosen package must be one of the account's available package slugs.
//! Deletion without the unique-hostname policy requires an explicit id,
//! since hostnames are not unique on the provider side.

use crate::api::{ApiError, CloudClient};
use crate::modules::compact_body;
use crate::output::ModuleOutput;
use crate::resource::{
    extract_list, item_id, locate, reconcile, resource, Disposition, Located, ResourceDriver,
    ResourceRef,
};
use serde_json::{json, Value};

/// Firewall policy choices accepted by the provider
pub const FW_POLICIES: &[&str] = &["ACCEPT", "REJECT", "DROP"];

/// Desired state for a cloud server
#[derive(Debug, Clone, Default)]
pub struct ServerParams {
    pub server_id: Option<u64>,
    pub hostname: Option<String>,
    pub unique_hostname: bool,
    pub image: Option<String>,
    pub package: Option<String>,
    pub project: Option<String>,
    pub password: Option<String>,
    pub ssh_pub_key: Option<String>,
    pub ssh_pub_key_id: Option<String>,
    pub public_ip: Option<String>,
    pub new_ipv4: Option<bool>,
    pub public_ipv6: Option<String>,
    pub new_ipv6: Option<bool>,
    pub fw_rules_set: Option<String>,
    pub fw_policy_in: Option<String>,
    pub fw_policy_out: Option<String>,
    pub private_network: Option<String>,
    pub private_address: Option<String>,
    pub extra_volume_product: Option<String>,
    pub extra_volume_size: Option<u64>,
    pub no_network_acknowledged: Option<bool>,
}

impl ServerParams {
    /// Fail fast on parameter problems detectable without the network.
    /// No partial resource is ever left behind by a rejected create.
    fn validate_create(&self) -> Result<(), ApiError> {
        for (field, value) in [
            ("hostname", &self.hostname),
            ("image", &self.image),
            ("package", &self.package),
        ] {
            if value.as_deref().map_or(true, str::is_empty) {
                return Err(ApiError::Validation(format!(
                    "{field} is required when state is present"
                )));
            }
        }

        let has_credential = self.password.as_deref().is_some_and(|p| !p.is_empty())
            || self.ssh_pub_key.as_deref().is_some_and(|k| !k.is_empty())
            || self.ssh_pub_key_id.as_deref().is_some_and(|k| !k.is_empty());
        if !has_credential {
            return Err(ApiError::Validation(
                "one of password, ssh_pub_key or ssh_pub_key_id must be set to create a server"
                    .to_string(),
            ));
        }

        for policy in [&self.fw_policy_in, &self.fw_policy_out] {
            if let Some(p) = policy {
                if !FW_POLICIES.contains(&p.as_str()) {
                    return Err(ApiError::Validation(format!(
                        "firewall policy must be one of {}, got {p}",
                        FW_POLICIES.join("|")
                    )));
                }
            }
        }
        Ok(())
    }

    fn create_body(&self) -> Value {
        compact_body(json!({
            "image": self.image,
            "package": self.package,
            "hostname": self.hostname,
            "project": self.project,
            "password": self.password,
            "ssh_pub_key": self.ssh_pub_key,
            "ssh_pub_key_id": self.ssh_pub_key_id,
            "public_ip": self.public_ip,
            "new_ipv4": self.new_ipv4,
            "public_ipv6": self.public_ipv6,
            "new_ipv6": self.new_ipv6,
            "fw_rules_set": self.fw_rules_set,
            "fw_policy_in": self.fw_policy_in,
            "fw_policy_out": self.fw_policy_out,
            "private_network": self.private_network,
            "private_address": self.private_address,
            "extra_volume_product": self.extra_volume_product,
            "extra_volume_size": self.extra_volume_size,
            "no_network_acknowledged": self.no_network_acknowledged,
        }))
    }
}

struct ServerDriver<'a> {
    params: &'a ServerParams,
}

impl ResourceDriver for ServerDriver<'_> {
    fn describe(&self) -> String {
        match (&self.params.hostname, self.params.server_id) {
            (Some(h), _) => format!("Cloud Server ({h})"),
            (None, Some(id)) => format!("Cloud Server with ID {id}"),
            (None, None) => "Cloud Server".to_string(),
        }
    }

    fn matches(&self, observed: &Value) -> bool {
        // A server has no general in-place update; it satisfies the desired
        // state when every comparable requested attribute already agrees.
        [
            ("hostname", &self.params.hostname),
            ("image", &self.params.image),
            ("package", &self.params.package),
            ("project", &self.params.project),
        ]
        .iter()
        .all(|(field, want)| match want {
            Some(want) => observed.get(*field).and_then(|v| v.as_str()) == Some(want.as_str()),
            None => true,
        })
    }

    async fn create(&self, client: &CloudClient) -> Result<Value, ApiError> {
        client
            .post(&client.servers_path(), Some(&self.params.create_body()))
            .await
    }

    async fn delete(&self, client: &CloudClient, observed: &Value) -> Result<Value, ApiError> {
        let def = resource("servers");
        let id = item_id(observed, def)?;
        client.delete(&client.server_path(id)).await?;
        Ok(Value::Null)
    }
}

/// Ensure a server exists or is gone.
pub async fn run(
    client: &CloudClient,
    disposition: Disposition,
    params: ServerParams,
) -> Result<ModuleOutput, ApiError> {
    let def = resource("servers");

    let located = match disposition {
        Disposition::Present => {
            params.validate_create()?;
            let target = ResourceRef::from_parts(params.server_id, params.hostname.as_deref())
                .ok_or_else(|| {
                    ApiError::Validation("hostname is required when state is present".to_string())
                })?;
            let located = locate(client, def, &target, params.unique_hostname).await?;
            if matches!(located, Located::NotFound) {
                validate_package(client, params.package.as_deref().unwrap_or_default()).await?;
            }
            located
        }
        Disposition::Absent => {
            if let (true, Some(hostname)) = (params.unique_hostname, params.hostname.clone()) {
                locate(client, def, &ResourceRef::Name(hostname), true).await?
            } else {
                let Some(id) = params.server_id else {
                    return Err(ApiError::Validation(
                        "must provide server_id when deleting a Cloud Server without unique_hostname"
                            .to_string(),
                    ));
                };
                locate(client, def, &ResourceRef::Id(id), false).await?
            }
        }
    };

    let driver = ServerDriver { params: &params };
    let result = reconcile(client, &driver, disposition, located).await?;
    Ok(ModuleOutput::from_action(result, "server"))
}

/// Check the requested package slug against the live package catalog.
async fn validate_package(client: &CloudClient, package: &str) -> Result<(), ApiError> {
    let def = resource("packages");
    let response = client.get(&def.endpoint).await?;
    let choices: Vec<String> = extract_list(&response, &def.list_key)
        .iter()
        .filter_map(|p| p.get("slug").and_then(|v| v.as_str()).map(String::from))
        .collect();

    if choices.iter().any(|slug| slug == package) {
        Ok(())
    } else {
        Err(ApiError::Validation(format!(
            "package you have chosen is {package}, value of package must be one of: {}",
            choices.join(", ")
        )))
    }
}
