//! SSH key module - manage the account's public keys
//!
//! Present adds a key when it is missing; an identical key already on the
//! account is reported unchanged. The sync mode (`delete_others`) treats
//! the supplied key list as the complete desired set: missing keys are
//! added and unlisted keys are removed, both lists reported.

use crate::api::{ApiError, CloudClient};
use crate::output::ModuleOutput;
use crate::resource::{extract_list, resource, Disposition};
use serde_json::{json, Value};

#[derive(Debug, Clone, Default)]
pub struct SshKeyParams {
    /// Public key material; sync mode accepts several
    pub keys: Vec<String>,
    /// Treat `keys` as the full desired set and remove everything else
    pub delete_others: bool,
}

/// Fetch the account keys as (id, key material) pairs.
async fn account_keys(client: &CloudClient) -> Result<Vec<(u64, String)>, ApiError> {
    let def = resource("ssh-keys");
    let response = client.get(&def.endpoint).await?;
    Ok(extract_list(&response, &def.list_key)
        .iter()
        .filter_map(|item| {
            let id = item.get("id").and_then(|v| v.as_u64())?;
            let key = item.get("key").and_then(|v| v.as_str())?;
            Some((id, key.to_string()))
        })
        .collect())
}

async fn add_key(client: &CloudClient, key: &str) -> Result<Value, ApiError> {
    client
        .post(&client.ssh_keys_path(), Some(&json!({ "key": key })))
        .await
}

/// Reconcile the account key set.
pub async fn run(
    client: &CloudClient,
    disposition: Disposition,
    params: SshKeyParams,
) -> Result<ModuleOutput, ApiError> {
    if params.keys.is_empty() {
        return Err(ApiError::Validation(
            "at least one ssh_pub_key is required".to_string(),
        ));
    }

    if params.delete_others {
        if disposition == Disposition::Absent {
            return Err(ApiError::Validation(
                "delete_others only makes sense with state present".to_string(),
            ));
        }
        return sync_keys(client, &params.keys).await;
    }

    let key = params.keys[0].as_str();
    let existing = account_keys(client).await?;
    let found = existing.iter().find(|(_, k)| k == key);

    match (disposition, found) {
        (Disposition::Present, Some((id, _))) => Ok(ModuleOutput::new(
            false,
            "ssh_key",
            json!({"id": id, "key": key}),
            "SSH public key already exists on the account",
        )),
        (Disposition::Present, None) => {
            let added = add_key(client, key).await?;
            Ok(ModuleOutput::new(
                true,
                "ssh_key",
                added,
                "SSH public key added to the account",
            ))
        }
        (Disposition::Absent, Some((id, _))) => {
            client.delete(&client.ssh_key_path(*id)).await?;
            Ok(ModuleOutput::new(
                true,
                "ssh_key",
                json!({"id": id, "key": key}),
                "SSH public key deleted from the account",
            ))
        }
        (Disposition::Absent, None) => Ok(ModuleOutput::new(
            false,
            "ssh_key",
            Value::Null,
            "SSH public key does not exist, nothing to do",
        )),
    }
}

/// Make the account's key set equal to `desired`.
async fn sync_keys(client: &CloudClient, desired: &[String]) -> Result<ModuleOutput, ApiError> {
    let existing = account_keys(client).await?;

    let mut added = Vec::new();
    for key in desired {
        if !existing.iter().any(|(_, k)| k == key) {
            add_key(client, key).await?;
            added.push(key.clone());
        }
    }

    let mut removed = Vec::new();
    for (id, key) in &existing {
        if !desired.contains(key) {
            client.delete(&client.ssh_key_path(*id)).await?;
            removed.push(key.clone());
        }
    }

    let changed = !added.is_empty() || !removed.is_empty();
    let msg = if changed {
        format!(
            "account keys synchronized: {} added, {} removed",
            added.len(),
            removed.len()
        )
    } else {
        "account keys already match the desired set".to_string()
    };

    Ok(ModuleOutput::new(
        changed,
        "ssh_key",
        json!({"added": added, "removed": removed}),
        msg,
    ))
}
