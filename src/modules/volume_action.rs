//! Volume action module - attach or detach volumes
//!
//! Models the volume/server edge: present attaches a detached volume to
//! the named server, absent removes the edge. A volume that is already
//! where it should be is reported unchanged.

use crate::api::{ApiError, CloudClient};
use crate::output::ModuleOutput;
use crate::resource::{item_id, locate_required, resource, ResourceRef};
use serde_json::json;

#[derive(Debug, Clone, Default)]
pub struct VolumeActionParams {
    pub volume_alias: String,
    pub server_hostname: String,
}

/// Ensure the volume is attached to the server.
pub async fn attach(
    client: &CloudClient,
    params: VolumeActionParams,
) -> Result<ModuleOutput, ApiError> {
    let volume_def = resource("volumes");
    let server_def = resource("servers");

    let volume = locate_required(
        client,
        volume_def,
        &ResourceRef::Name(params.volume_alias.clone()),
        true,
    )
    .await?;
    let server = locate_required(
        client,
        server_def,
        &ResourceRef::Name(params.server_hostname.clone()),
        true,
    )
    .await?;

    let attached = volume.get("attached").and_then(|v| v.as_bool()).unwrap_or(false);
    let holder = volume.get("server").and_then(|v| v.as_str());

    if attached {
        if holder == Some(params.server_hostname.as_str()) {
            return Ok(ModuleOutput::new(
                false,
                "volume",
                volume.clone(),
                format!(
                    "volume ({}) already attached to ({})",
                    params.volume_alias, params.server_hostname
                ),
            ));
        }
        return Err(ApiError::Validation(format!(
            "volume ({}) is attached to ({}); detach it first",
            params.volume_alias,
            holder.unwrap_or("another server")
        )));
    }

    let volume_id = item_id(&volume, volume_def)?;
    let server_id = item_id(&server, server_def)?;
    client
        .post(
            &client.volume_attach_path(volume_id),
            Some(&json!({ "vm": server_id })),
        )
        .await?;

    Ok(ModuleOutput::new(
        true,
        "volume",
        volume,
        format!(
            "attached volume ({}) to ({})",
            params.volume_alias, params.server_hostname
        ),
    ))
}

/// Ensure the volume is not attached to the server.
pub async fn detach(
    client: &CloudClient,
    params: VolumeActionParams,
) -> Result<ModuleOutput, ApiError> {
    let volume_def = resource("volumes");

    let volume = locate_required(
        client,
        volume_def,
        &ResourceRef::Name(params.volume_alias.clone()),
        true,
    )
    .await?;

    let attached = volume.get("attached").and_then(|v| v.as_bool()).unwrap_or(false);
    let holder = volume.get("server").and_then(|v| v.as_str());

    if !attached || holder != Some(params.server_hostname.as_str()) {
        return Ok(ModuleOutput::new(
            false,
            "volume",
            volume.clone(),
            format!(
                "volume ({}) not attached to ({}), nothing to do",
                params.volume_alias, params.server_hostname
            ),
        ));
    }

    let volume_id = item_id(&volume, volume_def)?;
    client
        .post(
            &client.volume_detach_path(volume_id),
            Some(&json!({ "alias": params.volume_alias })),
        )
        .await?;

    Ok(ModuleOutput::new(
        true,
        "volume",
        volume,
        format!(
            "detached volume ({}) from ({})",
            params.volume_alias, params.server_hostname
        ),
    ))
}
