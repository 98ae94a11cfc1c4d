//! Resize module - grow a volume or upgrade a server package
//!
//! Two in-place update paths share this module: `disk` grows an attached
//! volume (sizes only go up, bounds-checked against the storage product)
//! and the package path moves a server to a strictly higher package.

use crate::api::{ApiError, CloudClient};
use crate::modules::compact_body;
use crate::modules::volume::validate_product;
use crate::output::ModuleOutput;
use crate::resource::{
    extract_list, item_id, locate_required, resource, ResourceRef,
};
use serde_json::json;

#[derive(Debug, Clone, Default)]
pub struct ResizeParams {
    pub server_id: Option<u64>,
    pub server_hostname: Option<String>,
    /// Grow a volume instead of upgrading the package
    pub disk: bool,
    pub volume_alias: Option<String>,
    pub product: Option<String>,
    pub size_gigabytes: Option<u64>,
    pub project: Option<String>,
    pub package_name: Option<String>,
}

/// Numeric tier of a package slug like `cloudv-3`.
fn package_tier(slug: &str) -> Option<u64> {
    slug.rsplit('-').next()?.parse().ok()
}

/// Apply the requested resize.
pub async fn run(client: &CloudClient, params: ResizeParams) -> Result<ModuleOutput, ApiError> {
    let server_def = resource("servers");
    let target = ResourceRef::from_parts(params.server_id, params.server_hostname.as_deref())
        .ok_or_else(|| {
            ApiError::Validation("one of server_id or server_hostname is required".to_string())
        })?;
    let server = locate_required(client, server_def, &target, true).await?;
    let server_id = item_id(&server, server_def)?;

    if params.disk {
        resize_volume(client, server_id, &params).await
    } else {
        upgrade_package(client, server_id, &server, &params).await
    }
}

async fn resize_volume(
    client: &CloudClient,
    server_id: u64,
    params: &ResizeParams,
) -> Result<ModuleOutput, ApiError> {
    let (Some(alias), Some(product), Some(size)) = (
        params.volume_alias.as_deref(),
        params.product.as_deref(),
        params.size_gigabytes,
    ) else {
        return Err(ApiError::Validation(
            "volume_alias, product and size_gigabytes are required with disk".to_string(),
        ));
    };

    validate_product(client, product, size).await?;

    // The volume must be attached to this server
    let response = client.get(&client.server_volumes_path(server_id)).await?;
    let volume = extract_list(&response, "volumes")
        .into_iter()
        .find(|v| {
            v.get("alias").and_then(|a| a.as_str()) == Some(alias)
                && v.get("attached").and_then(|a| a.as_bool()) == Some(true)
        })
        .ok_or_else(|| {
            ApiError::Validation(format!("no attached volume with alias ({alias})"))
        })?;

    let current = volume.get("size").and_then(|v| v.as_u64()).unwrap_or(0);
    if current >= size {
        return Err(ApiError::Validation(format!(
            "the volume size is ({current}) while you selected ({size}); \
             a volume cannot shrink"
        )));
    }

    let volume_id = item_id(&volume, resource("volumes"))?;
    let body = compact_body(json!({
        "alias": alias,
        "size": size,
        "product": product,
        "project": params.project,
    }));
    let updated = client.patch(&client.volume_path(volume_id), &body).await?;

    Ok(ModuleOutput::new(
        true,
        "action",
        updated,
        format!("volume ({alias}) resized from {current} to {size}"),
    ))
}

async fn upgrade_package(
    client: &CloudClient,
    server_id: u64,
    server: &serde_json::Value,
    params: &ResizeParams,
) -> Result<ModuleOutput, ApiError> {
    let Some(package_name) = params.package_name.as_deref() else {
        return Err(ApiError::Validation(
            "package_name is required without disk".to_string(),
        ));
    };

    let package_def = resource("packages");
    let catalog = client.get(&package_def.endpoint).await?;
    let known = extract_list(&catalog, &package_def.list_key)
        .iter()
        .any(|p| p.get("slug").and_then(|v| v.as_str()) == Some(package_name));
    if !known {
        return Err(ApiError::Validation(format!(
            "unknown package {package_name}"
        )));
    }

    let current_package = server
        .get("package")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    let (Some(current_tier), Some(new_tier)) = (
        package_tier(&current_package),
        package_tier(package_name),
    ) else {
        return Err(ApiError::Validation(format!(
            "cannot compare package tiers ({current_package} -> {package_name})"
        )));
    };
    if new_tier <= current_tier {
        return Err(ApiError::Validation(format!(
            "chosen package {package_name} must be higher than actual package {current_package}"
        )));
    }

    let updated = client
        .post(
            &client.modify_package_path(server_id),
            Some(&json!({"package": package_name})),
        )
        .await?;

    Ok(ModuleOutput::new(
        true,
        "action",
        updated,
        format!("server package changed from {current_package} to {package_name}"),
    ))
}
