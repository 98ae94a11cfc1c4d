//! Volume module - create or delete extra volumes
//!
//! A new volume is created directly attached to a server; deletion only
//! applies to detached volumes, resolved by alias.

use crate::api::{ApiError, CloudClient};
use crate::output::ModuleOutput;
use crate::resource::{
    extract_list, item_id, locate, locate_required, reconcile, resource, Disposition, Located,
    ResourceDriver, ResourceRef,
};
use serde_json::{json, Value};

/// Desired state for a volume
#[derive(Debug, Clone, Default)]
pub struct VolumeParams {
    pub alias: Option<String>,
    pub project: Option<String>,
    pub size_gigabytes: Option<u64>,
    pub product: Option<String>,
    /// Hostname of the server the new volume is attached to
    pub server_hostname: Option<String>,
}

/// Size bounds for one storage product
pub(crate) struct ProductBounds {
    pub min_size: u64,
    pub max_size: u64,
}

/// Fetch the storage product catalog and validate the requested slug and
/// size against it.
pub(crate) async fn validate_product(
    client: &CloudClient,
    product: &str,
    size_gigabytes: u64,
) -> Result<ProductBounds, ApiError> {
    let def = resource("storage-products");
    let response = client.get(&def.endpoint).await?;
    let products = extract_list(&response, &def.list_key);

    let found = products
        .iter()
        .find(|p| p.get("slug").and_then(|v| v.as_str()) == Some(product));

    let Some(found) = found else {
        let slugs: Vec<&str> = products
            .iter()
            .filter_map(|p| p.get("slug").and_then(|v| v.as_str()))
            .collect();
        return Err(ApiError::Validation(format!(
            "no product named {product}, available products: {}",
            slugs.join(", ")
        )));
    };

    let bounds = ProductBounds {
        min_size: found.get("min_size").and_then(|v| v.as_u64()).unwrap_or(0),
        max_size: found
            .get("max_size")
            .and_then(|v| v.as_u64())
            .unwrap_or(u64::MAX),
    };

    if size_gigabytes < bounds.min_size || size_gigabytes > bounds.max_size {
        return Err(ApiError::Validation(format!(
            "storage size {size_gigabytes} for {product} must be between {} and {}",
            bounds.min_size, bounds.max_size
        )));
    }
    Ok(bounds)
}

struct VolumeDriver<'a> {
    params: &'a VolumeParams,
    server_id: Option<u64>,
}

impl ResourceDriver for VolumeDriver<'_> {
    fn describe(&self) -> String {
        format!(
            "Volume ({})",
            self.params.alias.as_deref().unwrap_or("unnamed")
        )
    }

    fn matches(&self, observed: &Value) -> bool {
        // Alias match located it; same product and size means satisfied.
        let product_ok = match &self.params.product {
            Some(p) => observed.get("product").and_then(|v| v.as_str()) == Some(p.as_str()),
            None => true,
        };
        let size_ok = match self.params.size_gigabytes {
            Some(s) => observed.get("size").and_then(|v| v.as_u64()) == Some(s),
            None => true,
        };
        product_ok && size_ok
    }

    async fn create(&self, client: &CloudClient) -> Result<Value, ApiError> {
        let server_id = self.server_id.ok_or_else(|| {
            ApiError::Validation("server_hostname is required to create a volume".to_string())
        })?;
        let body = json!({
            "project": self.params.project,
            "alias": self.params.alias,
            "size": self.params.size_gigabytes,
            "product": self.params.product,
        });
        client
            .post(
                &client.server_volumes_path(server_id),
                Some(&super::compact_body(body)),
            )
            .await
    }

    async fn delete(&self, client: &CloudClient, observed: &Value) -> Result<Value, ApiError> {
        if observed.get("attached").and_then(|v| v.as_bool()) == Some(true) {
            return Err(ApiError::Validation(format!(
                "{} is attached; detach it before deleting",
                self.describe()
            )));
        }
        let id = item_id(observed, resource("volumes"))?;
        client.delete(&client.volume_path(id)).await?;
        Ok(Value::Null)
    }
}

/// Ensure a volume exists (attached to the given server) or is gone.
pub async fn run(
    client: &CloudClient,
    disposition: Disposition,
    params: VolumeParams,
) -> Result<ModuleOutput, ApiError> {
    let def = resource("volumes");
    let alias = params
        .alias
        .as_deref()
        .filter(|a| !a.is_empty())
        .ok_or_else(|| ApiError::Validation("volume alias is required".to_string()))?;

    let mut server_id = None;
    if disposition == Disposition::Present {
        let (Some(product), Some(size)) = (params.product.as_deref(), params.size_gigabytes)
        else {
            return Err(ApiError::Validation(
                "product and size_gigabytes are required when state is present".to_string(),
            ));
        };
        validate_product(client, product, size).await?;

        let hostname = params.server_hostname.as_deref().ok_or_else(|| {
            ApiError::Validation("server_hostname is required when state is present".to_string())
        })?;
        let server = locate_required(
            client,
            resource("servers"),
            &ResourceRef::Name(hostname.to_string()),
            true,
        )
        .await?;
        server_id = Some(item_id(&server, resource("servers"))?);
    }

    let located = locate(client, def, &ResourceRef::Name(alias.to_string()), true).await?;

    // Deleting an attached volume is refused in the driver; restrict the
    // absent path to detached volumes up front so the message names it.
    let located = match (disposition, located) {
        (Disposition::Absent, Located::Found(v))
            if v.get("attached").and_then(|a| a.as_bool()) == Some(true) =>
        {
            return Err(ApiError::Validation(format!(
                "no detached volume with alias {alias}"
            )));
        }
        (_, l) => l,
    };

    let driver = VolumeDriver {
        params: &params,
        server_id,
    };
    let result = reconcile(client, &driver, disposition, located).await?;
    Ok(ModuleOutput::from_action(result, "volume"))
}
