//! Resource Registry - Load resource descriptors from JSON
//!
//! Each locatable provider collection is described by one descriptor:
//! where to list it, which key holds the items, and which fields identify
//! a resource by id or by name. Adding a collection is data, not code.

use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Embedded descriptor JSON (compiled into the binary)
const RESOURCE_FILES: &[&str] = &[include_str!("../resources/cloud.json")];

/// Descriptor for one provider collection
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceDef {
    pub display_name: String,
    /// Collection endpoint, relative to the API base URL
    pub endpoint: String,
    /// Key holding the item array in a list response; empty when the
    /// response body is the array itself
    #[serde(default)]
    pub list_key: String,
    pub id_field: String,
    /// Field used for exact-match name resolution (hostname, alias, ...)
    pub name_field: String,
    /// Key under which modules surface this resource in their result
    pub output_key: String,
}

impl ResourceDef {
    /// Item endpoint for a fetch-by-id
    pub fn item_endpoint(&self, id: u64) -> String {
        format!("{}{id}", self.endpoint)
    }
}

/// Root structure of resources/*.json
#[derive(Debug, Clone, Deserialize)]
struct ResourceConfig {
    resources: HashMap<String, ResourceDef>,
}

static REGISTRY: OnceLock<HashMap<String, ResourceDef>> = OnceLock::new();

fn get_registry() -> &'static HashMap<String, ResourceDef> {
    REGISTRY.get_or_init(|| {
        let mut resources = HashMap::new();
        for content in RESOURCE_FILES {
            let partial: ResourceConfig = serde_json::from_str(content)
                .unwrap_or_else(|e| panic!("Failed to parse embedded resource JSON: {}", e));
            resources.extend(partial.resources);
        }
        resources
    })
}

/// Get a resource descriptor by key, panicking on a typo. All call sites
/// use static keys, so a miss is a programming error, not user input.
pub fn resource(key: &str) -> &'static ResourceDef {
    get_registry()
        .get(key)
        .unwrap_or_else(|| panic!("unknown resource descriptor: {}", key))
}

/// Lookup that surfaces a miss to the caller
pub fn get_resource(key: &str) -> Option<&'static ResourceDef> {
    get_registry().get(key)
}
