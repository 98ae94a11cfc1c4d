//! Resource Locator
//!
//! Resolves a target resource by opaque id or human-readable name. The id
//! path fetches the item endpoint directly and never lists the collection.
//! The name path lists the collection and filters by exact match on the
//! descriptor's name field; the provider does not enforce name uniqueness,
//! so the uniqueness check here is the caller's safety net.

use super::registry::ResourceDef;
use crate::api::{ApiError, CloudClient};
use serde_json::Value;

/// Target identity: numeric id or name-like string.
/// When both inputs are supplied, id is authoritative.
#[derive(Debug, Clone)]
pub enum ResourceRef {
    Id(u64),
    Name(String),
}

impl ResourceRef {
    /// Build a ref from optional id/name parameters, id taking precedence.
    pub fn from_parts(id: Option<u64>, name: Option<&str>) -> Option<Self> {
        if let Some(id) = id {
            return Some(ResourceRef::Id(id));
        }
        name.filter(|n| !n.is_empty())
            .map(|n| ResourceRef::Name(n.to_string()))
    }
}

/// Outcome of a locate: zero matches is a state, not an error.
#[derive(Debug, Clone)]
pub enum Located {
    Found(Value),
    NotFound,
}

impl Located {
    pub fn found(&self) -> Option<&Value> {
        match self {
            Located::Found(v) => Some(v),
            Located::NotFound => None,
        }
    }
}

/// Pull the item array out of a list response using the descriptor's
/// list key (empty key means the response body is the array itself).
pub fn extract_list(response: &Value, list_key: &str) -> Vec<Value> {
    let items = if list_key.is_empty() {
        response.as_array().cloned()
    } else {
        response.get(list_key).and_then(|v| v.as_array()).cloned()
    };
    items.unwrap_or_default()
}

/// Resolve a resource against its collection.
///
/// `unique` enforces the single-match policy for name resolution: more
/// than one match fails with `Ambiguous`, listing the colliding ids.
/// Without the policy the first match wins.
pub async fn locate(
    client: &CloudClient,
    def: &ResourceDef,
    target: &ResourceRef,
    unique: bool,
) -> Result<Located, ApiError> {
    match target {
        ResourceRef::Id(id) => match client.get(&def.item_endpoint(*id)).await {
            Ok(item) => Ok(Located::Found(item)),
            Err(e) if e.is_not_found() => Ok(Located::NotFound),
            Err(e) => Err(e),
        },
        ResourceRef::Name(name) => {
            let response = client.get(&def.endpoint).await?;
            let matches: Vec<Value> = extract_list(&response, &def.list_key)
                .into_iter()
                .filter(|item| {
                    item.get(&def.name_field).and_then(|v| v.as_str()) == Some(name.as_str())
                })
                .collect();

            match matches.len() {
                0 => Ok(Located::NotFound),
                1 => Ok(Located::Found(matches.into_iter().next().unwrap())),
                n if unique => {
                    let ids: Vec<String> = matches
                        .iter()
                        .map(|m| {
                            m.get(&def.id_field)
                                .map(|v| v.to_string())
                                .unwrap_or_else(|| "?".to_string())
                        })
                        .collect();
                    Err(ApiError::Ambiguous(format!(
                        "{} {} named ({}) : ({})",
                        n,
                        def.display_name,
                        name,
                        ids.join(", ")
                    )))
                }
                _ => Ok(Located::Found(matches.into_iter().next().unwrap())),
            }
        }
    }
}

/// Locate that treats absence as a hard error, for operations that need
/// an existing target (power transitions, attachments).
pub async fn locate_required(
    client: &CloudClient,
    def: &ResourceDef,
    target: &ResourceRef,
    unique: bool,
) -> Result<Value, ApiError> {
    match locate(client, def, target, unique).await? {
        Located::Found(item) => Ok(item),
        Located::NotFound => Err(ApiError::NotFound(match target {
            ResourceRef::Id(id) => format!("No {} with ID {}", def.display_name, id),
            ResourceRef::Name(name) => format!("No {} named {}", def.display_name, name),
        })),
    }
}

/// Numeric id of a located resource.
pub fn item_id(item: &Value, def: &ResourceDef) -> Result<u64, ApiError> {
    item.get(&def.id_field)
        .and_then(|v| v.as_u64())
        .ok_or_else(|| {
            ApiError::Validation(format!(
                "{} item has no numeric {} field",
                def.display_name, def.id_field
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ref_id_takes_precedence() {
        let r = ResourceRef::from_parts(Some(7), Some("h1")).unwrap();
        assert!(matches!(r, ResourceRef::Id(7)));
    }

    #[test]
    fn ref_requires_some_identity() {
        assert!(ResourceRef::from_parts(None, None).is_none());
        assert!(ResourceRef::from_parts(None, Some("")).is_none());
    }

    #[test]
    fn extract_list_honors_list_key() {
        let wrapped = json!({"results": [{"id": 1}, {"id": 2}]});
        assert_eq!(extract_list(&wrapped, "results").len(), 2);

        let bare = json!([{"id": 1}]);
        assert_eq!(extract_list(&bare, "").len(), 1);

        // Missing key is an empty collection, not a panic
        assert!(extract_list(&wrapped, "volumes").is_empty());
    }
}
