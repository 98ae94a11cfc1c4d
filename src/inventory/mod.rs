//! Dynamic inventory pipeline
//!
//! Cache check, provider fetch, projection, composition, persist,
//! grouping. A fresh cache snapshot short-circuits the fetch entirely;
//! the snapshot stores the pre-grouping projected records, so a cache
//! hit runs only the grouping stage.

pub mod cache;
pub mod compose;
pub mod config;
pub mod graph;

pub use cache::{InventoryCache, Snapshot};
pub use compose::{Expr, ExprError, Predicate};
pub use config::{InventorySource, KeyedGroup};
pub use graph::Catalog;

use crate::api::CloudClient;
use crate::resource::{extract_list, resource};
use anyhow::{bail, Context, Result};
use serde_json::{json, Map, Value};

const DEFAULT_REMOTE_USER: &str = "phuser";

struct CompiledSource<'a> {
    source: &'a InventorySource,
    compose: Vec<(&'a str, Expr)>,
    keyed: Vec<(&'a KeyedGroup, Expr)>,
    groups: Vec<(&'a str, Predicate)>,
}

/// Parse every expression in the source up front. A typo in one
/// grouping rule fails the whole run instead of silently dropping
/// hosts from a group.
fn compile(source: &InventorySource) -> Result<CompiledSource<'_>> {
    let mut compose = Vec::new();
    for (var, expr) in &source.compose {
        let parsed = Expr::parse(expr).with_context(|| format!("compose variable `{var}`"))?;
        compose.push((var.as_str(), parsed));
    }
    let mut keyed = Vec::new();
    for group in &source.keyed_groups {
        let parsed =
            Expr::parse(&group.key).with_context(|| format!("keyed group `{}`", group.prefix))?;
        keyed.push((group, parsed));
    }
    let mut groups = Vec::new();
    for (name, predicate) in &source.groups {
        let parsed = Predicate::parse(predicate).with_context(|| format!("group `{name}`"))?;
        groups.push((name.as_str(), parsed));
    }
    Ok(CompiledSource {
        source,
        compose,
        keyed,
        groups,
    })
}

/// Build the inventory catalog for a source.
pub async fn build(client: &CloudClient, source: &InventorySource) -> Result<Value> {
    let compiled = compile(source)?;

    let cache = match (source.cache, &source.cache_connection) {
        (true, Some(path)) => Some(InventoryCache::new(path, source.cache_timeout)),
        (true, None) => bail!("cache is enabled but cache_connection is not set"),
        _ => None,
    };

    let records = match cache.as_ref().and_then(InventoryCache::load_fresh) {
        Some(snapshot) => snapshot.servers,
        None => {
            let raw = fetch_servers(client).await?;
            let records: Vec<Value> = raw.iter().filter_map(|r| project(&compiled, r)).collect();
            if let Some(cache) = &cache {
                cache.store(&records)?;
            }
            records
        }
    };

    Ok(group(&compiled, &records).render())
}

async fn fetch_servers(client: &CloudClient) -> Result<Vec<Value>> {
    let def = resource("servers");
    let response = client
        .get(&def.endpoint)
        .await
        .context("failed to fetch the server list")?;
    Ok(extract_list(&response, &def.list_key))
}

/// Projection keeps only the configured attributes (all top-level
/// fields when none are configured), then layers composed variables
/// and the default remote user on top. The hostname is always kept;
/// it names the host. Records without one are dropped.
fn project(compiled: &CompiledSource<'_>, record: &Value) -> Option<Value> {
    let hostname = record.get("hostname").and_then(Value::as_str)?;
    if hostname.is_empty() {
        return None;
    }

    let mut vars = Map::new();
    match compiled.source.attributes.as_slice() {
        [] => {
            if let Some(fields) = record.as_object() {
                vars.extend(fields.clone());
            }
        }
        attributes => {
            for attribute in attributes {
                if let Some(value) = record.get(attribute) {
                    vars.insert(attribute.clone(), value.clone());
                }
            }
        }
    }
    vars.insert("hostname".to_string(), json!(hostname));
    vars.entry("ansible_user".to_string())
        .or_insert_with(|| json!(DEFAULT_REMOTE_USER));
    for (var, expr) in &compiled.compose {
        if let Some(value) = expr.eval(record) {
            vars.insert((*var).to_string(), value);
        }
    }
    Some(Value::Object(vars))
}

/// Grouping runs over the projected records, on the fetch path and the
/// cache-hit path alike. A keyed group over an attribute that was not
/// projected matches nothing.
fn group(compiled: &CompiledSource<'_>, records: &[Value]) -> Catalog {
    let mut catalog = Catalog::new();
    for record in records {
        let Some(host) = record.get("hostname").and_then(Value::as_str) else {
            tracing::warn!("skipping an inventory record without a hostname");
            continue;
        };
        catalog.add_host(host, record.clone());

        for (rule, key) in &compiled.keyed {
            if let Some(value) = key.eval(record).as_ref().and_then(group_label) {
                let name = format!("{}{}{}", rule.prefix, rule.separator, value);
                catalog.add_to_group(&name, host);
            }
        }
        for (name, predicate) in &compiled.groups {
            if predicate.matches(record) {
                catalog.add_to_group(name, host);
            }
        }
    }
    catalog.finish();
    catalog
}

fn group_label(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source_from(yaml: &str) -> InventorySource {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn projection_keeps_configured_attributes_only() {
        let source = source_from("plugin: p\nattributes: [hostname, image]\n");
        let compiled = compile(&source).unwrap();
        let record = json!({"hostname": "h1", "image": "ubuntu22", "secret": "x"});
        let vars = project(&compiled, &record).unwrap();
        assert_eq!(vars["hostname"], "h1");
        assert_eq!(vars["ansible_user"], "phuser");
        assert!(vars.get("secret").is_none());
    }

    #[test]
    fn hostname_survives_projection_even_when_not_configured() {
        let source = source_from("plugin: p\nattributes: [image]\n");
        let compiled = compile(&source).unwrap();
        let record = json!({"hostname": "h1", "image": "ubuntu22"});
        let vars = project(&compiled, &record).unwrap();
        assert_eq!(vars["hostname"], "h1");
    }

    #[test]
    fn compose_layers_on_top_of_projection() {
        let source = source_from(
            "plugin: p\nattributes: [hostname]\ncompose:\n  ansible_host: networks.public.ipv4\n",
        );
        let compiled = compile(&source).unwrap();
        let record = json!({
            "hostname": "h1",
            "networks": {"public": {"ipv4": "203.0.113.9"}},
        });
        let vars = project(&compiled, &record).unwrap();
        assert_eq!(vars["ansible_host"], "203.0.113.9");
        assert!(vars.get("networks").is_none());
    }

    #[test]
    fn keyed_and_conditional_groups() {
        let source = source_from(
            "plugin: p\nkeyed_groups:\n  - key: status\n    prefix: status\ngroups:\n  ubuntu: \"'ubuntu' in image\"\n",
        );
        let compiled = compile(&source).unwrap();
        let records = vec![
            json!({"hostname": "h1", "image": "ubuntu22", "status": "active"}),
            json!({"hostname": "h2", "image": "debian12", "status": "stopped"}),
        ];
        let catalog = group(&compiled, &records);
        assert_eq!(catalog.group_members("status_active").unwrap(), ["h1"]);
        assert_eq!(catalog.group_members("ubuntu").unwrap(), ["h1"]);
        assert_eq!(catalog.group_members("status_stopped").unwrap(), ["h2"]);
        assert!(catalog.group_members("ungrouped").is_none());
    }

    #[test]
    fn bad_compose_expression_fails_compile() {
        let source = source_from("plugin: p\ncompose:\n  a: \"x | nope('y')\"\n");
        assert!(compile(&source).is_err());
    }

    #[test]
    fn records_without_hostnames_are_dropped() {
        let source = source_from("plugin: p\n");
        let compiled = compile(&source).unwrap();
        assert!(project(&compiled, &json!({"id": 9})).is_none());
        assert!(project(&compiled, &json!({"hostname": ""})).is_none());
    }
}
