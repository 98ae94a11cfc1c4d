//! Inventory source configuration
//!
//! Loaded from the YAML file Ansible hands to the inventory plugin.
//! Unknown keys are rejected so a typo in `keyed_groups` does not
//! silently drop a grouping rule.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

fn default_cache_timeout() -> u64 {
    300
}

fn default_separator() -> String {
    "_".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeyedGroup {
    pub key: String,
    pub prefix: String,
    #[serde(default = "default_separator")]
    pub separator: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InventorySource {
    pub plugin: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub cache: bool,
    /// Accepted for source-file compatibility; the cache is always the
    /// file at `cache_connection`, so the plugin name is ignored.
    #[serde(default)]
    pub cache_plugin: Option<String>,
    #[serde(default)]
    pub cache_connection: Option<String>,
    #[serde(default = "default_cache_timeout")]
    pub cache_timeout: u64,
    /// Host attributes projected into hostvars. Empty means every
    /// top-level field of the record.
    #[serde(default)]
    pub attributes: Vec<String>,
    #[serde(default)]
    pub compose: BTreeMap<String, String>,
    #[serde(default)]
    pub keyed_groups: Vec<KeyedGroup>,
    #[serde(default)]
    pub groups: BTreeMap<String, String>,
}

impl InventorySource {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read inventory source {}", path.display()))?;
        let source: InventorySource = serde_yaml::from_str(&raw)
            .with_context(|| format!("invalid inventory source {}", path.display()))?;
        Ok(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_source() {
        let yaml = r#"
plugin: pidginhost.cloud.inventory
cache: true
cache_connection: /tmp/ph-cache.json
attributes:
  - hostname
  - image
compose:
  ansible_host: networks.public.ipv4
keyed_groups:
  - key: image
    prefix: img
groups:
  web: "'web' in hostname"
"#;
        let source: InventorySource = serde_yaml::from_str(yaml).unwrap();
        assert!(source.cache);
        assert_eq!(source.cache_timeout, 300);
        assert_eq!(source.keyed_groups[0].separator, "_");
        assert_eq!(source.attributes, vec!["hostname", "image"]);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let yaml = "plugin: p\nkeyed_group:\n  - key: image\n";
        assert!(serde_yaml::from_str::<InventorySource>(yaml).is_err());
    }
}
