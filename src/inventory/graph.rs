//! Inventory catalog shape
//!
//! The JSON an inventory script emits: `_meta.hostvars` per host,
//! `all.children` naming every group, each group carrying its `hosts`
//! list. Hosts matching no group land in `ungrouped`. BTreeMaps keep
//! the rendered catalog deterministic.

use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct Catalog {
    hostvars: BTreeMap<String, Value>,
    groups: BTreeMap<String, Vec<String>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_host(&mut self, name: &str, vars: Value) {
        self.hostvars.insert(name.to_string(), vars);
    }

    pub fn add_to_group(&mut self, group: &str, host: &str) {
        let members = self.groups.entry(group.to_string()).or_default();
        if !members.iter().any(|m| m == host) {
            members.push(host.to_string());
        }
    }

    pub fn group_members(&self, group: &str) -> Option<&[String]> {
        self.groups.get(group).map(Vec::as_slice)
    }

    /// Place every host that landed in no group into `ungrouped`.
    pub fn finish(&mut self) {
        let grouped: Vec<String> = self.groups.values().flatten().cloned().collect();
        let loose: Vec<String> = self
            .hostvars
            .keys()
            .filter(|host| !grouped.contains(host))
            .cloned()
            .collect();
        for host in loose {
            self.add_to_group("ungrouped", &host);
        }
    }

    pub fn render(&self) -> Value {
        let mut out = Map::new();
        out.insert(
            "_meta".to_string(),
            json!({"hostvars": self.hostvars.clone()}),
        );
        let children: Vec<&String> = self.groups.keys().collect();
        out.insert("all".to_string(), json!({"children": children}));
        for (group, hosts) in &self.groups {
            out.insert(group.clone(), json!({"hosts": hosts}));
        }
        Value::Object(out)
    }
}
