//! Firewall module - manage firewall rules sets and their rules
//!
//! Present either ensures the named rules set exists (`create_rules_set`)
//! or appends one rule to it. Rule appends are not diffed against existing
//! rules; the provider keeps rule positions, so an append is always a
//! change. Absent deletes the set by name.

use crate::api::{ApiError, CloudClient};
use crate::modules::compact_body;
use crate::output::ModuleOutput;
use crate::resource::{
    item_id, locate, locate_required, reconcile, resource, Disposition, ResourceDriver,
    ResourceRef,
};
use serde_json::{json, Value};

/// Rule actions accepted by the provider
pub const RULE_ACTIONS: &[&str] = &["ACCEPT", "DROP", "REJECT"];

/// One firewall rule to append
#[derive(Debug, Clone, Default)]
pub struct FirewallRule {
    /// "in" or "out"
    pub direction: Option<String>,
    pub action: Option<String>,
    pub protocol: Option<String>,
    pub source: Option<String>,
    pub sport: Option<String>,
    pub destination: Option<String>,
    pub dport: Option<String>,
    pub enabled: Option<bool>,
    pub position: Option<String>,
}

impl FirewallRule {
    fn validate(&self) -> Result<(), ApiError> {
        if let Some(direction) = &self.direction {
            if direction != "in" && direction != "out" {
                return Err(ApiError::Validation(format!(
                    "rule direction must be in|out, got {direction}"
                )));
            }
        }
        if let Some(action) = &self.action {
            if !RULE_ACTIONS.contains(&action.as_str()) {
                return Err(ApiError::Validation(format!(
                    "rule action must be one of {}, got {action}",
                    RULE_ACTIONS.join("|")
                )));
            }
        }
        Ok(())
    }

    fn body(&self) -> Value {
        compact_body(json!({
            "direction": self.direction,
            "action": self.action,
            "protocol": self.protocol,
            "source": self.source,
            "sport": self.sport,
            "destination": self.destination,
            "dport": self.dport,
            "enabled": self.enabled,
            "position": self.position,
        }))
    }
}

#[derive(Debug, Clone, Default)]
pub struct FirewallParams {
    pub rules_set_name: String,
    /// Ensure the set itself exists instead of appending a rule
    pub create_rules_set: bool,
    pub rule: FirewallRule,
}

struct RulesSetDriver<'a> {
    name: &'a str,
}

impl ResourceDriver for RulesSetDriver<'_> {
    fn describe(&self) -> String {
        format!("Firewall rules set ({})", self.name)
    }

    fn matches(&self, _observed: &Value) -> bool {
        // Located by exact name; nothing else to compare on the set itself.
        true
    }

    async fn create(&self, client: &CloudClient) -> Result<Value, ApiError> {
        client
            .post(
                &client.firewall_sets_path(),
                Some(&json!({ "name": self.name })),
            )
            .await
    }

    async fn delete(&self, client: &CloudClient, observed: &Value) -> Result<Value, ApiError> {
        let id = item_id(observed, resource("firewalls"))?;
        client.delete(&client.firewall_set_path(id)).await?;
        Ok(Value::Null)
    }
}

/// Ensure a rules set exists/is gone, or append a rule to it.
pub async fn run(
    client: &CloudClient,
    disposition: Disposition,
    params: FirewallParams,
) -> Result<ModuleOutput, ApiError> {
    if params.rules_set_name.is_empty() {
        return Err(ApiError::Validation("rules_set_name is required".to_string()));
    }
    let def = resource("firewalls");
    let target = ResourceRef::Name(params.rules_set_name.clone());

    if disposition == Disposition::Absent || params.create_rules_set {
        let located = locate(client, def, &target, true).await?;
        let driver = RulesSetDriver {
            name: &params.rules_set_name,
        };
        let result = reconcile(client, &driver, disposition, located).await?;
        return Ok(ModuleOutput::from_action(result, "firewall"));
    }

    // Append one rule to an existing set
    params.rule.validate()?;
    let set = locate_required(client, def, &target, true).await?;
    let set_id = item_id(&set, def)?;
    let rule = client
        .post(&client.firewall_rules_path(set_id), Some(&params.rule.body()))
        .await?;

    Ok(ModuleOutput::new(
        true,
        "firewall",
        rule,
        format!("rule added to firewall rules set ({})", params.rules_set_name),
    ))
}
