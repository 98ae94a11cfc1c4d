//! Reconciler
//!
//! One state machine for every create/delete style module: given the
//! caller's disposition and the located current state, apply the minimal
//! action and report `{changed, resource, msg}`. Resource types plug in
//! through [`ResourceDriver`], so per-type modules stay configuration.

use super::locate::Located;
use crate::api::{ApiError, CloudClient};
use serde_json::Value;

/// Desired existence state for a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Present,
    Absent,
}

/// Outcome of one reconcile pass.
///
/// `changed == false` always means the resource (when returned) reflects
/// pre-call state untouched.
#[derive(Debug, Clone)]
pub struct ActionResult {
    pub changed: bool,
    pub resource: Option<Value>,
    pub msg: String,
}

impl ActionResult {
    pub fn changed(resource: Option<Value>, msg: impl Into<String>) -> Self {
        Self {
            changed: true,
            resource,
            msg: msg.into(),
        }
    }

    pub fn unchanged(resource: Option<Value>, msg: impl Into<String>) -> Self {
        Self {
            changed: false,
            resource,
            msg: msg.into(),
        }
    }
}

/// Per-resource-type behavior consumed by [`reconcile`].
///
/// `matches` decides whether a found resource already satisfies the
/// desired state; `update` is only invoked when `supports_update` says
/// the type has an in-place update verb.
pub trait ResourceDriver {
    /// Human-readable target description for messages
    fn describe(&self) -> String;

    /// Does the observed resource already satisfy the desired state?
    fn matches(&self, observed: &Value) -> bool;

    fn supports_update(&self) -> bool {
        false
    }

    fn create(
        &self,
        client: &CloudClient,
    ) -> impl std::future::Future<Output = Result<Value, ApiError>> + Send;

    fn update(
        &self,
        _client: &CloudClient,
        _observed: &Value,
    ) -> impl std::future::Future<Output = Result<Value, ApiError>> + Send {
        async {
            Err(ApiError::Validation(
                "in-place update not supported for this resource type".to_string(),
            ))
        }
    }

    fn delete(
        &self,
        client: &CloudClient,
        observed: &Value,
    ) -> impl std::future::Future<Output = Result<Value, ApiError>> + Send;
}

/// Drive observed state toward the desired disposition.
pub async fn reconcile<D: ResourceDriver>(
    client: &CloudClient,
    driver: &D,
    disposition: Disposition,
    located: Located,
) -> Result<ActionResult, ApiError> {
    match (disposition, located) {
        (Disposition::Present, Located::NotFound) => {
            let created = driver.create(client).await?;
            Ok(ActionResult::changed(
                Some(created),
                format!("{} has been created", driver.describe()),
            ))
        }
        (Disposition::Present, Located::Found(observed)) => {
            if driver.matches(&observed) {
                return Ok(ActionResult::unchanged(
                    Some(observed),
                    format!("{} already exists", driver.describe()),
                ));
            }
            if driver.supports_update() {
                let updated = driver.update(client, &observed).await?;
                return Ok(ActionResult::changed(
                    Some(updated),
                    format!("{} has been updated", driver.describe()),
                ));
            }
            Ok(ActionResult::unchanged(
                Some(observed),
                format!(
                    "{} exists but differs from the requested state; no in-place update is available",
                    driver.describe()
                ),
            ))
        }
        (Disposition::Absent, Located::Found(observed)) => {
            let remainder = driver.delete(client, &observed).await?;
            let resource = if remainder.is_null() {
                Some(observed)
            } else {
                Some(remainder)
            };
            Ok(ActionResult::changed(
                resource,
                format!("{} has been deleted", driver.describe()),
            ))
        }
        (Disposition::Absent, Located::NotFound) => Ok(ActionResult::unchanged(
            None,
            format!("{} not found, nothing to do", driver.describe()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiToken;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubDriver {
        satisfied: bool,
        creates: AtomicUsize,
        deletes: AtomicUsize,
    }

    impl StubDriver {
        fn new(satisfied: bool) -> Self {
            Self {
                satisfied,
                creates: AtomicUsize::new(0),
                deletes: AtomicUsize::new(0),
            }
        }
    }

    impl ResourceDriver for StubDriver {
        fn describe(&self) -> String {
            "Stub (s1)".to_string()
        }

        fn matches(&self, _observed: &Value) -> bool {
            self.satisfied
        }

        async fn create(&self, _client: &CloudClient) -> Result<Value, ApiError> {
            self.creates.fetch_add(1, Ordering::SeqCst);
            Ok(json!({"id": 1}))
        }

        async fn delete(&self, _client: &CloudClient, _observed: &Value) -> Result<Value, ApiError> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Null)
        }
    }

    fn client() -> CloudClient {
        CloudClient::new(ApiToken::resolve(Some("t")).unwrap(), "http://localhost:1").unwrap()
    }

    #[tokio::test]
    async fn present_missing_creates() {
        let driver = StubDriver::new(false);
        let result = reconcile(&client(), &driver, Disposition::Present, Located::NotFound)
            .await
            .unwrap();
        assert!(result.changed);
        assert_eq!(driver.creates.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn present_satisfied_is_a_noop() {
        let driver = StubDriver::new(true);
        let observed = json!({"id": 1, "hostname": "s1"});
        let result = reconcile(
            &client(),
            &driver,
            Disposition::Present,
            Located::Found(observed.clone()),
        )
        .await
        .unwrap();
        assert!(!result.changed);
        assert_eq!(result.resource, Some(observed));
        assert_eq!(driver.creates.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn present_differs_without_update_verb_is_unchanged() {
        let driver = StubDriver::new(false);
        let result = reconcile(
            &client(),
            &driver,
            Disposition::Present,
            Located::Found(json!({"id": 1})),
        )
        .await
        .unwrap();
        assert!(!result.changed);
        assert!(result.msg.contains("no in-place update"));
    }

    #[tokio::test]
    async fn absent_found_deletes() {
        let driver = StubDriver::new(false);
        let result = reconcile(
            &client(),
            &driver,
            Disposition::Absent,
            Located::Found(json!({"id": 1})),
        )
        .await
        .unwrap();
        assert!(result.changed);
        assert_eq!(driver.deletes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn absent_missing_issues_no_delete() {
        let driver = StubDriver::new(false);
        let result = reconcile(&client(), &driver, Disposition::Absent, Located::NotFound)
            .await
            .unwrap();
        assert!(!result.changed);
        assert_eq!(driver.deletes.load(Ordering::SeqCst), 0);
        assert!(result.resource.is_none());
    }
}
