//! PidginHost Client
//!
//! Main client for interacting with the PidginHost cloud API, combining
//! token authentication and HTTP functionality.

use super::auth::ApiToken;
use super::error::ApiError;
use super::http::HttpClient;
use serde_json::Value;
use url::Url;

/// Production API base URL
pub const DEFAULT_BASE_URL: &str = "https://www.pidginhost.com";

/// Public address family, used to pick between the ipv4/ipv6 collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpFamily {
    V4,
    V6,
}

impl IpFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            IpFamily::V4 => "ipv4",
            IpFamily::V6 => "ipv6",
        }
    }
}

/// Main client for the provider API
#[derive(Clone)]
pub struct CloudClient {
    token: ApiToken,
    http: HttpClient,
    base_url: String,
}

impl CloudClient {
    /// Create a new client against a given base URL (no trailing slash).
    pub fn new(token: ApiToken, base_url: &str) -> Result<Self, ApiError> {
        let parsed = Url::parse(base_url)
            .map_err(|e| ApiError::Validation(format!("invalid API base URL {base_url}: {e}")))?;
        let base_url = parsed.as_str().trim_end_matches('/').to_string();

        Ok(Self {
            token,
            http: HttpClient::new()?,
            base_url,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Make a GET request to an API path
    pub async fn get(&self, path: &str) -> Result<Value, ApiError> {
        self.http
            .get(&self.url(path), &self.token.header_value())
            .await
    }

    /// Make a POST request to an API path
    pub async fn post(&self, path: &str, body: Option<&Value>) -> Result<Value, ApiError> {
        self.http
            .post(&self.url(path), &self.token.header_value(), body)
            .await
    }

    /// Make a PATCH request to an API path
    pub async fn patch(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        self.http
            .patch(&self.url(path), &self.token.header_value(), body)
            .await
    }

    /// Make a DELETE request to an API path
    pub async fn delete(&self, path: &str) -> Result<Value, ApiError> {
        self.http
            .delete(&self.url(path), &self.token.header_value())
            .await
    }

    // =========================================================================
    // Cloud server endpoints
    // =========================================================================

    pub fn servers_path(&self) -> String {
        "api/cloud/servers/".to_string()
    }

    pub fn server_path(&self, server_id: u64) -> String {
        format!("api/cloud/servers/{server_id}")
    }

    pub fn power_management_path(&self, server_id: u64) -> String {
        format!("api/cloud/servers/{server_id}/power-management/")
    }

    pub fn modify_package_path(&self, server_id: u64) -> String {
        format!("api/cloud/servers/{server_id}/modify-package/")
    }

    pub fn server_volumes_path(&self, server_id: u64) -> String {
        format!("api/cloud/servers/{server_id}/volumes/")
    }

    pub fn public_interface_path(&self, server_id: u64) -> String {
        format!("api/cloud/servers/{server_id}/public-interface/")
    }

    pub fn attach_ip_path(&self, server_id: u64, family: IpFamily) -> String {
        format!("api/cloud/servers/{server_id}/attach-{}/", family.as_str())
    }

    // =========================================================================
    // Volume endpoints
    // =========================================================================

    pub fn volumes_path(&self) -> String {
        "api/cloud/volumes/".to_string()
    }

    pub fn volume_path(&self, volume_id: u64) -> String {
        format!("api/cloud/volumes/{volume_id}")
    }

    pub fn volume_attach_path(&self, volume_id: u64) -> String {
        format!("api/cloud/volumes/{volume_id}/attach/")
    }

    pub fn volume_detach_path(&self, volume_id: u64) -> String {
        format!("api/cloud/volumes/{volume_id}/detach/")
    }

    pub fn storage_products_path(&self) -> String {
        "api/cloud/storage-products/".to_string()
    }

    // =========================================================================
    // Address endpoints
    // =========================================================================

    pub fn ips_path(&self, family: IpFamily) -> String {
        format!("api/cloud/{}/", family.as_str())
    }

    pub fn ip_detach_path(&self, family: IpFamily, ip_id: u64) -> String {
        format!("api/cloud/{}/{ip_id}/detach/", family.as_str())
    }

    // =========================================================================
    // Account and catalog endpoints
    // =========================================================================

    pub fn ssh_keys_path(&self) -> String {
        "api/account/ssh-keys/".to_string()
    }

    pub fn ssh_key_path(&self, key_id: u64) -> String {
        format!("api/account/ssh-keys/{key_id}")
    }

    pub fn profile_path(&self) -> String {
        "api/account/profile".to_string()
    }

    pub fn packages_path(&self) -> String {
        "api/cloud/server-packages/".to_string()
    }

    pub fn images_path(&self) -> String {
        "api/cloud/images".to_string()
    }

    // =========================================================================
    // Firewall endpoints
    // =========================================================================

    pub fn firewall_sets_path(&self) -> String {
        "api/cloud/firewall-rules-set/".to_string()
    }

    pub fn firewall_set_path(&self, set_id: u64) -> String {
        format!("api/cloud/firewall-rules-set/{set_id}")
    }

    pub fn firewall_rules_path(&self, set_id: u64) -> String {
        format!("api/cloud/firewall-rules-set/{set_id}/rules/")
    }
}
