//! Token resolution
//!
//! The provider authenticates every call with a static account token sent
//! as `Authorization: Token <value>`. An explicit `--token` flag wins over
//! the environment; the environment is the documented path so tokens stay
//! out of version-controlled files.

use super::error::ApiError;
use std::fmt;

/// Environment variables consulted for the API token, in order.
pub const TOKEN_ENV_VARS: &[&str] = &["PIDGINHOST_ACCESS_TOKEN", "PIDGINHOST_TOKEN"];

/// Account token, injected once at client construction.
///
/// Wrapped so the raw value never shows up in `Debug` output or logs.
#[derive(Clone)]
pub struct ApiToken(String);

impl ApiToken {
    /// Resolve the token: explicit value first, then the environment.
    pub fn resolve(explicit: Option<&str>) -> Result<Self, ApiError> {
        Self::resolve_with(explicit, |var| std::env::var(var).ok())
    }

    /// Resolution itself, with the environment lookup passed in so it
    /// stays testable without mutating process-wide state.
    fn resolve_with(
        explicit: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ApiError> {
        if let Some(token) = explicit {
            if !token.is_empty() {
                return Ok(Self(token.to_string()));
            }
        }

        for var in TOKEN_ENV_VARS {
            if let Some(value) = env(var) {
                if !value.is_empty() {
                    return Ok(Self(value));
                }
            }
        }

        Err(ApiError::Auth(format!(
            "no API token given; pass --token or set one of {}",
            TOKEN_ENV_VARS.join(", ")
        )))
    }

    /// Value for the `Authorization` header.
    pub fn header_value(&self) -> String {
        format!("Token {}", self.0)
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiToken(***)")
    }
}
