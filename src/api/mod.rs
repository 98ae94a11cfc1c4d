//! PidginHost API interaction module
//!
//! Core functionality for talking to the provider REST API: token
//! resolution, the HTTP wrapper, the typed error taxonomy, and the
//! authenticated client with its endpoint helpers.
//!
//! # Module Structure
//!
//! - [`auth`] - API token resolution (flag first, then environment)
//! - [`client`] - Authenticated client and endpoint path helpers
//! - [`error`] - Typed `ApiError` taxonomy
//! - [`http`] - HTTP utilities for REST calls

pub mod auth;
pub mod client;
pub mod error;
pub mod http;

pub use auth::ApiToken;
pub use client::{CloudClient, IpFamily, DEFAULT_BASE_URL};
pub use error::ApiError;
