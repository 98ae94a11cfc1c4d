//! PidginHost cloud client, modules and inventory pipeline.

pub mod api;
pub mod cli;
pub mod config;
pub mod inventory;
pub mod modules;
pub mod output;
pub mod resource;

/// Version injected at compile time via PHCLOUD_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("PHCLOUD_VERSION") {
    Some(v) => v,
    None => "dev",
};
