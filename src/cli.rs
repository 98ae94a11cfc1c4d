//! Command-line surface
//!
//! One subcommand per module, each printing the module's JSON result on
//! stdout. Global flags carry the token, base URL and log level.

use crate::api::CloudClient;
use crate::inventory;
use crate::modules::{
    firewall, firewall_action, info, ip_action, power, public_ip, resize, server, ssh_key, volume,
    volume_action,
};
use crate::output::ModuleOutput;
use crate::resource::Disposition;
use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use std::path::PathBuf;
use tracing::Level;

/// PidginHost cloud management
#[derive(Parser, Debug)]
#[command(name = "phcloud", version = crate::VERSION, about, long_about = None)]
pub struct Cli {
    /// API token (falls back to PIDGINHOST_ACCESS_TOKEN / PIDGINHOST_TOKEN)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// API base URL override
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Log level for debugging
    #[arg(long, global = true, value_enum, default_value = "off")]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum State {
    Present,
    Absent,
}

impl From<State> for Disposition {
    fn from(state: State) -> Self {
        match state {
            State::Present => Disposition::Present,
            State::Absent => Disposition::Absent,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum AttachState {
    Attached,
    Detached,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PowerCommand {
    Start,
    Stop,
    Shutdown,
    Reboot,
}

impl From<PowerCommand> for power::PowerAction {
    fn from(cmd: PowerCommand) -> Self {
        match cmd {
            PowerCommand::Start => power::PowerAction::Start,
            PowerCommand::Stop => power::PowerAction::Stop,
            PowerCommand::Shutdown => power::PowerAction::Shutdown,
            PowerCommand::Reboot => power::PowerAction::Reboot,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum InfoTarget {
    Servers,
    Volumes,
    Images,
    Packages,
    Profile,
    Ips,
    SshKeys,
    Firewalls,
    VolumesProducts,
    PublicInterface,
}

impl From<InfoTarget> for info::InfoKind {
    fn from(target: InfoTarget) -> Self {
        match target {
            InfoTarget::Servers => info::InfoKind::Servers,
            InfoTarget::Volumes => info::InfoKind::Volumes,
            InfoTarget::Images => info::InfoKind::Images,
            InfoTarget::Packages => info::InfoKind::Packages,
            InfoTarget::Profile => info::InfoKind::Profile,
            InfoTarget::Ips => info::InfoKind::Ips,
            InfoTarget::SshKeys => info::InfoKind::SshKeys,
            InfoTarget::Firewalls => info::InfoKind::Firewalls,
            InfoTarget::VolumesProducts => info::InfoKind::VolumesProducts,
            InfoTarget::PublicInterface => info::InfoKind::PublicInterface,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage cloud servers
    Server {
        #[arg(long, value_enum, default_value = "present")]
        state: State,
        #[arg(long)]
        server_id: Option<u64>,
        #[arg(long)]
        hostname: Option<String>,
        /// Treat the hostname as unique across the account
        #[arg(long)]
        unique_hostname: bool,
        #[arg(long)]
        image: Option<String>,
        #[arg(long)]
        package: Option<String>,
        #[arg(long)]
        project: Option<String>,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        ssh_pub_key: Option<String>,
        #[arg(long)]
        ssh_pub_key_id: Option<String>,
        #[arg(long)]
        public_ip: Option<String>,
        #[arg(long)]
        new_ipv4: Option<bool>,
        #[arg(long)]
        public_ipv6: Option<String>,
        #[arg(long)]
        new_ipv6: Option<bool>,
        #[arg(long)]
        fw_rules_set: Option<String>,
        #[arg(long)]
        fw_policy_in: Option<String>,
        #[arg(long)]
        fw_policy_out: Option<String>,
        #[arg(long)]
        private_network: Option<String>,
        #[arg(long)]
        private_address: Option<String>,
        #[arg(long)]
        extra_volume_product: Option<String>,
        #[arg(long)]
        extra_volume_size: Option<u64>,
        #[arg(long)]
        no_network_acknowledged: Option<bool>,
    },
    /// Manage detached volumes
    Volume {
        #[arg(long, value_enum, default_value = "present")]
        state: State,
        #[arg(long)]
        alias: Option<String>,
        #[arg(long)]
        project: Option<String>,
        #[arg(long)]
        size_gigabytes: Option<u64>,
        #[arg(long)]
        product: Option<String>,
        #[arg(long)]
        server_hostname: Option<String>,
    },
    /// Manage account SSH keys
    SshKey {
        #[arg(long, value_enum, default_value = "present")]
        state: State,
        /// Public key material, repeatable
        #[arg(long = "key", required = true)]
        keys: Vec<String>,
        /// Treat the listed keys as the full desired set
        #[arg(long)]
        delete_others: bool,
    },
    /// Manage firewall rules sets and rules
    Firewall {
        #[arg(long, value_enum, default_value = "present")]
        state: State,
        #[arg(long)]
        rules_set_name: String,
        /// Ensure the set exists instead of appending a rule
        #[arg(long)]
        create_rules_set: bool,
        #[arg(long)]
        direction: Option<String>,
        #[arg(long)]
        action: Option<String>,
        #[arg(long)]
        protocol: Option<String>,
        #[arg(long)]
        source: Option<String>,
        #[arg(long)]
        sport: Option<String>,
        #[arg(long)]
        destination: Option<String>,
        #[arg(long)]
        dport: Option<String>,
        #[arg(long)]
        enabled: Option<bool>,
        #[arg(long)]
        position: Option<String>,
    },
    /// Apply a firewall rules set to a server's public interface
    FirewallAction {
        #[arg(long)]
        server_hostname: String,
        #[arg(long)]
        rules_set_name: String,
        #[arg(long)]
        policy_in: Option<String>,
        #[arg(long)]
        policy_out: Option<String>,
    },
    /// Attach or detach a public address
    IpAction {
        #[arg(long, value_enum)]
        state: AttachState,
        #[arg(long)]
        ip_address: String,
        #[arg(long)]
        server_id: Option<u64>,
        #[arg(long)]
        server_hostname: Option<String>,
    },
    /// Attach or detach a volume
    VolumeAction {
        #[arg(long, value_enum)]
        state: AttachState,
        #[arg(long)]
        volume_alias: String,
        #[arg(long)]
        server_hostname: String,
    },
    /// Send a power state transition
    Power {
        #[arg(value_enum)]
        action: PowerCommand,
        #[arg(long)]
        server_id: Option<u64>,
        #[arg(long)]
        server_hostname: Option<String>,
        /// After a shutdown, follow up with a hard stop
        #[arg(long)]
        force_power_off: bool,
    },
    /// Grow a volume or upgrade the server package
    Resize {
        #[arg(long)]
        server_id: Option<u64>,
        #[arg(long)]
        server_hostname: Option<String>,
        /// Resize a volume instead of upgrading the package
        #[arg(long)]
        disk: bool,
        #[arg(long)]
        volume_alias: Option<String>,
        #[arg(long)]
        product: Option<String>,
        #[arg(long)]
        size_gigabytes: Option<u64>,
        #[arg(long)]
        project: Option<String>,
        #[arg(long)]
        package_name: Option<String>,
    },
    /// Look up a server's public IPv4 address
    PublicIp {
        #[arg(long)]
        server_hostname: String,
    },
    /// Read-only collection queries
    Info {
        #[arg(value_enum)]
        target: InfoTarget,
        #[arg(long)]
        server_id: Option<u64>,
    },
    /// Build an Ansible inventory catalog from a source file
    Inventory {
        /// Inventory source YAML
        #[arg(long)]
        source: PathBuf,
    },
}

/// Route a parsed command to its module.
pub async fn dispatch(client: &CloudClient, command: Command) -> Result<Value> {
    let output: ModuleOutput = match command {
        Command::Server {
            state,
            server_id,
            hostname,
            unique_hostname,
            image,
            package,
            project,
            password,
            ssh_pub_key,
            ssh_pub_key_id,
            public_ip,
            new_ipv4,
            public_ipv6,
            new_ipv6,
            fw_rules_set,
            fw_policy_in,
            fw_policy_out,
            private_network,
            private_address,
            extra_volume_product,
            extra_volume_size,
            no_network_acknowledged,
        } => {
            let params = server::ServerParams {
                server_id,
                hostname,
                unique_hostname,
                image,
                package,
                project,
                password,
                ssh_pub_key,
                ssh_pub_key_id,
                public_ip,
                new_ipv4,
                public_ipv6,
                new_ipv6,
                fw_rules_set,
                fw_policy_in,
                fw_policy_out,
                private_network,
                private_address,
                extra_volume_product,
                extra_volume_size,
                no_network_acknowledged,
            };
            server::run(client, state.into(), params).await?
        }
        Command::Volume {
            state,
            alias,
            project,
            size_gigabytes,
            product,
            server_hostname,
        } => {
            let params = volume::VolumeParams {
                alias,
                project,
                size_gigabytes,
                product,
                server_hostname,
            };
            volume::run(client, state.into(), params).await?
        }
        Command::SshKey {
            state,
            keys,
            delete_others,
        } => {
            let params = ssh_key::SshKeyParams { keys, delete_others };
            ssh_key::run(client, state.into(), params).await?
        }
        Command::Firewall {
            state,
            rules_set_name,
            create_rules_set,
            direction,
            action,
            protocol,
            source,
            sport,
            destination,
            dport,
            enabled,
            position,
        } => {
            let params = firewall::FirewallParams {
                rules_set_name,
                create_rules_set,
                rule: firewall::FirewallRule {
                    direction,
                    action,
                    protocol,
                    source,
                    sport,
                    destination,
                    dport,
                    enabled,
                    position,
                },
            };
            firewall::run(client, state.into(), params).await?
        }
        Command::FirewallAction {
            server_hostname,
            rules_set_name,
            policy_in,
            policy_out,
        } => {
            let params = firewall_action::FirewallActionParams {
                server_hostname,
                rules_set_name,
                policy_in,
                policy_out,
            };
            firewall_action::run(client, params).await?
        }
        Command::IpAction {
            state,
            ip_address,
            server_id,
            server_hostname,
        } => {
            let params = ip_action::IpActionParams {
                ip_address,
                server_id,
                server_hostname,
            };
            match state {
                AttachState::Attached => ip_action::attach(client, params).await?,
                AttachState::Detached => ip_action::detach_address(client, params).await?,
            }
        }
        Command::VolumeAction {
            state,
            volume_alias,
            server_hostname,
        } => {
            let params = volume_action::VolumeActionParams {
                volume_alias,
                server_hostname,
            };
            match state {
                AttachState::Attached => volume_action::attach(client, params).await?,
                AttachState::Detached => volume_action::detach(client, params).await?,
            }
        }
        Command::Power {
            action,
            server_id,
            server_hostname,
            force_power_off,
        } => {
            let params = power::PowerParams {
                server_id,
                server_hostname,
                force_power_off,
            };
            power::run(client, action.into(), params).await?
        }
        Command::Resize {
            server_id,
            server_hostname,
            disk,
            volume_alias,
            product,
            size_gigabytes,
            project,
            package_name,
        } => {
            let params = resize::ResizeParams {
                server_id,
                server_hostname,
                disk,
                volume_alias,
                product,
                size_gigabytes,
                project,
                package_name,
            };
            resize::run(client, params).await?
        }
        Command::PublicIp { server_hostname } => public_ip::run(client, &server_hostname).await?,
        Command::Info { target, server_id } => info::run(client, target.into(), server_id).await?,
        Command::Inventory { source } => {
            let source = inventory::InventorySource::load(&source)?;
            return inventory::build(client, &source).await;
        }
    };
    Ok(output.to_json())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_server_create() {
        let cli = Cli::try_parse_from([
            "phcloud",
            "server",
            "--hostname",
            "web1",
            "--image",
            "ubuntu22",
            "--package",
            "cloudv-3",
            "--password",
            "hunter2hunter2",
        ])
        .unwrap();
        match cli.command {
            Command::Server {
                state, hostname, ..
            } => {
                assert_eq!(state, State::Present);
                assert_eq!(hostname.as_deref(), Some("web1"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn power_takes_a_positional_action() {
        let cli = Cli::try_parse_from(["phcloud", "power", "reboot", "--server-id", "7"]).unwrap();
        match cli.command {
            Command::Power {
                action, server_id, ..
            } => {
                assert!(matches!(action, PowerCommand::Reboot));
                assert_eq!(server_id, Some(7));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn ssh_key_requires_at_least_one_key() {
        assert!(Cli::try_parse_from(["phcloud", "ssh-key"]).is_err());
    }
}
