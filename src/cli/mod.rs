use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::graph::ResourceType;

#[derive(Debug, Parser)]
#[command(
    name = "infragraph",
    version,
    about = "Cloud inventory graph tool",
    long_about = "Query a local inventory of cloud resources stored as a graph of typed nodes and relations. Resolves SSH credentials for instances from their address and linked key pair."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
    /// Suppress non-essential output
    #[arg(short, long, global = true, default_value_t = false)]
    pub quiet: bool,
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
    /// Path to a TOML configuration file
    #[arg(long, global = true, env = "INFRAGRAPH_CONFIG")]
    pub config: Option<PathBuf>,
    /// Inventory graph JSON file
    #[arg(long, global = true, env = "INFRAGRAPH_GRAPH")]
    pub graph: Option<PathBuf>,
    /// Usage statistics database file
    #[arg(long, global = true, env = "INFRAGRAPH_STATS_DB")]
    pub stats_db: Option<PathBuf>,
    /// Do not record usage statistics for this run
    #[arg(long, global = true, default_value_t = false)]
    pub no_stats: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ResourceTypeArg {
    Instance,
    KeyPair,
    Vpc,
    Subnet,
    SecurityGroup,
}

impl From<ResourceTypeArg> for ResourceType {
    fn from(arg: ResourceTypeArg) -> Self {
        match arg {
            ResourceTypeArg::Instance => ResourceType::Instance,
            ResourceTypeArg::KeyPair => ResourceType::KeyPair,
            ResourceTypeArg::Vpc => ResourceType::Vpc,
            ResourceTypeArg::Subnet => ResourceType::Subnet,
            ResourceTypeArg::SecurityGroup => ResourceType::SecurityGroup,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Resolve SSH credentials for an instance and print the connection command
    Ssh {
        /// Instance id (exact match)
        instance: String,
        /// Private key file to use instead of the one derived from the instance's key pair
        #[arg(short, long, value_name = "PATH")]
        identity: Option<String>,
        /// Login user
        #[arg(short, long)]
        user: Option<String>,
        /// Directory holding key files named after their key pair
        #[arg(long, value_name = "DIR")]
        keys_dir: Option<PathBuf>,
        /// Output format (defaults to config, then text)
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },
    /// List resources in the inventory
    List {
        /// Only resources of this type
        #[arg(long = "type", value_enum)]
        resource_type: Option<ResourceTypeArg>,
        /// Only instances using this key pair (id or name)
        #[arg(long, value_name = "KEY_PAIR", conflicts_with = "resource_type")]
        key_pair: Option<String>,
        /// Output format (defaults to config, then text)
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },
    /// Show local usage statistics
    Stats {
        /// Output format (defaults to config, then text)
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}
