use crate::cli::{Cli, Commands, OutputFormat};
use crate::credentials::{CredentialResolver, Credentials};
use crate::errors::{CredentialsErrorKind, StatsError};
use crate::graph::{props, Node, ResourceGraph};
use crate::query::{KeyPairUsersQuery, Query, ResourcesQuery};
use crate::stats::{self, StatsDb};
use crate::utils::config::{self, Config};
use crate::utils::{paths, table};
use clap::CommandFactory;
use clap_complete::generate;
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Install the stderr log subscriber. `RUST_LOG` wins over the CLI verbosity.
pub fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).try_init();
}

/// Run the CLI logic in-process.
///
/// Returns an exit code (0 = success).
#[must_use]
pub fn run_cli(cli: Cli) -> i32 {
    let cfg = load_config(cli.config.as_deref());
    if !matches!(cli.command, Commands::Completions { .. }) && !cli.no_stats && cfg.stats_enabled()
    {
        record_run(&stats_path(&cli, &cfg));
    }

    match &cli.command {
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let mut out = io::stdout();
            generate(*shell, &mut cmd, env!("CARGO_PKG_NAME"), &mut out);
            0
        }
        Commands::Ssh { instance, identity, user, keys_dir, format } => {
            let Some(graph) = load_graph(&graph_path(&cli, &cfg)) else {
                return 1;
            };
            let keys_dir = keys_dir
                .clone()
                .or_else(|| cfg.keys_dir().map(Path::to_path_buf))
                .unwrap_or_else(paths::keys_dir);
            let resolver = CredentialResolver::new(keys_dir);
            let key_override = identity.as_deref().unwrap_or_default();
            let creds = match resolver.resolve(&graph, instance, key_override) {
                Ok(c) => c,
                Err(e) => {
                    eprintln!("Cannot resolve credentials: {e}");
                    if e.kind() == CredentialsErrorKind::AmbiguousKey {
                        eprintln!("Provide the private key explicitly with --identity <PATH>.");
                    }
                    return 1;
                }
            };
            let creds = match user.as_deref().or_else(|| cfg.ssh_user()) {
                Some(u) => creds.with_user(u),
                None => creds,
            };
            tracing::debug!(
                instance = %instance,
                keys_dir = %resolver.keys_dir().display(),
                key = %creds.key_path().display(),
                "resolved credentials"
            );
            print_credentials(&creds, output_format(*format, &cfg), cli.quiet)
        }
        Commands::List { resource_type, key_pair, format } => {
            let Some(graph) = load_graph(&graph_path(&cli, &cfg)) else {
                return 1;
            };
            let nodes = match key_pair {
                Some(kp) => KeyPairUsersQuery::new(kp.as_str()).run(&graph),
                None => ResourcesQuery::new(resource_type.map(Into::into)).run(&graph),
            };
            print_nodes(&nodes, output_format(*format, &cfg))
        }
        Commands::Stats { format } => {
            let path = stats_path(&cli, &cfg);
            let db = match StatsDb::open(&path) {
                Ok(db) => db,
                Err(e) => {
                    eprintln!("Open stats database failed {}: {e}", path.display());
                    return 1;
                }
            };
            print_stats(&db, output_format(*format, &cfg))
        }
    }
}

fn load_config(explicit: Option<&Path>) -> Config {
    let Some(path) = explicit else {
        return config::load_config_near(&paths::base_dir()).unwrap_or_default();
    };
    config::load_config_at(path).unwrap_or_else(|| {
        tracing::warn!(path = %path.display(), "config not loaded, using defaults");
        Config::default()
    })
}

fn graph_path(cli: &Cli, cfg: &Config) -> PathBuf {
    cli.graph
        .clone()
        .or_else(|| cfg.graph_path().map(Path::to_path_buf))
        .unwrap_or_else(paths::graph_file)
}

fn stats_path(cli: &Cli, cfg: &Config) -> PathBuf {
    cli.stats_db
        .clone()
        .or_else(|| cfg.stats_path().map(Path::to_path_buf))
        .unwrap_or_else(paths::stats_db)
}

fn output_format(flag: Option<OutputFormat>, cfg: &Config) -> OutputFormat {
    flag.unwrap_or(match cfg.default_format() {
        Some("json") => OutputFormat::Json,
        _ => OutputFormat::Text,
    })
}

fn load_graph(path: &Path) -> Option<ResourceGraph> {
    match ResourceGraph::load_json(path) {
        Ok(g) => Some(g),
        Err(e) => {
            eprintln!("Load graph failed: {e}");
            None
        }
    }
}

// Statistics are best effort: a failure here never fails the command.
fn record_run(path: &Path) {
    let result = StatsDb::open(path).and_then(|db| {
        db.record_command(chrono::Utc::now())?;
        db.close()
    });
    if let Err(e) = result {
        tracing::debug!(path = %path.display(), error = %e, "could not record usage statistics");
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(s) => {
            println!("{s}");
            0
        }
        Err(e) => {
            eprintln!("JSON encode error: {e}");
            1
        }
    }
}

fn print_credentials(creds: &Credentials, fmt: OutputFormat, quiet: bool) -> i32 {
    if fmt == OutputFormat::Json {
        #[derive(Serialize)]
        struct Row<'a> {
            #[serde(flatten)]
            credentials: &'a Credentials,
            command: String,
        }
        return print_json(&Row { credentials: creds, command: creds.ssh_command() });
    }
    if !quiet {
        let user = if creds.user().is_empty() { "<default>" } else { creds.user() };
        let rows = vec![
            vec!["Address".to_string(), creds.address().to_string()],
            vec!["User".to_string(), user.to_string()],
            vec!["Key".to_string(), creds.key_path().display().to_string()],
        ];
        println!("{}", table::render(&["Field", "Value"], &rows));
    }
    println!("{}", creds.ssh_command());
    0
}

fn print_nodes(nodes: &[Node], fmt: OutputFormat) -> i32 {
    if fmt == OutputFormat::Json {
        return print_json(nodes);
    }
    if nodes.is_empty() {
        println!("<no resources>");
        return 0;
    }
    let rows: Vec<Vec<String>> = nodes
        .iter()
        .map(|n| {
            let address = n.property(props::PUBLIC_IP).or_else(|| n.property(props::PRIVATE_IP));
            vec![
                n.id.clone(),
                n.resource_type.to_string(),
                n.property(props::NAME).unwrap_or("").to_string(),
                address.unwrap_or("").to_string(),
            ]
        })
        .collect();
    println!("{}", table::render(&["Id", "Type", "Name", "Address"], &rows));
    0
}

#[derive(Serialize)]
struct StatsSummary {
    install_id: String,
    command_count: i64,
    last_command_at: Option<chrono::DateTime<chrono::Utc>>,
}

fn summarize(db: &StatsDb) -> Result<StatsSummary, StatsError> {
    Ok(StatsSummary {
        install_id: db.install_id()?,
        command_count: db.get_int_value(stats::COMMAND_COUNT_KEY)?,
        last_command_at: db.get_time_value(stats::LAST_COMMAND_AT_KEY)?,
    })
}

fn print_stats(db: &StatsDb, fmt: OutputFormat) -> i32 {
    let summary = match summarize(db) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Read stats failed: {e}");
            return 1;
        }
    };
    if fmt == OutputFormat::Json {
        return print_json(&summary);
    }
    let last = summary.last_command_at.map_or_else(|| "<never>".to_string(), |t| t.to_rfc3339());
    let rows = vec![
        vec!["Install id".to_string(), summary.install_id],
        vec!["Commands".to_string(), summary.command_count.to_string()],
        vec!["Last command".to_string(), last],
    ];
    println!("{}", table::render(&["Stat", "Value"], &rows));
    0
}
