use infragraph::app::run_cli;
use infragraph::cli::{Cli, Commands, OutputFormat, ResourceTypeArg};
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/testdata/infra.json")
}

fn cli(command: Commands, stats_db: &Path) -> Cli {
    Cli {
        command,
        quiet: true,
        verbose: 0,
        config: None,
        graph: Some(fixture()),
        stats_db: Some(stats_db.to_path_buf()),
        no_stats: false,
    }
}

fn ssh(instance: &str, identity: Option<&str>) -> Commands {
    Commands::Ssh {
        instance: instance.to_string(),
        identity: identity.map(str::to_string),
        user: None,
        keys_dir: Some(PathBuf::from("/keys")),
        format: Some(OutputFormat::Text),
    }
}

#[test]
fn app_ssh_exit_codes_follow_resolution() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("stats.db");
    assert_eq!(run_cli(cli(ssh("inst_1", None), &db)), 0);
    assert_eq!(run_cli(cli(ssh("inst_1", Some("/path/toward/myinst.key")), &db)), 0);
    assert_eq!(run_cli(cli(ssh("inst_2", Some("/path/toward/inst2.key")), &db)), 0);
    assert_eq!(run_cli(cli(ssh("inst_12", None), &db)), 1);
    assert_eq!(run_cli(cli(ssh("inst_3", None), &db)), 1);
    assert_eq!(run_cli(cli(ssh("inst_2", None), &db)), 1);
}

#[test]
fn app_list_json_branch() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("stats.db");
    let command = Commands::List {
        resource_type: Some(ResourceTypeArg::Instance),
        key_pair: None,
        format: Some(OutputFormat::Json),
    };
    assert_eq!(run_cli(cli(command, &db)), 0);
}

#[test]
fn app_records_stats_per_run() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("stats.db");
    assert_eq!(run_cli(cli(ssh("inst_1", None), &db)), 0);
    assert_eq!(run_cli(cli(ssh("inst_12", None), &db)), 1);
    let store = infragraph::stats::StatsDb::open(&db).unwrap();
    assert_eq!(store.get_int_value(infragraph::stats::COMMAND_COUNT_KEY).unwrap(), 2);
    assert!(store.get_time_value(infragraph::stats::LAST_COMMAND_AT_KEY).unwrap().is_some());
}

#[test]
fn app_unreadable_stats_db_does_not_fail_command() {
    let dir = tempdir().unwrap();
    // a directory cannot be opened as a database file
    let db = dir.path().to_path_buf();
    assert_eq!(run_cli(cli(ssh("inst_1", None), &db)), 0);
}

#[test]
fn app_missing_graph_is_an_error() {
    let dir = tempdir().unwrap();
    let mut c = cli(ssh("inst_1", None), &dir.path().join("stats.db"));
    c.graph = Some(dir.path().join("nope.json"));
    assert_eq!(run_cli(c), 1);
}
