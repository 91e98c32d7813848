pub mod table {
    fn border(widths: &[usize]) -> String {
        let cols: Vec<String> = widths.iter().map(|w| "-".repeat(w + 2)).collect();
        format!("+{}+", cols.join("+"))
    }

    fn row(cells: &[&str], widths: &[usize]) -> String {
        let cols: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(i, &w)| format!(" {:<w$} ", cells.get(i).copied().unwrap_or("")))
            .collect();
        format!("|{}|", cols.join("|"))
    }

    /// Render an ASCII table; short rows are padded with empty cells.
    #[must_use]
    pub fn render(headers: &[&str], rows: &[Vec<String>]) -> String {
        let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
        for r in rows {
            for (w, cell) in widths.iter_mut().zip(r) {
                *w = (*w).max(cell.chars().count());
            }
        }
        let mut lines = vec![border(&widths), row(headers, &widths), border(&widths)];
        for r in rows {
            let cells: Vec<&str> = r.iter().map(String::as_str).collect();
            lines.push(row(&cells, &widths));
        }
        lines.push(border(&widths));
        lines.join("\n")
    }
}

pub mod config {
    use serde::Deserialize;
    use std::fs;
    use std::path::{Path, PathBuf};

    pub const CONFIG_FILE_NAME: &str = "infragraph.toml";

    #[derive(Debug, Clone, Deserialize, Default)]
    pub struct GraphConfig {
        pub path: Option<PathBuf>,
    }

    #[derive(Debug, Clone, Deserialize, Default)]
    pub struct KeysConfig {
        pub dir: Option<PathBuf>,
    }

    #[derive(Debug, Clone, Deserialize, Default)]
    pub struct SshConfig {
        pub user: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize, Default)]
    pub struct StatsConfig {
        pub enabled: Option<bool>,
        pub path: Option<PathBuf>,
    }

    #[derive(Debug, Clone, Deserialize, Default)]
    pub struct OutputConfig {
        pub default_format: Option<String>, // "text" | "json"
    }

    #[derive(Debug, Clone, Deserialize, Default)]
    pub struct Config {
        pub graph: Option<GraphConfig>,
        pub keys: Option<KeysConfig>,
        pub ssh: Option<SshConfig>,
        pub stats: Option<StatsConfig>,
        pub output: Option<OutputConfig>,
    }

    impl Config {
        #[must_use]
        pub fn graph_path(&self) -> Option<&Path> {
            self.graph.as_ref().and_then(|g| g.path.as_deref())
        }

        #[must_use]
        pub fn keys_dir(&self) -> Option<&Path> {
            self.keys.as_ref().and_then(|k| k.dir.as_deref())
        }

        #[must_use]
        pub fn ssh_user(&self) -> Option<&str> {
            self.ssh.as_ref().and_then(|s| s.user.as_deref()).filter(|u| !u.is_empty())
        }

        #[must_use]
        pub fn stats_enabled(&self) -> bool {
            self.stats.as_ref().and_then(|s| s.enabled).unwrap_or(true)
        }

        #[must_use]
        pub fn stats_path(&self) -> Option<&Path> {
            self.stats.as_ref().and_then(|s| s.path.as_deref())
        }

        #[must_use]
        pub fn default_format(&self) -> Option<&str> {
            self.output.as_ref().and_then(|o| o.default_format.as_deref())
        }
    }

    /// Parse a config file; `None` when it is missing or not valid TOML.
    #[must_use]
    pub fn load_config_at(path: &Path) -> Option<Config> {
        let data = fs::read_to_string(path).ok()?;
        match toml::from_str::<Config>(&data) {
            Ok(cfg) => Some(cfg),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring invalid config");
                None
            }
        }
    }

    /// Look for `infragraph.toml` in `dir`.
    #[must_use]
    pub fn load_config_near(dir: &Path) -> Option<Config> {
        let p = dir.join(CONFIG_FILE_NAME);
        if p.exists() {
            load_config_at(&p)
        } else {
            None
        }
    }
}

pub mod paths {
    use std::env;
    use std::path::PathBuf;

    /// Overrides the base directory for all default locations.
    pub const HOME_ENV: &str = "INFRAGRAPH_HOME";

    /// Base directory: `$INFRAGRAPH_HOME`, else `~/.infragraph`, else `./.infragraph`.
    #[must_use]
    pub fn base_dir() -> PathBuf {
        if let Some(dir) = env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            return PathBuf::from(dir);
        }
        dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".infragraph")
    }

    #[must_use]
    pub fn keys_dir() -> PathBuf {
        base_dir().join("keys")
    }

    #[must_use]
    pub fn graph_file() -> PathBuf {
        base_dir().join("graph.json")
    }

    #[must_use]
    pub fn stats_db() -> PathBuf {
        base_dir().join("stats.db")
    }
}
