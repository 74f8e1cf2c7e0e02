use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

use quorum_utils::ConfigError;

use super::{CliArgs, Config, ConfigSource, TomlConfig};

const CONFIG_DIR: &str = ".quorum";
const CONFIG_FILE: &str = "config.toml";

impl Config {
    /// Discover and load configuration with precedence: CLI > file > defaults
    ///
    /// Uses the current working directory and `$QUORUM_HOME` for discovery.
    pub fn discover(cli_args: &CliArgs) -> Result<Self> {
        let start_dir = std::env::current_dir().context("Failed to get current directory")?;
        let quorum_home = std::env::var_os("QUORUM_HOME").map(PathBuf::from);
        Self::discover_from(&start_dir, quorum_home.as_deref(), cli_args)
    }

    /// Discover and load configuration from explicit locations
    ///
    /// Path-driven variant used by tests to avoid process-global state.
    pub fn discover_from(
        start_dir: &Path,
        quorum_home: Option<&Path>,
        cli_args: &CliArgs,
    ) -> Result<Self> {
        let config_path = match &cli_args.config_path {
            Some(explicit) => {
                if !explicit.is_file() {
                    return Err(ConfigError::NotFound(explicit.display().to_string()).into());
                }
                Some(explicit.clone())
            }
            None => Self::discover_config_file_from(start_dir, quorum_home),
        };

        let mut config = Self::default();

        if let Some(path) = &config_path {
            debug!(path = %path.display(), "Loading configuration file");
            let file_config = Self::load_config_file(path)
                .with_context(|| format!("Failed to load config file: {}", path.display()))?;
            config.apply_file(file_config, path);
        }

        config.apply_cli(cli_args);
        config.validate()?;

        Ok(config)
    }

    /// Locate a configuration file without an explicit path
    ///
    /// `$QUORUM_HOME/config.toml` first, then `.quorum/config.toml` in
    /// `start_dir` and each ancestor up to a repository root.
    #[must_use]
    pub fn discover_config_file_from(start_dir: &Path, quorum_home: Option<&Path>) -> Option<PathBuf> {
        if let Some(home) = quorum_home {
            let candidate = home.join(CONFIG_FILE);
            if candidate.is_file() {
                return Some(candidate);
            }
        }

        let mut current = Some(start_dir);
        while let Some(dir) = current {
            let candidate = dir.join(CONFIG_DIR).join(CONFIG_FILE);
            if candidate.is_file() {
                return Some(candidate);
            }
            if dir.join(".git").exists() || dir.join(".hg").exists() {
                break;
            }
            current = dir.parent();
        }

        None
    }

    fn load_config_file(path: &Path) -> Result<TomlConfig> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let parsed: TomlConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::InvalidFile(format!("{}: {e}", path.display())))?;
        Ok(parsed)
    }

    fn apply_file(&mut self, file: TomlConfig, path: &Path) {
        let source = ConfigSource::ConfigFile(path.to_path_buf());
        self.config_file = Some(path.to_path_buf());

        if let Some(d) = file.defaults {
            let mut mark = |key: &str| {
                self.source_attribution.insert(key.to_string(), source.clone());
            };
            if let Some(v) = d.output_dir {
                self.defaults.output_dir = v;
                mark("output_dir");
            }
            if let Some(v) = d.prompts_dir {
                self.defaults.prompts_dir = v;
                mark("prompts_dir");
            }
            if let Some(v) = d.max_attempts {
                self.defaults.max_attempts = v;
                mark("max_attempts");
            }
            if let Some(v) = d.retry_delay_secs {
                self.defaults.retry_delay_secs = v;
                mark("retry_delay_secs");
            }
            if let Some(v) = d.conflict_threshold {
                self.defaults.conflict_threshold = v;
                mark("conflict_threshold");
            }
            if let Some(v) = d.gates_enabled {
                self.defaults.gates_enabled = v;
                mark("gates_enabled");
            }
        }

        self.services = file.services;
        self.phases = file.phases;
        self.context = file.context;
    }

    fn apply_cli(&mut self, cli_args: &CliArgs) {
        if let Some(dir) = &cli_args.output_dir {
            self.defaults.output_dir = dir.clone();
            self.source_attribution
                .insert("output_dir".to_string(), ConfigSource::Cli);
        }
        if let Some(dir) = &cli_args.prompts_dir {
            self.defaults.prompts_dir = dir.clone();
            self.source_attribution
                .insert("prompts_dir".to_string(), ConfigSource::Cli);
        }
        if cli_args.disable_gates {
            self.defaults.gates_enabled = false;
            self.source_attribution
                .insert("gates_enabled".to_string(), ConfigSource::Cli);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ServiceConfig;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join(CONFIG_DIR).join(CONFIG_FILE);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_defaults_without_file() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();

        let config = Config::discover_from(dir.path(), None, &CliArgs::default()).unwrap();

        assert!(config.config_file.is_none());
        assert_eq!(config.defaults.max_attempts, 3);
        assert_eq!(config.defaults.retry_delay_secs, 5);
        assert!((config.defaults.conflict_threshold - 0.20).abs() < f64::EPSILON);
        assert!(config.defaults.gates_enabled);
        assert_eq!(
            config.source_attribution.get("max_attempts"),
            Some(&ConfigSource::Defaults)
        );
    }

    #[test]
    fn test_discovers_upward_until_repo_root() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        let path = write_config(dir.path(), "[defaults]\nmax_attempts = 5\n");
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        let config = Config::discover_from(&nested, None, &CliArgs::default()).unwrap();

        assert_eq!(config.config_file.as_deref(), Some(path.as_path()));
        assert_eq!(config.defaults.max_attempts, 5);
        assert_eq!(
            config.source_attribution.get("max_attempts"),
            Some(&ConfigSource::ConfigFile(path))
        );
    }

    #[test]
    fn test_quorum_home_wins_over_upward_search() {
        let project = TempDir::new().unwrap();
        fs::create_dir(project.path().join(".git")).unwrap();
        write_config(project.path(), "[defaults]\nmax_attempts = 5\n");

        let home = TempDir::new().unwrap();
        fs::write(home.path().join(CONFIG_FILE), "[defaults]\nmax_attempts = 7\n").unwrap();

        let config =
            Config::discover_from(project.path(), Some(home.path()), &CliArgs::default()).unwrap();
        assert_eq!(config.defaults.max_attempts, 7);
    }

    #[test]
    fn test_cli_overrides_file() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        write_config(
            dir.path(),
            "[defaults]\noutput_dir = \"from-file\"\ngates_enabled = true\n",
        );

        let cli = CliArgs {
            output_dir: Some(PathBuf::from("from-cli")),
            disable_gates: true,
            ..Default::default()
        };
        let config = Config::discover_from(dir.path(), None, &cli).unwrap();

        assert_eq!(config.defaults.output_dir, PathBuf::from("from-cli"));
        assert!(!config.defaults.gates_enabled);
        assert_eq!(
            config.source_attribution.get("output_dir"),
            Some(&ConfigSource::Cli)
        );
    }

    #[test]
    fn test_explicit_missing_path_is_error() {
        let dir = TempDir::new().unwrap();
        let cli = CliArgs {
            config_path: Some(dir.path().join("nope.toml")),
            ..Default::default()
        };

        let err = Config::discover_from(dir.path(), None, &cli).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::NotFound(_))
        ));
    }

    #[test]
    fn test_unknown_section_rejected() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        write_config(dir.path(), "[runner]\nmode = \"wsl\"\n");

        let err = Config::discover_from(dir.path(), None, &CliArgs::default()).unwrap_err();
        assert!(format!("{err:#}").contains("Invalid configuration file"));
    }

    #[test]
    fn test_services_phases_and_context_loaded() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        write_config(
            dir.path(),
            r#"
[services.claude]
api_key_env = "MY_CLAUDE_KEY"
model = "claude-sonnet-4-5"
temperature = 0.6

[[phases]]
name = "market_sizing"
tasks = ["tam_estimate"]
services = { tam_estimate = "perplexity" }
parallel_limit = 1

[context]
project = "Acme"
"#,
        );

        let config = Config::discover_from(dir.path(), None, &CliArgs::default()).unwrap();

        let claude = config.service("claude");
        assert_eq!(claude.api_key_env.as_deref(), Some("MY_CLAUDE_KEY"));
        assert_eq!(claude.model.as_deref(), Some("claude-sonnet-4-5"));
        assert_eq!(config.service("grok"), ServiceConfig::default());

        assert_eq!(config.phases.len(), 1);
        assert_eq!(config.phases[0].parallel_limit, 1);
        assert!(config.phases[0].gate_required);
        assert_eq!(config.phases[0].task_timeout_secs, 600);
        assert_eq!(config.context.get("project").map(String::as_str), Some("Acme"));
    }
}
