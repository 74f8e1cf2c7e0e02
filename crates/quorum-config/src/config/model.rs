use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Names of the services quorum knows how to call
pub const SERVICE_NAMES: [&str; 5] = ["perplexity", "grok", "gemini", "claude", "openai"];

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 5;
pub const DEFAULT_CONFLICT_THRESHOLD: f64 = 0.20;

/// Whether `name` is one of [`SERVICE_NAMES`]
#[must_use]
pub fn is_known_service(name: &str) -> bool {
    SERVICE_NAMES.contains(&name)
}

/// Where a configuration value came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Cli,
    ConfigFile(PathBuf),
    Defaults,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cli => write!(f, "cli"),
            Self::ConfigFile(path) => write!(f, "config file ({})", path.display()),
            Self::Defaults => write!(f, "defaults"),
        }
    }
}

/// `[defaults]` section as it appears in TOML (every field optional)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FileDefaults {
    pub output_dir: Option<PathBuf>,
    pub prompts_dir: Option<PathBuf>,
    pub max_attempts: Option<u32>,
    pub retry_delay_secs: Option<u64>,
    pub conflict_threshold: Option<f64>,
    pub gates_enabled: Option<bool>,
}

/// Effective run-wide settings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Defaults {
    pub output_dir: PathBuf,
    pub prompts_dir: PathBuf,
    pub max_attempts: u32,
    pub retry_delay_secs: u64,
    pub conflict_threshold: f64,
    pub gates_enabled: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            prompts_dir: PathBuf::from("prompts"),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay_secs: DEFAULT_RETRY_DELAY_SECS,
            conflict_threshold: DEFAULT_CONFLICT_THRESHOLD,
            gates_enabled: true,
        }
    }
}

/// `[services.<name>]` section
///
/// Unset fields fall back to the service's built-in profile.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Credential given directly (takes precedence over `api_key_env`)
    pub api_key: Option<String>,
    /// Environment variable holding the credential
    pub api_key_env: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub max_attempts: Option<u32>,
    pub retry_delay_secs: Option<u64>,
}

/// `[[phases]]` entry
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PhaseConfig {
    pub name: String,
    pub tasks: Vec<String>,
    /// Task name → service name
    pub services: BTreeMap<String, String>,
    #[serde(default = "default_gate_required")]
    pub gate_required: bool,
    #[serde(default = "default_parallel_limit")]
    pub parallel_limit: usize,
    #[serde(default = "default_task_timeout_secs")]
    pub task_timeout_secs: u64,
}

fn default_gate_required() -> bool {
    true
}

fn default_parallel_limit() -> usize {
    2
}

fn default_task_timeout_secs() -> u64 {
    600
}

/// TOML configuration file structure
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TomlConfig {
    pub defaults: Option<FileDefaults>,
    #[serde(default)]
    pub services: BTreeMap<String, ServiceConfig>,
    #[serde(default)]
    pub phases: Vec<PhaseConfig>,
    #[serde(default)]
    pub context: BTreeMap<String, String>,
}

/// Fully resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub defaults: Defaults,
    pub services: BTreeMap<String, ServiceConfig>,
    /// Extra or replacement phase descriptors, in file order
    pub phases: Vec<PhaseConfig>,
    /// Values merged into every prompt-rendering context
    pub context: BTreeMap<String, String>,
    /// File the configuration was loaded from, if any
    pub config_file: Option<PathBuf>,
    pub source_attribution: BTreeMap<String, ConfigSource>,
}

impl Default for Config {
    fn default() -> Self {
        let source_attribution = Self::DEFAULT_KEYS
            .iter()
            .map(|k| ((*k).to_string(), ConfigSource::Defaults))
            .collect();
        Self {
            defaults: Defaults::default(),
            services: BTreeMap::new(),
            phases: Vec::new(),
            context: BTreeMap::new(),
            config_file: None,
            source_attribution,
        }
    }
}

impl Config {
    pub(crate) const DEFAULT_KEYS: [&'static str; 6] = [
        "output_dir",
        "prompts_dir",
        "max_attempts",
        "retry_delay_secs",
        "conflict_threshold",
        "gates_enabled",
    ];

    /// Settings for `service`, empty when the file does not mention it
    #[must_use]
    pub fn service(&self, service: &str) -> ServiceConfig {
        self.services.get(service).cloned().unwrap_or_default()
    }

    /// Effective `[defaults]` values with their sources, in key order
    #[must_use]
    pub fn effective_defaults(&self) -> Vec<(String, String, String)> {
        let d = &self.defaults;
        let values = [
            ("output_dir", d.output_dir.display().to_string()),
            ("prompts_dir", d.prompts_dir.display().to_string()),
            ("max_attempts", d.max_attempts.to_string()),
            ("retry_delay_secs", d.retry_delay_secs.to_string()),
            ("conflict_threshold", d.conflict_threshold.to_string()),
            ("gates_enabled", d.gates_enabled.to_string()),
        ];
        values
            .into_iter()
            .map(|(key, value)| {
                let source = self
                    .source_attribution
                    .get(key)
                    .map_or_else(|| "defaults".to_string(), ToString::to_string);
                (key.to_string(), value, source)
            })
            .collect()
    }
}
