use std::{fs, path::Path, path::PathBuf};

use anyhow::{Context, Result};
use folio_provider::BackendConfig;
use folio_schema::PortfolioProfile;
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "folio.yaml";

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_session_ttl_secs() -> u64 {
    1800
}

fn default_max_sessions() -> usize {
    1000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Idle sessions older than this are dropped by the server sweep.
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
    /// Upper bound on live sessions; creation is refused once reached and
    /// no idle session can be swept.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            session_ttl_secs: default_session_ttl_secs(),
            max_sessions: default_max_sessions(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FolioConfig {
    #[serde(default)]
    pub generation: BackendConfig,
    #[serde(default)]
    pub profile_path: Option<PathBuf>,
    #[serde(default)]
    pub greeting: Option<String>,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Loads `<config_dir>/folio.yaml`. A missing file yields the defaults.
pub fn load_config(config_dir: &Path) -> Result<FolioConfig> {
    let path = config_dir.join(CONFIG_FILE);
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(FolioConfig::default());
    }
    let mut config: FolioConfig = read_yaml_file(&path)?;
    config.generation.base_url = resolve_env_var(&config.generation.base_url);
    config.generation.model = resolve_env_var(&config.generation.model);
    Ok(config)
}

/// The profile named by `profile_path`, resolved against `config_root`, or
/// the embedded one when unset.
pub fn load_profile(config: &FolioConfig, config_root: &Path) -> Result<PortfolioProfile> {
    match &config.profile_path {
        Some(path) if path.is_absolute() => PortfolioProfile::load(path),
        Some(path) => PortfolioProfile::load(&config_root.join(path)),
        None => PortfolioProfile::shipped().context("embedded profile is invalid"),
    }
}

/// Replaces `${VAR}` placeholders with environment values; unset vars become empty.
pub fn resolve_env_var(raw: &str) -> String {
    let mut output = String::new();
    let mut rest = raw;

    while let Some(start) = rest.find("${") {
        output.push_str(&rest[..start]);
        let candidate = &rest[start + 2..];
        let Some(end) = candidate.find('}') else {
            output.push_str(&rest[start..]);
            return output;
        };
        output.push_str(&std::env::var(&candidate[..end]).unwrap_or_default());
        rest = &candidate[end + 1..];
    }

    output.push_str(rest);
    output
}

fn read_yaml_file<T>(path: &Path) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("failed to parse yaml file: {}", path.display()))
}
