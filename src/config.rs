//! Configuration for usecase-gen.
//!
//! Configuration sources (highest priority first):
//! 1. CLI flags (--output-dir)
//! 2. Environment variables (USECASE_GEN_HOME)
//! 3. Config file (.usecase-gen/config.yaml)
//! 4. Defaults (~/.usecase-gen/jobs)
//!
//! Config file discovery:
//! - Searches current directory and parents for .usecase-gen/config.yaml
//! - `output_dir` in the config file is relative to the project root
//!   (the directory containing .usecase-gen/)
//!
//! Credentials are never read from the config file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::retry::RetryPolicy;
use crate::error::GenerationError;

const CONFIG_DIR: &str = ".usecase-gen";
const HOME_ENV: &str = "USECASE_GEN_HOME";
pub const OPENAI_KEY_ENV: &str = "OPENAI_API_KEY";
pub const PERPLEXITY_KEY_ENV: &str = "PERPLEXITY_API_KEY";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub version: Option<String>,
    /// Jobs root directory (relative to the project root)
    #[serde(default)]
    pub output_dir: Option<String>,
    #[serde(flatten)]
    pub settings: Settings,
}

/// Tunables shared by every job
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub models: ModelSettings,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub research: ResearchSettings,
    #[serde(default)]
    pub http: HttpSettings,
}

/// Model identifier used by each stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub questions: String,
    pub research: String,
    pub citations: String,
    pub refine: String,
    pub polish: String,
    pub solution: String,
    pub visuals: String,
}

impl Default for ModelSettings {
    fn default() -> Self {
        let reasoning = "o3-mini-2025-01-31".to_string();
        Self {
            questions: reasoning.clone(),
            research: "sonar-pro".to_string(),
            citations: reasoning.clone(),
            refine: reasoning.clone(),
            polish: "gpt-4o".to_string(),
            solution: reasoning,
            visuals: "gpt-4o".to_string(),
        }
    }
}

/// Retry policy per provider
///
/// Fields left out of the config file keep that provider's own defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RetrySettingsFile")]
pub struct RetrySettings {
    pub openai: RetryPolicy,
    pub perplexity: RetryPolicy,
}

/// `retry:` block as written in config.yaml
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RetrySettingsFile {
    openai: RetryOverrides,
    perplexity: RetryOverrides,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RetryOverrides {
    max_attempts: Option<u32>,
    initial_delay_ms: Option<u64>,
    max_delay_ms: Option<u64>,
    backoff_multiplier: Option<f64>,
}

impl RetryOverrides {
    fn apply(self, base: RetryPolicy) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.unwrap_or(base.max_attempts),
            initial_delay_ms: self.initial_delay_ms.unwrap_or(base.initial_delay_ms),
            max_delay_ms: self.max_delay_ms.unwrap_or(base.max_delay_ms),
            backoff_multiplier: self.backoff_multiplier.unwrap_or(base.backoff_multiplier),
        }
    }
}

impl From<RetrySettingsFile> for RetrySettings {
    fn from(file: RetrySettingsFile) -> Self {
        Self {
            openai: file.openai.apply(RetryPolicy::openai()),
            perplexity: file.perplexity.apply(RetryPolicy::perplexity()),
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            openai: RetryPolicy::openai(),
            perplexity: RetryPolicy::perplexity(),
        }
    }
}

/// How Stage 2 issues its research requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResearchMode {
    /// One request carrying every question
    Consolidated,
    /// One concurrent request per question
    PerQuestion,
}

impl Default for ResearchMode {
    fn default() -> Self {
        Self::Consolidated
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchSettings {
    pub mode: ResearchMode,
    pub title_timeout_seconds: u64,
}

impl Default for ResearchSettings {
    fn default() -> Self {
        Self {
            mode: ResearchMode::default(),
            title_timeout_seconds: 5,
        }
    }
}

impl ResearchSettings {
    pub fn title_timeout(&self) -> Duration {
        Duration::from_secs(self.title_timeout_seconds)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub request_timeout_seconds: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            request_timeout_seconds: 300,
        }
    }
}

impl HttpSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    /// Directory holding one subdirectory per job
    pub jobs_root: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    #[serde(flatten)]
    pub settings: Settings,
}

impl ResolvedConfig {
    /// Load configuration from all sources, searching upward from the current directory
    pub fn load(output_dir: Option<PathBuf>) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to determine current directory")?;
        let env_home = std::env::var(HOME_ENV).ok().map(PathBuf::from);

        Self::resolve(find_config_file(&cwd), env_home, output_dir)
    }

    /// Combine the discovered config file, env override and CLI override
    pub fn resolve(
        config_file: Option<PathBuf>,
        env_home: Option<PathBuf>,
        output_dir: Option<PathBuf>,
    ) -> Result<Self> {
        let file = match config_file {
            Some(ref path) => load_config_file(path)?,
            None => ConfigFile::default(),
        };

        let jobs_root = if let Some(dir) = output_dir {
            dir
        } else if let Some(home) = env_home {
            home
        } else if let (Some(path), Some(dir)) = (&config_file, &file.output_dir) {
            // Project root is the parent of .usecase-gen/
            let base_dir = path
                .parent()
                .and_then(|p| p.parent())
                .unwrap_or(Path::new("."));
            resolve_path(base_dir, dir)
        } else {
            default_jobs_root()?
        };

        Ok(Self {
            jobs_root,
            config_file,
            settings: file.settings,
        })
    }
}

/// Default jobs root (~/.usecase-gen/jobs)
pub fn default_jobs_root() -> Result<PathBuf> {
    Ok(dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(CONFIG_DIR)
        .join("jobs"))
}

/// Find config file by searching `start` and its parents
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_DIR).join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
pub fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the project root
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

/// Provider credentials, read from the process environment
#[derive(Clone)]
pub struct Credentials {
    pub openai_api_key: String,
    pub perplexity_api_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials").finish_non_exhaustive()
    }
}

impl Credentials {
    pub fn from_env() -> Result<Self, GenerationError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve credentials through `lookup`, reporting every missing variable at once
    pub fn from_lookup<F>(lookup: F) -> Result<Self, GenerationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let openai = read(OPENAI_KEY_ENV);
        let perplexity = read(PERPLEXITY_KEY_ENV);

        match (openai, perplexity) {
            (Some(openai_api_key), Some(perplexity_api_key)) => Ok(Self {
                openai_api_key,
                perplexity_api_key,
            }),
            (openai, perplexity) => {
                let mut missing = Vec::new();
                if openai.is_none() {
                    missing.push(OPENAI_KEY_ENV);
                }
                if perplexity.is_none() {
                    missing.push(PERPLEXITY_KEY_ENV);
                }
                Err(GenerationError::MissingCredential(missing.join(", ")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_config(root: &Path, body: &str) -> PathBuf {
        let dir = root.join(CONFIG_DIR);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "{}", body).unwrap();
        path
    }

    #[test]
    fn test_defaults_without_file() {
        let config = ResolvedConfig::resolve(None, None, None).unwrap();

        assert_eq!(config.jobs_root, default_jobs_root().unwrap());
        assert!(config.config_file.is_none());
        assert_eq!(config.settings.models.research, "sonar-pro");
        assert_eq!(config.settings.retry.openai.max_attempts, 3);
        assert_eq!(config.settings.retry.perplexity.max_attempts, 5);
        assert_eq!(config.settings.research.mode, ResearchMode::Consolidated);
        assert_eq!(config.settings.research.title_timeout_seconds, 5);
    }

    #[test]
    fn test_config_file_parsing_and_discovery() {
        let temp = TempDir::new().unwrap();
        let path = write_config(
            temp.path(),
            r#"
version: "1.0"
output_dir: generated
models:
  polish: gpt-4.1
research:
  mode: per_question
retry:
  perplexity:
    max_attempts: 2
"#,
        );

        let nested = temp.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        assert_eq!(find_config_file(&nested), Some(path.clone()));

        let config = ResolvedConfig::resolve(Some(path), None, None).unwrap();
        assert_eq!(config.jobs_root, temp.path().join("generated"));
        assert_eq!(config.settings.models.polish, "gpt-4.1");
        // Unset fields keep their defaults
        assert_eq!(config.settings.models.research, "sonar-pro");
        assert_eq!(config.settings.research.mode, ResearchMode::PerQuestion);
        assert_eq!(config.settings.retry.perplexity.max_attempts, 2);
        assert_eq!(config.settings.retry.perplexity.initial_delay_ms, 2000);
        assert_eq!(config.settings.retry.perplexity.max_delay_ms, 15000);
        assert_eq!(config.settings.retry.openai, RetryPolicy::openai());
    }

    #[test]
    fn test_partial_retry_block_keeps_provider_defaults() {
        let file: ConfigFile = serde_yaml::from_str(
            r#"
retry:
  openai:
    max_delay_ms: 4000
  perplexity:
    max_attempts: 7
"#,
        )
        .unwrap();

        let perplexity = file.settings.retry.perplexity;
        assert_eq!(perplexity.max_attempts, 7);
        assert_eq!(perplexity.initial_delay_ms, 2000);
        assert_eq!(perplexity.max_delay_ms, 15000);
        assert_eq!(perplexity.backoff_multiplier, 2.0);

        let openai = file.settings.retry.openai;
        assert_eq!(openai.max_attempts, 3);
        assert_eq!(openai.initial_delay_ms, 1000);
        assert_eq!(openai.max_delay_ms, 4000);
    }

    #[test]
    fn test_override_priority() {
        let temp = TempDir::new().unwrap();
        let path = write_config(temp.path(), "output_dir: from-file");

        let env = ResolvedConfig::resolve(Some(path.clone()), Some(PathBuf::from("/env")), None)
            .unwrap();
        assert_eq!(env.jobs_root, PathBuf::from("/env"));

        let cli = ResolvedConfig::resolve(
            Some(path),
            Some(PathBuf::from("/env")),
            Some(PathBuf::from("/cli")),
        )
        .unwrap();
        assert_eq!(cli.jobs_root, PathBuf::from("/cli"));
    }

    #[test]
    fn test_credentials_report_every_missing_variable() {
        let err = Credentials::from_lookup(|_| None).unwrap_err();
        let message = err.to_string();
        assert!(message.contains(OPENAI_KEY_ENV));
        assert!(message.contains(PERPLEXITY_KEY_ENV));

        let err = Credentials::from_lookup(|name| {
            (name == OPENAI_KEY_ENV).then(|| "sk-test".to_string())
        })
        .unwrap_err();
        assert!(!err.to_string().contains(OPENAI_KEY_ENV));
        assert!(err.to_string().contains(PERPLEXITY_KEY_ENV));

        let creds = Credentials::from_lookup(|_| Some("key".to_string())).unwrap();
        assert_eq!(creds.openai_api_key, "key");
    }
}
