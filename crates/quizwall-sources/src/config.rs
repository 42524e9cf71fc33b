//! Deployment configuration and pool source factory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use quizwall_core::progress::ENGINE_VERSION;
use quizwall_core::settings::{ModuleOverrides, ModuleSettings};
use quizwall_core::store::{default_storage_key, StoreIdentity};
use quizwall_core::traits::PoolSource;

use crate::dir::DirPoolSource;
use crate::http::HttpPoolSource;

/// Where question pools are read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PoolConfig {
    Dir {
        #[serde(default = "default_pool_dir")]
        path: PathBuf,
    },
    Http {
        base_url: String,
    },
}

fn default_pool_dir() -> PathBuf {
    PathBuf::from("./pools")
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig::Dir {
            path: default_pool_dir(),
        }
    }
}

/// Top-level quizwall configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizwallConfig {
    /// Course identifier stamped into the progress store and exports.
    #[serde(default = "default_course")]
    pub course: String,
    /// Version written into new progress stores.
    #[serde(default = "default_version")]
    pub version: String,
    /// Storage key override (default `<COURSE>_PROGRESS_V1`).
    #[serde(default)]
    pub storage_key: Option<String>,
    /// Directory holding the progress store.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Ordered module ids that make up the course.
    #[serde(default = "default_modules")]
    pub modules: Vec<String>,
    #[serde(default)]
    pub pool: PoolConfig,
    /// Settings applied to every module.
    #[serde(default)]
    pub defaults: ModuleSettings,
    /// Per-module partial overrides, keyed by module id.
    #[serde(default)]
    pub modules_overrides: BTreeMap<String, ModuleOverrides>,
}

fn default_course() -> String {
    "quizwall".to_string()
}
fn default_version() -> String {
    ENGINE_VERSION.to_string()
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("./quizwall-data")
}
fn default_modules() -> Vec<String> {
    (1..=10).map(|i| format!("{i:02}")).collect()
}

impl Default for QuizwallConfig {
    fn default() -> Self {
        Self {
            course: default_course(),
            version: default_version(),
            storage_key: None,
            data_dir: default_data_dir(),
            modules: default_modules(),
            pool: PoolConfig::default(),
            defaults: ModuleSettings::default(),
            modules_overrides: BTreeMap::new(),
        }
    }
}

impl QuizwallConfig {
    /// Effective settings for `module_id`: defaults plus its overrides.
    pub fn settings_for(&self, module_id: &str) -> ModuleSettings {
        match self.modules_overrides.get(module_id) {
            Some(overrides) => self.defaults.merged(overrides),
            None => self.defaults.clone(),
        }
    }

    pub fn storage_key(&self) -> String {
        self.storage_key
            .clone()
            .unwrap_or_else(|| default_storage_key(&self.course))
    }

    pub fn identity(&self) -> StoreIdentity {
        StoreIdentity {
            course: self.course.clone(),
            version: self.version.clone(),
            storage_key: self.storage_key(),
        }
    }

    pub fn is_known_module(&self, module_id: &str) -> bool {
        self.modules.iter().any(|m| m == module_id)
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

fn resolve_path(path: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy()))
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `quizwall.toml` in the current directory
/// 2. `~/.config/quizwall/config.toml`
///
/// Environment variable overrides: `QUIZWALL_DATA_DIR`, `QUIZWALL_POOL_URL`.
pub fn load_config() -> Result<QuizwallConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<QuizwallConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("quizwall.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            if global.exists() {
                Some(global)
            } else {
                None
            }
        } else {
            None
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = toml::from_str::<QuizwallConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded config");
            config
        }
        None => QuizwallConfig::default(),
    };

    // Apply env var overrides
    if let Ok(dir) = std::env::var("QUIZWALL_DATA_DIR") {
        config.data_dir = PathBuf::from(dir);
    }
    if let Ok(url) = std::env::var("QUIZWALL_POOL_URL") {
        config.pool = PoolConfig::Http { base_url: url };
    }

    resolve_config(&mut config);
    validate_config(&config)?;
    Ok(config)
}

fn resolve_config(config: &mut QuizwallConfig) {
    config.course = resolve_env_vars(&config.course);
    config.storage_key = config.storage_key.as_deref().map(resolve_env_vars);
    config.data_dir = resolve_path(&config.data_dir);
    config.pool = match &config.pool {
        PoolConfig::Dir { path } => PoolConfig::Dir {
            path: resolve_path(path),
        },
        PoolConfig::Http { base_url } => PoolConfig::Http {
            base_url: resolve_env_vars(base_url),
        },
    };
}

fn validate_config(config: &QuizwallConfig) -> Result<()> {
    if config.course.trim().is_empty() {
        anyhow::bail!("config: course must not be empty");
    }
    if config.modules.is_empty() {
        anyhow::bail!("config: modules must list at least one module id");
    }
    for id in config.modules_overrides.keys() {
        if !config.is_known_module(id) {
            tracing::warn!("config: override for unknown module {id}");
        }
    }
    let check = |label: &str, settings: &ModuleSettings| -> Result<()> {
        if settings.mastery_pct > 100 {
            anyhow::bail!("config: {label} mastery_pct must be at most 100");
        }
        if settings.attempt_limit == 0 {
            anyhow::bail!("config: {label} attempt_limit must be at least 1");
        }
        Ok(())
    };
    check("defaults", &config.defaults)?;
    for id in config.modules_overrides.keys() {
        check(&format!("module {id}"), &config.settings_for(id))?;
    }
    Ok(())
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("quizwall"))
}

/// Create a pool source from its configuration.
pub fn create_pool_source(config: &PoolConfig) -> Result<Box<dyn PoolSource>> {
    match config {
        PoolConfig::Dir { path } => Ok(Box::new(DirPoolSource::new(path))),
        PoolConfig::Http { base_url } => {
            let source = HttpPoolSource::new(base_url)
                .with_context(|| format!("failed to create HTTP pool source for {base_url}"))?;
            Ok(Box::new(source))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_QUIZWALL_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_QUIZWALL_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_QUIZWALL_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        assert_eq!(resolve_env_vars("${_QUIZWALL_UNSET_VAR}x"), "x");
        assert_eq!(resolve_env_vars("${unterminated"), "${unterminated");
        std::env::remove_var("_QUIZWALL_TEST_VAR");
    }

    #[test]
    fn default_config() {
        let config = QuizwallConfig::default();
        assert_eq!(config.course, "quizwall");
        assert_eq!(config.modules.len(), 10);
        assert_eq!(config.modules[0], "01");
        assert_eq!(config.modules[9], "10");
        assert_eq!(config.storage_key(), "QUIZWALL_PROGRESS_V1");
        assert_eq!(
            config.pool,
            PoolConfig::Dir {
                path: "./pools".into(),
            }
        );
        assert_eq!(config.settings_for("01"), ModuleSettings::default());
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
course = "8G103"
storage_key = "CUSTOM_KEY"
data_dir = "/tmp/progress"
modules = ["01", "02", "03"]

[pool]
type = "http"
base_url = "https://example.org/pools"

[defaults]
attempt_limit = 5
mastery_pct = 70
time_limit_seconds = 600

[modules_overrides.02]
pick_count = 5
mastery_pct = 90
"#;
        let config: QuizwallConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.modules, ["01", "02", "03"]);
        assert_eq!(config.storage_key(), "CUSTOM_KEY");
        match &config.pool {
            PoolConfig::Http { base_url } => assert_eq!(base_url, "https://example.org/pools"),
            other => panic!("expected an http pool, got {other:?}"),
        }

        let m1 = config.settings_for("01");
        assert_eq!(m1.attempt_limit, 5);
        assert_eq!(m1.mastery_pct, 70);
        assert_eq!(m1.pick_count, None);

        let m2 = config.settings_for("02");
        assert_eq!(m2.attempt_limit, 5);
        assert_eq!(m2.mastery_pct, 90);
        assert_eq!(m2.pick_count, Some(5));
        assert_eq!(m2.time_limit_seconds, 600);

        let id = config.identity();
        assert_eq!(id.course, "8G103");
        assert_eq!(id.storage_key, "CUSTOM_KEY");
    }

    #[test]
    fn load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quizwall.toml");
        std::fs::write(
            &path,
            "course = \"NET101\"\n\n[pool]\ntype = \"dir\"\npath = \"${_QUIZWALL_POOL_ROOT}/pools\"\n",
        )
        .unwrap();
        std::env::set_var("_QUIZWALL_POOL_ROOT", "/srv/course");

        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.course, "NET101");
        assert_eq!(config.storage_key(), "NET101_PROGRESS_V1");
        assert_eq!(
            config.pool,
            PoolConfig::Dir {
                path: "/srv/course/pools".into()
            }
        );
        std::env::remove_var("_QUIZWALL_POOL_ROOT");
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let err = load_config_from(Some(Path::new("/definitely/not/quizwall.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn rejects_bad_settings() {
        let mut config = QuizwallConfig::default();
        config.defaults.mastery_pct = 120;
        assert!(validate_config(&config).is_err());

        let mut config = QuizwallConfig::default();
        config.modules_overrides.insert(
            "03".into(),
            ModuleOverrides {
                attempt_limit: Some(0),
                ..ModuleOverrides::default()
            },
        );
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("module 03"));

        let config = QuizwallConfig {
            modules: Vec::new(),
            ..QuizwallConfig::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[tokio::test]
    async fn creates_configured_source() {
        let dir = create_pool_source(&PoolConfig::default()).unwrap();
        assert_eq!(dir.name(), "dir");
        let http = create_pool_source(&PoolConfig::Http {
            base_url: "http://localhost:8080".into(),
        })
        .unwrap();
        assert_eq!(http.name(), "http");
    }
}
