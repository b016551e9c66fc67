//! Configuration file management for termplan.
//!
//! Provides a TOML-based config file at `~/.config/termplan/config.toml` and
//! a resolution chain: CLI flag > env var > config file > default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use termplan_core::{DeleteTermPolicy, EvalOptions, MissingCoursePolicy};
use termplan_core::store::StoreOptions;

/// Plan file used when nothing else names one.
pub const DEFAULT_PLAN_PATH: &str = "plan.toml";

pub const PLAN_ENV: &str = "TERMPLAN_PLAN";
pub const CATALOG_ENV: &str = "TERMPLAN_CATALOG";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub catalog: CatalogSection,
    #[serde(default)]
    pub plan: PlanSection,
    #[serde(default)]
    pub evaluation: EvaluationSection,
    #[serde(default)]
    pub terms: TermsSection,
    #[serde(default)]
    pub lookup: LookupSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CatalogSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PlanSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct EvaluationSection {
    #[serde(default)]
    pub missing_courses: MissingCoursePolicy,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TermsSection {
    #[serde(default)]
    pub delete: DeleteTermPolicy,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LookupSection {
    /// Minimum spacing between catalog fetches. Zero disables the limiter.
    #[serde(default)]
    pub min_interval_ms: u64,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the termplan config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/termplan` or
/// `~/.config/termplan`, never the platform-specific `dirs::config_dir()`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("termplan");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("termplan")
}

/// Return the path to the termplan config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    load_config_from(&config_path())
}

pub fn load_config_from(path: &Path) -> Result<ConfigFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let path = config_path();
    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;
    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermplanConfig {
    pub plan_path: PathBuf,
    pub catalog_path: Option<PathBuf>,
    pub missing_courses: MissingCoursePolicy,
    pub delete_policy: DeleteTermPolicy,
    pub lookup_interval: Option<Duration>,
}

impl TermplanConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - Plan: `cli_plan` > `TERMPLAN_PLAN` > `[plan] path` > `plan.toml`
    /// - Catalog: `cli_catalog` > `TERMPLAN_CATALOG` > `[catalog] path` > none
    ///
    /// A missing config file is not an error; a malformed one is.
    pub fn resolve(cli_plan: Option<&Path>, cli_catalog: Option<&Path>) -> Result<Self> {
        let file = if config_path().exists() {
            load_config()?
        } else {
            ConfigFile::default()
        };
        Ok(Self::from_file(file, cli_plan, cli_catalog))
    }

    fn from_file(file: ConfigFile, cli_plan: Option<&Path>, cli_catalog: Option<&Path>) -> Self {
        let plan_path = cli_plan
            .map(Path::to_path_buf)
            .or_else(|| env_path(PLAN_ENV))
            .or(file.plan.path)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PLAN_PATH));

        let catalog_path = cli_catalog
            .map(Path::to_path_buf)
            .or_else(|| env_path(CATALOG_ENV))
            .or(file.catalog.path);

        let lookup_interval = match file.lookup.min_interval_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        };

        Self {
            plan_path,
            catalog_path,
            missing_courses: file.evaluation.missing_courses,
            delete_policy: file.terms.delete,
            lookup_interval,
        }
    }

    pub fn eval_options(&self) -> EvalOptions {
        EvalOptions {
            missing_courses: self.missing_courses,
        }
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            delete_policy: self.delete_policy,
        }
    }
}

fn env_path(var: &str) -> Option<PathBuf> {
    std::env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
