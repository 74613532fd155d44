use crate::errors::{AppError, AppResult};
use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

static DEPARTMENT_CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{2}$").expect("valid regex"));

const DEFAULT_LOG_FILTER: &str = "info";
const DEFAULT_AUDIT_TIMEOUT_MS: u64 = 2_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditConfig {
    /// Absent means audit events are only logged.
    pub endpoint: Option<String>,
    #[serde(default = "default_audit_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_ms: DEFAULT_AUDIT_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentSeed {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConfig {
    pub database_path: PathBuf,
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub messages: BTreeMap<String, String>,
    #[serde(default)]
    pub departments: Vec<DepartmentSeed>,
}

impl ServiceConfig {
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: database_path.into(),
            log_dir: None,
            log_filter: default_log_filter(),
            audit: AuditConfig::default(),
            messages: BTreeMap::new(),
            departments: Vec::new(),
        }
    }

    /// Reads a YAML file, applies `PERSONNEL_*` environment overrides and validates the result.
    pub fn load(path: &Path) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))
            .map_err(|error| AppError::Config(format!("{:#}", error)))?;
        let mut config = Self::from_yaml(&raw)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> AppResult<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("PERSONNEL_DB_PATH").filter(|value| !value.trim().is_empty()) {
            self.database_path = PathBuf::from(path);
        }
        if let Some(dir) = lookup("PERSONNEL_LOG_DIR").filter(|value| !value.trim().is_empty()) {
            self.log_dir = Some(PathBuf::from(dir));
        }
        if let Some(filter) = lookup("PERSONNEL_LOG_FILTER").filter(|value| !value.trim().is_empty()) {
            self.log_filter = filter;
        }
        if let Some(endpoint) = lookup("PERSONNEL_AUDIT_ENDPOINT").filter(|value| !value.trim().is_empty()) {
            self.audit.endpoint = Some(endpoint);
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.database_path.as_os_str().is_empty() {
            return Err(AppError::Config("databasePath must not be empty".to_string()));
        }
        if self.audit.timeout_ms == 0 {
            return Err(AppError::Config("audit.timeoutMs must be greater than zero".to_string()));
        }
        if let Some(seed) = self
            .departments
            .iter()
            .find(|seed| !DEPARTMENT_CODE_RE.is_match(&seed.id))
        {
            return Err(AppError::Config(format!(
                "department id '{}' must be a two-digit code",
                seed.id
            )));
        }
        Ok(())
    }
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

fn default_audit_timeout_ms() -> u64 {
    DEFAULT_AUDIT_TIMEOUT_MS
}
