//! Project configuration: catalog entries, run parameters and project layout.
//!
//! A project keeps its configuration under `conf/<env>/`:
//!
//! ```text
//! conf/base/catalog.json      dataset id -> { "location": ..., "format": "csv" | "image" }
//! conf/base/parameters.json   parameter name -> JSON value
//! ```

use crate::catalog::CatalogEntry;
use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environment used when none is given on the command line.
pub const DEFAULT_ENV: &str = "base";

pub const CATALOG_FILE: &str = "catalog.json";
pub const PARAMETERS_FILE: &str = "parameters.json";

/// Locations of the configuration and log directories of a project.
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    pub root: PathBuf,
    pub env: String,
}

impl ProjectPaths {
    pub fn new(root: impl Into<PathBuf>, env: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            env: env.into(),
        }
    }

    pub fn conf_dir(&self) -> PathBuf {
        self.root.join("conf").join(&self.env)
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.conf_dir().join(CATALOG_FILE)
    }

    pub fn parameters_path(&self) -> PathBuf {
        self.conf_dir().join(PARAMETERS_FILE)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    /// Load the catalog configuration of this environment.
    pub fn load_catalog_config(&self) -> Result<CatalogConfig> {
        CatalogConfig::from_file(self.catalog_path())
    }

    /// Load parameters; a missing parameters file yields an empty set.
    pub fn load_parameters(&self) -> Result<Parameters> {
        let path = self.parameters_path();
        if !path.exists() {
            tracing::warn!("No parameters file at {}", path.display());
            return Ok(Parameters::default());
        }
        Parameters::from_file(path)
    }
}

/// Catalog configuration, one record per dataset identifier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogConfig {
    pub entries: BTreeMap<String, CatalogEntry>,
}

impl CatalogConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = read_config(path)?;
        Self::from_json(&content)
            .map_err(|e| PipelineError::Config(format!("{}: {e}", path.display())))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Externally supplied values consumed by nodes through `params:<name>` inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters(BTreeMap<String, serde_json::Value>);

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = read_config(path)?;
        Self::from_json(&content)
            .map_err(|e| PipelineError::Config(format!("{}: {e}", path.display())))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.0.insert(name.into(), value.into());
    }

    /// Builder-style [`Parameters::insert`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.0.get(name)
    }

    /// Rewrite the string parameter `name` as a path under `root` when it is
    /// relative. Absent or non-string parameters are left alone.
    pub fn resolve_path(&mut self, name: &str, root: &Path) {
        if let Some(serde_json::Value::String(value)) = self.0.get_mut(name)
            && Path::new(value.as_str()).is_relative()
        {
            *value = root.join(value.as_str()).to_string_lossy().into_owned();
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &serde_json::Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn read_config(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        PipelineError::Config(format!("Failed to read {}: {e}", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::DatasetFormat;

    #[test]
    fn test_catalog_config_parsing() {
        let json = r#"{
            "day_wise": { "location": "data/01_raw/day_wise.csv", "format": "csv" },
            "plot": { "location": "data/08_reporting/plot.png", "format": "image" },
            "legacy": { "location": "data/legacy.csv", "format": "tabular-delimited" }
        }"#;

        let config = CatalogConfig::from_json(json).expect("valid catalog");
        assert_eq!(config.entries.len(), 3);
        assert_eq!(config.entries["day_wise"].format, DatasetFormat::Csv);
        assert_eq!(config.entries["plot"].format, DatasetFormat::Image);
        assert_eq!(config.entries["legacy"].format, DatasetFormat::Csv);
    }

    #[test]
    fn test_catalog_config_rejects_unknown_format() {
        let json = r#"{ "x": { "location": "x.xlsx", "format": "excel" } }"#;
        let err = CatalogConfig::from_json(json).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn test_parameters_parsing() {
        let params =
            Parameters::from_json(r#"{ "dataset1_name": "country_wise_latest", "top_n": 10 }"#)
                .expect("valid parameters");

        assert_eq!(params.len(), 2);
        assert_eq!(
            params.get("dataset1_name").and_then(|v| v.as_str()),
            Some("country_wise_latest")
        );
        assert!(params.contains("top_n"));
        assert!(!params.contains("missing"));
    }

    #[test]
    fn test_project_paths() {
        let paths = ProjectPaths::new("/srv/covid", DEFAULT_ENV);
        assert_eq!(
            paths.catalog_path(),
            PathBuf::from("/srv/covid/conf/base/catalog.json")
        );
        assert_eq!(
            paths.parameters_path(),
            PathBuf::from("/srv/covid/conf/base/parameters.json")
        );
        assert_eq!(paths.log_dir(), PathBuf::from("/srv/covid/logs"));
    }

    #[test]
    fn test_missing_parameters_file_is_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let paths = ProjectPaths::new(dir.path(), DEFAULT_ENV);
        let params = paths.load_parameters().unwrap();
        assert!(params.is_empty());
    }

    #[test]
    fn test_resolve_path_only_touches_relative_strings() {
        let mut params = Parameters::new()
            .with("reporting_dir", "data/02_reporting")
            .with("absolute_dir", "/var/reports")
            .with("top_n", 10);

        let root = Path::new("/srv/covid");
        params.resolve_path("reporting_dir", root);
        params.resolve_path("absolute_dir", root);
        params.resolve_path("top_n", root);
        params.resolve_path("missing", root);

        assert_eq!(
            params.get("reporting_dir").and_then(|v| v.as_str()),
            Some("/srv/covid/data/02_reporting")
        );
        assert_eq!(
            params.get("absolute_dir").and_then(|v| v.as_str()),
            Some("/var/reports")
        );
        assert_eq!(params.get("top_n"), Some(&serde_json::json!(10)));
        assert_eq!(params.len(), 3);
    }
}
