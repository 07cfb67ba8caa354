//! Dataset catalog: a typed registry from dataset identifiers to storage.
//!
//! The catalog is the only component that touches persistent storage on behalf
//! of the executor. Nodes never read or write catalog entries themselves.
//!
//! ```no_run
//! use covid_pipeline::catalog::{DataCatalog, DatasetFormat};
//!
//! let mut catalog = DataCatalog::new();
//! catalog.register("day_wise", "data/01_raw/day_wise.csv", DatasetFormat::Csv);
//!
//! let day_wise = catalog.load("day_wise")?;
//! catalog.save("day_wise", &day_wise)?;
//! # Ok::<(), covid_pipeline::error::PipelineError>(())
//! ```

pub mod format;

pub use format::DatasetFormat;

use crate::config::CatalogConfig;
use crate::data::Data;
use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Storage binding of one dataset identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub location: PathBuf,
    pub format: DatasetFormat,
}

#[derive(Debug, Clone, Default)]
pub struct DataCatalog {
    entries: BTreeMap<String, CatalogEntry>,
}

impl DataCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from configuration, resolving relative locations
    /// against `root`.
    pub fn from_config(config: &CatalogConfig, root: &Path) -> Self {
        let mut catalog = Self::new();
        for (id, entry) in &config.entries {
            let location = if entry.location.is_absolute() {
                entry.location.clone()
            } else {
                root.join(&entry.location)
            };
            catalog.register(id.clone(), location, entry.format);
        }
        catalog
    }

    /// Bind `id` to a location. Re-registering an identifier replaces the
    /// previous binding.
    pub fn register(
        &mut self,
        id: impl Into<String>,
        location: impl Into<PathBuf>,
        format: DatasetFormat,
    ) {
        let id = id.into();
        let location = location.into();
        tracing::debug!(
            "Registered dataset '{id}' -> {} ({})",
            location.display(),
            format.as_str()
        );
        self.entries.insert(id, CatalogEntry { location, format });
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Registered and present in storage.
    pub fn exists(&self, id: &str) -> bool {
        self.entries
            .get(id)
            .is_some_and(|entry| entry.location.exists())
    }

    pub fn location(&self, id: &str) -> Option<&Path> {
        self.entries.get(id).map(|entry| entry.location.as_path())
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &CatalogEntry)> {
        self.entries.iter().map(|(id, entry)| (id.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read and parse the dataset bound to `id`.
    pub fn load(&self, id: &str) -> Result<Data> {
        let entry = self.lookup(id)?;
        if !entry.location.exists() {
            return Err(PipelineError::NotFound {
                dataset: id.to_owned(),
                location: Some(entry.location.clone()),
            });
        }

        tracing::debug!("Loading '{id}' from {}", entry.location.display());
        entry
            .format
            .read(&entry.location)
            .map_err(|e| format_error(id, &e))
    }

    /// Serialize `data` to the location bound to `id`, creating parent
    /// directories and overwriting any previous content.
    pub fn save(&self, id: &str, data: &Data) -> Result<()> {
        let entry = self.lookup(id)?;
        if !entry.format.accepts(data) {
            return Err(PipelineError::Format {
                dataset: id.to_owned(),
                message: format!(
                    "cannot store a {} in a {} entry",
                    data.kind(),
                    entry.format.as_str()
                ),
            });
        }

        if let Some(parent) = entry.location.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        tracing::debug!("Saving '{id}' to {}", entry.location.display());
        entry
            .format
            .write(data, &entry.location)
            .map_err(|e| format_error(id, &e))
    }

    fn lookup(&self, id: &str) -> Result<&CatalogEntry> {
        self.entries.get(id).ok_or_else(|| PipelineError::NotFound {
            dataset: id.to_owned(),
            location: None,
        })
    }
}

fn format_error(id: &str, err: &anyhow::Error) -> PipelineError {
    PipelineError::Format {
        dataset: id.to_owned(),
        message: format!("{err:#}"),
    }
}
