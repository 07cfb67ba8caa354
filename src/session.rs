//! A loaded project: configuration, catalog and parameters for one
//! environment, ready to build and run registered pipelines.

use crate::catalog::DataCatalog;
use crate::config::{Parameters, ProjectPaths};
use crate::eda::REPORTING_DIR_PARAM;
use crate::error::Result;
use crate::pipeline::{Executor, PipelineGraph, RunReport};
use crate::registry;

/// Parameters holding filesystem paths, resolved against the project root.
const PATH_PARAMETERS: [&str; 1] = [REPORTING_DIR_PARAM];

#[derive(Debug)]
pub struct Session {
    pub paths: ProjectPaths,
    pub catalog: DataCatalog,
    pub parameters: Parameters,
}

impl Session {
    /// Read the catalog and parameters of `paths.env`.
    ///
    /// # Errors
    ///
    /// [`crate::error::PipelineError::Config`] when the catalog file is
    /// missing or malformed, or the parameters file is malformed.
    pub fn load(paths: ProjectPaths) -> Result<Self> {
        let catalog_config = paths.load_catalog_config()?;
        let catalog = DataCatalog::from_config(&catalog_config, &paths.root);

        let mut parameters = paths.load_parameters()?;
        for name in PATH_PARAMETERS {
            parameters.resolve_path(name, &paths.root);
        }

        tracing::info!(
            "Loaded project {} (env '{}'): {} datasets, {} parameters",
            paths.root.display(),
            paths.env,
            catalog.len(),
            parameters.len()
        );
        Ok(Self {
            paths,
            catalog,
            parameters,
        })
    }

    /// Build the graph of the registered pipeline `name` without running it.
    pub fn build(&self, name: &str) -> Result<PipelineGraph> {
        let nodes = registry::pipeline(name)?;
        PipelineGraph::build(nodes, &self.catalog, &self.parameters)
    }

    /// Build and execute the registered pipeline `name`.
    pub fn run(&self, name: &str, executor: &Executor) -> Result<RunReport> {
        let graph = self.build(name)?;
        tracing::info!("Running pipeline '{name}' ({} nodes)", graph.len());
        executor.run(&graph, &self.catalog, &self.parameters)
    }
}
