//! Named pipelines available to the command line.

use crate::eda;
use crate::error::{PipelineError, Result};
use crate::pipeline::Node;
use std::collections::BTreeMap;

/// Pipeline run when no name is given.
pub const DEFAULT_PIPELINE: &str = "__default__";

/// Every registered pipeline by name.
pub fn register_pipelines() -> BTreeMap<&'static str, Vec<Node>> {
    let mut pipelines = BTreeMap::new();
    pipelines.insert("eda", eda::create_pipeline());
    pipelines.insert(DEFAULT_PIPELINE, eda::create_pipeline());
    pipelines
}

/// Nodes of the pipeline called `name`.
///
/// # Errors
///
/// [`PipelineError::Config`] when no pipeline has that name.
pub fn pipeline(name: &str) -> Result<Vec<Node>> {
    let mut pipelines = register_pipelines();
    pipelines.remove(name).ok_or_else(|| {
        let known: Vec<&str> = pipelines.keys().copied().collect();
        PipelineError::Config(format!(
            "Unknown pipeline '{name}' (available: {})",
            known.join(", ")
        ))
    })
}
