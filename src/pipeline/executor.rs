//! Pipeline execution engine.
//!
//! Runs the nodes of a [`PipelineGraph`] one at a time in topological order,
//! materializing inputs from memory or the catalog and persisting outputs that
//! have a catalog entry.

use super::graph::PipelineGraph;
use super::node::{Inputs, Node, PARAMS_PREFIX, param_name};
use crate::catalog::DataCatalog;
use crate::config::Parameters;
use crate::data::Data;
use crate::error::{PipelineError, Result};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Report generated after a successful run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Node names in the order they ran
    pub executed: Vec<String>,

    /// Dataset identifiers written to the catalog, in write order
    pub persisted: Vec<String>,

    /// Outputs with neither a consumer nor a catalog entry
    pub free_outputs: BTreeMap<String, Data>,

    /// Time taken for execution
    pub duration: Duration,
}

impl RunReport {
    /// Create a summary message
    pub fn summary(&self) -> String {
        format!(
            "Pipeline completed: {} nodes executed, {} datasets persisted, {} free outputs, {:.2}s",
            self.executed.len(),
            self.persisted.len(),
            self.free_outputs.len(),
            self.duration.as_secs_f64()
        )
    }
}

/// Sequential runner. Cloning shares the abort handle.
#[derive(Debug, Clone, Default)]
pub struct Executor {
    abort: Arc<AtomicBool>,
}

impl Executor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an externally owned abort flag, e.g. one set by a signal handler.
    pub fn with_abort_handle(abort: Arc<AtomicBool>) -> Self {
        Self { abort }
    }

    /// Setting the returned flag stops the run before the next node starts.
    pub fn abort_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.abort)
    }

    /// Execute every node of `graph` exactly once.
    ///
    /// # Errors
    ///
    /// Stops at the first failure. Catalog entries written by earlier nodes
    /// are left in place.
    pub fn run(
        &self,
        graph: &PipelineGraph,
        catalog: &DataCatalog,
        parameters: &Parameters,
    ) -> Result<RunReport> {
        let start = Instant::now();
        let params: HashMap<String, Data> = parameters
            .iter()
            .map(|(name, value)| (format!("{PARAMS_PREFIX}{name}"), Data::Param(value.clone())))
            .collect();

        let mut pending_consumers = count_consumers(graph);
        let mut memory: HashMap<String, Data> = HashMap::new();
        let mut executed: Vec<String> = Vec::with_capacity(graph.len());
        let mut persisted = Vec::new();
        let mut free_outputs = BTreeMap::new();
        let total = graph.len();

        for (step, node) in graph.topological_order().enumerate() {
            if self.abort.load(Ordering::SeqCst) {
                tracing::warn!(
                    "Run aborted before node '{}' ({} of {total} completed)",
                    node.name(),
                    executed.len()
                );
                return Err(PipelineError::Aborted {
                    completed: executed,
                });
            }

            tracing::info!("Running node {}/{total}: {node}", step + 1);
            let node_start = Instant::now();

            let resolved = materialize_inputs(node, catalog, &mut memory)
                .inspect_err(|e| tracing::error!("{e}"))?;

            let outputs = {
                let inputs = bind_inputs(node, &params, &memory)?;
                node.call(&inputs)
            }
            .map_err(|source| {
                tracing::error!("Node '{}' failed: {source:#}", node.name());
                PipelineError::NodeFailed {
                    node: node.name().to_owned(),
                    resolved_inputs: resolved.clone(),
                    source,
                }
            })?;

            check_output_contract(node, &outputs)?;

            for (name, data) in node.outputs().iter().zip(outputs) {
                if catalog.contains(name) {
                    catalog
                        .save(name, &data)
                        .map_err(|e| dataset_failed(node, name, e))
                        .inspect_err(|e| tracing::error!("{e}"))?;
                    tracing::info!("Saved '{name}' ({data})");
                    persisted.push(name.clone());
                }

                if pending_consumers.get(name).copied().unwrap_or(0) > 0 {
                    memory.insert(name.clone(), data);
                } else if !catalog.contains(name) {
                    free_outputs.insert(name.clone(), data);
                }
            }

            for input in &resolved {
                if let Some(count) = pending_consumers.get_mut(input) {
                    *count = count.saturating_sub(1);
                    if *count == 0 && memory.remove(input).is_some() {
                        tracing::debug!("Released '{input}' from memory");
                    }
                }
            }

            tracing::info!(
                "Completed node '{}' in {:.2}s",
                node.name(),
                node_start.elapsed().as_secs_f64()
            );
            executed.push(node.name().to_owned());
        }

        let report = RunReport {
            executed,
            persisted,
            free_outputs,
            duration: start.elapsed(),
        };
        tracing::info!("{}", report.summary());
        Ok(report)
    }
}

/// Number of nodes reading each dataset.
fn count_consumers(graph: &PipelineGraph) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for node in graph.nodes() {
        let distinct: BTreeSet<&str> = node.dataset_inputs().collect();
        for input in distinct {
            *counts.entry(input.to_owned()).or_insert(0) += 1;
        }
    }
    counts
}

/// Ensure every dataset input of `node` is in memory, loading from the
/// catalog when no upstream node produced it in this run.
fn materialize_inputs(
    node: &Node,
    catalog: &DataCatalog,
    memory: &mut HashMap<String, Data>,
) -> Result<Vec<String>> {
    let mut resolved: Vec<String> = Vec::new();
    for input in node.dataset_inputs() {
        if resolved.iter().any(|seen| seen == input) {
            continue;
        }
        if !memory.contains_key(input) {
            let data = catalog
                .load(input)
                .map_err(|e| dataset_failed(node, input, e))?;
            tracing::info!("Loaded '{input}' ({data})");
            memory.insert(input.to_owned(), data);
        }
        resolved.push(input.to_owned());
    }
    Ok(resolved)
}

fn dataset_failed(node: &Node, dataset: &str, source: PipelineError) -> PipelineError {
    PipelineError::DatasetFailed {
        node: node.name().to_owned(),
        dataset: dataset.to_owned(),
        source: Box::new(source),
    }
}

fn bind_inputs<'a>(
    node: &'a Node,
    params: &'a HashMap<String, Data>,
    memory: &'a HashMap<String, Data>,
) -> Result<Inputs<'a>> {
    let entries = node
        .inputs()
        .iter()
        .map(|input| {
            let data = if param_name(input).is_some() {
                params.get(input)
            } else {
                memory.get(input)
            };
            data.map(|data| (input.as_str(), data))
                .ok_or_else(|| PipelineError::MissingDependency {
                    node: node.name().to_owned(),
                    input: input.clone(),
                })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Inputs::new(node.name(), entries))
}

fn check_output_contract(node: &Node, outputs: &[Data]) -> Result<()> {
    let declared = node.outputs();
    if outputs.len() == declared.len() {
        return Ok(());
    }

    let detail = match declared.get(outputs.len()) {
        Some(missing) => format!(
            "declared output '{missing}' was not produced ({} of {} returned)",
            outputs.len(),
            declared.len()
        ),
        None => format!(
            "returned {} values for {} declared outputs",
            outputs.len(),
            declared.len()
        ),
    };
    tracing::error!("Node '{}' {detail}", node.name());
    Err(PipelineError::OutputContract {
        node: node.name().to_owned(),
        detail,
    })
}
