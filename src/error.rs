//! Error taxonomy for graph construction, catalog I/O and pipeline runs.
//!
//! Every failure is fatal to a run. Graph-construction errors are raised by
//! [`PipelineGraph::build`](crate::pipeline::PipelineGraph::build) before any
//! node executes; catalog errors come from
//! [`DataCatalog`](crate::catalog::DataCatalog); the remaining variants are
//! produced by the [`Executor`](crate::pipeline::Executor).
//!
//! ```
//! use covid_pipeline::error::PipelineError;
//!
//! fn describe(err: &PipelineError) -> &'static str {
//!     match err {
//!         PipelineError::Cycle { .. } | PipelineError::DuplicateOutput { .. } => "bad graph",
//!         PipelineError::NodeFailed { .. } => "leaf failure",
//!         _ => "other",
//!     }
//! }
//! ```

use std::fmt;
use std::path::PathBuf;

/// Main error type for pipeline operations.
#[derive(Debug)]
pub enum PipelineError {
    /// Two nodes were declared with the same name.
    DuplicateNode { node: String },

    /// A dataset identifier is produced by more than one node.
    DuplicateOutput {
        dataset: String,
        first_node: String,
        second_node: String,
    },

    /// A node declared a parameter name as one of its outputs.
    ReservedOutput { node: String, output: String },

    /// An input is neither a parameter, a node output nor a catalog entry.
    MissingDependency { node: String, input: String },

    /// The declared dependencies form at least one cycle.
    Cycle {
        nodes: Vec<String>,
        datasets: Vec<String>,
    },

    /// Unregistered dataset, or registered location that does not exist.
    NotFound {
        dataset: String,
        location: Option<PathBuf>,
    },

    /// Parsing or serializing a dataset failed.
    Format { dataset: String, message: String },

    /// A node did not return the outputs it declared.
    OutputContract { node: String, detail: String },

    /// A node's function returned an error.
    NodeFailed {
        node: String,
        resolved_inputs: Vec<String>,
        source: anyhow::Error,
    },

    /// Loading an input or saving an output of a node failed in the catalog.
    DatasetFailed {
        node: String,
        dataset: String,
        source: Box<PipelineError>,
    },

    /// The run was aborted between nodes.
    Aborted { completed: Vec<String> },

    /// Configuration errors
    Config(String),

    /// I/O errors outside the catalog
    Io(std::io::Error),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateNode { node } => write!(f, "Duplicate node name '{node}'"),
            Self::DuplicateOutput {
                dataset,
                first_node,
                second_node,
            } => write!(
                f,
                "Dataset '{dataset}' is produced by both '{first_node}' and '{second_node}'"
            ),
            Self::ReservedOutput { node, output } => write!(
                f,
                "Node '{node}' declares parameter '{output}' as an output"
            ),
            Self::MissingDependency { node, input } => write!(
                f,
                "Node '{node}' requires '{input}', which is not a parameter, a node output or a catalog entry"
            ),
            Self::Cycle { nodes, datasets } => write!(
                f,
                "Dependency cycle between nodes [{}] through datasets [{}]",
                nodes.join(", "),
                datasets.join(", ")
            ),
            Self::NotFound {
                dataset,
                location: Some(path),
            } => write!(
                f,
                "Dataset '{dataset}' not found at {}",
                path.display()
            ),
            Self::NotFound {
                dataset,
                location: None,
            } => write!(f, "Dataset '{dataset}' is not registered in the catalog"),
            Self::Format { dataset, message } => {
                write!(f, "Format error for dataset '{dataset}': {message}")
            }
            Self::OutputContract { node, detail } => {
                write!(f, "Node '{node}' broke its output contract: {detail}")
            }
            Self::NodeFailed {
                node,
                resolved_inputs,
                source,
            } => write!(
                f,
                "Node '{node}' failed (resolved inputs: [{}]): {source:#}",
                resolved_inputs.join(", ")
            ),
            Self::DatasetFailed {
                node,
                dataset,
                source,
            } => write!(f, "Node '{node}' could not access dataset '{dataset}': {source}"),
            Self::Aborted { completed } => write!(
                f,
                "Run aborted after {} completed node(s)",
                completed.len()
            ),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NodeFailed { source, .. } => {
                let inner: &(dyn std::error::Error + 'static) = source.as_ref();
                Some(inner)
            }
            Self::DatasetFailed { source, .. } => Some(&**source),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(format!("JSON error: {err}"))
    }
}

impl PipelineError {
    /// Name of the node the error is attributed to, if any.
    pub fn node(&self) -> Option<&str> {
        match self {
            Self::DuplicateNode { node }
            | Self::ReservedOutput { node, .. }
            | Self::MissingDependency { node, .. }
            | Self::OutputContract { node, .. }
            | Self::NodeFailed { node, .. }
            | Self::DatasetFailed { node, .. } => Some(node),
            Self::DuplicateOutput { second_node, .. } => Some(second_node),
            _ => None,
        }
    }

    /// True for errors raised while building the graph, before any execution.
    pub fn is_build_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateNode { .. }
                | Self::DuplicateOutput { .. }
                | Self::ReservedOutput { .. }
                | Self::MissingDependency { .. }
                | Self::Cycle { .. }
        )
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
