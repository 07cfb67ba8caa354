//! Declarative dataset pipelines: nodes, the dependency graph derived from
//! them, and the executor that runs the graph against a catalog.
//!
//! A pipeline is an ordered list of [`Node`]s. Each node names the datasets it
//! reads and writes; dependencies are never declared directly. Building a
//! [`PipelineGraph`] derives the edges, rejects ambiguous or cyclic
//! declarations and fixes a stable execution order. The [`Executor`] then runs
//! the nodes one at a time, loading inputs from the catalog or from memory and
//! persisting every registered output.
//!
//! # Example
//!
//! ```no_run
//! use covid_pipeline::catalog::{DataCatalog, DatasetFormat};
//! use covid_pipeline::config::Parameters;
//! use covid_pipeline::eda::cleaning;
//! use covid_pipeline::pipeline::{Executor, Node, PipelineGraph};
//!
//! let mut catalog = DataCatalog::new();
//! catalog.register("raw", "data/01_raw/covid_19_clean_complete.csv", DatasetFormat::Csv);
//! catalog.register("clean", "data/03_intermediate/clean.csv", DatasetFormat::Csv);
//!
//! let nodes = vec![Node::table_transform(
//!     "clean_province_state_node",
//!     "raw",
//!     "clean",
//!     cleaning::clean_province_state,
//! )];
//!
//! let params = Parameters::new();
//! let graph = PipelineGraph::build(nodes, &catalog, &params)?;
//! let report = Executor::new().run(&graph, &catalog, &params)?;
//! println!("{}", report.summary());
//! # Ok::<(), covid_pipeline::error::PipelineError>(())
//! ```
//!
//! # Execution model
//!
//! - Nodes run sequentially in topological order; ties keep declaration order.
//! - Parameters (`params:<name>` inputs) are passed through unchanged.
//! - A node must return exactly one value per declared output, otherwise the
//!   run stops before anything of that node is written.
//! - The first failure halts the run. Outputs persisted earlier stay on disk.

pub mod executor;
pub mod graph;
pub mod node;

pub use executor::{Executor, RunReport};
pub use graph::{Edge, PipelineGraph};
pub use node::{Inputs, Node, NodeFn, PARAMS_PREFIX, param_name};
