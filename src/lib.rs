//! # covid-pipeline
//!
//! Declarative dataset pipelines for the COVID-19 exploratory analysis.
//! Nodes declare the datasets they read and write; the crate derives the
//! dependency graph from those declarations, orders it, and executes it
//! against a catalog of CSV tables and PNG charts.
//!
//! ## Quick Start
//!
//! ```no_run
//! use covid_pipeline::config::{DEFAULT_ENV, ProjectPaths};
//! use covid_pipeline::pipeline::Executor;
//! use covid_pipeline::registry::DEFAULT_PIPELINE;
//! use covid_pipeline::session::Session;
//!
//! let session = Session::load(ProjectPaths::new(".", DEFAULT_ENV))?;
//! let report = session.run(DEFAULT_PIPELINE, &Executor::new())?;
//! println!("{}", report.summary());
//! # Ok::<(), covid_pipeline::error::PipelineError>(())
//! ```
//!
//! ## Core Modules
//!
//! - [`catalog`]: dataset identifiers bound to storage locations and formats
//! - [`pipeline`]: nodes, graph construction and the executor
//!   - [`pipeline::graph`]: edge derivation, validation and topological order
//!   - [`pipeline::executor`]: sequential execution and persistence
//! - [`eda`]: the exploration, cleaning, reporting and plotting nodes
//! - [`registry`]: named pipelines
//! - [`session`]: a project's configuration loaded for one environment
//! - [`config`]: project layout, catalog and parameter files
//! - [`error`]: error taxonomy
//! - [`logging`]: console and rolling file logs
//!
//! ## Key Concepts
//!
//! ### Implicit edges
//!
//! A node never names another node. An edge exists wherever one node's output
//! identifier equals another node's input identifier. Inputs nobody produces
//! must be registered in the catalog (source data) or be `params:` references.
//!
//! ### Persistence
//!
//! Outputs with a catalog entry are written as soon as their node finishes.
//! Outputs without one stay in memory for downstream nodes and, if nothing
//! consumes them, are returned in the [`pipeline::RunReport`].

pub mod catalog;
pub mod config;
pub mod data;
pub mod eda;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod registry;
pub mod session;
