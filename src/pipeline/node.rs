//! Node declarations: a named function with ordered inputs and outputs.

use crate::data::Data;
use anyhow::{Context as _, Result};
use polars::prelude::DataFrame;
use std::fmt;
use std::sync::Arc;

/// Prefix marking a node input as a parameter rather than a dataset.
pub const PARAMS_PREFIX: &str = "params:";

/// Parameter name behind a `params:<name>` input, if it is one.
pub fn param_name(input: &str) -> Option<&str> {
    input.strip_prefix(PARAMS_PREFIX)
}

/// Function invoked by the executor. It receives the resolved inputs in
/// declared order and returns one value per declared output, in order.
pub type NodeFn = Arc<dyn Fn(&Inputs<'_>) -> Result<Vec<Data>> + Send + Sync>;

/// A single transformation step.
#[derive(Clone)]
pub struct Node {
    name: String,
    inputs: Vec<String>,
    outputs: Vec<String>,
    func: NodeFn,
}

impl Node {
    pub fn new<F>(name: impl Into<String>, inputs: &[&str], outputs: &[&str], func: F) -> Self
    where
        F: Fn(&Inputs<'_>) -> Result<Vec<Data>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            inputs: inputs.iter().map(|s| (*s).to_owned()).collect(),
            outputs: outputs.iter().map(|s| (*s).to_owned()).collect(),
            func: Arc::new(func),
        }
    }

    /// One table in, one table out.
    pub fn table_transform<F>(name: impl Into<String>, input: &str, output: &str, func: F) -> Self
    where
        F: Fn(&DataFrame) -> Result<DataFrame> + Send + Sync + 'static,
    {
        Self::new(name, &[input], &[output], move |inputs| {
            let df = inputs.table(0)?;
            Ok(vec![Data::Table(func(df)?)])
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    /// Dataset inputs, i.e. everything except `params:` references.
    pub fn dataset_inputs(&self) -> impl Iterator<Item = &str> {
        self.inputs
            .iter()
            .map(String::as_str)
            .filter(|input| param_name(input).is_none())
    }

    pub(crate) fn call(&self, inputs: &Inputs<'_>) -> Result<Vec<Data>> {
        (self.func)(inputs)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: [{}] -> [{}]",
            self.name,
            self.inputs.join(", "),
            self.outputs.join(", ")
        )
    }
}

/// Resolved inputs handed to a node, in declared order.
pub struct Inputs<'a> {
    node: &'a str,
    entries: Vec<(&'a str, &'a Data)>,
}

impl<'a> Inputs<'a> {
    pub fn new(node: &'a str, entries: Vec<(&'a str, &'a Data)>) -> Self {
        Self { node, entries }
    }

    pub fn node(&self) -> &str {
        self.node
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn name(&self, index: usize) -> Option<&'a str> {
        self.entries.get(index).map(|(name, _)| *name)
    }

    pub fn get(&self, index: usize) -> Result<&'a Data> {
        self.entries
            .get(index)
            .map(|(_, data)| *data)
            .with_context(|| format!("Node '{}' has no input #{index}", self.node))
    }

    pub fn table(&self, index: usize) -> Result<&'a DataFrame> {
        let data = self.get(index)?;
        data.as_table().with_context(|| {
            format!(
                "Input '{}' of node '{}' is a {}, expected a table",
                self.name(index).unwrap_or_default(),
                self.node,
                data.kind()
            )
        })
    }

    pub fn param(&self, index: usize) -> Result<&'a serde_json::Value> {
        let data = self.get(index)?;
        data.as_param().with_context(|| {
            format!(
                "Input '{}' of node '{}' is a {}, expected a parameter",
                self.name(index).unwrap_or_default(),
                self.node,
                data.kind()
            )
        })
    }

    pub fn param_str(&self, index: usize) -> Result<&'a str> {
        self.param(index)?.as_str().with_context(|| {
            format!(
                "Parameter '{}' of node '{}' must be a string",
                self.name(index).unwrap_or_default(),
                self.node
            )
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a Data)> + '_ {
        self.entries.iter().copied()
    }
}
