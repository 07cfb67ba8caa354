//! Dependency graph derived from node declarations.
//!
//! Edges are never declared by hand: node A precedes node B whenever one of
//! A's outputs is one of B's inputs. Construction validates the declarations
//! and fixes a stable execution order once, before anything runs.

use super::node::{Node, param_name};
use crate::catalog::DataCatalog;
use crate::config::Parameters;
use crate::error::{PipelineError, Result};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, HashSet};

/// Producer -> consumer edge through one dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub producer: String,
    pub consumer: String,
    pub dataset: String,
}

#[derive(Debug, Clone)]
struct IndexedEdge {
    from: usize,
    to: usize,
    dataset: String,
}

/// Validated, acyclic set of nodes with a fixed execution order.
#[derive(Debug, Clone)]
pub struct PipelineGraph {
    nodes: Vec<Node>,
    order: Vec<usize>,
    producers: BTreeMap<String, usize>,
    edges: Vec<IndexedEdge>,
}

impl PipelineGraph {
    /// Validate `nodes` and derive their execution order.
    ///
    /// Inputs must resolve to a supplied parameter (`params:<name>`), the
    /// output of exactly one node, or an entry registered in `catalog`.
    ///
    /// # Errors
    ///
    /// `DuplicateNode`, `DuplicateOutput`, `ReservedOutput`,
    /// `MissingDependency` or `Cycle`, checked in that order.
    pub fn build(nodes: Vec<Node>, catalog: &DataCatalog, parameters: &Parameters) -> Result<Self> {
        let mut names = HashSet::new();
        for node in &nodes {
            if !names.insert(node.name()) {
                return Err(PipelineError::DuplicateNode {
                    node: node.name().to_owned(),
                });
            }
        }

        let producers = collect_producers(&nodes)?;
        let edges = derive_edges(&nodes, &producers, catalog, parameters)?;
        let order = stable_topological_sort(nodes.len(), &edges)
            .map_err(|()| cycle_error(&nodes, &edges))?;

        tracing::debug!(
            "Built pipeline graph: {} nodes, {} edges",
            nodes.len(),
            edges.len()
        );

        Ok(Self {
            nodes,
            order,
            producers,
            edges,
        })
    }

    /// Nodes in declaration order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Nodes in execution order. Every node comes after the producers of its
    /// inputs; independent nodes keep their declaration order.
    pub fn topological_order(&self) -> impl Iterator<Item = &Node> {
        self.order.iter().filter_map(|&idx| self.nodes.get(idx))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.name() == name)
    }

    /// Node producing `dataset`, if any.
    pub fn producer(&self, dataset: &str) -> Option<&Node> {
        self.producers
            .get(dataset)
            .and_then(|&idx| self.nodes.get(idx))
    }

    /// Nodes declaring `dataset` as an input, in declaration order.
    pub fn consumers(&self, dataset: &str) -> Vec<&Node> {
        self.nodes
            .iter()
            .filter(|node| node.inputs().iter().any(|input| input == dataset))
            .collect()
    }

    /// Direct upstream nodes of `name`, in declaration order.
    pub fn dependencies(&self, name: &str) -> Vec<&Node> {
        let Some(target) = self.nodes.iter().position(|node| node.name() == name) else {
            return Vec::new();
        };
        let upstream: BTreeSet<usize> = self
            .edges
            .iter()
            .filter(|edge| edge.to == target)
            .map(|edge| edge.from)
            .collect();
        upstream
            .into_iter()
            .filter_map(|idx| self.nodes.get(idx))
            .collect()
    }

    pub fn edges(&self) -> Vec<Edge> {
        self.edges
            .iter()
            .filter_map(|edge| {
                let producer = self.nodes.get(edge.from)?;
                let consumer = self.nodes.get(edge.to)?;
                Some(Edge {
                    producer: producer.name().to_owned(),
                    consumer: consumer.name().to_owned(),
                    dataset: edge.dataset.clone(),
                })
            })
            .collect()
    }

    /// Human-readable execution plan, one node per line.
    pub fn describe(&self) -> String {
        self.topological_order()
            .enumerate()
            .map(|(step, node)| format!("{:>3}. {node}\n", step + 1))
            .collect()
    }
}

fn collect_producers(nodes: &[Node]) -> Result<BTreeMap<String, usize>> {
    let mut producers: BTreeMap<String, usize> = BTreeMap::new();
    for (idx, node) in nodes.iter().enumerate() {
        for output in node.outputs() {
            if param_name(output).is_some() {
                return Err(PipelineError::ReservedOutput {
                    node: node.name().to_owned(),
                    output: output.clone(),
                });
            }
            if let Some(&first) = producers.get(output) {
                let first_node = nodes.get(first).map(Node::name).unwrap_or_default();
                return Err(PipelineError::DuplicateOutput {
                    dataset: output.clone(),
                    first_node: first_node.to_owned(),
                    second_node: node.name().to_owned(),
                });
            }
            producers.insert(output.clone(), idx);
        }
    }
    Ok(producers)
}

fn derive_edges(
    nodes: &[Node],
    producers: &BTreeMap<String, usize>,
    catalog: &DataCatalog,
    parameters: &Parameters,
) -> Result<Vec<IndexedEdge>> {
    let mut edges = Vec::new();
    for (idx, node) in nodes.iter().enumerate() {
        for input in node.inputs() {
            let resolved = if let Some(param) = param_name(input) {
                parameters.contains(param)
            } else if let Some(&from) = producers.get(input) {
                edges.push(IndexedEdge {
                    from,
                    to: idx,
                    dataset: input.clone(),
                });
                true
            } else {
                catalog.contains(input)
            };

            if !resolved {
                return Err(PipelineError::MissingDependency {
                    node: node.name().to_owned(),
                    input: input.clone(),
                });
            }
        }
    }
    Ok(edges)
}

/// Kahn's algorithm; among ready nodes the lowest declaration index runs first.
fn stable_topological_sort(
    count: usize,
    edges: &[IndexedEdge],
) -> std::result::Result<Vec<usize>, ()> {
    let mut in_degree = vec![0usize; count];
    let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); count];
    for edge in edges {
        in_degree[edge.to] += 1;
        outgoing[edge.from].push(edge.to);
    }

    let mut ready: BinaryHeap<Reverse<usize>> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, degree)| **degree == 0)
        .map(|(idx, _)| Reverse(idx))
        .collect();

    let mut order = Vec::with_capacity(count);
    while let Some(Reverse(idx)) = ready.pop() {
        order.push(idx);
        for &next in &outgoing[idx] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.push(Reverse(next));
            }
        }
    }

    if order.len() == count { Ok(order) } else { Err(()) }
}

/// Name the nodes and datasets that sit on a cycle.
fn cycle_error(nodes: &[Node], edges: &[IndexedEdge]) -> PipelineError {
    let mut graph = DiGraph::<usize, ()>::with_capacity(nodes.len(), edges.len());
    let indices: Vec<NodeIndex> = (0..nodes.len()).map(|idx| graph.add_node(idx)).collect();
    for edge in edges {
        graph.add_edge(indices[edge.from], indices[edge.to], ());
    }

    // Node index -> id of the strongly connected component it belongs to,
    // kept only for components that actually contain a cycle.
    let mut component_of: BTreeMap<usize, usize> = BTreeMap::new();
    for (component_id, component) in tarjan_scc(&graph).into_iter().enumerate() {
        let cyclic = component.len() > 1
            || component
                .first()
                .is_some_and(|&n| graph.contains_edge(n, n));
        if cyclic {
            for n in component {
                component_of.insert(graph[n], component_id);
            }
        }
    }

    let datasets: BTreeSet<String> = edges
        .iter()
        .filter(|edge| {
            matches!(
                (component_of.get(&edge.from), component_of.get(&edge.to)),
                (Some(a), Some(b)) if a == b
            )
        })
        .map(|edge| edge.dataset.clone())
        .collect();

    PipelineError::Cycle {
        nodes: component_of
            .keys()
            .filter_map(|&idx| nodes.get(idx))
            .map(|node| node.name().to_owned())
            .collect(),
        datasets: datasets.into_iter().collect(),
    }
}
