//! Derive a reduced graph from a filter configuration.
//!
//! Node predicates are evaluated against the full graph (connectivity uses
//! every original edge); edges are pruned only once the node set is final.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use super::model::{Graph, Node};

/// Namespace used when an id has no usable prefix.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Filter settings supplied by the filter UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct FilterConfig {
	/// Allowed types; empty allows all.
	pub types: BTreeSet<String>,
	/// Allowed namespaces; empty allows all.
	pub namespaces: BTreeSet<String>,
	/// Case-insensitive substring over label, id and property values.
	pub search: String,
	/// Keep nodes with no incident edge.
	pub show_isolated: bool,
	/// Minimum incident-edge count; 0 disables.
	pub min_connections: usize,
}

impl Default for FilterConfig {
	fn default() -> Self {
		Self {
			types: BTreeSet::new(),
			namespaces: BTreeSet::new(),
			search: String::new(),
			show_isolated: true,
			min_connections: 0,
		}
	}
}

/// Node/edge totals before and after filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FilterCounts {
	/// Nodes in the source graph.
	pub nodes_before: usize,
	/// Nodes kept.
	pub nodes_after: usize,
	/// Edges in the source graph.
	pub edges_before: usize,
	/// Edges kept.
	pub edges_after: usize,
}

impl FilterCounts {
	/// Compare a source graph with its filtered derivative.
	pub fn between(full: &Graph, filtered: &Graph) -> Self {
		Self {
			nodes_before: full.node_count(),
			nodes_after: filtered.node_count(),
			edges_before: full.edge_count(),
			edges_after: filtered.edge_count(),
		}
	}
}

/// Distinct values a filter UI can offer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
	/// Types in first-seen order.
	pub types: Vec<String>,
	/// Namespaces in first-seen order.
	pub namespaces: Vec<String>,
}

impl FilterOptions {
	/// Collect distinct types and namespaces of `graph`.
	pub fn from_graph(graph: &Graph) -> Self {
		let mut options = Self::default();
		for node in graph.nodes() {
			if !options.types.contains(&node.node_type) {
				options.types.push(node.node_type.clone());
			}
			let ns = namespace_of(&node.id);
			if !options.namespaces.iter().any(|n| n == ns) {
				options.namespaces.push(ns.to_string());
			}
		}
		options
	}
}

/// Coarse grouping of an id: non-empty prefix before the first `:`, else
/// non-empty prefix before the first `/`, else [`DEFAULT_NAMESPACE`].
pub fn namespace_of(id: &str) -> &str {
	[':', '/']
		.into_iter()
		.filter_map(|sep| id.split_once(sep).map(|(prefix, _)| prefix))
		.find(|prefix| !prefix.is_empty())
		.unwrap_or(DEFAULT_NAMESPACE)
}

fn matches_search(node: &Node, needle: &str) -> bool {
	node.label.to_lowercase().contains(needle)
		|| node.id.to_lowercase().contains(needle)
		|| node
			.properties
			.values()
			.any(|v| v.to_string().to_lowercase().contains(needle))
}

/// Apply `config` to `graph`, producing a new graph that shares nodes and
/// edges with the input.
pub fn apply_filters(graph: &Graph, config: &FilterConfig) -> Graph {
	let counts = graph.connection_counts();
	let needle = config.search.to_lowercase();

	let nodes: Vec<_> = graph
		.nodes()
		.iter()
		.filter(|n| config.types.is_empty() || config.types.contains(&n.node_type))
		.filter(|n| config.namespaces.is_empty() || config.namespaces.contains(namespace_of(&n.id)))
		.filter(|n| needle.is_empty() || matches_search(n, &needle))
		.filter(|n| {
			let degree = counts.get(n.id.as_str()).copied().unwrap_or(0);
			(config.show_isolated || degree > 0) && degree >= config.min_connections
		})
		.cloned()
		.collect();

	let kept: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
	let edges: Vec<_> = graph
		.edges()
		.iter()
		.filter(|e| kept.contains(e.source.as_str()) && kept.contains(e.target.as_str()))
		.map(Arc::clone)
		.collect();

	let filtered = Graph::from_shared(nodes, edges);
	debug!(
		"filter kept {}/{} nodes, {}/{} edges",
		filtered.node_count(),
		graph.node_count(),
		filtered.edge_count(),
		graph.edge_count()
	);
	filtered
}
