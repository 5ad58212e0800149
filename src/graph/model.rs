//! Canonical node/edge representation.
//!
//! A [`Graph`] is rebuilt from scratch on every document or filter change and
//! is never mutated afterwards. Nodes and edges sit behind [`Arc`] so derived
//! graphs (filtered, patched) share them instead of copying.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use log::warn;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{GraphError, Result};

/// Type assigned to entities whose type cannot be resolved.
pub const DEFAULT_TYPE: &str = "Thing";

/// A literal property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
	/// JSON `null`.
	Null,
	/// Boolean literal.
	Bool(bool),
	/// Numeric literal.
	Number(f64),
	/// String literal.
	String(String),
}

impl fmt::Display for Literal {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Literal::Null => f.write_str("null"),
			Literal::Bool(b) => write!(f, "{b}"),
			Literal::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 => {
				write!(f, "{}", *n as i64)
			}
			Literal::Number(n) => write!(f, "{n}"),
			Literal::String(s) => f.write_str(s),
		}
	}
}

impl From<&str> for Literal {
	fn from(s: &str) -> Self {
		Literal::String(s.to_string())
	}
}

impl From<String> for Literal {
	fn from(s: String) -> Self {
		Literal::String(s)
	}
}

impl From<f64> for Literal {
	fn from(n: f64) -> Self {
		Literal::Number(n)
	}
}

impl From<bool> for Literal {
	fn from(b: bool) -> Self {
		Literal::Bool(b)
	}
}

/// Insertion-ordered map from property name to literal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties(Vec<(String, Literal)>);

impl Properties {
	/// Empty property map.
	pub fn new() -> Self {
		Self::default()
	}

	/// Insert or replace a value, keeping the original position on replace.
	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Literal>) {
		let key = key.into();
		let value = value.into();
		match self.0.iter_mut().find(|(k, _)| *k == key) {
			Some(slot) => slot.1 = value,
			None => self.0.push((key, value)),
		}
	}

	/// Look up a value by key.
	pub fn get(&self, key: &str) -> Option<&Literal> {
		self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
	}

	/// Whether `key` is present.
	pub fn contains_key(&self, key: &str) -> bool {
		self.get(key).is_some()
	}

	/// Iterate entries in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &Literal)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v))
	}

	/// Iterate values in insertion order.
	pub fn values(&self) -> impl Iterator<Item = &Literal> {
		self.0.iter().map(|(_, v)| v)
	}

	/// Number of entries.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Whether there are no entries.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl<K: Into<String>, V: Into<Literal>> FromIterator<(K, V)> for Properties {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let mut props = Properties::new();
		for (k, v) in iter {
			props.insert(k, v);
		}
		props
	}
}

impl Serialize for Properties {
	fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
		serializer.collect_map(self.0.iter().map(|(k, v)| (k, v)))
	}
}

impl<'de> Deserialize<'de> for Properties {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
		let map = serde_json::Map::<String, serde_json::Value>::deserialize(deserializer)?;
		let mut props = Properties::new();
		for (key, value) in map {
			let literal = serde_json::from_value::<Literal>(value).map_err(D::Error::custom)?;
			props.insert(key, literal);
		}
		Ok(props)
	}
}

/// A typed entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
	/// Globally unique id.
	pub id: String,
	/// Short type name.
	#[serde(rename = "type")]
	pub node_type: String,
	/// Human-readable label.
	pub label: String,
	/// Literal properties, reserved keywords excluded.
	#[serde(default)]
	pub properties: Properties,
}

impl Node {
	/// Node with no properties.
	pub fn new(id: impl Into<String>, node_type: impl Into<String>, label: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			node_type: node_type.into(),
			label: label.into(),
			properties: Properties::new(),
		}
	}

	/// Builder: attach a property.
	pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Literal>) -> Self {
		self.properties.insert(key, value);
		self
	}
}

/// A directed, named relationship. Endpoints need not resolve to nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
	/// Source node id.
	pub source: String,
	/// Target node id.
	pub target: String,
	/// Relationship name.
	pub predicate: String,
}

impl Edge {
	/// Create an edge.
	pub fn new(source: impl Into<String>, target: impl Into<String>, predicate: impl Into<String>) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
			predicate: predicate.into(),
		}
	}

	/// Whether `id` is one of the endpoints.
	pub fn touches(&self, id: &str) -> bool {
		self.source == id || self.target == id
	}
}

/// Ordered nodes (unique ids) and ordered edges.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Graph {
	nodes: Vec<Arc<Node>>,
	edges: Vec<Arc<Edge>>,
	#[serde(skip)]
	index: HashMap<String, usize>,
}

fn index_of(nodes: &[Arc<Node>]) -> HashMap<String, usize> {
	nodes.iter().enumerate().map(|(i, n)| (n.id.clone(), i)).collect()
}

impl Graph {
	/// Build a graph, rejecting repeated node ids.
	pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Result<Self> {
		let mut seen = HashSet::with_capacity(nodes.len());
		for node in &nodes {
			if !seen.insert(node.id.as_str()) {
				return Err(GraphError::DuplicateNode(node.id.clone()));
			}
		}
		let nodes: Vec<_> = nodes.into_iter().map(Arc::new).collect();
		Ok(Self::from_shared(nodes, edges.into_iter().map(Arc::new).collect()))
	}

	/// Assemble from already-shared parts. Callers guarantee id uniqueness.
	pub(crate) fn from_shared(nodes: Vec<Arc<Node>>, edges: Vec<Arc<Edge>>) -> Self {
		let index = index_of(&nodes);
		Self { nodes, edges, index }
	}

	/// Nodes in discovery order.
	pub fn nodes(&self) -> &[Arc<Node>] {
		&self.nodes
	}

	/// Edges in emission order.
	pub fn edges(&self) -> &[Arc<Edge>] {
		&self.edges
	}

	/// Number of nodes.
	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}

	/// Number of edges, dangling ones included.
	pub fn edge_count(&self) -> usize {
		self.edges.len()
	}

	/// Whether the graph has no nodes.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Find a node by id.
	pub fn node(&self, id: &str) -> Option<&Arc<Node>> {
		self.index.get(id).map(|&i| &self.nodes[i])
	}

	/// Whether a node with `id` exists.
	pub fn contains_node(&self, id: &str) -> bool {
		self.node(id).is_some()
	}

	/// Set of node ids, for endpoint resolution.
	pub fn node_ids(&self) -> HashSet<&str> {
		self.nodes.iter().map(|n| n.id.as_str()).collect()
	}

	/// Edges whose endpoints both resolve, in order.
	pub fn resolved_edges(&self) -> Vec<&Arc<Edge>> {
		let ids = self.node_ids();
		self.edges
			.iter()
			.filter(|e| ids.contains(e.source.as_str()) && ids.contains(e.target.as_str()))
			.collect()
	}

	/// Edges leaving `id`.
	pub fn outgoing<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Arc<Edge>> + 'a {
		self.edges.iter().filter(move |e| e.source == id)
	}

	/// Edges arriving at `id`.
	pub fn incoming<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Arc<Edge>> + 'a {
		self.edges.iter().filter(move |e| e.target == id)
	}

	/// Incident-edge count per id over every edge; a self-loop counts twice.
	pub fn connection_counts(&self) -> HashMap<&str, usize> {
		let mut counts: HashMap<&str, usize> = HashMap::new();
		for edge in &self.edges {
			*counts.entry(edge.source.as_str()).or_default() += 1;
			*counts.entry(edge.target.as_str()).or_default() += 1;
		}
		counts
	}

	/// New graph with the node matching `patched.id` replaced. Every other
	/// node and every edge is shared with `self`.
	pub fn with_node_replaced(&self, patched: Node) -> Result<Self> {
		let Some(&pos) = self.index.get(&patched.id) else {
			warn!("patched node `{}` is not part of the graph", patched.id);
			return Err(GraphError::UnknownNode(patched.id));
		};
		let mut nodes = self.nodes.clone();
		nodes[pos] = Arc::new(patched);
		Ok(Self::from_shared(nodes, self.edges.clone()))
	}

	/// Summary counts for display.
	pub fn stats(&self) -> GraphStats {
		let ids = self.node_ids();
		let counts = self.connection_counts();
		let mut types: Vec<(String, usize)> = Vec::new();
		for node in &self.nodes {
			match types.iter_mut().find(|(t, _)| *t == node.node_type) {
				Some((_, n)) => *n += 1,
				None => types.push((node.node_type.clone(), 1)),
			}
		}
		GraphStats {
			node_count: self.nodes.len(),
			edge_count: self.edges.len(),
			dangling_edges: self
				.edges
				.iter()
				.filter(|e| !ids.contains(e.source.as_str()) || !ids.contains(e.target.as_str()))
				.count(),
			isolated_nodes: self
				.nodes
				.iter()
				.filter(|n| !counts.contains_key(n.id.as_str()))
				.count(),
			types,
		}
	}
}

/// Summary of a graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
	/// Number of nodes.
	pub node_count: usize,
	/// Number of edges.
	pub edge_count: usize,
	/// Edges with at least one unresolved endpoint.
	pub dangling_edges: usize,
	/// Nodes with no incident edge.
	pub isolated_nodes: usize,
	/// Node count per type, in first-seen order.
	pub types: Vec<(String, usize)>,
}

/// Precomputed incident edges per node, for hover highlighting.
#[derive(Debug, Clone, Default)]
pub struct Incidence {
	incident: HashMap<String, Vec<Arc<Edge>>>,
}

impl Incidence {
	/// Index every resolved edge of `graph` under both endpoints.
	pub fn build(graph: &Graph) -> Self {
		let mut incident: HashMap<String, Vec<Arc<Edge>>> = graph
			.nodes()
			.iter()
			.map(|n| (n.id.clone(), Vec::new()))
			.collect();
		for edge in graph.edges() {
			if !incident.contains_key(&edge.source) || !incident.contains_key(&edge.target) {
				continue;
			}
			if let Some(list) = incident.get_mut(&edge.source) {
				list.push(Arc::clone(edge));
			}
			if edge.target != edge.source {
				if let Some(list) = incident.get_mut(&edge.target) {
					list.push(Arc::clone(edge));
				}
			}
		}
		Self { incident }
	}

	/// Edges touching `id`.
	pub fn incident(&self, id: &str) -> &[Arc<Edge>] {
		self.incident.get(id).map(Vec::as_slice).unwrap_or(&[])
	}

	/// Ids at the other end of each incident edge (a self-loop yields `id`).
	pub fn neighbors<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a str> + 'a {
		self.incident(id).iter().map(move |e| {
			if e.source == id {
				e.target.as_str()
			} else {
				e.source.as_str()
			}
		})
	}

	/// Whether an edge joins `a` and `b` in either direction.
	pub fn adjacent(&self, a: &str, b: &str) -> bool {
		self.incident(a)
			.iter()
			.any(|e| (e.source == a && e.target == b) || (e.source == b && e.target == a))
	}

	/// `id` and its neighbors: the set a renderer keeps undimmed on hover.
	pub fn highlight(&self, id: &str) -> HashSet<String> {
		let mut set: HashSet<String> = self.neighbors(id).map(str::to_string).collect();
		if self.incident.contains_key(id) {
			set.insert(id.to_string());
		}
		set
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	fn sample() -> Graph {
		Graph::new(
			vec![
				Node::new("a", "Person", "A"),
				Node::new("b", "Person", "B"),
				Node::new("c", "Place", "C"),
			],
			vec![
				Edge::new("a", "b", "knows"),
				Edge::new("b", "c", "livesIn"),
				Edge::new("a", "ghost", "knows"),
				Edge::new("c", "c", "near"),
			],
		)
		.unwrap()
	}

	#[test]
	fn rejects_duplicate_ids() {
		let err = Graph::new(vec![Node::new("a", "T", "a"), Node::new("a", "T", "b")], vec![]);
		assert_eq!(err, Err(GraphError::DuplicateNode("a".into())));
	}

	#[test]
	fn incident_edges_by_direction() {
		let g = sample();
		let out: Vec<_> = g.outgoing("a").map(|e| e.target.as_str()).collect();
		assert_eq!(out, vec!["b", "ghost"]);
		let inc: Vec<_> = g.incoming("c").map(|e| e.predicate.as_str()).collect();
		assert_eq!(inc, vec!["livesIn", "near"]);
		assert_eq!(g.incoming("a").count(), 0);
		assert_eq!(g.outgoing("ghost").count(), 0);
	}

	#[test]
	fn lookup_by_id() {
		let g = sample();
		assert_eq!(g.node("c").map(|n| n.label.as_str()), Some("C"));
		assert!(g.contains_node("b"));
		assert!(!g.contains_node("ghost"));
		assert!(Graph::default().node("a").is_none());
	}

	#[test]
	fn resolved_edges_skip_dangling() {
		let g = sample();
		let resolved: Vec<_> = g.resolved_edges().iter().map(|e| e.predicate.as_str()).collect();
		assert_eq!(resolved, vec!["knows", "livesIn", "near"]);
	}

	#[test]
	fn self_loop_counts_twice() {
		let g = sample();
		let counts = g.connection_counts();
		assert_eq!(counts["c"], 3);
		assert_eq!(counts["a"], 2);
		assert_eq!(counts["ghost"], 1);
	}

	#[test]
	fn replacing_a_node_shares_the_rest() {
		let g = sample();
		let patched = Node::new("b", "Person", "Bee").with_property("age", 3.0);
		let g2 = g.with_node_replaced(patched).unwrap();
		assert_eq!(g2.node("b").unwrap().label, "Bee");
		assert!(Arc::ptr_eq(&g.nodes()[0], &g2.nodes()[0]));
		assert!(Arc::ptr_eq(&g.edges()[1], &g2.edges()[1]));
		assert_eq!(g.node("b").unwrap().label, "B");
	}

	#[test]
	fn replacing_unknown_node_fails() {
		let g = sample();
		assert_eq!(
			g.with_node_replaced(Node::new("zzz", "T", "z")),
			Err(GraphError::UnknownNode("zzz".into()))
		);
	}

	#[test]
	fn stats_count_types_and_dangling() {
		let s = sample().stats();
		assert_eq!(s.node_count, 3);
		assert_eq!(s.dangling_edges, 1);
		assert_eq!(s.isolated_nodes, 0);
		assert_eq!(s.types, vec![("Person".to_string(), 2), ("Place".to_string(), 1)]);
	}

	#[test]
	fn incidence_neighbors_and_highlight() {
		let g = sample();
		let inc = Incidence::build(&g);
		assert_eq!(inc.incident("a").len(), 1);
		assert_eq!(inc.neighbors("b").collect::<Vec<_>>(), vec!["a", "c"]);
		assert!(inc.adjacent("b", "a"));
		assert!(!inc.adjacent("a", "c"));
		let lit = inc.highlight("b");
		assert_eq!(lit.len(), 3);
		assert!(inc.highlight("nobody").is_empty());
	}

	#[test]
	fn literal_display_matches_plain_text() {
		assert_eq!(Literal::Number(3.0).to_string(), "3");
		assert_eq!(Literal::Number(2.5).to_string(), "2.5");
		assert_eq!(Literal::Bool(true).to_string(), "true");
		assert_eq!(Literal::from("x").to_string(), "x");
	}

	#[test]
	fn properties_keep_insertion_order() {
		let mut p = Properties::new();
		p.insert("z", 1.0);
		p.insert("a", "x");
		p.insert("z", 2.0);
		let keys: Vec<_> = p.iter().map(|(k, _)| k).collect();
		assert_eq!(keys, vec!["z", "a"]);
		assert_eq!(p.get("z"), Some(&Literal::Number(2.0)));
		let json = serde_json::to_string(&p).unwrap();
		assert_eq!(json, r#"{"z":2.0,"a":"x"}"#);
		let back: Properties = serde_json::from_str(&json).unwrap();
		assert_eq!(back, p);
	}
}
