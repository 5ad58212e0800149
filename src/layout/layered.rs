//! Layered layouts: the flow (sankey style) diagram and ranked boxes.
//!
//! Both start from a layer assignment over the edges. The flow diagram uses
//! it directly; the hierarchy asks a [`RankEngine`] for node centres and
//! converts them to top-left boxes with cardinality-labelled edges.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use super::{Anchor, Handles, LayoutOutput, PathDescriptor, Point, PositionedNode, RoutedEdge, Side};
use crate::graph::{Edge, Graph};

/// How layers are derived from the BFS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayeringMode {
	/// Layer fixed when a node is first dequeued: its shortest distance from
	/// any root.
	#[default]
	FirstVisit,
	/// Longest distance from a root among reached nodes, capped for cycles.
	LongestPath,
}

/// Layer per reached node, plus nodes grouped by layer in graph order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layering {
	/// Layer index per node id.
	pub layer_of: HashMap<String, usize>,
	/// Node ids per layer.
	pub layers: Vec<Vec<String>>,
}

impl Layering {
	/// Layer of `id`, if it was reached.
	pub fn layer(&self, id: &str) -> Option<usize> {
		self.layer_of.get(id).copied()
	}

	/// Whether no node was reached.
	pub fn is_empty(&self) -> bool {
		self.layers.is_empty()
	}
}

/// Ids of nodes that no edge targets, dangling edges included.
pub fn roots(graph: &Graph) -> Vec<&str> {
	let targeted: HashSet<&str> = graph.edges().iter().map(|e| e.target.as_str()).collect();
	graph
		.nodes()
		.iter()
		.map(|n| n.id.as_str())
		.filter(|id| !targeted.contains(id))
		.collect()
}

/// Multi-source FIFO BFS. Children are expanded only on a node's first
/// dequeue, and only towards ids in `ids`.
fn first_visit(ids: &[&str], children: &HashMap<&str, Vec<&str>>, seeds: &[&str], layer: &mut HashMap<String, usize>) {
	let known: HashSet<&str> = ids.iter().copied().collect();
	let mut queue: VecDeque<(&str, usize)> = seeds.iter().map(|id| (*id, 0)).collect();
	while let Some((id, depth)) = queue.pop_front() {
		if layer.contains_key(id) {
			continue;
		}
		layer.insert(id.to_string(), depth);
		for child in children.get(id).into_iter().flatten() {
			if known.contains(child) && !layer.contains_key(*child) {
				queue.push_back((*child, depth + 1));
			}
		}
	}
}

/// Raise each reached target to one past its deepest reached source.
/// Values never exceed `reached - 1`, so cycles terminate.
fn relax_longest(layer: &mut HashMap<String, usize>, edges: &[(&str, &str)]) {
	let cap = layer.len().saturating_sub(1);
	let mut changed = true;
	let mut rounds = 0;
	while changed && rounds <= cap {
		changed = false;
		rounds += 1;
		for &(s, t) in edges {
			if s == t {
				continue;
			}
			let (Some(&ls), Some(&lt)) = (layer.get(s), layer.get(t)) else {
				continue;
			};
			let want = (ls + 1).min(cap);
			if want > lt {
				layer.insert(t.to_string(), want);
				changed = true;
			}
		}
	}
}

/// Group `ids` (in order) into buckets, dropping empty layers and
/// renumbering so layer indices are contiguous.
fn bucket(ids: &[&str], mut layer: HashMap<String, usize>) -> Layering {
	let Some(max) = layer.values().copied().max() else {
		return Layering::default();
	};
	let mut buckets: Vec<Vec<String>> = vec![Vec::new(); max + 1];
	for id in ids {
		if let Some(&l) = layer.get(*id) {
			buckets[l].push((*id).to_string());
		}
	}
	buckets.retain(|b| !b.is_empty());
	for (i, members) in buckets.iter().enumerate() {
		for id in members {
			layer.insert(id.clone(), i);
		}
	}
	Layering {
		layer_of: layer,
		layers: buckets,
	}
}

fn children_of<'a>(edges: &[(&'a str, &'a str)]) -> HashMap<&'a str, Vec<&'a str>> {
	let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
	for &(s, t) in edges {
		children.entry(s).or_default().push(t);
	}
	children
}

/// Assign layers to the nodes reachable from [`roots`]. Nodes no root
/// reaches (fully cyclic components) are left out.
pub fn assign_layers(graph: &Graph, mode: LayeringMode) -> Layering {
	let ids: Vec<&str> = graph.nodes().iter().map(|n| n.id.as_str()).collect();
	let edges: Vec<(&str, &str)> = graph
		.edges()
		.iter()
		.map(|e| (e.source.as_str(), e.target.as_str()))
		.collect();
	let mut layer = HashMap::new();
	first_visit(&ids, &children_of(&edges), &roots(graph), &mut layer);
	if mode == LayeringMode::LongestPath {
		relax_longest(&mut layer, &edges);
	}
	bucket(&ids, layer)
}

/// Main axis of a layered drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlowDirection {
	/// Layers advance left to right.
	#[default]
	Horizontal,
	/// Layers advance top to bottom.
	Vertical,
}

impl FlowDirection {
	/// Edge attachment sides for box layouts.
	pub fn handles(self) -> Handles {
		match self {
			FlowDirection::Horizontal => Handles {
				source: Side::Right,
				target: Side::Left,
			},
			FlowDirection::Vertical => Handles {
				source: Side::Bottom,
				target: Side::Top,
			},
		}
	}
}

/// Flow diagram parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct FlowConfig {
	/// Canvas width.
	pub width: f64,
	/// Canvas height.
	pub height: f64,
	/// Node extent along the flow axis.
	pub node_thickness: f64,
	/// Gap between nodes of a layer, and at the layer ends.
	pub padding: f64,
	/// Smallest node extent across the flow axis.
	pub min_extent: f64,
	/// Extent granted per incident edge.
	pub extent_per_connection: f64,
	/// Spacing multiplier applied to `padding`.
	pub density: f64,
	/// Flow axis.
	pub direction: FlowDirection,
	/// Layer assignment rule.
	pub layering: LayeringMode,
}

impl Default for FlowConfig {
	fn default() -> Self {
		Self {
			width: 800.0,
			height: 600.0,
			node_thickness: 20.0,
			padding: 30.0,
			min_extent: 20.0,
			extent_per_connection: 10.0,
			density: 1.0,
			direction: FlowDirection::Horizontal,
			layering: LayeringMode::FirstVisit,
		}
	}
}

/// Route from the trailing side of `from` to the leading side of `to` with
/// both control points at the midpoint of the flow axis.
fn flow_route(from: &PositionedNode, to: &PositionedNode, direction: FlowDirection) -> PathDescriptor {
	match direction {
		FlowDirection::Horizontal => {
			let (x0, y0) = (from.x + from.width, from.y + from.height / 2.0);
			let (x1, y1) = (to.x, to.y + to.height / 2.0);
			let xi = (x0 + x1) / 2.0;
			PathDescriptor::Cubic {
				from: Point::new(x0, y0),
				control1: Point::new(xi, y0),
				control2: Point::new(xi, y1),
				to: Point::new(x1, y1),
			}
		}
		FlowDirection::Vertical => {
			let (x0, y0) = (from.x + from.width / 2.0, from.y + from.height);
			let (x1, y1) = (to.x + to.width / 2.0, to.y);
			let yi = (y0 + y1) / 2.0;
			PathDescriptor::Cubic {
				from: Point::new(x0, y0),
				control1: Point::new(x0, yi),
				control2: Point::new(x1, yi),
				to: Point::new(x1, y1),
			}
		}
	}
}

/// Flow diagram over the layers reachable from the roots. Node boxes grow
/// with their incident-edge count; unreached nodes are omitted.
pub fn flow_layout(graph: &Graph, config: &FlowConfig) -> LayoutOutput {
	let mut output = LayoutOutput::empty(config.width, config.height);
	output.anchor = Anchor::TopLeft;
	let layering = assign_layers(graph, config.layering);
	if layering.is_empty() {
		return output;
	}

	let (along, across) = match config.direction {
		FlowDirection::Horizontal => (config.width, config.height),
		FlowDirection::Vertical => (config.height, config.width),
	};
	let counts = graph.connection_counts();
	let pad = config.padding * config.density.max(0.0);
	let gap = (along - config.node_thickness) / (layering.layers.len().saturating_sub(1).max(1)) as f64;

	let mut placed: HashMap<&str, usize> = HashMap::new();
	for (li, ids) in layering.layers.iter().enumerate() {
		let k = ids.len() as f64;
		let extent = ((across - 2.0 * pad - pad * (k - 1.0)) / k).max(config.min_extent);
		for (ni, id) in ids.iter().enumerate() {
			let Some(node) = graph.node(id) else {
				continue;
			};
			let value = counts.get(id.as_str()).copied().unwrap_or(0) as f64;
			let a = li as f64 * gap + config.node_thickness / 2.0;
			let c = pad + ni as f64 * (extent + pad);
			let c_size = extent.max(value * config.extent_per_connection);
			let positioned = match config.direction {
				FlowDirection::Horizontal => PositionedNode::new(node, a, c, config.node_thickness, c_size),
				FlowDirection::Vertical => PositionedNode::new(node, c, a, c_size, config.node_thickness),
			};
			placed.insert(node.id.as_str(), output.nodes.len());
			output.nodes.push(positioned);
		}
	}

	output.edges = graph
		.edges()
		.iter()
		.filter_map(|e| {
			let from = &output.nodes[*placed.get(e.source.as_str())?];
			let to = &output.nodes[*placed.get(e.target.as_str())?];
			Some(RoutedEdge::new(e, flow_route(from, to, config.direction)))
		})
		.collect();
	debug!(
		"flow layout: {} layers, {} of {} nodes reached",
		layering.layers.len(),
		output.nodes.len(),
		graph.node_count()
	);
	output
}

/// One end of a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Multiplicity {
	/// At most one edge shares this (node, predicate).
	One,
	/// Several edges share this (node, predicate).
	Many,
}

impl fmt::Display for Multiplicity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Multiplicity::One => "1",
			Multiplicity::Many => "N",
		})
	}
}

/// Cardinality of one edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Cardinality {
	/// Derived from edges sharing (source, predicate).
	pub source: Multiplicity,
	/// Derived from edges sharing (target, predicate).
	pub target: Multiplicity,
}

impl Cardinality {
	/// Both ends many.
	pub fn is_many_to_many(&self) -> bool {
		self.source == Multiplicity::Many && self.target == Multiplicity::Many
	}

	/// Exactly one end many.
	pub fn is_one_to_many(&self) -> bool {
		(self.source == Multiplicity::Many) != (self.target == Multiplicity::Many)
	}
}

impl fmt::Display for Cardinality {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}→{}", self.source, self.target)
	}
}

/// Cardinality per edge, in edge order.
pub fn cardinalities(graph: &Graph) -> Vec<Cardinality> {
	let mut out_count: HashMap<(&str, &str), usize> = HashMap::new();
	let mut in_count: HashMap<(&str, &str), usize> = HashMap::new();
	for e in graph.edges() {
		*out_count.entry((e.source.as_str(), e.predicate.as_str())).or_default() += 1;
		*in_count.entry((e.target.as_str(), e.predicate.as_str())).or_default() += 1;
	}
	let side = |n: Option<&usize>| {
		if n.copied().unwrap_or(0) > 1 {
			Multiplicity::Many
		} else {
			Multiplicity::One
		}
	};
	graph
		.edges()
		.iter()
		.map(|e| Cardinality {
			source: side(out_count.get(&(e.source.as_str(), e.predicate.as_str()))),
			target: side(in_count.get(&(e.target.as_str(), e.predicate.as_str()))),
		})
		.collect()
}

/// Edge caption such as `worksFor (N→1)`.
pub fn cardinality_label(edge: &Edge, cardinality: Cardinality) -> String {
	format!("{} ({cardinality})", edge.predicate)
}

/// Spacing presets for the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Density {
	/// Wide gaps.
	#[default]
	Spacious,
	/// Tight gaps.
	Compact,
}

impl Density {
	/// Gap between ranks.
	pub fn rank_sep(self) -> f64 {
		match self {
			Density::Spacious => 180.0,
			Density::Compact => 120.0,
		}
	}

	/// Gap between nodes of a rank.
	pub fn node_sep(self) -> f64 {
		match self {
			Density::Spacious => 110.0,
			Density::Compact => 70.0,
		}
	}
}

/// Hierarchy parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct HierarchyConfig {
	/// Rank axis.
	pub direction: FlowDirection,
	/// Spacing preset.
	pub density: Density,
	/// Box width.
	pub node_width: f64,
	/// Box height.
	pub node_height: f64,
	/// Space around the drawing.
	pub margin: f64,
	/// Column pitch for nodes the engine did not place.
	pub fallback_spacing_x: f64,
	/// Row pitch for nodes the engine did not place.
	pub fallback_spacing_y: f64,
}

impl Default for HierarchyConfig {
	fn default() -> Self {
		Self {
			direction: FlowDirection::Horizontal,
			density: Density::Spacious,
			node_width: 240.0,
			node_height: 120.0,
			margin: 32.0,
			fallback_spacing_x: 220.0,
			fallback_spacing_y: 140.0,
		}
	}
}

/// A box to be ranked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankNode<'a> {
	/// Node id.
	pub id: &'a str,
	/// Box width.
	pub width: f64,
	/// Box height.
	pub height: f64,
}

/// Input handed to a [`RankEngine`].
#[derive(Debug, Clone, PartialEq)]
pub struct RankRequest<'a> {
	/// Boxes in graph order.
	pub nodes: Vec<RankNode<'a>>,
	/// Resolved, non-loop edges as (source, target).
	pub edges: Vec<(&'a str, &'a str)>,
	/// Rank axis.
	pub direction: FlowDirection,
	/// Gap between ranks.
	pub rank_sep: f64,
	/// Gap between boxes of a rank.
	pub node_sep: f64,
	/// Space around the drawing.
	pub margin: f64,
}

/// Computes box centres for a ranked drawing.
///
/// Ids missing from the result are placed on a fallback grid.
pub trait RankEngine {
	/// Centre of each placed box.
	fn place(&self, request: &RankRequest<'_>) -> HashMap<String, Point>;
}

/// Built-in engine: BFS ranks (every component seeded, so cycles are
/// placed too), one barycentre ordering sweep and centred ranks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayeredRanks {
	/// Rank assignment rule.
	pub mode: LayeringMode,
}

impl RankEngine for LayeredRanks {
	fn place(&self, request: &RankRequest<'_>) -> HashMap<String, Point> {
		let ids: Vec<&str> = request.nodes.iter().map(|n| n.id).collect();
		let size: HashMap<&str, (f64, f64)> = request.nodes.iter().map(|n| (n.id, (n.width, n.height))).collect();
		let children = children_of(&request.edges);
		let targeted: HashSet<&str> = request.edges.iter().map(|(_, t)| *t).collect();
		let seeds: Vec<&str> = ids.iter().copied().filter(|id| !targeted.contains(id)).collect();

		let mut layer = HashMap::new();
		first_visit(&ids, &children, &seeds, &mut layer);
		while let Some(next) = ids.iter().find(|id| !layer.contains_key(**id)) {
			first_visit(&ids, &children, &[*next], &mut layer);
		}
		if self.mode == LayeringMode::LongestPath {
			relax_longest(&mut layer, &request.edges);
		}
		let mut ranks = bucket(&ids, layer).layers;

		for r in 1..ranks.len() {
			let prev: HashMap<&str, usize> = ranks[r - 1].iter().enumerate().map(|(i, id)| (id.as_str(), i)).collect();
			let mut keyed: Vec<(String, f64)> = ranks[r]
				.iter()
				.enumerate()
				.map(|(i, id)| {
					let parents: Vec<f64> = request
						.edges
						.iter()
						.filter(|(_, t)| *t == id.as_str())
						.filter_map(|(s, _)| prev.get(s).map(|&p| p as f64))
						.collect();
					let key = if parents.is_empty() {
						i as f64
					} else {
						parents.iter().sum::<f64>() / parents.len() as f64
					};
					(id.clone(), key)
				})
				.collect();
			keyed.sort_by(|a, b| a.1.total_cmp(&b.1));
			ranks[r] = keyed.into_iter().map(|(id, _)| id).collect();
		}

		// (along the rank axis, across it)
		let extents = |id: &str| {
			let (w, h) = size.get(id).copied().unwrap_or_default();
			match request.direction {
				FlowDirection::Horizontal => (w, h),
				FlowDirection::Vertical => (h, w),
			}
		};
		let thickness: Vec<f64> = ranks
			.iter()
			.map(|rank| rank.iter().map(|id| extents(id.as_str()).0).fold(0.0, f64::max))
			.collect();
		let spans: Vec<f64> = ranks
			.iter()
			.map(|rank| {
				rank.iter().map(|id| extents(id.as_str()).1).sum::<f64>()
					+ request.node_sep * rank.len().saturating_sub(1) as f64
			})
			.collect();
		let widest = spans.iter().copied().fold(0.0, f64::max);

		let mut centres = HashMap::new();
		let mut along = request.margin;
		for ((rank, thick), span) in ranks.iter().zip(&thickness).zip(&spans) {
			let mut across = request.margin + (widest - span) / 2.0;
			for id in rank {
				let (_, cross) = extents(id.as_str());
				let a = along + thick / 2.0;
				let c = across + cross / 2.0;
				let centre = match request.direction {
					FlowDirection::Horizontal => Point::new(a, c),
					FlowDirection::Vertical => Point::new(c, a),
				};
				centres.insert(id.clone(), centre);
				across += cross + request.node_sep;
			}
			along += thick + request.rank_sep;
		}
		centres
	}
}

/// Ranked boxes with cardinality-labelled edges. `engine` supplies centres,
/// which are converted to top-left corners.
pub fn hierarchical_layout<E>(graph: &Graph, config: &HierarchyConfig, engine: &E) -> LayoutOutput
where
	E: RankEngine + ?Sized,
{
	let mut output = LayoutOutput::empty(0.0, 0.0);
	output.anchor = Anchor::TopLeft;
	output.handles = Some(config.direction.handles());
	if graph.is_empty() {
		return output;
	}

	let request = RankRequest {
		nodes: graph
			.nodes()
			.iter()
			.map(|n| RankNode {
				id: n.id.as_str(),
				width: config.node_width,
				height: config.node_height,
			})
			.collect(),
		edges: graph
			.resolved_edges()
			.into_iter()
			.filter(|e| e.source != e.target)
			.map(|e| (e.source.as_str(), e.target.as_str()))
			.collect(),
		direction: config.direction,
		rank_sep: config.density.rank_sep(),
		node_sep: config.density.node_sep(),
		margin: config.margin,
	};
	let centres = engine.place(&request);

	let cols = (graph.node_count() as f64).sqrt().ceil().max(1.0) as usize;
	let (w, h) = (config.node_width, config.node_height);
	let mut placed: HashMap<&str, usize> = HashMap::new();
	for (idx, node) in graph.nodes().iter().enumerate() {
		let centre = centres.get(&node.id).copied().unwrap_or_else(|| {
			Point::new(
				(idx % cols) as f64 * config.fallback_spacing_x,
				(idx / cols) as f64 * config.fallback_spacing_y,
			)
		});
		placed.insert(node.id.as_str(), output.nodes.len());
		output
			.nodes
			.push(PositionedNode::new(node, centre.x - w / 2.0, centre.y - h / 2.0, w, h));
	}

	let cards = cardinalities(graph);
	for (edge, card) in graph.edges().iter().zip(cards) {
		let (Some(&s), Some(&t)) = (placed.get(edge.source.as_str()), placed.get(edge.target.as_str())) else {
			continue;
		};
		let path = flow_route(&output.nodes[s], &output.nodes[t], config.direction);
		let mut routed = RoutedEdge::new(edge, path);
		routed.label = Some(cardinality_label(edge, card));
		output.edges.push(routed);
	}

	output.width = output.nodes.iter().map(|n| n.x + n.width).fold(0.0, f64::max) + config.margin;
	output.height = output.nodes.iter().map(|n| n.y + n.height).fold(0.0, f64::max) + config.margin;
	output
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::Node;
	use pretty_assertions::assert_eq;

	fn graph(ids: &[&str], edges: &[(&str, &str, &str)]) -> Graph {
		Graph::new(
			ids.iter().map(|id| Node::new(*id, "T", id.to_uppercase())).collect(),
			edges.iter().map(|(s, t, p)| Edge::new(*s, *t, *p)).collect(),
		)
		.unwrap()
	}

	#[test]
	fn chain_layers() {
		let g = graph(&["a", "b", "c"], &[("a", "b", "p"), ("b", "c", "p")]);
		for mode in [LayeringMode::FirstVisit, LayeringMode::LongestPath] {
			let l = assign_layers(&g, mode);
			assert_eq!((l.layer("a"), l.layer("b"), l.layer("c")), (Some(0), Some(1), Some(2)));
			assert_eq!(l.layers, vec![vec!["a"], vec!["b"], vec!["c"]]);
		}
	}

	#[test]
	fn first_visit_undercounts_shortcuts() {
		let g = graph(&["a", "b", "c"], &[("a", "b", "p"), ("b", "c", "p"), ("a", "c", "p")]);
		assert_eq!(assign_layers(&g, LayeringMode::FirstVisit).layer("c"), Some(1));
		assert_eq!(assign_layers(&g, LayeringMode::LongestPath).layer("c"), Some(2));
	}

	#[test]
	fn cycles_without_roots_are_dropped() {
		let g = graph(&["r", "a", "b"], &[("a", "b", "p"), ("b", "a", "p")]);
		let l = assign_layers(&g, LayeringMode::FirstVisit);
		assert_eq!(l.layers, vec![vec!["r"]]);
		assert_eq!(l.layer("a"), None);

		let g = graph(&["a", "b"], &[("a", "b", "p"), ("b", "a", "p")]);
		assert!(assign_layers(&g, LayeringMode::LongestPath).is_empty());
		assert!(flow_layout(&g, &FlowConfig::default()).is_empty());
	}

	#[test]
	fn dangling_source_disqualifies_root() {
		let g = graph(&["a", "b"], &[("ghost", "a", "p"), ("a", "b", "p")]);
		assert!(roots(&g).is_empty());
		let g = graph(&["a", "b"], &[("a", "ghost", "p")]);
		assert_eq!(roots(&g), vec!["a", "b"]);
	}

	#[test]
	fn longest_path_terminates_on_reachable_cycle() {
		let g = graph(&["r", "a", "b"], &[("r", "a", "p"), ("a", "b", "p"), ("b", "a", "p")]);
		let l = assign_layers(&g, LayeringMode::LongestPath);
		assert!(l.layer("a").unwrap() <= 2 && l.layer("b").unwrap() <= 2);
	}

	#[test]
	fn horizontal_flow_geometry() {
		let g = graph(&["a", "b"], &[("a", "b", "p")]);
		let out = flow_layout(&g, &FlowConfig::default());
		let (a, b) = (out.node("a").unwrap(), out.node("b").unwrap());
		assert_eq!((a.x, a.y, a.width, a.height), (10.0, 30.0, 20.0, 540.0));
		assert_eq!(b.x, 790.0);
		assert_eq!(
			out.edges[0].path,
			PathDescriptor::Cubic {
				from: Point::new(30.0, 300.0),
				control1: Point::new(410.0, 300.0),
				control2: Point::new(410.0, 300.0),
				to: Point::new(790.0, 300.0),
			}
		);
	}

	#[test]
	fn busy_nodes_grow_past_layer_share() {
		let ids = ["r", "a", "b", "c", "d", "e", "f", "g", "h", "i", "j"];
		let edges: Vec<(&str, &str, &str)> = ids[1..].iter().map(|t| ("r", *t, "p")).collect();
		let out = flow_layout(&graph(&ids, &edges), &FlowConfig::default());
		// Ten siblings share 540 minus nine gaps; the root carries ten edges.
		assert_eq!(out.node("a").unwrap().height, 27.0);
		assert_eq!(out.node("r").unwrap().height, 540.0);
	}

	#[test]
	fn vertical_flow_swaps_axes() {
		let g = graph(&["a", "b"], &[("a", "b", "p")]);
		let cfg = FlowConfig {
			direction: FlowDirection::Vertical,
			..FlowConfig::default()
		};
		let out = flow_layout(&g, &cfg);
		let (a, b) = (out.node("a").unwrap(), out.node("b").unwrap());
		assert_eq!((a.x, a.y, a.width, a.height), (30.0, 10.0, 740.0, 20.0));
		assert_eq!(b.y, 590.0);
		assert_eq!(out.edges[0].path.start(), Point::new(400.0, 30.0));
		assert_eq!(out.edges[0].path.end(), Point::new(400.0, 590.0));
	}

	#[test]
	fn cardinality_labels() {
		let g = graph(
			&["a", "b", "c", "d"],
			&[("a", "b", "p"), ("a", "c", "p"), ("d", "b", "q"), ("d", "b", "p")],
		);
		let cards = cardinalities(&g);
		let labels: Vec<String> = g.edges().iter().zip(&cards).map(|(e, c)| cardinality_label(e, *c)).collect();
		assert_eq!(labels, vec!["p (N→N)", "p (N→1)", "q (1→1)", "p (1→N)"]);
		assert!(cards[0].is_many_to_many());
		assert!(cards[1].is_one_to_many() && cards[3].is_one_to_many());
		assert!(!cards[2].is_one_to_many());
	}

	#[test]
	fn hierarchy_boxes_and_handles() {
		let g = graph(&["a", "b"], &[("a", "b", "p")]);
		let out = hierarchical_layout(&g, &HierarchyConfig::default(), &LayeredRanks::default());
		assert_eq!(out.anchor, Anchor::TopLeft);
		assert_eq!(out.node("a").unwrap().point(), Point::new(32.0, 32.0));
		assert_eq!(out.node("b").unwrap().point(), Point::new(452.0, 32.0));
		assert_eq!(out.handles, Some(FlowDirection::Horizontal.handles()));
		assert_eq!(out.edges[0].label.as_deref(), Some("p (1→1)"));
		assert_eq!(out.edges[0].path.start(), Point::new(272.0, 92.0));
		assert_eq!((out.width, out.height), (724.0, 184.0));

		let cfg = HierarchyConfig {
			direction: FlowDirection::Vertical,
			density: Density::Compact,
			..HierarchyConfig::default()
		};
		let out = hierarchical_layout(&g, &cfg, &LayeredRanks::default());
		assert_eq!(out.node("b").unwrap().point(), Point::new(32.0, 272.0));
		assert_eq!(
			out.handles,
			Some(Handles {
				source: Side::Bottom,
				target: Side::Top
			})
		);
	}

	#[test]
	fn hierarchy_places_cycles() {
		let g = graph(&["a", "b"], &[("a", "b", "p"), ("b", "a", "p")]);
		let out = hierarchical_layout(&g, &HierarchyConfig::default(), &LayeredRanks::default());
		let (a, b) = (out.node("a").unwrap(), out.node("b").unwrap());
		assert!(a.x < b.x);
		assert_eq!(out.edges.len(), 2);
	}

	struct Nothing;

	impl RankEngine for Nothing {
		fn place(&self, _: &RankRequest<'_>) -> HashMap<String, Point> {
			HashMap::new()
		}
	}

	#[test]
	fn unplaced_nodes_use_fallback_grid() {
		let g = graph(&["a", "b", "c"], &[]);
		let out = hierarchical_layout(&g, &HierarchyConfig::default(), &Nothing);
		let corners: Vec<Point> = out.nodes.iter().map(PositionedNode::point).collect();
		assert_eq!(
			corners,
			vec![Point::new(-120.0, -60.0), Point::new(100.0, -60.0), Point::new(-120.0, 80.0)]
		);
	}
}
