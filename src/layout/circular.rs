//! Circle-based layouts: rings by type, chord, arc and bundled circle.
//!
//! Angles start at the top (-90°) and run clockwise in screen space. Node
//! order in the output always follows graph order, even where placement
//! order differs.

use std::collections::HashMap;
use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use super::{Anchor, LayoutOutput, PathDescriptor, Point, PositionedNode, RoutedEdge};
use crate::graph::Graph;

const TOP: f64 = -PI / 2.0;

/// Rings by type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct RadialConfig {
	/// Canvas width.
	pub width: f64,
	/// Canvas height.
	pub height: f64,
	/// Radius of the first ring.
	pub inner_radius: f64,
	/// Radial distance shared out between the rings.
	pub ring_span: f64,
	/// Marker radius.
	pub node_radius: f64,
}

impl Default for RadialConfig {
	fn default() -> Self {
		Self {
			width: 480.0,
			height: 480.0,
			inner_radius: 40.0,
			ring_span: 160.0,
			node_radius: 9.0,
		}
	}
}

/// Chord diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ChordConfig {
	/// Canvas width.
	pub width: f64,
	/// Canvas height.
	pub height: f64,
	/// Radius of the node arcs.
	pub outer_radius: f64,
	/// Radius where edges attach.
	pub inner_radius: f64,
	/// Share of each node's sector covered by its arc.
	pub arc_fill: f64,
	/// Stroke width of a node arc.
	pub band_width: f64,
}

impl Default for ChordConfig {
	fn default() -> Self {
		Self {
			width: 450.0,
			height: 450.0,
			outer_radius: 190.0,
			inner_radius: 170.0,
			arc_fill: 0.85,
			band_width: 10.0,
		}
	}
}

/// Arc diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ArcConfig {
	/// Canvas width.
	pub width: f64,
	/// Canvas height.
	pub height: f64,
	/// Distance of the node line above the bottom edge.
	pub baseline_offset: f64,
	/// Space left and right of the node line.
	pub side_margin: f64,
	/// Arc height per unit of horizontal distance.
	pub arc_factor: f64,
	/// Largest arc height.
	pub max_arc_height: f64,
	/// Marker radius.
	pub node_radius: f64,
}

impl Default for ArcConfig {
	fn default() -> Self {
		Self {
			width: 580.0,
			height: 320.0,
			baseline_offset: 50.0,
			side_margin: 50.0,
			arc_factor: 0.45,
			max_arc_height: 140.0,
			node_radius: 8.0,
		}
	}
}

/// Bundled circle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct BundleConfig {
	/// Canvas width.
	pub width: f64,
	/// Canvas height.
	pub height: f64,
	/// Circle radius.
	pub radius: f64,
	/// How far control points are pulled towards the centre, 0..1.
	pub tension: f64,
	/// Marker radius.
	pub node_radius: f64,
}

impl Default for BundleConfig {
	fn default() -> Self {
		Self {
			width: 480.0,
			height: 480.0,
			radius: 190.0,
			tension: 0.75,
			node_radius: 6.0,
		}
	}
}

/// Angle of slot `i` out of `n` evenly spaced slots, starting at the top.
fn slot_angle(i: usize, n: usize) -> f64 {
	i as f64 / n.max(1) as f64 * 2.0 * PI + TOP
}

/// Build output from per-node centres, routing every resolved edge with `route`.
fn assemble(
	graph: &Graph,
	mut output: LayoutOutput,
	centres: &HashMap<&str, Point>,
	size: f64,
	route: impl Fn(Point, Point) -> PathDescriptor,
) -> LayoutOutput {
	output.anchor = Anchor::Center;
	output.nodes = graph
		.nodes()
		.iter()
		.filter_map(|n| {
			let p = centres.get(n.id.as_str())?;
			Some(PositionedNode::new(n, p.x, p.y, size, size))
		})
		.collect();
	output.edges = graph
		.edges()
		.iter()
		.filter_map(|e| {
			let s = *centres.get(e.source.as_str())?;
			let t = *centres.get(e.target.as_str())?;
			Some(RoutedEdge::new(e, route(s, t)))
		})
		.collect();
	output
}

/// One ring per type (first-seen order, growing outward), nodes evenly
/// spaced around their ring. Rings are returned as guides.
pub fn radial_by_type(graph: &Graph, config: &RadialConfig) -> LayoutOutput {
	let center = Point::new(config.width / 2.0, config.height / 2.0);
	let mut groups: Vec<(&str, Vec<&str>)> = Vec::new();
	for node in graph.nodes() {
		match groups.iter_mut().find(|(t, _)| *t == node.node_type) {
			Some((_, ids)) => ids.push(node.id.as_str()),
			None => groups.push((node.node_type.as_str(), vec![node.id.as_str()])),
		}
	}

	let step = config.ring_span / groups.len().max(1) as f64;
	let mut centres = HashMap::new();
	let mut guides = Vec::new();
	for (ring, (_, ids)) in groups.iter().enumerate() {
		let radius = config.inner_radius + ring as f64 * step;
		guides.push(PathDescriptor::Circle { center, radius });
		for (i, id) in ids.iter().enumerate() {
			centres.insert(*id, center.polar(radius, slot_angle(i, ids.len())));
		}
	}

	let mut output = assemble(
		graph,
		LayoutOutput::empty(config.width, config.height),
		&centres,
		config.node_radius * 2.0,
		|from, to| PathDescriptor::Line { from, to },
	);
	output.guides = guides;
	output
}

/// Each node owns an equal sector of one circle and is drawn as an arc
/// covering `arc_fill` of it; edges curve through the centre.
pub fn chord(graph: &Graph, config: &ChordConfig) -> LayoutOutput {
	let center = Point::new(config.width / 2.0, config.height / 2.0);
	let output = LayoutOutput::empty(config.width, config.height);
	let n = graph.node_count();
	if n == 0 {
		return output;
	}

	let sector = 2.0 * PI / n as f64;
	let mut centres = HashMap::new();
	let mut outlines = HashMap::new();
	for (i, node) in graph.nodes().iter().enumerate() {
		let start_angle = i as f64 * sector + TOP;
		let end_angle = start_angle + sector * config.arc_fill;
		let mid = (start_angle + end_angle) / 2.0;
		centres.insert(node.id.as_str(), center.polar(config.inner_radius, mid));
		outlines.insert(
			node.id.as_str(),
			PathDescriptor::Arc {
				center,
				radius: config.outer_radius,
				start_angle,
				end_angle,
			},
		);
	}

	let mut output = assemble(graph, output, &centres, config.band_width, |from, to| {
		PathDescriptor::Quadratic {
			from,
			control: center,
			to,
		}
	});
	for node in &mut output.nodes {
		node.outline = outlines.remove(node.id.as_str());
	}
	output
}

/// Nodes on a horizontal line; edges arc above it with height proportional
/// to their span, capped.
pub fn arc(graph: &Graph, config: &ArcConfig) -> LayoutOutput {
	let baseline = config.height - config.baseline_offset;
	let usable = config.width - 2.0 * config.side_margin;
	let last = graph.node_count().saturating_sub(1).max(1) as f64;
	let centres: HashMap<&str, Point> = graph
		.nodes()
		.iter()
		.enumerate()
		.map(|(i, n)| {
			(
				n.id.as_str(),
				Point::new(config.side_margin + i as f64 / last * usable, baseline),
			)
		})
		.collect();

	assemble(
		graph,
		LayoutOutput::empty(config.width, config.height),
		&centres,
		config.node_radius * 2.0,
		|from, to| {
			let lift = ((to.x - from.x).abs() * config.arc_factor).min(config.max_arc_height);
			PathDescriptor::Quadratic {
				from,
				control: Point::new((from.x + to.x) / 2.0, baseline - lift),
				to,
			}
		},
	)
}

/// Nodes sorted by type (stable) around one circle; each edge is a cubic
/// whose control points are pulled towards the centre by `tension`.
pub fn edge_bundling(graph: &Graph, config: &BundleConfig) -> LayoutOutput {
	let center = Point::new(config.width / 2.0, config.height / 2.0);
	let mut sorted: Vec<_> = graph.nodes().iter().collect();
	sorted.sort_by(|a, b| a.node_type.cmp(&b.node_type));

	let centres: HashMap<&str, Point> = sorted
		.iter()
		.enumerate()
		.map(|(i, n)| (n.id.as_str(), center.polar(config.radius, slot_angle(i, sorted.len()))))
		.collect();

	assemble(
		graph,
		LayoutOutput::empty(config.width, config.height),
		&centres,
		config.node_radius * 2.0,
		|from, to| PathDescriptor::Cubic {
			from,
			control1: from.lerp(&center, config.tension),
			control2: to.lerp(&center, config.tension),
			to,
		},
	)
}
