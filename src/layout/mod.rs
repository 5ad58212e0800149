//! Layout algorithms and the geometry they hand to a renderer.
//!
//! Every layout reads a [`Graph`] and returns a [`LayoutOutput`]: positioned
//! nodes in graph order and routed edges in edge order. Edges whose endpoints
//! do not resolve are skipped, and an empty graph yields an empty output.

pub mod circular;
pub mod force;
pub mod layered;
pub mod matrix;
pub mod type_grid;

use std::f64::consts::PI;
use std::fmt::Write as _;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::VisualizerConfig;
use crate::graph::{Edge, Graph, Node, Properties};

/// 2D point in layout space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
	/// Horizontal coordinate.
	pub x: f64,
	/// Vertical coordinate.
	pub y: f64,
}

impl Point {
	/// Create a point.
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// Euclidean distance.
	pub fn distance(&self, other: &Self) -> f64 {
		(self.x - other.x).hypot(self.y - other.y)
	}

	/// Point at `angle` radians and `radius` from `self`.
	pub fn polar(&self, radius: f64, angle: f64) -> Self {
		Self::new(self.x + radius * angle.cos(), self.y + radius * angle.sin())
	}

	/// Linear interpolation towards `other`; `t = 0` is `self`.
	pub fn lerp(&self, other: &Self, t: f64) -> Self {
		Self::new(self.x * (1.0 - t) + other.x * t, self.y * (1.0 - t) + other.y * t)
	}
}

/// Drawable shape of an edge, node outline or guide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PathDescriptor {
	/// Straight segment.
	Line {
		/// Start.
		from: Point,
		/// End.
		to: Point,
	},
	/// Quadratic Bezier.
	Quadratic {
		/// Start.
		from: Point,
		/// Control point.
		control: Point,
		/// End.
		to: Point,
	},
	/// Cubic Bezier.
	Cubic {
		/// Start.
		from: Point,
		/// First control point.
		control1: Point,
		/// Second control point.
		control2: Point,
		/// End.
		to: Point,
	},
	/// Clockwise circular arc between two angles (radians).
	Arc {
		/// Circle centre.
		center: Point,
		/// Circle radius.
		radius: f64,
		/// Start angle.
		start_angle: f64,
		/// End angle.
		end_angle: f64,
	},
	/// Full circle.
	Circle {
		/// Centre.
		center: Point,
		/// Radius.
		radius: f64,
	},
	/// Axis-aligned rectangle.
	Rect {
		/// Left edge.
		x: f64,
		/// Top edge.
		y: f64,
		/// Width.
		width: f64,
		/// Height.
		height: f64,
	},
}

fn num(v: f64) -> String {
	let s = format!("{v:.2}");
	let s = s.trim_end_matches('0').trim_end_matches('.');
	if s == "-0" { "0".to_string() } else { s.to_string() }
}

impl PathDescriptor {
	/// SVG path data for this shape.
	pub fn svg_path(&self) -> String {
		let mut d = String::new();
		let _ = match self {
			PathDescriptor::Line { from, to } => write!(
				d,
				"M {} {} L {} {}",
				num(from.x),
				num(from.y),
				num(to.x),
				num(to.y)
			),
			PathDescriptor::Quadratic { from, control, to } => write!(
				d,
				"M {} {} Q {} {} {} {}",
				num(from.x),
				num(from.y),
				num(control.x),
				num(control.y),
				num(to.x),
				num(to.y)
			),
			PathDescriptor::Cubic {
				from,
				control1,
				control2,
				to,
			} => write!(
				d,
				"M {} {} C {} {}, {} {}, {} {}",
				num(from.x),
				num(from.y),
				num(control1.x),
				num(control1.y),
				num(control2.x),
				num(control2.y),
				num(to.x),
				num(to.y)
			),
			PathDescriptor::Arc {
				center,
				radius,
				start_angle,
				end_angle,
			} => {
				let start = center.polar(*radius, *start_angle);
				let end = center.polar(*radius, *end_angle);
				let large = u8::from(end_angle - start_angle > PI);
				write!(
					d,
					"M {} {} A {} {} 0 {} 1 {} {}",
					num(start.x),
					num(start.y),
					num(*radius),
					num(*radius),
					large,
					num(end.x),
					num(end.y)
				)
			}
			PathDescriptor::Circle { center, radius } => write!(
				d,
				"M {} {} A {r} {r} 0 1 0 {} {} A {r} {r} 0 1 0 {} {}",
				num(center.x - radius),
				num(center.y),
				num(center.x + radius),
				num(center.y),
				num(center.x - radius),
				num(center.y),
				r = num(*radius)
			),
			PathDescriptor::Rect {
				x,
				y,
				width,
				height,
			} => write!(
				d,
				"M {} {} h {} v {} h {} Z",
				num(*x),
				num(*y),
				num(*width),
				num(*height),
				num(-width)
			),
		};
		d
	}

	/// First point of the path.
	pub fn start(&self) -> Point {
		match self {
			PathDescriptor::Line { from, .. }
			| PathDescriptor::Quadratic { from, .. }
			| PathDescriptor::Cubic { from, .. } => *from,
			PathDescriptor::Arc {
				center,
				radius,
				start_angle,
				..
			} => center.polar(*radius, *start_angle),
			PathDescriptor::Circle { center, radius } => Point::new(center.x - radius, center.y),
			PathDescriptor::Rect { x, y, .. } => Point::new(*x, *y),
		}
	}

	/// Last point of the path.
	pub fn end(&self) -> Point {
		match self {
			PathDescriptor::Line { to, .. }
			| PathDescriptor::Quadratic { to, .. }
			| PathDescriptor::Cubic { to, .. } => *to,
			PathDescriptor::Arc {
				center,
				radius,
				end_angle,
				..
			} => center.polar(*radius, *end_angle),
			PathDescriptor::Circle { .. } | PathDescriptor::Rect { .. } => self.start(),
		}
	}
}

/// Which point of a node box `x`/`y` refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Anchor {
	/// `x`/`y` is the centre.
	#[default]
	Center,
	/// `x`/`y` is the top-left corner.
	TopLeft,
}

/// Side of a node box where edges attach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Side {
	/// Left edge.
	Left,
	/// Right edge.
	Right,
	/// Top edge.
	Top,
	/// Bottom edge.
	Bottom,
}

/// Where outgoing and incoming edges attach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handles {
	/// Side edges leave from.
	pub source: Side,
	/// Side edges arrive at.
	pub target: Side,
}

/// A node with geometry, carrying its type, label and properties for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionedNode {
	/// Node id.
	pub id: String,
	/// Horizontal anchor coordinate.
	pub x: f64,
	/// Vertical anchor coordinate.
	pub y: f64,
	/// Box width.
	pub width: f64,
	/// Box height.
	pub height: f64,
	/// Node type.
	#[serde(rename = "type")]
	pub node_type: String,
	/// Node label.
	pub label: String,
	/// Node properties.
	pub properties: Properties,
	/// Shape drawn in place of the default marker, if any.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub outline: Option<PathDescriptor>,
}

impl PositionedNode {
	/// Place `node` at (`x`, `y`) with the given box size.
	pub fn new(node: &Node, x: f64, y: f64, width: f64, height: f64) -> Self {
		Self {
			id: node.id.clone(),
			x,
			y,
			width,
			height,
			node_type: node.node_type.clone(),
			label: node.label.clone(),
			properties: node.properties.clone(),
			outline: None,
		}
	}

	/// Builder: attach an outline.
	pub fn with_outline(mut self, outline: PathDescriptor) -> Self {
		self.outline = Some(outline);
		self
	}

	/// Position as a point.
	pub fn point(&self) -> Point {
		Point::new(self.x, self.y)
	}
}

/// An edge with a route.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutedEdge {
	/// Source node id.
	pub source_id: String,
	/// Target node id.
	pub target_id: String,
	/// Relationship name.
	pub predicate: String,
	/// Route.
	pub path: PathDescriptor,
	/// Optional text shown along the edge.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub label: Option<String>,
}

impl RoutedEdge {
	/// Route `edge` along `path`.
	pub fn new(edge: &Edge, path: PathDescriptor) -> Self {
		Self {
			source_id: edge.source.clone(),
			target_id: edge.target.clone(),
			predicate: edge.predicate.clone(),
			path,
			label: None,
		}
	}
}

/// Result of one layout computation.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LayoutOutput {
	/// Extent of the drawing.
	pub width: f64,
	/// Extent of the drawing.
	pub height: f64,
	/// Meaning of node `x`/`y`.
	pub anchor: Anchor,
	/// Positioned nodes.
	pub nodes: Vec<PositionedNode>,
	/// Routed edges.
	pub edges: Vec<RoutedEdge>,
	/// Background shapes such as ring guides.
	pub guides: Vec<PathDescriptor>,
	/// Edge attachment sides for box layouts.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub handles: Option<Handles>,
}

impl LayoutOutput {
	/// Empty output of the given extent.
	pub fn empty(width: f64, height: f64) -> Self {
		Self {
			width,
			height,
			..Self::default()
		}
	}

	/// Whether nothing was placed.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Find a positioned node.
	pub fn node(&self, id: &str) -> Option<&PositionedNode> {
		self.nodes.iter().find(|n| n.id == id)
	}
}

/// Available layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutKind {
	/// Force simulation, run to rest.
	#[default]
	Force,
	/// Layered flow (sankey style).
	Flow,
	/// Ranked boxes with cardinality labels.
	Hierarchy,
	/// Concentric rings by type.
	Radial,
	/// Chord diagram.
	Chord,
	/// Arc diagram.
	Arc,
	/// Circle with edges pulled to the centre.
	Bundle,
	/// Adjacency matrix.
	Matrix,
	/// Entity-relationship grid grouped by type.
	TypeGrid,
}

impl LayoutKind {
	/// Every layout, in menu order.
	pub const ALL: [LayoutKind; 9] = [
		LayoutKind::Force,
		LayoutKind::Flow,
		LayoutKind::Hierarchy,
		LayoutKind::Radial,
		LayoutKind::Chord,
		LayoutKind::Arc,
		LayoutKind::Bundle,
		LayoutKind::Matrix,
		LayoutKind::TypeGrid,
	];

	/// Display name.
	pub fn name(&self) -> &'static str {
		match self {
			LayoutKind::Force => "Force",
			LayoutKind::Flow => "Flow",
			LayoutKind::Hierarchy => "Hierarchy",
			LayoutKind::Radial => "Radial",
			LayoutKind::Chord => "Chord",
			LayoutKind::Arc => "Arc",
			LayoutKind::Bundle => "Bundle",
			LayoutKind::Matrix => "Matrix",
			LayoutKind::TypeGrid => "Type grid",
		}
	}

	/// Stable key, matching the serde name.
	pub fn key(&self) -> &'static str {
		match self {
			LayoutKind::Force => "force",
			LayoutKind::Flow => "flow",
			LayoutKind::Hierarchy => "hierarchy",
			LayoutKind::Radial => "radial",
			LayoutKind::Chord => "chord",
			LayoutKind::Arc => "arc",
			LayoutKind::Bundle => "bundle",
			LayoutKind::Matrix => "matrix",
			LayoutKind::TypeGrid => "type-grid",
		}
	}

	/// Inverse of [`LayoutKind::key`].
	pub fn from_key(key: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|k| k.key() == key)
	}
}

/// Run the selected layout over `graph`.
pub fn compute_layout(kind: LayoutKind, graph: &Graph, config: &VisualizerConfig) -> LayoutOutput {
	let output = match kind {
		LayoutKind::Force => force::settled_layout(graph, &config.force),
		LayoutKind::Flow => layered::flow_layout(graph, &config.flow),
		LayoutKind::Hierarchy => {
			layered::hierarchical_layout(graph, &config.hierarchy, &layered::LayeredRanks::default())
		}
		LayoutKind::Radial => circular::radial_by_type(graph, &config.radial),
		LayoutKind::Chord => circular::chord(graph, &config.chord),
		LayoutKind::Arc => circular::arc(graph, &config.arc),
		LayoutKind::Bundle => circular::edge_bundling(graph, &config.bundle),
		LayoutKind::Matrix => matrix::MatrixLayout::build(graph, &config.matrix).to_output(graph),
		LayoutKind::TypeGrid => type_grid::type_grid(graph, &config.type_grid),
	};
	let dangling = graph.edge_count() - graph.resolved_edges().len();
	if dangling > 0 {
		warn!("{} layout skipped {dangling} dangling edges", kind.name());
	}
	debug!(
		"{} layout placed {} nodes and {} edges",
		kind.name(),
		output.nodes.len(),
		output.edges.len()
	);
	output
}
