//! Entity-relationship grid: one box per type, one row per entity.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{Anchor, LayoutOutput, PathDescriptor, Point, PositionedNode, RoutedEdge};
use crate::graph::Graph;

/// Grid geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct TypeGridConfig {
	/// Canvas width.
	pub width: f64,
	/// Canvas height.
	pub height: f64,
	/// Space around the grid.
	pub padding: f64,
	/// Most type boxes per row.
	pub columns: usize,
	/// Type box width.
	pub box_width: f64,
	/// Smallest type box height.
	pub min_box_height: f64,
	/// Height of one entity row.
	pub row_height: f64,
	/// Space above the first entity row for the type title.
	pub header_height: f64,
}

impl Default for TypeGridConfig {
	fn default() -> Self {
		Self {
			width: 900.0,
			height: 600.0,
			padding: 100.0,
			columns: 3,
			box_width: 180.0,
			min_box_height: 120.0,
			row_height: 22.0,
			header_height: 50.0,
		}
	}
}

/// Lay types out in grid cells (first-seen order, row-major). Each type box
/// is centred in its cell; entities are stacked below the header. Edges run
/// from the right side of the source row to the left side of the target row.
/// Type boxes are returned as guides.
pub fn type_grid(graph: &Graph, config: &TypeGridConfig) -> LayoutOutput {
	let mut output = LayoutOutput::empty(config.width, config.height);
	output.anchor = Anchor::TopLeft;

	let mut types: Vec<&str> = Vec::new();
	for node in graph.nodes() {
		if !types.contains(&node.node_type.as_str()) {
			types.push(node.node_type.as_str());
		}
	}
	if types.is_empty() {
		return output;
	}

	let columns = types.len().min(config.columns.max(1));
	let rows = types.len().div_ceil(columns);
	let col_width = (config.width - 2.0 * config.padding) / columns as f64;
	let row_pitch = (config.height - 2.0 * config.padding) / rows as f64;

	let mut rows_by_id = HashMap::new();
	for (idx, ty) in types.iter().enumerate() {
		let cx = config.padding + col_width * ((idx % columns) as f64 + 0.5);
		let cy = config.padding + row_pitch * ((idx / columns) as f64 + 0.5);
		let members: Vec<_> = graph.nodes().iter().filter(|n| n.node_type == *ty).collect();
		let box_height = config
			.min_box_height
			.max(config.header_height + members.len() as f64 * config.row_height);
		let left = cx - config.box_width / 2.0;
		let top = cy - box_height / 2.0;
		output.guides.push(PathDescriptor::Rect {
			x: left,
			y: top,
			width: config.box_width,
			height: box_height,
		});
		for (i, node) in members.into_iter().enumerate() {
			let y = top + config.header_height + i as f64 * config.row_height;
			rows_by_id.insert(
				node.id.as_str(),
				PositionedNode::new(node, left, y, config.box_width, config.row_height),
			);
		}
	}

	output.nodes = graph
		.nodes()
		.iter()
		.filter_map(|n| rows_by_id.get(n.id.as_str()).cloned())
		.collect();
	output.edges = graph
		.edges()
		.iter()
		.filter_map(|e| {
			let s = rows_by_id.get(e.source.as_str())?;
			let t = rows_by_id.get(e.target.as_str())?;
			let from = Point::new(s.x + s.width, s.y);
			let to = Point::new(t.x, t.y);
			let mid = (from.x + to.x) / 2.0;
			let mut routed = RoutedEdge::new(
				e,
				PathDescriptor::Cubic {
					from,
					control1: Point::new(from.x + (mid - from.x) * 0.5, from.y),
					control2: Point::new(to.x - (to.x - mid) * 0.5, to.y),
					to,
				},
			);
			routed.label = Some(e.predicate.clone());
			Some(routed)
		})
		.collect();
	output
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::{Edge, Node};
	use pretty_assertions::assert_eq;

	#[test]
	fn boxes_rows_and_routes() {
		let g = Graph::new(
			vec![
				Node::new("a", "Person", "A"),
				Node::new("c", "Org", "C"),
				Node::new("b", "Person", "B"),
			],
			vec![Edge::new("a", "c", "worksFor")],
		)
		.unwrap();
		let out = type_grid(&g, &TypeGridConfig::default());

		assert_eq!(
			out.guides[0],
			PathDescriptor::Rect {
				x: 185.0,
				y: 240.0,
				width: 180.0,
				height: 120.0
			}
		);
		assert_eq!(out.node("a").unwrap().point(), Point::new(185.0, 290.0));
		assert_eq!(out.node("b").unwrap().point(), Point::new(185.0, 312.0));
		assert_eq!(out.node("c").unwrap().point(), Point::new(535.0, 290.0));
		assert_eq!(
			out.edges[0].path,
			PathDescriptor::Cubic {
				from: Point::new(365.0, 290.0),
				control1: Point::new(407.5, 290.0),
				control2: Point::new(492.5, 290.0),
				to: Point::new(535.0, 290.0),
			}
		);
		assert_eq!(out.edges[0].label.as_deref(), Some("worksFor"));
	}

	#[test]
	fn tall_types_grow_their_box() {
		let nodes = (0..10).map(|i| Node::new(format!("n{i}"), "T", "")).collect();
		let out = type_grid(&Graph::new(nodes, vec![]).unwrap(), &TypeGridConfig::default());
		let PathDescriptor::Rect { height, .. } = out.guides[0] else {
			panic!("type boxes are rects");
		};
		assert_eq!(height, 270.0);
	}
}
