//! Adjacency matrix.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{Anchor, LayoutOutput, PathDescriptor, PositionedNode, RoutedEdge};
use crate::graph::Graph;

/// Grid geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct MatrixConfig {
	/// Side of one cell.
	pub cell_size: f64,
	/// Space left of and above the grid, reserved for labels.
	pub margin: f64,
	/// Gap between neighbouring cells.
	pub cell_gap: f64,
}

impl Default for MatrixConfig {
	fn default() -> Self {
		Self {
			cell_size: 32.0,
			margin: 100.0,
			cell_gap: 2.0,
		}
	}
}

/// Row/column order plus directed (source, target) -> predicate lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixLayout {
	order: Vec<String>,
	index: HashMap<String, usize>,
	adjacency: HashMap<(String, String), String>,
	config: MatrixConfig,
}

impl MatrixLayout {
	/// Index `graph` in node order. When several edges join the same ordered
	/// pair the last one wins; dangling edges are ignored.
	pub fn build(graph: &Graph, config: &MatrixConfig) -> Self {
		let order: Vec<String> = graph.nodes().iter().map(|n| n.id.clone()).collect();
		let index = order.iter().enumerate().map(|(i, id)| (id.clone(), i)).collect();
		let adjacency = graph
			.resolved_edges()
			.into_iter()
			.map(|e| ((e.source.clone(), e.target.clone()), e.predicate.clone()))
			.collect();
		Self {
			order,
			index,
			adjacency,
			config: config.clone(),
		}
	}

	/// Row and column order.
	pub fn order(&self) -> &[String] {
		&self.order
	}

	/// Predicate of the edge from `source` to `target`.
	pub fn predicate(&self, source: &str, target: &str) -> Option<&str> {
		self.adjacency
			.get(&(source.to_string(), target.to_string()))
			.map(String::as_str)
	}

	/// Number of filled cells.
	pub fn filled(&self) -> usize {
		self.adjacency.len()
	}

	/// Cell rectangle for row `source`, column `target`.
	pub fn cell_rect(&self, source: &str, target: &str) -> Option<PathDescriptor> {
		let row = *self.index.get(source)?;
		let col = *self.index.get(target)?;
		let MatrixConfig {
			cell_size,
			margin,
			cell_gap,
		} = self.config;
		Some(PathDescriptor::Rect {
			x: margin + col as f64 * cell_size,
			y: margin + row as f64 * cell_size,
			width: cell_size - cell_gap,
			height: cell_size - cell_gap,
		})
	}

	/// Nodes sit on the diagonal; every filled cell becomes an edge whose
	/// path is the cell rectangle.
	pub fn to_output(&self, graph: &Graph) -> LayoutOutput {
		let MatrixConfig { cell_size, margin, .. } = self.config;
		let extent = margin + self.order.len() as f64 * cell_size;
		let mut output = LayoutOutput::empty(extent, extent);
		output.anchor = Anchor::TopLeft;
		output.nodes = graph
			.nodes()
			.iter()
			.enumerate()
			.map(|(i, n)| {
				let at = margin + i as f64 * cell_size;
				PositionedNode::new(n, at, at, cell_size, cell_size)
			})
			.collect();
		output.edges = graph
			.edges()
			.iter()
			.filter(|e| self.predicate(&e.source, &e.target) == Some(e.predicate.as_str()))
			.filter_map(|e| Some(RoutedEdge::new(e, self.cell_rect(&e.source, &e.target)?)))
			.collect();
		output
	}
}
