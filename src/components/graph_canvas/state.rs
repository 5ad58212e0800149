use std::collections::HashSet;

use crate::config::VisualizerConfig;
use crate::graph::{Graph, Incidence};
use crate::layout::force::{ForceConfig, ForceSimulation, SimulationTicker, TickOutcome};
use crate::layout::{Anchor, LayoutKind, LayoutOutput, Point, compute_layout};
use crate::palette::{ColorRegistry, PALETTE};

pub const NODE_RADIUS: f64 = 8.0;
pub const HIT_RADIUS: f64 = 12.0;

#[derive(Clone, Debug)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self { x: 0.0, y: 0.0, k: 1.0 }
	}
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub node: Option<String>,
	pub offset_x: f64,
	pub offset_y: f64,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<String>,
	pub neighbors: HashSet<String>,
	pub highlight_t: f64,
	pub prev_node: Option<String>,
	pub prev_neighbors: HashSet<String>,
	delay_t: f64,
}

/// Everything the canvas draws from.
pub struct CanvasState {
	pub ticker: SimulationTicker,
	pub kind: LayoutKind,
	pub layout: LayoutOutput,
	pub incidence: Incidence,
	pub colors: ColorRegistry,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub hover: HoverState,
	pub width: f64,
	pub height: f64,
	pub flow_time: f64,
	config: VisualizerConfig,
}

impl CanvasState {
	pub fn new(graph: &Graph, kind: LayoutKind, config: VisualizerConfig, width: f64, height: f64) -> Self {
		// The simulation fills the canvas rather than its configured extent.
		let sim = ForceSimulation::new(
			graph,
			ForceConfig {
				width,
				height,
				..config.force.clone()
			},
		);
		let mut state = Self {
			ticker: SimulationTicker::new(sim),
			kind,
			layout: LayoutOutput::default(),
			incidence: Incidence::default(),
			colors: ColorRegistry::new(),
			transform: ViewTransform::default(),
			drag: DragState::default(),
			pan: PanState::default(),
			hover: HoverState::default(),
			width,
			height,
			flow_time: 0.0,
			config,
		};
		state.set_graph(graph, kind, true);
		state
	}

	/// Swap in a new graph or layout. `fresh_document` restarts colour
	/// assignment.
	pub fn set_graph(&mut self, graph: &Graph, kind: LayoutKind, fresh_document: bool) {
		if fresh_document {
			self.colors.reset();
		}
		self.colors.register(graph.nodes().iter().map(|n| n.node_type.as_str()));
		self.incidence = Incidence::build(graph);

		if kind == LayoutKind::Force {
			if let Some(layout) = self.ticker.with_simulation(|sim| {
				sim.set_graph(graph);
				sim.snapshot()
			}) {
				self.layout = layout;
			}
			self.ticker.start();
		} else {
			self.ticker.stop();
			self.layout = compute_layout(kind, graph, &self.config);
		}

		if self.kind != kind || fresh_document {
			self.fit();
		}
		self.kind = kind;
		if let Some(id) = self.hover.node.clone() {
			if !graph.contains_node(&id) {
				self.set_hover(None);
			}
		}
		if self.drag.node.as_deref().is_some_and(|id| !graph.contains_node(id)) {
			self.drag = DragState::default();
		}
	}

	/// Centre the current layout in the canvas.
	pub fn fit(&mut self) {
		let (lw, lh) = (self.layout.width.max(1.0), self.layout.height.max(1.0));
		let k = (self.width / lw).min(self.height / lh).clamp(0.1, 2.0);
		self.transform = ViewTransform {
			x: (self.width - lw * k) / 2.0,
			y: (self.height - lh * k) / 2.0,
			k,
		};
	}

	pub fn color_of(&self, node_type: &str) -> &'static str {
		self.colors.get(node_type).unwrap_or(PALETTE[0])
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<String> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let at = Point::new(gx, gy);
		self.layout
			.nodes
			.iter()
			.rev()
			.find(|n| match self.layout.anchor {
				// HIT_RADIUS is in world-space, scales with zoom like nodes
				Anchor::Center => n.point().distance(&at) < HIT_RADIUS.max(n.width / 2.0),
				Anchor::TopLeft => gx >= n.x && gx <= n.x + n.width && gy >= n.y && gy <= n.y + n.height,
			})
			.map(|n| n.id.clone())
	}

	/// Only the force layout supports dragging.
	pub fn begin_drag(&mut self, id: String, sx: f64, sy: f64) -> bool {
		if self.kind != LayoutKind::Force {
			return false;
		}
		let Some(node) = self.layout.node(&id) else {
			return false;
		};
		let (gx, gy) = self.screen_to_graph(sx, sy);
		self.drag = DragState {
			offset_x: node.x - gx,
			offset_y: node.y - gy,
			node: Some(id),
		};
		true
	}

	pub fn drag_to(&mut self, sx: f64, sy: f64) {
		let Some(id) = self.drag.node.clone() else {
			return;
		};
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let at = Point::new(gx + self.drag.offset_x, gy + self.drag.offset_y);
		if let Some(layout) = self.ticker.with_simulation(|sim| {
			sim.drag(&id, at);
			sim.snapshot()
		}) {
			self.layout = layout;
		}
	}

	pub fn end_drag(&mut self) {
		if let Some(id) = self.drag.node.take() {
			self.ticker.with_simulation(|sim| sim.release(&id));
		}
	}

	pub fn is_dragging(&self) -> bool {
		self.drag.node.is_some()
	}

	pub fn set_hover(&mut self, node: Option<String>) {
		if self.hover.node == node {
			return;
		}
		let was_hovering = self.hover.node.is_some();

		// Save previous state for fade-out
		if was_hovering && node.is_none() {
			self.hover.prev_node = self.hover.node.take();
			self.hover.prev_neighbors = std::mem::take(&mut self.hover.neighbors);
		} else {
			self.hover.prev_node = None;
			self.hover.prev_neighbors.clear();
		}

		self.hover.neighbors = match &node {
			Some(id) => {
				if !was_hovering {
					self.hover.delay_t = 0.0;
				}
				let mut set = self.incidence.highlight(id);
				set.remove(id);
				set
			}
			None => HashSet::new(),
		};
		self.hover.node = node;
	}

	pub fn is_highlighted(&self, id: &str) -> bool {
		self.hover.node.as_deref() == Some(id)
			|| self.hover.neighbors.contains(id)
			|| self.hover.prev_node.as_deref() == Some(id)
			|| self.hover.prev_neighbors.contains(id)
	}

	pub fn is_hovered(&self, id: &str) -> bool {
		self.hover.node.as_deref() == Some(id) || self.hover.prev_node.as_deref() == Some(id)
	}

	pub fn is_neighbor(&self, id: &str) -> bool {
		self.hover.neighbors.contains(id) || self.hover.prev_neighbors.contains(id)
	}

	pub fn has_active_highlight(&self) -> bool {
		self.hover.node.is_some() || self.hover.prev_node.is_some()
	}

	pub fn tick(&mut self, dt: f64, now_ms: f64) {
		if self.ticker.is_running() {
			if let TickOutcome::Stepped(_) = self.ticker.fire(now_ms) {
				if let Some(sim) = self.ticker.simulation() {
					self.layout = sim.snapshot();
				}
			}
		}
		self.flow_time += dt;

		let (target, delay, speed) = if self.hover.node.is_some() {
			(1.0, 0.08, 1.8)
		} else {
			(0.0, 0.0, 1.26)
		};

		if self.hover.node.is_some() {
			self.hover.delay_t = (self.hover.delay_t + dt).min(delay);
			if self.hover.delay_t >= delay {
				self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt;
			}
		} else {
			self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt;
			if self.hover.highlight_t < 0.01 {
				self.hover.highlight_t = 0.0;
				self.hover.prev_node = None;
				self.hover.prev_neighbors.clear();
			}
		}
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.ticker.with_simulation(|sim| sim.resize(width, height));
		if self.ticker.is_running() {
			if let Some(sim) = self.ticker.simulation() {
				self.layout = sim.snapshot();
			}
		}
		self.fit();
	}

	pub fn stop(&mut self) {
		self.ticker.stop();
	}
}
