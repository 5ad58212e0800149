//! Force-directed simulation.
//!
//! Unlike the other layouts this one is stateful: a [`ForceSimulation`] owns
//! positions and velocities and advances them one [`tick`] at a time. A
//! [`SimulationTicker`] wraps it with start/stop and frame pacing so a host
//! timer can drive it, and tests can step it deterministically.
//!
//! [`tick`]: ForceSimulation::tick

use std::cell::{Cell, Ref, RefCell};
use std::collections::HashMap;
use std::f64::consts::PI;

use log::{debug, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::{Anchor, LayoutOutput, PathDescriptor, Point, PositionedNode, RoutedEdge};
use crate::graph::Graph;

/// Simulation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ForceConfig {
	/// Canvas width.
	pub width: f64,
	/// Canvas height.
	pub height: f64,
	/// Nodes are kept this far inside the canvas edges.
	pub margin: f64,
	/// Base radius of the initial circle.
	pub initial_radius: f64,
	/// Random extra radius added per node, in `[0, initial_jitter)`.
	pub initial_jitter: f64,
	/// Coulomb constant between every pair of nodes.
	pub repulsion: f64,
	/// Spring target separation.
	pub rest_length: f64,
	/// Spring stiffness.
	pub spring: f64,
	/// Pull towards the canvas centre.
	pub centering: f64,
	/// Velocity multiplier applied every tick.
	pub decay: f64,
	/// Position advance per unit velocity.
	pub time_step: f64,
	/// Marker radius, used for hit testing and output box size.
	pub node_radius: f64,
	/// Displacement below which a tick counts as calm.
	pub settle_epsilon: f64,
	/// Consecutive calm ticks before the layout is settled.
	pub settle_ticks: usize,
	/// Tick cap for one-shot layouts.
	pub max_batch_ticks: usize,
	/// Minimum milliseconds between timer-driven ticks.
	pub tick_interval_ms: f64,
	/// Seed for the initial radii.
	pub seed: u64,
}

impl Default for ForceConfig {
	fn default() -> Self {
		Self {
			width: 550.0,
			height: 420.0,
			margin: 40.0,
			initial_radius: 100.0,
			initial_jitter: 50.0,
			repulsion: 1000.0,
			rest_length: 90.0,
			spring: 0.04,
			centering: 0.003,
			decay: 0.85,
			time_step: 0.1,
			node_radius: 12.0,
			settle_epsilon: 0.01,
			settle_ticks: 30,
			max_batch_ticks: 5000,
			tick_interval_ms: 16.0,
			seed: 0x5eed,
		}
	}
}

impl ForceConfig {
	fn center(&self) -> Point {
		Point::new(self.width / 2.0, self.height / 2.0)
	}
}

#[derive(Debug, Clone)]
struct Body {
	id: String,
	position: Point,
	velocity: Point,
	pinned: bool,
}

/// Keep `v` within `[margin, extent - margin]`, or at the middle when the
/// extent is narrower than both margins.
fn clamp_axis(v: f64, margin: f64, extent: f64) -> f64 {
	if extent <= 2.0 * margin {
		extent / 2.0
	} else {
		v.clamp(margin, extent - margin)
	}
}

/// Stateful force layout over one graph.
pub struct ForceSimulation {
	config: ForceConfig,
	graph: Graph,
	bodies: Vec<Body>,
	index: HashMap<String, usize>,
	springs: Vec<(usize, usize)>,
	rng: StdRng,
	calm_ticks: usize,
	ticks: u64,
}

impl ForceSimulation {
	/// Place every node of `graph` on a circle around the canvas centre.
	pub fn new(graph: &Graph, config: ForceConfig) -> Self {
		let rng = StdRng::seed_from_u64(config.seed);
		let mut sim = Self {
			config,
			graph: Graph::default(),
			bodies: Vec::new(),
			index: HashMap::new(),
			springs: Vec::new(),
			rng,
			calm_ticks: 0,
			ticks: 0,
		};
		sim.set_graph(graph);
		sim
	}

	/// Switch to a new node/edge set. Nodes that survive keep their position
	/// and velocity; new nodes are placed on the initial circle.
	pub fn set_graph(&mut self, graph: &Graph) {
		let previous: HashMap<String, Body> = self.bodies.drain(..).map(|b| (b.id.clone(), b)).collect();
		let center = self.config.center();
		let n = graph.node_count();

		for (i, node) in graph.nodes().iter().enumerate() {
			let body = match previous.get(&node.id) {
				Some(body) => body.clone(),
				None => {
					let angle = i as f64 / n as f64 * 2.0 * PI;
					let radius = self.config.initial_radius + self.rng.r#gen::<f64>() * self.config.initial_jitter;
					Body {
						id: node.id.clone(),
						position: center.polar(radius, angle),
						velocity: Point::default(),
						pinned: false,
					}
				}
			};
			self.bodies.push(body);
		}

		self.index = self
			.bodies
			.iter()
			.enumerate()
			.map(|(i, b)| (b.id.clone(), i))
			.collect();
		self.springs = graph
			.edges()
			.iter()
			.filter_map(|e| Some((*self.index.get(&e.source)?, *self.index.get(&e.target)?)))
			.filter(|(s, t)| s != t)
			.collect();
		self.graph = graph.clone();
		self.calm_ticks = 0;
		debug!(
			"force simulation tracking {} nodes and {} springs",
			self.bodies.len(),
			self.springs.len()
		);
	}

	/// Current parameters.
	pub fn config(&self) -> &ForceConfig {
		&self.config
	}

	/// Change the canvas extent; nodes are pulled back inside on the next tick.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.config.width = width;
		self.config.height = height;
		self.calm_ticks = 0;
	}

	/// Number of ticks run so far.
	pub fn ticks(&self) -> u64 {
		self.ticks
	}

	/// Advance one integration step. Returns the largest distance any free
	/// node moved.
	pub fn tick(&mut self) -> f64 {
		let cfg = &self.config;
		let center = cfg.center();
		let mut forces = vec![Point::default(); self.bodies.len()];

		for i in 0..self.bodies.len() {
			for j in (i + 1)..self.bodies.len() {
				let (a, b) = (self.bodies[i].position, self.bodies[j].position);
				let (mut dx, dy) = (a.x - b.x, a.y - b.y);
				if dx == 0.0 && dy == 0.0 {
					dx = 1.0;
				}
				let dist = dx.hypot(dy).max(1.0);
				let push = cfg.repulsion / (dist * dist);
				let (fx, fy) = (dx / dist * push, dy / dist * push);
				forces[i].x += fx;
				forces[i].y += fy;
				forces[j].x -= fx;
				forces[j].y -= fy;
			}
		}

		for &(s, t) in &self.springs {
			let (a, b) = (self.bodies[s].position, self.bodies[t].position);
			let (dx, dy) = (b.x - a.x, b.y - a.y);
			let dist = dx.hypot(dy).max(1.0);
			let pull = (dist - cfg.rest_length) * cfg.spring;
			let (fx, fy) = (dx / dist * pull, dy / dist * pull);
			forces[s].x += fx;
			forces[s].y += fy;
			forces[t].x -= fx;
			forces[t].y -= fy;
		}

		let mut max_step: f64 = 0.0;
		for (body, force) in self.bodies.iter_mut().zip(&forces) {
			if body.pinned {
				body.velocity = Point::default();
				continue;
			}
			let fx = force.x + (center.x - body.position.x) * cfg.centering;
			let fy = force.y + (center.y - body.position.y) * cfg.centering;
			body.velocity.x = (body.velocity.x + fx) * cfg.decay;
			body.velocity.y = (body.velocity.y + fy) * cfg.decay;
			let next = Point::new(
				clamp_axis(body.position.x + body.velocity.x * cfg.time_step, cfg.margin, cfg.width),
				clamp_axis(body.position.y + body.velocity.y * cfg.time_step, cfg.margin, cfg.height),
			);
			max_step = max_step.max(next.distance(&body.position));
			body.position = next;
		}

		if max_step < cfg.settle_epsilon {
			self.calm_ticks += 1;
		} else {
			self.calm_ticks = 0;
		}
		self.ticks += 1;
		trace!("tick {} moved at most {max_step:.4}", self.ticks);
		max_step
	}

	/// Whether the layout has been calm for `settle_ticks` consecutive ticks.
	pub fn is_settled(&self) -> bool {
		self.calm_ticks >= self.config.settle_ticks
	}

	/// Tick until settled or `max_ticks` is reached; returns the ticks run.
	pub fn run_until_settled(&mut self, max_ticks: usize) -> usize {
		let mut run = 0;
		while run < max_ticks && !self.is_settled() {
			self.tick();
			run += 1;
		}
		debug!("force simulation ran {run} ticks, settled: {}", self.is_settled());
		run
	}

	/// Start or continue dragging `id` to `at`. The node leaves force
	/// accumulation and its velocity is zeroed. Returns `false` for unknown ids.
	pub fn drag(&mut self, id: &str, at: Point) -> bool {
		let Some(&i) = self.index.get(id) else {
			return false;
		};
		let cfg = &self.config;
		let body = &mut self.bodies[i];
		body.pinned = true;
		body.velocity = Point::default();
		body.position = Point::new(
			clamp_axis(at.x, cfg.margin, cfg.width),
			clamp_axis(at.y, cfg.margin, cfg.height),
		);
		self.calm_ticks = 0;
		true
	}

	/// End a drag; the node rejoins integration from rest.
	pub fn release(&mut self, id: &str) {
		if let Some(&i) = self.index.get(id) {
			let body = &mut self.bodies[i];
			body.pinned = false;
			body.velocity = Point::default();
		}
	}

	/// Whether `id` is being dragged.
	pub fn is_pinned(&self, id: &str) -> bool {
		self.index.get(id).is_some_and(|&i| self.bodies[i].pinned)
	}

	/// Current position of `id`.
	pub fn position(&self, id: &str) -> Option<Point> {
		self.index.get(id).map(|&i| self.bodies[i].position)
	}

	/// Current positions in graph order.
	pub fn positions(&self) -> impl Iterator<Item = (&str, Point)> {
		self.bodies.iter().map(|b| (b.id.as_str(), b.position))
	}

	/// Topmost node within `radius` of `at`.
	pub fn node_at(&self, at: Point, radius: f64) -> Option<&str> {
		self.bodies
			.iter()
			.rev()
			.find(|b| b.position.distance(&at) < radius)
			.map(|b| b.id.as_str())
	}

	/// Current positions as layout output; edges are straight lines.
	pub fn snapshot(&self) -> LayoutOutput {
		let size = self.config.node_radius * 2.0;
		let mut output = LayoutOutput::empty(self.config.width, self.config.height);
		output.anchor = Anchor::Center;
		output.nodes = self
			.graph
			.nodes()
			.iter()
			.zip(&self.bodies)
			.map(|(node, body)| PositionedNode::new(node, body.position.x, body.position.y, size, size))
			.collect();
		output.edges = self
			.graph
			.edges()
			.iter()
			.filter_map(|e| {
				let from = self.position(&e.source)?;
				let to = self.position(&e.target)?;
				Some(RoutedEdge::new(e, PathDescriptor::Line { from, to }))
			})
			.collect();
		output
	}
}

/// Run a fresh simulation to rest and return its positions.
pub fn settled_layout(graph: &Graph, config: &ForceConfig) -> LayoutOutput {
	let mut sim = ForceSimulation::new(graph, config.clone());
	sim.run_until_settled(config.max_batch_ticks);
	sim.snapshot()
}

/// Result of a timer firing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
	/// One step ran; carries the largest displacement.
	Stepped(f64),
	/// Too soon after the previous step.
	Waiting,
	/// The previous tick (or another borrower) still holds the simulation.
	Skipped,
	/// The ticker is stopped.
	Stopped,
}

/// Paces a [`ForceSimulation`] from an external timer.
///
/// Every method takes `&self`, so the timer callback and input handlers can
/// share one ticker. A firing that finds the simulation borrowed is dropped
/// and counted, never queued.
pub struct SimulationTicker {
	sim: RefCell<ForceSimulation>,
	running: Cell<bool>,
	last_tick_ms: Cell<Option<f64>>,
	skipped: Cell<u64>,
}

impl SimulationTicker {
	/// Wrap a simulation. The ticker starts stopped.
	pub fn new(sim: ForceSimulation) -> Self {
		Self {
			sim: RefCell::new(sim),
			running: Cell::new(false),
			last_tick_ms: Cell::new(None),
			skipped: Cell::new(0),
		}
	}

	/// Begin responding to timer firings.
	pub fn start(&self) {
		self.running.set(true);
	}

	/// Stop responding to timer firings.
	pub fn stop(&self) {
		self.running.set(false);
		self.last_tick_ms.set(None);
	}

	/// Whether the ticker is running.
	pub fn is_running(&self) -> bool {
		self.running.get()
	}

	/// Firings dropped because the simulation was busy.
	pub fn skipped(&self) -> u64 {
		self.skipped.get()
	}

	/// Run `f` against the simulation, or return `None` while it is busy.
	pub fn with_simulation<R>(&self, f: impl FnOnce(&mut ForceSimulation) -> R) -> Option<R> {
		self.sim.try_borrow_mut().ok().map(|mut sim| f(&mut sim))
	}

	/// Borrow the simulation for reading, e.g. to snapshot it.
	pub fn simulation(&self) -> Option<Ref<'_, ForceSimulation>> {
		self.sim.try_borrow().ok()
	}

	/// Step once regardless of timer state.
	pub fn tick_once(&self) -> Option<f64> {
		self.with_simulation(ForceSimulation::tick)
	}

	/// Handle a timer firing at `now_ms`.
	pub fn fire(&self, now_ms: f64) -> TickOutcome {
		if !self.running.get() {
			return TickOutcome::Stopped;
		}
		let Ok(mut sim) = self.sim.try_borrow_mut() else {
			self.skipped.set(self.skipped.get() + 1);
			trace!("tick skipped, simulation busy ({} so far)", self.skipped.get());
			return TickOutcome::Skipped;
		};
		if let Some(last) = self.last_tick_ms.get() {
			if now_ms - last < sim.config().tick_interval_ms {
				return TickOutcome::Waiting;
			}
		}
		self.last_tick_ms.set(Some(now_ms));
		TickOutcome::Stepped(sim.tick())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::{Edge, Node};

	fn pair() -> Graph {
		Graph::new(
			vec![Node::new("a", "T", "A"), Node::new("b", "T", "B")],
			vec![Edge::new("a", "b", "link")],
		)
		.unwrap()
	}

	fn springs_only() -> ForceConfig {
		ForceConfig {
			repulsion: 0.0,
			centering: 0.0,
			..ForceConfig::default()
		}
	}

	fn gap(sim: &ForceSimulation) -> f64 {
		sim.position("a").unwrap().distance(&sim.position("b").unwrap())
	}

	#[test]
	fn initial_placement_is_a_jittered_circle() {
		let g = Graph::new((0..6).map(|i| Node::new(format!("n{i}"), "T", "")).collect(), vec![]).unwrap();
		let cfg = ForceConfig::default();
		let sim = ForceSimulation::new(&g, cfg.clone());
		for (_, p) in sim.positions() {
			let r = p.distance(&cfg.center());
			assert!((99.999..150.001).contains(&r), "radius {r}");
		}
		let again = ForceSimulation::new(&g, cfg);
		assert!(sim.positions().eq(again.positions()));
	}

	#[test]
	fn spring_converges_to_rest_length() {
		let mut sim = ForceSimulation::new(&pair(), springs_only());
		assert!(gap(&sim) > 150.0);
		let ran = sim.run_until_settled(5000);
		assert!(sim.is_settled(), "not settled after {ran} ticks");
		assert!((gap(&sim) - 90.0).abs() < 0.5, "gap {}", gap(&sim));
	}

	#[test]
	fn repulsion_pushes_unconnected_nodes_apart() {
		let g = Graph::new(vec![Node::new("a", "T", "A"), Node::new("b", "T", "B")], vec![]).unwrap();
		let mut sim = ForceSimulation::new(&g, ForceConfig { centering: 0.0, ..ForceConfig::default() });
		sim.drag("a", Point::new(270.0, 210.0));
		sim.drag("b", Point::new(280.0, 210.0));
		sim.release("a");
		sim.release("b");
		sim.tick();
		assert!(gap(&sim) > 10.0);
	}

	#[test]
	fn dragged_node_stays_put() {
		let mut sim = ForceSimulation::new(&pair(), springs_only());
		let spot = Point::new(200.0, 200.0);
		assert!(sim.drag("a", spot));
		for _ in 0..50 {
			sim.tick();
		}
		assert_eq!(sim.position("a"), Some(spot));
		assert!(sim.is_pinned("a"));
		assert!(!sim.drag("missing", spot));

		sim.release("a");
		assert!(!sim.is_pinned("a"));
		sim.tick();
		assert_ne!(sim.position("a"), Some(spot));
	}

	#[test]
	fn positions_stay_inside_margins() {
		let g = Graph::new((0..12).map(|i| Node::new(format!("n{i}"), "T", "")).collect(), vec![]).unwrap();
		let mut sim = ForceSimulation::new(&g, ForceConfig { repulsion: 1e7, ..ForceConfig::default() });
		for _ in 0..100 {
			sim.tick();
		}
		for (_, p) in sim.positions() {
			assert!((40.0..=510.0).contains(&p.x) && (40.0..=380.0).contains(&p.y));
		}
	}

	#[test]
	fn graph_update_keeps_surviving_positions() {
		let mut sim = ForceSimulation::new(&pair(), springs_only());
		sim.tick();
		let a = sim.position("a");
		let g2 = Graph::new(
			vec![Node::new("a", "T", "A"), Node::new("c", "T", "C")],
			vec![Edge::new("a", "c", "link"), Edge::new("a", "gone", "link")],
		)
		.unwrap();
		sim.set_graph(&g2);
		assert_eq!(sim.position("a"), a);
		assert!(sim.position("b").is_none());
		assert!(sim.position("c").is_some());
		assert_eq!(sim.snapshot().edges.len(), 1);
	}

	#[test]
	fn empty_graph_settles_immediately() {
		let mut sim = ForceSimulation::new(&Graph::default(), ForceConfig::default());
		assert_eq!(sim.tick(), 0.0);
		assert!(sim.snapshot().is_empty());
		assert!(settled_layout(&Graph::default(), &ForceConfig::default()).is_empty());
	}

	#[test]
	fn ticker_paces_and_skips() {
		let ticker = SimulationTicker::new(ForceSimulation::new(&pair(), ForceConfig::default()));
		assert_eq!(ticker.fire(0.0), TickOutcome::Stopped);
		assert!(!ticker.is_running());

		ticker.start();
		assert!(ticker.is_running());
		assert!(matches!(ticker.fire(0.0), TickOutcome::Stepped(_)));
		assert_eq!(ticker.fire(5.0), TickOutcome::Waiting);
		assert!(matches!(ticker.fire(20.0), TickOutcome::Stepped(_)));

		{
			let _busy = ticker.simulation();
			assert_eq!(ticker.fire(100.0), TickOutcome::Skipped);
			assert!(ticker.with_simulation(|sim| sim.tick()).is_none());
		}
		assert_eq!(ticker.skipped(), 1);
		assert_eq!(ticker.simulation().map(|sim| sim.ticks()), Some(2));

		ticker.stop();
		assert_eq!(ticker.fire(200.0), TickOutcome::Stopped);
		assert_eq!(ticker.skipped(), 1);
		assert!(ticker.tick_once().is_some());
		assert_eq!(ticker.simulation().map(|sim| sim.ticks()), Some(3));
	}

	#[test]
	fn firing_from_inside_a_step_is_dropped() {
		let ticker = SimulationTicker::new(ForceSimulation::new(&pair(), ForceConfig::default()));
		ticker.start();
		let nested = ticker.with_simulation(|sim| {
			sim.tick();
			ticker.fire(0.0)
		});
		assert_eq!(nested, Some(TickOutcome::Skipped));
		assert_eq!(ticker.skipped(), 1);
		assert!(matches!(ticker.fire(0.0), TickOutcome::Stepped(_)));
	}

	#[test]
	fn resize_pulls_nodes_inside() {
		let mut sim = ForceSimulation::new(&pair(), ForceConfig::default());
		sim.run_until_settled(2000);
		sim.resize(200.0, 150.0);
		assert!(!sim.is_settled());
		assert_eq!((sim.config().width, sim.config().height), (200.0, 150.0));
		sim.tick();
		for (_, p) in sim.positions() {
			assert!((40.0..=160.0).contains(&p.x) && (40.0..=110.0).contains(&p.y), "{p:?}");
		}
		assert_eq!(sim.snapshot().width, 200.0);
	}

	#[test]
	fn hit_test_prefers_topmost() {
		let mut sim = ForceSimulation::new(&pair(), ForceConfig::default());
		sim.drag("a", Point::new(100.0, 100.0));
		sim.drag("b", Point::new(105.0, 100.0));
		assert_eq!(sim.node_at(Point::new(102.0, 100.0), 12.0), Some("b"));
		assert_eq!(sim.node_at(Point::new(300.0, 300.0), 12.0), None);
	}
}
