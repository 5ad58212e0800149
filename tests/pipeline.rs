//! Document in, geometry out.

use ld_graph_canvas::graph::{FilterConfig, GraphStats, Literal, Node};
use ld_graph_canvas::{GraphError, LayoutKind, VisualizerConfig, apply_filters, compute_layout, parse_document};
use pretty_assertions::assert_eq;

const SAMPLE: &str = include_str!("../assets/sample.jsonld");

fn edge_triples(graph: &ld_graph_canvas::Graph) -> Vec<(String, String, String)> {
	graph
		.edges()
		.iter()
		.map(|e| (e.source.clone(), e.target.clone(), e.predicate.clone()))
		.collect()
}

#[test]
fn nested_entity_yields_two_nodes_and_an_edge() {
	let graph = parse_document(r#"{"@id":"n1","name":"Alice","knows":{"@id":"n2","name":"Bob"}}"#).unwrap();
	let labels: Vec<_> = graph.nodes().iter().map(|n| n.label.as_str()).collect();
	assert_eq!(labels, vec!["Alice", "Bob"]);
	assert_eq!(
		edge_triples(&graph),
		vec![("n1".to_string(), "n2".to_string(), "knows".to_string())]
	);
}

#[test]
fn lone_entity_has_no_edges() {
	let graph = parse_document(r#"{"@id":"solo","@type":"Thing"}"#).unwrap();
	assert_eq!(graph.node_count(), 1);
	assert_eq!(graph.edge_count(), 0);
	assert_eq!(graph.nodes()[0].node_type, "Thing");
}

#[test]
fn bundled_sample_parses_with_comments() {
	let graph = parse_document(SAMPLE).unwrap();
	let ids: Vec<_> = graph
		.nodes()
		.iter()
		.map(|n| n.id.trim_start_matches("https://example.org/"))
		.collect();
	assert_eq!(ids, vec!["alice", "bob", "carol", "acme", "widget", "gadget", "globex"]);

	let stats = graph.stats();
	assert_eq!(
		stats,
		GraphStats {
			node_count: 7,
			edge_count: 8,
			dangling_edges: 1,
			isolated_nodes: 1,
			types: vec![
				("Person".to_string(), 3),
				("Organization".to_string(), 2),
				("Product".to_string(), 2),
			],
		}
	);

	let globex = graph.node("https://example.org/globex").unwrap();
	assert_eq!(globex.label, "Globex");
	assert_eq!(
		globex.properties.get("foundingDate"),
		Some(&Literal::String("1989-04-01".to_string()))
	);
}

#[test]
fn malformed_document_reports_position() {
	let err = parse_document("{\n  \"@id\": \n}").unwrap_err();
	assert!(matches!(err, GraphError::Parse { line: 3, .. }), "{err:?}");
}

#[test]
fn failed_reparse_leaves_previous_graph_usable() {
	let mut current = parse_document(SAMPLE).unwrap();
	if let Ok(next) = parse_document("[{\"@id\": \"x\"") {
		current = next;
	}
	assert_eq!(current.node_count(), 7);
}

#[test]
fn connectivity_uses_the_unfiltered_graph() {
	let graph = parse_document(SAMPLE).unwrap();
	let config = FilterConfig {
		types: ["Product".to_string()].into_iter().collect(),
		show_isolated: false,
		..FilterConfig::default()
	};
	let filtered = apply_filters(&graph, &config);
	let labels: Vec<_> = filtered.nodes().iter().map(|n| n.label.as_str()).collect();
	assert_eq!(labels, vec!["Widget", "Gadget"]);
	assert_eq!(filtered.edge_count(), 0);
}

#[test]
fn hiding_isolated_nodes_drops_dangling_edges() {
	let graph = parse_document(SAMPLE).unwrap();
	let config = FilterConfig {
		show_isolated: false,
		..FilterConfig::default()
	};
	let filtered = apply_filters(&graph, &config);
	assert_eq!(filtered.node_count(), 6);
	assert_eq!(filtered.edge_count(), 7);
	assert!(!filtered.contains_node("https://example.org/globex"));
}

#[test]
fn every_layout_places_every_node() {
	let graph = parse_document(SAMPLE).unwrap();
	let config = VisualizerConfig::default();
	for kind in LayoutKind::ALL {
		let output = compute_layout(kind, &graph, &config);
		assert_eq!(output.nodes.len(), 7, "{}", kind.name());
		assert!(output.edges.len() <= 7, "{}", kind.name());
		for node in &output.nodes {
			assert!(node.x.is_finite() && node.y.is_finite(), "{} placed {}", kind.name(), node.id);
		}
		for edge in &output.edges {
			assert!(output.node(&edge.source_id).is_some(), "{}", kind.name());
			assert!(output.node(&edge.target_id).is_some(), "{}", kind.name());
		}
	}
}

#[test]
fn layouts_are_reproducible() {
	let graph = parse_document(SAMPLE).unwrap();
	let config = VisualizerConfig::default();
	for kind in LayoutKind::ALL {
		assert_eq!(
			compute_layout(kind, &graph, &config),
			compute_layout(kind, &graph, &config),
			"{}",
			kind.name()
		);
	}
}

#[test]
fn empty_document_gives_empty_layouts() {
	let graph = parse_document("[]").unwrap();
	for kind in LayoutKind::ALL {
		assert!(compute_layout(kind, &graph, &VisualizerConfig::default()).is_empty());
	}
}

#[test]
fn patched_node_flows_into_layout() {
	let graph = parse_document(SAMPLE).unwrap();
	let patched = Node::new("https://example.org/bob", "Person", "Robert");
	let next = graph.with_node_replaced(patched).unwrap();
	assert_eq!(next.edge_count(), graph.edge_count());

	let output = compute_layout(LayoutKind::Radial, &next, &VisualizerConfig::default());
	assert_eq!(output.node("https://example.org/bob").unwrap().label, "Robert");

	let missing = Node::new("https://example.org/nobody", "Person", "Nobody");
	assert_eq!(
		graph.with_node_replaced(missing),
		Err(GraphError::UnknownNode("https://example.org/nobody".to_string()))
	);
}

#[test]
fn config_overrides_reach_layouts() {
	let config = VisualizerConfig::from_json(r#"{"matrix": {"cellSize": 10, "margin": 0, "cellGap": 0}}"#).unwrap();
	let graph = parse_document(SAMPLE).unwrap();
	let output = compute_layout(LayoutKind::Matrix, &graph, &config);
	assert_eq!(output.width, 70.0);
}
