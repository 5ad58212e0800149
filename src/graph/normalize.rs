//! Linked-data document to [`Graph`].
//!
//! The document is a loose JSON-LD style tree: entities carry an optional
//! `@id`, an optional `@type` and arbitrary fields. Nested objects become
//! nodes reached through an edge named after the field; URI-shaped strings
//! become edges to whatever node owns that id.

use std::collections::HashSet;
use std::sync::Arc;

use log::debug;
use serde_json::{Map, Value};

use super::model::{DEFAULT_TYPE, Edge, Graph, Literal, Node, Properties};
use crate::error::Result;

/// Keywords that describe document structure rather than data.
pub const RESERVED_KEYWORDS: &[&str] = &[
	"@context",
	"@id",
	"@type",
	"@graph",
	"@value",
	"@language",
	"@list",
	"@set",
];

/// Fields consulted, in order, for a node label.
const LABEL_FIELDS: &[&str] = &["name", "label", "title"];

const ID_KEY: &str = "@id";
const TYPE_KEY: &str = "@type";
const VALUE_KEY: &str = "@value";
const GRAPH_KEY: &str = "@graph";

fn is_reserved(key: &str) -> bool {
	RESERVED_KEYWORDS.contains(&key)
}

/// Remove `//` and `/* */` comments that sit outside string literals.
///
/// Both `"` and `'` open a literal; a backslash inside a literal escapes the
/// next character. An unterminated block comment swallows the rest of the
/// input.
pub fn strip_comments(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	let mut chars = text.chars().peekable();
	let mut quote: Option<char> = None;
	let mut escaped = false;

	while let Some(c) = chars.next() {
		if let Some(q) = quote {
			out.push(c);
			if escaped {
				escaped = false;
			} else if c == '\\' {
				escaped = true;
			} else if c == q {
				quote = None;
			}
			continue;
		}

		match (c, chars.peek().copied()) {
			('"' | '\'', _) => {
				quote = Some(c);
				out.push(c);
			}
			('/', Some('/')) => {
				for skipped in chars.by_ref() {
					if skipped == '\n' {
						out.push('\n');
						break;
					}
				}
			}
			('/', Some('*')) => {
				chars.next();
				let mut prev = '\0';
				for skipped in chars.by_ref() {
					if prev == '*' && skipped == '/' {
						break;
					}
					prev = skipped;
				}
			}
			_ => out.push(c),
		}
	}
	out
}

/// Strip comments, parse, and normalize document text.
///
/// Either a complete graph is returned or a single [`GraphError::Parse`];
/// nothing is partially applied.
///
/// [`GraphError::Parse`]: crate::error::GraphError::Parse
pub fn parse_document(text: &str) -> Result<Graph> {
	let cleaned = strip_comments(text);
	let doc: Value = serde_json::from_str(&cleaned)?;
	Ok(normalize(&doc))
}

/// Normalize an already-parsed document.
pub fn normalize(doc: &Value) -> Graph {
	let root = doc.get(GRAPH_KEY).filter(|v| !v.is_null()).unwrap_or(doc);
	let mut run = Normalizer::default();
	match root {
		Value::Array(items) => {
			for item in items {
				run.visit(item, None);
			}
		}
		other => {
			run.visit(other, None);
		}
	}
	let graph = run.finish();
	debug!(
		"normalized document into {} nodes and {} edges",
		graph.node_count(),
		graph.edge_count()
	);
	graph
}

/// Trailing segment after the last `:`, `#` or `/`; the whole string when
/// that segment would be empty.
pub fn short_id(id: &str) -> &str {
	match id.rfind([':', '#', '/']) {
		Some(pos) if pos + 1 < id.len() => &id[pos + 1..],
		_ => id,
	}
}

/// Short type name from an `@type` value: first entry of an array, trailing
/// segment after the last `#`, else after the last `/`.
pub fn type_name(value: Option<&Value>) -> String {
	let first = match value {
		Some(Value::Array(items)) => items.first(),
		other => other,
	};
	let Some(Value::String(raw)) = first else {
		return DEFAULT_TYPE.to_string();
	};
	let name = match raw.rfind('#').or_else(|| raw.rfind('/')) {
		Some(pos) => &raw[pos + 1..],
		None => raw.as_str(),
	};
	if name.is_empty() {
		DEFAULT_TYPE.to_string()
	} else {
		name.to_string()
	}
}

/// Whether a string value points at another entity.
pub fn is_reference(s: &str) -> bool {
	s.starts_with("http://") || s.starts_with("https://") || s.starts_with("_:")
}

fn is_wrapped_literal(obj: &Map<String, Value>) -> bool {
	obj.contains_key(VALUE_KEY)
}

/// Convert a scalar or the payload of a `@value` wrapper to a literal.
fn literal_of(value: &Value) -> Option<Literal> {
	match value {
		Value::String(s) => Some(Literal::String(s.clone())),
		Value::Number(n) => n.as_f64().map(Literal::Number),
		Value::Bool(b) => Some(Literal::Bool(*b)),
		Value::Object(obj) => obj.get(VALUE_KEY).map(|inner| match inner {
			Value::Null => Literal::Null,
			Value::Object(_) | Value::Array(_) => Literal::String(inner.to_string()),
			scalar => literal_of(scalar).unwrap_or(Literal::Null),
		}),
		Value::Null | Value::Array(_) => None,
	}
}

/// A label candidate is usable when it is "truthy": non-empty string,
/// non-zero number, `true`, or any object/array.
fn label_candidate(value: &Value) -> Option<&Value> {
	match value {
		Value::Null => None,
		Value::Bool(false) => None,
		Value::String(s) if s.is_empty() => None,
		Value::Number(n) if n.as_f64() == Some(0.0) => None,
		other => Some(other),
	}
}

fn resolve_label(obj: &Map<String, Value>, id: &str) -> String {
	let candidate = LABEL_FIELDS
		.iter()
		.find_map(|field| obj.get(*field).and_then(label_candidate));
	match candidate {
		Some(Value::String(s)) => s.clone(),
		Some(Value::Object(inner)) => match inner.get(VALUE_KEY).and_then(label_candidate) {
			Some(Value::String(s)) => s.clone(),
			Some(v @ (Value::Number(_) | Value::Bool(_))) => v.to_string(),
			_ => id.to_string(),
		},
		Some(Value::Array(_)) => id.to_string(),
		Some(scalar) => literal_of(scalar).map(|l| l.to_string()).unwrap_or_else(|| id.to_string()),
		None => short_id(id).to_string(),
	}
}

/// State of one normalization run. Blank-node ids come from this run's own
/// node count, so equal input yields equal ids.
#[derive(Default)]
struct Normalizer {
	nodes: Vec<Arc<Node>>,
	seen: HashSet<String>,
	edges: Vec<Arc<Edge>>,
}

impl Normalizer {
	fn blank_id(&self) -> String {
		format!("_:b{}", self.nodes.len())
	}

	/// Visit one entity. Returns the id it resolved to, or `None` for values
	/// that are not entities (scalars, wrapped literals).
	fn visit(&mut self, value: &Value, parent: Option<(&str, &str)>) -> Option<String> {
		let Value::Object(obj) = value else {
			return None;
		};
		if is_wrapped_literal(obj) {
			return None;
		}

		let id = match obj.get(ID_KEY) {
			Some(Value::String(s)) if !s.is_empty() => s.clone(),
			_ => self.blank_id(),
		};

		if !self.seen.contains(&id) {
			let node = Node {
				id: id.clone(),
				node_type: type_name(obj.get(TYPE_KEY)),
				label: resolve_label(obj, &id),
				properties: obj
					.iter()
					.filter(|(key, _)| !is_reserved(key))
					.filter_map(|(key, value)| literal_of(value).map(|l| (key.clone(), l)))
					.collect::<Properties>(),
			};
			self.seen.insert(id.clone());
			self.nodes.push(Arc::new(node));
		}

		if let Some((parent_id, field)) = parent {
			self.edges
				.push(Arc::new(Edge::new(parent_id, id.as_str(), short_id(field))));
		}

		for (key, value) in obj.iter().filter(|(key, _)| !is_reserved(key)) {
			self.visit_field(&id, key, value);
		}
		Some(id)
	}

	fn visit_field(&mut self, id: &str, key: &str, value: &Value) {
		match value {
			Value::Array(items) => {
				for item in items {
					self.visit_field(id, key, item);
				}
			}
			Value::Object(obj) if !is_wrapped_literal(obj) => {
				self.visit(value, Some((id, key)));
			}
			Value::String(s) if is_reference(s) => {
				self.edges
					.push(Arc::new(Edge::new(id, s.as_str(), short_id(key))));
			}
			_ => {}
		}
	}

	fn finish(self) -> Graph {
		Graph::from_shared(self.nodes, self.edges)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;
	use proptest::prelude::*;
	use serde_json::json;

	use crate::error::GraphError;

	fn ids(g: &Graph) -> Vec<&str> {
		g.nodes().iter().map(|n| n.id.as_str()).collect()
	}

	fn edges(g: &Graph) -> Vec<(&str, &str, &str)> {
		g.edges()
			.iter()
			.map(|e| (e.source.as_str(), e.target.as_str(), e.predicate.as_str()))
			.collect()
	}

	#[test]
	fn nested_entity_becomes_node_and_edge() {
		let g = normalize(&json!({
			"@id": "n1", "name": "Alice",
			"knows": { "@id": "n2", "name": "Bob" }
		}));
		assert_eq!(ids(&g), vec!["n1", "n2"]);
		assert_eq!(g.nodes()[0].label, "Alice");
		assert_eq!(g.nodes()[1].label, "Bob");
		assert_eq!(edges(&g), vec![("n1", "n2", "knows")]);
	}

	#[test]
	fn single_entity_without_relations() {
		let g = normalize(&json!({ "@id": "x", "@type": "Person", "age": 4 }));
		assert_eq!(g.node_count(), 1);
		assert_eq!(g.edge_count(), 0);
		assert_eq!(g.nodes()[0].properties.get("age"), Some(&Literal::Number(4.0)));
	}

	#[test]
	fn graph_collection_is_iterated() {
		let g = normalize(&json!({
			"@context": { "schema": "http://schema.org/" },
			"@graph": [
				{ "@id": "http://ex.org/a", "@type": "http://schema.org/Person", "friend": "http://ex.org/b" },
				{ "@id": "http://ex.org/b", "@type": ["schema:Person", "Agent"] }
			]
		}));
		assert_eq!(ids(&g), vec!["http://ex.org/a", "http://ex.org/b"]);
		assert_eq!(g.nodes()[0].node_type, "Person");
		assert_eq!(g.nodes()[1].node_type, "schema:Person");
		assert_eq!(g.nodes()[0].label, "a");
		assert_eq!(edges(&g), vec![("http://ex.org/a", "http://ex.org/b", "friend")]);
	}

	#[test]
	fn blank_nodes_use_discovery_count() {
		let g = normalize(&json!([
			{ "name": "first", "child": { "name": "inner" } },
			{ "name": "second" }
		]));
		assert_eq!(ids(&g), vec!["_:b0", "_:b1", "_:b2"]);
		assert_eq!(edges(&g), vec![("_:b0", "_:b1", "child")]);
	}

	#[test]
	fn repeated_ids_merge_first_wins() {
		let g = normalize(&json!({
			"@graph": [
				{ "@id": "p", "name": "First", "@type": "A" },
				{ "@id": "q", "likes": { "@id": "p", "name": "Second", "@type": "B" } }
			]
		}));
		assert_eq!(g.node_count(), 2);
		let p = g.node("p").unwrap();
		assert_eq!(p.label, "First");
		assert_eq!(p.node_type, "A");
		assert_eq!(edges(&g), vec![("q", "p", "likes")]);
	}

	#[test]
	fn wrapped_literals_are_properties_not_nodes() {
		let g = normalize(&json!({
			"@id": "e",
			"title": { "@value": "Hello", "@language": "en" },
			"born": { "@value": 1990 },
			"tags": ["a", { "@value": "b" }]
		}));
		assert_eq!(g.node_count(), 1);
		assert_eq!(g.edge_count(), 0);
		let e = &g.nodes()[0];
		assert_eq!(e.label, "Hello");
		assert_eq!(e.properties.get("title"), Some(&Literal::from("Hello")));
		assert_eq!(e.properties.get("born"), Some(&Literal::Number(1990.0)));
		assert!(!e.properties.contains_key("tags"));
	}

	#[test]
	fn reserved_keys_are_not_properties() {
		let g = normalize(&json!({ "@id": "r", "@type": "T", "@language": "en", "k": true }));
		let keys: Vec<_> = g.nodes()[0].properties.iter().map(|(k, _)| k).collect();
		assert_eq!(keys, vec!["k"]);
	}

	#[test]
	fn uri_strings_emit_edges_without_nodes() {
		let g = normalize(&json!({
			"@id": "s",
			"homepage": "https://example.org",
			"ref": ["_:b9", "plain text"]
		}));
		assert_eq!(g.node_count(), 1);
		assert_eq!(
			edges(&g),
			vec![("s", "https://example.org", "homepage"), ("s", "_:b9", "ref")]
		);
	}

	#[test]
	fn predicate_uses_trailing_segment() {
		let g = normalize(&json!({
			"@id": "s",
			"http://schema.org/knows": { "@id": "t" },
			"foaf:member": { "@id": "u" }
		}));
		let preds: Vec<_> = g.edges().iter().map(|e| e.predicate.as_str()).collect();
		assert_eq!(preds, vec!["knows", "member"]);
	}

	#[test]
	fn label_preference_order() {
		let g = normalize(&json!([
			{ "@id": "a", "title": "T", "label": "L" },
			{ "@id": "ex:b", "name": "" },
			{ "@id": "c", "name": ["x"] }
		]));
		assert_eq!(g.nodes()[0].label, "L");
		assert_eq!(g.nodes()[1].label, "b");
		assert_eq!(g.nodes()[2].label, "c");
	}

	#[test]
	fn scalar_roots_produce_nothing() {
		assert!(normalize(&json!(5)).is_empty());
		assert!(normalize(&json!(["a", 1, null])).is_empty());
		assert!(normalize(&json!({ "@value": "lit" })).is_empty());
	}

	#[test]
	fn strip_comments_respects_strings() {
		let text = r#"{
			// leading comment
			"url": "http://example.org/a//b", /* block */
			"note": "keep /* this */ too", 'single': "x" // trailing
		}"#;
		let cleaned = strip_comments(text);
		assert!(cleaned.contains("http://example.org/a//b"));
		assert!(cleaned.contains("keep /* this */ too"));
		assert!(!cleaned.contains("leading comment"));
		assert!(!cleaned.contains("block"));
		assert!(!cleaned.contains("trailing"));
	}

	#[test]
	fn strip_comments_handles_escaped_quotes() {
		let cleaned = strip_comments(r#"{"a": "say \"hi\" // not a comment"}"#);
		assert_eq!(cleaned, r#"{"a": "say \"hi\" // not a comment"}"#);
	}

	#[test]
	fn parse_document_with_comments() {
		let g = parse_document(
			r#"
			// people
			{ "@id": "n1", "name": "Alice", "knows": { "@id": "n2", "name": "Bob" } }
			"#,
		)
		.unwrap();
		assert_eq!(g.node_count(), 2);
	}

	#[test]
	fn malformed_document_is_one_error() {
		let err = parse_document("{ \"@id\": \"x\", ").unwrap_err();
		assert!(matches!(err, GraphError::Parse { line: 1, .. }));
		assert!(err.to_string().starts_with("invalid document"));
	}

	#[test]
	fn short_id_forms() {
		assert_eq!(short_id("_:b3"), "b3");
		assert_eq!(short_id("http://ex.org/people#bob"), "bob");
		assert_eq!(short_id("plain"), "plain");
		assert_eq!(short_id("http://ex.org/"), "http://ex.org/");
	}

	fn entity() -> impl Strategy<Value = Value> {
		let leaf = prop_oneof![
			"[a-z]{1,6}".prop_map(Value::from),
			(0i64..100).prop_map(Value::from),
			"[a-z]{1,4}".prop_map(|s| Value::from(format!("http://ex.org/{s}"))),
			"[0-9]{1,2}".prop_map(|s| Value::from(format!("_:b{s}"))),
		];
		leaf.prop_recursive(3, 24, 4, |inner| {
			prop_oneof![
				prop::collection::vec(inner.clone(), 0..3).prop_map(Value::Array),
				(
					prop::option::of("[a-z]{1,3}"),
					prop::collection::btree_map("[a-z]{1,5}", inner, 0..4)
				)
					.prop_map(|(id, fields)| {
						let mut obj: Map<String, Value> = fields.into_iter().collect();
						if let Some(id) = id {
							obj.insert(ID_KEY.to_string(), Value::from(id));
						}
						Value::Object(obj)
					}),
			]
		})
	}

	proptest! {
		#[test]
		fn every_edge_endpoint_is_a_node_or_reference(doc in entity()) {
			let g = normalize(&doc);
			let ids = g.node_ids();
			for e in g.edges() {
				prop_assert!(!e.predicate.is_empty());
				for end in [&e.source, &e.target] {
					prop_assert!(ids.contains(end.as_str()) || is_reference(end));
				}
			}
		}

		#[test]
		fn node_ids_are_unique(doc in entity()) {
			let g = normalize(&doc);
			prop_assert_eq!(g.node_ids().len(), g.node_count());
		}
	}
}
