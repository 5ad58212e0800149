//! Error type shared by the normalizer, the graph model and configuration loading.

use thiserror::Error;

/// Errors surfaced by the core pipeline.
///
/// Dangling edges and empty graphs are not errors: every layout degrades to
/// empty output instead.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraphError {
	/// The document text could not be structurally parsed.
	#[error("invalid document at line {line}, column {column}: {message}")]
	Parse {
		/// 1-based line of the failure.
		line: usize,
		/// 1-based column of the failure.
		column: usize,
		/// Parser message.
		message: String,
	},

	/// Two nodes with the same id were supplied to a graph constructor.
	#[error("duplicate node id `{0}`")]
	DuplicateNode(String),

	/// A patched node does not match any node of the graph.
	#[error("no node with id `{0}`")]
	UnknownNode(String),

	/// Configuration JSON could not be read.
	#[error("invalid configuration: {0}")]
	Config(String),
}

impl From<serde_json::Error> for GraphError {
	fn from(err: serde_json::Error) -> Self {
		GraphError::Parse {
			line: err.line(),
			column: err.column(),
			message: err.to_string(),
		}
	}
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, GraphError>;
