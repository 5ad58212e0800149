//! Aggregate settings for filtering and every layout.

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};
use crate::graph::FilterConfig;
use crate::layout::circular::{ArcConfig, BundleConfig, ChordConfig, RadialConfig};
use crate::layout::force::ForceConfig;
use crate::layout::layered::{FlowConfig, HierarchyConfig};
use crate::layout::matrix::MatrixConfig;
use crate::layout::type_grid::TypeGridConfig;

/// Everything a host can tune. Missing JSON fields take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct VisualizerConfig {
	/// Filter settings.
	pub filter: FilterConfig,
	/// Force simulation.
	pub force: ForceConfig,
	/// Layered flow.
	pub flow: FlowConfig,
	/// Ranked boxes.
	pub hierarchy: HierarchyConfig,
	/// Rings by type.
	pub radial: RadialConfig,
	/// Chord diagram.
	pub chord: ChordConfig,
	/// Arc diagram.
	pub arc: ArcConfig,
	/// Bundled circle.
	pub bundle: BundleConfig,
	/// Adjacency matrix.
	pub matrix: MatrixConfig,
	/// Entity-relationship grid.
	pub type_grid: TypeGridConfig,
}

impl VisualizerConfig {
	/// Parse a (possibly partial) JSON configuration.
	pub fn from_json(text: &str) -> Result<Self> {
		serde_json::from_str(text).map_err(|e| GraphError::Config(e.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn partial_json_keeps_defaults() {
		let cfg = VisualizerConfig::from_json(
			r#"{"force":{"restLength":5},"filter":{"search":"bob"},"typeGrid":{"boxWidth":150}}"#,
		)
		.unwrap();
		assert_eq!(cfg.filter.search, "bob");
		assert_eq!(cfg.force.rest_length, 5.0);
		assert_eq!(cfg.force.spring, 0.04);
		assert_eq!(cfg.type_grid.box_width, 150.0);
		assert_eq!(cfg.type_grid.columns, 3);
	}

	#[test]
	fn misspelled_keys_are_rejected() {
		for text in [
			r#"{"force":{"rest_length":5}}"#,
			r#"{"type_grid":{}}"#,
			r#"{"filter":{"minConnection":2}}"#,
		] {
			let err = VisualizerConfig::from_json(text).unwrap_err();
			assert!(matches!(err, GraphError::Config(_)), "{text}: {err:?}");
		}
	}

	#[test]
	fn invalid_json_is_a_config_error() {
		let err = VisualizerConfig::from_json("{\"force\": 3}").unwrap_err();
		assert!(matches!(err, GraphError::Config(_)));
	}
}
