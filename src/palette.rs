//! Type colours for the renderer.

/// Colours handed out in first-seen order, wrapping around.
pub const PALETTE: [&str; 12] = [
	"#6366f1", "#8b5cf6", "#a855f7", "#ec4899", "#14b8a6", "#22c55e", "#eab308", "#f97316",
	"#3b82f6", "#06b6d4", "#f43f5e", "#84cc16",
];

/// Memoized type -> colour assignment.
///
/// Owned by whoever renders, and reset whenever a fresh document is
/// normalized so colours follow the new document's type order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorRegistry {
	assigned: Vec<String>,
}

impl ColorRegistry {
	/// Empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Colour for `node_type`, assigning the next palette slot on first use.
	pub fn color_for(&mut self, node_type: &str) -> &'static str {
		let slot = match self.assigned.iter().position(|t| t == node_type) {
			Some(slot) => slot,
			None => {
				self.assigned.push(node_type.to_string());
				self.assigned.len() - 1
			}
		};
		PALETTE[slot % PALETTE.len()]
	}

	/// Colour already assigned to `node_type`, without assigning one.
	pub fn get(&self, node_type: &str) -> Option<&'static str> {
		self.assigned
			.iter()
			.position(|t| t == node_type)
			.map(|slot| PALETTE[slot % PALETTE.len()])
	}

	/// Assign colours to `types` in order.
	pub fn register<'a>(&mut self, types: impl IntoIterator<Item = &'a str>) {
		for ty in types {
			self.color_for(ty);
		}
	}

	/// Forget every assignment.
	pub fn reset(&mut self) {
		self.assigned.clear();
	}

	/// Number of types seen.
	pub fn len(&self) -> usize {
		self.assigned.len()
	}

	/// Whether no type has been seen.
	pub fn is_empty(&self) -> bool {
		self.assigned.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn first_seen_order_and_wrap() {
		let mut colors = ColorRegistry::new();
		assert_eq!(colors.color_for("Person"), PALETTE[0]);
		assert_eq!(colors.color_for("Org"), PALETTE[1]);
		assert_eq!(colors.color_for("Person"), PALETTE[0]);
		colors.register((0..11).map(|_| "x").chain(["a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k"]));
		assert_eq!(colors.len(), 14);
		assert_eq!(colors.get("k"), Some(PALETTE[1]));
		assert_eq!(colors.get("missing"), None);
	}

	#[test]
	fn first_types_get_indigo_then_violet() {
		let mut colors = ColorRegistry::new();
		assert_eq!(colors.color_for("Person"), "#6366f1");
		assert_eq!(colors.color_for("Organization"), "#8b5cf6");
		assert_eq!(PALETTE[11], "#84cc16");
	}

	#[test]
	fn reset_restarts_assignment() {
		let mut colors = ColorRegistry::new();
		colors.register(["A", "B"]);
		colors.reset();
		assert!(colors.is_empty());
		assert_eq!(colors.color_for("B"), PALETTE[0]);
	}
}
