//! Graph model, document normalization and filtering.

pub mod filter;
pub mod model;
pub mod normalize;

pub use filter::{DEFAULT_NAMESPACE, FilterConfig, FilterCounts, FilterOptions, apply_filters, namespace_of};
pub use model::{DEFAULT_TYPE, Edge, Graph, GraphStats, Incidence, Literal, Node, Properties};
pub use normalize::{RESERVED_KEYWORDS, is_reference, normalize, parse_document, short_id, strip_comments, type_name};
