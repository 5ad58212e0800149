//! Linked-data graph visualizer.
//!
//! The core turns a JSON-LD style document into a [`graph::Graph`], filters
//! it, and computes geometry for a choice of layouts. With the `csr` feature
//! the crate also builds the Leptos client-side app that draws them.

pub mod config;
pub mod error;
pub mod graph;
pub mod layout;
pub mod palette;

#[cfg(feature = "csr")]
mod components;
#[cfg(feature = "csr")]
mod pages;

pub use config::VisualizerConfig;
pub use error::{GraphError, Result};
pub use graph::{Graph, apply_filters, parse_document};
pub use layout::{LayoutKind, LayoutOutput, compute_layout};

#[cfg(target_arch = "wasm32")]
use getrandom as _;

#[cfg(feature = "csr")]
pub use app::{App, init_logging};

#[cfg(feature = "csr")]
mod app {
	use leptos::prelude::*;
	use leptos_meta::*;
	use leptos_router::components::*;
	use leptos_router::path;
	use log::{Level, info};

	// Top-Level pages
	use crate::pages::home::Home;
	use crate::pages::not_found::NotFound;

	/// Initialize logging and panic hooks for the WASM target.
	pub fn init_logging() {
		let _ = console_log::init_with_level(Level::Debug);
		console_error_panic_hook::set_once();
		info!("Logging initialized");
	}

	/// An app router which renders the visualizer and handles 404's
	#[component]
	pub fn App() -> impl IntoView {
		provide_meta_context();

		view! {
			<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />

			<Title text="Linked-data graph canvas" />

			<Meta charset="UTF-8" />
			<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

			<Router>
				<Routes fallback=|| view! { <NotFound /> }>
					<Route path=path!("/") view=Home />
				</Routes>
			</Router>
		}
	}
}
