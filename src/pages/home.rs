use leptos::prelude::*;
use log::{info, warn};

use crate::components::graph_canvas::GraphCanvas;
use crate::graph::{FilterConfig, FilterCounts, Graph, apply_filters, parse_document};
use crate::layout::LayoutKind;

const SAMPLE_DOCUMENT: &str = include_str!("../../assets/sample.jsonld");

/// Visualizer page: document editor, search box, layout picker and canvas.
#[component]
pub fn Home() -> impl IntoView {
	let document = RwSignal::new(SAMPLE_DOCUMENT.to_string());
	let parse_error = RwSignal::new(None::<String>);
	let source = RwSignal::new(parse_document(SAMPLE_DOCUMENT).unwrap_or_default());
	let epoch = RwSignal::new(0u64);
	let search = RwSignal::new(String::new());
	let kind = RwSignal::new(LayoutKind::default());

	// A document that fails to parse leaves the last good graph on screen.
	let load = move |_| match parse_document(&document.get_untracked()) {
		Ok(graph) => {
			info!("loaded document: {} nodes, {} edges", graph.node_count(), graph.edge_count());
			source.set(graph);
			parse_error.set(None);
			epoch.update(|e| *e += 1);
		}
		Err(err) => {
			warn!("document rejected: {err}");
			parse_error.set(Some(err.to_string()));
		}
	};

	let filtered = Memo::new(move |_| {
		let config = FilterConfig {
			search: search.get(),
			..FilterConfig::default()
		};
		source.with(|graph| apply_filters(graph, &config))
	});
	let counts = move || source.with(|full| filtered.with(|kept| FilterCounts::between(full, kept)));
	let graph = Signal::derive(move || -> Graph { filtered.get() });

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-graph">
				<GraphCanvas graph=graph kind=kind epoch=epoch fullscreen=true />
				<div class="graph-overlay">
					<h1>"Linked-Data Graph"</h1>
					<p class="subtitle">"Hover to highlight neighbours. Scroll to zoom. Drag background to pan."</p>

					<textarea
						class="document-editor"
						rows="12"
						prop:value=move || document.get()
						on:input=move |ev| document.set(event_target_value(&ev))
					/>
					<button on:click=load>"Load document"</button>
					{move || parse_error.get().map(|msg| view! { <p class="parse-error">{msg}</p> })}

					<input
						type="search"
						placeholder="Search labels, ids, values"
						prop:value=move || search.get()
						on:input=move |ev| search.set(event_target_value(&ev))
					/>

					<select on:change=move |ev| {
						if let Some(next) = LayoutKind::from_key(&event_target_value(&ev)) {
							kind.set(next);
						}
					}>
						{LayoutKind::ALL
							.into_iter()
							.map(|k| {
								view! {
									<option value=k.key() selected=move || kind.get() == k>
										{k.name()}
									</option>
								}
							})
							.collect_view()}
					</select>

					<p class="filter-counts">
						{move || {
							let c = counts();
							format!(
								"{} of {} nodes, {} of {} edges",
								c.nodes_after,
								c.nodes_before,
								c.edges_after,
								c.edges_before,
							)
						}}
					</p>
				</div>
			</div>
		</ErrorBoundary>
	}
}
