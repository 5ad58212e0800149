use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::state::{CanvasState, NODE_RADIUS};
use crate::layout::{Anchor, PathDescriptor, Point, PositionedNode, RoutedEdge};

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

pub fn render(state: &CanvasState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str("#0f172a");
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_guides(state, ctx);
	draw_edges(state, ctx);
	draw_nodes(state, ctx);
	ctx.restore();
}

/// Append `path` to the current canvas path.
fn trace(ctx: &CanvasRenderingContext2d, path: &PathDescriptor) {
	match path {
		PathDescriptor::Line { from, to } => {
			ctx.move_to(from.x, from.y);
			ctx.line_to(to.x, to.y);
		}
		PathDescriptor::Quadratic { from, control, to } => {
			ctx.move_to(from.x, from.y);
			ctx.quadratic_curve_to(control.x, control.y, to.x, to.y);
		}
		PathDescriptor::Cubic {
			from,
			control1,
			control2,
			to,
		} => {
			ctx.move_to(from.x, from.y);
			ctx.bezier_curve_to(control1.x, control1.y, control2.x, control2.y, to.x, to.y);
		}
		PathDescriptor::Arc {
			center,
			radius,
			start_angle,
			end_angle,
		} => {
			let start = path.start();
			ctx.move_to(start.x, start.y);
			let _ = ctx.arc(center.x, center.y, *radius, *start_angle, *end_angle);
		}
		PathDescriptor::Circle { center, radius } => {
			ctx.move_to(center.x + radius, center.y);
			let _ = ctx.arc(center.x, center.y, *radius, 0.0, 2.0 * PI);
		}
		PathDescriptor::Rect { x, y, width, height } => ctx.rect(*x, *y, *width, *height),
	}
}

/// Point the curve arrives from, for arrow heads.
fn approach(path: &PathDescriptor) -> Point {
	match path {
		PathDescriptor::Line { from, .. } => *from,
		PathDescriptor::Quadratic { control, .. } => *control,
		PathDescriptor::Cubic { control2, .. } => *control2,
		other => other.start(),
	}
}

fn draw_guides(state: &CanvasState, ctx: &CanvasRenderingContext2d) {
	ctx.set_stroke_style_str("rgba(148, 163, 184, 0.18)");
	ctx.set_line_width(1.0 / state.transform.k);
	for guide in &state.layout.guides {
		ctx.begin_path();
		trace(ctx, guide);
		ctx.stroke();
	}
}

fn draw_arrow(ctx: &CanvasRenderingContext2d, edge: &RoutedEdge, inset: f64, size: f64) {
	let tip = edge.path.end();
	let back = approach(&edge.path);
	let (dx, dy) = (tip.x - back.x, tip.y - back.y);
	let dist = dx.hypot(dy);
	if dist < 0.001 {
		return;
	}
	let (ux, uy) = (dx / dist, dy / dist);
	let (tip_x, tip_y) = (tip.x - ux * inset, tip.y - uy * inset);
	let (back_x, back_y) = (tip_x - ux * size, tip_y - uy * size);
	let (px, py) = (-uy * size * 0.5, ux * size * 0.5);
	ctx.begin_path();
	ctx.move_to(tip_x, tip_y);
	ctx.line_to(back_x + px, back_y + py);
	ctx.line_to(back_x - px, back_y - py);
	ctx.close_path();
	ctx.fill();
}

fn draw_edges(state: &CanvasState, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	let (line_width, dash, gap, arrow_size) = (1.5 / k, 8.0 / k, 4.0 / k, 8.0 / k);
	let dash_offset = -(state.flow_time * 30.0) % (dash + gap);
	let t = ease_out_cubic(state.hover.highlight_t);
	let inset = if state.layout.anchor == Anchor::Center { NODE_RADIUS } else { 0.0 };

	for edge in &state.layout.edges {
		let is_highlighted = state.is_highlighted(&edge.source_id) && state.is_highlighted(&edge.target_id);

		// t=0: all edges at base (0.6), t=1: highlighted at 0.9, others at 0.15
		let (edge_alpha, arrow_alpha, width) = if is_highlighted {
			(0.6 + 0.3 * t, 0.8 + 0.1 * t, line_width * (1.0 + 0.3 * t))
		} else {
			(0.6 - 0.45 * t, 0.8 - 0.45 * t, line_width * (1.0 - 0.3 * t))
		};

		if let PathDescriptor::Rect { .. } = edge.path {
			ctx.set_fill_style_str(&format!("rgba(99, 102, 241, {edge_alpha})"));
			ctx.begin_path();
			trace(ctx, &edge.path);
			ctx.fill();
			continue;
		}

		ctx.set_stroke_style_str(&format!("rgba(100, 180, 255, {edge_alpha})"));
		ctx.set_line_width(width);
		if let PathDescriptor::Line { .. } = edge.path {
			let _ = ctx.set_line_dash(&js_sys::Array::of2(&JsValue::from_f64(dash), &JsValue::from_f64(gap)));
			ctx.set_line_dash_offset(dash_offset);
		}
		ctx.begin_path();
		trace(ctx, &edge.path);
		ctx.stroke();
		let _ = ctx.set_line_dash(&js_sys::Array::new());

		ctx.set_fill_style_str(&format!("rgba(100, 180, 255, {arrow_alpha})"));
		draw_arrow(ctx, edge, inset, arrow_size);

		if let Some(label) = &edge.label {
			let (a, b) = (edge.path.start(), edge.path.end());
			let mid = a.lerp(&b, 0.5);
			ctx.set_fill_style_str(&format!("rgba(226, 232, 240, {})", arrow_alpha * 0.8));
			ctx.set_font(&format!("{}px sans-serif", 10.0 / k.max(0.5)));
			let _ = ctx.fill_text(label, mid.x, mid.y - 4.0);
		}
	}
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

fn draw_shape(state: &CanvasState, ctx: &CanvasRenderingContext2d, node: &PositionedNode, scale: f64) {
	let color = state.color_of(&node.node_type);
	if let Some(outline) = &node.outline {
		ctx.set_stroke_style_str(color);
		ctx.set_line_width(node.width * scale);
		ctx.set_line_cap("round");
		ctx.begin_path();
		trace(ctx, outline);
		ctx.stroke();
		ctx.set_line_cap("butt");
		return;
	}
	ctx.set_fill_style_str(color);
	ctx.begin_path();
	match state.layout.anchor {
		Anchor::Center => {
			let _ = ctx.arc(node.x, node.y, (node.width / 2.0) * scale, 0.0, 2.0 * PI);
		}
		Anchor::TopLeft => ctx.rect(node.x, node.y, node.width, node.height),
	}
	ctx.fill();
}

fn label_anchor(state: &CanvasState, node: &PositionedNode) -> (f64, f64) {
	match state.layout.anchor {
		Anchor::Center => (node.x + node.width / 2.0 + 3.0, node.y + 3.0),
		Anchor::TopLeft => (node.x + 6.0, node.y + node.height / 2.0 + 3.0),
	}
}

fn draw_nodes(state: &CanvasState, ctx: &CanvasRenderingContext2d) {
	let (has_highlight, t, k) = (
		state.has_active_highlight(),
		ease_out_cubic(state.hover.highlight_t),
		state.transform.k,
	);
	let font = format!("{}px sans-serif", 10.0 / k.max(0.5));

	for node in &state.layout.nodes {
		if has_highlight && state.is_highlighted(&node.id) {
			continue;
		}
		let alpha = 1.0 - 0.7 * t;
		ctx.set_global_alpha(alpha);
		draw_shape(state, ctx, node, 1.0 - 0.15 * t);
		ctx.set_global_alpha(1.0);

		let (lx, ly) = label_anchor(state, node);
		ctx.set_fill_style_str(&format!("rgba(255, 255, 255, {})", alpha * 0.8));
		ctx.set_font(&font);
		let _ = ctx.fill_text(&node.label, lx, ly);
	}

	if !has_highlight {
		return;
	}

	for node in &state.layout.nodes {
		if !state.is_highlighted(&node.id) {
			continue;
		}
		let is_hovered = state.is_hovered(&node.id);
		let scale = if is_hovered {
			1.0 + 0.35 * t
		} else if state.is_neighbor(&node.id) {
			1.0 + 0.2 * t
		} else {
			1.0
		};

		if is_hovered && t > 0.01 && state.layout.anchor == Anchor::Center && node.outline.is_none() {
			let radius = node.width / 2.0 * scale;
			let glow_radius = radius * (1.8 + 1.2 * t);
			if let Ok(gradient) = ctx.create_radial_gradient(node.x, node.y, radius * 0.3, node.x, node.y, glow_radius) {
				let alpha = 0.35 * t;
				let _ = gradient.add_color_stop(0.0, &format!("rgba(255, 255, 255, {alpha})"));
				let _ = gradient.add_color_stop(0.6, &format!("rgba(200, 220, 255, {})", alpha * 0.3));
				let _ = gradient.add_color_stop(1.0, "rgba(255, 255, 255, 0)");
				ctx.begin_path();
				let _ = ctx.arc(node.x, node.y, glow_radius, 0.0, 2.0 * PI);
				#[allow(deprecated)]
				ctx.set_fill_style(&gradient);
				ctx.fill();
			}
		}

		draw_shape(state, ctx, node, scale);

		if is_hovered && t > 0.01 {
			ctx.set_stroke_style_str(&format!("rgba(255, 255, 255, {})", 0.7 * t));
			ctx.set_line_width(1.5 / k);
			ctx.begin_path();
			match (&node.outline, state.layout.anchor) {
				(Some(outline), _) => trace(ctx, outline),
				(None, Anchor::Center) => {
					let _ = ctx.arc(node.x, node.y, node.width / 2.0 * scale + 2.0 / k, 0.0, 2.0 * PI);
				}
				(None, Anchor::TopLeft) => ctx.rect(node.x, node.y, node.width, node.height),
			}
			ctx.stroke();
		}

		let (lx, ly) = label_anchor(state, node);
		ctx.set_fill_style_str("white");
		ctx.set_font(&font);
		let _ = ctx.fill_text(&node.label, lx, ly);
	}
}
