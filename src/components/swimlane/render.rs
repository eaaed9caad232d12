use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::config::CANVAS_BACKGROUND;
use super::geometry::{Point, Rect};
use super::routing::RoutedEdge;
use super::state::SwimlaneState;

const LANE_BORDER: &str = "#c8c8c8";
const LANE_LABEL: &str = "#333333";
const NODE_TEXT: &str = "#222222";
const SELECTION_OUTLINE: &str = "#1a73e8";

/// One drawing instruction of an edge polyline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathCmd {
	MoveTo(Point),
	LineTo(Point),
	/// Rounded corner at `corner` heading towards `toward`.
	Corner { corner: Point, toward: Point, radius: f64 },
	/// Half-circle hop centered on `at`, travelling along `dir`.
	Jump { at: Point, dir: (f64, f64), radius: f64 },
}

fn unit(a: Point, b: Point) -> (f64, f64) {
	let len = a.distance(b);
	if len == 0.0 {
		(0.0, 0.0)
	} else {
		((b.x - a.x) / len, (b.y - a.y) / len)
	}
}

/// Turns a routed polyline into drawing commands: corners are rounded by up
/// to `corner` and crossings in `jumps` become hops of `jump_radius`. Hops
/// too close to a corner are dropped.
pub fn edge_path(points: &[Point], jumps: &[Point], corner: f64, jump_radius: f64) -> Vec<PathCmd> {
	let mut cmds = Vec::new();
	let Some(&first) = points.first() else {
		return cmds;
	};
	cmds.push(PathCmd::MoveTo(first));
	let last = points.len() - 1;
	for i in 1..points.len() {
		let (a, b) = (points[i - 1], points[i]);
		let dir = unit(a, b);
		let len = a.distance(b);
		let radius_at = |j: usize| -> f64 {
			if j == 0 || j == last {
				return 0.0;
			}
			let half = points[j - 1].distance(points[j]).min(points[j].distance(points[j + 1])) / 2.0;
			corner.min(half)
		};
		let (start_trim, end_trim) = (radius_at(i - 1), radius_at(i));

		let mut hops: Vec<(f64, Point)> = jumps
			.iter()
			.filter_map(|&j| {
				let t = (j.x - a.x) * dir.0 + (j.y - a.y) * dir.1;
				let off = ((j.x - a.x) * -dir.1 + (j.y - a.y) * dir.0).abs();
				let clear = t - jump_radius > start_trim && t + jump_radius < len - end_trim;
				(off < 1e-6 && clear).then_some((t, j))
			})
			.collect();
		hops.sort_by(|x, y| x.0.total_cmp(&y.0));
		for (_, at) in hops {
			cmds.push(PathCmd::LineTo(Point::new(at.x - dir.0 * jump_radius, at.y - dir.1 * jump_radius)));
			cmds.push(PathCmd::Jump {
				at,
				dir,
				radius: jump_radius,
			});
		}

		if end_trim > 0.0 {
			cmds.push(PathCmd::Corner {
				corner: b,
				toward: points[i + 1],
				radius: end_trim,
			});
		} else {
			cmds.push(PathCmd::LineTo(b));
		}
	}
	cmds
}

/// Greedy word wrap against a width measure. Words wider than `max_width`
/// keep a line of their own.
pub fn wrap_text(text: &str, max_width: f64, measure: impl Fn(&str) -> f64) -> Vec<String> {
	let mut lines = Vec::new();
	for paragraph in text.lines() {
		let mut line = String::new();
		for word in paragraph.split_whitespace() {
			if line.is_empty() {
				line.push_str(word);
				continue;
			}
			let candidate = format!("{line} {word}");
			if measure(&candidate) <= max_width {
				line = candidate;
			} else {
				lines.push(std::mem::replace(&mut line, word.to_owned()));
			}
		}
		if !line.is_empty() {
			lines.push(line);
		}
	}
	lines
}

pub fn render(state: &SwimlaneState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(CANVAS_BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.viewport.width, state.viewport.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_lanes(state, ctx);
	for edge in &state.routes {
		draw_edge(state, ctx, edge);
	}
	draw_nodes(state, ctx);
	ctx.restore();
}

fn draw_lanes(state: &SwimlaneState, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	for lane in &state.layout.lanes {
		let r = lane.rect;
		ctx.set_fill_style_str(&lane.color);
		ctx.fill_rect(r.x, r.y, r.width, r.height);

		ctx.set_global_alpha(0.6);
		ctx.fill_rect(lane.header.x, lane.header.y, lane.header.width, lane.header.height);
		ctx.set_global_alpha(1.0);

		ctx.set_stroke_style_str(LANE_BORDER);
		ctx.set_line_width(1.0 / k);
		ctx.stroke_rect(r.x, r.y, r.width, r.height);

		ctx.set_fill_style_str(LANE_LABEL);
		ctx.set_font("bold 14px sans-serif");
		ctx.set_text_align("left");
		ctx.set_text_baseline("middle");
		let _ = ctx.fill_text(
			&lane.label,
			lane.header.x + state.config.lane_padding,
			lane.header.y + lane.header.height / 2.0,
		);
	}
}

fn draw_edge(state: &SwimlaneState, ctx: &CanvasRenderingContext2d, edge: &RoutedEdge) {
	let n = edge.points.len();
	if n < 2 {
		return;
	}
	let config = &state.config;
	let tip = edge.points[n - 1];
	let dir = unit(edge.points[n - 2], tip);
	let arrow = config.short_length.min(edge.points[n - 2].distance(tip));
	let mut points = edge.points.clone();
	points[n - 1] = Point::new(tip.x - dir.0 * arrow, tip.y - dir.1 * arrow);

	ctx.set_stroke_style_str(&config.edge_color);
	ctx.set_line_width(1.5);
	if edge.fallback {
		let _ = ctx.set_line_dash(&js_sys::Array::of2(&JsValue::from_f64(6.0), &JsValue::from_f64(4.0)));
	}
	ctx.begin_path();
	for cmd in edge_path(&points, &edge.jumps, config.corner, config.jump_radius) {
		match cmd {
			PathCmd::MoveTo(p) => ctx.move_to(p.x, p.y),
			PathCmd::LineTo(p) => ctx.line_to(p.x, p.y),
			PathCmd::Corner { corner, toward, radius } => {
				let _ = ctx.arc_to(corner.x, corner.y, toward.x, toward.y, radius);
			}
			PathCmd::Jump { at, dir, radius } => {
				let start = (-dir.1).atan2(-dir.0);
				let end = dir.1.atan2(dir.0);
				let _ = ctx.arc_with_anticlockwise(at.x, at.y, radius, start, end, dir.0 < 0.0 || dir.1 < 0.0);
			}
		}
	}
	ctx.stroke();
	let _ = ctx.set_line_dash(&js_sys::Array::new());

	let back = points[n - 1];
	let (px, py) = (-dir.1 * arrow * 0.5, dir.0 * arrow * 0.5);
	ctx.set_fill_style_str(&config.edge_color);
	ctx.begin_path();
	ctx.move_to(tip.x, tip.y);
	ctx.line_to(back.x + px, back.y + py);
	ctx.line_to(back.x - px, back.y - py);
	ctx.close_path();
	ctx.fill();
}

fn rounded_rect(ctx: &CanvasRenderingContext2d, r: &Rect, radius: f64) {
	let radius = radius.min(r.width / 2.0).min(r.height / 2.0);
	ctx.begin_path();
	ctx.move_to(r.x + radius, r.y);
	let _ = ctx.arc_to(r.right(), r.y, r.right(), r.bottom(), radius);
	let _ = ctx.arc_to(r.right(), r.bottom(), r.x, r.bottom(), radius);
	let _ = ctx.arc_to(r.x, r.bottom(), r.x, r.y, radius);
	let _ = ctx.arc_to(r.x, r.y, r.right(), r.y, radius);
	ctx.close_path();
}

fn draw_nodes(state: &SwimlaneState, ctx: &CanvasRenderingContext2d) {
	let config = &state.config;
	let k = state.transform.k;
	let selected = state.selection.as_ref().map(|s| &s.node.key);
	let line_height = config.font_size * 1.2;

	for node in &state.layout.nodes {
		let Some(record) = state.data.node(&node.key) else {
			continue;
		};
		let r = node.rect;
		let highlighted = state.highlighted.contains(&node.key);

		rounded_rect(ctx, &r, config.corner);
		ctx.set_fill_style_str(state.fill_for(&node.key).unwrap_or(&config.default_fill));
		ctx.fill();
		ctx.set_stroke_style_str(state.stroke_for(&node.key).unwrap_or(&config.default_stroke));
		ctx.set_line_width(if highlighted { 3.0 } else { 1.5 });
		ctx.stroke();

		if selected == Some(&node.key) {
			let outline = r.inflate(4.0 / k);
			rounded_rect(ctx, &outline, config.corner + 4.0 / k);
			ctx.set_stroke_style_str(SELECTION_OUTLINE);
			ctx.set_line_width(2.0 / k);
			let _ = ctx.set_line_dash(&js_sys::Array::of2(
				&JsValue::from_f64(6.0 / k),
				&JsValue::from_f64(3.0 / k),
			));
			ctx.stroke();
			let _ = ctx.set_line_dash(&js_sys::Array::new());
		}

		ctx.set_fill_style_str(NODE_TEXT);
		ctx.set_font(&format!("{}px sans-serif", config.font_size));
		ctx.set_text_align("center");
		ctx.set_text_baseline("middle");
		let inner_width = r.width - 2.0 * config.text_margin;
		let max_lines = (((r.height - 2.0 * config.text_margin) / line_height).floor() as usize).max(1);
		let mut lines = wrap_text(&record.text, inner_width, |s| {
			ctx.measure_text(s).map(|m| m.width()).unwrap_or(0.0)
		});
		lines.truncate(max_lines);
		let c = r.center();
		let top = c.y - line_height * (lines.len() as f64 - 1.0) / 2.0;
		for (i, line) in lines.iter().enumerate() {
			let _ = ctx.fill_text_with_max_width(line, c.x, top + line_height * i as f64, inner_width);
		}
	}
}
