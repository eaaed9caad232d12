use leptos::prelude::*;

use super::geometry::Point;
use super::state::Selection;
use super::types::NodeKey;

/// Horizontal offset of the panel from the selected node's center.
pub const PANEL_OFFSET: f64 = 260.0;
/// Room needed to the right of the node before the panel flips.
pub const PANEL_ROOM: f64 = 600.0;
/// Shift applied when the panel flips to the left of the node.
pub const PANEL_FLIP: f64 = 610.0;

const ACCENTS: [&str; 6] = ["#FFECB3", "#C8E6C9", "#B3E5FC", "#D1C4E9", "#FFCDD2", "#F0F4C3"];

/// Fixed-position coordinates of the detail panel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PanelPlacement {
	pub left: f64,
	pub top: f64,
	pub flipped: bool,
}

pub fn panel_placement(anchor: Point, viewport_width: f64) -> PanelPlacement {
	let flipped = anchor.x + PANEL_ROOM > viewport_width;
	PanelPlacement {
		left: anchor.x + PANEL_OFFSET - if flipped { PANEL_FLIP } else { 0.0 },
		top: anchor.y,
		flipped,
	}
}

/// Stable header tint for a node, picked from its key's characters.
pub fn accent_color(key: &NodeKey) -> &'static str {
	let sum: u32 = key.to_string().chars().map(u32::from).sum();
	ACCENTS[sum as usize % ACCENTS.len()]
}

fn window_width() -> f64 {
	web_sys::window()
		.and_then(|w| w.inner_width().ok())
		.and_then(|v| v.as_f64())
		.unwrap_or(f64::INFINITY)
}

/// Floating card describing the selected node.
#[component]
pub fn NodeDetailPanel(#[prop(into)] selection: Signal<Option<Selection>>, on_close: Callback<()>) -> impl IntoView {
	move || {
		selection.get().map(|sel| {
			let place = panel_placement(sel.position, window_width());
			let node = sel.node;
			let accent = accent_color(&node.key);
			let lane = node.lane.as_ref().map(ToString::to_string).unwrap_or_default();
			let fields = node
				.extra
				.into_iter()
				.map(|(name, value)| {
					view! {
						<div class="detail-field">
							<span class="detail-field-name">{name}</span>
							<span class="detail-field-value">{value}</span>
						</div>
					}
				})
				.collect_view();
			view! {
				<div
					class="node-detail-panel"
					style:position="fixed"
					style:left=format!("{}px", place.left)
					style:top=format!("{}px", place.top)
				>
					<div class="detail-header" style:background-color=accent>
						<span class="detail-swatch" style:background-color=node.fill></span>
						<h3>{node.text}</h3>
						<button class="detail-close" title="Close" on:click=move |_| on_close.run(())>
							"×"
						</button>
					</div>
					<div class="detail-body">
						<div class="detail-field">
							<span class="detail-field-name">"Lane"</span>
							<span class="detail-field-value">{lane}</span>
						</div>
						{fields}
					</div>
				</div>
			}
		})
	}
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::*;

	#[rstest]
	#[case(Point::new(100.0, 40.0), 1280.0, 360.0, false)]
	#[case(Point::new(680.0, 40.0), 1280.0, 940.0, false)]
	#[case(Point::new(681.0, 40.0), 1280.0, 331.0, true)]
	#[case(Point::new(900.0, 40.0), 1280.0, 550.0, true)]
	fn panel_flips_near_the_right_edge(
		#[case] anchor: Point,
		#[case] width: f64,
		#[case] left: f64,
		#[case] flipped: bool,
	) {
		let place = panel_placement(anchor, width);
		assert_eq!(place.left, left);
		assert_eq!(place.top, anchor.y);
		assert_eq!(place.flipped, flipped);
	}

	#[test]
	fn accent_is_stable_per_key() {
		let a = accent_color(&"n3".into());
		assert_eq!(a, accent_color(&"n3".into()));
		assert!(ACCENTS.contains(&a));
		// '1' is 49
		assert_eq!(accent_color(&1.into()), ACCENTS[49 % 6]);
	}
}
