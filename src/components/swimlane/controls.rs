use leptos::prelude::*;

use super::component::DiagramHandle;
use super::controller::{DiagramController, HistoryState};

/// Commands offered by the floating control panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ControlAction {
	ZoomIn,
	ZoomOut,
	ZoomToFit,
	ResetZoom,
	Undo,
	Redo,
}

impl ControlAction {
	/// Button order in the panel. `ResetZoom` sits on the zoom readout.
	pub const BUTTONS: [ControlAction; 5] = [
		ControlAction::ZoomIn,
		ControlAction::ZoomOut,
		ControlAction::ZoomToFit,
		ControlAction::Undo,
		ControlAction::Redo,
	];

	pub fn label(self) -> &'static str {
		match self {
			ControlAction::ZoomIn => "Zoom In",
			ControlAction::ZoomOut => "Zoom Out",
			ControlAction::ZoomToFit => "Zoom to Fit",
			ControlAction::ResetZoom => "Reset Zoom",
			ControlAction::Undo => "Undo",
			ControlAction::Redo => "Redo",
		}
	}

	pub fn icon(self) -> &'static str {
		match self {
			ControlAction::ZoomIn => "+",
			ControlAction::ZoomOut => "−",
			ControlAction::ZoomToFit => "⤢",
			ControlAction::ResetZoom => "1:1",
			ControlAction::Undo => "↶",
			ControlAction::Redo => "↷",
		}
	}

	pub fn is_enabled(self, history: HistoryState) -> bool {
		match self {
			ControlAction::Undo => history.can_undo,
			ControlAction::Redo => history.can_redo,
			_ => true,
		}
	}

	pub fn apply(self, controller: &mut DiagramController) {
		match self {
			ControlAction::ZoomIn => controller.zoom_in(),
			ControlAction::ZoomOut => controller.zoom_out(),
			ControlAction::ZoomToFit => controller.zoom_to_fit(),
			ControlAction::ResetZoom => controller.reset_zoom(),
			ControlAction::Undo => controller.undo(),
			ControlAction::Redo => controller.redo(),
		}
	}
}

/// Bottom-centered toolbar with zoom and history buttons and the zoom
/// percentage.
#[component]
pub fn ControlPanel(
	handle: DiagramHandle,
	#[prop(into)] zoom: Signal<u32>,
	#[prop(into)] history: Signal<HistoryState>,
) -> impl IntoView {
	let buttons = ControlAction::BUTTONS
		.into_iter()
		.map(|action| {
			view! {
				<button
					class="control-button"
					title=action.label()
					aria-label=action.label()
					disabled=move || !action.is_enabled(history.get())
					on:click=move |_| {
						handle.with(|c| action.apply(c));
					}
				>
					{action.icon()}
				</button>
			}
		})
		.collect_view();

	view! {
		<div class="control-panel">
			{buttons}
			<button
				class="control-zoom"
				title=ControlAction::ResetZoom.label()
				on:click=move |_| {
					handle.with(|c| ControlAction::ResetZoom.apply(c));
				}
			>
				{move || format!("{}%", zoom.get())}
			</button>
		</div>
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::swimlane::config::DiagramConfig;
	use crate::components::swimlane::state::Viewport;
	use crate::components::swimlane::types::{NodePosition, WorkflowData, WorkflowNode};

	fn mounted() -> DiagramController {
		let mut c = DiagramController::new(DiagramConfig {
			initial_auto_scale: false,
			..DiagramConfig::default()
		});
		let data = WorkflowData {
			nodes: vec![WorkflowNode::new(1, "Submit", NodePosition::Absolute { x: 0.0, y: 0.0 })],
			..Default::default()
		};
		c.mount(&data, &[], Viewport::sized(800.0, 600.0), Default::default());
		c
	}

	#[test]
	fn history_buttons_follow_availability() {
		let none = HistoryState::default();
		assert!(ControlAction::ZoomIn.is_enabled(none));
		assert!(!ControlAction::Undo.is_enabled(none));
		assert!(!ControlAction::Redo.is_enabled(none));
		let both = HistoryState {
			can_undo: true,
			can_redo: true,
		};
		assert!(ControlAction::BUTTONS.iter().all(|a| a.is_enabled(both)));
	}

	#[test]
	fn actions_drive_the_controller() {
		let mut c = mounted();
		ControlAction::ZoomIn.apply(&mut c);
		assert_eq!(c.zoom_percent(), Some(105));
		ControlAction::Undo.apply(&mut c);
		assert_eq!(c.zoom_percent(), Some(100));
		ControlAction::Redo.apply(&mut c);
		ControlAction::ZoomIn.apply(&mut c);
		ControlAction::ResetZoom.apply(&mut c);
		assert_eq!(c.zoom_percent(), Some(100));
		ControlAction::ZoomOut.apply(&mut c);
		assert_eq!(c.zoom_percent(), Some(95));
	}

	#[test]
	fn labels_are_distinct() {
		let mut labels: Vec<&str> = ControlAction::BUTTONS.iter().map(|a| a.label()).collect();
		labels.sort_unstable();
		labels.dedup();
		assert_eq!(labels.len(), ControlAction::BUTTONS.len());
	}
}
