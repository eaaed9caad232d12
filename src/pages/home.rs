use std::time::Duration;

use leptos::prelude::*;
use log::{debug, error};

use crate::components::swimlane::data::{self, resolve_workflow};
use crate::components::swimlane::{
	ControlPanel, DiagramConfig, DiagramHandle, HistoryState, NodeDetailPanel, PainPointDetector, PainPointScan,
	SCAN_TICK_MS, Selection, SwimlaneCanvas, ToolAction, ToolGroup, ToolsPanel, WorkflowData,
};

/// Loan approval workflow page.
#[component]
pub fn Home() -> impl IntoView {
	view! { <WorkflowDetails title="Loan approval" /> }
}

/// Intake and appraisal drill-down page.
#[component]
pub fn SubWorkflow() -> impl IntoView {
	view! { <WorkflowDetails title="Intake and appraisal" sub=true /> }
}

#[component]
fn WorkflowDetails(title: &'static str, #[prop(optional)] sub: bool) -> impl IntoView {
	let primary = StoredValue::new((!sub).then(data::loan_workflow));
	let sub_workflow = StoredValue::new(sub.then(data::loan_sub_workflow));
	let enhanced = RwSignal::new(None::<WorkflowData>);
	let workflow = Memo::new(move |_| {
		enhanced.with(|e| {
			primary.with_value(|p| {
				sub_workflow.with_value(|s| {
					resolve_workflow(e.as_ref(), p.as_ref(), s.as_ref())
						.cloned()
						.unwrap_or_default()
				})
			})
		})
	});

	let handle = DiagramHandle::with_lane_heights(DiagramConfig::default(), data::loan_lane_heights());
	let scan = RwSignal::new(PainPointScan::Idle);
	let highlighted = Signal::derive(move || scan.with(PainPointScan::highlighted));
	let selection = RwSignal::new(None::<Selection>);
	let zoom = RwSignal::new(100_u32);
	let history = RwSignal::new(HistoryState::default());
	let timer = StoredValue::new(None::<IntervalHandle>);

	let stop_timer = move || {
		if let Some(h) = timer.try_update_value(Option::take).flatten() {
			h.clear();
		}
	};

	Effect::watch(
		move || workflow.track(),
		move |_, _, _| {
			selection.set(None);
		},
		false,
	);

	let tick = move || {
		let completed = scan.try_update(|s| {
			s.tick(|| {
				let keys = workflow.with_untracked(|w| {
					PainPointDetector::default().flagged_nodes(&data::loan_step_metrics(), w)
				});
				debug!("pain point scan flagged {keys:?}");
				keys
			})
		});
		let scanning = scan.try_with_untracked(PainPointScan::is_scanning).unwrap_or(false);
		if completed.unwrap_or(true) || !scanning {
			stop_timer();
		}
	};

	let on_pain_points = Callback::new(move |_| {
		if !scan.try_update(PainPointScan::toggle).unwrap_or(false) {
			return;
		}
		stop_timer();
		match set_interval_with_handle(tick, Duration::from_millis(u64::from(SCAN_TICK_MS))) {
			Ok(h) => timer.set_value(Some(h)),
			Err(err) => {
				error!("could not start pain point scan: {err:?}");
				scan.set(PainPointScan::Idle);
			}
		}
	});

	let on_cancel_scan = move |_: leptos::ev::MouseEvent| {
		scan.update(PainPointScan::cancel);
		stop_timer();
	};

	let on_suggestion = Callback::new(move |_| {
		enhanced.update(|e| {
			*e = match e.take() {
				Some(_) => None,
				None => Some(data::loan_workflow_suggested()),
			};
		});
	});

	on_cleanup(stop_timer);

	let legend = DiagramConfig::default().highlight_fill;

	let groups = vec![
		ToolGroup::new("Workflow", vec![ToolAction::new("Upload file to generate workflow", "⇪")]),
		ToolGroup::new(
			"Generation",
			vec![
				ToolAction::new("Import text to generate workflow", "✎"),
				ToolAction::new("Delete workflow", "🗑"),
			],
		),
		ToolGroup::new(
			"Interaction",
			vec![
				ToolAction::new("Compare workflow", "⇄"),
				ToolAction::new("Find list entries", "☰"),
				ToolAction::new("Give feedback", "✉"),
			],
		),
		ToolGroup::new(
			"AI",
			vec![
				ToolAction::new("Pain Point Detection", "⚠")
					.on_activate(on_pain_points)
					.active_when(Signal::derive(move || !highlighted.with(Vec::is_empty))),
				ToolAction::new("AI suggestion", "✦")
					.on_activate(on_suggestion)
					.active_when(Signal::derive(move || enhanced.with(Option::is_some))),
				ToolAction::new("Global AI Assistant", "🤖"),
				ToolAction::new("Auto SOP Generator", "📄"),
			],
		),
	];

	view! {
		<div class="workflow-page">
			<ToolsPanel groups=groups />
			<main class="workflow-main">
				<header class="workflow-header">
					<h1>{title}</h1>
					<span class="legend">
						<span class="legend-swatch" style:background-color=legend></span>
						"Pain point"
					</span>
				</header>
				<div class="workflow-canvas">
					<SwimlaneCanvas
						data=workflow
						highlighted=highlighted
						handle=handle
						on_select=Callback::new(move |s: Selection| selection.set(Some(s)))
						on_zoom=Callback::new(move |pct: u32| zoom.set(pct))
						on_history=Callback::new(move |h: HistoryState| history.set(h))
					/>
				</div>
				<ControlPanel handle=handle zoom=zoom history=history />
				{move || {
					scan.with(PainPointScan::progress)
						.map(|p| {
							view! {
								<div class="scan-overlay">
									<div class="scan-card">
										<h3>"Detecting pain points..."</h3>
										<div class="scan-bar">
											<div class="scan-fill" style:width=format!("{p}%")></div>
										</div>
										<span class="scan-percent">{format!("{p}%")}</span>
										<button class="scan-cancel" on:click=on_cancel_scan>
											"Cancel"
										</button>
									</div>
								</div>
							}
						})
				}}
			</main>
			<NodeDetailPanel
				selection=selection
				on_close=Callback::new(move |_| {
					selection.set(None);
					handle.clear_selection();
				})
			/>
		</div>
	}
}
