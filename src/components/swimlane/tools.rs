use leptos::prelude::*;

/// One button of the tools sidebar.
#[derive(Clone)]
pub struct ToolAction {
	pub label: String,
	pub icon: &'static str,
	/// `None` renders an inert button.
	pub on_activate: Option<Callback<()>>,
	/// Draws the button in its active state.
	pub active: Option<Signal<bool>>,
}

impl ToolAction {
	pub fn new(label: impl Into<String>, icon: &'static str) -> Self {
		Self {
			label: label.into(),
			icon,
			on_activate: None,
			active: None,
		}
	}

	pub fn on_activate(mut self, cb: Callback<()>) -> Self {
		self.on_activate = Some(cb);
		self
	}

	pub fn active_when(mut self, active: Signal<bool>) -> Self {
		self.active = Some(active);
		self
	}
}

#[derive(Clone)]
pub struct ToolGroup {
	pub title: String,
	pub actions: Vec<ToolAction>,
}

impl ToolGroup {
	pub fn new(title: impl Into<String>, actions: Vec<ToolAction>) -> Self {
		Self {
			title: title.into(),
			actions,
		}
	}
}

/// Groups reduced to the actions whose label contains `query`
/// (case-insensitive). Groups left empty are dropped.
pub fn filter_groups(groups: &[ToolGroup], query: &str) -> Vec<ToolGroup> {
	let needle = query.trim().to_lowercase();
	if needle.is_empty() {
		return groups.to_vec();
	}
	groups
		.iter()
		.filter_map(|group| {
			let actions: Vec<ToolAction> = group
				.actions
				.iter()
				.filter(|a| a.label.to_lowercase().contains(&needle))
				.cloned()
				.collect();
			(!actions.is_empty()).then(|| ToolGroup::new(group.title.clone(), actions))
		})
		.collect()
}

#[component]
fn ToolButton(action: ToolAction) -> impl IntoView {
	let ToolAction {
		label,
		icon,
		on_activate,
		active,
	} = action;
	view! {
		<button
			class="tool-button"
			class:active=move || active.is_some_and(|a| a.get())
			on:click=move |_| {
				if let Some(cb) = on_activate {
					cb.run(());
				}
			}
		>
			<span class="tool-icon">{icon}</span>
			<span class="tool-label">{label}</span>
		</button>
	}
}

/// Sidebar listing the tool groups with a search box over action labels.
#[component]
pub fn ToolsPanel(groups: Vec<ToolGroup>) -> impl IntoView {
	let query = RwSignal::new(String::new());
	let groups = StoredValue::new_local(groups);

	view! {
		<aside class="tools-panel">
			<h2 class="tools-title">"Tools"</h2>
			<input
				class="tools-search"
				type="search"
				placeholder="Search blocks..."
				prop:value=move || query.get()
				on:input=move |ev| query.set(event_target_value(&ev))
			/>
			{move || {
				let shown = groups.with_value(|g| filter_groups(g, &query.get()));
				shown
					.into_iter()
					.map(|group| {
						view! {
							<div class="tool-group">
								<h3 class="tool-group-title">{group.title}</h3>
								{group
									.actions
									.into_iter()
									.map(|action| view! { <ToolButton action=action /> })
									.collect_view()}
							</div>
						}
					})
					.collect_view()
			}}
		</aside>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn groups() -> Vec<ToolGroup> {
		vec![
			ToolGroup::new(
				"Generation",
				vec![
					ToolAction::new("Import text to generate workflow", "T"),
					ToolAction::new("Delete workflow", "D"),
				],
			),
			ToolGroup::new("AI", vec![ToolAction::new("Pain Point Detection", "P")]),
		]
	}

	fn labels(groups: &[ToolGroup]) -> Vec<String> {
		groups
			.iter()
			.flat_map(|g| g.actions.iter().map(|a| a.label.clone()))
			.collect()
	}

	#[test]
	fn empty_query_keeps_everything() {
		assert_eq!(labels(&filter_groups(&groups(), "  ")), labels(&groups()));
	}

	#[test]
	fn query_matches_labels_case_insensitively() {
		let shown = filter_groups(&groups(), "PAIN");
		assert_eq!(shown.len(), 1);
		assert_eq!(shown[0].title, "AI");
		assert_eq!(labels(&shown), vec!["Pain Point Detection"]);
	}

	#[test]
	fn groups_without_matches_are_dropped() {
		let shown = filter_groups(&groups(), "workflow");
		assert_eq!(shown.len(), 1);
		assert_eq!(labels(&shown).len(), 2);
		assert!(filter_groups(&groups(), "nothing").is_empty());
	}
}
