//! Owner of the live diagram instance.
//!
//! The controller holds at most one [`SwimlaneState`] together with the
//! callbacks installed for it. Every mount tears the previous instance down
//! first, so callbacks from an old instance can never fire again. Commands
//! issued while nothing is mounted are ignored.

use log::{debug, info};

use super::config::DiagramConfig;
use super::geometry::Point;
use super::layout::LaneHeights;
use super::state::{PointerOutcome, Selection, SwimlaneState, Viewport};
use super::types::{NodeKey, WorkflowData};

/// Availability of the undo and redo commands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HistoryState {
	pub can_undo: bool,
	pub can_redo: bool,
}

/// Host callbacks for one diagram instance.
#[derive(Default)]
pub struct DiagramCallbacks {
	/// Rounded zoom percentage, sent when it changes.
	pub on_zoom: Option<Box<dyn Fn(u32)>>,
	pub on_select: Option<Box<dyn Fn(&Selection)>>,
	pub on_history: Option<Box<dyn Fn(HistoryState)>>,
}

struct Instance {
	state: SwimlaneState,
	callbacks: DiagramCallbacks,
	published_zoom: Option<u32>,
	published_history: Option<HistoryState>,
}

impl Instance {
	/// Sends zoom and history availability if they changed since last time.
	fn publish(&mut self) {
		let zoom = self.state.zoom_percent();
		if self.published_zoom != Some(zoom) {
			self.published_zoom = Some(zoom);
			if let Some(cb) = &self.callbacks.on_zoom {
				cb(zoom);
			}
		}
		let history = HistoryState {
			can_undo: self.state.history.can_undo(),
			can_redo: self.state.history.can_redo(),
		};
		if self.published_history != Some(history) {
			self.published_history = Some(history);
			if let Some(cb) = &self.callbacks.on_history {
				cb(history);
			}
		}
	}

	fn emit_selection(&mut self, key: &NodeKey) {
		if let Some(selection) = self.state.select(key) {
			debug!("selected node {key}");
			if let Some(cb) = &self.callbacks.on_select {
				cb(&selection);
			}
		}
	}
}

pub struct DiagramController {
	config: DiagramConfig,
	heights: LaneHeights,
	instance: Option<Instance>,
	generation: u64,
}

impl DiagramController {
	pub fn new(config: DiagramConfig) -> Self {
		Self {
			config,
			heights: LaneHeights::new(),
			instance: None,
			generation: 0,
		}
	}

	pub fn with_lane_heights(mut self, heights: LaneHeights) -> Self {
		self.heights = heights;
		self
	}

	/// Number of instances mounted so far.
	pub fn generation(&self) -> u64 {
		self.generation
	}

	/// Builds a new instance, tearing down the live one first.
	pub fn mount(
		&mut self,
		data: &WorkflowData,
		highlighted: &[NodeKey],
		viewport: Viewport,
		callbacks: DiagramCallbacks,
	) {
		self.teardown();
		let state = SwimlaneState::new(data, &self.heights, highlighted, self.config.clone(), viewport);
		self.generation += 1;
		info!(
			"mounted diagram #{} ({} lanes, {} nodes, {} edges, {} issues)",
			self.generation,
			state.layout.lanes.len(),
			state.layout.nodes.len(),
			state.routes.len(),
			state.issues.len()
		);
		let mut instance = Instance {
			state,
			callbacks,
			published_zoom: None,
			published_history: None,
		};
		instance.publish();
		self.instance = Some(instance);
	}

	/// Swaps in a new workflow, keeping the viewport, callbacks and
	/// highlight set of the live instance.
	pub fn replace_data(&mut self, data: &WorkflowData) {
		let Some(old) = self.instance.take() else {
			return;
		};
		let highlighted: Vec<NodeKey> = old.state.highlighted.iter().cloned().collect();
		let viewport = old.state.viewport;
		let callbacks = old.callbacks;
		drop(old.state);
		self.mount(data, &highlighted, viewport, callbacks);
	}

	/// Drops the live instance and its callbacks.
	pub fn teardown(&mut self) {
		if self.instance.take().is_some() {
			debug!("tore down diagram #{}", self.generation);
		}
	}

	pub fn state(&self) -> Option<&SwimlaneState> {
		self.instance.as_ref().map(|i| &i.state)
	}

	/// Runs `f` on the live instance and republishes derived values.
	fn with_instance<R>(&mut self, f: impl FnOnce(&mut Instance) -> R) -> Option<R> {
		let instance = self.instance.as_mut()?;
		let out = f(instance);
		instance.publish();
		Some(out)
	}

	/// Replaces the highlight set; returns the keys that were recolored.
	pub fn set_highlighted_nodes(&mut self, keys: &[NodeKey]) -> Vec<NodeKey> {
		self.with_instance(|i| i.state.set_highlighted(keys))
			.unwrap_or_default()
	}

	pub fn selection(&self) -> Option<&Selection> {
		self.state().and_then(|s| s.selection.as_ref())
	}

	/// Close action from the detail panel.
	pub fn clear_selection(&mut self) {
		self.with_instance(|i| i.state.clear_selection());
	}

	pub fn zoom_percent(&self) -> Option<u32> {
		self.state().map(SwimlaneState::zoom_percent)
	}

	pub fn zoom_in(&mut self) {
		self.with_instance(|i| i.state.zoom_in());
	}

	pub fn zoom_out(&mut self) {
		self.with_instance(|i| i.state.zoom_out());
	}

	pub fn zoom_to_fit(&mut self) {
		self.with_instance(|i| i.state.zoom_to_fit());
	}

	pub fn reset_zoom(&mut self) {
		self.with_instance(|i| i.state.reset_zoom());
	}

	pub fn undo(&mut self) {
		self.with_instance(|i| i.state.undo());
	}

	pub fn redo(&mut self) {
		self.with_instance(|i| i.state.redo());
	}

	pub fn resize(&mut self, viewport: Viewport) {
		self.with_instance(|i| i.state.resize(viewport));
	}

	pub fn pointer_down(&mut self, p: Point) {
		self.with_instance(|i| i.state.pointer_down(p));
	}

	pub fn pointer_move(&mut self, p: Point) {
		self.with_instance(|i| i.state.pointer_move(p));
	}

	pub fn pointer_up(&mut self, p: Point) {
		self.with_instance(|i| match i.state.pointer_up(p) {
			PointerOutcome::Click(key) => i.emit_selection(&key),
			// Selection only changes through an explicit close.
			PointerOutcome::BackgroundClick => {}
			PointerOutcome::Dragged(key) => debug!("moved node {key}"),
			PointerOutcome::Panned | PointerOutcome::None => {}
		});
	}

	pub fn pointer_leave(&mut self) {
		self.with_instance(|i| i.state.pointer_leave());
	}

	pub fn wheel(&mut self, at: Point, delta_y: f64) {
		self.with_instance(|i| i.state.wheel(at, delta_y));
	}

	/// Single click at a canvas-relative point.
	pub fn click_at(&mut self, p: Point) {
		self.pointer_down(p);
		self.pointer_up(p);
	}

	/// Returns and clears the live instance's redraw flag.
	pub fn take_dirty(&mut self) -> bool {
		self.instance
			.as_mut()
			.is_some_and(|i| i.state.take_dirty())
	}
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;
	use std::rc::Rc;

	use super::*;
	use crate::components::swimlane::types::{Lane, NodePosition, WorkflowLink, WorkflowNode};

	fn loan() -> WorkflowData {
		WorkflowData {
			lanes: vec![
				Lane::new("CUSTOMER", "Customer", "#f8d7da"),
				Lane::new("RISK", "Risk Assessment", "#d1ecf1"),
			],
			nodes: vec![
				WorkflowNode::new(1, "Submit", NodePosition::InLane { along: 0.0, across: 0.0 }).in_lane("CUSTOMER"),
				WorkflowNode::new(2, "Check CIC", NodePosition::InLane { along: 300.0, across: 0.0 }).in_lane("RISK"),
			],
			links: vec![WorkflowLink::new(1, 2)],
			..Default::default()
		}
	}

	fn unscaled() -> DiagramConfig {
		DiagramConfig {
			initial_auto_scale: false,
			..DiagramConfig::default()
		}
	}

	#[derive(Default)]
	struct Recorded {
		zooms: Vec<u32>,
		selections: Vec<Selection>,
		histories: Vec<HistoryState>,
	}

	fn recording() -> (Rc<RefCell<Recorded>>, DiagramCallbacks) {
		let log = Rc::new(RefCell::new(Recorded::default()));
		let (z, s, h) = (log.clone(), log.clone(), log.clone());
		let callbacks = DiagramCallbacks {
			on_zoom: Some(Box::new(move |pct| z.borrow_mut().zooms.push(pct))),
			on_select: Some(Box::new(move |sel: &Selection| s.borrow_mut().selections.push(sel.clone()))),
			on_history: Some(Box::new(move |st| h.borrow_mut().histories.push(st))),
		};
		(log, callbacks)
	}

	fn node_center(c: &DiagramController, key: i64) -> Point {
		let s = c.state().unwrap_or_else(|| panic!("mounted"));
		let rect = s.layout.node(&key.into()).map(|n| n.rect).unwrap_or_default();
		s.graph_to_screen(rect.center())
	}

	#[test]
	fn commands_before_mount_are_noops() {
		let mut c = DiagramController::new(unscaled());
		c.zoom_in();
		c.zoom_out();
		c.zoom_to_fit();
		c.undo();
		c.redo();
		c.click_at(Point::new(1.0, 1.0));
		assert!(c.set_highlighted_nodes(&[1.into()]).is_empty());
		assert_eq!(c.zoom_percent(), None);
		assert!(!c.take_dirty());
	}

	#[test]
	fn mount_publishes_initial_zoom() {
		let mut c = DiagramController::new(unscaled());
		let (log, callbacks) = recording();
		c.mount(&loan(), &[], Viewport::sized(800.0, 600.0), callbacks);
		assert_eq!(log.borrow().zooms, vec![100]);
		assert_eq!(log.borrow().histories, vec![HistoryState::default()]);
	}

	#[test]
	fn remount_drops_previous_callbacks() {
		let mut c = DiagramController::new(unscaled());
		let (first, callbacks) = recording();
		c.mount(&loan(), &[], Viewport::sized(800.0, 600.0), callbacks);
		let (second, callbacks) = recording();
		c.mount(&loan(), &[], Viewport::sized(800.0, 600.0), callbacks);
		assert_eq!(c.generation(), 2);

		let p = node_center(&c, 1);
		c.click_at(p);
		assert!(first.borrow().selections.is_empty());
		assert_eq!(second.borrow().selections.len(), 1);
	}

	#[test]
	fn reclick_emits_identical_selection() {
		let mut c = DiagramController::new(unscaled());
		let (log, callbacks) = recording();
		c.mount(&loan(), &[], Viewport::sized(800.0, 600.0), callbacks);
		let p = node_center(&c, 2);
		c.click_at(p);
		c.click_at(p);
		let log = log.borrow();
		assert_eq!(log.selections.len(), 2);
		assert_eq!(log.selections[0], log.selections[1]);
		assert_eq!(log.selections[0].node.key, NodeKey::from(2));
		assert_eq!(log.selections[0].node.text, "Check CIC");
	}

	#[test]
	fn background_click_keeps_selection() {
		let mut c = DiagramController::new(unscaled());
		let (_, callbacks) = recording();
		c.mount(&loan(), &[], Viewport::sized(800.0, 600.0), callbacks);
		let p = node_center(&c, 1);
		c.click_at(p);
		c.click_at(Point::new(799.0, 599.0));
		assert_eq!(c.selection().map(|s| s.node.key.clone()), Some(1.into()));
		c.clear_selection();
		assert!(c.selection().is_none());
	}

	#[test]
	fn selection_position_follows_pan_and_zoom_but_not_resize() {
		let mut c = DiagramController::new(unscaled());
		let (log, callbacks) = recording();
		c.mount(&loan(), &[], Viewport::sized(800.0, 600.0), callbacks);

		c.click_at(node_center(&c, 1));
		c.resize(Viewport::sized(1200.0, 900.0));
		c.click_at(node_center(&c, 1));
		c.zoom_in();
		c.click_at(node_center(&c, 1));

		let log = log.borrow();
		assert_eq!(log.selections[0].position, log.selections[1].position);
		assert_ne!(log.selections[1].position, log.selections[2].position);
	}

	#[test]
	fn zoom_is_published_only_when_the_rounded_value_changes() {
		let mut c = DiagramController::new(DiagramConfig {
			zoom_factor: 1.001,
			..unscaled()
		});
		let (log, callbacks) = recording();
		c.mount(&loan(), &[], Viewport::sized(800.0, 600.0), callbacks);
		c.zoom_in();
		c.zoom_in();
		c.zoom_in();
		c.zoom_in();
		c.zoom_in();
		c.zoom_in();
		assert_eq!(log.borrow().zooms, vec![100, 101]);
	}

	#[test]
	fn undo_redo_availability_is_published() {
		let mut c = DiagramController::new(unscaled());
		let (log, callbacks) = recording();
		c.mount(&loan(), &[], Viewport::sized(800.0, 600.0), callbacks);
		c.zoom_in();
		c.undo();
		let log = log.borrow();
		assert_eq!(
			log.histories,
			vec![
				HistoryState::default(),
				HistoryState {
					can_undo: true,
					can_redo: false,
				},
				HistoryState {
					can_undo: false,
					can_redo: true,
				},
			]
		);
		assert_eq!(log.zooms.last(), Some(&100));
	}

	#[test]
	fn replacing_data_discards_old_highlight_effects() {
		let mut c = DiagramController::new(unscaled());
		let (_, callbacks) = recording();
		c.mount(&loan(), &[2.into()], Viewport::sized(800.0, 600.0), callbacks);
		assert_eq!(
			c.state().and_then(|s| s.fill_for(&2.into())).map(str::to_owned),
			Some(DiagramConfig::default().highlight_fill)
		);

		let other = WorkflowData {
			nodes: vec![WorkflowNode::new(10, "Disburse", NodePosition::Absolute { x: 0.0, y: 0.0 })],
			..Default::default()
		};
		c.replace_data(&other);
		let s = c.state().unwrap_or_else(|| panic!("mounted"));
		assert!(s.fill_for(&2.into()).is_none());
		assert_eq!(s.fill_for(&10.into()), Some(s.config.default_fill.as_str()));
		assert_eq!(c.generation(), 2);
	}

	#[test]
	fn highlight_keeps_selection_and_layout() {
		let mut c = DiagramController::new(unscaled());
		let (_, callbacks) = recording();
		c.mount(&loan(), &[], Viewport::sized(800.0, 600.0), callbacks);
		c.click_at(node_center(&c, 1));
		let layout = c.state().map(|s| s.layout.clone());
		assert_eq!(c.set_highlighted_nodes(&[1.into(), 42.into()]), vec![NodeKey::from(1)]);
		assert_eq!(c.state().map(|s| s.layout.clone()), layout);
		assert!(c.selection().is_some());
	}
}
