use std::collections::{BTreeMap, HashSet};

use log::debug;

use super::config::DiagramConfig;
use super::geometry::{Point, Rect};
use super::history::{Edit, UndoHistory};
use super::layout::{DiagramLayout, LaneHeights, compute_layout};
use super::routing::{RoutedEdge, reroute_touching, route_edges};
use super::style::{node_fill, node_stroke};
use super::types::{NodeKey, WorkflowData, WorkflowNode};
use super::validate::{ModelIssue, validate};

/// Pan offset (`x`, `y`, screen pixels) and scale `k`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self { x: 0.0, y: 0.0, k: 1.0 }
	}
}

/// Canvas placement inside the browser viewport.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Viewport {
	/// Client coordinates of the canvas' top-left corner.
	pub origin: Point,
	pub width: f64,
	pub height: f64,
}

impl Viewport {
	pub fn sized(width: f64, height: f64) -> Self {
		Self {
			origin: Point::default(),
			width,
			height,
		}
	}
}

/// The record of a clicked node as the detail panel sees it.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeSnapshot {
	pub key: NodeKey,
	pub text: String,
	pub lane: Option<NodeKey>,
	pub fill: String,
	pub stroke: String,
	pub extra: BTreeMap<String, String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Selection {
	pub node: NodeSnapshot,
	/// Node center in viewport (client) coordinates.
	pub position: Point,
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub key: Option<NodeKey>,
	pub start: Point,
	pub node_start: Point,
	pub lane_start: Option<NodeKey>,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start: Point,
	pub transform_start: ViewTransform,
}

/// What a released pointer amounted to.
#[derive(Clone, Debug, PartialEq)]
pub enum PointerOutcome {
	None,
	/// Press and release on the same node without moving.
	Click(NodeKey),
	/// Press and release on the background without moving.
	BackgroundClick,
	Panned,
	Dragged(NodeKey),
}

/// One live diagram: model, geometry, view and interaction state.
pub struct SwimlaneState {
	pub data: WorkflowData,
	pub config: DiagramConfig,
	pub layout: DiagramLayout,
	pub routes: Vec<RoutedEdge>,
	pub transform: ViewTransform,
	pub viewport: Viewport,
	pub drag: DragState,
	pub pan: PanState,
	pub highlighted: HashSet<NodeKey>,
	pub selection: Option<Selection>,
	pub history: UndoHistory,
	pub issues: Vec<ModelIssue>,
	press: Option<Point>,
	dirty: bool,
}

impl SwimlaneState {
	pub fn new(
		data: &WorkflowData,
		heights: &LaneHeights,
		highlighted: &[NodeKey],
		config: DiagramConfig,
		viewport: Viewport,
	) -> Self {
		let (data, issues) = validate(data);
		let layout = compute_layout(&data, heights, &config);
		let routes = route_edges(&layout, &data.links, &config);
		let history = UndoHistory::new(config.history_limit);
		let transform = ViewTransform {
			x: config.padding - layout.bounds().x,
			y: config.padding - layout.bounds().y,
			k: 1.0,
		};
		let mut state = Self {
			data,
			config,
			layout,
			routes,
			transform,
			viewport,
			drag: DragState::default(),
			pan: PanState::default(),
			highlighted: highlighted.iter().cloned().collect(),
			selection: None,
			history,
			issues,
			press: None,
			dirty: true,
		};
		if state.config.initial_auto_scale {
			state.transform = state.fit_transform();
		}
		state
	}

	pub fn screen_to_graph(&self, p: Point) -> Point {
		Point::new(
			(p.x - self.transform.x) / self.transform.k,
			(p.y - self.transform.y) / self.transform.k,
		)
	}

	pub fn graph_to_screen(&self, p: Point) -> Point {
		Point::new(
			p.x * self.transform.k + self.transform.x,
			p.y * self.transform.k + self.transform.y,
		)
	}

	/// Node under a canvas-relative point. Lanes, edges and background are
	/// not hit.
	pub fn node_at_position(&self, p: Point) -> Option<NodeKey> {
		self.layout.node_at(self.screen_to_graph(p)).map(|n| n.key.clone())
	}

	fn node_record(&self, key: &NodeKey) -> Option<&WorkflowNode> {
		self.data.node(key)
	}

	pub fn fill_for(&self, key: &NodeKey) -> Option<&str> {
		let node = self.node_record(key)?;
		let lane = node.lane.as_ref().and_then(|k| self.data.lane(k));
		Some(node_fill(node, lane, &self.highlighted, &self.config))
	}

	pub fn stroke_for(&self, key: &NodeKey) -> Option<&str> {
		let node = self.node_record(key)?;
		Some(node_stroke(node, &self.highlighted, &self.config))
	}

	/// Replaces the highlight set and returns the keys whose colors changed.
	/// Layout, routes, view and selection are left alone.
	pub fn set_highlighted(&mut self, keys: &[NodeKey]) -> Vec<NodeKey> {
		let next: HashSet<NodeKey> = keys.iter().cloned().collect();
		for key in next.iter().filter(|k| self.data.node(k).is_none()) {
			debug!("highlight key {key} matches no node");
		}
		let changed: Vec<NodeKey> = self
			.data
			.nodes
			.iter()
			.filter(|n| self.highlighted.contains(&n.key) != next.contains(&n.key))
			.map(|n| n.key.clone())
			.collect();
		self.highlighted = next;
		if !changed.is_empty() {
			self.dirty = true;
		}
		changed
	}

	pub fn snapshot(&self, key: &NodeKey) -> Option<NodeSnapshot> {
		let node = self.node_record(key)?;
		Some(NodeSnapshot {
			key: node.key.clone(),
			text: node.text.clone(),
			lane: node.lane.clone(),
			fill: self.fill_for(key)?.to_owned(),
			stroke: self.stroke_for(key)?.to_owned(),
			extra: node.extra.clone(),
		})
	}

	/// Selects `key` and returns the selection with the node's current
	/// center in viewport coordinates.
	pub fn select(&mut self, key: &NodeKey) -> Option<Selection> {
		let center = self.layout.node(key)?.rect.center();
		let screen = self.graph_to_screen(center);
		let selection = Selection {
			node: self.snapshot(key)?,
			position: Point::new(self.viewport.origin.x + screen.x, self.viewport.origin.y + screen.y),
		};
		self.selection = Some(selection.clone());
		self.dirty = true;
		Some(selection)
	}

	pub fn clear_selection(&mut self) {
		if self.selection.take().is_some() {
			self.dirty = true;
		}
	}

	pub fn zoom_percent(&self) -> u32 {
		(self.transform.k * 100.0).round().max(0.0) as u32
	}

	fn clamp_scale(&self, k: f64) -> f64 {
		k.clamp(self.config.min_scale, self.config.max_scale)
	}

	/// Transform scaled by `factor` keeping `anchor` (canvas-relative) fixed.
	fn scaled_about(&self, factor: f64, anchor: Point) -> ViewTransform {
		let k = self.clamp_scale(self.transform.k * factor);
		if k == self.transform.k {
			return self.transform;
		}
		let ratio = k / self.transform.k;
		ViewTransform {
			x: anchor.x - (anchor.x - self.transform.x) * ratio,
			y: anchor.y - (anchor.y - self.transform.y) * ratio,
			k,
		}
	}

	fn viewport_center(&self) -> Point {
		Point::new(self.viewport.width / 2.0, self.viewport.height / 2.0)
	}

	/// Transform that shows the whole diagram (plus padding) centered.
	pub fn fit_transform(&self) -> ViewTransform {
		let bounds: Rect = self.layout.bounds().inflate(self.config.padding);
		if bounds.width <= 0.0 || bounds.height <= 0.0 || self.viewport.width <= 0.0 || self.viewport.height <= 0.0 {
			return self.transform;
		}
		let k = self.clamp_scale((self.viewport.width / bounds.width).min(self.viewport.height / bounds.height));
		let c = bounds.center();
		ViewTransform {
			x: self.viewport.width / 2.0 - c.x * k,
			y: self.viewport.height / 2.0 - c.y * k,
			k,
		}
	}

	fn set_transform(&mut self, next: ViewTransform, coalesce: bool) -> bool {
		if next == self.transform {
			return false;
		}
		self.history.record(Edit::Viewport {
			before: self.transform,
			after: next,
			coalesce,
		});
		self.transform = next;
		self.dirty = true;
		true
	}

	pub fn zoom_in(&mut self) -> bool {
		let next = self.scaled_about(self.config.zoom_factor, self.viewport_center());
		self.set_transform(next, false)
	}

	pub fn zoom_out(&mut self) -> bool {
		let next = self.scaled_about(1.0 / self.config.zoom_factor, self.viewport_center());
		self.set_transform(next, false)
	}

	pub fn zoom_to_fit(&mut self) -> bool {
		let next = self.fit_transform();
		self.set_transform(next, false)
	}

	/// Back to 100 % around the viewport center.
	pub fn reset_zoom(&mut self) -> bool {
		let next = self.scaled_about(1.0 / self.transform.k, self.viewport_center());
		self.set_transform(next, false)
	}

	/// Wheel zoom about the pointer. Consecutive steps form one undoable edit.
	pub fn wheel(&mut self, at: Point, delta_y: f64) -> bool {
		if delta_y == 0.0 {
			return false;
		}
		let factor = if delta_y > 0.0 {
			1.0 / self.config.zoom_factor
		} else {
			self.config.zoom_factor
		};
		let next = self.scaled_about(factor, at);
		self.set_transform(next, true)
	}

	/// Moves a node body mid-drag. Only the edges touching it are rerouted;
	/// lanes and the other edges settle when the node is dropped.
	fn drag_node(&mut self, key: &NodeKey, top_left: Point) -> bool {
		let Some(node) = self.layout.node_mut(key) else {
			return false;
		};
		if node.rect.x == top_left.x && node.rect.y == top_left.y {
			return false;
		}
		node.rect.x = top_left.x;
		node.rect.y = top_left.y;
		let previous = std::mem::take(&mut self.routes);
		self.routes = reroute_touching(&self.layout, &self.data.links, &self.config, previous, key);
		self.dirty = true;
		true
	}

	/// Puts a node at `top_left` in `lane`, refits the lane bands and
	/// reroutes every edge.
	fn place_node(&mut self, key: &NodeKey, top_left: Point, lane: Option<NodeKey>) {
		let Some(node) = self.layout.node_mut(key) else {
			return;
		};
		node.rect.x = top_left.x;
		node.rect.y = top_left.y;
		node.lane = lane.clone();
		if let Some(record) = self.data.nodes.iter_mut().find(|n| &n.key == key) {
			record.lane = lane;
		}
		self.layout.refit_lanes(&self.config);
		self.routes = route_edges(&self.layout, &self.data.links, &self.config);
		self.dirty = true;
	}

	/// Settles a dragged node where it was released and records the move.
	fn drop_node(&mut self, drag: DragState) -> Option<NodeKey> {
		let key = drag.key?;
		let after = self.layout.node(&key).map(|n| Point::new(n.rect.x, n.rect.y))?;
		if after == drag.node_start {
			return None;
		}
		let lane_after = self.layout.lane_at_drop(&key);
		self.place_node(&key, after, lane_after.clone());
		if lane_after != drag.lane_start {
			debug!("node {key} moved to lane {lane_after:?}");
		}
		self.history.record(Edit::MoveNode {
			key: key.clone(),
			before: drag.node_start,
			after,
			lane_before: drag.lane_start,
			lane_after,
		});
		Some(key)
	}

	fn apply(&mut self, edit: &Edit, forward: bool) {
		match edit {
			Edit::Viewport { before, after, .. } => {
				self.transform = if forward { *after } else { *before };
				self.dirty = true;
			}
			Edit::MoveNode {
				key,
				before,
				after,
				lane_before,
				lane_after,
			} => {
				if forward {
					self.place_node(key, *after, lane_after.clone());
				} else {
					self.place_node(key, *before, lane_before.clone());
				}
			}
		}
	}

	pub fn undo(&mut self) -> bool {
		match self.history.undo() {
			Some(edit) => {
				self.apply(&edit, false);
				true
			}
			None => false,
		}
	}

	pub fn redo(&mut self) -> bool {
		match self.history.redo() {
			Some(edit) => {
				self.apply(&edit, true);
				true
			}
			None => false,
		}
	}

	pub fn pointer_down(&mut self, p: Point) {
		self.history.seal();
		self.press = Some(p);
		match self.node_at_position(p) {
			Some(key) if self.config.allow_node_drag => {
				let (node_start, lane_start) = self
					.layout
					.node(&key)
					.map(|n| (Point::new(n.rect.x, n.rect.y), n.lane.clone()))
					.unwrap_or_default();
				self.drag = DragState {
					active: true,
					key: Some(key),
					start: p,
					node_start,
					lane_start,
				};
			}
			Some(_) => {}
			None => {
				self.pan = PanState {
					active: true,
					start: p,
					transform_start: self.transform,
				};
			}
		}
	}

	fn beyond_tolerance(&self, p: Point) -> bool {
		self.press
			.is_some_and(|start| start.distance(p) > self.config.click_tolerance)
	}

	/// Returns whether the pointer move changed anything visible. Any move
	/// ends a run of wheel steps, so the next wheel zoom is its own edit.
	pub fn pointer_move(&mut self, p: Point) -> bool {
		self.history.seal();
		if !self.beyond_tolerance(p) {
			return false;
		}
		if self.drag.active {
			let Some(key) = self.drag.key.clone() else {
				return false;
			};
			let to = Point::new(
				self.drag.node_start.x + (p.x - self.drag.start.x) / self.transform.k,
				self.drag.node_start.y + (p.y - self.drag.start.y) / self.transform.k,
			);
			return self.drag_node(&key, to);
		}
		if self.pan.active {
			self.transform.x = self.pan.transform_start.x + (p.x - self.pan.start.x);
			self.transform.y = self.pan.transform_start.y + (p.y - self.pan.start.y);
			self.dirty = true;
			return true;
		}
		false
	}

	pub fn pointer_up(&mut self, p: Point) -> PointerOutcome {
		let moved = self.beyond_tolerance(p);
		let pressed = self.press.take();
		let drag = std::mem::take(&mut self.drag);
		let pan = std::mem::take(&mut self.pan);

		if drag.active && moved {
			if let Some(key) = self.drop_node(drag) {
				return PointerOutcome::Dragged(key);
			}
		}
		if pan.active && moved {
			self.history.record(Edit::Viewport {
				before: pan.transform_start,
				after: self.transform,
				coalesce: false,
			});
			return PointerOutcome::Panned;
		}
		if pressed.is_none() {
			return PointerOutcome::None;
		}
		match self.node_at_position(p) {
			Some(key) => PointerOutcome::Click(key),
			None => PointerOutcome::BackgroundClick,
		}
	}

	/// Pointer left the canvas: finish any gesture where it stands.
	pub fn pointer_leave(&mut self) {
		let drag = std::mem::take(&mut self.drag);
		let pan = std::mem::take(&mut self.pan);
		self.press = None;
		if drag.active {
			self.drop_node(drag);
		} else if pan.active && pan.transform_start != self.transform {
			self.history.record(Edit::Viewport {
				before: pan.transform_start,
				after: self.transform,
				coalesce: false,
			});
		}
	}

	/// Canvas moved or resized. The transform is kept, so on-screen node
	/// positions do not change.
	pub fn resize(&mut self, viewport: Viewport) {
		self.viewport = viewport;
		self.dirty = true;
	}

	/// Returns and clears the redraw flag.
	pub fn take_dirty(&mut self) -> bool {
		std::mem::take(&mut self.dirty)
	}
}
