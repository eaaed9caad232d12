use std::collections::HashMap;

use super::config::DiagramConfig;
use super::geometry::{Point, Rect};
use super::types::{LaneOrientation, NodeKey, NodePosition, WorkflowData};

/// Caller-supplied lane extents along the stacking axis. Lanes missing from
/// the map use [`DiagramConfig::lane_height`].
pub type LaneHeights = HashMap<NodeKey, f64>;

#[derive(Clone, Debug, PartialEq)]
pub struct LaneBand {
	pub key: NodeKey,
	pub label: String,
	pub color: String,
	pub rect: Rect,
	pub header: Rect,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlacedNode {
	pub key: NodeKey,
	pub lane: Option<NodeKey>,
	pub rect: Rect,
}

/// Absolute document coordinates for one workflow.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DiagramLayout {
	pub lanes: Vec<LaneBand>,
	pub nodes: Vec<PlacedNode>,
	index: HashMap<NodeKey, usize>,
	vertical: bool,
	/// Stacked (start, extent) of each lane before nodes widen it.
	stacks: Vec<(f64, f64)>,
}

impl DiagramLayout {
	pub fn node(&self, key: &NodeKey) -> Option<&PlacedNode> {
		self.index.get(key).map(|&i| &self.nodes[i])
	}

	pub fn node_mut(&mut self, key: &NodeKey) -> Option<&mut PlacedNode> {
		self.index.get(key).map(|&i| &mut self.nodes[i])
	}

	pub fn index_of(&self, key: &NodeKey) -> Option<usize> {
		self.index.get(key).copied()
	}

	pub fn lane(&self, key: &NodeKey) -> Option<&LaneBand> {
		self.lanes.iter().find(|l| &l.key == key)
	}

	/// Smallest rectangle enclosing every lane and node.
	pub fn bounds(&self) -> Rect {
		self.lanes
			.iter()
			.map(|l| l.rect)
			.chain(self.nodes.iter().map(|n| n.rect))
			.reduce(|a, b| a.union(&b))
			.unwrap_or_default()
	}

	/// Topmost node whose body contains `p`. Later nodes draw over earlier
	/// ones, so the search runs back to front.
	pub fn node_at(&self, p: Point) -> Option<&PlacedNode> {
		self.nodes.iter().rev().find(|n| n.rect.contains(p))
	}

	/// Range a rectangle covers on the lane stacking axis.
	fn across(&self, r: &Rect) -> (f64, f64) {
		if self.vertical {
			(r.x, r.right())
		} else {
			(r.y, r.bottom())
		}
	}

	/// Lane a node belongs to where it now stands: the band under its center,
	/// or its current lane when the center is outside every band.
	pub fn lane_at_drop(&self, key: &NodeKey) -> Option<NodeKey> {
		let node = self.node(key)?;
		let c = node.rect.center();
		let at = if self.vertical { c.x } else { c.y };
		self.lanes
			.iter()
			.find(|l| {
				let (lo, hi) = self.across(&l.rect);
				at >= lo && at < hi
			})
			.map(|l| l.key.clone())
			.or_else(|| node.lane.clone())
	}

	/// Recomputes lane bands from the stacked extents and the nodes: every
	/// band spans all content along its axis and widens to hold its members,
	/// never into a neighbouring lane.
	pub fn refit_lanes(&mut self, config: &DiagramConfig) {
		let vertical = self.vertical;
		let node_along = if vertical { config.node_height } else { config.node_width };
		let (along_min, along_max) = self
			.nodes
			.iter()
			.map(|n| {
				if vertical {
					(n.rect.y, n.rect.bottom())
				} else {
					(n.rect.x, n.rect.right())
				}
			})
			.fold(None, |acc: Option<(f64, f64)>, (lo, hi)| match acc {
				Some((a, b)) => Some((a.min(lo), b.max(hi))),
				None => Some((lo, hi)),
			})
			.unwrap_or((0.0, node_along));
		let along_start = along_min - config.lane_padding;
		let along_len = along_max - along_min + 2.0 * config.lane_padding;
		let header_across = if vertical { 0.0 } else { config.lane_header };

		let mut floor = f64::NEG_INFINITY;
		for i in 0..self.lanes.len() {
			let Some(&(start, extent)) = self.stacks.get(i) else {
				break;
			};
			let key = &self.lanes[i].key;
			let (lo, hi) = self
				.nodes
				.iter()
				.filter(|n| n.lane.as_ref() == Some(key))
				.map(|n| self.across(&n.rect))
				.fold((start, start + extent), |(lo, hi), (a, b)| {
					(
						lo.min(a - config.lane_padding - header_across),
						hi.max(b + config.lane_padding),
					)
				});
			let lo = lo.max(floor);
			let hi = match self.stacks.get(i + 1) {
				Some(&(next, _)) => hi.min(next),
				None => hi,
			};
			floor = hi;
			let (rect, header) = band_rects(vertical, lo, hi - lo, along_start, along_len, config.lane_header);
			self.lanes[i].rect = rect;
			self.lanes[i].header = header;
		}
	}
}

/// Band and header strip of a lane spanning `start..start + extent` across
/// and `along_start..along_start + along_len` along.
fn band_rects(vertical: bool, start: f64, extent: f64, along_start: f64, along_len: f64, header: f64) -> (Rect, Rect) {
	if vertical {
		(
			Rect::new(start, along_start - header, extent, along_len + header),
			Rect::new(start, along_start - header, extent, header),
		)
	} else {
		(
			Rect::new(along_start, start, along_len, extent),
			Rect::new(along_start, start, along_len, header),
		)
	}
}

/// Places lanes and nodes. `data` is expected to be validated already; nodes
/// whose lane is unknown are placed as lane-less.
pub fn compute_layout(data: &WorkflowData, heights: &LaneHeights, config: &DiagramConfig) -> DiagramLayout {
	let vertical = data.orientation == LaneOrientation::Vertical;
	// (along, across) -> (x, y)
	let to_xy = |along: f64, across: f64| if vertical { (across, along) } else { (along, across) };
	let node_across = if vertical { config.node_width } else { config.node_height };
	// Horizontal lanes carry their label strip across the lane; vertical
	// ones carry it above the column.
	let header_across = if vertical { 0.0 } else { config.lane_header };

	// Stack lanes in insertion order.
	let mut starts: HashMap<&NodeKey, (f64, f64)> = HashMap::new();
	let mut stacks = Vec::with_capacity(data.lanes.len());
	let mut running = 0.0_f64;
	for lane in &data.lanes {
		let start = lane.offset.unwrap_or(running).max(running);
		let deepest_member = data
			.nodes
			.iter()
			.filter(|n| n.lane.as_ref() == Some(&lane.key))
			.filter_map(|n| match n.position {
				NodePosition::InLane { across, .. } => Some(across.max(0.0)),
				NodePosition::Absolute { .. } => None,
			})
			.fold(0.0_f64, f64::max);
		let required = header_across + deepest_member + node_across + 2.0 * config.lane_padding;
		let extent = heights
			.get(&lane.key)
			.copied()
			.unwrap_or(config.lane_height)
			.max(required);
		starts.insert(&lane.key, (start, extent));
		stacks.push((start, extent));
		running = start + extent;
	}

	let mut nodes = Vec::with_capacity(data.nodes.len());
	let mut index = HashMap::with_capacity(data.nodes.len());
	for node in &data.nodes {
		let lane_start = node.lane.as_ref().and_then(|k| starts.get(k)).map(|&(s, _)| s);
		let (x, y) = match (node.position, lane_start) {
			(NodePosition::Absolute { x, y }, _) => (x, y),
			(NodePosition::InLane { along, across }, Some(start)) => {
				to_xy(along, start + header_across + config.lane_padding + across)
			}
			(NodePosition::InLane { along, across }, None) => to_xy(along, across),
		};
		index.insert(node.key.clone(), nodes.len());
		nodes.push(PlacedNode {
			key: node.key.clone(),
			lane: node.lane.clone(),
			rect: Rect::new(x, y, config.node_width, config.node_height),
		});
	}

	let lanes = data
		.lanes
		.iter()
		.map(|lane| LaneBand {
			key: lane.key.clone(),
			label: lane.label.clone(),
			color: lane.color.clone(),
			rect: Rect::default(),
			header: Rect::default(),
		})
		.collect();

	let mut layout = DiagramLayout {
		lanes,
		nodes,
		index,
		vertical,
		stacks,
	};
	layout.refit_lanes(config);
	layout
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::*;
	use crate::components::swimlane::types::{Lane, WorkflowNode};

	fn inside(outer: &Rect, inner: &Rect) -> bool {
		inner.x >= outer.x && inner.y >= outer.y && inner.right() <= outer.right() && inner.bottom() <= outer.bottom()
	}

	fn overlaps(a: &Rect, b: &Rect) -> bool {
		a.x < b.right() && b.x < a.right() && a.y < b.bottom() && b.y < a.bottom()
	}

	fn in_lane(key: i64, lane: &str, along: f64) -> WorkflowNode {
		WorkflowNode::new(key, "step", NodePosition::InLane { along, across: 0.0 }).in_lane(lane)
	}

	fn sample() -> WorkflowData {
		WorkflowData {
			lanes: vec![
				Lane::new("CUSTOMER", "Customer", "#f8d7da"),
				Lane::new("RM", "Relationship Manager", "#fff3cd"),
				Lane::new("RISK", "Risk Assessment", "#d1ecf1"),
			],
			nodes: vec![
				in_lane(1, "CUSTOMER", 0.0),
				in_lane(2, "RM", 0.0),
				in_lane(3, "RISK", 300.0),
			],
			..Default::default()
		}
	}

	#[test]
	fn lanes_stack_in_insertion_order_without_overlap() {
		let config = DiagramConfig::default();
		let layout = compute_layout(&sample(), &LaneHeights::new(), &config);
		let ys: Vec<f64> = layout.lanes.iter().map(|l| l.rect.y).collect();
		assert_eq!(ys, vec![0.0, 150.0, 300.0]);
		for pair in layout.lanes.windows(2) {
			assert!(pair[0].rect.bottom() <= pair[1].rect.y);
		}
	}

	#[test]
	fn lane_relative_nodes_sit_below_the_header() {
		let config = DiagramConfig::default();
		let layout = compute_layout(&sample(), &LaneHeights::new(), &config);
		let rm = layout.lane(&"RM".into()).map(|l| l.rect).unwrap_or_default();
		let n2 = layout.node(&2.into()).map(|n| n.rect).unwrap_or_default();
		assert_eq!(n2.y, rm.y + config.lane_header + config.lane_padding);
		assert!(n2.bottom() <= rm.bottom());
		let n3 = layout.node(&3.into()).map(|n| n.rect).unwrap_or_default();
		assert_eq!(n3.x, 300.0);
	}

	#[test]
	fn height_map_and_fixed_offsets_are_honored() {
		let config = DiagramConfig::default();
		let mut data = sample();
		data.lanes[2].offset = Some(900.0);
		// A fixed offset inside the previous lane is pushed down.
		data.lanes[1].offset = Some(10.0);
		let heights = LaneHeights::from([(NodeKey::from("CUSTOMER"), 400.0)]);
		let layout = compute_layout(&data, &heights, &config);
		assert_eq!(layout.lanes[0].rect.height, 400.0);
		assert_eq!(layout.lanes[1].rect.y, 400.0);
		assert_eq!(layout.lanes[2].rect.y, 900.0);
	}

	#[test]
	fn lanes_span_all_nodes_and_bounds_cover_everything() {
		let config = DiagramConfig::default();
		let layout = compute_layout(&sample(), &LaneHeights::new(), &config);
		for lane in &layout.lanes {
			assert_eq!(lane.rect.x, -config.lane_padding);
			assert_eq!(lane.rect.right(), 300.0 + config.node_width + config.lane_padding);
		}
		let bounds = layout.bounds();
		for node in &layout.nodes {
			assert!(bounds.contains(node.rect.center()));
		}
	}

	#[test]
	fn hit_test_prefers_topmost_node() {
		let config = DiagramConfig::default();
		let data = WorkflowData {
			nodes: vec![
				WorkflowNode::new(1, "a", NodePosition::Absolute { x: 0.0, y: 0.0 }),
				WorkflowNode::new(2, "b", NodePosition::Absolute { x: 50.0, y: 50.0 }),
			],
			..Default::default()
		};
		let layout = compute_layout(&data, &LaneHeights::new(), &config);
		assert_eq!(layout.node_at(Point::new(60.0, 60.0)).map(|n| n.key.clone()), Some(2.into()));
		assert_eq!(layout.node_at(Point::new(10.0, 10.0)).map(|n| n.key.clone()), Some(1.into()));
		assert!(layout.node_at(Point::new(-10.0, -10.0)).is_none());
	}

	#[rstest]
	#[case::horizontal(LaneOrientation::Horizontal)]
	#[case::vertical(LaneOrientation::Vertical)]
	fn nodes_sit_in_their_band_clear_of_the_header(#[case] orientation: LaneOrientation) {
		let config = DiagramConfig::default();
		let data = WorkflowData {
			orientation,
			..sample()
		};
		let layout = compute_layout(&data, &LaneHeights::new(), &config);
		for node in &layout.nodes {
			let lane = node
				.lane
				.as_ref()
				.and_then(|k| layout.lane(k))
				.unwrap_or_else(|| panic!("{} has a lane", node.key));
			assert!(inside(&lane.rect, &node.rect), "{} outside {:?}", node.key, lane.rect);
			assert!(!overlaps(&lane.header, &node.rect), "{} under the header", node.key);
			match orientation {
				LaneOrientation::Vertical => {
					assert_eq!(node.rect.x, lane.rect.x + config.lane_padding);
					assert_eq!(lane.header.width, lane.rect.width);
				}
				LaneOrientation::Horizontal => {
					assert_eq!(node.rect.y, lane.rect.y + config.lane_header + config.lane_padding);
					assert_eq!(lane.header.width, lane.rect.width);
				}
			}
		}
		for pair in layout.lanes.windows(2) {
			assert!(!overlaps(&pair[0].rect, &pair[1].rect));
		}
	}

	#[test]
	fn dropped_node_joins_the_band_under_its_center() {
		let config = DiagramConfig::default();
		let mut layout = compute_layout(&sample(), &LaneHeights::new(), &config);
		let rm_y = layout.lane(&"RM".into()).map(|l| l.rect.y).unwrap_or_default();
		if let Some(node) = layout.node_mut(&1.into()) {
			node.rect.y = rm_y + 40.0;
		}
		assert_eq!(layout.lane_at_drop(&1.into()), Some("RM".into()));
		if let Some(node) = layout.node_mut(&1.into()) {
			node.rect.y = -400.0;
		}
		assert_eq!(layout.lane_at_drop(&1.into()), Some("CUSTOMER".into()));
	}

	#[test]
	fn outer_lanes_grow_to_hold_a_dragged_member() {
		let config = DiagramConfig::default();
		let mut layout = compute_layout(&sample(), &LaneHeights::new(), &config);
		let before: Vec<Rect> = layout.lanes.iter().map(|l| l.rect).collect();
		if let Some(node) = layout.node_mut(&3.into()) {
			node.rect.y = 600.0;
			node.rect.x = 900.0;
		}
		layout.refit_lanes(&config);
		let risk = layout.lane(&"RISK".into()).map(|l| l.rect).unwrap_or_default();
		let moved = layout.node(&3.into()).map(|n| n.rect).unwrap_or_default();
		assert!(inside(&risk, &moved));
		assert_eq!(risk.y, before[2].y);
		assert_eq!(layout.lanes[1].rect.y, before[1].y);
		assert_eq!(layout.lanes[1].rect.height, before[1].height);
		for lane in &layout.lanes {
			assert_eq!(lane.rect.right(), moved.right() + config.lane_padding);
		}
	}

	#[test]
	fn a_member_dragged_into_a_neighbor_does_not_stretch_over_it() {
		let config = DiagramConfig::default();
		let mut layout = compute_layout(&sample(), &LaneHeights::new(), &config);
		let before: Vec<Rect> = layout.lanes.iter().map(|l| l.rect).collect();
		// Node 1 (CUSTOMER) pulled down into RISK without changing lanes.
		if let Some(node) = layout.node_mut(&1.into()) {
			node.rect.y = 320.0;
		}
		layout.refit_lanes(&config);
		assert_eq!(layout.lanes[0].rect.bottom(), before[1].y);
		for pair in layout.lanes.windows(2) {
			assert!(!overlaps(&pair[0].rect, &pair[1].rect));
		}
	}
}
