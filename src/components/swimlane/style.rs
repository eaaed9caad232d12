//! Derived node colors. Nothing here is cached: the fill is recomputed from
//! the node record and the current highlight set every time it is needed.

use std::collections::HashSet;

use super::config::DiagramConfig;
use super::types::{Lane, NodeKey, WorkflowNode};

/// Fill a node has when it is not highlighted: its own color, else the
/// tint of its lane, else the default.
pub fn resting_fill<'a>(node: &'a WorkflowNode, lane: Option<&'a Lane>, config: &'a DiagramConfig) -> &'a str {
	node.color
		.as_deref()
		.or(lane.map(|l| l.color.as_str()))
		.unwrap_or(&config.default_fill)
}

pub fn node_fill<'a>(
	node: &'a WorkflowNode,
	lane: Option<&'a Lane>,
	highlighted: &HashSet<NodeKey>,
	config: &'a DiagramConfig,
) -> &'a str {
	if highlighted.contains(&node.key) {
		&config.highlight_fill
	} else {
		resting_fill(node, lane, config)
	}
}

pub fn node_stroke<'a>(node: &'a WorkflowNode, highlighted: &HashSet<NodeKey>, config: &'a DiagramConfig) -> &'a str {
	if highlighted.contains(&node.key) {
		&config.highlight_stroke
	} else {
		node.stroke.as_deref().unwrap_or(&config.default_stroke)
	}
}

#[cfg(test)]
mod tests {
	use proptest::prelude::*;

	use super::*;
	use crate::components::swimlane::types::NodePosition;

	fn node(key: i64, color: Option<&str>) -> WorkflowNode {
		let n = WorkflowNode::new(key, "step", NodePosition::Absolute { x: 0.0, y: 0.0 });
		match color {
			Some(c) => n.with_color(c),
			None => n,
		}
	}

	#[test]
	fn fill_falls_back_from_node_to_lane_to_default() {
		let config = DiagramConfig::default();
		let lane = Lane::new("RISK", "Risk", "#d1ecf1");
		let none = HashSet::new();
		assert_eq!(node_fill(&node(1, Some("#123456")), Some(&lane), &none, &config), "#123456");
		assert_eq!(node_fill(&node(1, None), Some(&lane), &none, &config), "#d1ecf1");
		assert_eq!(node_fill(&node(1, None), None, &none, &config), config.default_fill);
	}

	#[test]
	fn highlight_overrides_fill_and_stroke() {
		let config = DiagramConfig::default();
		let set = HashSet::from([NodeKey::from(1)]);
		let n = node(1, Some("#123456"));
		assert_eq!(node_fill(&n, None, &set, &config), config.highlight_fill);
		assert_eq!(node_stroke(&n, &set, &config), config.highlight_stroke);
		assert_eq!(node_stroke(&n, &HashSet::new(), &config), config.default_stroke);
	}

	fn key_set() -> impl Strategy<Value = HashSet<NodeKey>> {
		prop::collection::hash_set((0i64..8).prop_map(NodeKey::from), 0..8)
	}

	proptest! {
		/// fill == highlight iff the key is in the set, else the resting fill.
		#[test]
		fn prop_fill_tracks_membership(
			key in 0i64..8,
			color in prop::option::of("#[0-9a-f]{6}"),
			set in key_set(),
		) {
			let config = DiagramConfig::default();
			let n = node(key, color.as_deref());
			let fill = node_fill(&n, None, &set, &config);
			if set.contains(&n.key) {
				prop_assert_eq!(fill, config.highlight_fill.as_str());
			} else {
				prop_assert_eq!(fill, resting_fill(&n, None, &config));
			}
		}

		/// S1 -> S2 -> S1 gives the same fill as applying S1 once.
		#[test]
		fn prop_highlight_is_reversible(
			key in 0i64..8,
			s1 in key_set(),
			s2 in key_set(),
		) {
			let config = DiagramConfig::default();
			let n = node(key, None);
			let first = node_fill(&n, None, &s1, &config).to_owned();
			let _ = node_fill(&n, None, &s2, &config);
			prop_assert_eq!(node_fill(&n, None, &s1, &config), first.as_str());
		}
	}
}
