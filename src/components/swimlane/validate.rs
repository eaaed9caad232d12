use std::collections::HashSet;

use log::warn;
use thiserror::Error;

use super::types::{NodeKey, WorkflowData};

/// Problems found in caller-supplied workflow data. None of them is fatal:
/// the offending piece is dropped or downgraded and drawing continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelIssue {
	#[error("edge {from} -> {to} references missing node {missing}")]
	DanglingEdge {
		from: NodeKey,
		to: NodeKey,
		missing: NodeKey,
	},
	#[error("node {node} references unknown lane {lane}")]
	UnknownLane { node: NodeKey, lane: NodeKey },
	#[error("duplicate node key {key}")]
	DuplicateNode { key: NodeKey },
	#[error("duplicate lane key {key}")]
	DuplicateLane { key: NodeKey },
}

/// Returns a cleaned copy of `data` and the issues that were fixed.
///
/// Duplicate keys keep their first occurrence, nodes in unknown lanes become
/// lane-less, and edges with a missing endpoint are dropped.
pub fn validate(data: &WorkflowData) -> (WorkflowData, Vec<ModelIssue>) {
	let mut issues = Vec::new();

	let mut lane_keys = HashSet::new();
	let mut lanes = Vec::with_capacity(data.lanes.len());
	for lane in &data.lanes {
		if lane_keys.insert(lane.key.clone()) {
			lanes.push(lane.clone());
		} else {
			issues.push(ModelIssue::DuplicateLane {
				key: lane.key.clone(),
			});
		}
	}

	let mut node_keys = HashSet::new();
	let mut nodes = Vec::with_capacity(data.nodes.len());
	for node in &data.nodes {
		if !node_keys.insert(node.key.clone()) {
			issues.push(ModelIssue::DuplicateNode {
				key: node.key.clone(),
			});
			continue;
		}
		let mut node = node.clone();
		if let Some(lane) = &node.lane {
			if !lane_keys.contains(lane) {
				issues.push(ModelIssue::UnknownLane {
					node: node.key.clone(),
					lane: lane.clone(),
				});
				node.lane = None;
			}
		}
		nodes.push(node);
	}

	let mut links = Vec::with_capacity(data.links.len());
	for link in &data.links {
		let missing = [&link.from, &link.to]
			.into_iter()
			.find(|k| !node_keys.contains(*k));
		match missing {
			Some(missing) => issues.push(ModelIssue::DanglingEdge {
				from: link.from.clone(),
				to: link.to.clone(),
				missing: missing.clone(),
			}),
			None => links.push(link.clone()),
		}
	}

	for issue in &issues {
		warn!("workflow data: {issue}");
	}

	(
		WorkflowData {
			orientation: data.orientation,
			lanes,
			nodes,
			links,
		},
		issues,
	)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::swimlane::types::{Lane, NodePosition, WorkflowLink, WorkflowNode};

	fn node(key: i64, lane: Option<&str>) -> WorkflowNode {
		let n = WorkflowNode::new(key, format!("step {key}"), NodePosition::Absolute { x: 0.0, y: 0.0 });
		match lane {
			Some(l) => n.in_lane(l),
			None => n,
		}
	}

	#[test]
	fn drops_dangling_edges_and_keeps_valid_ones() {
		let data = WorkflowData {
			nodes: vec![node(1, None), node(2, None)],
			links: vec![WorkflowLink::new(1, 2), WorkflowLink::new(2, 99)],
			..Default::default()
		};
		let (clean, issues) = validate(&data);
		assert_eq!(clean.links, vec![WorkflowLink::new(1, 2)]);
		assert_eq!(
			issues,
			vec![ModelIssue::DanglingEdge {
				from: 2.into(),
				to: 99.into(),
				missing: 99.into(),
			}]
		);
	}

	#[test]
	fn unknown_lane_becomes_laneless() {
		let data = WorkflowData {
			lanes: vec![Lane::new("RM", "Relationship Manager", "#fff3cd")],
			nodes: vec![node(1, Some("RM")), node(2, Some("GHOST"))],
			..Default::default()
		};
		let (clean, issues) = validate(&data);
		assert_eq!(clean.nodes[0].lane, Some("RM".into()));
		assert_eq!(clean.nodes[1].lane, None);
		assert_eq!(issues.len(), 1);
		assert!(issues[0].to_string().contains("GHOST"));
	}

	#[test]
	fn duplicate_node_keeps_first() {
		let mut second = node(1, None);
		second.text = "shadow".into();
		let data = WorkflowData {
			nodes: vec![node(1, None), second],
			..Default::default()
		};
		let (clean, issues) = validate(&data);
		assert_eq!(clean.nodes.len(), 1);
		assert_eq!(clean.nodes[0].text, "step 1");
		assert_eq!(issues, vec![ModelIssue::DuplicateNode { key: 1.into() }]);
	}
}
