//! Demo workflows for the loan-approval process.

use super::layout::LaneHeights;
use super::pain_point::StepMetrics;
use super::types::{Lane, NodePosition, WorkflowData, WorkflowLink, WorkflowNode};

/// Horizontal distance between step columns.
const COLUMN: f64 = 300.0;

fn step(key: &str, text: &str, lane: &str, column: u32) -> WorkflowNode {
	WorkflowNode::new(
		key,
		text,
		NodePosition::InLane {
			along: f64::from(column) * COLUMN,
			across: 0.0,
		},
	)
	.in_lane(lane)
}

fn links(pairs: &[(&str, &str)]) -> Vec<WorkflowLink> {
	pairs.iter().map(|(from, to)| WorkflowLink::new(*from, *to)).collect()
}

fn loan_lanes() -> Vec<Lane> {
	vec![
		Lane::new("customer", "CUSTOMER", "#f28b82"),
		Lane::new("rm", "Relationship Manager", "#fbbc04"),
		Lane::new("risk", "RISKS ASSESSMENT", "#d7aefb"),
		Lane::new("ops", "OPERATIONS", "#ccff90"),
	]
}

pub fn loan_workflow() -> WorkflowData {
	WorkflowData {
		lanes: loan_lanes(),
		nodes: vec![
			step("n1", "Submit loan\napplication + documents", "customer", 0)
				.with_extra("duration", "1 - 2 business days")
				.with_extra(
					"description",
					"The customer submits a completed application with personal, employment, financial and collateral information.",
				),
			step("n2", "Upload to system (LOS)", "rm", 0),
			step("n3", "Check CIC (Credit Report)", "risk", 0).with_extra("duration", "1 - 2 business days"),
			step("n4", "Analyze DTI + scoring", "risk", 1),
			step("n5", "Verify income\nemployment, collateral", "rm", 1),
			step("n6", "Issue approval letter", "risk", 2),
			step("n7", "Input into Core Lending", "ops", 1),
			step("n8", "Disburse loan", "ops", 2),
			step("n9", "Finish", "customer", 3),
		],
		links: links(&[
			("n1", "n2"),
			("n2", "n3"),
			("n3", "n4"),
			("n4", "n5"),
			("n5", "n4"),
			("n4", "n6"),
			("n6", "n7"),
			("n7", "n8"),
			("n8", "n9"),
		]),
		..Default::default()
	}
}

/// The risk lane carries most of the loop between scoring and verification,
/// so it gets a taller band.
pub fn loan_lane_heights() -> LaneHeights {
	LaneHeights::from([("risk".into(), 180.0)])
}

/// Drill-down of the intake and appraisal stage.
pub fn loan_sub_workflow() -> WorkflowData {
	WorkflowData {
		lanes: vec![
			Lane::new("rm", "Relationship Manager", "#fbbc04"),
			Lane::new("risk", "RISKS ASSESSMENT", "#d7aefb"),
		],
		nodes: vec![
			step("s1", "Tiếp nhận hồ sơ và thẩm định", "rm", 0),
			step("s2", "Collect collateral documents", "rm", 1),
			step("s3", "Third-party verification", "risk", 1),
			step("s4", "Appraisal report", "risk", 2),
		],
		links: links(&[("s1", "s2"), ("s1", "s3"), ("s2", "s4"), ("s3", "s4")]),
		..Default::default()
	}
}

/// The loan workflow after the suggested change: credit check and scoring
/// merged into one automated step.
pub fn loan_workflow_suggested() -> WorkflowData {
	let mut data = loan_workflow();
	data.nodes.retain(|n| !["n3", "n4"].contains(&n.key.to_string().as_str()));
	data.nodes.push(
		step("n34", "Automated CIC check + DTI scoring", "risk", 0)
			.with_color("#c8e6c9")
			.with_extra("duration", "under 1 hour"),
	);
	data.links = links(&[
		("n1", "n2"),
		("n2", "n34"),
		("n34", "n5"),
		("n5", "n34"),
		("n34", "n6"),
		("n6", "n7"),
		("n7", "n8"),
		("n8", "n9"),
	]);
	data
}

/// Step figures the detector scores for the demo. Steps are matched to
/// nodes by their text.
pub fn loan_step_metrics() -> Vec<StepMetrics> {
	let figures = [
		("Submit loan\napplication + documents", 1.0, 1.0, 1.0, 0.01, 0.0),
		("Check CIC (Credit Report)", 3.0, 2.0, 2.0, 0.02, 1.0),
		("Tiếp nhận hồ sơ và thẩm định", 2.0, 2.0, 2.0, 0.05, 1.0),
		("Analyze DTI + scoring", 1.0, 2.0, 1.0, 0.02, 0.0),
		("Issue approval letter", 0.5, 1.0, 3.0, 0.08, 0.0),
		("Disburse loan", 1.0, 3.0, 2.0, 0.03, 0.0),
	];
	figures
		.into_iter()
		.map(|(name, duration, dependencies, handoffs, error_rate, rework_count)| StepMetrics {
			duration,
			dependencies,
			handoffs,
			error_rate,
			rework_count,
			..StepMetrics::named(name)
		})
		.collect()
}

/// Picks the graph to display: a suggested (enhanced) graph wins over the
/// primary workflow, which wins over the sub-workflow.
pub fn resolve_workflow<'a>(
	enhanced: Option<&'a WorkflowData>,
	primary: Option<&'a WorkflowData>,
	sub: Option<&'a WorkflowData>,
) -> Option<&'a WorkflowData> {
	enhanced.or(primary).or(sub)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::swimlane::config::DiagramConfig;
	use crate::components::swimlane::layout::{LaneHeights, compute_layout};
	use crate::components::swimlane::pain_point::PainPointDetector;
	use crate::components::swimlane::types::NodeKey;
	use crate::components::swimlane::validate::validate;

	#[test]
	fn fixtures_validate_cleanly() {
		for data in [loan_workflow(), loan_sub_workflow(), loan_workflow_suggested()] {
			let (_, issues) = validate(&data);
			assert!(issues.is_empty(), "{issues:?}");
		}
	}

	#[test]
	fn fixture_nodes_do_not_overlap() {
		let config = DiagramConfig::default();
		let layout = compute_layout(&loan_workflow(), &LaneHeights::new(), &config);
		for (i, a) in layout.nodes.iter().enumerate() {
			for b in &layout.nodes[i + 1..] {
				let apart = a.rect.right() <= b.rect.x
					|| b.rect.right() <= a.rect.x
					|| a.rect.bottom() <= b.rect.y
					|| b.rect.bottom() <= a.rect.y;
				assert!(apart, "{} overlaps {}", a.key, b.key);
			}
		}
	}

	#[test]
	fn lane_heights_stretch_the_risk_band() {
		let layout = compute_layout(&loan_workflow(), &loan_lane_heights(), &DiagramConfig::default());
		let risk = layout.lane(&"risk".into()).map(|l| l.rect.height);
		let rm = layout.lane(&"rm".into()).map(|l| l.rect.height);
		assert_eq!(risk, Some(180.0));
		assert_eq!(rm, Some(DiagramConfig::default().lane_height));
	}

	#[test]
	fn demo_detection_flags_the_credit_check() {
		let detector = PainPointDetector::default();
		let keys = detector.flagged_nodes(&loan_step_metrics(), &loan_workflow());
		assert!(keys.contains(&NodeKey::from("n3")));
		assert!(!keys.contains(&NodeKey::from("n1")));
		let sub = detector.flagged_nodes(&loan_step_metrics(), &loan_sub_workflow());
		assert_eq!(sub, vec![NodeKey::from("s1")]);
	}

	#[test]
	fn enhanced_beats_primary_beats_sub() {
		let (enhanced, primary, sub) = (loan_workflow_suggested(), loan_workflow(), loan_sub_workflow());
		assert_eq!(resolve_workflow(Some(&enhanced), Some(&primary), Some(&sub)), Some(&enhanced));
		assert_eq!(resolve_workflow(None, Some(&primary), Some(&sub)), Some(&primary));
		assert_eq!(resolve_workflow(None, None, Some(&sub)), Some(&sub));
		assert_eq!(resolve_workflow(None, None, None), None);
	}
}
