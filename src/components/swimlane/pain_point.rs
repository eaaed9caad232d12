//! Bottleneck scoring and the progress-driven scan that feeds the highlight
//! set.

use log::info;

use super::types::{NodeKey, WorkflowData};

/// Percentage added per scan tick.
pub const SCAN_STEP: u32 = 5;
/// Interval between scan ticks.
pub const SCAN_TICK_MS: u32 = 100;
pub const DEFAULT_THRESHOLD: f64 = 10.0;

/// Operational figures for one workflow step.
#[derive(Clone, Debug, PartialEq)]
pub struct StepMetrics {
	/// Node this step belongs to, when known.
	pub key: Option<NodeKey>,
	pub name: String,
	pub duration: f64,
	pub dependencies: f64,
	pub handoffs: f64,
	pub error_rate: f64,
	pub rework_count: f64,
}

impl StepMetrics {
	pub fn named(name: impl Into<String>) -> Self {
		Self {
			key: None,
			name: name.into(),
			duration: 1.0,
			dependencies: 1.0,
			handoffs: 1.0,
			error_rate: 0.0,
			rework_count: 0.0,
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct PainPoint {
	pub step: String,
	pub key: Option<NodeKey>,
	/// Rounded to two decimals.
	pub score: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PainPointDetector {
	pub threshold: f64,
}

impl Default for PainPointDetector {
	fn default() -> Self {
		Self {
			threshold: DEFAULT_THRESHOLD,
		}
	}
}

impl PainPointDetector {
	pub fn score(&self, step: &StepMetrics) -> f64 {
		step.duration * step.dependencies * step.handoffs + step.error_rate * 10.0 + step.rework_count * 5.0
	}

	pub fn detect(&self, steps: &[StepMetrics]) -> Vec<PainPoint> {
		let points: Vec<PainPoint> = steps
			.iter()
			.filter_map(|step| {
				let score = self.score(step);
				(score >= self.threshold).then(|| PainPoint {
					step: step.name.clone(),
					key: step.key.clone(),
					score: (score * 100.0).round() / 100.0,
				})
			})
			.collect();
		info!("detected {} pain points in {} steps", points.len(), steps.len());
		points
	}

	/// Node keys to highlight: a step maps to its own key, or else to every
	/// node whose text equals the step name.
	pub fn flagged_nodes(&self, steps: &[StepMetrics], data: &WorkflowData) -> Vec<NodeKey> {
		let mut keys: Vec<NodeKey> = Vec::new();
		for point in self.detect(steps) {
			let matched: Vec<NodeKey> = match point.key {
				Some(key) => data.node(&key).map(|n| n.key.clone()).into_iter().collect(),
				None => data
					.nodes
					.iter()
					.filter(|n| n.text == point.step)
					.map(|n| n.key.clone())
					.collect(),
			};
			for key in matched {
				if !keys.contains(&key) {
					keys.push(key);
				}
			}
		}
		keys
	}
}

/// Progress of a simulated detection run.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum PainPointScan {
	#[default]
	Idle,
	Scanning {
		progress: u32,
	},
	/// Finished; holds the flagged node keys.
	Complete(Vec<NodeKey>),
}

impl PainPointScan {
	/// Starts a scan from `Idle`. Returns whether a scan began.
	pub fn start(&mut self) -> bool {
		if *self != PainPointScan::Idle {
			return false;
		}
		*self = PainPointScan::Scanning { progress: 0 };
		true
	}

	/// Advances a running scan by one step. When it reaches 100 % `detect`
	/// runs and the scan completes; returns `true` on that tick only.
	pub fn tick(&mut self, detect: impl FnOnce() -> Vec<NodeKey>) -> bool {
		let PainPointScan::Scanning { progress } = self else {
			return false;
		};
		*progress = (*progress + SCAN_STEP).min(100);
		if *progress < 100 {
			return false;
		}
		*self = PainPointScan::Complete(detect());
		true
	}

	/// Abandons a running scan, discarding partial progress.
	pub fn cancel(&mut self) {
		if self.is_scanning() {
			*self = PainPointScan::Idle;
		}
	}

	/// The tool button: clears shown results, otherwise starts a scan.
	/// Returns whether a scan began.
	pub fn toggle(&mut self) -> bool {
		match self {
			PainPointScan::Scanning { .. } => false,
			PainPointScan::Complete(keys) if !keys.is_empty() => {
				*self = PainPointScan::Idle;
				false
			}
			_ => {
				*self = PainPointScan::Idle;
				self.start()
			}
		}
	}

	pub fn is_scanning(&self) -> bool {
		matches!(self, PainPointScan::Scanning { .. })
	}

	pub fn progress(&self) -> Option<u32> {
		match self {
			PainPointScan::Scanning { progress } => Some(*progress),
			_ => None,
		}
	}

	/// Keys to highlight in the current state.
	pub fn highlighted(&self) -> Vec<NodeKey> {
		match self {
			PainPointScan::Complete(keys) => keys.clone(),
			_ => Vec::new(),
		}
	}
}
