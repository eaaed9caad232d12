use std::collections::BTreeMap;
use std::fmt;

/// Identifier shared by nodes and lanes. Workflow exports use both numeric
/// and string keys, so both are kept as-is.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKey {
	/// Numeric key, e.g. `7`.
	Int(i64),
	/// String key, e.g. `"RISK"`.
	Name(String),
}

impl fmt::Display for NodeKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			NodeKey::Int(n) => write!(f, "{n}"),
			NodeKey::Name(s) => f.write_str(s),
		}
	}
}

impl From<i64> for NodeKey {
	fn from(value: i64) -> Self {
		NodeKey::Int(value)
	}
}

impl From<i32> for NodeKey {
	fn from(value: i32) -> Self {
		NodeKey::Int(i64::from(value))
	}
}

impl From<&str> for NodeKey {
	fn from(value: &str) -> Self {
		NodeKey::Name(value.to_owned())
	}
}

impl From<String> for NodeKey {
	fn from(value: String) -> Self {
		NodeKey::Name(value)
	}
}

/// Stacking direction of the lanes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LaneOrientation {
	/// Lanes are rows stacked top to bottom.
	#[default]
	Horizontal,
	/// Lanes are columns stacked left to right.
	Vertical,
}

/// A swimlane: a band grouping the steps of one role.
#[derive(Clone, Debug, PartialEq)]
pub struct Lane {
	pub key: NodeKey,
	pub label: String,
	pub color: String,
	/// Fixed position along the stacking axis. `None` stacks the lane right
	/// after the previous one.
	pub offset: Option<f64>,
}

impl Lane {
	pub fn new(key: impl Into<NodeKey>, label: impl Into<String>, color: impl Into<String>) -> Self {
		Self {
			key: key.into(),
			label: label.into(),
			color: color.into(),
			offset: None,
		}
	}
}

/// Where a node sits before layout.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NodePosition {
	/// Document coordinates.
	Absolute { x: f64, y: f64 },
	/// Relative to the owning lane: `along` runs the length of the lane,
	/// `across` is measured from the lane's content start (below the header).
	InLane { along: f64, across: f64 },
}

impl NodePosition {
	/// Parses an `"x y"` location string as found in workflow exports.
	pub fn parse_loc(loc: &str) -> Option<Self> {
		let mut parts = loc.split_whitespace().map(str::parse::<f64>);
		let x = parts.next()?.ok()?;
		let y = parts.next()?.ok()?;
		if parts.next().is_some() || !x.is_finite() || !y.is_finite() {
			return None;
		}
		Some(NodePosition::Absolute { x, y })
	}
}

/// One process step.
#[derive(Clone, Debug, PartialEq)]
pub struct WorkflowNode {
	pub key: NodeKey,
	pub text: String,
	pub lane: Option<NodeKey>,
	pub position: NodePosition,
	pub color: Option<String>,
	pub stroke: Option<String>,
	/// Remaining record fields, echoed back on selection.
	pub extra: BTreeMap<String, String>,
}

impl WorkflowNode {
	pub fn new(key: impl Into<NodeKey>, text: impl Into<String>, position: NodePosition) -> Self {
		Self {
			key: key.into(),
			text: text.into(),
			lane: None,
			position,
			color: None,
			stroke: None,
			extra: BTreeMap::new(),
		}
	}

	pub fn in_lane(mut self, lane: impl Into<NodeKey>) -> Self {
		self.lane = Some(lane.into());
		self
	}

	pub fn with_color(mut self, color: impl Into<String>) -> Self {
		self.color = Some(color.into());
		self
	}

	pub fn with_extra(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
		self.extra.insert(field.into(), value.into());
		self
	}
}

/// A directed connector between two steps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkflowLink {
	pub from: NodeKey,
	pub to: NodeKey,
}

impl WorkflowLink {
	pub fn new(from: impl Into<NodeKey>, to: impl Into<NodeKey>) -> Self {
		Self {
			from: from.into(),
			to: to.into(),
		}
	}
}

/// Everything needed to draw one workflow. Replaced wholesale, never patched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WorkflowData {
	pub orientation: LaneOrientation,
	pub lanes: Vec<Lane>,
	pub nodes: Vec<WorkflowNode>,
	pub links: Vec<WorkflowLink>,
}

impl WorkflowData {
	pub fn node(&self, key: &NodeKey) -> Option<&WorkflowNode> {
		self.nodes.iter().find(|n| &n.key == key)
	}

	pub fn lane(&self, key: &NodeKey) -> Option<&Lane> {
		self.lanes.iter().find(|l| &l.key == key)
	}
}
