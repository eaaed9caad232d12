//! Tunables for layout, routing, view and palette.

pub const HIGHLIGHT_FILL: &str = "#DF98EA";
pub const HIGHLIGHT_STROKE: &str = "#8308BC";
pub const DEFAULT_FILL: &str = "#ffffff";
pub const DEFAULT_STROKE: &str = "#888888";
pub const EDGE_COLOR: &str = "#666666";
pub const CANVAS_BACKGROUND: &str = "#ffffff";

/// Cost weights for the grid router.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RoutingWeights {
	pub step_cost: f64,
	pub bend_penalty: f64,
	pub crossing_penalty: f64,
}

impl Default for RoutingWeights {
	fn default() -> Self {
		Self {
			step_cost: 1.0,
			bend_penalty: 3.0,
			crossing_penalty: 5.0,
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct DiagramConfig {
	pub node_width: f64,
	pub node_height: f64,
	/// Inner margin between the node border and its text.
	pub text_margin: f64,
	pub font_size: f64,
	pub lane_height: f64,
	/// Strip reserved for the lane label.
	pub lane_header: f64,
	/// Space around the content inside a lane band.
	pub lane_padding: f64,
	/// Blank border kept around the diagram when fitting.
	pub padding: f64,

	pub route_cell: f64,
	pub node_clearance: f64,
	/// Stub length between a node border and the first bend.
	pub short_length: f64,
	pub corner: f64,
	pub jump_radius: f64,
	pub routing: RoutingWeights,
	/// Lattice points one edge search may expand before giving up on the grid.
	pub route_budget: usize,
	/// Upper bound on lattice points; larger diagrams get a coarser lattice.
	pub route_max_cells: usize,

	pub zoom_factor: f64,
	pub min_scale: f64,
	pub max_scale: f64,
	/// Fit the whole diagram into the viewport on construction.
	pub initial_auto_scale: bool,
	pub allow_node_drag: bool,
	/// Pointer travel (screen pixels) under which a press-release is a click.
	pub click_tolerance: f64,
	pub history_limit: usize,

	pub highlight_fill: String,
	pub highlight_stroke: String,
	pub default_fill: String,
	pub default_stroke: String,
	pub edge_color: String,
}

impl Default for DiagramConfig {
	fn default() -> Self {
		Self {
			node_width: 240.0,
			node_height: 100.0,
			text_margin: 16.0,
			font_size: 20.0,
			lane_height: 150.0,
			lane_header: 28.0,
			lane_padding: 10.0,
			padding: 20.0,

			route_cell: 10.0,
			node_clearance: 10.0,
			short_length: 12.0,
			corner: 10.0,
			jump_radius: 5.0,
			routing: RoutingWeights::default(),
			route_budget: 20_000,
			route_max_cells: 120_000,

			zoom_factor: 1.05,
			min_scale: 0.1,
			max_scale: 10.0,
			initial_auto_scale: true,
			allow_node_drag: true,
			click_tolerance: 4.0,
			history_limit: 100,

			highlight_fill: HIGHLIGHT_FILL.into(),
			highlight_stroke: HIGHLIGHT_STROKE.into(),
			default_fill: DEFAULT_FILL.into(),
			default_stroke: DEFAULT_STROKE.into(),
			edge_color: EDGE_COLOR.into(),
		}
	}
}
