//! Orthogonal edge routing around node bodies.
//!
//! Every edge leaves its source from the side facing the target, runs a
//! short stub, then follows an A* path over a lattice whose points inside
//! (inflated) node rectangles are blocked. Bends and reuse of lattice points
//! taken by earlier edges are penalized. Where a later edge crosses an
//! earlier one a jump point is recorded for the renderer.
//!
//! A blocked port tries the other sides of its node. When the lattice search
//! fails or runs out of budget the edge detours around the outside of the
//! whole diagram instead.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use log::{debug, warn};

use super::config::{DiagramConfig, RoutingWeights};
use super::geometry::{Point, Rect, orthogonal_crossing};
use super::layout::DiagramLayout;
use super::types::{NodeKey, WorkflowLink};

/// How far the stub search may walk outward looking for a free lattice point.
const MAX_STUB_STEPS: usize = 8;

/// Port positions along a node side, as fractions of its length.
const PORT_OFFSETS: [f64; 3] = [0.5, 0.25, 0.75];

#[derive(Clone, Debug, PartialEq)]
pub struct RoutedEdge {
	pub from: NodeKey,
	pub to: NodeKey,
	/// Polyline from the source border to the target border.
	pub points: Vec<Point>,
	/// Points where this edge hops over an earlier one.
	pub jumps: Vec<Point>,
	/// The lattice search gave no path; the edge detours around the diagram
	/// or, if its endpoints are walled in, is a straight segment.
	pub fallback: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
	Left,
	Right,
	Top,
	Bottom,
}

impl Side {
	fn normal(self) -> (f64, f64) {
		match self {
			Side::Left => (-1.0, 0.0),
			Side::Right => (1.0, 0.0),
			Side::Top => (0.0, -1.0),
			Side::Bottom => (0.0, 1.0),
		}
	}

	fn opposite(self) -> Side {
		match self {
			Side::Left => Side::Right,
			Side::Right => Side::Left,
			Side::Top => Side::Bottom,
			Side::Bottom => Side::Top,
		}
	}

	/// Point on `rect`'s border, `t` of the way along this side.
	fn port(self, rect: &Rect, t: f64) -> Point {
		match self {
			Side::Left => Point::new(rect.x, rect.y + rect.height * t),
			Side::Right => Point::new(rect.right(), rect.y + rect.height * t),
			Side::Top => Point::new(rect.x + rect.width * t, rect.y),
			Side::Bottom => Point::new(rect.x + rect.width * t, rect.bottom()),
		}
	}

	/// This side first, then the two beside it (the one nearer `toward`
	/// first), then the back.
	fn preference(self, from: Point, toward: Point) -> [Side; 4] {
		let (near, far) = match self {
			Side::Left | Side::Right if toward.y >= from.y => (Side::Bottom, Side::Top),
			Side::Left | Side::Right => (Side::Top, Side::Bottom),
			Side::Top | Side::Bottom if toward.x >= from.x => (Side::Right, Side::Left),
			Side::Top | Side::Bottom => (Side::Left, Side::Right),
		};
		[self, near, far, self.opposite()]
	}

	/// Index of the matching edge of an enclosing ring, clockwise from the top.
	fn ring_edge(self) -> usize {
		match self {
			Side::Top => 0,
			Side::Right => 1,
			Side::Bottom => 2,
			Side::Left => 3,
		}
	}
}

/// Sides of `src` and `dst` that face each other.
fn facing_sides(src: &Rect, dst: &Rect) -> (Side, Side) {
	let (a, b) = (src.center(), dst.center());
	let (dx, dy) = (b.x - a.x, b.y - a.y);
	if dx.abs() >= dy.abs() {
		if dx >= 0.0 {
			(Side::Right, Side::Left)
		} else {
			(Side::Left, Side::Right)
		}
	} else if dy >= 0.0 {
		(Side::Bottom, Side::Top)
	} else {
		(Side::Top, Side::Bottom)
	}
}

/// Whether no segment of `points` passes through a node body other than
/// those listed in `skip`.
fn is_clear(bodies: &[Rect], skip: [usize; 2], points: &[Point]) -> bool {
	points.windows(2).all(|seg| {
		bodies
			.iter()
			.enumerate()
			.filter(|(i, _)| !skip.contains(i))
			.all(|(_, body)| !body.intersects_segment(seg[0], seg[1]))
	})
}

struct RouteGrid {
	cols: usize,
	rows: usize,
	cell: f64,
	origin: Point,
	blocked: Vec<bool>,
}

impl RouteGrid {
	/// Lattice over the obstacles plus `margin`. The pitch starts at `cell`
	/// and grows until at most `max_cells` points remain. Returns `None` when
	/// the pitch would have to exceed half the smallest obstacle, since a
	/// coarser lattice could step straight over one.
	fn new(obstacles: &[Rect], cell: f64, margin: f64, max_cells: usize) -> Option<Self> {
		let bounds = obstacles.iter().copied().reduce(|a, b| a.union(&b))?.inflate(margin);
		let finest = obstacles
			.iter()
			.map(|r| r.width.min(r.height))
			.fold(f64::INFINITY, f64::min);
		let estimate = (bounds.width / cell + 2.0) * (bounds.height / cell + 2.0);
		let mut scale = (estimate / max_cells.max(1) as f64).sqrt().floor().max(1.0);
		let (cell, origin, cols, rows) = loop {
			let pitch = cell * scale;
			if pitch > finest / 2.0 {
				debug!("diagram too large for a {pitch} lattice, routing by detour");
				return None;
			}
			let origin = Point::new(
				(bounds.x / pitch).floor() * pitch,
				(bounds.y / pitch).floor() * pitch,
			);
			let cols = ((bounds.right() - origin.x) / pitch).ceil() as usize + 1;
			let rows = ((bounds.bottom() - origin.y) / pitch).ceil() as usize + 1;
			if cols * rows <= max_cells {
				break (pitch, origin, cols, rows);
			}
			scale += 1.0;
		};
		let mut blocked = vec![false; cols * rows];
		for r in obstacles {
			let c0 = ((r.x - origin.x) / cell).ceil().max(0.0) as usize;
			let c1 = (((r.right() - origin.x) / cell).floor().max(0.0) as usize).min(cols - 1);
			let r0 = ((r.y - origin.y) / cell).ceil().max(0.0) as usize;
			let r1 = (((r.bottom() - origin.y) / cell).floor().max(0.0) as usize).min(rows - 1);
			for row in r0..=r1 {
				for col in c0..=c1 {
					blocked[row * cols + col] = true;
				}
			}
		}
		Some(Self {
			cols,
			rows,
			cell,
			origin,
			blocked,
		})
	}

	fn to_world(&self, col: usize, row: usize) -> Point {
		Point::new(
			self.origin.x + col as f64 * self.cell,
			self.origin.y + row as f64 * self.cell,
		)
	}

	fn to_grid(&self, p: Point) -> Option<(usize, usize)> {
		let col = ((p.x - self.origin.x) / self.cell).round();
		let row = ((p.y - self.origin.y) / self.cell).round();
		if col < 0.0 || row < 0.0 {
			return None;
		}
		let (col, row) = (col as usize, row as usize);
		(col < self.cols && row < self.rows).then_some((col, row))
	}

	fn is_free(&self, col: usize, row: usize) -> bool {
		col < self.cols && row < self.rows && !self.blocked[row * self.cols + col]
	}

	/// First free lattice point walking outward from `port` along `side`.
	fn stub_cell(&self, port: Point, side: Side, start: f64) -> Option<(usize, usize)> {
		let (nx, ny) = side.normal();
		(0..MAX_STUB_STEPS).find_map(|step| {
			let dist = start + step as f64 * self.cell;
			let (col, row) = self.to_grid(Point::new(port.x + nx * dist, port.y + ny * dist))?;
			self.is_free(col, row).then_some((col, row))
		})
	}

	/// A* from `from` to `to`. Gives up after expanding `budget` states.
	fn find_path(
		&self,
		from: (usize, usize),
		to: (usize, usize),
		weights: &RoutingWeights,
		used: &[bool],
		budget: usize,
	) -> Option<Vec<(usize, usize)>> {
		if from == to {
			return Some(vec![from]);
		}
		// One layer per incoming direction so bend costs stay exact.
		const START: usize = 4;
		let moves: [(i64, i64); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];
		let mut best: HashMap<(usize, usize), f64> = HashMap::new();
		let mut parent: HashMap<(usize, usize), (usize, usize)> = HashMap::new();
		let heuristic = |col: usize, row: usize| {
			(col.abs_diff(to.0) + row.abs_diff(to.1)) as f64 * weights.step_cost
		};

		let start = from.1 * self.cols + from.0;
		best.insert((start, START), 0.0);
		let mut heap = BinaryHeap::new();
		heap.push(Step {
			cell: start,
			dir: START,
			g: 0.0,
			f: heuristic(from.0, from.1),
		});

		let goal = to.1 * self.cols + to.0;
		let mut expanded = 0_usize;
		let mut reached = None;
		while let Some(step) = heap.pop() {
			if step.cell == goal {
				reached = Some(step.dir);
				break;
			}
			if step.g > best.get(&(step.cell, step.dir)).copied().unwrap_or(f64::INFINITY) {
				continue;
			}
			expanded += 1;
			if expanded > budget {
				debug!("route search stopped after {budget} expansions");
				return None;
			}
			let (col, row) = (step.cell % self.cols, step.cell / self.cols);
			for (dir, (dc, dr)) in moves.iter().enumerate() {
				let (nc, nr) = (col as i64 + dc, row as i64 + dr);
				if nc < 0 || nr < 0 {
					continue;
				}
				let (nc, nr) = (nc as usize, nr as usize);
				if !self.is_free(nc, nr) {
					continue;
				}
				let next = nr * self.cols + nc;
				let mut cost = weights.step_cost;
				if step.dir != START && step.dir != dir {
					cost += weights.bend_penalty;
				}
				if used.get(next).copied().unwrap_or(false) {
					cost += weights.crossing_penalty;
				}
				let g = step.g + cost;
				if g < best.get(&(next, dir)).copied().unwrap_or(f64::INFINITY) {
					best.insert((next, dir), g);
					parent.insert((next, dir), (step.cell, step.dir));
					heap.push(Step {
						cell: next,
						dir,
						g,
						f: g + heuristic(nc, nr),
					});
				}
			}
		}

		let mut state = (goal, reached?);
		let mut cells = vec![(goal % self.cols, goal / self.cols)];
		while let Some(&prev) = parent.get(&state) {
			cells.push((prev.0 % self.cols, prev.0 / self.cols));
			state = prev;
		}
		cells.reverse();
		Some(cells)
	}
}

#[derive(Clone, Copy, Debug)]
struct Step {
	cell: usize,
	dir: usize,
	g: f64,
	f: f64,
}

impl PartialEq for Step {
	fn eq(&self, other: &Self) -> bool {
		self.cmp(other) == Ordering::Equal
	}
}

impl Eq for Step {}

impl PartialOrd for Step {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for Step {
	fn cmp(&self, other: &Self) -> Ordering {
		// Min-heap on f; among equals the deeper state first, then a
		// deterministic tie-break on cell index.
		other
			.f
			.partial_cmp(&self.f)
			.unwrap_or(Ordering::Equal)
			.then_with(|| self.g.partial_cmp(&other.g).unwrap_or(Ordering::Equal))
			.then_with(|| other.cell.cmp(&self.cell))
			.then_with(|| other.dir.cmp(&self.dir))
	}
}

/// Drops repeated and collinear interior points.
fn simplify(points: Vec<Point>) -> Vec<Point> {
	let mut out: Vec<Point> = Vec::with_capacity(points.len());
	for p in points {
		if out.last().is_some_and(|last| last.distance(p) < f64::EPSILON) {
			continue;
		}
		if out.len() >= 2 {
			let (a, b) = (out[out.len() - 2], out[out.len() - 1]);
			let same_x = (a.x - b.x).abs() < f64::EPSILON && (b.x - p.x).abs() < f64::EPSILON;
			let same_y = (a.y - b.y).abs() < f64::EPSILON && (b.y - p.y).abs() < f64::EPSILON;
			if same_x || same_y {
				out.pop();
			}
		}
		out.push(p);
	}
	out
}

/// Orthogonal connector from `port` to the lattice point `cell` that keeps
/// leaving along the port's normal first.
fn dogleg(port: Point, cell: Point, side: Side) -> [Point; 3] {
	let corner = match side {
		Side::Left | Side::Right => Point::new(cell.x, port.y),
		Side::Top | Side::Bottom => Point::new(port.x, cell.y),
	};
	[port, corner, cell]
}

fn self_loop(rect: &Rect, reach: f64) -> Vec<Point> {
	let start = Point::new(rect.right() - rect.width / 4.0, rect.y);
	let end = Point::new(rect.right(), rect.y + rect.height / 4.0);
	vec![
		start,
		Point::new(start.x, rect.y - reach),
		Point::new(rect.right() + reach, rect.y - reach),
		Point::new(rect.right() + reach, end.y),
		end,
	]
}

fn is_axis_aligned(a: Point, b: Point) -> bool {
	(a.x - b.x).abs() < f64::EPSILON || (a.y - b.y).abs() < f64::EPSILON
}

/// Where a port's outward ray meets the ring around the diagram.
fn ring_exit(ring: &Rect, port: Point, side: Side) -> Point {
	match side {
		Side::Left => Point::new(ring.x, port.y),
		Side::Right => Point::new(ring.right(), port.y),
		Side::Top => Point::new(port.x, ring.y),
		Side::Bottom => Point::new(port.x, ring.bottom()),
	}
}

/// Shorter way around `ring` from `a` (on edge `ea`) to `b` (on edge `eb`).
fn around_ring(ring: &Rect, a: Point, ea: usize, b: Point, eb: usize) -> Vec<Point> {
	// Corner reached when leaving edge `i` clockwise.
	let corners = [
		Point::new(ring.right(), ring.y),
		Point::new(ring.right(), ring.bottom()),
		Point::new(ring.x, ring.bottom()),
		Point::new(ring.x, ring.y),
	];
	let clockwise: Vec<Point> = (0..(eb + 4 - ea) % 4).map(|k| corners[(ea + k) % 4]).collect();
	let counter: Vec<Point> = (0..(ea + 4 - eb) % 4).map(|k| corners[(ea + 3 - k) % 4]).collect();
	let length = |via: &[Point]| {
		std::iter::once(a)
			.chain(via.iter().copied())
			.chain(std::iter::once(b))
			.collect::<Vec<_>>()
			.windows(2)
			.map(|s| s[0].distance(s[1]))
			.sum::<f64>()
	};
	let via = if length(&counter) < length(&clockwise) {
		counter
	} else {
		clockwise
	};
	std::iter::once(a).chain(via).chain(std::iter::once(b)).collect()
}

/// Records where each edge crosses an edge routed before it.
fn mark_jumps(routes: &mut [RoutedEdge]) {
	for i in 1..routes.len() {
		let (earlier, rest) = routes.split_at_mut(i);
		let current = &mut rest[0];
		let mut jumps = Vec::new();
		for seg in current.points.windows(2) {
			if !is_axis_aligned(seg[0], seg[1]) {
				continue;
			}
			for other in earlier.iter() {
				for oseg in other.points.windows(2) {
					if !is_axis_aligned(oseg[0], oseg[1]) {
						continue;
					}
					if let Some(p) = orthogonal_crossing(seg[0], seg[1], oseg[0], oseg[1]) {
						jumps.push(p);
					}
				}
			}
		}
		current.jumps = jumps;
	}
}

/// A node side with a clear exit.
#[derive(Clone, Copy, Debug)]
struct Port {
	side: Side,
	at: Point,
}

/// Routing context shared by all edges of one layout.
struct Router<'a> {
	layout: &'a DiagramLayout,
	config: &'a DiagramConfig,
	bodies: Vec<Rect>,
	grid: Option<RouteGrid>,
	used: Vec<bool>,
	/// Free loop around every node, used for detours.
	ring: Rect,
	stub: f64,
}

impl<'a> Router<'a> {
	fn new(layout: &'a DiagramLayout, config: &'a DiagramConfig) -> Self {
		let bodies: Vec<Rect> = layout.nodes.iter().map(|n| n.rect).collect();
		let obstacles: Vec<Rect> = bodies.iter().map(|r| r.inflate(config.node_clearance)).collect();
		let margin = config.node_clearance + 4.0 * config.route_cell;
		let grid = RouteGrid::new(&obstacles, config.route_cell, margin, config.route_max_cells);
		let used = grid.as_ref().map(|g| vec![false; g.cols * g.rows]).unwrap_or_default();
		let ring = obstacles
			.iter()
			.copied()
			.reduce(|a, b| a.union(&b))
			.unwrap_or_default()
			.inflate(2.0 * config.short_length);
		Self {
			layout,
			config,
			bodies,
			grid,
			used,
			ring,
			stub: config.node_clearance + config.short_length.min(config.route_cell),
		}
	}

	fn route(&mut self, link: &WorkflowLink) -> Option<RoutedEdge> {
		let src = self.layout.index_of(&link.from)?;
		let dst = self.layout.index_of(&link.to)?;
		let (src_rect, dst_rect) = (self.bodies[src], self.bodies[dst]);
		let edge = |points, fallback| RoutedEdge {
			from: link.from.clone(),
			to: link.to.clone(),
			points,
			jumps: Vec::new(),
			fallback,
		};
		if src == dst {
			return Some(edge(self_loop(&src_rect, 2.0 * self.config.short_length), false));
		}

		let (out_side, in_side) = facing_sides(&src_rect, &dst_rect);
		let skip = [src, dst];
		if let Some(points) = self.lattice_route(&src_rect, out_side, &dst_rect, in_side, skip) {
			return Some(edge(points, false));
		}
		if let Some(points) = self.detour(&src_rect, out_side, &dst_rect, in_side, skip) {
			debug!("no lattice route for {} -> {}, detouring", link.from, link.to);
			return Some(edge(points, true));
		}
		warn!("{} -> {} is walled in, drawing straight", link.from, link.to);
		Some(edge(vec![out_side.port(&src_rect, 0.5), in_side.port(&dst_rect, 0.5)], true))
	}

	/// First port (side by preference, then offset) whose stub reaches a free
	/// lattice point without touching another node.
	fn stub(&self, grid: &RouteGrid, rect: &Rect, side: Side, toward: Point, skip: [usize; 2]) -> Option<(Port, (usize, usize))> {
		side.preference(rect.center(), toward).into_iter().find_map(|side| {
			PORT_OFFSETS.into_iter().find_map(|t| {
				let at = side.port(rect, t);
				let cell = grid.stub_cell(at, side, self.stub)?;
				let leg = dogleg(at, grid.to_world(cell.0, cell.1), side);
				is_clear(&self.bodies, skip, &leg).then_some((Port { side, at }, cell))
			})
		})
	}

	fn lattice_route(&mut self, src: &Rect, out_side: Side, dst: &Rect, in_side: Side, skip: [usize; 2]) -> Option<Vec<Point>> {
		let grid = self.grid.as_ref()?;
		let (from, a) = self.stub(grid, src, out_side, dst.center(), skip)?;
		let (to, b) = self.stub(grid, dst, in_side, src.center(), skip)?;
		let cells = grid.find_path(a, b, &self.config.routing, &self.used, self.config.route_budget)?;

		let mut points = Vec::with_capacity(cells.len() + 4);
		points.extend(dogleg(from.at, grid.to_world(a.0, a.1), from.side));
		points.extend(cells.iter().map(|&(c, r)| grid.to_world(c, r)));
		let mut tail = dogleg(to.at, grid.to_world(b.0, b.1), to.side);
		tail.reverse();
		points.extend(tail);
		let points = simplify(points);
		if !is_clear(&self.bodies, skip, &points) {
			return None;
		}
		for &(col, row) in &cells {
			self.used[row * grid.cols + col] = true;
		}
		Some(points)
	}

	/// Route out to the ring around the diagram, along it and back in.
	fn detour(&self, src: &Rect, out_side: Side, dst: &Rect, in_side: Side, skip: [usize; 2]) -> Option<Vec<Point>> {
		let exit = |rect: &Rect, side: Side, toward: Point| {
			side.preference(rect.center(), toward).into_iter().find_map(|side| {
				PORT_OFFSETS.into_iter().find_map(|t| {
					let at = side.port(rect, t);
					let out = ring_exit(&self.ring, at, side);
					is_clear(&self.bodies, skip, &[at, out]).then_some((side, at, out))
				})
			})
		};
		let (a_side, a_port, a_out) = exit(src, out_side, dst.center())?;
		let (b_side, b_port, b_out) = exit(dst, in_side, src.center())?;
		let mut points = vec![a_port];
		points.extend(around_ring(&self.ring, a_out, a_side.ring_edge(), b_out, b_side.ring_edge()));
		points.push(b_port);
		Some(simplify(points))
	}
}

/// Routes every link whose endpoints are placed in `layout`. Links with a
/// missing endpoint are skipped.
pub fn route_edges(layout: &DiagramLayout, links: &[WorkflowLink], config: &DiagramConfig) -> Vec<RoutedEdge> {
	let mut router = Router::new(layout, config);
	let mut routes: Vec<RoutedEdge> = links.iter().filter_map(|link| router.route(link)).collect();
	mark_jumps(&mut routes);
	routes
}

/// Reroutes only the edges touching `key`, keeping the rest of `previous`
/// as they were. `previous` must come from [`route_edges`] over the same
/// links and nodes.
pub fn reroute_touching(
	layout: &DiagramLayout,
	links: &[WorkflowLink],
	config: &DiagramConfig,
	previous: Vec<RoutedEdge>,
	key: &NodeKey,
) -> Vec<RoutedEdge> {
	let mut router = Router::new(layout, config);
	let mut kept = previous.into_iter();
	let mut routes = Vec::with_capacity(links.len());
	for link in links {
		if layout.index_of(&link.from).is_none() || layout.index_of(&link.to).is_none() {
			continue;
		}
		let prev = kept.next();
		match prev {
			Some(prev) if &link.from != key && &link.to != key => routes.push(RoutedEdge {
				jumps: Vec::new(),
				..prev
			}),
			_ => routes.extend(router.route(link)),
		}
	}
	mark_jumps(&mut routes);
	routes
}
