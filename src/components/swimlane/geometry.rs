#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	pub fn distance(self, other: Point) -> f64 {
		let (dx, dy) = (other.x - self.x, other.y - self.y);
		(dx * dx + dy * dy).sqrt()
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
}

impl Rect {
	pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
		Self {
			x,
			y,
			width,
			height,
		}
	}

	pub fn right(&self) -> f64 {
		self.x + self.width
	}

	pub fn bottom(&self) -> f64 {
		self.y + self.height
	}

	pub fn center(&self) -> Point {
		Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
	}

	pub fn contains(&self, p: Point) -> bool {
		p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
	}

	pub fn inflate(&self, margin: f64) -> Rect {
		Rect::new(
			self.x - margin,
			self.y - margin,
			self.width + 2.0 * margin,
			self.height + 2.0 * margin,
		)
	}

	pub fn union(&self, other: &Rect) -> Rect {
		let (x, y) = (self.x.min(other.x), self.y.min(other.y));
		Rect::new(
			x,
			y,
			self.right().max(other.right()) - x,
			self.bottom().max(other.bottom()) - y,
		)
	}

	/// Whether the segment `a`–`b` passes through the interior of the
	/// rectangle. Touching the border does not count.
	pub fn intersects_segment(&self, a: Point, b: Point) -> bool {
		// Liang–Barsky clip against the open rectangle.
		let (dx, dy) = (b.x - a.x, b.y - a.y);
		let mut t0 = 0.0_f64;
		let mut t1 = 1.0_f64;
		let checks = [
			(-dx, a.x - self.x),
			(dx, self.right() - a.x),
			(-dy, a.y - self.y),
			(dy, self.bottom() - a.y),
		];
		for (p, q) in checks {
			if p.abs() < f64::EPSILON {
				if q <= 0.0 {
					return false;
				}
				continue;
			}
			let t = q / p;
			if p < 0.0 {
				t0 = t0.max(t);
			} else {
				t1 = t1.min(t);
			}
			if t0 >= t1 {
				return false;
			}
		}
		true
	}
}

/// Crossing point of two axis-aligned segments, excluding shared endpoints
/// and collinear overlaps.
pub fn orthogonal_crossing(a1: Point, a2: Point, b1: Point, b2: Point) -> Option<Point> {
	let a_horizontal = (a1.y - a2.y).abs() < f64::EPSILON;
	let b_horizontal = (b1.y - b2.y).abs() < f64::EPSILON;
	if a_horizontal == b_horizontal {
		return None;
	}
	let (h1, h2, v1, v2) = if a_horizontal {
		(a1, a2, b1, b2)
	} else {
		(b1, b2, a1, a2)
	};
	let (hx0, hx1) = (h1.x.min(h2.x), h1.x.max(h2.x));
	let (vy0, vy1) = (v1.y.min(v2.y), v1.y.max(v2.y));
	let (x, y) = (v1.x, h1.y);
	if x > hx0 && x < hx1 && y > vy0 && y < vy1 {
		Some(Point::new(x, y))
	} else {
		None
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn segment_through_rect_intersects() {
		let r = Rect::new(10.0, 10.0, 20.0, 20.0);
		assert!(r.intersects_segment(Point::new(0.0, 20.0), Point::new(40.0, 20.0)));
		assert!(r.intersects_segment(Point::new(15.0, 15.0), Point::new(16.0, 16.0)));
	}

	#[test]
	fn segment_outside_or_on_border_does_not_intersect() {
		let r = Rect::new(10.0, 10.0, 20.0, 20.0);
		assert!(!r.intersects_segment(Point::new(0.0, 0.0), Point::new(40.0, 0.0)));
		assert!(!r.intersects_segment(Point::new(0.0, 10.0), Point::new(40.0, 10.0)));
		assert!(!r.intersects_segment(Point::new(0.0, 0.0), Point::new(5.0, 40.0)));
	}

	#[test]
	fn crossing_of_perpendicular_segments() {
		let p = orthogonal_crossing(
			Point::new(0.0, 5.0),
			Point::new(10.0, 5.0),
			Point::new(4.0, 0.0),
			Point::new(4.0, 10.0),
		);
		assert_eq!(p, Some(Point::new(4.0, 5.0)));

		// Shared endpoint is a junction, not a crossing.
		let touch = orthogonal_crossing(
			Point::new(0.0, 5.0),
			Point::new(10.0, 5.0),
			Point::new(10.0, 0.0),
			Point::new(10.0, 10.0),
		);
		assert_eq!(touch, None);
	}
}
