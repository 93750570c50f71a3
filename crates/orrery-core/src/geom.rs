//! Planar geometry substrate
//!
//! Everything the entity model evaluates bottoms out here: points,
//! length-parameterized polylines (open chains and closed rings), segment
//! intersection, and the half-open movement-crossing test used for
//! collision windows. All of it is pure and allocation-light; boundaries
//! are rebuilt from `t` on every evaluation.

use std::f64::consts::TAU;

/// Tolerance for coincidence tests (on-boundary, terminal-endpoint).
pub const EPS: f64 = 1e-9;

/// Clamp a perimeter fraction into [0, 1].
#[inline]
pub fn clamp_unit(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}

/// Wrap a perimeter fraction into [0, 1) with Euclidean remainder.
#[inline]
pub fn wrap_unit(v: f64) -> f64 {
    v.rem_euclid(1.0)
}

/// A point in the plane
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const ORIGIN: Point2 = Point2 { x: 0.0, y: 0.0 };

    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Point2 { x, y }
    }

    /// Euclidean distance to another point
    #[inline]
    pub fn distance(self, other: Point2) -> f64 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }

    /// Affine interpolation: `f = 0` is `self`, `f = 1` is `other`
    #[inline]
    pub fn lerp(self, other: Point2, f: f64) -> Point2 {
        Point2 {
            x: self.x + (other.x - self.x) * f,
            y: self.y + (other.y - self.y) * f,
        }
    }

    /// Coincidence within `eps`
    #[inline]
    pub fn approx_eq(self, other: Point2, eps: f64) -> bool {
        (self.x - other.x).abs() <= eps && (self.y - other.y).abs() <= eps
    }
}

#[inline]
fn cross(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    ax * by - ay * bx
}

/// Intersection of the segments `(a1, a2)` and `(b1, b2)`.
///
/// Returns the parameters `(s, u)` along each segment's direction and the
/// intersection point of the carrier lines, without range-filtering — the
/// caller decides which interval semantics apply. Parallel and collinear
/// pairs return `None`; a collinear overlap is a shared substring, not a
/// crossing.
pub fn segment_intersection(
    a1: Point2,
    a2: Point2,
    b1: Point2,
    b2: Point2,
) -> Option<(f64, f64, Point2)> {
    let dax = a2.x - a1.x;
    let day = a2.y - a1.y;
    let dbx = b2.x - b1.x;
    let dby = b2.y - b1.y;

    let denom = cross(dax, day, dbx, dby);
    if denom.abs() < EPS {
        return None;
    }

    let wx = b1.x - a1.x;
    let wy = b1.y - a1.y;
    let s = cross(wx, wy, dbx, dby) / denom;
    let u = cross(wx, wy, dax, day) / denom;

    let p = Point2::new(a1.x + s * dax, a1.y + s * day);
    Some((s, u, p))
}

/// Distance from `p` to the segment `(a, b)`
pub fn point_segment_distance(p: Point2, a: Point2, b: Point2) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len2 = dx * dx + dy * dy;
    if len2 <= 0.0 {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len2).clamp(0.0, 1.0);
    p.distance(Point2::new(a.x + t * dx, a.y + t * dy))
}

/// A length-parameterized chain of points, open or closed
#[derive(Clone, Debug)]
pub struct Polyline {
    points: Vec<Point2>,
    /// Cumulative chain length at each vertex; `cum[0] == 0`
    cum: Vec<f64>,
    closed: bool,
}

impl Polyline {
    fn build(points: Vec<Point2>, closed: bool) -> Self {
        debug_assert!(!points.is_empty(), "polyline needs at least one vertex");
        let mut cum = Vec::with_capacity(points.len());
        let mut total = 0.0;
        cum.push(0.0);
        for w in points.windows(2) {
            total += w[0].distance(w[1]);
            cum.push(total);
        }
        Polyline { points, cum, closed }
    }

    /// An open chain
    pub fn open(points: Vec<Point2>) -> Self {
        Self::build(points, false)
    }

    /// A closed ring; the first vertex is appended as the final one if the
    /// chain does not already close on itself
    pub fn ring(mut points: Vec<Point2>) -> Self {
        let first = points.first().copied();
        let last = points.last().copied();
        if let (Some(first), Some(last)) = (first, last) {
            if !first.approx_eq(last, EPS) {
                points.push(first);
            }
        }
        Self::build(points, true)
    }

    /// A circle approximated by `segments` equal chords, starting at the
    /// east point and winding clockwise in screen coordinates (fraction
    /// 0.25 of a unit circle at the origin is `(0, -1)`)
    pub fn circle(centre: Point2, radius: f64, segments: usize) -> Self {
        let n = segments.max(3);
        let points = (0..=n)
            .map(|k| {
                let a = TAU * k as f64 / n as f64;
                Point2::new(centre.x + radius * a.cos(), centre.y - radius * a.sin())
            })
            .collect();
        Self::build(points, true)
    }

    /// First vertex of the chain
    #[inline]
    pub fn start(&self) -> Point2 {
        self.points[0]
    }

    /// Total chain length
    #[inline]
    pub fn length(&self) -> f64 {
        *self.cum.last().unwrap_or(&0.0)
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    #[inline]
    pub fn points(&self) -> &[Point2] {
        &self.points
    }

    /// Point at normalized length fraction `f` (clamped to [0, 1]) along the
    /// chain. A degenerate zero-length chain interpolates to its start.
    pub fn interpolate(&self, f: f64) -> Point2 {
        let total = self.length();
        if total <= 0.0 {
            return self.start();
        }
        let target = clamp_unit(f) * total;
        for i in 1..self.points.len() {
            if self.cum[i] >= target {
                let seg_len = self.cum[i] - self.cum[i - 1];
                if seg_len <= 0.0 {
                    continue;
                }
                let local = (target - self.cum[i - 1]) / seg_len;
                return self.points[i - 1].lerp(self.points[i], local);
            }
        }
        self.points[self.points.len() - 1]
    }

    /// Iterate the chain's segments in order
    pub fn segments(&self) -> impl Iterator<Item = (Point2, Point2)> + '_ {
        self.points.windows(2).map(|w| (w[0], w[1]))
    }

    /// Whether `p` lies on the chain within `eps`
    pub fn contains_point(&self, p: Point2, eps: f64) -> bool {
        self.segments()
            .any(|(a, b)| point_segment_distance(p, a, b) <= eps)
    }

    /// Whether `p` coincides with a terminal endpoint of an open chain.
    /// Rings have no terminals; every ring point is interior.
    fn is_terminal(&self, p: Point2) -> bool {
        if self.closed {
            return false;
        }
        let first = self.points[0];
        let last = self.points[self.points.len() - 1];
        p.approx_eq(first, EPS) || p.approx_eq(last, EPS)
    }

    /// First proper crossing with `other`, scanning this chain's segments in
    /// order. A crossing must fall on both chains and be interior to both:
    /// touching only at an open chain's terminal endpoint does not count,
    /// and collinear overlaps never do.
    pub fn first_crossing(&self, other: &Polyline) -> Option<Point2> {
        for (a1, a2) in self.segments() {
            for (b1, b2) in other.segments() {
                if let Some((s, u, p)) = segment_intersection(a1, a2, b1, b2) {
                    if !(-EPS..=1.0 + EPS).contains(&s) || !(-EPS..=1.0 + EPS).contains(&u) {
                        continue;
                    }
                    if self.is_terminal(p) || other.is_terminal(p) {
                        continue;
                    }
                    return Some(p);
                }
            }
        }
        None
    }

    /// Whether the movement segment from `from` to `to` crosses this chain,
    /// half-open in the movement parameter: a crossing reached exactly at
    /// `to` is NOT reported, while `from` lying exactly on the chain is.
    /// Under a monotonic trajectory this yields exactly one positive window
    /// per crossing.
    pub fn crossed_by_movement(&self, from: Point2, to: Point2) -> bool {
        if self.contains_point(from, EPS) {
            return true;
        }
        for (b1, b2) in self.segments() {
            if let Some((s, u, _)) = segment_intersection(from, to, b1, b2) {
                if s >= 0.0 && s < 1.0 && (-EPS..=1.0 + EPS).contains(&u) {
                    return true;
                }
            }
        }
        false
    }
}
