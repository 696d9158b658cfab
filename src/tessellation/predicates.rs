//! Exact geometric predicates over floating-point coordinates
//!
//! Topological decisions (orientation, in-circle) go through Shewchuk's
//! adaptive-precision predicates, so their sign is exact even though the
//! coordinates themselves are rounded.

use robust::Coord;

/// 2D coordinate in the fitting plane
pub type Point2 = [f64; 2];

#[inline]
fn coord(p: Point2) -> Coord<f64> {
    Coord { x: p[0], y: p[1] }
}

/// Positive if `a`, `b`, `c` turn counterclockwise, negative if clockwise, zero if collinear
#[inline]
pub fn orient2d(a: Point2, b: Point2, c: Point2) -> f64 {
    robust::orient2d(coord(a), coord(b), coord(c))
}

/// Positive if `d` lies strictly inside the circle through the counterclockwise triangle `a`, `b`, `c`
#[inline]
pub fn in_circle(a: Point2, b: Point2, c: Point2, d: Point2) -> f64 {
    robust::incircle(coord(a), coord(b), coord(c), coord(d))
}

/// True if the open segments `a`-`b` and `c`-`d` cross at a single interior point
pub fn segments_cross(a: Point2, b: Point2, c: Point2, d: Point2) -> bool {
    let o1 = orient2d(a, b, c);
    let o2 = orient2d(a, b, d);
    let o3 = orient2d(c, d, a);
    let o4 = orient2d(c, d, b);
    o1 * o2 < 0.0 && o3 * o4 < 0.0
}

/// True if `p` lies strictly between `a` and `b` on the segment joining them
pub fn strictly_between(a: Point2, b: Point2, p: Point2) -> bool {
    if orient2d(a, b, p) != 0.0 {
        return false;
    }
    // Collinear, so one axis comparison decides
    let axis = if a[0] != b[0] { 0 } else { 1 };
    let (lo, hi) = if a[axis] < b[axis] { (a[axis], b[axis]) } else { (b[axis], a[axis]) };
    lo < p[axis] && p[axis] < hi
}

/// Signed area of a closed loop (positive when counterclockwise)
pub fn signed_area(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for i in 0..n {
        let p = points[i];
        let q = points[(i + 1) % n];
        twice_area += p[0] * q[1] - q[0] * p[1];
    }
    twice_area * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orientation_sign() {
        assert!(orient2d([0.0, 0.0], [1.0, 0.0], [0.0, 1.0]) > 0.0);
        assert!(orient2d([0.0, 0.0], [0.0, 1.0], [1.0, 0.0]) < 0.0);
        assert_eq!(orient2d([0.0, 0.0], [1.0, 1.0], [2.0, 2.0]), 0.0);
    }

    #[test]
    fn test_orientation_is_exact_for_nearly_collinear_points() {
        // Naive evaluation of this determinant rounds to the wrong sign or zero
        let a = [0.5, 0.5];
        let b = [12.0, 12.0];
        let c = [24.0, 24.0 + f64::EPSILON * 32.0];
        assert!(orient2d(a, b, c) > 0.0);
    }

    #[test]
    fn test_in_circle() {
        let (a, b, c) = ([0.0, 0.0], [1.0, 0.0], [0.0, 1.0]);
        assert!(in_circle(a, b, c, [0.5, 0.5]) > 0.0);
        assert!(in_circle(a, b, c, [2.0, 2.0]) < 0.0);
        assert_eq!(in_circle(a, b, c, [1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_segments_cross() {
        assert!(segments_cross([0.0, 0.0], [2.0, 2.0], [0.0, 2.0], [2.0, 0.0]));
        // Touching at an endpoint is not a proper crossing
        assert!(!segments_cross([0.0, 0.0], [2.0, 2.0], [2.0, 2.0], [3.0, 0.0]));
        assert!(!segments_cross([0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]));
    }

    #[test]
    fn test_strictly_between() {
        assert!(strictly_between([0.0, 0.0], [2.0, 0.0], [1.0, 0.0]));
        assert!(!strictly_between([0.0, 0.0], [2.0, 0.0], [2.0, 0.0]));
        assert!(!strictly_between([0.0, 0.0], [2.0, 0.0], [3.0, 0.0]));
        assert!(strictly_between([0.0, 0.0], [0.0, 2.0], [0.0, 0.5]));
    }

    #[test]
    fn test_signed_area() {
        let square = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        assert_eq!(signed_area(&square), 1.0);
        let mut reversed = square;
        reversed.reverse();
        assert_eq!(signed_area(&reversed), -1.0);
    }
}
