//! Planar primitives used by the hand model: orientation tests, infinite-line
//! intersection and rotation about an origin.

use crate::error::{Error, Result};
use crate::types::Point;

/// True when `p`, `q`, `r` are in counter-clockwise order (image y grows down,
/// so this is clockwise on screen).
#[inline]
fn ccw(p: Point, q: Point, r: Point) -> bool {
    (r.y - p.y) * (q.x - p.x) > (q.y - p.y) * (r.x - p.x)
}

/// Whether segment `ab` crosses segment `cd`.
///
/// Collinear and touching configurations report `false`; callers use this only
/// to pick which palm edge a finger ray should be intersected with.
pub fn segments_properly_intersect(a: Point, b: Point, c: Point, d: Point) -> bool {
    ccw(a, c, d) != ccw(b, c, d) && ccw(a, b, c) != ccw(a, b, d)
}

#[inline]
fn det(a: (f64, f64), b: (f64, f64)) -> f64 {
    a.0 * b.1 - a.1 * b.0
}

/// Intersection of the infinite lines through `first` and `second`.
///
/// Returns [`Error::DegenerateGeometry`] when the lines are parallel or either
/// line is given by two identical points.
pub fn intersect_lines(first: [Point; 2], second: [Point; 2]) -> Result<Point> {
    let xdiff = (first[0].x - first[1].x, second[0].x - second[1].x);
    let ydiff = (first[0].y - first[1].y, second[0].y - second[1].y);

    let div = det(xdiff, ydiff);
    if div == 0.0 || !div.is_finite() {
        return Err(Error::DegenerateGeometry { first, second });
    }

    let d = (
        det((first[0].x, first[0].y), (first[1].x, first[1].y)),
        det((second[0].x, second[0].y), (second[1].x, second[1].y)),
    );

    Ok(Point::new(det(d, xdiff) / div, det(d, ydiff) / div))
}

/// Rotate `point` about `origin` by `theta` radians.
pub fn rotate_point(point: Point, origin: Point, theta: f64) -> Point {
    let (sin, cos) = theta.sin_cos();
    let dx = point.x - origin.x;
    let dy = point.y - origin.y;
    Point::new(cos * dx - sin * dy + origin.x, sin * dx + cos * dy + origin.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn crossing_segments() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 10.0);
        let c = Point::new(0.0, 10.0);
        let d = Point::new(10.0, 0.0);
        assert!(segments_properly_intersect(a, b, c, d));
    }

    #[test]
    fn disjoint_segments() {
        // The infinite lines meet at x = 12, outside the first segment.
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        let c = Point::new(12.0, -5.0);
        let d = Point::new(12.0, 5.0);
        assert!(!segments_properly_intersect(a, b, c, d));
    }

    #[test]
    fn vertical_ray_hits_horizontal_edge() {
        let edge = [Point::new(83.0, 78.0), Point::new(173.0, 78.0)];
        let ray = [Point::new(128.0, 178.0), Point::new(128.0, -10.0)];
        let p = intersect_lines(edge, ray).unwrap();
        assert_eq!(p, Point::new(128.0, 78.0));
    }

    #[test]
    fn oblique_intersection() {
        let l1 = [Point::new(0.0, 0.0), Point::new(4.0, 4.0)];
        let l2 = [Point::new(0.0, 4.0), Point::new(4.0, 0.0)];
        let p = intersect_lines(l1, l2).unwrap();
        assert!((p.x - 2.0).abs() < 1e-12);
        assert!((p.y - 2.0).abs() < 1e-12);
    }

    #[test]
    fn parallel_lines_are_degenerate() {
        let l1 = [Point::new(0.0, 0.0), Point::new(10.0, 0.0)];
        let l2 = [Point::new(0.0, 5.0), Point::new(10.0, 5.0)];
        assert!(matches!(
            intersect_lines(l1, l2),
            Err(Error::DegenerateGeometry { .. })
        ));
    }

    #[test]
    fn coincident_points_are_degenerate() {
        let l1 = [Point::new(3.0, 3.0), Point::new(3.0, 3.0)];
        let l2 = [Point::new(0.0, 5.0), Point::new(10.0, 5.0)];
        assert!(intersect_lines(l1, l2).is_err());
    }

    #[test]
    fn quarter_turn() {
        let p = rotate_point(Point::new(2.0, 1.0), Point::new(1.0, 1.0), FRAC_PI_2);
        assert!((p.x - 1.0).abs() < 1e-12);
        assert!((p.y - 2.0).abs() < 1e-12);
    }

    #[test]
    fn rotation_preserves_distance() {
        let origin = Point::new(-4.0, 7.5);
        let p = Point::new(3.0, -2.0);
        let r = rotate_point(p, origin, 1.234);
        assert!((p.distance(&origin) - r.distance(&origin)).abs() < 1e-9);
    }
}
