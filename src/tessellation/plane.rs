//! Least-squares plane fitting and projection to plane coordinates
//!
//! The best-fit plane passes through the centroid; its normal is the
//! eigenvector of the point covariance with the smallest eigenvalue, which
//! minimises the summed squared orthogonal distance. The two remaining
//! eigenvectors span the plane and become the 2D axes.

use crate::geometry::Point;
use super::predicates::Point2;
use nalgebra::{Matrix3, Vector3};
use std::collections::HashSet;

/// Best-fit plane with an orthonormal in-plane basis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneFit {
    pub origin: Vector3<f64>,
    pub normal: Vector3<f64>,
    pub u_axis: Vector3<f64>,
    pub v_axis: Vector3<f64>,
}

#[inline]
fn to_vector(p: &Point) -> Vector3<f64> {
    Vector3::new(p.x as f64, p.y as f64, p.z as f64)
}

impl PlaneFit {
    /// Fit a plane through `points`.
    ///
    /// Returns `None` when fewer than 3 distinct points are given, in which
    /// case the plane is undefined and the polygon must be skipped. Collinear
    /// input still yields a plane (containing the line).
    pub fn fit(points: &[Point]) -> Option<Self> {
        let distinct: HashSet<[u32; 3]> = points.iter().map(Point::bits).collect();
        if distinct.len() < 3 {
            return None;
        }

        let count = points.len() as f64;
        let origin = points.iter().map(to_vector).sum::<Vector3<f64>>() / count;

        let mut covariance = Matrix3::<f64>::zeros();
        for p in points {
            let d = to_vector(p) - origin;
            covariance += d * d.transpose();
        }

        let eigen = covariance.symmetric_eigen();
        if eigen.eigenvalues.iter().any(|value| !value.is_finite()) {
            return None;
        }

        let normal_index = eigen.eigenvalues.imin();
        // Major axis among the two remaining eigenvectors
        let u_index = (0..3)
            .filter(|&i| i != normal_index)
            .max_by(|&a, &b| eigen.eigenvalues[a].total_cmp(&eigen.eigenvalues[b]))?;

        let normal = eigen.eigenvectors.column(normal_index).into_owned().normalize();
        let u_axis = eigen.eigenvectors.column(u_index).into_owned().normalize();
        let v_axis = normal.cross(&u_axis).normalize();

        Some(Self { origin, normal, u_axis, v_axis })
    }

    /// Express `p` in plane coordinates (offset from the origin along each axis)
    #[inline]
    pub fn project(&self, p: &Point) -> Point2 {
        let offset = to_vector(p) - self.origin;
        [offset.dot(&self.u_axis), offset.dot(&self.v_axis)]
    }

    /// Project every point, preserving order so index `i` maps back to `points[i]`
    pub fn project_to_2d(&self, points: &[Point]) -> Vec<Point2> {
        points.iter().map(|p| self.project(p)).collect()
    }

    /// Orthogonal distance of `p` from the plane
    pub fn distance(&self, p: &Point) -> f64 {
        (to_vector(p) - self.origin).dot(&self.normal).abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_fit_horizontal_square() {
        let points = [
            Point::new(0.0, 0.0, 5.0),
            Point::new(1.0, 0.0, 5.0),
            Point::new(1.0, 1.0, 5.0),
            Point::new(0.0, 1.0, 5.0),
        ];
        let plane = PlaneFit::fit(&points).unwrap();

        assert_abs_diff_eq!(plane.normal.z.abs(), 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(plane.origin.z, 5.0, epsilon = 1e-9);
        assert_abs_diff_eq!(plane.u_axis.dot(&plane.v_axis), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(plane.u_axis.norm(), 1.0, epsilon = 1e-9);

        // Projection preserves distances within the plane
        let projected = plane.project_to_2d(&points);
        let d = ((projected[0][0] - projected[2][0]).powi(2)
            + (projected[0][1] - projected[2][1]).powi(2))
        .sqrt();
        assert_abs_diff_eq!(d, 2.0_f64.sqrt(), epsilon = 1e-6);
    }

    #[test]
    fn test_fit_vertical_wall() {
        let points = [
            Point::new(0.0, 0.0, 0.0),
            Point::new(4.0, 4.0, 0.0),
            Point::new(4.0, 4.0, 3.0),
            Point::new(0.0, 0.0, 3.0),
        ];
        let plane = PlaneFit::fit(&points).unwrap();
        let expected = 0.5_f64.sqrt();
        assert_abs_diff_eq!(plane.normal.x.abs(), expected, epsilon = 1e-6);
        assert_abs_diff_eq!(plane.normal.z, 0.0, epsilon = 1e-6);
        for p in &points {
            assert_abs_diff_eq!(plane.distance(p), 0.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_fit_minimises_distance_for_non_planar_ring() {
        let points = [
            Point::new(0.0, 0.0, 0.1),
            Point::new(1.0, 0.0, -0.1),
            Point::new(1.0, 1.0, 0.1),
            Point::new(0.0, 1.0, -0.1),
        ];
        let plane = PlaneFit::fit(&points).unwrap();
        assert_abs_diff_eq!(plane.normal.z.abs(), 1.0, epsilon = 1e-6);
        for p in &points {
            assert_abs_diff_eq!(plane.distance(p), 0.1, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_too_few_distinct_points() {
        let points = [
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.0, 0.0, 0.0),
            Point::new(1.0, 0.0, 0.0),
        ];
        assert!(PlaneFit::fit(&points).is_none());
    }

    #[test]
    fn test_collinear_points_still_fit() {
        let points = [
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.0, 1.0, 1.0),
            Point::new(2.0, 2.0, 2.0),
        ];
        let plane = PlaneFit::fit(&points).unwrap();
        let projected = plane.project_to_2d(&points);
        // All projections fall on one line through the origin
        let cross = projected[0][0] * projected[2][1] - projected[0][1] * projected[2][0];
        assert_abs_diff_eq!(cross, 0.0, epsilon = 1e-9);
    }
}
