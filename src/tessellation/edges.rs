//! Wireframe edge extraction
//!
//! Every ring segment, closing segment included, becomes 6 floats (two
//! endpoints) using the unprojected coordinates.

use crate::geometry::{Polygon, Ring};

/// Append the segments of one ring; returns the number of segments written
pub fn append_ring_edges(ring: &Ring, edges: &mut Vec<f32>) -> usize {
    if ring.len() < 2 {
        return 0;
    }
    edges.reserve(ring.len() * 6);
    for (a, b) in ring.segments() {
        edges.extend_from_slice(&[a.x, a.y, a.z, b.x, b.y, b.z]);
    }
    ring.len()
}

/// Append the segments of every ring of a polygon, exterior first
pub fn append_polygon_edges(polygon: &Polygon, edges: &mut Vec<f32>) -> usize {
    polygon.rings().map(|ring| append_ring_edges(ring, edges)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    #[test]
    fn test_closing_segment_is_emitted() {
        let ring = Ring::from_points(vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.0, 0.0, 0.0),
            Point::new(1.0, 1.0, 0.0),
        ]);
        let polygon = Polygon::new(ring, Vec::new());
        let mut edges = Vec::new();

        assert_eq!(append_polygon_edges(&polygon, &mut edges), 3);
        assert_eq!(edges.len(), 18);
        assert_eq!(&edges[12..18], &[1.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_empty_ring_has_no_edges() {
        let mut edges = Vec::new();
        assert_eq!(append_ring_edges(&Ring::default(), &mut edges), 0);
        assert!(edges.is_empty());
    }
}
