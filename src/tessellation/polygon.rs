//! Polygon-with-holes triangulation
//!
//! Pools every ring's points, fits a plane, triangulates the projection with
//! the rings as constraints and emits the solid faces using the original 3D
//! coordinates of their corners.

use crate::geometry::{Point, Polygon};
use super::cdt::Triangulation;
use super::classify::{classify_faces, RingLoop};
use super::plane::PlaneFit;

/// Ring id given to the exterior ring; interior ring `k` gets `k + 1`
const EXTERIOR_RING: usize = 0;

/// Triangulate a polygon, returning one `[Point; 3]` per kept face.
///
/// Polygons whose exterior has fewer than 3 points, or whose points do not
/// define a plane, produce no triangles. Interior rings with fewer than 3
/// points are ignored.
pub fn triangulate_polygon(polygon: &Polygon) -> Vec<[Point; 3]> {
    if polygon.exterior.len() < 3 {
        return Vec::new();
    }

    // Pool exterior + usable interior rings; `ring_ranges` indexes into `pool`
    let mut pool: Vec<Point> = Vec::with_capacity(polygon.point_count());
    let mut ring_ranges: Vec<(usize, std::ops::Range<usize>)> = Vec::new();

    pool.extend_from_slice(&polygon.exterior.points);
    ring_ranges.push((EXTERIOR_RING, 0..pool.len()));

    for (k, interior) in polygon.interiors.iter().enumerate() {
        if interior.len() < 3 {
            continue;
        }
        let start = pool.len();
        pool.extend_from_slice(&interior.points);
        ring_ranges.push((k + 1, start..pool.len()));
    }

    let Some(plane) = PlaneFit::fit(&pool) else {
        tracing::debug!(points = pool.len(), "Polygon does not define a plane, skipping");
        return Vec::new();
    };
    let projected = plane.project_to_2d(&pool);

    let mut cdt = Triangulation::new(&projected);

    // Vertex id for each pool point, and the first pool point behind each vertex
    let mut vertex_ids = Vec::with_capacity(pool.len());
    let mut origin_of_vertex: Vec<Option<usize>> = Vec::new();
    for (index, &p) in projected.iter().enumerate() {
        let Some(v) = cdt.insert(p) else {
            tracing::debug!("Projected point could not be inserted, skipping polygon");
            return Vec::new();
        };
        if origin_of_vertex.len() <= v {
            origin_of_vertex.resize(v + 1, None);
        }
        origin_of_vertex[v].get_or_insert(index);
        vertex_ids.push(v);
    }

    let loops: Vec<RingLoop> = ring_ranges
        .iter()
        .map(|(ring, range)| RingLoop {
            ring: *ring,
            vertices: vertex_ids[range.clone()].to_vec(),
        })
        .collect();

    for ring_loop in &loops {
        let n = ring_loop.vertices.len();
        for i in 0..n {
            let (a, b) = (ring_loop.vertices[i], ring_loop.vertices[(i + 1) % n]);
            if !cdt.insert_constraint(a, b, ring_loop.ring) {
                tracing::debug!(ring = ring_loop.ring, "Ring segment crosses another ring, not enforced");
            }
        }
    }

    let classes = classify_faces(&cdt, EXTERIOR_RING, &loops[1..]);

    cdt.triangles()
        .iter()
        .zip(classes.iter())
        .filter(|(_, class)| class.is_solid())
        .filter_map(|(tri, _)| {
            let corner = |v: usize| {
                origin_of_vertex
                    .get(v)
                    .copied()
                    .flatten()
                    .map(|index| pool[index])
            };
            Some([corner(tri.v[0])?, corner(tri.v[1])?, corner(tri.v[2])?])
        })
        .collect()
}

/// Triangulate a polygon and append 9 floats per kept triangle to `buffer`
pub fn tessellate_polygon_into(polygon: &Polygon, buffer: &mut Vec<f32>) -> usize {
    let triangles = triangulate_polygon(polygon);
    buffer.reserve(triangles.len() * 9);
    for triangle in &triangles {
        for p in triangle {
            buffer.extend_from_slice(&[p.x, p.y, p.z]);
        }
    }
    triangles.len()
}
