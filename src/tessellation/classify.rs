//! Face classification by flood fill over the triangulation's dual graph
//!
//! Each face gets two independent flags:
//! - `inside_exterior`: false for every face reachable from the enclosing
//!   super-triangle without crossing an exterior-ring constraint.
//! - `inside_hole`: true for every face reachable from a seed just inside an
//!   interior ring without crossing that ring's constraints.
//!
//! Neither pass depends on the order in which rings or points were inserted.

use super::cdt::Triangulation;
use super::predicates::signed_area;
use std::collections::VecDeque;

/// One ring expressed as triangulation vertex ids, in ring order
#[derive(Debug, Clone, PartialEq)]
pub struct RingLoop {
    pub ring: usize,
    pub vertices: Vec<usize>,
}

/// Inside/outside flags for one face
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaceClass {
    pub inside_exterior: bool,
    pub inside_hole: bool,
}

impl FaceClass {
    /// Face belongs to the solid surface (exterior minus holes)
    pub fn is_solid(&self) -> bool {
        self.inside_exterior && !self.inside_hole
    }
}

/// Classify every face of `cdt`.
///
/// `exterior_ring` is the ring id the exterior constraints were tagged with;
/// `holes` lists the interior rings. The result is indexed like
/// [`Triangulation::triangles`].
pub fn classify_faces(cdt: &Triangulation, exterior_ring: usize, holes: &[RingLoop]) -> Vec<FaceClass> {
    let face_count = cdt.triangles().len();

    // Pass 1: everything reachable from the outside is outside the exterior
    let mut outside = vec![false; face_count];
    let outer_faces: Vec<usize> = (0..face_count).filter(|&t| cdt.is_outer(t)).collect();
    flood(cdt, &outer_faces, exterior_ring, &mut outside);

    // Pass 2: each hole floods from a face on its inner side
    let mut in_hole = vec![false; face_count];
    for hole in holes {
        match hole_seed(cdt, hole) {
            Some(seed) => flood(cdt, &[seed], hole.ring, &mut in_hole),
            None => tracing::debug!(ring = hole.ring, "Interior ring has no usable seed face, ignoring"),
        }
    }

    outside
        .iter()
        .zip(in_hole.iter())
        .map(|(&outside, &in_hole)| FaceClass {
            inside_exterior: !outside,
            inside_hole: in_hole,
        })
        .collect()
}

/// Breadth-first flood over face adjacency that never crosses an edge
/// constrained by `ring`
fn flood(cdt: &Triangulation, seeds: &[usize], ring: usize, reached: &mut [bool]) {
    let triangles = cdt.triangles();
    let mut queue: VecDeque<usize> = VecDeque::new();

    for &seed in seeds {
        if !reached[seed] {
            reached[seed] = true;
            queue.push_back(seed);
        }
    }

    while let Some(t) = queue.pop_front() {
        let tri = &triangles[t];
        for i in 0..3 {
            let Some(next) = tri.n[i] else { continue };
            if reached[next] {
                continue;
            }
            let (a, b) = tri.edge(i);
            if cdt.edge_rings(a, b).contains(&ring) {
                continue;
            }
            reached[next] = true;
            queue.push_back(next);
        }
    }
}

/// A face adjacent to one of the ring's constrained edges, on the ring's inner side
fn hole_seed(cdt: &Triangulation, hole: &RingLoop) -> Option<usize> {
    let mut vertices = hole.vertices.clone();
    vertices.dedup();
    while vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }
    if vertices.len() < 3 {
        return None;
    }

    let coords: Vec<_> = vertices.iter().map(|&v| cdt.vertex(v)).collect();
    let area = signed_area(&coords);
    if area == 0.0 || !area.is_finite() {
        return None;
    }

    let n = vertices.len();
    (0..n).find_map(|i| {
        let (a, b) = (vertices[i], vertices[(i + 1) % n]);
        if !cdt.edge_rings(a, b).contains(&hole.ring) {
            return None;
        }
        // Interior lies left of a counterclockwise ring's edges
        let (from, to) = if area > 0.0 { (a, b) } else { (b, a) };
        cdt.find_edge(from, to).map(|(t, _)| t)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tessellation::predicates::Point2;

    fn face_area(cdt: &Triangulation, t: usize) -> f64 {
        let tri = cdt.triangles()[t];
        let [a, b, c] = tri.v.map(|v| cdt.vertex(v));
        ((b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])) * 0.5
    }

    fn build(rings: &[Vec<Point2>]) -> (Triangulation, Vec<RingLoop>) {
        let all: Vec<Point2> = rings.iter().flatten().copied().collect();
        let mut cdt = Triangulation::new(&all);
        let loops: Vec<RingLoop> = rings
            .iter()
            .enumerate()
            .map(|(ring, points)| RingLoop {
                ring,
                vertices: points.iter().map(|&p| cdt.insert(p).unwrap()).collect(),
            })
            .collect();
        for ring_loop in &loops {
            let n = ring_loop.vertices.len();
            for i in 0..n {
                cdt.insert_constraint(ring_loop.vertices[i], ring_loop.vertices[(i + 1) % n], ring_loop.ring);
            }
        }
        (cdt, loops)
    }

    fn solid_area(cdt: &Triangulation, classes: &[FaceClass]) -> f64 {
        classes
            .iter()
            .enumerate()
            .filter(|(_, class)| class.is_solid())
            .map(|(t, _)| face_area(cdt, t))
            .sum()
    }

    #[test]
    fn test_square_without_holes() {
        let square = vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        let (cdt, _) = build(&[square]);
        let classes = classify_faces(&cdt, 0, &[]);

        assert_eq!(classes.iter().filter(|c| c.is_solid()).count(), 2);
        assert!((solid_area(&cdt, &classes) - 1.0).abs() < 1e-12);
        for (t, class) in classes.iter().enumerate() {
            if cdt.is_outer(t) {
                assert!(!class.inside_exterior);
            }
        }
    }

    #[test]
    fn test_square_with_clockwise_hole() {
        let square = vec![[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]];
        let hole = vec![[1.0, 1.0], [1.0, 3.0], [3.0, 3.0], [3.0, 1.0]];
        let (cdt, loops) = build(&[square, hole]);
        let classes = classify_faces(&cdt, 0, &loops[1..]);

        assert!((solid_area(&cdt, &classes) - 12.0).abs() < 1e-9);
        let hole_area: f64 = classes
            .iter()
            .enumerate()
            .filter(|(_, c)| c.inside_exterior && c.inside_hole)
            .map(|(t, _)| face_area(&cdt, t))
            .sum();
        assert!((hole_area - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_ring_order_does_not_matter() {
        let square = vec![[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]];
        let hole = vec![[1.0, 1.0], [3.0, 1.0], [3.0, 3.0], [1.0, 3.0]];

        // Insert the hole first but keep ring ids stable
        let all: Vec<Point2> = hole.iter().chain(square.iter()).copied().collect();
        let mut cdt = Triangulation::new(&all);
        let hole_ids: Vec<usize> = hole.iter().map(|&p| cdt.insert(p).unwrap()).collect();
        let square_ids: Vec<usize> = square.iter().map(|&p| cdt.insert(p).unwrap()).collect();
        for (ring, ids) in [(1, &hole_ids), (0, &square_ids)] {
            for i in 0..4 {
                cdt.insert_constraint(ids[i], ids[(i + 1) % 4], ring);
            }
        }

        let holes = [RingLoop { ring: 1, vertices: hole_ids }];
        let classes = classify_faces(&cdt, 0, &holes);
        assert!((solid_area(&cdt, &classes) - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_concave_exterior() {
        // L-shape: area 3
        let l_shape = vec![
            [0.0, 0.0], [2.0, 0.0], [2.0, 1.0], [1.0, 1.0], [1.0, 2.0], [0.0, 2.0],
        ];
        let (cdt, _) = build(&[l_shape]);
        let classes = classify_faces(&cdt, 0, &[]);
        assert!((solid_area(&cdt, &classes) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_collinear_ring_has_no_solid_faces() {
        let line = vec![[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]];
        let (cdt, _) = build(&[line]);
        let classes = classify_faces(&cdt, 0, &[]);
        assert!(classes.iter().all(|c| !c.is_solid()));
    }
}
