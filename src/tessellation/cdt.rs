//! Constrained Delaunay triangulation in the fitting plane
//!
//! Incremental Lawson insertion inside an enclosing super-triangle, followed by
//! constraint recovery with edge flips (Sloan's method) and a Delaunay
//! restoration pass over the edges those flips created. All topological tests
//! go through the exact predicates in [`super::predicates`].
//!
//! Triangles are stored counterclockwise. For a triangle `t`, edge `i` is the
//! edge opposite vertex `t.v[i]`, running from `t.v[(i + 1) % 3]` to
//! `t.v[(i + 2) % 3]`, and `t.n[i]` is the triangle across that edge.
//!
//! Constrained edges remember which rings they came from, so a segment shared
//! by two rings blocks the flood fill of both.

use super::predicates::{in_circle, orient2d, segments_cross, strictly_between, Point2};
use std::collections::{HashMap, VecDeque};

/// Number of enclosing vertices at the start of the vertex array
const SUPER_VERTICES: usize = 3;

/// How far the super-triangle extends beyond the input extent
const SUPER_SCALE: f64 = 100.0;

/// A counterclockwise triangle with its three neighbors
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub v: [usize; 3],
    pub n: [Option<usize>; 3],
}

impl Triangle {
    /// Index (0..3) of vertex `vertex` in this triangle
    fn index_of(&self, vertex: usize) -> Option<usize> {
        self.v.iter().position(|&v| v == vertex)
    }

    /// Endpoints of edge `i`
    pub fn edge(&self, i: usize) -> (usize, usize) {
        (self.v[(i + 1) % 3], self.v[(i + 2) % 3])
    }
}

/// Where a point landed during location
#[derive(Debug, Clone, Copy, PartialEq)]
enum Location {
    Inside(usize),
    OnEdge(usize, usize),
    OnVertex(usize),
}

/// Undirected edge key
type EdgeKey = (usize, usize);

#[inline]
fn edge_key(a: usize, b: usize) -> EdgeKey {
    if a < b { (a, b) } else { (b, a) }
}

/// 2D constrained triangulation with ring-tagged constraints
#[derive(Debug, Clone)]
pub struct Triangulation {
    vertices: Vec<Point2>,
    triangles: Vec<Triangle>,
    constraints: HashMap<EdgeKey, Vec<usize>>,
    lookup: HashMap<[u64; 2], usize>,
    last: usize,
}

impl Triangulation {
    /// Create an empty triangulation whose super-triangle encloses `points`
    pub fn new(points: &[Point2]) -> Self {
        let mut min = [f64::MAX; 2];
        let mut max = [f64::MIN; 2];
        for p in points.iter().filter(|p| p[0].is_finite() && p[1].is_finite()) {
            for axis in 0..2 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
        }
        if min[0] > max[0] {
            min = [0.0; 2];
            max = [0.0; 2];
        }

        let center = [(min[0] + max[0]) * 0.5, (min[1] + max[1]) * 0.5];
        let mut extent = (max[0] - min[0]).max(max[1] - min[1]);
        if extent <= 0.0 || !extent.is_finite() {
            extent = 1.0;
        }
        let reach = extent * SUPER_SCALE;

        let vertices = vec![
            [center[0] - reach, center[1] - reach],
            [center[0] + reach, center[1] - reach],
            [center[0], center[1] + reach],
        ];
        let triangles = vec![Triangle { v: [0, 1, 2], n: [None, None, None] }];

        Self {
            vertices,
            triangles,
            constraints: HashMap::new(),
            lookup: HashMap::new(),
            last: 0,
        }
    }

    pub fn vertex(&self, v: usize) -> Point2 {
        self.vertices[v]
    }

    /// Number of input (non-enclosing) vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() - SUPER_VERTICES
    }

    /// True for the three enclosing vertices
    pub fn is_super_vertex(&self, v: usize) -> bool {
        v < SUPER_VERTICES
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// True if the triangle touches the enclosing super-triangle
    pub fn is_outer(&self, t: usize) -> bool {
        self.triangles[t].v.iter().any(|&v| self.is_super_vertex(v))
    }

    /// Rings that constrain the edge `a`-`b` (empty if unconstrained)
    pub fn edge_rings(&self, a: usize, b: usize) -> &[usize] {
        self.constraints
            .get(&edge_key(a, b))
            .map(|rings| rings.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_constrained(&self, a: usize, b: usize) -> bool {
        self.constraints.contains_key(&edge_key(a, b))
    }

    #[inline]
    fn orient(&self, a: usize, b: usize, c: usize) -> f64 {
        orient2d(self.vertices[a], self.vertices[b], self.vertices[c])
    }

    /// Insert a point, returning its vertex id.
    ///
    /// Exact duplicates return the existing vertex. Returns `None` for
    /// non-finite coordinates or points outside the super-triangle.
    pub fn insert(&mut self, p: Point2) -> Option<usize> {
        if !p[0].is_finite() || !p[1].is_finite() {
            return None;
        }
        let key = [(p[0] + 0.0).to_bits(), (p[1] + 0.0).to_bits()];
        if let Some(&existing) = self.lookup.get(&key) {
            return Some(existing);
        }

        let v = self.vertices.len();
        match self.locate(p)? {
            Location::OnVertex(existing) => {
                self.lookup.insert(key, existing);
                return Some(existing);
            }
            Location::Inside(t) => {
                self.vertices.push(p);
                self.split_triangle(t, v);
            }
            Location::OnEdge(t, i) => {
                self.vertices.push(p);
                self.split_edge(t, i, v);
            }
        }
        self.lookup.insert(key, v);
        Some(v)
    }

    /// Find the triangle containing `p` by walking from the last insertion,
    /// falling back to a scan if the walk does not settle
    fn locate(&self, p: Point2) -> Option<Location> {
        let mut t = self.last.min(self.triangles.len() - 1);
        let mut steps = 0;

        'walk: while steps <= self.triangles.len() {
            steps += 1;
            let tri = self.triangles[t];
            for i in 0..3 {
                let (a, b) = tri.edge(i);
                if orient2d(self.vertices[a], self.vertices[b], p) < 0.0 {
                    match tri.n[i] {
                        Some(next) => {
                            t = next;
                            continue 'walk;
                        }
                        None => return None,
                    }
                }
            }
            return Some(self.classify_location(t, p));
        }

        self.triangles
            .iter()
            .position(|tri| {
                (0..3).all(|i| {
                    let (a, b) = tri.edge(i);
                    orient2d(self.vertices[a], self.vertices[b], p) >= 0.0
                })
            })
            .map(|t| self.classify_location(t, p))
    }

    fn classify_location(&self, t: usize, p: Point2) -> Location {
        let tri = self.triangles[t];
        let on_edges: Vec<usize> = (0..3)
            .filter(|&i| {
                let (a, b) = tri.edge(i);
                orient2d(self.vertices[a], self.vertices[b], p) == 0.0
            })
            .collect();

        match on_edges.as_slice() {
            [] => Location::Inside(t),
            [i] => Location::OnEdge(t, *i),
            // On two edges means on their shared vertex
            [i, j, ..] => Location::OnVertex(tri.v[3 - i - j]),
        }
    }

    /// Point the neighbor slot of `t` that referenced `old` at `new`
    fn relink(&mut self, t: Option<usize>, old: usize, new: usize) {
        if let Some(t) = t {
            if let Some(slot) = self.triangles[t].n.iter_mut().find(|n| **n == Some(old)) {
                *slot = Some(new);
            }
        }
    }

    /// Edge index of `t` that runs from `a` to `b`
    fn directed_edge_index(&self, t: usize, a: usize, b: usize) -> Option<usize> {
        (0..3).find(|&i| self.triangles[t].edge(i) == (a, b))
    }

    fn split_triangle(&mut self, t: usize, v: usize) {
        let Triangle { v: [a, b, c], n: [n0, n1, n2] } = self.triangles[t];
        let t1 = self.triangles.len();
        let t2 = t1 + 1;

        self.triangles[t] = Triangle { v: [a, b, v], n: [Some(t1), Some(t2), n2] };
        self.triangles.push(Triangle { v: [b, c, v], n: [Some(t2), Some(t), n0] });
        self.triangles.push(Triangle { v: [c, a, v], n: [Some(t), Some(t1), n1] });

        self.relink(n0, t, t1);
        self.relink(n1, t, t2);
        self.last = t;

        self.legalize(v, &[t, t1, t2]);
    }

    fn split_edge(&mut self, t: usize, i: usize, v: usize) {
        let tri = self.triangles[t];
        let a = tri.v[i];
        let (b, c) = tri.edge(i);
        let Some(u) = tri.n[i] else {
            // Cannot happen strictly inside the super-triangle
            return self.split_triangle(t, v);
        };
        let Some(j) = self.directed_edge_index(u, c, b) else {
            return self.split_triangle(t, v);
        };
        let opposite = self.triangles[u];
        let d = opposite.v[j];

        // Neighbors across the four outer edges of the quad
        let across_ab = tri.n[(i + 2) % 3];
        let across_ca = tri.n[(i + 1) % 3];
        let across_bd = opposite.n[(j + 1) % 3];
        let across_dc = opposite.n[(j + 2) % 3];

        let t2 = self.triangles.len();
        let u2 = t2 + 1;

        self.triangles[t] = Triangle { v: [a, b, v], n: [Some(u2), Some(t2), across_ab] };
        self.triangles.push(Triangle { v: [a, v, c], n: [Some(u), across_ca, Some(t)] });
        self.triangles[u] = Triangle { v: [d, c, v], n: [Some(t2), Some(u2), across_dc] };
        self.triangles.push(Triangle { v: [d, v, b], n: [Some(t), across_bd, Some(u)] });

        self.relink(across_ca, t, t2);
        self.relink(across_bd, u, u2);

        // A constrained edge keeps its rings on both halves
        if let Some(rings) = self.constraints.remove(&edge_key(b, c)) {
            self.constraints.insert(edge_key(b, v), rings.clone());
            self.constraints.insert(edge_key(v, c), rings);
        }
        self.last = t;

        self.legalize(v, &[t, t2, u, u2]);
    }

    /// Flip edge `i` of `t`. With `t = (a, b, c)` (a opposite the edge) and the
    /// neighbor `(d, c, b)`, the result is `t = (a, b, d)` and neighbor `(a, d, c)`.
    fn flip(&mut self, t: usize, i: usize) -> Option<usize> {
        let tri = self.triangles[t];
        let a = tri.v[i];
        let (b, c) = tri.edge(i);
        let u = tri.n[i]?;
        let j = self.directed_edge_index(u, c, b)?;
        let opposite = self.triangles[u];
        let d = opposite.v[j];

        let across_ab = tri.n[(i + 2) % 3];
        let across_ca = tri.n[(i + 1) % 3];
        let across_bd = opposite.n[(j + 1) % 3];
        let across_dc = opposite.n[(j + 2) % 3];

        self.triangles[t] = Triangle { v: [a, b, d], n: [across_bd, Some(u), across_ab] };
        self.triangles[u] = Triangle { v: [a, d, c], n: [across_dc, across_ca, Some(t)] };

        self.relink(across_bd, u, t);
        self.relink(across_ca, t, u);
        Some(u)
    }

    /// Restore the Delaunay property around a freshly inserted vertex
    fn legalize(&mut self, v: usize, seeds: &[usize]) {
        let mut stack: Vec<usize> = seeds.to_vec();

        while let Some(t) = stack.pop() {
            let tri = self.triangles[t];
            let Some(i) = tri.index_of(v) else { continue };
            let Some(u) = tri.n[i] else { continue };
            let (b, c) = tri.edge(i);
            if self.is_constrained(b, c) {
                continue;
            }
            let Some(j) = self.directed_edge_index(u, c, b) else { continue };
            let d = self.triangles[u].v[j];

            if in_circle(self.vertices[v], self.vertices[b], self.vertices[c], self.vertices[d]) > 0.0
                && self.flip(t, i).is_some()
            {
                stack.push(t);
                stack.push(u);
            }
        }
    }

    /// Find the triangle and edge index holding the directed edge `a` → `b`
    pub fn find_edge(&self, a: usize, b: usize) -> Option<(usize, usize)> {
        self.triangles
            .iter()
            .enumerate()
            .find_map(|(t, tri)| (0..3).find(|&i| tri.edge(i) == (a, b)).map(|i| (t, i)))
    }

    fn has_edge(&self, a: usize, b: usize) -> bool {
        self.find_edge(a, b).is_some() || self.find_edge(b, a).is_some()
    }

    /// Nearest vertex lying strictly inside the segment `a`-`b`
    fn vertex_on_segment(&self, a: usize, b: usize) -> Option<usize> {
        let (pa, pb) = (self.vertices[a], self.vertices[b]);
        (SUPER_VERTICES..self.vertices.len())
            .filter(|&v| v != a && v != b && strictly_between(pa, pb, self.vertices[v]))
            .min_by(|&x, &y| {
                let dx = squared_distance(pa, self.vertices[x]);
                let dy = squared_distance(pa, self.vertices[y]);
                dx.total_cmp(&dy)
            })
    }

    /// Undirected edges that properly cross the segment `a`-`b`
    fn crossing_edges(&self, a: usize, b: usize) -> Vec<EdgeKey> {
        let (pa, pb) = (self.vertices[a], self.vertices[b]);
        let mut crossing = Vec::new();
        for tri in &self.triangles {
            for i in 0..3 {
                let (p, q) = tri.edge(i);
                // Each interior edge is seen from both sides; keep one
                if p > q && tri.n[i].is_some() {
                    continue;
                }
                if segments_cross(pa, pb, self.vertices[p], self.vertices[q]) {
                    crossing.push((p, q));
                }
            }
        }
        crossing
    }

    /// Force the segment `a`-`b` into the triangulation and tag it with `ring`.
    ///
    /// Vertices lying on the segment split it into sub-constraints. Returns
    /// `false` if some part could not be inserted because it crosses an
    /// existing constraint; the remaining parts are still inserted.
    pub fn insert_constraint(&mut self, a: usize, b: usize, ring: usize) -> bool {
        if a == b {
            return true;
        }
        if let Some(mid) = self.vertex_on_segment(a, b) {
            let first = self.insert_constraint(a, mid, ring);
            let second = self.insert_constraint(mid, b, ring);
            return first && second;
        }

        if !self.has_edge(a, b) {
            let Some(created) = self.force_edge(a, b) else {
                return false;
            };
            self.tag_constraint(a, b, ring);
            self.restore_delaunay(created);
            return true;
        }

        self.tag_constraint(a, b, ring);
        true
    }

    fn tag_constraint(&mut self, a: usize, b: usize, ring: usize) {
        let rings = self.constraints.entry(edge_key(a, b)).or_default();
        if !rings.contains(&ring) {
            rings.push(ring);
        }
    }

    /// Flip away every edge crossing `a`-`b`. Returns the edges created by the
    /// flips that no longer cross, for Delaunay restoration.
    fn force_edge(&mut self, a: usize, b: usize) -> Option<Vec<EdgeKey>> {
        let mut crossing: VecDeque<EdgeKey> = self.crossing_edges(a, b).into();
        if crossing.iter().any(|&(p, q)| self.is_constrained(p, q)) {
            return None;
        }

        let (pa, pb) = (self.vertices[a], self.vertices[b]);
        let limit = (crossing.len() + 1).pow(2) * 8;
        let mut created = Vec::new();
        let mut iterations = 0;

        while let Some((p, q)) = crossing.pop_front() {
            iterations += 1;
            if iterations > limit {
                return None;
            }
            let (t, i) = self.find_edge(p, q).or_else(|| self.find_edge(q, p))?;
            let tri = self.triangles[t];
            let apex = tri.v[i];
            let (left, right) = tri.edge(i);
            let u = tri.n[i]?;
            let j = self.directed_edge_index(u, right, left)?;
            let far = self.triangles[u].v[j];

            // The flip is valid only if the quad is strictly convex
            let convex = self.orient(apex, left, far) > 0.0 && self.orient(apex, far, right) > 0.0;
            if !convex {
                crossing.push_back((p, q));
                continue;
            }

            self.flip(t, i)?;
            if segments_cross(pa, pb, self.vertices[apex], self.vertices[far]) {
                crossing.push_back((apex, far));
            } else {
                created.push((apex, far));
            }
        }

        Some(created)
    }

    /// Lawson flips over the edges created by constraint recovery
    fn restore_delaunay(&mut self, mut edges: Vec<EdgeKey>) {
        let limit = (edges.len() + 1).pow(2) * 8;
        let mut rounds = 0;

        loop {
            let mut swapped = false;
            for edge in edges.iter_mut() {
                let (p, q) = *edge;
                if self.is_constrained(p, q) {
                    continue;
                }
                let Some((t, i)) = self.find_edge(p, q) else { continue };
                let tri = self.triangles[t];
                let Some(u) = tri.n[i] else { continue };
                let Some(j) = self.directed_edge_index(u, q, p) else { continue };
                let apex = tri.v[i];
                let far = self.triangles[u].v[j];

                if in_circle(self.vertices[apex], self.vertices[p], self.vertices[q], self.vertices[far]) > 0.0
                    && self.flip(t, i).is_some()
                {
                    *edge = (apex, far);
                    swapped = true;
                }
            }

            rounds += 1;
            if !swapped || rounds > limit {
                break;
            }
        }
    }
}

#[inline]
fn squared_distance(a: Point2, b: Point2) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    dx * dx + dy * dy
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_consistency(cdt: &Triangulation) {
        for (t, tri) in cdt.triangles().iter().enumerate() {
            assert!(cdt.orient(tri.v[0], tri.v[1], tri.v[2]) > 0.0, "triangle {} not ccw", t);
            for i in 0..3 {
                if let Some(u) = tri.n[i] {
                    let (a, b) = tri.edge(i);
                    assert!(
                        cdt.directed_edge_index(u, b, a).is_some(),
                        "neighbor {} of {} does not share edge {}-{}",
                        u, t, a, b
                    );
                }
            }
        }
    }

    #[test]
    fn test_insert_square() {
        let points = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        let mut cdt = Triangulation::new(&points);
        let ids: Vec<usize> = points.iter().map(|&p| cdt.insert(p).unwrap()).collect();

        assert_eq!(cdt.vertex_count(), 4);
        // Euler: 3 super vertices + 4 points, all interior to the outer face
        assert_eq!(cdt.triangles().len(), 2 * 4 + 1);
        check_consistency(&cdt);

        // Duplicates map to the existing vertex
        assert_eq!(cdt.insert([1.0, 1.0]), Some(ids[2]));
        assert_eq!(cdt.insert([-0.0, 0.0]), Some(ids[0]));
    }

    #[test]
    fn test_insert_on_edge_and_collinear() {
        let points = [[0.0, 0.0], [2.0, 0.0], [1.0, 0.0], [1.0, 1.0], [3.0, 0.0]];
        let mut cdt = Triangulation::new(&points);
        for &p in &points {
            assert!(cdt.insert(p).is_some());
        }
        assert_eq!(cdt.vertex_count(), 5);
        check_consistency(&cdt);
    }

    #[test]
    fn test_constraint_is_recovered() {
        // A thin diamond whose long diagonal is not Delaunay
        let points = [[0.0, 0.0], [10.0, 0.0], [5.0, 1.0], [5.0, -1.0]];
        let mut cdt = Triangulation::new(&points);
        let ids: Vec<usize> = points.iter().map(|&p| cdt.insert(p).unwrap()).collect();
        assert!(cdt.has_edge(ids[2], ids[3]));
        assert!(!cdt.has_edge(ids[0], ids[1]));

        assert!(cdt.insert_constraint(ids[0], ids[1], 0));
        assert!(cdt.has_edge(ids[0], ids[1]));
        assert!(cdt.is_constrained(ids[0], ids[1]));
        assert_eq!(cdt.edge_rings(ids[1], ids[0]), &[0]);
        check_consistency(&cdt);
    }

    #[test]
    fn test_constraint_through_vertex_is_split() {
        let points = [[0.0, 0.0], [1.0, 0.0], [2.0, 0.0], [1.0, 1.0]];
        let mut cdt = Triangulation::new(&points);
        let ids: Vec<usize> = points.iter().map(|&p| cdt.insert(p).unwrap()).collect();

        assert!(cdt.insert_constraint(ids[0], ids[2], 3));
        assert!(cdt.is_constrained(ids[0], ids[1]));
        assert!(cdt.is_constrained(ids[1], ids[2]));
        assert!(!cdt.is_constrained(ids[0], ids[2]));
    }

    #[test]
    fn test_crossing_constraint_is_rejected() {
        let points = [[0.0, 0.0], [2.0, 2.0], [0.0, 2.0], [2.0, 0.0]];
        let mut cdt = Triangulation::new(&points);
        let ids: Vec<usize> = points.iter().map(|&p| cdt.insert(p).unwrap()).collect();

        assert!(cdt.insert_constraint(ids[0], ids[1], 0));
        assert!(!cdt.insert_constraint(ids[2], ids[3], 1));
        assert!(cdt.is_constrained(ids[0], ids[1]));
        check_consistency(&cdt);
    }

    #[test]
    fn test_non_finite_point_is_rejected() {
        let mut cdt = Triangulation::new(&[[0.0, 0.0], [1.0, 1.0]]);
        assert_eq!(cdt.insert([f64::NAN, 0.0]), None);
        assert_eq!(cdt.insert([0.0, f64::INFINITY]), None);
    }
}
