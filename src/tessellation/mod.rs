//! Tessellation module for city-model surfaces
//!
//! This module turns possibly non-planar polygons with holes into triangle
//! buffers and ring outlines into wireframe edge buffers.
//!
//! # Submodules
//! - `predicates` - Exact orientation and in-circle tests
//! - `plane` - Least-squares plane fit and projection to plane coordinates
//! - `cdt` - Constrained Delaunay triangulation with ring-tagged constraints
//! - `classify` - Flood-fill face classification (inside exterior / inside hole)
//! - `polygon` - Polygon triangulation pipeline (fit, project, triangulate, classify)
//! - `edges` - Ring segment extraction for wireframes

mod predicates;
mod plane;
mod cdt;
mod classify;
mod polygon;
mod edges;

pub use predicates::{
    Point2,
    orient2d,
    in_circle,
    signed_area,
};

pub use plane::PlaneFit;

pub use cdt::{
    Triangle,
    Triangulation,
};

pub use classify::{
    FaceClass,
    RingLoop,
    classify_faces,
};

pub use polygon::{
    triangulate_polygon,
    tessellate_polygon_into,
};

pub use edges::{
    append_ring_edges,
    append_polygon_edges,
};
