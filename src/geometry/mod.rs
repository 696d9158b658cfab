//! Geometry module for city models
//!
//! This module provides the value types every other component shares:
//! points, rings, polygons with holes, city objects and the dataset bounding box.
//!
//! # Submodules
//! - `types` - Core primitives (Point, Ring, Polygon) and the CityObject model
//! - `bounds` - Axis-aligned bounding box maintained during ingestion

mod types;
mod bounds;

pub use types::{
    Point,
    Ring,
    Polygon,
    SurfaceType,
    ObjectType,
    CityObject,
};

pub use bounds::Bounds;
