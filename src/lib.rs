//! City model ingestion and tessellation
//!
//! Reads CityGML and CityJSON documents into one object model and turns each
//! object's boundary polygons into triangle buffers (per surface type) and a
//! wireframe edge buffer.
//!
//! # Example
//! ```ignore
//! let mut dataset = Dataset::new();
//! dataset.load("tests/data/two_buildings.gml")?;
//! dataset.regenerate_geometries();
//! for object in dataset.objects() {
//!     println!("{} {}: {} triangles", object.object_type.name(), object.id, object.triangle_count());
//! }
//! ```

pub mod config;
pub mod dataset;
pub mod error;
pub mod geometry;
pub mod parse_xml;
pub mod parsing;
pub mod tessellation;

pub use config::DatasetConfig;
pub use dataset::{regenerate_edges_for, regenerate_triangles_for, Dataset};
pub use error::{Diagnostic, IntegrityError, RingError};
pub use geometry::{Bounds, CityObject, ObjectType, Point, Polygon, Ring, SurfaceType};
pub use parse_xml::{parse_xml_file, parse_xml_str, XmlNode};
pub use parsing::{parse_citygml, parse_cityjson_str, ParseOutput};
pub use tessellation::{append_polygon_edges, triangulate_polygon, PlaneFit};
