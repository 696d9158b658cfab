//! Ingestion of city-model documents
//!
//! Both formats produce the same shape: a list of [`CityObject`]s with
//! polygons filed by surface type, plus the contained failures met on the way.
//!
//! # Submodules
//! - `points` - Coordinate list tokenising
//! - `citygml` - CityGML tree walk (object discovery, surface typing, rings, attributes)
//! - `cityjson` - CityJSON boundary resolution against the shared vertex pool

mod points;
mod citygml;
mod cityjson;

use crate::error::Diagnostic;
use crate::geometry::{Bounds, CityObject, Point};

pub use points::parse_coordinates;
pub use citygml::{parse_citygml, parse_citygml_object, parse_polygon, parse_ring};
pub use cityjson::{parse_cityjson_str, parse_cityjson_reader};

/// Objects from one document together with the diagnostics it produced
#[derive(Debug, Default)]
pub struct ParseOutput {
    pub objects: Vec<CityObject>,
    pub diagnostics: Vec<Diagnostic>,
    /// Every point read from the document, including rings later emptied
    pub bounds: Bounds,
}

impl ParseOutput {
    pub(crate) fn extend_bounds(&mut self, points: &[Point]) {
        for point in points {
            self.bounds.extend(point);
        }
    }
}
