//! Dataset state and the regeneration driver
//!
//! A [`Dataset`] owns the objects of the last successful parse, the running
//! bounding box and the diagnostics collected while parsing. Every parse
//! clears the dataset first and only commits once the whole document has been
//! read, so a failed parse leaves it empty.
//!
//! Consumers read through borrowed views ([`Dataset::objects`],
//! [`CityObject::triangle_buffers`], ...); any mutating call ends those
//! borrows.

use crate::config::DatasetConfig;
use crate::error::Diagnostic;
use crate::geometry::{Bounds, CityObject};
use crate::parse_xml::{parse_xml_file, parse_xml_str};
use crate::parsing::{self, ParseOutput};
use crate::tessellation::{append_polygon_edges, tessellate_polygon_into};
use anyhow::Context;
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Instant;

/// Objects, bounds and diagnostics of one ingested document
#[derive(Debug, Default)]
pub struct Dataset {
    objects: Vec<CityObject>,
    bounds: Bounds,
    diagnostics: Vec<Diagnostic>,
    config: DatasetConfig,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DatasetConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Load a file, choosing the format from its extension
    /// (`.gml`/`.xml` for CityGML, `.json` for CityJSON).
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "gml" | "xml" => self.parse_citygml(path),
            "json" => self.parse_cityjson(path),
            _ => {
                self.clear();
                anyhow::bail!("Unsupported file extension for {}", path.display())
            }
        }
    }

    /// Parse a CityGML file, replacing the current contents
    pub fn parse_citygml<P: AsRef<Path>>(&mut self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        self.clear();

        let start = Instant::now();
        let root = parse_xml_file(path)
            .with_context(|| format!("Failed to parse CityGML file {}", path.display()))?;
        self.commit(parsing::parse_citygml(&root), path.display(), start);
        Ok(())
    }

    /// Parse an in-memory CityGML document, replacing the current contents
    pub fn parse_citygml_str(&mut self, content: &str) -> anyhow::Result<()> {
        self.clear();

        let start = Instant::now();
        let root = parse_xml_str(content).context("Failed to parse CityGML document")?;
        self.commit(parsing::parse_citygml(&root), "<memory>", start);
        Ok(())
    }

    /// Parse a CityJSON file, replacing the current contents
    pub fn parse_cityjson<P: AsRef<Path>>(&mut self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        self.clear();

        let start = Instant::now();
        let file = File::open(path)
            .with_context(|| format!("Failed to open file {}", path.display()))?;
        let output = parsing::parse_cityjson_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse CityJSON file {}", path.display()))?;
        self.commit(output, path.display(), start);
        Ok(())
    }

    /// Parse an in-memory CityJSON document, replacing the current contents
    pub fn parse_cityjson_str(&mut self, content: &str) -> anyhow::Result<()> {
        self.clear();

        let start = Instant::now();
        let output = parsing::parse_cityjson_str(content).context("Failed to parse CityJSON document")?;
        self.commit(output, "<memory>", start);
        Ok(())
    }

    fn commit(&mut self, output: ParseOutput, source: impl std::fmt::Display, start: Instant) {
        let ParseOutput { objects, diagnostics, bounds } = output;

        self.bounds = bounds;
        self.objects = objects;
        self.diagnostics = diagnostics;

        tracing::info!(
            source = %source,
            objects = self.objects.len(),
            polygons = self.polygon_count(),
            diagnostics = self.diagnostics.len(),
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Parsed city model"
        );
    }

    /// Drop every object and diagnostic and reset the bounding box
    pub fn clear(&mut self) {
        self.objects.clear();
        self.diagnostics.clear();
        self.bounds = Bounds::empty();
    }

    /// Rebuild every object's triangle and edge buffers from its polygons
    pub fn regenerate_geometries(&mut self) {
        let start = Instant::now();

        if self.config.parallel_regeneration {
            self.objects.par_iter_mut().for_each(regenerate_object);
        } else {
            self.objects.iter_mut().for_each(regenerate_object);
        }

        tracing::info!(
            objects = self.objects.len(),
            triangles = self.objects.iter().map(CityObject::triangle_count).sum::<usize>(),
            edges = self.objects.iter().map(CityObject::edge_count).sum::<usize>(),
            parallel = self.config.parallel_regeneration,
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Regenerated geometries"
        );
    }

    /// Remove every attribute whose key is not in the preservation set
    pub fn filter_attributes(&mut self) {
        let keep = &self.config.attributes_to_preserve;
        let mut removed = 0;
        for object in &mut self.objects {
            let before = object.attributes.len();
            object.attributes.retain(|key, _| keep.contains(key));
            removed += before - object.attributes.len();
        }
        tracing::debug!(removed, kept_keys = keep.len(), "Filtered attributes");
    }

    pub fn attributes_to_preserve(&self) -> &BTreeSet<String> {
        &self.config.attributes_to_preserve
    }

    pub fn set_attributes_to_preserve(&mut self, keys: BTreeSet<String>) {
        self.config.attributes_to_preserve = keys;
    }

    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    pub fn objects(&self) -> impl Iterator<Item = &CityObject> + '_ {
        self.objects.iter()
    }

    pub fn object_by_id(&self, id: &str) -> Option<&CityObject> {
        self.objects.iter().find(|object| object.id == id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn polygon_count(&self) -> usize {
        self.objects.iter().map(CityObject::polygon_count).sum()
    }

    /// Bounding box over every ingested point; `None` before any point is seen
    pub fn bounds(&self) -> Option<&Bounds> {
        if self.bounds.is_empty() {
            None
        } else {
            Some(&self.bounds)
        }
    }

    /// Contained failures from the last parse
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

fn regenerate_object(object: &mut CityObject) {
    regenerate_triangles_for(object);
    regenerate_edges_for(object);
}

/// Clear and rebuild the triangle buffer of every surface type the object has
/// polygons for; a surface type whose polygons are all degenerate keeps an
/// empty buffer.
pub fn regenerate_triangles_for(object: &mut CityObject) {
    object.triangles_by_type.clear();

    for (surface_type, polygons) in &object.polygons_by_type {
        let buffer = object.triangles_by_type.entry(*surface_type).or_default();
        for polygon in polygons {
            tessellate_polygon_into(polygon, buffer);
        }
    }
}

/// Clear and rebuild the object's edge buffer from every ring of every polygon
pub fn regenerate_edges_for(object: &mut CityObject) {
    object.edges.clear();

    for polygon in object.polygons_by_type.values().flatten() {
        append_polygon_edges(polygon, &mut object.edges);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{ObjectType, Point, Polygon, Ring, SurfaceType};

    fn square(z: f32) -> Polygon {
        Polygon::new(
            Ring::from_points(vec![
                Point::new(0.0, 0.0, z),
                Point::new(1.0, 0.0, z),
                Point::new(1.0, 1.0, z),
                Point::new(0.0, 1.0, z),
            ]),
            Vec::new(),
        )
    }

    #[test]
    fn test_regenerate_object_buffers() {
        let mut object = CityObject::new(ObjectType::Building, "b");
        object.add_polygon(SurfaceType::RoofSurface, square(3.0));
        object.add_polygon(SurfaceType::Undefined, Polygon::default());

        regenerate_object(&mut object);

        assert_eq!(object.triangles(SurfaceType::RoofSurface).len(), 18);
        assert!(object.triangles_by_type.contains_key(&SurfaceType::Undefined));
        assert!(object.triangles(SurfaceType::Undefined).is_empty());
        assert_eq!(object.edge_count(), 4);
    }

    #[test]
    fn test_clear_resets_bounds() {
        let mut dataset = Dataset::new();
        dataset.bounds.extend(&Point::new(1.0, 2.0, 3.0));
        assert!(dataset.bounds().is_some());
        dataset.clear();
        assert!(dataset.bounds().is_none());
    }
}
