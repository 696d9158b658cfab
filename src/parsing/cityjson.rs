//! CityJSON ingestion
//!
//! Polygons are stored as nested arrays of indices into one shared vertex
//! pool. The nesting depth depends on the geometry type; semantic surface
//! types come from `semantics.values`, nested to the same surface level.
//!
//! An index outside the vertex pool rejects the whole document with an
//! [`IntegrityError`], so a dataset never holds half-resolved geometry.

use crate::error::{Diagnostic, IntegrityError};
use crate::geometry::{CityObject, ObjectType, Point, Polygon, Ring, SurfaceType};
use super::ParseOutput;
use anyhow::Context;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use std::io::Read;

/// Ring as vertex indices
type RingIndices = Vec<usize>;
/// Surface as rings, exterior first
type SurfaceIndices = Vec<RingIndices>;

#[derive(Debug, Deserialize)]
struct CityJsonDocument {
    #[serde(rename = "CityObjects", default)]
    city_objects: IndexMap<String, CityJsonObject>,
    vertices: Vec<[f64; 3]>,
    #[serde(default)]
    transform: Option<Transform>,
}

#[derive(Debug, Deserialize)]
struct Transform {
    scale: [f64; 3],
    translate: [f64; 3],
}

#[derive(Debug, Deserialize)]
struct CityJsonObject {
    #[serde(rename = "type")]
    object_type: String,
    #[serde(default)]
    attributes: Option<IndexMap<String, Value>>,
    #[serde(default)]
    geometry: Option<Vec<CityJsonGeometry>>,
}

#[derive(Debug, Deserialize)]
struct CityJsonGeometry {
    #[serde(rename = "type")]
    geometry_type: String,
    #[serde(default)]
    boundaries: Value,
    #[serde(default)]
    semantics: Option<Semantics>,
}

#[derive(Debug, Deserialize)]
struct Semantics {
    #[serde(default)]
    surfaces: Vec<SemanticSurface>,
    #[serde(default)]
    values: Value,
}

#[derive(Debug, Deserialize)]
struct SemanticSurface {
    #[serde(rename = "type")]
    surface_type: String,
}

/// Parse an in-memory CityJSON document
pub fn parse_cityjson_str(content: &str) -> anyhow::Result<ParseOutput> {
    let document: CityJsonDocument =
        serde_json::from_str(content).context("Malformed CityJSON document")?;
    build_objects(document)
}

/// Parse a CityJSON document from a reader
pub fn parse_cityjson_reader<R: Read>(reader: R) -> anyhow::Result<ParseOutput> {
    let document: CityJsonDocument =
        serde_json::from_reader(reader).context("Malformed CityJSON document")?;
    build_objects(document)
}

fn build_objects(document: CityJsonDocument) -> anyhow::Result<ParseOutput> {
    let vertices = resolve_vertices(&document.vertices, document.transform.as_ref());
    let mut output = ParseOutput::default();

    for (id, json_object) in document.city_objects {
        let Some(object_type) = ObjectType::from_cityjson_name(&json_object.object_type) else {
            let message = format!("Unsupported object type '{}', skipping", json_object.object_type);
            tracing::warn!(object = %id, "{}", message);
            output.diagnostics.push(Diagnostic::message(id, message));
            continue;
        };

        let object = parse_cityjson_object(id, object_type, json_object, &vertices, &mut output)?;
        output.objects.push(object);
    }

    Ok(output)
}

/// Apply the optional transform and narrow to single precision
fn resolve_vertices(vertices: &[[f64; 3]], transform: Option<&Transform>) -> Vec<Point> {
    vertices
        .iter()
        .map(|v| {
            let [x, y, z] = match transform {
                Some(t) => [
                    v[0] * t.scale[0] + t.translate[0],
                    v[1] * t.scale[1] + t.translate[1],
                    v[2] * t.scale[2] + t.translate[2],
                ],
                None => *v,
            };
            Point::new(x as f32, y as f32, z as f32)
        })
        .collect()
}

fn parse_cityjson_object(
    id: String,
    object_type: ObjectType,
    json_object: CityJsonObject,
    vertices: &[Point],
    output: &mut ParseOutput,
) -> anyhow::Result<CityObject> {
    let mut object = CityObject::new(object_type, id);

    for (key, value) in json_object.attributes.unwrap_or_default() {
        object.attributes.insert(key, attribute_string(value));
    }

    for (index, geometry) in json_object.geometry.unwrap_or_default().into_iter().enumerate() {
        let geometry_type = geometry.geometry_type.clone();
        let Some(surfaces) = typed_surfaces(geometry)
            .with_context(|| format!("Invalid boundaries in geometry {} ({}) of object '{}'", index, geometry_type, object.id))?
        else {
            tracing::debug!(object = %object.id, geometry_type = %geometry_type, "Geometry has no surfaces, skipping");
            continue;
        };

        for (surface, surface_type) in surfaces {
            let polygon = resolve_polygon(&surface, vertices, &object.id, output)?;
            object.add_polygon(surface_type, polygon);
        }
    }

    Ok(object)
}

/// Coerce an attribute value to a string; non-strings keep their JSON form
fn attribute_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Flatten a geometry's boundaries to surfaces paired with their semantic type.
/// Returns `None` for geometry types that carry no surfaces.
fn typed_surfaces(geometry: CityJsonGeometry) -> anyhow::Result<Option<Vec<(SurfaceIndices, SurfaceType)>>> {
    let (surface_labels, values) = match geometry.semantics {
        Some(semantics) => {
            let labels: Vec<SurfaceType> = semantics
                .surfaces
                .iter()
                .map(|s| SurfaceType::from_label(&s.surface_type))
                .collect();
            (labels, semantics.values)
        }
        None => (Vec::new(), Value::Null),
    };
    let label_of = |value: Option<usize>| {
        value
            .and_then(|i| surface_labels.get(i).copied())
            .unwrap_or(SurfaceType::Undefined)
    };

    let typed = match geometry.geometry_type.as_str() {
        "MultiSurface" | "CompositeSurface" => {
            let surfaces: Vec<SurfaceIndices> = serde_json::from_value(geometry.boundaries)?;
            let values: Vec<Option<usize>> = semantic_values(values);
            surfaces
                .into_iter()
                .enumerate()
                .map(|(i, surface)| (surface, label_of(values.get(i).copied().flatten())))
                .collect()
        }
        "Solid" => {
            let shells: Vec<Vec<SurfaceIndices>> = serde_json::from_value(geometry.boundaries)?;
            let values: Vec<Vec<Option<usize>>> = semantic_values(values);
            let mut typed = Vec::new();
            for (s, shell) in shells.into_iter().enumerate() {
                for (i, surface) in shell.into_iter().enumerate() {
                    let value = values.get(s).and_then(|shell| shell.get(i)).copied().flatten();
                    typed.push((surface, label_of(value)));
                }
            }
            typed
        }
        "MultiSolid" | "CompositeSolid" => {
            let solids: Vec<Vec<Vec<SurfaceIndices>>> = serde_json::from_value(geometry.boundaries)?;
            let values: Vec<Vec<Vec<Option<usize>>>> = semantic_values(values);
            let mut typed = Vec::new();
            for (d, solid) in solids.into_iter().enumerate() {
                for (s, shell) in solid.into_iter().enumerate() {
                    for (i, surface) in shell.into_iter().enumerate() {
                        let value = values
                            .get(d)
                            .and_then(|solid| solid.get(s))
                            .and_then(|shell| shell.get(i))
                            .copied()
                            .flatten();
                        typed.push((surface, label_of(value)));
                    }
                }
            }
            typed
        }
        _ => return Ok(None),
    };

    Ok(Some(typed))
}

/// Decode `semantics.values`; a missing or mis-shaped array means no semantics
fn semantic_values<T: serde::de::DeserializeOwned + Default>(values: Value) -> T {
    if values.is_null() {
        return T::default();
    }
    serde_json::from_value(values).unwrap_or_else(|error| {
        tracing::debug!(%error, "Ignoring malformed semantic values");
        T::default()
    })
}

fn resolve_polygon(
    surface: &SurfaceIndices,
    vertices: &[Point],
    object_id: &str,
    output: &mut ParseOutput,
) -> Result<Polygon, IntegrityError> {
    let mut rings = surface
        .iter()
        .map(|indices| resolve_ring(indices, vertices, object_id, output))
        .collect::<Result<Vec<Ring>, IntegrityError>>()?
        .into_iter();

    let exterior = rings.next().unwrap_or_default();
    Ok(Polygon::new(exterior, rings.collect()))
}

fn resolve_ring(
    indices: &[usize],
    vertices: &[Point],
    object_id: &str,
    output: &mut ParseOutput,
) -> Result<Ring, IntegrityError> {
    let points = indices
        .iter()
        .map(|&index| {
            vertices
                .get(index)
                .copied()
                .ok_or_else(|| IntegrityError::VertexIndexOutOfRange {
                    object: object_id.to_string(),
                    index,
                    vertex_count: vertices.len(),
                })
        })
        .collect::<Result<Vec<Point>, IntegrityError>>()?;

    output.extend_bounds(&points);
    Ok(Ring::from_points(points))
}
