//! Core geometry types for city models
//!
//! This module contains the value types shared by both ingestion paths and the
//! tessellation engine: points, rings, polygons and the city objects that own
//! them. None of these types carry geometric behavior beyond construction.

use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;

/// A 3D point in the common world frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Bit pattern used for exact duplicate detection (-0.0 folds into 0.0)
    pub(crate) fn bits(&self) -> [u32; 3] {
        [
            (self.x + 0.0).to_bits(),
            (self.y + 0.0).to_bits(),
            (self.z + 0.0).to_bits(),
        ]
    }
}

/// Closed loop of points; the last point implicitly connects to the first
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Ring {
    pub points: Vec<Point>,
}

impl Ring {
    /// Build a ring from parsed points.
    ///
    /// An explicitly repeated closing point (as written by GML) is dropped, and
    /// a ring with fewer than 3 distinct points is emptied rather than kept
    /// partially.
    pub fn from_points(mut points: Vec<Point>) -> Self {
        if points.len() > 1 && points.first().map(Point::bits) == points.last().map(Point::bits) {
            points.pop();
        }

        let distinct: HashSet<[u32; 3]> = points.iter().map(Point::bits).collect();
        if distinct.len() < 3 {
            points.clear();
        }

        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Consecutive point pairs including the closing pair
    pub fn segments(&self) -> impl Iterator<Item = (&Point, &Point)> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| (&self.points[i], &self.points[(i + 1) % n]))
    }
}

/// One exterior ring plus zero or more interior rings (holes)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Polygon {
    pub exterior: Ring,
    pub interiors: Vec<Ring>,
}

impl Polygon {
    pub fn new(exterior: Ring, interiors: Vec<Ring>) -> Self {
        Self { exterior, interiors }
    }

    /// All rings, exterior first
    pub fn rings(&self) -> impl Iterator<Item = &Ring> + '_ {
        std::iter::once(&self.exterior).chain(self.interiors.iter())
    }

    /// Total number of points over every ring
    pub fn point_count(&self) -> usize {
        self.rings().map(Ring::len).sum()
    }
}

/// Semantic surface label a polygon is filed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
pub enum SurfaceType {
    #[default]
    #[serde(rename = "")]
    Undefined,
    Door,
    GroundSurface,
    RoofSurface,
    Window,
}

impl SurfaceType {
    /// Surface kinds recognised while walking CityGML (namespace already stripped)
    pub fn from_local_name(name: &str) -> Option<Self> {
        match name {
            "Door" => Some(SurfaceType::Door),
            "GroundSurface" => Some(SurfaceType::GroundSurface),
            "RoofSurface" => Some(SurfaceType::RoofSurface),
            "Window" => Some(SurfaceType::Window),
            _ => None,
        }
    }

    /// Map a CityJSON semantic type; anything outside the known set is undefined
    pub fn from_label(label: &str) -> Self {
        Self::from_local_name(label).unwrap_or(SurfaceType::Undefined)
    }

    /// Label used by consumers ("" for undefined)
    pub fn label(&self) -> &'static str {
        match self {
            SurfaceType::Undefined => "",
            SurfaceType::Door => "Door",
            SurfaceType::GroundSurface => "GroundSurface",
            SurfaceType::RoofSurface => "RoofSurface",
            SurfaceType::Window => "Window",
        }
    }
}

/// City object kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ObjectType {
    AuxiliaryTrafficArea,
    Bridge,
    Building,
    BuildingPart,
    BuildingInstallation,
    CityFurniture,
    GenericCityObject,
    LandUse,
    PlantCover,
    Railway,
    ReliefFeature,
    Road,
    SolitaryVegetationObject,
    TrafficArea,
    Tunnel,
    WaterBody,
    // Only produced by CityJSON
    BridgePart,
    BridgeInstallation,
    BridgeConstructionElement,
    TunnelPart,
    TunnelInstallation,
    TINRelief,
}

impl ObjectType {
    /// Object kinds recognised as CityGML element names (namespace already stripped)
    pub fn from_citygml_name(name: &str) -> Option<Self> {
        let object_type = match name {
            "AuxiliaryTrafficArea" => ObjectType::AuxiliaryTrafficArea,
            "Bridge" => ObjectType::Bridge,
            "Building" => ObjectType::Building,
            "BuildingPart" => ObjectType::BuildingPart,
            "BuildingInstallation" => ObjectType::BuildingInstallation,
            "CityFurniture" => ObjectType::CityFurniture,
            "GenericCityObject" => ObjectType::GenericCityObject,
            "LandUse" => ObjectType::LandUse,
            "PlantCover" => ObjectType::PlantCover,
            "Railway" => ObjectType::Railway,
            "ReliefFeature" => ObjectType::ReliefFeature,
            "Road" => ObjectType::Road,
            "SolitaryVegetationObject" => ObjectType::SolitaryVegetationObject,
            "TrafficArea" => ObjectType::TrafficArea,
            "Tunnel" => ObjectType::Tunnel,
            "WaterBody" => ObjectType::WaterBody,
            _ => return None,
        };
        Some(object_type)
    }

    /// Object kinds accepted in a CityJSON `type` field
    pub fn from_cityjson_name(name: &str) -> Option<Self> {
        if let Some(object_type) = Self::from_citygml_name(name) {
            return Some(object_type);
        }
        let object_type = match name {
            "BridgePart" => ObjectType::BridgePart,
            "BridgeInstallation" => ObjectType::BridgeInstallation,
            "BridgeConstructionElement" => ObjectType::BridgeConstructionElement,
            "TunnelPart" => ObjectType::TunnelPart,
            "TunnelInstallation" => ObjectType::TunnelInstallation,
            "TINRelief" => ObjectType::TINRelief,
            _ => return None,
        };
        Some(object_type)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ObjectType::AuxiliaryTrafficArea => "AuxiliaryTrafficArea",
            ObjectType::Bridge => "Bridge",
            ObjectType::Building => "Building",
            ObjectType::BuildingPart => "BuildingPart",
            ObjectType::BuildingInstallation => "BuildingInstallation",
            ObjectType::CityFurniture => "CityFurniture",
            ObjectType::GenericCityObject => "GenericCityObject",
            ObjectType::LandUse => "LandUse",
            ObjectType::PlantCover => "PlantCover",
            ObjectType::Railway => "Railway",
            ObjectType::ReliefFeature => "ReliefFeature",
            ObjectType::Road => "Road",
            ObjectType::SolitaryVegetationObject => "SolitaryVegetationObject",
            ObjectType::TrafficArea => "TrafficArea",
            ObjectType::Tunnel => "Tunnel",
            ObjectType::WaterBody => "WaterBody",
            ObjectType::BridgePart => "BridgePart",
            ObjectType::BridgeInstallation => "BridgeInstallation",
            ObjectType::BridgeConstructionElement => "BridgeConstructionElement",
            ObjectType::TunnelPart => "TunnelPart",
            ObjectType::TunnelInstallation => "TunnelInstallation",
            ObjectType::TINRelief => "TINRelief",
        }
    }
}

/// A semantic city entity with its polygons and generated render buffers
#[derive(Debug, Clone, Serialize)]
pub struct CityObject {
    #[serde(rename = "type")]
    pub object_type: ObjectType,
    pub id: String,
    pub attributes: IndexMap<String, String>,
    #[serde(skip)]
    pub polygons_by_type: IndexMap<SurfaceType, Vec<Polygon>>,
    pub triangles_by_type: IndexMap<SurfaceType, Vec<f32>>,  // 9 floats per triangle
    pub edges: Vec<f32>,  // 6 floats per segment
}

impl CityObject {
    pub fn new(object_type: ObjectType, id: impl Into<String>) -> Self {
        Self {
            object_type,
            id: id.into(),
            attributes: IndexMap::new(),
            polygons_by_type: IndexMap::new(),
            triangles_by_type: IndexMap::new(),
            edges: Vec::new(),
        }
    }

    /// File a polygon under a surface type
    pub fn add_polygon(&mut self, surface_type: SurfaceType, polygon: Polygon) {
        self.polygons_by_type.entry(surface_type).or_default().push(polygon);
    }

    pub fn polygons(&self, surface_type: SurfaceType) -> &[Polygon] {
        self.polygons_by_type
            .get(&surface_type)
            .map(|p| p.as_slice())
            .unwrap_or(&[])
    }

    pub fn polygon_count(&self) -> usize {
        self.polygons_by_type.values().map(Vec::len).sum()
    }

    /// Read-only view over (surface type, flat triangle buffer)
    pub fn triangle_buffers(&self) -> impl Iterator<Item = (SurfaceType, &[f32])> + '_ {
        self.triangles_by_type.iter().map(|(t, b)| (*t, b.as_slice()))
    }

    pub fn triangles(&self, surface_type: SurfaceType) -> &[f32] {
        self.triangles_by_type
            .get(&surface_type)
            .map(|b| b.as_slice())
            .unwrap_or(&[])
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles_by_type.values().map(|b| b.len() / 9).sum()
    }

    pub fn edges(&self) -> &[f32] {
        &self.edges
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len() / 6
    }

    /// Read-only view over the attribute map
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Every point of every polygon, in ingestion order
    pub fn points(&self) -> impl Iterator<Item = &Point> + '_ {
        self.polygons_by_type
            .values()
            .flatten()
            .flat_map(|polygon| polygon.rings())
            .flat_map(|ring| ring.points.iter())
    }
}
