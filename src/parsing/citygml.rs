//! CityGML ingestion
//!
//! Walks a parsed XML tree, turns every whitelisted city-object element into a
//! [`CityObject`] and files its `Polygon`/`Triangle` elements by surface type.
//!
//! Surface typing is a two-state machine carried through a depth-first walk:
//! no active type, or an active type together with the depth it was entered
//! at. Leaving that depth ends the type before the current element is
//! inspected, so a sibling surface element starts its own type right away.
//! A nested surface element replaces the active one rather than stacking.

use crate::error::Diagnostic;
use crate::geometry::{CityObject, ObjectType, Polygon, Ring, SurfaceType};
use crate::parse_xml::XmlNode;
use super::points::parse_coordinates;
use super::ParseOutput;
use indexmap::IndexMap;

/// Build the object collection from a CityGML document
pub fn parse_citygml(root: &XmlNode) -> ParseOutput {
    let mut output = ParseOutput::default();

    let mut object_nodes = Vec::new();
    collect_object_nodes(root, &mut object_nodes);

    for (node, object_type) in object_nodes {
        let object = parse_citygml_object(node, object_type, &mut output);
        output.objects.push(object);
    }

    output
}

/// Recursively find every element whose local name is a city-object type
fn collect_object_nodes<'a>(node: &'a XmlNode, found: &mut Vec<(&'a XmlNode, ObjectType)>) {
    if let Some(object_type) = ObjectType::from_citygml_name(node.local_name()) {
        found.push((node, object_type));
    }

    for child in &node.children {
        collect_object_nodes(child, found);
    }
}

/// Parse one object element: id, attributes and typed polygons.
///
/// Diagnostics and the bounds of every parsed point go to `output`; the
/// object itself is returned for the caller to store.
pub fn parse_citygml_object(node: &XmlNode, object_type: ObjectType, output: &mut ParseOutput) -> CityObject {
    let id = node.attribute_local("id").unwrap_or_default();
    let mut object = CityObject::new(object_type, id);
    object.attributes = collect_attributes(node);

    let mut collector = PolygonCollector::default();
    for child in &node.children {
        collector.visit(child, 0);
    }

    for (index, (surface_type, polygon_node)) in collector.polygons.into_iter().enumerate() {
        let context = format!("{} '{}' polygon {}", object_type.name(), object.id, index);
        let polygon = parse_polygon(polygon_node, &context, output);
        object.add_polygon(surface_type, polygon);
    }

    object
}

/// Surface typing state while walking an object's subtree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum SurfaceContext {
    #[default]
    Undefined,
    Active { surface_type: SurfaceType, depth: usize },
}

impl SurfaceContext {
    fn surface_type(&self) -> SurfaceType {
        match self {
            SurfaceContext::Undefined => SurfaceType::Undefined,
            SurfaceContext::Active { surface_type, .. } => *surface_type,
        }
    }
}

#[derive(Debug, Default)]
struct PolygonCollector<'a> {
    context: SurfaceContext,
    polygons: Vec<(SurfaceType, &'a XmlNode)>,
}

impl<'a> PolygonCollector<'a> {
    fn visit(&mut self, node: &'a XmlNode, depth: usize) {
        // Leaving the subtree that started the active type
        if let SurfaceContext::Active { depth: entry_depth, .. } = self.context {
            if depth <= entry_depth {
                self.context = SurfaceContext::Undefined;
            }
        }

        let name = node.local_name();
        if let Some(surface_type) = SurfaceType::from_local_name(name) {
            self.context = SurfaceContext::Active { surface_type, depth };
        } else if name == "Polygon" || name == "Triangle" {
            self.polygons.push((self.context.surface_type(), node));
        }

        for child in &node.children {
            self.visit(child, depth + 1);
        }
    }
}

/// Parse a Polygon/Triangle element into exterior and interior rings
pub fn parse_polygon(node: &XmlNode, context: &str, output: &mut ParseOutput) -> Polygon {
    let mut exterior_nodes = Vec::new();
    let mut interior_nodes = Vec::new();
    find_ring_nodes(node, &mut exterior_nodes, &mut interior_nodes);

    if exterior_nodes.len() > 1 {
        tracing::debug!(context, count = exterior_nodes.len(), "Multiple exterior rings, using the first");
    }

    let exterior = match exterior_nodes.first() {
        Some(exterior_node) => parse_ring(exterior_node, &format!("{} exterior", context), output),
        None => {
            tracing::debug!(context, "Polygon has no exterior ring");
            Ring::default()
        }
    };

    let interiors = interior_nodes
        .iter()
        .enumerate()
        .map(|(k, interior_node)| {
            parse_ring(interior_node, &format!("{} interior {}", context, k), output)
        })
        .collect();

    Polygon::new(exterior, interiors)
}

/// Find `exterior` and `interior` descendants without descending into them
fn find_ring_nodes<'a>(
    node: &'a XmlNode,
    exteriors: &mut Vec<&'a XmlNode>,
    interiors: &mut Vec<&'a XmlNode>,
) {
    for child in &node.children {
        match child.local_name() {
            "exterior" => exteriors.push(child),
            "interior" => interiors.push(child),
            _ => find_ring_nodes(child, exteriors, interiors),
        }
    }
}

/// Extract a ring's points from the `pos`/`posList` elements below `node`.
///
/// Malformed coordinate text empties the ring and is reported as a
/// diagnostic; parsing continues with the next ring. Parsed points extend the
/// bounds even when the ring is then emptied for having too few of them.
pub fn parse_ring(node: &XmlNode, context: &str, output: &mut ParseOutput) -> Ring {
    let mut text = String::new();
    collect_position_text(node, &mut text);

    match parse_coordinates(&text) {
        Ok(points) => {
            output.extend_bounds(&points);
            let parsed = points.len();
            let ring = Ring::from_points(points);
            if parsed > 0 && ring.is_empty() {
                tracing::debug!(context, points = parsed, "Ring has fewer than 3 distinct points, emptied");
            }
            ring
        }
        Err(error) => {
            tracing::warn!(context, %error, "Discarding ring");
            output.diagnostics.push(Diagnostic::ring(context, error));
            Ring::default()
        }
    }
}

/// Concatenate the text of every `pos`/`posList` element in document order
fn collect_position_text(node: &XmlNode, text: &mut String) {
    for child in &node.children {
        match child.local_name() {
            "pos" | "posList" => {
                if !text.is_empty() {
                    text.push(' ');
                }
                text.push_str(&child.text_content);
            }
            _ => collect_position_text(child, text),
        }
    }
}

/// Capture string attributes from an object element.
///
/// Leaf children with text become `local name -> text`; generic attributes
/// (`gen:stringAttribute name="k"` and friends) become `k -> value text`.
fn collect_attributes(node: &XmlNode) -> IndexMap<String, String> {
    let mut attributes = IndexMap::new();

    for child in &node.children {
        let local = child.local_name();

        if local.ends_with("Attribute") {
            if let (Some(name), Some(value)) = (child.attribute_local("name"), child.child_local("value")) {
                attributes.insert(name.to_string(), value.text_content.clone());
            }
            continue;
        }

        if child.children.is_empty() && !child.text_content.is_empty() {
            attributes.insert(local.to_string(), child.text_content.clone());
        }
    }

    attributes
}
