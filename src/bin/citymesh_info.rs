//! CLI tool for inspecting ingestion and tessellation of a city model
//!
//! Usage:
//!   cargo run --release --bin citymesh_info -- <file> [options]
//!
//! Options:
//!   --preserve <k1,k2>  Keep only these attribute keys
//!   --summary           Show summary stats only
//!   --json              Print the per-object report as JSON

use std::env;

use city_mesh::config::parse_key_list;
use city_mesh::{Bounds, CityObject, Dataset, DatasetConfig, Diagnostic};
use indexmap::IndexMap;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Serialize)]
struct ObjectReport<'a> {
    #[serde(rename = "type")]
    object_type: &'static str,
    id: &'a str,
    polygons: usize,
    triangles_by_type: IndexMap<&'static str, usize>,
    edges: usize,
    attributes: &'a IndexMap<String, String>,
}

#[derive(Serialize)]
struct Report<'a> {
    file: &'a str,
    bounds: Option<&'a Bounds>,
    objects: Vec<ObjectReport<'a>>,
    diagnostics: &'a [Diagnostic],
}

fn object_report(object: &CityObject) -> ObjectReport<'_> {
    ObjectReport {
        object_type: object.object_type.name(),
        id: &object.id,
        polygons: object.polygon_count(),
        triangles_by_type: object
            .triangle_buffers()
            .map(|(surface_type, buffer)| (surface_type.label(), buffer.len() / 9))
            .collect(),
        edges: object.edge_count(),
        attributes: &object.attributes,
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("city_mesh=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <file.gml|file.json> [options]", args[0]);
        eprintln!();
        eprintln!("Options:");
        eprintln!("  --preserve <k1,k2>   Keep only these attribute keys");
        eprintln!("  --summary            Show summary stats only");
        eprintln!("  --json               Print the per-object report as JSON");
        eprintln!();
        eprintln!("Examples:");
        eprintln!("  {} city.gml --summary", args[0]);
        eprintln!("  {} city.json --preserve name,measuredHeight --json", args[0]);
        return Ok(());
    }

    let path = &args[1];

    // Parse options
    let mut config = DatasetConfig::from_env();
    let mut filter = false;
    let mut summary_only = false;
    let mut json = false;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--preserve" => {
                i += 1;
                if i < args.len() {
                    config.attributes_to_preserve = parse_key_list(&args[i]);
                    filter = true;
                }
            }
            "--summary" => summary_only = true,
            "--json" => json = true,
            other => {
                eprintln!("Unknown option: {}", other);
            }
        }
        i += 1;
    }

    let mut dataset = Dataset::with_config(config);
    tracing::debug!(config = ?dataset.config(), "Dataset configuration");
    dataset.load(path)?;
    if filter {
        dataset.filter_attributes();
    }
    dataset.regenerate_geometries();

    if json {
        let report = Report {
            file: path,
            bounds: dataset.bounds(),
            objects: dataset.objects().map(object_report).collect(),
            diagnostics: dataset.diagnostics(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let total_triangles: usize = dataset.objects().map(CityObject::triangle_count).sum();
    let total_edges: usize = dataset.objects().map(CityObject::edge_count).sum();

    println!("=== {} ===", path);
    println!("Objects:     {}", dataset.len());
    println!("Triangles:   {}", total_triangles);
    println!("Edges:       {}", total_edges);
    println!("Diagnostics: {}", dataset.diagnostics().len());
    match dataset.bounds() {
        Some(bounds) => {
            let center = bounds.center();
            println!(
                "Bounds:      [{:.3}, {:.3}, {:.3}] - [{:.3}, {:.3}, {:.3}]",
                bounds.min[0], bounds.min[1], bounds.min[2], bounds.max[0], bounds.max[1], bounds.max[2]
            );
            println!("Center:      [{:.3}, {:.3}, {:.3}]", center[0], center[1], center[2]);
        }
        None => println!("Bounds:      (empty)"),
    }

    if summary_only {
        return Ok(());
    }

    println!();
    for object in dataset.objects() {
        println!(
            "{} '{}': {} polygons, {} triangles, {} edges",
            object.object_type.name(),
            object.id,
            object.polygon_count(),
            object.triangle_count(),
            object.edge_count()
        );
        for (surface_type, buffer) in object.triangle_buffers() {
            let label = if surface_type.label().is_empty() { "(undefined)" } else { surface_type.label() };
            println!("    {:<14} {} triangles", label, buffer.len() / 9);
        }
        for (key, value) in object.attributes() {
            println!("    @{} = {}", key, value);
        }
    }

    for diagnostic in dataset.diagnostics() {
        println!("! {}", diagnostic);
    }

    Ok(())
}
