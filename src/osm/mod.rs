//! OSM PBF loader for the [`crate::street::StreetGraph`] (§4.1/§6 "OSM loader").
//!
//! Two-pass, same contract `cascade-core::streets::create_graph` implements
//! via `osm4routing::Reader`: scan ways first to decide which are walkable
//! and which nodes they reference, then keep only the coordinates of
//! referenced nodes. Edges are inserted in both directions unless the way is
//! tagged `oneway=yes`.

use std::{
    collections::HashSet,
    path::Path,
    time::Instant,
};

use thiserror::Error;
use tracing::debug;

use crate::{
    shared::{Coordinate, Distance},
    street::{StreetEdgeRecord, StreetGraph, StreetNodeRecord},
};

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to read OSM PBF: {0}")]
    Read(String),
}

/// Highway classes walkable per §4.1.
const WALKABLE_HIGHWAYS: &[&str] = &[
    "footway",
    "pedestrian",
    "path",
    "steps",
    "cycleway",
    "residential",
    "living_street",
    "tertiary",
    "secondary",
    "primary",
    "trunk",
    "unclassified",
    "service",
    "track",
];

/// Per-class pedestrian speed in m/s, informational only (§4.1).
fn speed_for_class(class: &str) -> f32 {
    match class {
        "footway" | "pedestrian" | "path" => 1.3,
        "steps" => 0.6,
        "primary" | "trunk" => 1.0,
        "tertiary" | "secondary" => 1.1,
        _ => 1.2,
    }
}

/// Returns the per-class speed if this edge is walkable, `None` to discard it.
fn walkable_speed(edge: &osm4routing::Edge) -> Option<f32> {
    let highway = edge.properties.tags.get("highway")?;
    if !WALKABLE_HIGHWAYS.contains(&highway.as_str()) {
        return None;
    }

    let foot = edge.properties.tags.get("foot").map(String::as_str);
    if matches!(foot, Some("no") | Some("private")) {
        return None;
    }

    let access = edge.properties.tags.get("access").map(String::as_str);
    let foot_explicitly_allowed = matches!(foot, Some("yes") | Some("designated") | Some("permissive"));
    if matches!(access, Some("no") | Some("private")) && !foot_explicitly_allowed {
        return None;
    }

    Some(speed_for_class(highway))
}

/// Loads the walkable subgraph of an OSM PBF extract into loader-facing
/// records, ready for [`StreetGraph::from_records`].
pub fn load<P: AsRef<Path>>(
    path: P,
) -> Result<(Vec<StreetNodeRecord>, Vec<StreetEdgeRecord>), self::Error> {
    let now = Instant::now();
    let (nodes, edges) = osm4routing::Reader::new()
        .read_tag("highway")
        .read_tag("foot")
        .read_tag("access")
        .read_tag("oneway")
        .read(path.as_ref())
        .map_err(|e| self::Error::Read(e.to_string()))?;

    let mut used_nodes: HashSet<osm4routing::NodeId> = HashSet::new();
    let mut edge_records = Vec::new();

    for edge in &edges {
        let Some(speed_mps) = walkable_speed(edge) else {
            continue;
        };
        let oneway = edge.properties.tags.get("oneway").map(String::as_str) == Some("yes");
        used_nodes.insert(edge.source);
        used_nodes.insert(edge.target);
        edge_records.push(StreetEdgeRecord {
            source: edge.source.0,
            target: edge.target.0,
            length: Distance::from_meters(edge.length() as f32),
            speed_mps,
            oneway,
        });
    }

    let node_records: Vec<StreetNodeRecord> = nodes
        .into_iter()
        .filter(|node| used_nodes.contains(&node.id))
        .map(|node| StreetNodeRecord {
            osm_id: node.id.0,
            coordinate: Coordinate {
                latitude: node.coord.lat as f32,
                longitude: node.coord.lon as f32,
            },
        })
        .collect();

    debug!(
        "Loaded {} walkable street nodes, {} edges from {:?} in {:?}",
        node_records.len(),
        edge_records.len(),
        path.as_ref(),
        now.elapsed()
    );
    Ok((node_records, edge_records))
}

/// Builds a [`StreetGraph`] directly from an OSM PBF extract.
pub fn build_street_graph<P: AsRef<Path>>(path: P) -> Result<StreetGraph, self::Error> {
    let (nodes, edges) = load(path)?;
    Ok(StreetGraph::from_records(nodes, edges))
}
