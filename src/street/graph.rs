//! Street Graph (C1): an undirected (stored as two directed edges) pedestrian
//! graph over OSM street geometry, with a grid-cell spatial index for
//! nearest-node queries (§4.1).
//!
//! Grounded on `cascade-core::streets::create_graph` / `graph::TransitGraph`
//! (`petgraph::DiGraph<GraphNode, GraphEdge>`), adapted to reuse the
//! teacher's own grid-cell index (`Repository::stop_distance_lookup`'s
//! `Cell = (i32, i32)` scheme) instead of `cascade-core`'s `rstar::RTree`.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};

use crate::shared::{Coordinate, Distance};

/// Grid cell size in degrees, per §4.1.
pub const GRID_CELL_SIZE: f32 = 0.001;

#[derive(Debug, Clone, Copy)]
pub struct StreetNode {
    pub osm_id: i64,
    pub coordinate: Coordinate,
}

#[derive(Debug, Clone, Copy)]
pub struct StreetEdge {
    pub length: Distance,
    /// Per-class pedestrian speed (§4.1); informational, not read by `time_to_walk`.
    pub speed_mps: f32,
}

/// Raw node emitted by the OSM loader, before graph indices are assigned.
#[derive(Debug, Clone, Copy)]
pub struct StreetNodeRecord {
    pub osm_id: i64,
    pub coordinate: Coordinate,
}

/// Raw edge emitted by the OSM loader, referencing nodes by OSM id.
#[derive(Debug, Clone, Copy)]
pub struct StreetEdgeRecord {
    pub source: i64,
    pub target: i64,
    pub length: Distance,
    pub speed_mps: f32,
    pub oneway: bool,
}

/// Walkable pedestrian graph plus its nearest-node spatial index.
#[derive(Debug, Default)]
pub struct StreetGraph {
    graph: DiGraph<StreetNode, StreetEdge>,
    cell_index: HashMap<(i32, i32), Vec<NodeIndex>>,
}

impl StreetGraph {
    pub fn from_records(nodes: Vec<StreetNodeRecord>, edges: Vec<StreetEdgeRecord>) -> Self {
        let mut graph = DiGraph::with_capacity(nodes.len(), edges.len() * 2);
        let mut osm_to_idx = HashMap::with_capacity(nodes.len());
        let mut cell_index: HashMap<(i32, i32), Vec<NodeIndex>> = HashMap::new();

        for node in nodes {
            let idx = graph.add_node(StreetNode {
                osm_id: node.osm_id,
                coordinate: node.coordinate,
            });
            osm_to_idx.insert(node.osm_id, idx);
            cell_index
                .entry(node.coordinate.to_grid_cell(GRID_CELL_SIZE))
                .or_default()
                .push(idx);
        }

        for edge in edges {
            let (Some(&source), Some(&target)) =
                (osm_to_idx.get(&edge.source), osm_to_idx.get(&edge.target))
            else {
                continue;
            };
            let weight = StreetEdge {
                length: edge.length,
                speed_mps: edge.speed_mps,
            };
            graph.add_edge(source, target, weight);
            if !edge.oneway {
                graph.add_edge(target, source, weight);
            }
        }

        Self { graph, cell_index }
    }

    pub fn graph(&self) -> &DiGraph<StreetNode, StreetEdge> {
        &self.graph
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn coordinate_of(&self, node: NodeIndex) -> Coordinate {
        self.graph[node].coordinate
    }

    /// Nearest-node(lat, lon, rMeters), per §4.1: scans all grid cells within
    /// the radius and returns the minimum-haversine-distance node, if any.
    pub fn nearest_node(&self, coordinate: &Coordinate, max_distance: Distance) -> Option<NodeIndex> {
        let reach =
            ((max_distance.as_meters() / 111_000.0) / GRID_CELL_SIZE).ceil() as i32;
        let (cx, cy) = coordinate.to_grid_cell(GRID_CELL_SIZE);

        let mut best: Option<(NodeIndex, Distance)> = None;
        for dx in -reach..=reach {
            for dy in -reach..=reach {
                let Some(candidates) = self.cell_index.get(&(cx + dx, cy + dy)) else {
                    continue;
                };
                for &idx in candidates {
                    let distance = self.graph[idx].coordinate.euclidean_distance(coordinate);
                    if distance > max_distance {
                        continue;
                    }
                    if best.is_none_or(|(_, best_distance)| distance < best_distance) {
                        best = Some((idx, distance));
                    }
                }
            }
        }
        best.map(|(idx, _)| idx)
    }
}
