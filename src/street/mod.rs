pub mod astar;
pub mod graph;

pub use astar::{WalkResult, shortest_walk};
pub use graph::{StreetEdge, StreetEdgeRecord, StreetGraph, StreetNode, StreetNodeRecord};
