//! Walking Router (C2): A\* over the [`StreetGraph`] with a haversine-distance
//! heuristic (§4.2).
//!
//! Grounded on `cascade-core::algo::time_dependent_dijkstra` (`BinaryHeap<MinScored<K>>`
//! reverse-ordered for a min-heap), generalized from Dijkstra to A\* by adding
//! the haversine-to-goal term to the priority key. Scoring state (`gScore`,
//! `fScore` folded into the heap key) lives in per-query hash maps, never on
//! the graph itself, so concurrent searches never interfere.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::collections::BinaryHeap;
use std::time::Instant;

use petgraph::visit::EdgeRef;
use petgraph::graph::NodeIndex;

use crate::config::Config;
use crate::error::Error;
use crate::shared::{Distance, Duration};
use tracing::debug;

use super::graph::StreetGraph;

/// Reverse-ordered by score so `BinaryHeap` behaves as a min-heap.
#[derive(Copy, Clone, PartialEq)]
struct MinScored(f32, NodeIndex);

impl Eq for MinScored {}

impl PartialOrd for MinScored {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MinScored {
    fn cmp(&self, other: &Self) -> Ordering {
        other.0.partial_cmp(&self.0).unwrap_or(Ordering::Equal)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WalkResult {
    pub distance: Distance,
    pub duration: Duration,
}

/// Finds the shortest walking path from `start` to `goal`.
///
/// Returns `None` on abandonment: the open set empties (genuinely
/// unreachable), the popped-node count exceeds `Config::a_star_max_iterations`,
/// a node's `gScore` exceeds `Config::a_star_max_distance`, or `deadline`
/// elapses — checked on each popped node, per §7's cancellation contract. The
/// three budget-exhaustion cases log [`Error::WalkingRouteAbandoned`]; callers
/// fall back to `haversine * 1.3` (§4.2).
pub fn shortest_walk(
    graph: &StreetGraph,
    config: &Config,
    start: NodeIndex,
    goal: NodeIndex,
    deadline: Option<Instant>,
) -> Option<WalkResult> {
    if start == goal {
        return Some(WalkResult {
            distance: Distance::from_meters(0.0),
            duration: Duration::from_seconds(0),
        });
    }

    let goal_coordinate = graph.coordinate_of(goal);
    let mut g_score: HashMap<NodeIndex, f32> = HashMap::new();
    let mut open = BinaryHeap::new();

    g_score.insert(start, 0.0);
    let h_start = graph
        .coordinate_of(start)
        .euclidean_distance(&goal_coordinate)
        .as_meters();
    open.push(MinScored(h_start, start));

    let mut popped = 0usize;
    while let Some(MinScored(_, node)) = open.pop() {
        let current_g = g_score[&node];

        if node == goal {
            let distance = Distance::from_meters(current_g);
            let duration_sec = (distance.as_meters() / config.walk_speed_mps).ceil() as u32;
            return Some(WalkResult {
                distance,
                duration: Duration::from_seconds(duration_sec),
            });
        }

        popped += 1;
        let budget_exhausted = popped > config.a_star_max_iterations
            || current_g > config.a_star_max_distance.as_meters()
            || deadline.is_some_and(|deadline| Instant::now() >= deadline);
        if budget_exhausted {
            debug!("{}", Error::WalkingRouteAbandoned);
            return None;
        }

        for edge in graph.graph().edges(node) {
            let next = edge.target();
            let tentative = current_g + edge.weight().length.as_meters();
            if g_score.get(&next).is_none_or(|&existing| tentative < existing) {
                g_score.insert(next, tentative);
                let h = graph
                    .coordinate_of(next)
                    .euclidean_distance(&goal_coordinate)
                    .as_meters();
                open.push(MinScored(tentative + h, next));
            }
        }
    }

    None
}
