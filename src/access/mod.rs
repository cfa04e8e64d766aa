//! Access/Egress Resolver (C4): turns a coordinate into a ranked list of
//! candidate stops with walking time, in either haversine-only mode or,
//! when a [`StreetGraph`] is attached, an OSM-backed mode that walks the
//! pedestrian A\* between snapped street nodes (§4.6).

use std::cmp::Ordering;
use std::time::{Duration as WallDuration, Instant};

use petgraph::graph::NodeIndex;
use rayon::prelude::*;

use crate::{
    config::Config,
    repository::{Repository, Stop},
    shared::{Coordinate, Distance, Duration},
    street::{StreetGraph, shortest_walk},
};

/// Candidate radius to snap a query point or a stop onto the street graph (§4.6).
const SNAP_RADIUS: Distance = Distance::from_meters(300.0);
/// Haversine-closest candidates considered before walking-router refinement.
const CANDIDATE_POOL: usize = 30;
const TASK_BUDGET: WallDuration = WallDuration::from_secs(2);

#[derive(Debug, Clone, Copy)]
pub struct AccessCandidate {
    pub stop_idx: u32,
    pub duration: Duration,
    pub distance: Distance,
}

/// Resolves coordinates to nearby stops against a fixed `Repository` and an
/// optional `StreetGraph`. Owns the `stopNearestNode` precomputation (§4.6)
/// so it is paid once at startup rather than per query.
pub struct AccessResolver<'a> {
    repository: &'a Repository,
    street: Option<&'a StreetGraph>,
    stop_nearest_node: Box<[Option<NodeIndex>]>,
}

impl<'a> AccessResolver<'a> {
    pub fn new(repository: &'a Repository, street: Option<&'a StreetGraph>) -> Self {
        let stop_nearest_node = street
            .map(|street| {
                repository
                    .stops
                    .iter()
                    .map(|stop| street.nearest_node(&stop.coordinate, SNAP_RADIUS))
                    .collect()
            })
            .unwrap_or_default();
        Self {
            repository,
            street,
            stop_nearest_node,
        }
    }

    /// Resolves `coordinate` to a ranked, capped list of nearby stops.
    /// `cap` is the caller's side of the search — `max_access_stops` for an
    /// origin, `max_egress_stops` for a destination — since the two are
    /// independently configurable (§4.6) and this resolver serves both sides.
    pub fn resolve(&self, coordinate: &Coordinate, max_walk: Distance, cap: usize) -> Vec<AccessCandidate> {
        match self.street {
            Some(street) => self.resolve_osm(coordinate, max_walk, cap, street),
            None => self.resolve_haversine(coordinate, max_walk, cap),
        }
    }

    /// Haversine-only mode (§4.6).
    fn resolve_haversine(&self, coordinate: &Coordinate, max_walk: Distance, cap: usize) -> Vec<AccessCandidate> {
        let config = &self.repository.config;
        let mut candidates: Vec<AccessCandidate> = self
            .repository
            .stops_by_coordinate(coordinate, max_walk)
            .into_iter()
            .map(|stop| candidate_from_distance(stop, stop.coordinate.network_distance(coordinate), config))
            .collect();
        sort_and_cap(&mut candidates, cap);
        candidates
    }

    /// OSM-backed mode (§4.6): snap the query point, take the `K` haversine-closest
    /// stops, and refine each via the pedestrian A\* in parallel.
    fn resolve_osm(&self, coordinate: &Coordinate, max_walk: Distance, cap: usize, street: &StreetGraph) -> Vec<AccessCandidate> {
        let config = &self.repository.config;
        let Some(origin_node) = street.nearest_node(coordinate, SNAP_RADIUS) else {
            return self.resolve_haversine(coordinate, max_walk, cap);
        };

        let mut pool = self.repository.stops_by_coordinate(coordinate, max_walk);
        pool.sort_by(|a, b| {
            a.coordinate
                .network_distance(coordinate)
                .as_meters()
                .partial_cmp(&b.coordinate.network_distance(coordinate).as_meters())
                .unwrap_or(Ordering::Equal)
        });
        pool.truncate(CANDIDATE_POOL);

        let mut candidates: Vec<AccessCandidate> = pool
            .par_iter()
            .map(|stop| self.resolve_one(street, config, coordinate, origin_node, stop))
            .filter(|candidate| candidate.distance <= max_walk)
            .collect();
        sort_and_cap(&mut candidates, cap);
        candidates
    }

    fn resolve_one(
        &self,
        street: &StreetGraph,
        config: &Config,
        origin: &Coordinate,
        origin_node: NodeIndex,
        stop: &Stop,
    ) -> AccessCandidate {
        let stop_node = self.stop_nearest_node[stop.index as usize];
        let walk = stop_node.and_then(|stop_node| {
            let deadline = Instant::now() + TASK_BUDGET;
            shortest_walk(street, config, origin_node, stop_node, Some(deadline))
        });

        match (walk, stop_node) {
            (Some(walk), Some(stop_node)) => {
                let origin_snap = origin.euclidean_distance(&street.coordinate_of(origin_node));
                let stop_snap = street.coordinate_of(stop_node).euclidean_distance(&stop.coordinate);
                let distance = walk.distance + origin_snap + stop_snap;
                let snap_sec = ((origin_snap.as_meters() + stop_snap.as_meters()) / config.walk_speed_mps)
                    .ceil() as u32;
                let duration = walk.duration + Duration::from_seconds(snap_sec);
                AccessCandidate {
                    stop_idx: stop.index,
                    distance,
                    duration,
                }
            }
            _ => candidate_from_distance(stop, stop.coordinate.network_distance(origin), config),
        }
    }
}

fn candidate_from_distance(stop: &Stop, distance: Distance, config: &Config) -> AccessCandidate {
    let duration_sec = (distance.as_meters() / config.walk_speed_mps).ceil() as u32;
    AccessCandidate {
        stop_idx: stop.index,
        distance,
        duration: Duration::from_seconds(duration_sec),
    }
}

fn sort_and_cap(candidates: &mut Vec<AccessCandidate>, cap: usize) {
    candidates.sort_by_key(|c| c.duration.as_seconds());
    candidates.truncate(cap);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::RepositoryBuilder;
    use std::sync::Arc;

    /// Four stop positions scattered around the Seoul Station plaza — its
    /// subway exits and bus bays sit within a couple hundred meters of each
    /// other, close enough that a 400 m haversine search from any one of
    /// them reaches the rest.
    fn fixture() -> Repository {
        let mut builder = RepositoryBuilder::default();
        let seoul_station_plaza = [
            ("S001", "Seoul Station Exit 1", 37.5547, 126.9707),
            ("S002", "Seoul Station Bus Bay A", 37.5550, 126.9712),
            ("S003", "Seoul Station Bus Bay B", 37.5552, 126.9700),
            ("S004", "Seoul Station Taxi Stand", 37.5544, 126.9715),
        ];
        for (i, &(id, name, lat, lon)) in seoul_station_plaza.iter().enumerate() {
            builder.stops.push(Stop {
                index: i as u32,
                id: Arc::from(id),
                name: Arc::from(name),
                coordinate: Coordinate { latitude: lat, longitude: lon },
            });
            builder.stop_lookup.insert(Arc::from(id), i as u32);
        }
        builder.build(Config::default())
    }

    /// S1: access resolver, urban — haversine-only mode (no street graph attached).
    #[test]
    fn access_resolver_urban() {
        let repository = fixture();
        let resolver = AccessResolver::new(&repository, None);
        let origin = Coordinate { latitude: 37.5547, longitude: 126.9707 };

        let candidates = resolver.resolve(&origin, Distance::from_meters(400.0), repository.config.max_access_stops);
        assert!(candidates.len() >= 3, "expected at least 3 candidates, got {}", candidates.len());
        let nearest = &candidates[0];
        assert!(nearest.distance.as_meters() <= 400.0);
        let expected_duration = (nearest.distance.as_meters() / repository.config.walk_speed_mps).ceil() as u32;
        assert_eq!(nearest.duration.as_seconds(), expected_duration);
    }
}
