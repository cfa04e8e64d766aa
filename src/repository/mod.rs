mod entities;
pub mod source;

pub use entities::*;
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    config::Config,
    shared::geo::{Cell, Coordinate, Distance},
};

/// A read-only, memory-efficient data store containing all transit network
/// information derived from GTFS (§3 Data Model).
///
/// Acts as a flattened relational database: `Box<[T]>` instead of `Vec<T>`
/// signals immutability after construction, and every relationship
/// (`patternsAtStop`, `transfersFrom`/`transfersTo`, trip->stop-time slices)
/// is a precomputed adjacency array rather than a runtime join. Shared,
/// lock-free, across concurrent queries (§5).
#[derive(Debug, Clone, Default)]
pub struct Repository {
    pub stops: Box<[Stop]>,
    pub routes: Box<[Route]>,
    /// One entry per Trip Pattern (§3 "Pattern = Route 1:1").
    pub raptor_routes: Box<[RaptorRoute]>,
    pub trips: Box<[Trip]>,
    pub stop_times: Box<[StopTime]>,
    pub transfers: Box<[Transfer]>,
    pub config: Config,

    stop_lookup: HashMap<Arc<str>, u32>,
    trip_lookup: HashMap<Arc<str>, u32>,
    route_lookup: HashMap<Arc<str>, u32>,
    /// Grid-cell spatial index over stop coordinates (§4.1's scheme, reused here).
    stop_distance_lookup: HashMap<Cell, Box<[u32]>>,

    /// `patternsAtStop[s]`, deduplicated (§3 Stop-to-Pattern Index).
    stop_to_patterns: Box<[Box<[u32]>]>,
    /// `transfersFrom[s]`: indices into `transfers`.
    transfers_from: Box<[Box<[u32]>]>,
    /// `transfersTo[s]`: indices into `transfers`, for reverse search.
    transfers_to: Box<[Box<[u32]>]>,
    trip_to_stop_slice: Box<[StopTimeSlice]>,
}

impl Repository {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn stop_by_id(&self, id: &str) -> Option<&Stop> {
        let stop_index = self.stop_lookup.get(id)?;
        Some(&self.stops[*stop_index as usize])
    }

    pub fn trip_by_id(&self, id: &str) -> Option<&Trip> {
        let trip_index = self.trip_lookup.get(id)?;
        Some(&self.trips[*trip_index as usize])
    }

    pub fn route_by_id(&self, id: &str) -> Option<&Route> {
        let index = self.route_lookup.get(id)?;
        Some(&self.routes[*index as usize])
    }

    pub fn route_by_trip_idx(&self, trip_idx: u32) -> &Route {
        &self.routes[self.trips[trip_idx as usize].route_idx as usize]
    }

    /// `patternsAtStop(s)`.
    pub fn patterns_at_stop(&self, stop_idx: u32) -> &[u32] {
        &self.stop_to_patterns[stop_idx as usize]
    }

    /// `transfersFrom(s)`.
    pub fn transfers_from(&self, stop_idx: u32) -> impl Iterator<Item = &Transfer> {
        self.transfers_from[stop_idx as usize]
            .iter()
            .map(|idx| &self.transfers[*idx as usize])
    }

    /// `transfersTo(s)`, for reverse search.
    pub fn transfers_to(&self, stop_idx: u32) -> impl Iterator<Item = &Transfer> {
        self.transfers_to[stop_idx as usize]
            .iter()
            .map(|idx| &self.transfers[*idx as usize])
    }

    /// Efficiently retrieves the stop-time slice for a specific trip, O(1).
    pub fn stop_times_by_trip_idx(&self, trip_idx: u32) -> &[StopTime] {
        let slice = self.trip_to_stop_slice[trip_idx as usize];
        let start = slice.start_idx as usize;
        let end = start + slice.count as usize;
        &self.stop_times[start..end]
    }

    /// Spatial query: all stops within `distance` of `coordinate`, via the grid-cell index.
    pub fn stops_by_coordinate(&self, coordinate: &Coordinate, distance: Distance) -> Vec<&Stop> {
        use crate::shared::geo::AVERAGE_STOP_DISTANCE;
        let reach = (distance / AVERAGE_STOP_DISTANCE).as_meters().ceil().abs() as i32;
        let (origin_x, origin_y) = coordinate.to_cell();
        (-reach..=reach)
            .into_par_iter()
            .flat_map(|x| {
                (-reach..=reach)
                    .flat_map(move |y| {
                        let cell = (origin_x + x, origin_y + y);
                        self.stop_distance_lookup
                            .get(&cell)
                            .map(|stop_idxs| {
                                stop_idxs
                                    .iter()
                                    .filter_map(|stop_idx| {
                                        let stop = &self.stops[*stop_idx as usize];
                                        if stop.coordinate.network_distance(coordinate) <= distance
                                        {
                                            Some(stop)
                                        } else {
                                            None
                                        }
                                    })
                                    .collect::<Vec<_>>()
                            })
                            .unwrap_or_default()
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

/// Mutable builder state used only during loading; discarded once
/// [`source::gtfs::load_gtfs`] finishes assembling the immutable [`Repository`].
#[derive(Default)]
pub(crate) struct RepositoryBuilder {
    pub stops: Vec<Stop>,
    pub routes: Vec<Route>,
    pub raptor_routes: Vec<RaptorRoute>,
    pub trips: Vec<Trip>,
    pub stop_times: Vec<StopTime>,
    pub transfers: Vec<Transfer>,
    pub stop_lookup: HashMap<Arc<str>, u32>,
    pub trip_lookup: HashMap<Arc<str>, u32>,
    pub route_lookup: HashMap<Arc<str>, u32>,
}

impl RepositoryBuilder {
    pub(crate) fn build(self, config: Config) -> Repository {
        let stop_count = self.stops.len();
        let trip_count = self.trips.len();

        let mut stop_distance_lookup: HashMap<Cell, Vec<u32>> = HashMap::new();
        for stop in &self.stops {
            stop_distance_lookup
                .entry(stop.coordinate.to_cell())
                .or_default()
                .push(stop.index);
        }

        let mut stop_to_patterns: Vec<Vec<u32>> = vec![Vec::new(); stop_count];
        for route in &self.raptor_routes {
            for &stop_idx in route.stops.iter() {
                let bucket = &mut stop_to_patterns[stop_idx as usize];
                if !bucket.contains(&route.index) {
                    bucket.push(route.index);
                }
            }
        }

        let mut transfers_from: Vec<Vec<u32>> = vec![Vec::new(); stop_count];
        let mut transfers_to: Vec<Vec<u32>> = vec![Vec::new(); stop_count];
        for (idx, transfer) in self.transfers.iter().enumerate() {
            transfers_from[transfer.from_stop_idx as usize].push(idx as u32);
            transfers_to[transfer.to_stop_idx as usize].push(idx as u32);
        }

        // stop_times is already laid out contiguously per trip by the loader
        // (sorted by (trip_idx, sequence)); derive O(1) slices from run lengths.
        let mut trip_to_stop_slice = vec![StopTimeSlice::default(); trip_count];
        let mut i = 0usize;
        while i < self.stop_times.len() {
            let trip_idx = self.stop_times[i].trip_idx;
            let start = i;
            while i < self.stop_times.len() && self.stop_times[i].trip_idx == trip_idx {
                i += 1;
            }
            trip_to_stop_slice[trip_idx as usize] = StopTimeSlice {
                start_idx: start as u32,
                count: (i - start) as u32,
            };
        }

        Repository {
            stops: self.stops.into_boxed_slice(),
            routes: self.routes.into_boxed_slice(),
            raptor_routes: self.raptor_routes.into_boxed_slice(),
            trips: self.trips.into_boxed_slice(),
            stop_times: self.stop_times.into_boxed_slice(),
            transfers: self.transfers.into_boxed_slice(),
            config,
            stop_lookup: self.stop_lookup,
            trip_lookup: self.trip_lookup,
            route_lookup: self.route_lookup,
            stop_distance_lookup: stop_distance_lookup
                .into_iter()
                .map(|(k, v)| (k, v.into_boxed_slice()))
                .collect(),
            stop_to_patterns: stop_to_patterns
                .into_iter()
                .map(Vec::into_boxed_slice)
                .collect(),
            transfers_from: transfers_from
                .into_iter()
                .map(Vec::into_boxed_slice)
                .collect(),
            transfers_to: transfers_to.into_iter().map(Vec::into_boxed_slice).collect(),
            trip_to_stop_slice: trip_to_stop_slice.into_boxed_slice(),
        }
    }
}
