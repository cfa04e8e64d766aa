//! Trip Search (C5): per-pattern lookup of the earliest catchable trip at a
//! given in-pattern position (§4.4).
//!
//! Replaces the teacher's linear `find_earliest_trip` scan (`raptor::discovery`)
//! with `slice::partition_point` — the same binary-search idiom
//! `cascade-core::graph::calculate_delay` already uses via
//! `trips.binary_search_by(...)`. Trips within a pattern are sorted by first
//! departure and FIFO holds (checked at load time), so departures at any
//! fixed position are monotonic in trip order too.

use crate::{
    raptor::discovery::{get_arrival_time, get_departure_time},
    repository::{RaptorRoute, Repository},
    shared::Time,
};

/// Result of a trip search: a plain value type (§4.4), avoiding the
/// "flyweight boarding event" object the teacher's source framework used.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BoardResult {
    pub trip_idx: u32,
    /// Position of `trip_idx` within `route.trips`, used as the next search's `limit`.
    pub trip_pos: usize,
}

/// Smallest `tripIndex` with `departure(tripIndex, position) >= earliest_board_time`
/// and `position-in-pattern <= limit` (or unbounded if `limit` is `None`).
pub(crate) fn find_boardable_trip(
    repository: &Repository,
    route: &RaptorRoute,
    position: usize,
    earliest_board_time: Time,
    limit: Option<usize>,
) -> Option<BoardResult> {
    if route.trips.is_empty() {
        return None;
    }
    let limit = limit.unwrap_or(route.trips.len() - 1).min(route.trips.len() - 1);
    let candidates = &route.trips[..=limit];
    let idx = candidates
        .partition_point(|&trip_idx| get_departure_time(repository, trip_idx, position) < earliest_board_time);
    (idx <= limit).then(|| BoardResult {
        trip_idx: candidates[idx],
        trip_pos: idx,
    })
}

/// Reverse-direction counterpart named by §4.4: largest `tripIndex` with
/// `arrival(tripIndex, position) <= latest_alight_time`. The forward-only
/// engine never calls this (no LDT search, per the Non-goals), but the
/// component is specified independently of which direction the core uses.
#[allow(dead_code)]
pub(crate) fn find_alightable_trip(
    repository: &Repository,
    route: &RaptorRoute,
    position: usize,
    latest_alight_time: Time,
) -> Option<BoardResult> {
    if route.trips.is_empty() {
        return None;
    }
    let idx = route
        .trips
        .partition_point(|&trip_idx| get_arrival_time(repository, trip_idx, position) <= latest_alight_time);
    (idx > 0).then(|| BoardResult {
        trip_idx: route.trips[idx - 1],
        trip_pos: idx - 1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{Repository, RepositoryBuilder};
    use std::sync::Arc;

    fn fixture() -> Repository {
        // Single pattern A->B with three trips departing 09:00, 09:10, 09:20 at position 0.
        let mut builder = RepositoryBuilder::default();
        for (i, id) in ["A", "B"].iter().enumerate() {
            builder.stops.push(crate::repository::Stop {
                index: i as u32,
                id: Arc::from(*id),
                name: Arc::from(*id),
                coordinate: Default::default(),
            });
            builder.stop_lookup.insert(Arc::from(*id), i as u32);
        }
        builder.routes.push(crate::repository::Route {
            index: 0,
            id: Arc::from("R1"),
            short_name: Some(Arc::from("R1")),
            long_name: None,
            route_type: 3,
        });

        let deps = [9 * 3600, 9 * 3600 + 600, 9 * 3600 + 1200];
        let mut trip_idxs = Vec::new();
        for (t, dep) in deps.iter().enumerate() {
            builder.trips.push(crate::repository::Trip {
                index: t as u32,
                id: Arc::from(format!("T{t}")),
                route_idx: 0,
                raptor_route_idx: 0,
                headsign: None,
            });
            trip_idxs.push(t as u32);
            let start = builder.stop_times.len() as u32;
            builder.stop_times.push(crate::repository::StopTime {
                trip_idx: t as u32,
                stop_idx: 0,
                sequence: 0,
                arrival_time: Time::from_seconds(*dep),
                departure_time: Time::from_seconds(*dep),
                pickup_type: Default::default(),
                drop_off_type: Default::default(),
            });
            builder.stop_times.push(crate::repository::StopTime {
                trip_idx: t as u32,
                stop_idx: 1,
                sequence: 1,
                arrival_time: Time::from_seconds(*dep + 600),
                departure_time: Time::from_seconds(*dep + 600),
                pickup_type: Default::default(),
                drop_off_type: Default::default(),
            });
            let _ = start;
        }
        let (can_board, can_alight) = crate::repository::RaptorRoute::default_access_masks(2);
        builder.raptor_routes.push(crate::repository::RaptorRoute {
            index: 0,
            route_idx: 0,
            tag: Arc::from("R1 (2 stops)"),
            stops: Arc::from([0u32, 1u32]),
            trips: Arc::from(trip_idxs),
            slack_index: crate::config::SLACK_BUS,
            can_board,
            can_alight,
        });

        builder.build(crate::config::Config::default())
    }

    /// S2: trip search boundary.
    #[test]
    fn trip_search_boundary() {
        let repository = fixture();
        let route = &repository.raptor_routes[0];

        let result = find_boardable_trip(&repository, route, 0, Time::from_seconds(9 * 3600 + 300), None).unwrap();
        assert_eq!(result.trip_idx, 1);

        let result = find_boardable_trip(&repository, route, 0, Time::from_seconds(9 * 3600), None).unwrap();
        assert_eq!(result.trip_idx, 0);

        let result = find_boardable_trip(&repository, route, 0, Time::from_seconds(9 * 3600 + 1260), None);
        assert!(result.is_none());
    }

    /// P5: trip-search monotonicity.
    #[test]
    fn trip_search_is_monotonic() {
        let repository = fixture();
        let route = &repository.raptor_routes[0];
        let mut last = None;
        for t_eb in [0, 9 * 3600 - 60, 9 * 3600, 9 * 3600 + 300, 9 * 3600 + 900] {
            let found = find_boardable_trip(&repository, route, 0, Time::from_seconds(t_eb), None);
            if let (Some(prev), Some(found)) = (last, found) {
                assert!(found.trip_idx >= prev);
            }
            last = found.map(|r| r.trip_idx);
        }
    }
}
