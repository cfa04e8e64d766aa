use crate::{
    raptor::Allocator,
    repository::{RaptorRoute, Repository},
    shared::Time,
};

pub(crate) struct ServingRoute {
    pub route_idx: u32,
    pub idx_in_route: u32,
}

/// Populates `allocator.routes_serving_stops` with every pattern serving
/// `stop_idx` via `patternsAtStop(s)`, paired with the stop's position in
/// that pattern (§4.5 Phase A's `Q` set construction).
pub(crate) fn routes_serving_stop(repository: &Repository, stop_idx: u32, allocator: &mut Allocator) {
    allocator.routes_serving_stops.clear();
    allocator.routes_serving_stops.extend(
        repository
            .patterns_at_stop(stop_idx)
            .iter()
            .filter_map(|route_idx| {
                let route = &repository.raptor_routes[*route_idx as usize];
                index_in_route(route, stop_idx).map(|idx_in_route| ServingRoute {
                    route_idx: route.index,
                    idx_in_route,
                })
            }),
    )
}

pub(crate) fn index_in_route(route: &RaptorRoute, stop_idx: u32) -> Option<u32> {
    route.stops.iter().position(|&s| s == stop_idx).map(|i| i as u32)
}

pub(crate) fn get_arrival_time(repository: &Repository, trip_idx: u32, index: usize) -> Time {
    repository.stop_times_by_trip_idx(trip_idx)[index].arrival_time
}

pub(crate) fn get_departure_time(repository: &Repository, trip_idx: u32, index: usize) -> Time {
    repository.stop_times_by_trip_idx(trip_idx)[index].departure_time
}
