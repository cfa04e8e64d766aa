use crate::{
    raptor::{
        Allocator, LazyBuffer,
        discovery::{get_arrival_time, get_departure_time},
        state::{Parent, Update},
        trip_search::find_boardable_trip,
    },
    repository::Repository,
    shared::time,
};
use rayon::prelude::*;

/// Phase A (§4.5): scans every active pattern exactly once. Walks forward
/// from the earliest marked position, alighting the currently boarded trip
/// wherever it improves a stop and (re)boarding the earliest catchable trip
/// at every boardable position — the teacher's `explore_routes` Part A/Part B
/// split, now carrying per-mode board/alight slack.
///
/// `window_deadline`, when `Some`, additionally bounds the very first
/// boarding (round 0, i.e. straight off an access record) to depart before
/// `t0 + searchWindow` (§4.5 "Search window" / scenario S6): a board whose
/// departure falls outside the window is treated as not found.
pub(crate) fn explore_routes(
    repository: &Repository,
    allocator: &mut Allocator,
    is_first_round: bool,
    window_deadline: Option<crate::shared::Time>,
) {
    let updates = allocator
        .active_mask
        .iter_ones()
        .par_bridge()
        .map_init(
            || LazyBuffer::new(32),
            |buffer, route_idx| {
                let p_idx = allocator.active[route_idx];
                let route = &repository.raptor_routes[route_idx];
                let board_slack = repository.config.board_slack[route.slack_index];
                let alight_slack = repository.config.alight_slack[route.slack_index];

                let mut active_trip: Option<u32> = None;
                let mut active_trip_pos: Option<usize> = None;
                let mut boarding_stop: u32 = u32::MAX;
                let mut boarding_pos: usize = usize::MAX;
                let mut boarding_departure = time::MAX;

                for i in p_idx as usize..route.num_stops() {
                    let stop_idx = route.stop_at(i);

                    // Part A: alight the currently boarded trip if it improves this stop.
                    if let Some(trip_idx) = active_trip
                        && route.can_alight_at(i)
                    {
                        let arrival_time = get_arrival_time(repository, trip_idx, i) + alight_slack;
                        if arrival_time < allocator.best_arrival[stop_idx as usize].unwrap_or(time::MAX)
                            && arrival_time < allocator.target.bound
                        {
                            buffer.push(Update::new(
                                stop_idx,
                                arrival_time,
                                Parent::new_transit(
                                    boarding_stop,
                                    stop_idx,
                                    route.index,
                                    trip_idx,
                                    boarding_pos as u32,
                                    i as u32,
                                    boarding_departure,
                                    arrival_time,
                                ),
                            ));
                        }
                    }

                    // Part B: (re)board the earliest catchable trip, if any improves on
                    // the one we are currently riding (or we are not riding one yet).
                    if route.can_board_at(i)
                        && let Some(prev_label) = allocator.prev_labels[stop_idx as usize]
                    {
                        let earliest_board_time = prev_label + board_slack;
                        if let Some(result) =
                            find_boardable_trip(repository, route, i, earliest_board_time, active_trip_pos)
                        {
                            let departure = get_departure_time(repository, result.trip_idx, i);
                            if !is_first_round || window_deadline.is_none_or(|deadline| departure < deadline) {
                                active_trip = Some(result.trip_idx);
                                active_trip_pos = Some(result.trip_pos);
                                boarding_stop = stop_idx;
                                boarding_pos = i;
                                boarding_departure = departure;
                            }
                        }
                    }
                }
                buffer.swap()
            },
        )
        .flatten();
    allocator.updates.par_extend(updates);
}

/// Phase B (§4.5): applies foot transfers from every stop improved by Phase A
/// of the current round (`marked_stops` is cleared before Phase A runs, so
/// this only ever sees current-round improvements — a transfer can never
/// originate from a stop that wasn't just boarded into). Consolidated onto
/// a single `transfersFrom` table; the teacher's separate `stop_to_walk_stop`
/// nearby-stop mechanism is folded into generated walk transfers at load
/// time (§3 Transfer consolidation).
pub(crate) fn explore_transfers(repository: &Repository, allocator: &mut Allocator) {
    let transfer_slack = repository.config.transfer_slack;
    let updates = allocator
        .marked_stops
        .iter_ones()
        .par_bridge()
        .map_init(
            || LazyBuffer::<Update>::new(32),
            |buffer, stop_idx| {
                let departure_time = allocator.curr_labels[stop_idx].unwrap_or(time::MAX);
                repository.transfers_from(stop_idx as u32).for_each(|transfer| {
                    let arrival_time = departure_time
                        + crate::shared::Duration::from_seconds(transfer.duration_sec)
                        + transfer_slack;
                    if arrival_time < allocator.best_arrival[transfer.to_stop_idx as usize].unwrap_or(time::MAX)
                        && arrival_time < allocator.target.bound
                    {
                        buffer.push(Update::new(
                            transfer.to_stop_idx,
                            arrival_time,
                            Parent::new_transfer(stop_idx as u32, transfer.to_stop_idx, departure_time, arrival_time),
                        ));
                    }
                });
                buffer.swap()
            },
        )
        .flatten();
    allocator.updates.par_extend(updates);
}
