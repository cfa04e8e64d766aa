//! Round-based transit search (C6, §4.5) plus its supporting Trip Search
//! (C5, §4.4) and Path Reconstruction (C7, §4.7) components.
//!
//! Forward-only: a single departure-time constraint, no bidirectional or
//! latest-departure-time search (Non-goals). Coordinates are never seen
//! here — the caller resolves them to [`crate::access::AccessCandidate`]
//! lists via the Access/Egress Resolver (C4) before calling [`solve`].

mod allocator;
mod discovery;
mod explorer;
mod itinerary;
mod path;
mod state;
mod trip_search;

pub use allocator::Allocator;
pub use itinerary::{Itinerary, Leg};

use crate::{
    access::AccessCandidate,
    error::Error,
    repository::Repository,
    shared::Time,
};
use discovery::routes_serving_stop;
use explorer::{explore_routes, explore_transfers};
use path::backtrack;
use std::mem;
use std::time::Instant;
use tracing::warn;

/// Runs a forward RAPTOR search from `access` candidates to `egress`
/// candidates departing no earlier than `departure`, allocating its own
/// working memory. Prefer [`solve_with_allocator`] when running many
/// searches back to back (§5 "Resource Model"). `deadline` is an optional
/// wall-clock cutoff, checked once per round (§7's cancellation contract).
pub fn solve(
    repository: &Repository,
    access: &[AccessCandidate],
    egress: &[AccessCandidate],
    departure: Time,
    deadline: Option<Instant>,
) -> Result<Itinerary, Error> {
    let mut allocator = Allocator::new(repository);
    solve_with_allocator(repository, &mut allocator, access, egress, departure, deadline)
}

/// Same as [`solve`] but reuses a caller-supplied [`Allocator`], avoiding a
/// fresh set of heap allocations per query.
pub fn solve_with_allocator(
    repository: &Repository,
    allocator: &mut Allocator,
    access: &[AccessCandidate],
    egress: &[AccessCandidate],
    departure: Time,
    deadline: Option<Instant>,
) -> Result<Itinerary, Error> {
    allocator.reset();

    if access.is_empty() {
        return Err(Error::NoAccess);
    }
    if egress.is_empty() {
        return Err(Error::NoEgress);
    }

    let window_deadline = departure + repository.config.search_window;

    // Round 0: seed `roundArrival[0]` straight from the access candidates.
    // No `Parent` is recorded for this leg; `access_duration` recalls it for
    // `Itinerary::assemble`.
    let mut access_by_stop = vec![None; repository.stops.len()];
    for candidate in access {
        let arrival = departure + candidate.duration;
        let stop_idx = candidate.stop_idx as usize;
        if arrival < allocator.best_arrival[stop_idx].unwrap_or(crate::shared::time::MAX) {
            allocator.best_arrival[stop_idx] = Some(arrival);
            allocator.curr_labels[stop_idx] = Some(arrival);
            allocator.access_duration[stop_idx] = Some(candidate.duration);
            allocator.marked_stops.set(stop_idx, true);
            access_by_stop[stop_idx] = Some(*candidate);
        }
    }

    allocator.target.egress = egress.iter().map(|c| (c.stop_idx, c.duration)).collect();
    update_target_bound(allocator, None);

    let mut timed_out = false;
    let mut round: usize = 0;
    loop {
        if round >= allocator.max_rounds {
            warn!("Hit round limit!");
            break;
        }
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            warn!("{}", Error::Timeout);
            timed_out = true;
            break;
        }
        allocator.swap_labels();

        if allocator.marked_stops.not_any() {
            break;
        }

        let mut marked_stops = mem::take(&mut allocator.marked_stops);
        allocator.active.fill(u32::MAX);
        allocator.active_mask.fill(false);
        marked_stops.iter_ones().for_each(|stop_idx| {
            // Only explore each pattern once per round, from the earliest
            // marked stop within it (§4.5 Phase A's `Q` set construction).
            routes_serving_stop(repository, stop_idx as u32, allocator);
            for route in allocator.routes_serving_stops.iter() {
                let r_idx = route.route_idx as usize;
                let p_idx_to_beat = allocator.active[r_idx];
                if route.idx_in_route < p_idx_to_beat {
                    allocator.active[r_idx] = route.idx_in_route;
                    allocator.active_mask.set(r_idx, true);
                }
            }
        });

        marked_stops.fill(false);
        allocator.marked_stops = mem::take(&mut marked_stops);

        explore_routes(repository, allocator, round == 0, Some(window_deadline));
        allocator.run_updates(round);

        explore_transfers(repository, allocator);
        allocator.run_updates(round);

        update_target_bound(allocator, Some(round));
        round += 1;
    }

    let Some(target_stop) = allocator.target.best_stop else {
        return Err(if timed_out { Error::Timeout } else { Error::NoPath });
    };

    let egress_candidate = egress
        .iter()
        .find(|c| c.stop_idx == target_stop)
        .ok_or(Error::DataInvariantViolation("egress target stop vanished".into()))?;

    let path = match allocator.target.best_round {
        Some(round) => backtrack(repository, allocator, target_stop, round),
        None => Vec::new(),
    };

    let access_candidate = match path.first() {
        Some(first_leg) => access_by_stop[first_leg.from_stop as usize],
        None => access_by_stop[target_stop as usize],
    }
    .ok_or(Error::DataInvariantViolation("access origin stop vanished".into()))?;

    Ok(Itinerary::assemble(repository, &access_candidate, &path, egress_candidate, departure))
}

/// Refreshes `bestArrivalAtAnyEgress` (target-stop pruning bound, §4.5) after
/// seeding and after every round. `round = None` marks a direct access match
/// with no transit leg (`Target::best_round` stays `None`, per §4.7).
fn update_target_bound(allocator: &mut Allocator, round: Option<usize>) {
    let egress = mem::take(&mut allocator.target.egress);
    for &(stop_idx, walk_duration) in &egress {
        let Some(arrival) = allocator.best_arrival[stop_idx as usize] else {
            continue;
        };
        let candidate = arrival + walk_duration;
        if candidate < allocator.target.bound {
            allocator.target.bound = candidate;
            allocator.target.best_stop = Some(stop_idx);
            allocator.target.best_round = round;
        }
    }
    allocator.target.egress = egress;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{Config, SLACK_BUS},
        repository::{RaptorRoute, RepositoryBuilder, Route, Stop, StopTime, Trip},
        shared::Distance,
    };
    use std::sync::Arc;

    fn stop(builder: &mut RepositoryBuilder, id: &str) -> u32 {
        let index = builder.stops.len() as u32;
        builder.stops.push(Stop {
            index,
            id: Arc::from(id),
            name: Arc::from(id),
            coordinate: Default::default(),
        });
        builder.stop_lookup.insert(Arc::from(id), index);
        index
    }

    /// Adds a single-trip pattern over `stops`, departing/arriving at the
    /// given (stop_idx, time_sec) pairs, on a fresh bus route.
    fn pattern(builder: &mut RepositoryBuilder, route_id: &str, timetable: &[(u32, u32)]) {
        let route_idx = builder.routes.len() as u32;
        builder.routes.push(Route {
            index: route_idx,
            id: Arc::from(route_id),
            short_name: Some(Arc::from(route_id)),
            long_name: None,
            route_type: 3,
        });

        let trip_idx = builder.trips.len() as u32;
        let raptor_route_idx = builder.raptor_routes.len() as u32;
        builder.trips.push(Trip {
            index: trip_idx,
            id: Arc::from(format!("{route_id}-T0")),
            route_idx,
            raptor_route_idx,
            headsign: None,
        });

        let stops: Vec<u32> = timetable.iter().map(|&(s, _)| s).collect();
        for (sequence, &(stop_idx, time_sec)) in timetable.iter().enumerate() {
            builder.stop_times.push(StopTime {
                trip_idx,
                stop_idx,
                sequence: sequence as u32,
                arrival_time: Time::from_seconds(time_sec),
                departure_time: Time::from_seconds(time_sec),
                pickup_type: Default::default(),
                drop_off_type: Default::default(),
            });
        }

        let (can_board, can_alight) = RaptorRoute::default_access_masks(stops.len());
        builder.raptor_routes.push(RaptorRoute {
            index: raptor_route_idx,
            route_idx,
            tag: Arc::from(format!("{route_id} ({} stops)", stops.len())),
            stops: stops.into(),
            trips: Arc::from([trip_idx]),
            slack_index: SLACK_BUS,
            can_board,
            can_alight,
        });
    }

    fn zero_walk(stop_idx: u32) -> AccessCandidate {
        AccessCandidate {
            stop_idx,
            duration: crate::shared::Duration::from_seconds(0),
            distance: Distance::from_meters(0.0),
        }
    }

    /// S3: one-boarding route, A -> B -> C on a single trip 09:00/09:10/09:20.
    #[test]
    fn one_boarding_route() {
        let mut builder = RepositoryBuilder::default();
        let a = stop(&mut builder, "A");
        let b = stop(&mut builder, "B");
        let c = stop(&mut builder, "C");
        pattern(&mut builder, "R1", &[(a, 9 * 3600), (b, 9 * 3600 + 600), (c, 9 * 3600 + 1200)]);
        let repository = builder.build(Config::default());

        let access = [zero_walk(a)];
        let egress = [zero_walk(c)];
        let departure = Time::from_seconds(8 * 3600 + 55 * 60);

        let itinerary = solve(&repository, &access, &egress, departure, None).expect("should find a path");
        assert_eq!(itinerary.legs.len(), 3);
        assert!(matches!(itinerary.legs[0], Leg::Walk { seconds: 0, .. }));
        assert!(matches!(itinerary.legs[2], Leg::Walk { seconds: 0, .. }));
        match &itinerary.legs[1] {
            Leg::Transit { board_stop, alight_stop, board_sec, alight_sec, .. } => {
                assert_eq!(*board_stop, a);
                assert_eq!(*alight_stop, c);
                assert_eq!(*board_sec, 9 * 3600);
                let alight_slack = Config::default().alight_slack[SLACK_BUS].as_seconds();
                assert_eq!(*alight_sec, 9 * 3600 + 1200 + alight_slack);
            }
            other => panic!("expected a transit leg, got {other:?}"),
        }
        assert_eq!(itinerary.transfer_count, 0);
    }

    /// S4: transfer required. P1 A->B 09:00->09:05, P2 B->C 09:10->09:20, a
    /// same-stop reboard with no foot transfer in between still counts as
    /// one transfer.
    #[test]
    fn transfer_required() {
        let mut builder = RepositoryBuilder::default();
        let a = stop(&mut builder, "A");
        let b = stop(&mut builder, "B");
        let c = stop(&mut builder, "C");
        pattern(&mut builder, "P1", &[(a, 9 * 3600), (b, 9 * 3600 + 300)]);
        pattern(&mut builder, "P2", &[(b, 9 * 3600 + 600), (c, 9 * 3600 + 1200)]);
        let repository = builder.build(Config::default());

        let access = [zero_walk(a)];
        let egress = [zero_walk(c)];
        let departure = Time::from_seconds(8 * 3600 + 55 * 60);

        let itinerary = solve(&repository, &access, &egress, departure, None).expect("should find a path");
        let transit_legs: Vec<_> = itinerary
            .legs
            .iter()
            .filter(|leg| matches!(leg, Leg::Transit { .. }))
            .collect();
        assert_eq!(transit_legs.len(), 2);
        assert_eq!(itinerary.transfer_count, 1);
    }

    /// S5: no path. Two disjoint patterns with no shared or nearby stop.
    #[test]
    fn no_path_when_disjoint() {
        let mut builder = RepositoryBuilder::default();
        let a = stop(&mut builder, "A");
        let b = stop(&mut builder, "B");
        let c = stop(&mut builder, "C");
        let d = stop(&mut builder, "D");
        pattern(&mut builder, "P1", &[(a, 9 * 3600), (b, 9 * 3600 + 300)]);
        pattern(&mut builder, "P2", &[(c, 9 * 3600), (d, 9 * 3600 + 300)]);
        let repository = builder.build(Config::default());

        let access = [zero_walk(a)];
        let egress = [zero_walk(d)];
        let departure = Time::from_seconds(8 * 3600 + 55 * 60);

        let result = solve(&repository, &access, &egress, departure, None);
        assert!(matches!(result, Err(crate::error::Error::NoPath)));
    }

    /// S6: search-window filtering. A single trip departs well outside the
    /// [departure, departure + SEARCH_WINDOW_SECONDS) boarding deadline.
    #[test]
    fn search_window_excludes_late_boarding() {
        let mut builder = RepositoryBuilder::default();
        let a = stop(&mut builder, "A");
        let b = stop(&mut builder, "B");
        pattern(&mut builder, "P1", &[(a, 10 * 3600), (b, 10 * 3600 + 300)]);
        let mut config = Config::default();
        config.search_window = crate::shared::Duration::from_seconds(900);
        let repository = builder.build(config);

        let access = [zero_walk(a)];
        let egress = [zero_walk(b)];
        let departure = Time::from_seconds(9 * 3600);

        let result = solve(&repository, &access, &egress, departure, None);
        assert!(matches!(result, Err(crate::error::Error::NoPath)));
    }

    /// An already-elapsed deadline stops the search before any round runs,
    /// yielding `Timeout` rather than `NoPath` when no bound was ever met.
    #[test]
    fn elapsed_deadline_returns_timeout() {
        let mut builder = RepositoryBuilder::default();
        let a = stop(&mut builder, "A");
        let b = stop(&mut builder, "B");
        pattern(&mut builder, "P1", &[(a, 9 * 3600), (b, 9 * 3600 + 300)]);
        let repository = builder.build(Config::default());

        let access = [zero_walk(a)];
        let egress = [zero_walk(b)];
        let departure = Time::from_seconds(8 * 3600 + 55 * 60);

        let result = solve(&repository, &access, &egress, departure, Some(std::time::Instant::now()));
        assert!(matches!(result, Err(crate::error::Error::Timeout)));
    }
}
