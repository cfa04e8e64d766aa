//! Builds an immutable [`Repository`] from a streaming [`crate::gtfs::Gtfs`] feed.
//!
//! Grounded on the teacher's own `repository/source/gtfs.rs` pipeline shape
//! (one `load_*` stage per table, each timed and logged via `tracing`), with
//! `dashmap` used for the same parallel grouping role the teacher reaches for
//! when bucketing stop-times and trips by a shared key.

use std::{sync::Arc, time::Instant};

use dashmap::DashMap;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    config::Config,
    gtfs::Gtfs,
    repository::{
        RaptorRoute, Repository, RepositoryBuilder, Route, Stop, StopAccessType, StopTime,
        Transfer, Trip,
    },
    shared::{Coordinate, Time},
};

#[derive(Error, Debug)]
pub enum Error {
    #[error("gtfs read error: {0}")]
    Gtfs(#[from] crate::gtfs::Error),
}

struct RawTrip {
    route_id: String,
    headsign: Option<String>,
}

struct RawStopTime {
    sequence: u32,
    arrival_time: Time,
    departure_time: Time,
    stop_id: String,
    pickup_type: StopAccessType,
    drop_off_type: StopAccessType,
}

impl Repository {
    /// Loads a whole GTFS feed into a fresh, immutable [`Repository`].
    pub fn load_gtfs(mut gtfs: Gtfs, config: Config) -> Result<Self, self::Error> {
        let mut builder = RepositoryBuilder::default();
        let mut rejected_records = 0usize;

        load_stops(&mut gtfs, &mut builder)?;
        load_routes(&mut gtfs, &mut builder)?;

        let raw_trips = load_trips(&mut gtfs, &mut builder)?;
        let (raw_stop_times, rejected) = load_stop_times(&mut gtfs)?;
        rejected_records += rejected;

        rejected_records += resolve_trips(&mut builder, raw_trips);
        rejected_records += resolve_stop_times(&mut builder, raw_stop_times);

        generate_raptor_routes(&mut builder);
        rejected_records += load_transfers(&mut gtfs, &mut builder, &config)?;
        generate_walk_transfers(&mut builder, &config);

        debug!("Load stage finished with {} rejected records", rejected_records);
        Ok(builder.build(config))
    }
}

fn load_stops(gtfs: &mut Gtfs, builder: &mut RepositoryBuilder) -> Result<(), self::Error> {
    let now = Instant::now();
    gtfs.stream_stops(|(i, record)| {
        let id: Arc<str> = record.stop_id.into();
        builder.stop_lookup.insert(id.clone(), i as u32);
        builder.stops.push(Stop {
            index: i as u32,
            id,
            name: record.stop_name.into(),
            coordinate: Coordinate {
                latitude: record.stop_lat,
                longitude: record.stop_lon,
            },
        });
    })?;
    debug!("Loaded {} stops in {:?}", builder.stops.len(), now.elapsed());
    Ok(())
}

fn load_routes(gtfs: &mut Gtfs, builder: &mut RepositoryBuilder) -> Result<(), self::Error> {
    let now = Instant::now();
    gtfs.stream_routes(|(i, record)| {
        let id: Arc<str> = record.route_id.into();
        builder.route_lookup.insert(id.clone(), i as u32);
        builder.routes.push(Route {
            index: i as u32,
            id,
            short_name: record.route_short_name.map(Into::into),
            long_name: record.route_long_name.map(Into::into),
            route_type: record.route_type,
        });
    })?;
    debug!("Loaded {} routes in {:?}", builder.routes.len(), now.elapsed());
    Ok(())
}

/// First pass over `trips.txt`: assigns a dense `Trip.index` and records the
/// raw `route_id` string for resolution once all routes are known.
fn load_trips(
    gtfs: &mut Gtfs,
    builder: &mut RepositoryBuilder,
) -> Result<Vec<(u32, RawTrip)>, self::Error> {
    let now = Instant::now();
    let mut raw = Vec::new();
    gtfs.stream_trips(|(i, record)| {
        let id: Arc<str> = record.trip_id.into();
        builder.trip_lookup.insert(id.clone(), i as u32);
        builder.trips.push(Trip {
            index: i as u32,
            id,
            route_idx: u32::MAX,
            raptor_route_idx: u32::MAX,
            headsign: None,
        });
        raw.push((
            i as u32,
            RawTrip {
                route_id: record.route_id,
                headsign: record.trip_headsign,
            },
        ));
    })?;
    debug!("Loaded {} trips in {:?}", builder.trips.len(), now.elapsed());
    Ok(raw)
}

fn resolve_trips(builder: &mut RepositoryBuilder, raw_trips: Vec<(u32, RawTrip)>) -> usize {
    let mut rejected = 0usize;
    for (trip_idx, raw) in raw_trips {
        let Some(&route_idx) = builder.route_lookup.get(raw.route_id.as_str()) else {
            warn!(
                "Trip {} references unknown route {} — dropped",
                trip_idx, raw.route_id
            );
            rejected += 1;
            continue;
        };
        let trip = &mut builder.trips[trip_idx as usize];
        trip.route_idx = route_idx;
        trip.headsign = raw.headsign.map(Into::into);
    }
    rejected
}

/// First pass over `stop_times.txt`, grouped concurrently by `trip_id` via
/// `DashMap` (the same role the teacher's loader uses it for).
fn load_stop_times(gtfs: &mut Gtfs) -> Result<(DashMap<String, Vec<RawStopTime>>, usize), self::Error> {
    let now = Instant::now();
    let grouped: DashMap<String, Vec<RawStopTime>> = DashMap::new();
    let mut count = 0usize;
    let mut rejected = 0usize;
    gtfs.stream_stop_times(|(_, record)| {
        count += 1;
        let Some(arrival_time) = Time::from_hms(&record.arrival_time) else {
            warn!("Stop time with unparseable arrival_time dropped");
            rejected += 1;
            return;
        };
        let Some(departure_time) = Time::from_hms(&record.departure_time) else {
            warn!("Stop time with unparseable departure_time dropped");
            rejected += 1;
            return;
        };
        grouped.entry(record.trip_id).or_default().push(RawStopTime {
            sequence: record.stop_sequence,
            arrival_time,
            departure_time,
            stop_id: record.stop_id,
            pickup_type: StopAccessType::from_gtfs_code(record.pickup_type.unwrap_or(0)),
            drop_off_type: StopAccessType::from_gtfs_code(record.drop_off_type.unwrap_or(0)),
        });
    })?;
    debug!("Loaded {} raw stop times in {:?}", count, now.elapsed());
    Ok((grouped, rejected))
}

fn resolve_stop_times(builder: &mut RepositoryBuilder, grouped: DashMap<String, Vec<RawStopTime>>) -> usize {
    let now = Instant::now();
    let mut flattened: Vec<StopTime> = Vec::new();
    let mut rejected = 0usize;
    for (trip_id, mut times) in grouped {
        let Some(&trip_idx) = builder.trip_lookup.get(trip_id.as_str()) else {
            warn!("Stop times reference unknown trip {} — dropped", trip_id);
            rejected += times.len();
            continue;
        };
        times.par_sort_unstable_by_key(|st| st.sequence);
        for raw in times {
            let Some(&stop_idx) = builder.stop_lookup.get(raw.stop_id.as_str()) else {
                warn!("Stop time references unknown stop {} — dropped", raw.stop_id);
                rejected += 1;
                continue;
            };
            if raw.arrival_time > raw.departure_time {
                warn!(
                    "Stop time at trip {} violates arrival <= departure — dropped",
                    trip_id
                );
                rejected += 1;
                continue;
            }
            flattened.push(StopTime {
                trip_idx,
                stop_idx,
                sequence: raw.sequence,
                arrival_time: raw.arrival_time,
                departure_time: raw.departure_time,
                pickup_type: raw.pickup_type,
                drop_off_type: raw.drop_off_type,
            });
        }
    }
    flattened.par_sort_unstable_by_key(|st| (st.trip_idx, st.sequence));
    builder.stop_times = flattened;
    debug!(
        "Resolved {} stop times in {:?}",
        builder.stop_times.len(),
        now.elapsed()
    );
    rejected
}

/// Groups trips into maximal Trip Patterns sharing an exact stop sequence on
/// the same route (§3 Trip Pattern), dropping trips with fewer than two stops
/// and sorting each pattern's trips by first departure (the Timetable's
/// `sortKey`), per §6 "Pattern grouping key".
fn generate_raptor_routes(builder: &mut RepositoryBuilder) {
    let now = Instant::now();

    // Derived from the (trip_idx, sequence)-sorted stop_times array: the
    // ordered stop sequence, departure times, and board/alight access types
    // for every trip.
    let mut trip_stops: Vec<Vec<u32>> = vec![Vec::new(); builder.trips.len()];
    let mut trip_departures: Vec<Vec<Time>> = vec![Vec::new(); builder.trips.len()];
    let mut trip_pickup: Vec<Vec<StopAccessType>> = vec![Vec::new(); builder.trips.len()];
    let mut trip_drop_off: Vec<Vec<StopAccessType>> = vec![Vec::new(); builder.trips.len()];
    for stop_time in &builder.stop_times {
        trip_stops[stop_time.trip_idx as usize].push(stop_time.stop_idx);
        trip_departures[stop_time.trip_idx as usize].push(stop_time.departure_time);
        trip_pickup[stop_time.trip_idx as usize].push(stop_time.pickup_type);
        trip_drop_off[stop_time.trip_idx as usize].push(stop_time.drop_off_type);
    }

    let groups: DashMap<(u32, Vec<u32>), Vec<u32>> = DashMap::new();
    for (trip_idx, stops) in trip_stops.iter().enumerate() {
        if stops.len() < 2 {
            continue;
        }
        let trip = &builder.trips[trip_idx];
        if trip.route_idx == u32::MAX {
            continue;
        }
        groups
            .entry((trip.route_idx, stops.clone()))
            .or_default()
            .push(trip_idx as u32);
    }

    let mut raptor_routes = Vec::with_capacity(groups.len());
    for (pattern_idx, ((route_idx, stops), mut trip_idxs)) in groups.into_iter().enumerate() {
        trip_idxs.par_sort_unstable_by_key(|&trip_idx| {
            trip_departures[trip_idx as usize]
                .first()
                .copied()
                .unwrap_or(crate::shared::time::MAX)
        });

        if !fifo_holds(&trip_idxs, &trip_departures, stops.len()) {
            warn!(
                "Pattern on route {} violates FIFO across trips — kept unsplit, binary search may misbehave",
                route_idx
            );
        }

        for &trip_idx in &trip_idxs {
            builder.trips[trip_idx as usize].raptor_route_idx = pattern_idx as u32;
        }

        let route = &builder.routes[route_idx as usize];
        let slack_index = Config::slack_index_for_route_type(route.route_type);
        // A pattern's trips share one stop sequence; board/alight masks read
        // the representative (first, by departure) trip's per-position
        // `pickup_type`/`drop_off_type` (§3 Data Model) layered on top of the
        // structural first/last-stop restriction every pattern has anyway.
        let (default_board, default_alight) = RaptorRoute::default_access_masks(stops.len());
        let representative = trip_idxs[0] as usize;
        let can_board: Arc<[bool]> = (0..stops.len())
            .map(|i| {
                default_board[i]
                    && !matches!(trip_pickup[representative].get(i), Some(StopAccessType::NoneAvailable))
            })
            .collect();
        let can_alight: Arc<[bool]> = (0..stops.len())
            .map(|i| {
                default_alight[i]
                    && !matches!(trip_drop_off[representative].get(i), Some(StopAccessType::NoneAvailable))
            })
            .collect();
        let tag: Arc<str> = format!(
            "{} ({} stops)",
            route.short_name.as_deref().unwrap_or(&route.id),
            stops.len()
        )
        .into();

        raptor_routes.push(RaptorRoute {
            index: pattern_idx as u32,
            route_idx,
            tag,
            stops: stops.into(),
            trips: trip_idxs.into(),
            slack_index,
            can_board,
            can_alight,
        });
    }

    builder.raptor_routes = raptor_routes;
    debug!(
        "Generated {} patterns in {:?}",
        builder.raptor_routes.len(),
        now.elapsed()
    );
}

/// Checks the FIFO property required by the binary trip search (§3 Timetable
/// invariant): at every stop position, departures across a pattern's trips
/// are non-decreasing.
fn fifo_holds(trip_idxs: &[u32], trip_departures: &[Vec<Time>], num_stops: usize) -> bool {
    for position in 0..num_stops {
        let mut last: Option<Time> = None;
        for &trip_idx in trip_idxs {
            let Some(&t) = trip_departures[trip_idx as usize].get(position) else {
                continue;
            };
            if let Some(prev) = last
                && t < prev
            {
                return false;
            }
            last = Some(t);
        }
    }
    true
}

fn load_transfers(
    gtfs: &mut Gtfs,
    builder: &mut RepositoryBuilder,
    config: &Config,
) -> Result<usize, self::Error> {
    let now = Instant::now();
    let mut count = 0usize;
    let mut rejected = 0usize;
    gtfs.stream_transfers(|(_, record)| {
        if record.transfer_type == 3 {
            // "not possible" — nothing to record.
            return;
        }
        let (Some(&from), Some(&to)) = (
            builder.stop_lookup.get(record.from_stop_id.as_str()),
            builder.stop_lookup.get(record.to_stop_id.as_str()),
        ) else {
            warn!("Transfer references unknown stop — dropped");
            rejected += 1;
            return;
        };
        if from == to {
            return;
        }
        let from_stop = &builder.stops[from as usize];
        let to_stop = &builder.stops[to as usize];
        let distance = from_stop.coordinate.network_distance(&to_stop.coordinate);
        let duration_sec = record
            .min_transfer_time
            .unwrap_or_else(|| (distance.as_meters() / config.walk_speed_mps).ceil() as u32);
        builder.transfers.push(Transfer {
            from_stop_idx: from,
            to_stop_idx: to,
            duration_sec,
            distance_meters: distance.as_meters(),
        });
        count += 1;
    })?;
    debug!("Loaded {} explicit transfers in {:?}", count, now.elapsed());
    Ok(rejected)
}

/// Generates symmetric walk transfers between nearby stops that have no
/// explicit GTFS transfer already, bounded by `max_transfer_distance` (§9's
/// resolved Open Question: reuse the stop grid-cell index rather than add a
/// k-d tree dependency purely for this).
fn generate_walk_transfers(builder: &mut RepositoryBuilder, config: &Config) {
    let now = Instant::now();
    use std::collections::{HashMap, HashSet};

    let mut existing: HashSet<(u32, u32)> = HashSet::new();
    for transfer in &builder.transfers {
        existing.insert((transfer.from_stop_idx, transfer.to_stop_idx));
    }

    let mut grid: HashMap<(i32, i32), Vec<u32>> = HashMap::new();
    for stop in &builder.stops {
        grid.entry(stop.coordinate.to_cell()).or_default().push(stop.index);
    }

    let radius_cells = (config.max_transfer_distance.as_meters()
        / crate::shared::AVERAGE_STOP_DISTANCE.as_meters())
    .ceil() as i32;

    let mut generated = Vec::new();
    for stop in &builder.stops {
        let (cx, cy) = stop.coordinate.to_cell();
        for dx in -radius_cells..=radius_cells {
            for dy in -radius_cells..=radius_cells {
                let Some(candidates) = grid.get(&(cx + dx, cy + dy)) else {
                    continue;
                };
                for &other in candidates {
                    // Consider each unordered pair once (other > stop.index),
                    // but backfill each direction independently: an explicit
                    // GTFS transfers.txt row covering only one direction must
                    // not suppress generation of the missing reverse leg (P4
                    // symmetry).
                    if other <= stop.index {
                        continue;
                    }
                    let other_stop = &builder.stops[other as usize];
                    let distance = stop.coordinate.network_distance(&other_stop.coordinate);
                    if distance > config.max_transfer_distance {
                        continue;
                    }
                    let duration_sec = (distance.as_meters() / config.walk_speed_mps).ceil() as u32;
                    if existing.insert((stop.index, other)) {
                        generated.push(Transfer {
                            from_stop_idx: stop.index,
                            to_stop_idx: other,
                            duration_sec,
                            distance_meters: distance.as_meters(),
                        });
                    }
                    if existing.insert((other, stop.index)) {
                        generated.push(Transfer {
                            from_stop_idx: other,
                            to_stop_idx: stop.index,
                            duration_sec,
                            distance_meters: distance.as_meters(),
                        });
                    }
                }
            }
        }
    }

    debug!(
        "Generated {} walk transfers in {:?}",
        generated.len(),
        now.elapsed()
    );
    builder.transfers.extend(generated);
}
