use std::sync::Arc;

use crate::shared::{geo::Coordinate, time::Time};

/// A physical point where passengers can board or alight from a vehicle.
///
/// Dense, array-of-structs-of-arrays layout: `Repository::stops` is one
/// `Box<[Stop]>` of length `nStops`; every other per-stop fact (patterns,
/// transfers) is a parallel adjacency array keyed by `Stop::index`.
#[derive(Debug, Default, Clone)]
pub struct Stop {
    /// The global internal index for this stop, dense in `[0, nStops)` (I1).
    pub index: u32,
    /// Unique external identifier for the stop.
    pub id: Arc<str>,
    /// Human-readable name (e.g., "Main St & 4th Ave").
    pub name: Arc<str>,
    pub coordinate: Coordinate,
}

#[derive(Debug, Default, Clone, Copy)]
pub enum StopAccessType {
    #[default]
    Regularly,
    NoneAvailable,
}

impl StopAccessType {
    pub fn from_gtfs_code(code: u8) -> Self {
        match code {
            1 => Self::NoneAvailable,
            _ => Self::Regularly,
        }
    }
}

/// One stop-time event linking a [`Trip`] to a [`Stop`] at a given in-trip position.
#[derive(Debug, Default, Clone)]
pub struct StopTime {
    pub trip_idx: u32,
    pub stop_idx: u32,
    /// Zero-based position of this stop within its trip.
    pub sequence: u32,
    pub arrival_time: Time,
    pub departure_time: Time,
    pub pickup_type: StopAccessType,
    pub drop_off_type: StopAccessType,
}

/// Metadata describing a contiguous range within the global `stop_times` array.
#[derive(Default, Debug, Clone, Copy)]
pub struct StopTimeSlice {
    pub start_idx: u32,
    pub count: u32,
}

/// A directed walk edge between two distinct stops (§3 Transfer).
///
/// Always generated symmetrically (P4): if `(a, b, d)` exists then so does
/// `(b, a, d)`. Stored twice by the [`super::Repository`] — `transfers_by_from_idx`
/// and `transfers_by_to_idx` — so forward and reverse exploration never scan
/// the whole table.
#[derive(Debug, Default, Clone, Copy)]
pub struct Transfer {
    pub from_stop_idx: u32,
    pub to_stop_idx: u32,
    pub duration_sec: u32,
    pub distance_meters: f32,
}

/// A specific journey taken by a vehicle through a sequence of stops.
#[derive(Debug, Default, Clone)]
pub struct Trip {
    pub index: u32,
    pub id: Arc<str>,
    pub route_idx: u32,
    /// Pointer to the [`RaptorRoute`] (pattern) this trip's stop sequence realizes.
    pub raptor_route_idx: u32,
    pub headsign: Option<Arc<str>>,
}

/// Display-level metadata for a group of trips (§3 Route). One `Route` per
/// [`RaptorRoute`]/pattern in this design (§9 "Pattern = Route 1:1").
#[derive(Debug, Default, Clone)]
pub struct Route {
    pub index: u32,
    pub id: Arc<str>,
    pub short_name: Option<Arc<str>>,
    pub long_name: Option<Arc<str>>,
    /// GTFS numeric route type; also the input to `slack_index`.
    pub route_type: i32,
}

/// A Trip Pattern + Timetable pair, one per maximal group of trips sharing a
/// stop sequence on a route (§3). The routing-hot type: Raptor never looks at
/// [`Route`] or [`Trip`] display fields during a solve, only at this struct's
/// `stops`/`trips`/`slack_index`/`can_board`/`can_alight`.
#[derive(Debug, Default, Clone)]
pub struct RaptorRoute {
    pub index: u32,
    pub route_idx: u32,
    /// Human-readable debug tag, e.g. `"bus 143 (A -> B -> C)"`.
    pub tag: Arc<str>,
    /// Ordered stop indices served by this pattern (`stopSequence`, k >= 2).
    pub stops: Arc<[u32]>,
    /// Trip indices realizing this pattern, sorted by `sortKey = departureSec[0]`.
    pub trips: Arc<[u32]>,
    /// Row into the engine's slack table (`Config::board_slack`/`alight_slack`).
    pub slack_index: usize,
    /// `can_board[i]`: true unless `i` is the pattern's last stop.
    pub can_board: Arc<[bool]>,
    /// `can_alight[i]`: true unless `i` is the pattern's first stop.
    pub can_alight: Arc<[bool]>,
}

impl RaptorRoute {
    pub fn stop_at(&self, i: usize) -> u32 {
        self.stops[i]
    }

    pub fn num_stops(&self) -> usize {
        self.stops.len()
    }

    pub fn can_board_at(&self, i: usize) -> bool {
        self.can_board[i]
    }

    pub fn can_alight_at(&self, i: usize) -> bool {
        self.can_alight[i]
    }

    /// Default board/alight masks: boardable everywhere but the last stop,
    /// alightable everywhere but the first.
    pub fn default_access_masks(num_stops: usize) -> (Arc<[bool]>, Arc<[bool]>) {
        let can_board: Arc<[bool]> = (0..num_stops).map(|i| i + 1 < num_stops).collect();
        let can_alight: Arc<[bool]> = (0..num_stops).map(|i| i > 0).collect();
        (can_board, can_alight)
    }
}
