use crate::shared::{Duration, Time, time};

#[derive(Debug, Clone)]
pub(crate) struct Update {
    pub stop_idx: u32,
    pub arrival_time: Time,
    pub parent: Parent,
}

impl Update {
    pub fn new(stop_idx: u32, arrival_time: Time, parent: Parent) -> Self {
        Self {
            stop_idx,
            arrival_time,
            parent,
        }
    }
}

/// Back-pointer sufficient to reconstruct the leg that set `roundArrival[k][s]`
/// (§4.5 "State"). Always a board-ride-alight or a foot transfer; the access
/// leg at round 0 is never recorded here (see `Allocator::access_duration`).
#[derive(Debug, Clone, Copy)]
pub(crate) struct Parent {
    pub from_stop: u32,
    pub to_stop: u32,
    pub departure_time: Time,
    pub arrival_time: Time,
    pub kind: ParentKind,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum ParentKind {
    Transit {
        pattern_idx: u32,
        trip_idx: u32,
        board_pos: u32,
        alight_pos: u32,
    },
    Transfer,
}

impl Parent {
    pub fn new_transit(
        board_stop: u32,
        alight_stop: u32,
        pattern_idx: u32,
        trip_idx: u32,
        board_pos: u32,
        alight_pos: u32,
        departure_time: Time,
        arrival_time: Time,
    ) -> Self {
        Self {
            from_stop: board_stop,
            to_stop: alight_stop,
            departure_time,
            arrival_time,
            kind: ParentKind::Transit {
                pattern_idx,
                trip_idx,
                board_pos,
                alight_pos,
            },
        }
    }

    pub fn new_transfer(from_stop: u32, to_stop: u32, departure_time: Time, arrival_time: Time) -> Self {
        Self {
            from_stop,
            to_stop,
            departure_time,
            arrival_time,
            kind: ParentKind::Transfer,
        }
    }

    pub fn is_transit(&self) -> bool {
        matches!(self.kind, ParentKind::Transit { .. })
    }
}

/// Egress candidates plus the running `bestArrivalAtAnyEgress` bound used for
/// target-stop pruning (§4.5).
#[derive(Debug, Clone)]
pub(crate) struct Target {
    pub egress: Vec<(u32, Duration)>,
    pub bound: Time,
    pub best_stop: Option<u32>,
    /// `None` means the bound was met directly off an access record, with no
    /// transit leg at all; `Some(round)` indexes into `Allocator::parents`.
    pub best_round: Option<usize>,
}

impl Target {
    pub fn new() -> Self {
        Self {
            egress: vec![],
            bound: time::MAX,
            best_stop: None,
            best_round: None,
        }
    }

    pub fn clear(&mut self) {
        self.egress.clear();
        self.bound = time::MAX;
        self.best_stop = None;
        self.best_round = None;
    }
}
