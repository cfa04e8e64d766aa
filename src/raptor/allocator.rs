use crate::{
    raptor::discovery::ServingRoute,
    raptor::state::{Parent, ParentKind, Target, Update},
    repository::Repository,
    shared::{Duration, Time, time},
};
use bitvec::prelude::*;
use std::mem;

/// A memory pool for the RAPTOR algorithm's state (§4.5 "State").
///
/// This allocator pre-allocates all necessary buffers to avoid expensive heap allocations
/// during the hot path of route planning. This is especially useful for long-running
/// services where many short-lived RAPTOR instances are created.
pub struct Allocator {
    /// The best known arrival time at each stop across all rounds (`bestArrival`).
    pub(crate) best_arrival: Vec<Option<Time>>,
    /// Tracks which stops were updated in the current round and need to be explored in the next.
    pub(crate) marked_stops: BitVec<usize, Lsb0>,
    /// Tracks the earliest relevant stop index for each pattern in the current round.
    pub(crate) active: Vec<u32>,
    pub(crate) active_mask: BitVec<usize, Lsb0>,
    /// Labels from the previous round (k-1) (`roundArrival[k-1]`).
    pub(crate) prev_labels: Vec<Option<Time>>,
    /// Labels for the current round (k) (`roundArrival[k]`).
    /// We use two arrays to "double-buffer" labels since RAPTOR only ever references the previous round.
    pub(crate) curr_labels: Vec<Option<Time>>,
    /// A flattened 2D matrix [round][stop_index] storing path reconstruction pointers.
    pub(crate) parents: Vec<Option<Parent>>,
    /// Buffer used to batch updates before applying them to the state.
    pub(crate) updates: Vec<Update>,
    /// Total number of stops in the associated repository.
    pub(crate) stop_count: usize,
    /// `R = Config::max_rounds()`, replacing the teacher's fixed `MAX_ROUNDS` constant.
    pub(crate) max_rounds: usize,
    /// Pre-allocated buffer to skip heap allocations.
    pub(crate) routes_serving_stops: Vec<ServingRoute>,
    /// Walking duration used to seed `roundArrival[0][s]`, recalled only for
    /// building the access leg of the final itinerary.
    pub(crate) access_duration: Vec<Option<Duration>>,
    pub(crate) target: Target,
}

impl Allocator {
    /// Creates a new allocator sized for the given repository.
    ///
    /// # Warning
    /// The allocator must be used with the exact same `Repository` it was created for.
    /// Using it with a different repository may cause logic errors or out-of-bounds panics.
    pub fn new(repository: &Repository) -> Self {
        let stop_count = repository.stops.len();
        let max_rounds = repository.config.max_rounds();
        Self {
            best_arrival: vec![None; stop_count],
            marked_stops: bitvec!(usize, Lsb0; 0; stop_count),
            prev_labels: vec![None; stop_count],
            curr_labels: vec![None; stop_count],
            parents: vec![None; stop_count * max_rounds],
            updates: Vec::with_capacity(1024),
            active: vec![u32::MAX; repository.raptor_routes.len()],
            active_mask: bitvec!(usize, Lsb0; 0; repository.raptor_routes.len()),
            stop_count,
            max_rounds,
            routes_serving_stops: Vec::with_capacity(64),
            access_duration: vec![None; stop_count],
            target: Target::new(),
        }
    }

    /// Resets the internal buffers to their initial state, allowing the allocator
    /// to be reused for a new search without re-allocating memory.
    pub fn reset(&mut self) {
        self.best_arrival.fill(None);
        self.marked_stops.fill(false);
        self.prev_labels.fill(None);
        self.curr_labels.fill(None);
        self.parents.fill(None);
        self.active.fill(u32::MAX);
        self.active_mask.fill(false);
        self.updates.clear();
        self.routes_serving_stops.clear();
        self.access_duration.fill(None);
        self.target.clear();
    }

    /// Applies this round's buffered updates, keeping the strictly-earliest
    /// arrival at each stop (§4.5 "Determinism"). Updates arrive from
    /// `explorer.rs`'s parallel scan in no fixed order, so a tie on
    /// `arrival_time` is broken by comparing against whatever this same round
    /// already recorded at that stop: fewer rides always wins by construction
    /// (an earlier round's label is never in `self.parents[round][stop]`, so a
    /// tie against it is left alone), then earlier departure, then lower
    /// pattern index, then lower board-stop index.
    pub(crate) fn run_updates(&mut self, round: usize) {
        self.updates.iter().for_each(|update| {
            let stop_idx = update.stop_idx as usize;
            let idx = flat_matrix(round, stop_idx, self.stop_count);
            let best_time = self.best_arrival[stop_idx].unwrap_or(time::MAX);
            let accept = if update.arrival_time < best_time {
                true
            } else if update.arrival_time == best_time {
                match self.parents[idx] {
                    Some(current) => wins_tie_break(&update.parent, &current),
                    None => false,
                }
            } else {
                false
            };
            if accept {
                self.curr_labels[stop_idx] = Some(update.arrival_time);
                self.parents[idx] = Some(update.parent);
                self.best_arrival[stop_idx] = Some(update.arrival_time);
                self.marked_stops.set(stop_idx, true);
            }
        });
        self.updates.clear();
    }

    pub(crate) fn get_parents(&self, round: usize) -> &[Option<Parent>] {
        let offset = self.stop_count * round;
        &self.parents[offset..offset + self.stop_count]
    }

    pub(crate) fn swap_labels(&mut self) {
        mem::swap(&mut self.curr_labels, &mut self.prev_labels);
        self.curr_labels.fill(None);
    }
}

pub struct LazyBuffer<T> {
    buffer: Option<Vec<T>>,
    capacity: usize,
}

impl<T> LazyBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: None,
            capacity,
        }
    }

    pub fn push(&mut self, value: T) {
        if let Some(buffer) = &mut self.buffer {
            buffer.push(value);
        } else {
            let mut buffer = Vec::with_capacity(self.capacity);
            buffer.push(value);
            self.buffer = Some(buffer);
        }
    }

    pub fn swap(&mut self) -> Vec<T> {
        self.buffer.take().unwrap_or_default()
    }
}

/// Converts a (round, stop_index) coordinate into a flat index
/// for the 1D parents/labels arrays.
#[inline(always)]
pub(crate) fn flat_matrix(outer: usize, inner: usize, count: usize) -> usize {
    (outer * count) + inner
}

fn pattern_idx_of(parent: &Parent) -> u32 {
    match parent.kind {
        ParentKind::Transit { pattern_idx, .. } => pattern_idx,
        ParentKind::Transfer => u32::MAX,
    }
}

/// True if `new` should replace `current` on a tied `arrival_time`: earlier
/// departure, then lower pattern index, then lower board-stop index.
fn wins_tie_break(new: &Parent, current: &Parent) -> bool {
    let new_key = (new.departure_time, pattern_idx_of(new), new.from_stop);
    let current_key = (current.departure_time, pattern_idx_of(current), current.from_stop);
    new_key < current_key
}

#[test]
fn wins_tie_break_orders_by_departure_then_pattern_then_board_stop() {
    let base = Parent::new_transit(5, 9, 2, 0, 0, 1, Time::from_seconds(100), Time::from_seconds(200));

    let earlier_departure = Parent::new_transit(5, 9, 2, 0, 0, 1, Time::from_seconds(50), Time::from_seconds(200));
    assert!(wins_tie_break(&earlier_departure, &base));
    assert!(!wins_tie_break(&base, &earlier_departure));

    let same_departure_lower_pattern =
        Parent::new_transit(5, 9, 1, 0, 0, 1, Time::from_seconds(100), Time::from_seconds(200));
    assert!(wins_tie_break(&same_departure_lower_pattern, &base));

    let same_departure_same_pattern_lower_board =
        Parent::new_transit(3, 9, 2, 0, 0, 1, Time::from_seconds(100), Time::from_seconds(200));
    assert!(wins_tie_break(&same_departure_same_pattern_lower_board, &base));

    assert!(!wins_tie_break(&base, &base), "identical keys must not flip-flop");
}

/// Exercises P7 (idempotence) directly: two `run_updates` calls fed the same
/// tied-arrival updates in opposite push order must settle on the same
/// winner, since `explorer.rs`'s parallel collection gives no order guarantee.
#[test]
fn run_updates_is_order_independent_on_tied_arrivals() {
    let stop_count = 1;
    let make_allocator = || Allocator {
        best_arrival: vec![None; stop_count],
        marked_stops: bitvec!(usize, Lsb0; 0; stop_count),
        prev_labels: vec![None; stop_count],
        curr_labels: vec![None; stop_count],
        parents: vec![None; stop_count],
        updates: Vec::new(),
        active: vec![],
        active_mask: bitvec!(usize, Lsb0; 0; 0),
        stop_count,
        max_rounds: 1,
        routes_serving_stops: Vec::new(),
        access_duration: vec![None; stop_count],
        target: Target::new(),
    };

    let tied_arrival = Time::from_seconds(200);
    let via_pattern_2 = Update::new(
        0,
        tied_arrival,
        Parent::new_transit(5, 0, 2, 0, 0, 1, Time::from_seconds(100), tied_arrival),
    );
    let via_pattern_1 = Update::new(
        0,
        tied_arrival,
        Parent::new_transit(3, 0, 1, 0, 0, 1, Time::from_seconds(100), tied_arrival),
    );

    let mut forward = make_allocator();
    forward.updates = vec![via_pattern_2.clone(), via_pattern_1.clone()];
    forward.run_updates(0);

    let mut reversed = make_allocator();
    reversed.updates = vec![via_pattern_1, via_pattern_2];
    reversed.run_updates(0);

    let winning_pattern = |allocator: &Allocator| match allocator.parents[0].unwrap().kind {
        ParentKind::Transit { pattern_idx, .. } => pattern_idx,
        ParentKind::Transfer => unreachable!(),
    };
    assert_eq!(winning_pattern(&forward), 1, "lower pattern index must win the tie");
    assert_eq!(winning_pattern(&forward), winning_pattern(&reversed), "P7: order must not affect the result");
}

#[test]
fn flat_matrix_test() {
    let a = flat_matrix(0, 0, 10);
    let b = flat_matrix(0, 1, 10);
    assert_eq!(a + 1, b);

    let a = flat_matrix(1, 0, 10);
    let b = flat_matrix(1, 1, 10);
    assert_eq!(a + 1, b);

    let a = flat_matrix(0, 0, 10);
    let b = flat_matrix(1, 0, 10);
    assert_eq!(a + 10, b);
}
