use crate::{
    raptor::{Allocator, Parent},
    repository::Repository,
};
use tracing::trace;

/// Path Reconstruction (C7, §4.7): walks `parents[round][stop]` backwards
/// from `target_stop`/`target_round`, decrementing the round only when the
/// parent is a transit leg (a transfer never switches rounds). Terminates at
/// the first `None` parent — the access-seeded stop, whose leg is not
/// recorded in `parents` at all (see `Allocator::access_duration`).
///
/// Forward-only: unlike the teacher's bidirectional `backtrack`, there is a
/// single walk direction and no `TimeConstraint::Arrival` branch.
pub(crate) fn backtrack(repository: &Repository, allocator: &Allocator, target_stop: u32, target_round: usize) -> Vec<Parent> {
    let mut path: Vec<Parent> = Vec::new();
    let mut current_stop = target_stop;
    let mut current_round = target_round;

    loop {
        let stop = &repository.stops[current_stop as usize];
        trace!("Looking at stop: [{}] {} in round {current_round}", stop.id, stop.name);

        let Some(parent) = allocator.get_parents(current_round)[current_stop as usize] else {
            break;
        };
        path.push(parent);
        current_stop = parent.from_stop;

        if parent.is_transit() {
            if current_round == 0 {
                break;
            }
            current_round -= 1;
        }
    }

    path.reverse();
    path
}
