//! Integration tests for the GTFS loading pipeline (§3 Data Model, P2/P3),
//! driven end to end through the public `Gtfs` + `Repository::load_gtfs`
//! surface rather than a hand-built `RepositoryBuilder` fixture.

mod support;

use hanpath::shared::Coordinate;

#[test]
fn loads_dense_stop_and_trip_indices() {
    let repository = support::load_small_feed();

    assert_eq!(repository.stops.len(), 3);
    for (i, stop) in repository.stops.iter().enumerate() {
        assert_eq!(stop.index, i as u32, "P2: stop indices must be dense in [0, nStops)");
    }

    assert_eq!(repository.trips.len(), 1);
    assert_eq!(repository.trips[0].route_idx, 0);
}

#[test]
fn groups_the_single_trip_into_one_pattern() {
    let repository = support::load_small_feed();

    assert_eq!(repository.raptor_routes.len(), 1);
    let pattern = &repository.raptor_routes[0];
    assert_eq!(pattern.stops.len(), 3);
    assert_eq!(pattern.trips.len(), 1);
    assert_eq!(pattern.trips[0], 0);
    assert!(pattern.can_board_at(0));
    assert!(!pattern.can_board_at(2), "last stop is not boardable");
    assert!(!pattern.can_alight_at(0), "first stop is not alightable");
}

#[test]
fn generates_symmetric_walk_transfers_between_nearby_stops() {
    let repository = support::load_small_feed();
    let max_transfer_distance = repository.config.max_transfer_distance;

    // P4: every generated transfer within range has a reverse counterpart
    // with the same duration; stops farther apart than the transfer radius
    // get no transfer at all.
    for from in &repository.stops {
        for to in &repository.stops {
            if from.index == to.index {
                continue;
            }
            let within_range = from.coordinate.network_distance(&to.coordinate) <= max_transfer_distance;
            let forward = repository.transfers_from(from.index).find(|t| t.to_stop_idx == to.index);
            assert_eq!(forward.is_some(), within_range, "transfer {}->{} range mismatch", from.id, to.id);
            if let Some(forward) = forward {
                let backward = repository
                    .transfers_from(to.index)
                    .find(|t| t.to_stop_idx == from.index)
                    .expect("generated transfers are symmetric");
                assert_eq!(forward.duration_sec, backward.duration_sec);
            }
        }
    }
}

#[test]
fn backfills_the_missing_direction_of_an_asymmetric_explicit_transfer() {
    // Stop A and B are within the transfer radius (see
    // `generates_symmetric_walk_transfers_between_nearby_stops`). A
    // `transfers.txt` that only declares A->B must not suppress generating
    // B->A: the generated-transfer backfill has to treat each direction
    // independently of what GTFS already declared (P4 symmetry).
    let repository = support::load_small_feed_with_transfers(
        "from_stop_id,to_stop_id,transfer_type,min_transfer_time\nA,B,2,120\n",
    );

    let forward = repository
        .transfers_from(0)
        .find(|t| t.to_stop_idx == 1)
        .expect("explicit A->B transfer kept");
    assert_eq!(forward.duration_sec, 120, "explicit transfer keeps its own declared duration");

    let backward = repository
        .transfers_from(1)
        .find(|t| t.to_stop_idx == 0)
        .expect("B->A must still be backfilled despite only A->B being explicit");
    assert!(backward.duration_sec > 0);
}

#[test]
fn resolves_a_stop_by_coordinate() {
    let repository = support::load_small_feed();
    let coordinate = Coordinate { latitude: 37.5547, longitude: 126.9707 };
    let nearby = repository.stops_by_coordinate(&coordinate, hanpath::shared::Distance::from_meters(50.0));
    assert!(nearby.iter().any(|stop| stop.id.as_ref() == "A"));
}
