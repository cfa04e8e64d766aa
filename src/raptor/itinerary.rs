use crate::{
    access::AccessCandidate,
    raptor::state::{Parent, ParentKind},
    repository::Repository,
    shared::Time,
};
use serde::Serialize;

/// One leg of an itinerary (§6 wire shape). Walk legs cover both the access
/// and egress walk and any foot transfer between patterns; transit legs
/// carry enough of the route/trip identity for a client to render a board.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind")]
pub enum Leg {
    Walk {
        meters: f32,
        seconds: u32,
    },
    Transit {
        #[serde(rename = "routeShort")]
        route_short: Option<String>,
        #[serde(rename = "routeType")]
        route_type: i32,
        #[serde(rename = "boardStop")]
        board_stop: u32,
        #[serde(rename = "alightStop")]
        alight_stop: u32,
        #[serde(rename = "boardSec")]
        board_sec: u32,
        #[serde(rename = "alightSec")]
        alight_sec: u32,
    },
}

/// Final itinerary (§6): a walk-ride(-transfer-ride)*-walk sequence plus the
/// totals a client needs without re-deriving them from the legs.
#[derive(Debug, Clone, Serialize)]
pub struct Itinerary {
    pub legs: Vec<Leg>,
    #[serde(rename = "departureSec")]
    pub departure_sec: u32,
    #[serde(rename = "arrivalSec")]
    pub arrival_sec: u32,
    #[serde(rename = "durationSec")]
    pub duration_sec: u32,
    #[serde(rename = "transferCount")]
    pub transfer_count: u32,
}

impl Itinerary {
    /// Builds the wire-level itinerary from a reconstructed `parents` chain
    /// (§4.7) plus the access/egress walk legs that sit outside the Raptor
    /// round loop. `transferCount` counts vehicle changes — rides minus one —
    /// not foot-transfer legs: a reboard at the same stop still spends a
    /// round and is still a transfer even with no walk in between (scenario
    /// S4: boarding two patterns with no walk between them still yields
    /// `transferCount = 1`).
    pub fn assemble(
        repository: &Repository,
        access: &AccessCandidate,
        path: &[Parent],
        egress: &AccessCandidate,
        departure_time: Time,
    ) -> Self {
        let mut legs = Vec::with_capacity(path.len() + 2);
        legs.push(Leg::Walk {
            meters: access.distance.as_meters(),
            seconds: access.duration.as_seconds(),
        });

        let mut ride_count = 0u32;
        for parent in path {
            match parent.kind {
                ParentKind::Transit { trip_idx, .. } => {
                    ride_count += 1;
                    let route = repository.route_by_trip_idx(trip_idx);
                    legs.push(Leg::Transit {
                        route_short: route.short_name.as_deref().map(str::to_owned),
                        route_type: route.route_type,
                        board_stop: parent.from_stop,
                        alight_stop: parent.to_stop,
                        board_sec: parent.departure_time.as_seconds(),
                        alight_sec: parent.arrival_time.as_seconds(),
                    });
                }
                ParentKind::Transfer => {
                    let meters = repository
                        .transfers_from(parent.from_stop)
                        .find(|t| t.to_stop_idx == parent.to_stop)
                        .map(|t| t.distance_meters)
                        .unwrap_or(0.0);
                    legs.push(Leg::Walk {
                        meters,
                        seconds: (parent.arrival_time - parent.departure_time).as_seconds(),
                    });
                }
            }
        }
        let transfer_count = ride_count.saturating_sub(1);

        legs.push(Leg::Walk {
            meters: egress.distance.as_meters(),
            seconds: egress.duration.as_seconds(),
        });

        let arrival_sec = path
            .last()
            .map(|p| p.arrival_time)
            .unwrap_or(departure_time + access.duration)
            + egress.duration;

        Self {
            legs,
            departure_sec: departure_time.as_seconds(),
            arrival_sec: arrival_sec.as_seconds(),
            duration_sec: arrival_sec.as_seconds() - departure_time.as_seconds(),
            transfer_count,
        }
    }
}
