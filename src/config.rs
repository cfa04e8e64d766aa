//! Engine-wide tunables, recognized per §6 of the design spec.
//!
//! Mirrors the shape of [`crate::gtfs::Config`]: a plain struct with a
//! [`Default`] impl, overridable from the environment by the CLI front end
//! before the engine is built.

use crate::shared::{Distance, Duration};

/// Slack index `{subway=0, bus=1, rail=2, other=3}`.
pub const SLACK_SUBWAY: usize = 0;
pub const SLACK_BUS: usize = 1;
pub const SLACK_RAIL: usize = 2;
pub const SLACK_OTHER: usize = 3;
pub const SLACK_ROWS: usize = 4;

#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Access radius (`MAX_ACCESS_WALK_METERS`).
    pub max_access_walk: Distance,
    /// Egress radius (`MAX_EGRESS_WALK_METERS`).
    pub max_egress_walk: Distance,
    /// Transfer generation radius (`MAX_TRANSFER_DISTANCE_METERS`).
    pub max_transfer_distance: Distance,
    /// Distance → seconds conversion used uniformly by the engine (`WALK_SPEED_MPS`).
    pub walk_speed_mps: f32,
    /// Departure window (`SEARCH_WINDOW_SECONDS`).
    pub search_window: Duration,
    /// Ranked cap on access candidates (`MAX_ACCESS_STOPS`).
    pub max_access_stops: usize,
    /// Ranked cap on egress candidates (`MAX_EGRESS_STOPS`).
    pub max_egress_stops: usize,
    /// Upper bound on rides minus one (`numberOfAdditionalTransfers`).
    pub number_of_additional_transfers: usize,
    /// Open-set pop limit for A\* (`A_STAR_MAX_ITERATIONS`).
    pub a_star_max_iterations: usize,
    /// g-score cutoff for A\* (`A_STAR_MAX_DISTANCE_METERS`).
    pub a_star_max_distance: Distance,
    /// Board slack in seconds, indexed by slack index.
    pub board_slack: [Duration; SLACK_ROWS],
    /// Alight slack in seconds, indexed by slack index.
    pub alight_slack: [Duration; SLACK_ROWS],
    /// Transfer slack in seconds, shared across all modes.
    pub transfer_slack: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_access_walk: Distance::from_meters(400.0),
            max_egress_walk: Distance::from_meters(400.0),
            max_transfer_distance: Distance::from_meters(500.0),
            walk_speed_mps: 1.2,
            search_window: Duration::from_seconds(900),
            max_access_stops: 5,
            max_egress_stops: 5,
            number_of_additional_transfers: 3,
            a_star_max_iterations: 15_000,
            a_star_max_distance: Distance::from_meters(500.0),
            board_slack: [
                Duration::from_seconds(60),
                Duration::from_seconds(30),
                Duration::from_seconds(120),
                Duration::from_seconds(180),
            ],
            alight_slack: [
                Duration::from_seconds(30),
                Duration::from_seconds(10),
                Duration::from_seconds(60),
                Duration::from_seconds(120),
            ],
            transfer_slack: Duration::from_seconds(60),
        }
    }
}

impl Config {
    /// Upper bound on rides, `R = 1 + numberOfAdditionalTransfers`.
    pub const fn max_rounds(&self) -> usize {
        1 + self.number_of_additional_transfers
    }

    /// Maps a GTFS `route_type` to a slack-table row per §4.3.
    pub fn slack_index_for_route_type(route_type: i32) -> usize {
        match route_type {
            0 | 1 | 2 | 5 | 6 => SLACK_SUBWAY,
            3 => SLACK_BUS,
            4 | 7 => SLACK_RAIL,
            100..=199 | 200..=299 => SLACK_RAIL,
            400..=499 | 900..=999 => SLACK_SUBWAY,
            700..=799 => SLACK_BUS,
            1100..=1199 => SLACK_OTHER,
            _ => SLACK_BUS,
        }
    }
}
