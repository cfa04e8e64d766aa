use clap::{Parser, Subcommand};
use hanpath::{Config, shared::Coordinate};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hanpath", about = "Nationwide Korean transit trip planner")]
pub struct Cli {
    /// Path to a GTFS feed, as a zip archive.
    #[arg(long, env = "HANPATH_GTFS_PATH")]
    pub gtfs_path: PathBuf,

    /// Path to an OSM PBF extract; omit to fall back to haversine access/egress.
    #[arg(long, env = "HANPATH_OSM_PATH")]
    pub osm_path: Option<PathBuf>,

    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// `route(fromLat, fromLon, toLat, toLon, departureTimeSec, maxResults)` (§6).
    Route {
        /// Origin as "lat,lon".
        from: Coordinate,
        /// Destination as "lat,lon".
        to: Coordinate,
        /// Earliest departure time, HH:MM:SS.
        departure: String,
        #[arg(long, default_value_t = 1)]
        max_results: usize,
        /// Wall-clock query budget in milliseconds; omit for no deadline.
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
    /// `routeByStop(fromStopIndex, toStopIndex, departureTimeSec)` (§6), addressed by GTFS stop id.
    RouteByStop {
        from_stop: String,
        to_stop: String,
        departure: String,
        /// Wall-clock query budget in milliseconds; omit for no deadline.
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
}

/// Overrides for the subset of [`Config`] worth exposing on the command line
/// (§6's config keys table), falling back to `Config::default()` otherwise.
#[derive(clap::Args)]
pub struct ConfigArgs {
    #[arg(long, env = "HANPATH_MAX_ACCESS_WALK_METERS")]
    pub max_access_walk_meters: Option<f32>,
    #[arg(long, env = "HANPATH_MAX_EGRESS_WALK_METERS")]
    pub max_egress_walk_meters: Option<f32>,
    #[arg(long, env = "HANPATH_SEARCH_WINDOW_SECONDS")]
    pub search_window_seconds: Option<u32>,
    #[arg(long, env = "HANPATH_NUMBER_OF_ADDITIONAL_TRANSFERS")]
    pub number_of_additional_transfers: Option<usize>,
}

impl ConfigArgs {
    pub fn to_config(&self) -> Config {
        let mut config = Config::default();
        if let Some(meters) = self.max_access_walk_meters {
            config.max_access_walk = hanpath::shared::Distance::from_meters(meters);
        }
        if let Some(meters) = self.max_egress_walk_meters {
            config.max_egress_walk = hanpath::shared::Distance::from_meters(meters);
        }
        if let Some(seconds) = self.search_window_seconds {
            config.search_window = hanpath::shared::Duration::from_seconds(seconds);
        }
        if let Some(transfers) = self.number_of_additional_transfers {
            config.number_of_additional_transfers = transfers;
        }
        config
    }
}
