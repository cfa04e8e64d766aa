//! Thin presentation shell around [`hanpath::Engine`] (§6 "CLI front end").
//! Owns no routing logic: it loads GTFS (and optionally OSM) data, builds
//! the engine once, runs a single `route`/`routeByStop` query, and prints
//! the resulting itinerary as JSON.

mod args;

use args::{Cli, Command};
use clap::Parser;
use hanpath::{Engine, gtfs::Gtfs, osm, repository::Repository, shared::Time};
use std::{process, time::Instant};
use tracing::{error, info, warn};

fn main() {
    tracing_subscriber::fmt().init();

    let cli = Cli::parse();
    let config = cli.config.to_config();

    info!("Loading GTFS data from {:?}...", cli.gtfs_path);
    let now = Instant::now();
    let gtfs = match Gtfs::new().from_zip(&cli.gtfs_path) {
        Ok(gtfs) => gtfs,
        Err(err) => {
            error!("Failed to open GTFS feed: {err}");
            process::exit(1);
        }
    };
    let repository = match Repository::load_gtfs(gtfs, config) {
        Ok(repository) => repository,
        Err(err) => {
            error!("Failed to load GTFS feed: {err}");
            process::exit(1);
        }
    };
    info!("Loaded {} stops, {} routes in {:?}", repository.stops.len(), repository.routes.len(), now.elapsed());

    let street = cli.osm_path.as_ref().and_then(|path| {
        info!("Loading OSM street graph from {path:?}...");
        let now = Instant::now();
        match osm::build_street_graph(path) {
            Ok(graph) => {
                info!("Loaded street graph in {:?}", now.elapsed());
                Some(graph)
            }
            Err(err) => {
                warn!("Failed to load OSM data, falling back to haversine access/egress: {err}");
                None
            }
        }
    });

    let engine = Engine::new(&repository, street.as_ref());

    let result = match &cli.command {
        Command::Route { from, to, departure, max_results, timeout_ms } => {
            let deadline = timeout_ms.map(|ms| Instant::now() + std::time::Duration::from_millis(ms));
            engine.route(
                *from,
                *to,
                Time::from_hms(departure).unwrap_or_else(|| bad_time(departure)),
                *max_results,
                deadline,
            )
        }
        Command::RouteByStop { from_stop, to_stop, departure, timeout_ms } => {
            let from_idx = resolve_stop(&repository, from_stop);
            let to_idx = resolve_stop(&repository, to_stop);
            let deadline = timeout_ms.map(|ms| Instant::now() + std::time::Duration::from_millis(ms));
            engine.route_by_stop(from_idx, to_idx, Time::from_hms(departure).unwrap_or_else(|| bad_time(departure)), deadline)
        }
    };

    match result {
        Ok(itineraries) if itineraries.is_empty() => {
            println!("{}", serde_json::to_string_pretty(&itineraries).unwrap());
            info!("No itinerary found within the search bounds.");
        }
        Ok(itineraries) => {
            println!("{}", serde_json::to_string_pretty(&itineraries).unwrap());
        }
        Err(err) => {
            error!("Query failed: {err}");
            process::exit(1);
        }
    }
}

fn resolve_stop(repository: &Repository, id: &str) -> u32 {
    match repository.stop_by_id(id) {
        Some(stop) => stop.index,
        None => {
            error!("No stop with id {id:?}");
            process::exit(1);
        }
    }
}

fn bad_time(raw: &str) -> ! {
    error!("Invalid departure time {raw:?}, expected HH:MM:SS");
    process::exit(1);
}
