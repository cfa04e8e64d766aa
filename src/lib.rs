//! `hanpath` is the routing core of a nationwide Korean public-transit trip
//! planner: a compact GTFS-derived transit data model, a round-based
//! (RAPTOR) earliest-arrival search, an OSM-backed pedestrian access/egress
//! resolver, and the A\* walking router it relies on.
//!
//! The GTFS and OSM loaders ([`gtfs`], [`osm`]) are first-class collaborators
//! that build the immutable [`repository::Repository`] and [`street::StreetGraph`]
//! once at startup; [`raptor`] then answers queries against them.

pub mod access;
pub mod config;
pub mod engine;
pub mod error;
pub mod gtfs;
pub mod osm;
pub mod raptor;
pub mod repository;
pub mod shared;
pub mod street;

pub use config::Config;
pub use engine::Engine;
pub use error::Error;
