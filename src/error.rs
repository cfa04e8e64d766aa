//! Crate-wide error taxonomy (§7). Each variant names who surfaces it and
//! what the caller should do about it; see the module-level `Error` enums
//! (`gtfs::Error`, `osm::Error`) for load-time failures that never reach a
//! query. `raptor::solve` returns this enum directly rather than a separate
//! `raptor::Error` — its variants already cover every query-time failure.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The access resolver found zero candidate stops within the access radius.
    #[error("no stop found within the access radius of the origin")]
    NoAccess,
    /// The access resolver found zero candidate stops within the egress radius.
    #[error("no stop found within the egress radius of the destination")]
    NoEgress,
    /// Raptor finished with every egress stop unreachable.
    #[error("no itinerary connects the given origin and destination")]
    NoPath,
    /// The query deadline elapsed before a result was produced. Raptor checks
    /// this between rounds; the best complete result found so far is still
    /// returned (via `NoPath` if none), per §7.
    #[error("query timed out before completing")]
    Timeout,
    /// The pedestrian A\* hit its iteration or distance cap (or its own
    /// deadline) before reaching the goal. Never propagated as a hard
    /// failure — the access resolver logs this and falls back to
    /// `haversine * 1.3` for that candidate.
    #[error("walking route search abandoned before reaching the goal")]
    WalkingRouteAbandoned,
    /// A GTFS/OSM loader rejected a record at load time; never surfaced at query time.
    #[error("data invariant violated while loading: {0}")]
    DataInvariantViolation(String),
}
