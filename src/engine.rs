//! The engine facade (§6 "Query surface"): wires the [`Repository`], the
//! Access/Egress Resolver, and the Raptor core together behind the two
//! operations a caller actually wants. Everything underneath is a
//! collaborator; this is the only surface the CLI front end talks to.

use std::time::Instant;

use crate::{
    access::{AccessCandidate, AccessResolver},
    error::Error,
    raptor::{self, Allocator, Itinerary},
    repository::Repository,
    shared::{Coordinate, Distance, Duration, Time},
    street::StreetGraph,
};

pub struct Engine<'a> {
    repository: &'a Repository,
    resolver: AccessResolver<'a>,
}

impl<'a> Engine<'a> {
    pub fn new(repository: &'a Repository, street: Option<&'a StreetGraph>) -> Self {
        Self {
            repository,
            resolver: AccessResolver::new(repository, street),
        }
    }

    /// `route(fromLat, fromLon, toLat, toLon, departureTimeSec, maxResults)` (§6).
    ///
    /// Resolves both coordinates through the Access/Egress Resolver and runs
    /// a single Raptor search, optionally bounded by a wall-clock `deadline`
    /// (§7's cancellation contract — `None` means unbounded). Per the
    /// search-window simplification (§4.5): a first-boarding deadline filter
    /// stands in for a literal per-minute range-RAPTOR sweep, so at most one
    /// itinerary is ever produced — `max_results` only ever caps the returned
    /// list at 0 or 1.
    pub fn route(
        &self,
        from: Coordinate,
        to: Coordinate,
        departure: Time,
        max_results: usize,
        deadline: Option<Instant>,
    ) -> Result<Vec<Itinerary>, Error> {
        let config = &self.repository.config;
        let access = self.resolver.resolve(&from, config.max_access_walk, config.max_access_stops);
        let egress = self.resolver.resolve(&to, config.max_egress_walk, config.max_egress_stops);
        self.finish(raptor::solve(self.repository, &access, &egress, departure, deadline), max_results)
    }

    /// `routeByStop(fromStopIndex, toStopIndex, departureTimeSec)` (§6): skips
    /// coordinate resolution, seeding access/egress directly at the named
    /// stops with zero walk time.
    pub fn route_by_stop(
        &self,
        from_stop: u32,
        to_stop: u32,
        departure: Time,
        deadline: Option<Instant>,
    ) -> Result<Vec<Itinerary>, Error> {
        let access = [zero_walk_candidate(from_stop)];
        let egress = [zero_walk_candidate(to_stop)];
        self.finish(raptor::solve(self.repository, &access, &egress, departure, deadline), 1)
    }

    /// Reuses a caller-supplied [`Allocator`] across repeated calls (§5
    /// "Resource Model"), avoiding a fresh set of allocations per query.
    pub fn route_with_allocator(
        &self,
        allocator: &mut Allocator,
        from: Coordinate,
        to: Coordinate,
        departure: Time,
        deadline: Option<Instant>,
    ) -> Result<Vec<Itinerary>, Error> {
        let config = &self.repository.config;
        let access = self.resolver.resolve(&from, config.max_access_walk, config.max_access_stops);
        let egress = self.resolver.resolve(&to, config.max_egress_walk, config.max_egress_stops);
        self.finish(
            raptor::solve_with_allocator(self.repository, allocator, &access, &egress, departure, deadline),
            1,
        )
    }

    /// `NoPath` collapses to an empty result list rather than an error — the
    /// query was well formed, the network simply has no connection within
    /// the search bounds. `NoAccess`/`NoEgress`/`DataInvariantViolation`
    /// still propagate, since those mean the query itself couldn't be posed.
    fn finish(&self, result: Result<Itinerary, Error>, max_results: usize) -> Result<Vec<Itinerary>, Error> {
        match result {
            Ok(_) if max_results == 0 => Ok(Vec::new()),
            Ok(itinerary) => Ok(vec![itinerary]),
            Err(Error::NoPath) => Ok(Vec::new()),
            Err(err) => Err(err),
        }
    }
}

fn zero_walk_candidate(stop_idx: u32) -> AccessCandidate {
    AccessCandidate {
        stop_idx,
        duration: Duration::from_seconds(0),
        distance: Distance::from_meters(0.0),
    }
}
