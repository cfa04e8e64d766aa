/// File names expected inside a GTFS feed (zip or directory), overridable for
/// feeds that rename the standard files.
#[derive(Debug, Clone)]
pub struct Config {
    pub stops_path: String,
    pub routes_path: String,
    pub trips_path: String,
    pub stop_times_path: String,
    pub transfers_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stops_path: "stops.txt".into(),
            routes_path: "routes.txt".into(),
            trips_path: "trips.txt".into(),
            stop_times_path: "stop_times.txt".into(),
            transfers_path: "transfers.txt".into(),
        }
    }
}
