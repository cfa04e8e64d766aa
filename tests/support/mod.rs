//! Shared fixture for the integration tests: writes a tiny embedded GTFS
//! feed to a scratch directory and loads it through the real public
//! pipeline (`hanpath::gtfs::Gtfs` -> `hanpath::repository::Repository`),
//! the same path the CLI front end drives.

use hanpath::{Config, gtfs::Gtfs, repository::Repository};
use std::{
    fs,
    path::PathBuf,
    sync::atomic::{AtomicU32, Ordering},
};

const STOPS: &str = "\
stop_id,stop_name,stop_lat,stop_lon
A,Stop A,37.5547,126.9707
B,Stop B,37.5580,126.9750
C,Stop C,37.5610,126.9800
";

const ROUTES: &str = "\
route_id,agency_id,route_short_name,route_long_name,route_type
R1,,171,Line 171,3
";

const TRIPS: &str = "\
route_id,service_id,trip_id,trip_headsign,trip_short_name,direction_id,shape_id
R1,WEEKDAY,T1,,,,
";

const STOP_TIMES: &str = "\
trip_id,arrival_time,departure_time,stop_id,stop_sequence,stop_headsign,pickup_type,drop_off_type,shape_dist_traveled
T1,09:00:00,09:00:00,A,0,,,,
T1,09:10:00,09:10:00,B,1,,,,
T1,09:20:00,09:20:00,C,2,,,,
";

static FIXTURE_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Writes the embedded feed above to a fresh scratch directory and returns
/// it — call sites own cleanup (best-effort; OS temp dirs get reaped anyway).
pub fn write_small_feed() -> PathBuf {
    let n = FIXTURE_COUNTER.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!("hanpath-test-feed-{}-{n}", std::process::id()));
    fs::create_dir_all(&dir).expect("create scratch gtfs dir");
    fs::write(dir.join("stops.txt"), STOPS).unwrap();
    fs::write(dir.join("routes.txt"), ROUTES).unwrap();
    fs::write(dir.join("trips.txt"), TRIPS).unwrap();
    fs::write(dir.join("stop_times.txt"), STOP_TIMES).unwrap();
    dir
}

pub fn load_small_feed() -> Repository {
    let dir = write_small_feed();
    let gtfs = Gtfs::new().from_directory(&dir);
    let repository = Repository::load_gtfs(gtfs, Config::default()).expect("load embedded feed");
    let _ = fs::remove_dir_all(&dir);
    repository
}

const TRANSFER_TRIPS: &str = "\
route_id,service_id,trip_id,trip_headsign,trip_short_name,direction_id,shape_id
R1,WEEKDAY,T1,,,,
R1,WEEKDAY,T2,,,,
";

const TRANSFER_STOP_TIMES: &str = "\
trip_id,arrival_time,departure_time,stop_id,stop_sequence,stop_headsign,pickup_type,drop_off_type,shape_dist_traveled
T1,09:00:00,09:00:00,A,0,,,,
T1,09:10:00,09:10:00,B,1,,,,
T2,09:20:00,09:20:00,B,0,,,,
T2,09:30:00,09:30:00,C,1,,,,
";

/// A feed requiring a reboard at the same stop (A->B on T1, B->C on T2, no
/// walk in between) to reach C from A — exercises the back-pointer chain
/// across a transfer (P2/P3) rather than the single-boarding case.
pub fn load_feed_with_required_transfer() -> Repository {
    let n = FIXTURE_COUNTER.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!("hanpath-test-feed-transfer-{}-{n}", std::process::id()));
    fs::create_dir_all(&dir).expect("create scratch gtfs dir");
    fs::write(dir.join("stops.txt"), STOPS).unwrap();
    fs::write(dir.join("routes.txt"), ROUTES).unwrap();
    fs::write(dir.join("trips.txt"), TRANSFER_TRIPS).unwrap();
    fs::write(dir.join("stop_times.txt"), TRANSFER_STOP_TIMES).unwrap();
    let gtfs = Gtfs::new().from_directory(&dir);
    let repository = Repository::load_gtfs(gtfs, Config::default()).expect("load embedded feed");
    let _ = fs::remove_dir_all(&dir);
    repository
}

/// Same embedded feed, plus a `transfers.txt` row supplied by the caller —
/// lets a test assert on the interaction between explicit GTFS transfers and
/// the generated-walk-transfer backfill.
pub fn load_small_feed_with_transfers(transfers_csv: &str) -> Repository {
    let dir = write_small_feed();
    fs::write(dir.join("transfers.txt"), transfers_csv).unwrap();
    let gtfs = Gtfs::new().from_directory(&dir);
    let repository = Repository::load_gtfs(gtfs, Config::default()).expect("load embedded feed");
    let _ = fs::remove_dir_all(&dir);
    repository
}
