use serde::Serialize;

use crate::domain::topology::segment::GeoPoint;

/// Stations with at least this many platforms count as major.
pub const MAJOR_PLATFORM_THRESHOLD: u32 = 4;

/// Dwell minutes applied when a station does not configure its own value.
pub const MAJOR_DWELL_MINUTES: f64 = 2.0;
pub const MINOR_DWELL_MINUTES: f64 = 1.0;

/// A station on the corridor. Immutable after load.
#[derive(Debug, Clone, Serialize)]
pub struct Station {
    pub code: String,
    pub name: String,
    pub position: GeoPoint,
    pub platforms: u32,
    pub major: bool,
    /// Minutes a stopping train remains stationary here.
    pub dwell_minutes: f64,
}

impl Station {
    /// Builds a station, deriving the major flag from the platform count and
    /// the dwell time from the major flag when no explicit value is given.
    pub fn new(code: String, name: String, position: GeoPoint, platforms: u32, dwell_minutes: Option<f64>) -> Self {
        let major = platforms >= MAJOR_PLATFORM_THRESHOLD;

        let dwell_minutes = dwell_minutes.unwrap_or(if major { MAJOR_DWELL_MINUTES } else { MINOR_DWELL_MINUTES });

        Station { code, name, position, platforms, major, dwell_minutes }
    }
}
