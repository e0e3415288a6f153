use serde::Serialize;

use crate::error::{Error, Result};

/// Mean Earth radius in kilometers, used for great-circle distances.
const EARTH_RADIUS_KM: f64 = 6371.0088;

/// A geographic point in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        GeoPoint { lat, lon }
    }

    /// Great-circle distance to `other` in kilometers (haversine formula).
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lon = (other.lon - self.lon).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + self.lat.to_radians().cos() * other.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

        2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
    }
}

/// Physical classification of a track within a corridor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackClass {
    Main,
    Siding,
    Secondary,
}

impl TrackClass {
    pub fn parse(s: &str) -> Option<TrackClass> {
        match s {
            "main" => Some(TrackClass::Main),
            "siding" => Some(TrackClass::Siding),
            "secondary" => Some(TrackClass::Secondary),
            _ => None,
        }
    }

    /// Sidings and secondary tracks can serve as reroute alternatives.
    pub fn is_alternative(&self) -> bool {
        matches!(self, TrackClass::Siding | TrackClass::Secondary)
    }

    /// Whether a train diverted onto this track can still serve its station
    /// stops. Sidings run through the station; secondary tracks bypass it.
    pub fn preserves_stops(&self) -> bool {
        matches!(self, TrackClass::Main | TrackClass::Siding)
    }
}

/// A physical track: an ordered polyline with a class, a parallel-track
/// capacity and the corridor it belongs to. Immutable after load.
#[derive(Debug, Clone)]
pub struct TrackSegment {
    pub name: String,
    pub points: Vec<GeoPoint>,
    pub class: TrackClass,
    pub capacity: u32,
    pub corridor: String,
    /// Sum of great-circle distances between consecutive polyline points.
    pub length_km: f64,
}

impl TrackSegment {
    pub fn new(name: String, points: Vec<GeoPoint>, class: TrackClass, capacity: u32, corridor: String) -> Result<Self> {
        if points.len() < 2 {
            return Err(Error::InvalidGeometry { name, reason: format!("polyline has {} point(s), need at least 2", points.len()) });
        }

        if capacity < 1 {
            return Err(Error::InvalidGeometry { name, reason: "capacity must be at least 1".to_string() });
        }

        let length_km = Self::polyline_length_km(&points);

        Ok(TrackSegment { name, points, class, capacity, corridor, length_km })
    }

    fn polyline_length_km(points: &[GeoPoint]) -> f64 {
        points.windows(2).map(|pair| pair[0].distance_km(&pair[1])).sum()
    }

    /// Position at `progress` (0.0 to 1.0) along the polyline.
    ///
    /// `interpolate(0.0)` returns the first coordinate and `interpolate(1.0)`
    /// the last one, exactly. Values outside the range are clamped.
    pub fn interpolate(&self, progress: f64) -> GeoPoint {
        if progress <= 0.0 {
            return self.points[0];
        }
        if progress >= 1.0 {
            return *self.points.last().expect("segment has at least 2 points");
        }

        let target_distance = progress * self.length_km;
        let mut covered = 0.0;

        for pair in self.points.windows(2) {
            let leg = pair[0].distance_km(&pair[1]);

            if covered + leg >= target_distance && leg > 0.0 {
                let leg_progress = (target_distance - covered) / leg;
                return GeoPoint::new(pair[0].lat + (pair[1].lat - pair[0].lat) * leg_progress, pair[0].lon + (pair[1].lon - pair[0].lon) * leg_progress);
            }

            covered += leg;
        }

        *self.points.last().expect("segment has at least 2 points")
    }

    /// Minutes a train needs to traverse the whole segment at `speed_kmh`.
    pub fn traverse_minutes(&self, speed_kmh: f64) -> f64 {
        self.length_km / speed_kmh * 60.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_segment() -> TrackSegment {
        let points = vec![GeoPoint::new(12.9716, 77.5946), GeoPoint::new(12.9500, 77.5800), GeoPoint::new(12.9200, 77.5600)];
        TrackSegment::new("Test Segment".to_string(), points, TrackClass::Main, 1, "test".to_string()).unwrap()
    }

    #[test]
    fn length_is_positive_and_plausible() {
        let segment = test_segment();
        assert!(segment.length_km > 0.0);
        assert!(segment.length_km < 100.0, "unreasonable length {} km", segment.length_km);
    }

    #[test]
    fn interpolation_hits_endpoints_exactly() {
        let segment = test_segment();
        assert_eq!(segment.interpolate(0.0), segment.points[0]);
        assert_eq!(segment.interpolate(1.0), *segment.points.last().unwrap());
    }

    #[test]
    fn degenerate_polyline_is_rejected() {
        let result = TrackSegment::new("Bad".to_string(), vec![GeoPoint::new(1.0, 1.0)], TrackClass::Main, 1, "test".to_string());
        assert!(result.is_err());
    }
}
