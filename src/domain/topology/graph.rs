use std::collections::{BTreeMap, HashSet, VecDeque};

use crate::domain::topology::segment::{TrackClass, TrackSegment};
use crate::domain::topology::station::Station;
use crate::error::{Error, Result};

/// How far (km) a station may sit from a track end and still count as the
/// corridor's endpoint.
const ENDPOINT_TOLERANCE_KM: f64 = 5.0;

/// How far (km) a station may sit from a polyline vertex and still count as
/// lying within the corridor.
const CONTAINMENT_TOLERANCE_KM: f64 = 2.0;

/// A named section of the corridor network between two stations: the basic
/// unit of capacity and headway constraints. Groups every parallel track
/// carrying the same corridor label.
#[derive(Debug, Clone)]
pub struct Corridor {
    pub id: String,
    /// Track names within this corridor, primary first.
    pub track_names: Vec<String>,
    /// The main track used for geometry and travel times.
    pub primary_track: String,
    /// Station codes at either end of the primary track.
    pub endpoints: (String, String),
    /// Station codes lying within the corridor (endpoints included).
    pub stations: Vec<String>,
    /// Sum of the parallel-track capacities of all tracks in the corridor.
    pub aggregate_capacity: u32,
}

impl Corridor {
    pub fn contains_station(&self, code: &str) -> bool {
        self.stations.iter().any(|s| s == code)
    }

    pub fn other_endpoint(&self, code: &str) -> Option<&str> {
        if self.endpoints.0 == code {
            Some(self.endpoints.1.as_str())
        } else if self.endpoints.1 == code {
            Some(self.endpoints.0.as_str())
        } else {
            None
        }
    }
}

/// One corridor traversal within a resolved train route, oriented in the
/// direction of travel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteLeg {
    pub corridor: String,
    pub entry: String,
    pub exit: String,
    /// True when the train traverses the primary track polyline last-to-first.
    pub reversed: bool,
}

/// Static topology: tracks, stations, corridor grouping and adjacency.
/// Pure data, loaded once and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct TrackGraph {
    segments: BTreeMap<String, TrackSegment>,
    stations: BTreeMap<String, Station>,
    corridors: BTreeMap<String, Corridor>,
}

impl TrackGraph {
    /// Builds the graph from loaded tracks and stations, deriving corridor
    /// grouping, endpoints and station containment. Topology that cannot be
    /// resolved (a corridor without a main track, a track end with no nearby
    /// station) is a configuration error, surfaced here and not at runtime.
    pub fn new(segments: Vec<TrackSegment>, stations: Vec<Station>) -> Result<Self> {
        let mut station_map: BTreeMap<String, Station> = BTreeMap::new();
        for station in stations {
            if station_map.insert(station.code.clone(), station.clone()).is_some() {
                log::warn!("Duplicate station code '{}', keeping the last definition", station.code);
            }
        }

        let mut segment_map: BTreeMap<String, TrackSegment> = BTreeMap::new();
        let mut corridor_tracks: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for segment in segments {
            corridor_tracks.entry(segment.corridor.clone()).or_default().push(segment.name.clone());

            if segment_map.insert(segment.name.clone(), segment).is_some() {
                log::warn!("Duplicate track name, keeping the last definition");
            }
        }

        let mut corridors = BTreeMap::new();

        for (corridor_id, mut track_names) in corridor_tracks {
            // Primary track: the longest main-class track in the corridor.
            let primary = track_names
                .iter()
                .filter(|name| segment_map[*name].class == TrackClass::Main)
                .max_by(|a, b| segment_map[*a].length_km.total_cmp(&segment_map[*b].length_km))
                .cloned()
                .ok_or_else(|| Error::InvalidGeometry { name: corridor_id.clone(), reason: "corridor has no main track".to_string() })?;

            track_names.sort_by_key(|name| (name != &primary, name.clone()));

            let primary_track = &segment_map[&primary];

            let start = Self::nearest_station(&station_map, primary_track, 0.0, &corridor_id)?;
            let end = Self::nearest_station(&station_map, primary_track, 1.0, &corridor_id)?;

            if start == end {
                return Err(Error::InvalidGeometry { name: corridor_id, reason: format!("both track ends resolve to station '{}'", start) });
            }

            let mut contained: Vec<String> = station_map
                .values()
                .filter(|station| primary_track.points.iter().any(|p| p.distance_km(&station.position) <= CONTAINMENT_TOLERANCE_KM))
                .map(|station| station.code.clone())
                .collect();

            for endpoint in [&start, &end] {
                if !contained.iter().any(|c| c == endpoint) {
                    contained.push(endpoint.clone());
                }
            }

            let aggregate_capacity = track_names.iter().map(|name| segment_map[name].capacity).sum::<u32>().max(1);

            corridors.insert(
                corridor_id.clone(),
                Corridor {
                    id: corridor_id,
                    track_names,
                    primary_track: primary,
                    endpoints: (start, end),
                    stations: contained,
                    aggregate_capacity,
                },
            );
        }

        log::info!("Track graph ready: {} tracks, {} stations, {} corridors", segment_map.len(), station_map.len(), corridors.len());

        Ok(TrackGraph { segments: segment_map, stations: station_map, corridors })
    }

    fn nearest_station(stations: &BTreeMap<String, Station>, track: &TrackSegment, progress: f64, corridor_id: &str) -> Result<String> {
        let point = track.interpolate(progress);

        stations
            .values()
            .map(|station| (station.position.distance_km(&point), &station.code))
            .filter(|(distance, _)| *distance <= ENDPOINT_TOLERANCE_KM)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, code)| code.clone())
            .ok_or_else(|| Error::InvalidGeometry {
                name: corridor_id.to_string(),
                reason: format!("no station within {ENDPOINT_TOLERANCE_KM} km of track end"),
            })
    }

    pub fn station(&self, code: &str) -> Option<&Station> {
        self.stations.get(code)
    }

    pub fn stations(&self) -> impl Iterator<Item = &Station> {
        self.stations.values()
    }

    pub fn segment(&self, name: &str) -> Option<&TrackSegment> {
        self.segments.get(name)
    }

    pub fn corridor(&self, id: &str) -> Option<&Corridor> {
        self.corridors.get(id)
    }

    pub fn corridors(&self) -> impl Iterator<Item = &Corridor> {
        self.corridors.values()
    }

    pub fn corridor_count(&self) -> usize {
        self.corridors.len()
    }

    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    /// The main track a corridor's geometry and travel times are taken from.
    pub fn primary_track(&self, corridor_id: &str) -> Result<&TrackSegment> {
        let corridor = self.corridors.get(corridor_id).ok_or_else(|| Error::UnknownCorridor(corridor_id.to_string()))?;
        Ok(&self.segments[&corridor.primary_track])
    }

    /// Alternative (siding/secondary) tracks usable as reroute targets.
    pub fn alternatives(&self, corridor_id: &str) -> Vec<&TrackSegment> {
        match self.corridors.get(corridor_id) {
            Some(corridor) => corridor.track_names.iter().map(|name| &self.segments[name]).filter(|track| track.class.is_alternative()).collect(),
            None => Vec::new(),
        }
    }

    fn corridors_containing(&self, station_code: &str) -> Vec<&Corridor> {
        self.corridors.values().filter(|corridor| corridor.contains_station(station_code)).collect()
    }

    /// Resolves the ordered corridor list connecting consecutive stops.
    ///
    /// Every stop must be a known station attached to at least one corridor,
    /// and consecutive stops must be connected through corridor adjacency
    /// (corridors sharing an endpoint station). Failure here is a
    /// configuration error detected at route-setup time, never during
    /// traversal.
    pub fn resolve_route(&self, stops: &[String]) -> Result<Vec<String>> {
        if stops.is_empty() {
            return Err(Error::MalformedStopList("stop list is empty".to_string()));
        }

        for stop in stops {
            if !self.stations.contains_key(stop) {
                return Err(Error::UnknownStation(stop.clone()));
            }
        }

        let mut route: Vec<String> = Vec::new();

        for pair in stops.windows(2) {
            let leg = self.shortest_corridor_path(&pair[0], &pair[1])?;

            for corridor_id in leg {
                if route.last().map(|last| last == &corridor_id) != Some(true) {
                    route.push(corridor_id);
                }
            }
        }

        Ok(route)
    }

    /// Breadth-first search over corridor adjacency from any corridor
    /// containing `from` to any corridor containing `to`.
    fn shortest_corridor_path(&self, from: &str, to: &str) -> Result<Vec<String>> {
        let unresolved = || Error::UnresolvedRoute { from: from.to_string(), to: to.to_string() };

        let start_set = self.corridors_containing(from);
        let goal_set: HashSet<&str> = self.corridors_containing(to).iter().map(|c| c.id.as_str()).collect();

        if start_set.is_empty() || goal_set.is_empty() {
            return Err(unresolved());
        }

        let mut predecessors: BTreeMap<String, Option<String>> = BTreeMap::new();
        let mut queue = VecDeque::new();

        for corridor in &start_set {
            predecessors.insert(corridor.id.clone(), None);
            queue.push_back(corridor.id.clone());
        }

        while let Some(current_id) = queue.pop_front() {
            if goal_set.contains(current_id.as_str()) {
                let mut path = vec![current_id.clone()];
                let mut cursor = current_id;

                while let Some(Some(previous)) = predecessors.get(&cursor) {
                    path.push(previous.clone());
                    cursor = previous.clone();
                }

                path.reverse();
                return Ok(path);
            }

            let current = &self.corridors[&current_id];

            for neighbor in self.corridors.values() {
                if predecessors.contains_key(&neighbor.id) {
                    continue;
                }

                let shares_endpoint = [&current.endpoints.0, &current.endpoints.1]
                    .iter()
                    .any(|endpoint| neighbor.endpoints.0 == **endpoint || neighbor.endpoints.1 == **endpoint);

                if shares_endpoint {
                    predecessors.insert(neighbor.id.clone(), Some(current_id.clone()));
                    queue.push_back(neighbor.id.clone());
                }
            }
        }

        Err(unresolved())
    }

    /// Orients a resolved route into entry/exit legs, starting from `origin`.
    pub fn orient_route(&self, route: &[String], origin: &str) -> Result<Vec<RouteLeg>> {
        let mut legs: Vec<RouteLeg> = Vec::with_capacity(route.len());

        for (index, corridor_id) in route.iter().enumerate() {
            let corridor = self.corridor(corridor_id).ok_or_else(|| Error::UnknownCorridor(corridor_id.clone()))?;
            let (first, second) = (corridor.endpoints.0.clone(), corridor.endpoints.1.clone());

            let entry = if let Some(previous) = legs.last() {
                // Continue from where the previous leg ended.
                if previous.exit == first || previous.exit == second {
                    previous.exit.clone()
                } else {
                    return Err(Error::UnresolvedRoute { from: previous.exit.clone(), to: corridor_id.clone() });
                }
            } else if first == origin {
                first.clone()
            } else if second == origin {
                second.clone()
            } else {
                // Origin lies inside the corridor; start from the endpoint
                // nearer the next corridor's far side, or the nearer endpoint
                // geographically when this is the only leg.
                self.entry_for_interior_origin(corridor, route.get(index + 1), origin)?
            };

            let exit = corridor.other_endpoint(&entry).expect("entry is an endpoint").to_string();

            let reversed = entry == second;

            legs.push(RouteLeg { corridor: corridor_id.clone(), entry, exit, reversed });
        }

        Ok(legs)
    }

    fn entry_for_interior_origin(&self, corridor: &Corridor, next_corridor: Option<&String>, origin: &str) -> Result<String> {
        if let Some(next_id) = next_corridor {
            let next = self.corridor(next_id).ok_or_else(|| Error::UnknownCorridor(next_id.clone()))?;

            // The exit must connect to the next corridor, so enter from the
            // endpoint that does not.
            for (candidate_entry, candidate_exit) in
                [(&corridor.endpoints.0, &corridor.endpoints.1), (&corridor.endpoints.1, &corridor.endpoints.0)]
            {
                if next.endpoints.0 == *candidate_exit || next.endpoints.1 == *candidate_exit {
                    return Ok(candidate_entry.clone());
                }
            }

            return Err(Error::UnresolvedRoute { from: corridor.id.clone(), to: next_id.clone() });
        }

        let origin_station = self.station(origin).ok_or_else(|| Error::UnknownStation(origin.to_string()))?;

        let first = self.station(&corridor.endpoints.0).ok_or_else(|| Error::UnknownStation(corridor.endpoints.0.clone()))?;
        let second = self.station(&corridor.endpoints.1).ok_or_else(|| Error::UnknownStation(corridor.endpoints.1.clone()))?;

        if origin_station.position.distance_km(&first.position) <= origin_station.position.distance_km(&second.position) {
            Ok(first.code.clone())
        } else {
            Ok(second.code.clone())
        }
    }
}
