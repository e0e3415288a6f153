use serde::de::DeserializeOwned;
use std::fs;
use std::io::Read;

use crate::api::geo_dto::{FeatureCollectionDto, GeometryDto};
use crate::api::request_dto::SpecialTrainRequestDto;
use crate::api::schedule_dto::{ScheduleRowDto, parse_stop_list};
use crate::domain::simulation::train::{TrainSchedule, TrainType};
use crate::domain::topology::graph::TrackGraph;
use crate::domain::topology::segment::{GeoPoint, TrackClass, TrackSegment};
use crate::domain::topology::station::Station;
use crate::error::{Error, Result};

/// Parses a JSON file into a given type `T`.
pub fn parse_json_file<T: DeserializeOwned>(file_path: &str) -> Result<T> {
    let data = fs::read_to_string(file_path)?;
    parse_json_str(&data)
}

/// Parses a JSON string into a given type `T`.
pub fn parse_json_str<T: DeserializeOwned>(data: &str) -> Result<T> {
    let parsed: T = serde_json::from_str(data)?;
    Ok(parsed)
}

/// Loads the corridor network from a GeoJSON file: LineString features become
/// tracks, Point features become stations, and the graph derives corridor
/// grouping from the track properties.
pub fn load_topology(file_path: &str) -> Result<TrackGraph> {
    let dto: FeatureCollectionDto = parse_json_file(file_path)?;
    log::info!("Parsed {} geographic features from '{}'", dto.features.len(), file_path);

    topology_from_dto(dto)
}

/// Converts the raw feature collection into a validated [`TrackGraph`].
pub fn topology_from_dto(dto: FeatureCollectionDto) -> Result<TrackGraph> {
    let mut segments = Vec::new();
    let mut stations = Vec::new();

    for feature in dto.features {
        let properties = feature.properties;

        match feature.geometry {
            GeometryDto::LineString { coordinates } => {
                let name = properties
                    .name
                    .ok_or_else(|| Error::InvalidGeometry { name: "<unnamed track>".to_string(), reason: "track feature has no name".to_string() })?;

                let corridor = properties
                    .segment
                    .ok_or_else(|| Error::InvalidGeometry { name: name.clone(), reason: "track feature has no segment label".to_string() })?;

                let class_label = properties.track_type.as_deref().unwrap_or("main");
                let class = TrackClass::parse(class_label)
                    .ok_or_else(|| Error::InvalidGeometry { name: name.clone(), reason: format!("unknown track type '{class_label}'") })?;

                // GeoJSON order is [lon, lat].
                let points = coordinates.iter().map(|c| GeoPoint::new(c[1], c[0])).collect();

                segments.push(TrackSegment::new(name, points, class, properties.capacity.unwrap_or(1), corridor)?);
            }
            GeometryDto::Point { coordinates } => {
                let code = properties
                    .code
                    .ok_or_else(|| Error::InvalidGeometry { name: properties.name.clone().unwrap_or_default(), reason: "station feature has no code".to_string() })?;

                let name = properties.name.unwrap_or_else(|| code.clone());
                let position = GeoPoint::new(coordinates[1], coordinates[0]);

                stations.push(Station::new(code, name, position, properties.platforms.unwrap_or(1), properties.dwell_minutes));
            }
        }
    }

    TrackGraph::new(segments, stations)
}

/// Loads the timetable CSV into validated schedules.
pub fn load_schedules(file_path: &str) -> Result<Vec<TrainSchedule>> {
    let file = fs::File::open(file_path)?;
    let schedules = schedules_from_reader(file)?;

    log::info!("Loaded {} train schedules from '{}'", schedules.len(), file_path);

    Ok(schedules)
}

/// Reads timetable rows from any CSV source.
pub fn schedules_from_reader<R: Read>(reader: R) -> Result<Vec<TrainSchedule>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut schedules = Vec::new();

    for row in csv_reader.deserialize::<ScheduleRowDto>() {
        schedules.push(schedule_from_dto(row?)?);
    }

    Ok(schedules)
}

/// Converts one timetable row, parsing the stop list and the train type.
pub fn schedule_from_dto(row: ScheduleRowDto) -> Result<TrainSchedule> {
    let stops = parse_stop_list(&row.stops)?;

    let train_type = match row.train_type.as_deref() {
        None => TrainType::Regular,
        Some(label) => {
            TrainType::parse(label).ok_or_else(|| Error::InvalidSchedule { train_id: row.train_id.clone(), reason: format!("unknown type '{label}'") })?
        }
    };

    Ok(TrainSchedule {
        train_id: row.train_id,
        dep_time: row.dep_time,
        arr_time: row.arr_time,
        speed_kmh: row.speed_kmh,
        stops,
        priority: row.priority.unwrap_or(1),
        train_type,
        through_destination: row.through_destination.filter(|d| !d.is_empty()),
    })
}

/// Converts a special-train request into a schedule. The nominal arrival is
/// left open; special trains are timed by the optimizer, not the timetable.
pub fn special_from_dto(request: SpecialTrainRequestDto) -> Result<TrainSchedule> {
    if request.stops.is_empty() {
        return Err(Error::InvalidSchedule { train_id: request.train_id, reason: "no stops".to_string() });
    }

    Ok(TrainSchedule {
        train_id: request.train_id,
        dep_time: request.dep_time,
        arr_time: request.dep_time,
        speed_kmh: request.speed_kmh,
        stops: request.stops,
        priority: request.priority.unwrap_or(0),
        train_type: TrainType::Special,
        through_destination: request.through_destination,
    })
}
