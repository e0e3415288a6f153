#![allow(dead_code)]

use rail_dss::domain::simulation::engine::SimulationEngine;
use rail_dss::domain::simulation::train::{TrainSchedule, TrainType};
use rail_dss::domain::topology::graph::TrackGraph;
use rail_dss::domain::topology::segment::{GeoPoint, TrackClass, TrackSegment};
use rail_dss::domain::topology::station::Station;

// Station coordinates roughly along the Bengaluru - Mysuru line.
pub const SBC: (f64, f64) = (12.9763, 77.5619);
pub const KGI: (f64, f64) = (12.9077, 77.4827);
pub const MYA: (f64, f64) = (12.5223, 76.8954);
pub const MYS: (f64, f64) = (12.3072, 76.6497);

fn point(coords: (f64, f64)) -> GeoPoint {
    GeoPoint::new(coords.0, coords.1)
}

fn midpoint(a: (f64, f64), b: (f64, f64)) -> GeoPoint {
    GeoPoint::new((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0)
}

fn track(name: &str, from: (f64, f64), to: (f64, f64), class: TrackClass, capacity: u32, corridor: &str) -> TrackSegment {
    let points = vec![point(from), midpoint(from, to), point(to)];
    TrackSegment::new(name.to_string(), points, class, capacity, corridor.to_string()).expect("fixture track must be valid")
}

/// Three-corridor test network: SBC-KGI (main + siding), KGI-MYA (main +
/// secondary bypass), MYA-MYS (main only).
pub fn corridor_graph() -> TrackGraph {
    let segments = vec![
        track("SBC-KGI main", SBC, KGI, TrackClass::Main, 2, "SBC-KGI"),
        track("KGI loop siding", SBC, KGI, TrackClass::Siding, 1, "SBC-KGI"),
        track("KGI-MYA main", KGI, MYA, TrackClass::Main, 1, "KGI-MYA"),
        track("MYA bypass", KGI, MYA, TrackClass::Secondary, 1, "KGI-MYA"),
        track("MYA-MYS main", MYA, MYS, TrackClass::Main, 1, "MYA-MYS"),
    ];

    let stations = vec![
        Station::new("SBC".to_string(), "Bengaluru City".to_string(), point(SBC), 10, None),
        Station::new("KGI".to_string(), "Kengeri".to_string(), point(KGI), 3, None),
        Station::new("MYA".to_string(), "Mandya".to_string(), point(MYA), 4, None),
        Station::new("MYS".to_string(), "Mysuru".to_string(), point(MYS), 6, None),
    ];

    TrackGraph::new(segments, stations).expect("fixture topology must resolve")
}

/// Same network plus a station attached to no corridor.
pub fn graph_with_isolated_station() -> TrackGraph {
    let segments = vec![
        track("SBC-KGI main", SBC, KGI, TrackClass::Main, 2, "SBC-KGI"),
        track("KGI-MYA main", KGI, MYA, TrackClass::Main, 1, "KGI-MYA"),
        track("MYA-MYS main", MYA, MYS, TrackClass::Main, 1, "MYA-MYS"),
    ];

    let stations = vec![
        Station::new("SBC".to_string(), "Bengaluru City".to_string(), point(SBC), 10, None),
        Station::new("KGI".to_string(), "Kengeri".to_string(), point(KGI), 3, None),
        Station::new("MYA".to_string(), "Mandya".to_string(), point(MYA), 4, None),
        Station::new("MYS".to_string(), "Mysuru".to_string(), point(MYS), 6, None),
        Station::new("ISO".to_string(), "Far Away".to_string(), GeoPoint::new(10.0, 75.0), 2, None),
    ];

    TrackGraph::new(segments, stations).expect("fixture topology must resolve")
}

pub fn schedule(train_id: &str, dep_time: f64, speed_kmh: f64, stops: &[&str]) -> TrainSchedule {
    TrainSchedule {
        train_id: train_id.to_string(),
        dep_time,
        arr_time: dep_time + 120.0,
        speed_kmh,
        stops: stops.iter().map(|s| s.to_string()).collect(),
        priority: 1,
        train_type: TrainType::Regular,
        through_destination: None,
    }
}

pub fn engine_with(schedules: Vec<TrainSchedule>) -> SimulationEngine {
    SimulationEngine::new(corridor_graph(), schedules).expect("fixture engine must build")
}
