use crate::domain::simulation::engine::SimulationEngine;
use crate::error::Result;
use crate::loader::parser::{load_schedules, load_topology};

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod loader;
pub mod logger;

/// Builds a ready-to-run simulation engine from a GeoJSON network file and a
/// timetable CSV. Initializes logging as a side effect.
pub fn build_engine(geo_path: &str, schedule_path: &str) -> Result<SimulationEngine> {
    logger::init();
    log::info!("Logger initialized. Loading corridor network and timetable.");

    let graph = load_topology(geo_path)?;
    let schedules = load_schedules(schedule_path)?;

    let engine = SimulationEngine::new(graph, schedules)?;
    log::info!("Simulation engine constructed successfully.");

    Ok(engine)
}
