use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::domain::optimizer::event::EventKind;
use crate::domain::optimizer::lp::MilpSolution;
use crate::domain::optimizer::model::BuiltModel;

/// One rescheduled milestone in the solved timetable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduledEvent {
    pub corridor: String,
    pub kind: EventKind,
    pub original_time: f64,
    pub new_time: f64,
    pub mandatory_stop: bool,
    /// Physical track index within the corridor this event was assigned to.
    pub track_index: usize,
}

/// Outcome of one optimization call. Immutable once produced; a failed
/// result carries no schedule and leaves the prior timetable authoritative.
#[derive(Debug, Clone, Serialize)]
pub struct OptimizationResult {
    pub success: bool,
    pub objective_value: f64,
    /// New event list per train, in corridor-traversal order of the solve.
    pub new_schedule: BTreeMap<String, Vec<ScheduledEvent>>,
    /// Trains assigned to a non-primary track on any of their events.
    pub rerouted_trains: BTreeSet<String>,
    /// Sum over all events of `new_time - original_time`, in minutes.
    pub total_delay: f64,
    pub solve_time_secs: f64,
    pub message: String,
}

impl OptimizationResult {
    pub fn failure(message: String, solve_time_secs: f64) -> Self {
        OptimizationResult {
            success: false,
            objective_value: f64::INFINITY,
            new_schedule: BTreeMap::new(),
            rerouted_trains: BTreeSet::new(),
            total_delay: 0.0,
            solve_time_secs,
            message,
        }
    }
}

/// Converts raw solver output into a concrete updated schedule and a
/// rerouting/delay report.
pub struct SolutionExtractor;

impl SolutionExtractor {
    pub fn extract(model: &BuiltModel, solution: &MilpSolution, solve_time_secs: f64) -> OptimizationResult {
        let mut new_schedule: BTreeMap<String, Vec<ScheduledEvent>> = BTreeMap::new();
        let mut total_delay = 0.0;

        for (k, event) in model.events.iter().enumerate() {
            let new_time = solution.value(model.time_vars[k]);
            total_delay += new_time - event.scheduled_time;

            // Exactly one track binary per event is 1 by constraint.
            let track_index = model.track_vars[k].iter().position(|var| solution.value(*var) >= 0.5).unwrap_or(0);

            new_schedule.entry(event.train_id.clone()).or_default().push(ScheduledEvent {
                corridor: event.corridor.clone(),
                kind: event.kind,
                original_time: event.scheduled_time,
                new_time,
                mandatory_stop: event.mandatory_stop,
                track_index,
            });
        }

        let mut rerouted_trains = BTreeSet::new();

        for reroute in &model.reroute_vars {
            if solution.value(reroute.var) >= 0.5 {
                rerouted_trains.insert(model.events[reroute.event_index].train_id.clone());
            }
        }

        OptimizationResult {
            success: true,
            objective_value: solution.objective_value,
            new_schedule,
            rerouted_trains,
            total_delay,
            solve_time_secs,
            message: "Optimal solution found".to_string(),
        }
    }
}

/// Impact summary of a what-if insertion.
#[derive(Debug, Clone, Serialize)]
pub struct WhatIfImpact {
    pub additional_delay: f64,
    pub affected_trains: usize,
    pub feasible: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct WhatIfReport {
    pub result: OptimizationResult,
    pub impact: WhatIfImpact,
}
