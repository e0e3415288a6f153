use serde::Serialize;

use crate::domain::topology::graph::TrackGraph;
use crate::error::{Error, Result};

/// Dwell minutes charged in the event schedule when a corridor contains a
/// mandatory stop.
const EVENT_DWELL_MINUTES: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Arrival,
    Departure,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Arrival => "arrival",
            EventKind::Departure => "departure",
        }
    }
}

/// An arrival or departure milestone for one train in one corridor: the
/// atomic unit the optimizer reschedules. Events are derived from current
/// train state on every optimization call, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub train_id: String,
    pub corridor: String,
    pub kind: EventKind,
    pub scheduled_time: f64,
    /// True iff any of the train's declared stops lies within this corridor.
    pub mandatory_stop: bool,
}

/// Immutable copy of one train's optimizer-relevant state, taken from the
/// engine while the simulation is paused.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainSnapshot {
    pub train_id: String,
    pub dep_time: f64,
    pub speed_kmh: f64,
    pub stops: Vec<String>,
    /// Resolved corridor ids in traversal order.
    pub route: Vec<String>,
    pub delay: f64,
}

/// Emits an arrival and a departure event per corridor on each train's
/// route, advancing a cursor by the corridor travel time and a dwell
/// increment at mandatory stops. Times are nominal; ledger delays enter the
/// model through disruption-floor constraints instead.
pub fn build_events(graph: &TrackGraph, trains: &[TrainSnapshot]) -> Result<Vec<Event>> {
    let mut events = Vec::new();

    for train in trains {
        let mut cursor = train.dep_time;

        for corridor_id in &train.route {
            let corridor = graph.corridor(corridor_id).ok_or_else(|| Error::UnknownCorridor(corridor_id.clone()))?;

            let travel = graph.primary_track(corridor_id)?.traverse_minutes(train.speed_kmh);

            let mandatory_stop = train.stops.iter().any(|stop| corridor.contains_station(stop));

            events.push(Event {
                train_id: train.train_id.clone(),
                corridor: corridor_id.clone(),
                kind: EventKind::Arrival,
                scheduled_time: cursor,
                mandatory_stop,
            });

            cursor += travel;

            events.push(Event {
                train_id: train.train_id.clone(),
                corridor: corridor_id.clone(),
                kind: EventKind::Departure,
                scheduled_time: cursor,
                mandatory_stop,
            });

            if mandatory_stop {
                cursor += EVENT_DWELL_MINUTES;
            }
        }
    }

    // Scheduled-time order defines the natural precedence the order-flip
    // budget is measured against.
    events.sort_by(|a, b| {
        a.scheduled_time
            .total_cmp(&b.scheduled_time)
            .then_with(|| a.train_id.cmp(&b.train_id))
            .then_with(|| a.corridor.cmp(&b.corridor))
            .then_with(|| a.kind.as_str().cmp(b.kind.as_str()))
    });

    Ok(events)
}
