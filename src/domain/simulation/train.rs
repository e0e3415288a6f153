use serde::Serialize;

use crate::domain::simulation::ledger::DisruptionLedger;
use crate::domain::topology::graph::{RouteLeg, TrackGraph};
use crate::domain::topology::segment::TrackClass;
use crate::error::{Error, Result};

/// Train classification. Special trains may be inserted mid-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainType {
    Regular,
    Special,
}

impl TrainType {
    pub fn parse(s: &str) -> Option<TrainType> {
        match s {
            "regular" => Some(TrainType::Regular),
            "special" => Some(TrainType::Special),
            _ => None,
        }
    }
}

/// Lifecycle of a train within one simulation run.
///
/// Legal transitions: `waiting → running → (dwelling ⇄ running) → completed`,
/// with `through` replacing `completed` for trains continuing past the last
/// modeled station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainStatus {
    Waiting,
    Running,
    Dwelling,
    Completed,
    Through,
}

impl TrainStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TrainStatus::Completed | TrainStatus::Through)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, TrainStatus::Running | TrainStatus::Dwelling)
    }
}

/// A train's timetable entry: identity, timing, speed and ordered stops.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainSchedule {
    pub train_id: String,
    /// Scheduled departure, minutes from simulation epoch.
    pub dep_time: f64,
    /// Scheduled arrival, minutes from simulation epoch.
    pub arr_time: f64,
    pub speed_kmh: f64,
    /// Ordered station codes; first is the origin, last the destination.
    pub stops: Vec<String>,
    pub priority: u8,
    pub train_type: TrainType,
    /// Destination beyond the modeled corridor, if the train runs through.
    pub through_destination: Option<String>,
}

/// Current position and status snapshot of a train. Written only by its own
/// agent, readable by everyone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainPosition {
    pub train_id: String,
    pub lat: f64,
    pub lon: f64,
    pub speed: f64,
    pub status: TrainStatus,
    pub current_corridor: Option<String>,
    pub next_station: String,
    /// Cumulative delay in minutes, monotonically non-decreasing within a run.
    pub delay: f64,
    pub track_class: TrackClass,
}

/// One planned interval in a train's journey.
#[derive(Debug, Clone)]
enum Phase {
    Traverse { leg_index: usize, start: f64, end: f64 },
    Dwell { leg_index: usize, station: String, start: f64, end: f64 },
}

#[derive(Debug, Clone)]
struct LegPlan {
    leg: RouteLeg,
    /// Undisturbed traverse minutes for this corridor at the train's speed.
    base_minutes: f64,
    /// Scheduled stop at the leg's exit station, with its dwell minutes.
    dwell_after: Option<(String, f64)>,
}

/// Per-train state machine advancing through its route under the clock's
/// control. The journey is precomputed as a phase timeline; `advance` is a
/// pure projection of that timeline at the current virtual time, which makes
/// it idempotent for a fixed `now`.
#[derive(Debug, Clone)]
pub struct TrainAgent {
    schedule: TrainSchedule,
    route: Vec<String>,
    legs: Vec<LegPlan>,
    timeline: Vec<Phase>,
    departure_time: f64,
    completion_time: f64,
    delay: f64,
    reschedule_offset: f64,
    position: TrainPosition,
    dirty: bool,
}

impl TrainAgent {
    /// Resolves the schedule against the topology and builds the initial
    /// timeline. Unresolvable routes and unknown stops fail here, at setup
    /// time, never during traversal.
    pub fn new(schedule: TrainSchedule, graph: &TrackGraph) -> Result<Self> {
        if schedule.stops.is_empty() {
            return Err(Error::InvalidSchedule { train_id: schedule.train_id.clone(), reason: "no stops".to_string() });
        }

        if schedule.speed_kmh <= 0.0 {
            return Err(Error::InvalidSchedule { train_id: schedule.train_id.clone(), reason: "non-positive speed".to_string() });
        }

        let route = graph.resolve_route(&schedule.stops)?;
        let route_legs = graph.orient_route(&route, &schedule.stops[0])?;

        let mut legs = Vec::with_capacity(route_legs.len());

        for leg in route_legs {
            let primary = graph.primary_track(&leg.corridor)?;
            let base_minutes = primary.traverse_minutes(schedule.speed_kmh);

            let dwell_after = if schedule.stops.iter().any(|stop| stop == &leg.exit) {
                let station = graph.station(&leg.exit).ok_or_else(|| Error::UnknownStation(leg.exit.clone()))?;
                Some((leg.exit.clone(), station.dwell_minutes))
            } else {
                None
            };

            legs.push(LegPlan { leg, base_minutes, dwell_after });
        }

        let origin = graph.station(&schedule.stops[0]).ok_or_else(|| Error::UnknownStation(schedule.stops[0].clone()))?;

        let position = TrainPosition {
            train_id: schedule.train_id.clone(),
            lat: origin.position.lat,
            lon: origin.position.lon,
            speed: 0.0,
            status: TrainStatus::Waiting,
            current_corridor: None,
            next_station: schedule.stops[0].clone(),
            delay: 0.0,
            track_class: TrackClass::Main,
        };

        let mut agent = TrainAgent {
            schedule,
            route,
            legs,
            timeline: Vec::new(),
            departure_time: 0.0,
            completion_time: 0.0,
            delay: 0.0,
            reschedule_offset: 0.0,
            position,
            dirty: false,
        };

        agent.rebuild_timeline(&DisruptionLedger::new());

        Ok(agent)
    }

    pub fn schedule(&self) -> &TrainSchedule {
        &self.schedule
    }

    pub fn route(&self) -> &[String] {
        &self.route
    }

    pub fn position(&self) -> &TrainPosition {
        &self.position
    }

    pub fn status(&self) -> TrainStatus {
        self.position.status
    }

    pub fn delay(&self) -> f64 {
        self.delay
    }

    /// Adds disruption delay to the train's cumulative counter and schedules
    /// a timeline rebuild on the next advance.
    pub fn add_delay(&mut self, minutes: f64) {
        self.delay += minutes;
        self.position.delay = self.delay;
        self.dirty = true;
    }

    /// Shifts the effective departure, typically from an applied reschedule.
    pub fn set_reschedule_offset(&mut self, minutes: f64) {
        self.reschedule_offset = minutes.max(0.0);
        self.dirty = true;
    }

    pub fn needs_rebuild(&self) -> bool {
        self.dirty
    }

    /// Recomputes the phase timeline from the schedule and the ledger.
    ///
    /// Each ledger entry applies in exactly one place: entries matching a
    /// corridor on the route stretch that corridor's traversal; entries that
    /// match no on-route corridor push the departure instead.
    pub fn rebuild_timeline(&mut self, ledger: &DisruptionLedger) {
        let train_id = self.schedule.train_id.clone();

        self.departure_time = self.schedule.dep_time + self.reschedule_offset + ledger.delay_off_route(&train_id, &self.route);

        let mut timeline = Vec::with_capacity(self.legs.len() * 2);
        let mut t = self.departure_time;

        for (leg_index, plan) in self.legs.iter().enumerate() {
            let traverse = plan.base_minutes + ledger.delay_for(&train_id, &plan.leg.corridor);

            timeline.push(Phase::Traverse { leg_index, start: t, end: t + traverse });
            t += traverse;

            if let Some((station, dwell)) = &plan.dwell_after {
                timeline.push(Phase::Dwell { leg_index, station: station.clone(), start: t, end: t + dwell });
                t += dwell;
            }
        }

        self.timeline = timeline;
        self.completion_time = t;
        self.dirty = false;
    }

    fn terminal_status(&self) -> TrainStatus {
        if self.schedule.through_destination.is_some() {
            TrainStatus::Through
        } else {
            TrainStatus::Completed
        }
    }

    /// Projects the timeline at virtual time `now` into the position snapshot.
    pub fn advance(&mut self, now: f64, graph: &TrackGraph) {
        if self.dirty {
            log::debug!("Timeline of train {} is stale during advance; projecting the stale plan", self.schedule.train_id);
        }

        self.position = self.project(now, graph);
    }

    fn project(&self, now: f64, graph: &TrackGraph) -> TrainPosition {
        let mut position = self.position.clone();
        position.delay = self.delay;

        if now < self.departure_time || self.timeline.is_empty() {
            let origin = &self.schedule.stops[0];

            if let Some(station) = graph.station(origin) {
                position.lat = station.position.lat;
                position.lon = station.position.lon;
            }

            position.speed = 0.0;
            position.status = TrainStatus::Waiting;
            position.current_corridor = None;
            position.next_station = origin.clone();
            position.track_class = TrackClass::Main;
            return position;
        }

        for phase in &self.timeline {
            match phase {
                Phase::Traverse { leg_index, start, end } if now < *end => {
                    let plan = &self.legs[*leg_index];

                    let track = match graph.primary_track(&plan.leg.corridor) {
                        Ok(track) => track,
                        Err(_) => return position,
                    };

                    let duration = end - start;
                    let progress = if duration > 0.0 { (now - start) / duration } else { 1.0 };
                    let oriented = if plan.leg.reversed { 1.0 - progress } else { progress };

                    let point = track.interpolate(oriented);

                    position.lat = point.lat;
                    position.lon = point.lon;
                    position.speed = self.schedule.speed_kmh;
                    position.status = TrainStatus::Running;
                    position.current_corridor = Some(plan.leg.corridor.clone());
                    position.next_station = plan.leg.exit.clone();
                    position.track_class = track.class;
                    return position;
                }
                Phase::Dwell { leg_index, station, end, .. } if now < *end => {
                    let plan = &self.legs[*leg_index];

                    if let Some(station) = graph.station(station) {
                        position.lat = station.position.lat;
                        position.lon = station.position.lon;
                    }

                    position.speed = 0.0;
                    position.status = TrainStatus::Dwelling;
                    position.current_corridor = Some(plan.leg.corridor.clone());
                    position.next_station = station.clone();
                    position.track_class = TrackClass::Main;
                    return position;
                }
                _ => {}
            }
        }

        // Past the last phase: journey complete.
        if let Some(plan) = self.legs.last() {
            if let Some(station) = graph.station(&plan.leg.exit) {
                position.lat = station.position.lat;
                position.lon = station.position.lon;
            }
            position.next_station = plan.leg.exit.clone();
        }

        position.speed = 0.0;
        position.status = self.terminal_status();
        position.current_corridor = None;
        position.track_class = TrackClass::Main;
        position
    }

    /// Returns the train to `waiting` with zero delay and an undisturbed
    /// timeline. The schedule and resolved route persist.
    pub fn reset(&mut self, graph: &TrackGraph) {
        self.delay = 0.0;
        self.reschedule_offset = 0.0;
        self.rebuild_timeline(&DisruptionLedger::new());

        let origin = &self.schedule.stops[0];
        let (lat, lon) = match graph.station(origin) {
            Some(station) => (station.position.lat, station.position.lon),
            None => (self.position.lat, self.position.lon),
        };

        self.position = TrainPosition {
            train_id: self.schedule.train_id.clone(),
            lat,
            lon,
            speed: 0.0,
            status: TrainStatus::Waiting,
            current_corridor: None,
            next_station: origin.clone(),
            delay: 0.0,
            track_class: TrackClass::Main,
        };
    }
}
