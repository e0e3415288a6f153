use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::domain::optimizer::event::TrainSnapshot;
use crate::domain::optimizer::result::OptimizationResult;
use crate::domain::simulation::clock::SimulationClock;
use crate::domain::simulation::ledger::{Disruption, DisruptionLedger};
use crate::domain::simulation::train::{TrainAgent, TrainPosition, TrainSchedule};
use crate::domain::topology::graph::TrackGraph;
use crate::error::{Error, Result};

/// Completed trains with at most this much delay count as on time.
const ON_TIME_THRESHOLD_MINUTES: f64 = 5.0;

/// Aggregate counters over the current train population.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationStats {
    pub total_trains: usize,
    pub active: usize,
    pub completed: usize,
    pub on_time: usize,
    pub delayed: usize,
    pub avg_delay: f64,
    /// Active-train count, the corridor's momentary throughput.
    pub throughput: usize,
}

/// The engine context: topology, virtual clock, train agents and the
/// disruption ledger, mutated only through its own methods.
///
/// A single logical timeline drives all trains. Steps are non-reentrant;
/// overlapping calls on one instance must be serialized by the caller.
#[derive(Debug)]
pub struct SimulationEngine {
    graph: TrackGraph,
    clock: SimulationClock,
    trains: BTreeMap<String, TrainAgent>,
    ledger: DisruptionLedger,
    /// Trains present at construction; insertions after that are discarded
    /// on reset.
    original_ids: BTreeSet<String>,
}

impl SimulationEngine {
    /// Builds the engine from loaded topology and schedules. Any train whose
    /// route cannot be resolved fails construction.
    pub fn new(graph: TrackGraph, schedules: Vec<TrainSchedule>) -> Result<Self> {
        let mut trains = BTreeMap::new();

        for schedule in schedules {
            let train_id = schedule.train_id.clone();

            if trains.contains_key(&train_id) {
                return Err(Error::DuplicateTrain(train_id));
            }

            let agent = TrainAgent::new(schedule, &graph)?;
            trains.insert(train_id, agent);
        }

        let original_ids = trains.keys().cloned().collect();

        log::info!("Simulation engine ready with {} trains over {} corridors", trains.len(), graph.corridor_count());

        Ok(SimulationEngine { graph, clock: SimulationClock::new(), trains, ledger: DisruptionLedger::new(), original_ids })
    }

    pub fn graph(&self) -> &TrackGraph {
        &self.graph
    }

    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    pub fn ledger(&self) -> &DisruptionLedger {
        &self.ledger
    }

    pub fn train(&self, train_id: &str) -> Option<&TrainAgent> {
        self.trains.get(train_id)
    }

    pub fn train_count(&self) -> usize {
        self.trains.len()
    }

    /// Advances the clock by `minutes` and recomputes every train.
    pub fn step(&mut self, minutes: f64) {
        let now = self.clock.advance_by(minutes);
        self.advance(now);
    }

    /// Recomputes every live train's position and state for virtual time
    /// `now`. Idempotent for the same `now` with no intervening disruption.
    ///
    /// Stale timelines are rebuilt before any position is written, so
    /// readers never observe a train mid-update.
    pub fn advance(&mut self, now: f64) {
        for agent in self.trains.values_mut() {
            if agent.needs_rebuild() {
                agent.rebuild_timeline(&self.ledger);
            }
        }

        for agent in self.trains.values_mut() {
            agent.advance(now, &self.graph);
        }
    }

    /// Appends a disruption to the ledger and adds its delay to the train.
    /// Fails without mutating state if the train or corridor is unknown or
    /// the delay is negative.
    pub fn add_disruption(&mut self, train_id: &str, corridor: &str, delay_minutes: f64, reason: &str) -> Result<()> {
        if !self.trains.contains_key(train_id) {
            return Err(Error::UnknownTrain(train_id.to_string()));
        }

        if self.graph.corridor(corridor).is_none() {
            return Err(Error::UnknownCorridor(corridor.to_string()));
        }

        if delay_minutes < 0.0 {
            return Err(Error::NegativeDelay { train_id: train_id.to_string(), minutes: delay_minutes });
        }

        self.ledger.append(Disruption {
            train_id: train_id.to_string(),
            corridor: corridor.to_string(),
            delay_minutes,
            timestamp: self.clock.now(),
            reason: reason.to_string(),
        })?;

        let agent = self.trains.get_mut(train_id).expect("presence checked above");
        agent.add_delay(delay_minutes);

        Ok(())
    }

    /// Constructs a new agent for `schedule` and adds it to the run. Fails if
    /// the id already exists or the route cannot be resolved.
    pub fn insert_train(&mut self, schedule: TrainSchedule) -> Result<()> {
        let train_id = schedule.train_id.clone();

        if self.trains.contains_key(&train_id) {
            return Err(Error::DuplicateTrain(train_id));
        }

        let mut agent = TrainAgent::new(schedule, &self.graph)?;
        agent.advance(self.clock.now(), &self.graph);

        log::info!("Inserted train {} at t={:.1}", train_id, self.clock.now());
        self.trains.insert(train_id, agent);

        Ok(())
    }

    /// Discards all derived state: clock, ledger, delays, positions and any
    /// train inserted after construction. Topology and original schedules
    /// persist; every original train returns to `waiting`.
    pub fn reset(&mut self) {
        self.clock.reset();
        self.ledger.clear();
        self.trains.retain(|id, _| self.original_ids.contains(id));

        for agent in self.trains.values_mut() {
            agent.reset(&self.graph);
        }

        log::info!("Simulation reset: {} trains back to waiting", self.trains.len());
    }

    /// Position snapshots for all trains, ordered by train id.
    pub fn positions(&self) -> Vec<TrainPosition> {
        self.trains.values().map(|agent| agent.position().clone()).collect()
    }

    pub fn stats(&self) -> SimulationStats {
        let total_trains = self.trains.len();

        let active = self.trains.values().filter(|a| a.status().is_active()).count();
        let completed_agents: Vec<_> = self.trains.values().filter(|a| a.status().is_terminal()).collect();

        let completed = completed_agents.len();
        let on_time = completed_agents.iter().filter(|a| a.delay() <= ON_TIME_THRESHOLD_MINUTES).count();
        let delayed = completed - on_time;

        let avg_delay = if completed > 0 { completed_agents.iter().map(|a| a.delay()).sum::<f64>() / completed as f64 } else { 0.0 };

        SimulationStats { total_trains, active, completed, on_time, delayed, avg_delay, throughput: active }
    }

    /// Immutable per-train snapshots for the optimizer: schedule, resolved
    /// route and accumulated delay. The optimizer works on this copy while
    /// the engine is paused; it never touches live agents.
    pub fn snapshots(&self) -> Vec<TrainSnapshot> {
        self.trains
            .values()
            .map(|agent| {
                let schedule = agent.schedule();

                TrainSnapshot {
                    train_id: schedule.train_id.clone(),
                    dep_time: schedule.dep_time,
                    speed_kmh: schedule.speed_kmh,
                    stops: schedule.stops.clone(),
                    route: agent.route().to_vec(),
                    delay: agent.delay(),
                }
            })
            .collect()
    }

    /// Feeds a successful reschedule back into the agents: each train's
    /// effective departure shifts by its first event's delta. The part of
    /// that delta explained by the train's own ledger entries is subtracted,
    /// since the timeline already stretches the disrupted corridor; the
    /// offset carries only what the train yields beyond its own disruptions.
    /// Failed results leave all trains on their current trajectory.
    pub fn apply_reschedule(&mut self, result: &OptimizationResult) {
        if !result.success {
            log::warn!("Not applying failed optimization result: {}", result.message);
            return;
        }

        for (train_id, events) in &result.new_schedule {
            let Some(agent) = self.trains.get_mut(train_id) else {
                log::warn!("Reschedule references unknown train {train_id}");
                continue;
            };

            let offset = events
                .iter()
                .min_by(|a, b| a.original_time.total_cmp(&b.original_time))
                .map(|event| event.new_time - event.original_time - self.ledger.delay_for(train_id, &event.corridor))
                .unwrap_or(0.0);

            agent.set_reschedule_offset(offset);
        }

        let now = self.clock.now();
        self.advance(now);
    }
}
