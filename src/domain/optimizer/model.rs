use std::time::Instant;

use crate::config::OptimizerConfig;
use crate::domain::optimizer::event::{Event, TrainSnapshot, build_events};
use crate::domain::optimizer::lp::{LinearExpr, MilpBackend, MilpProblem, Sense, VarDomain, VarId};
use crate::domain::optimizer::result::{OptimizationResult, SolutionExtractor, WhatIfImpact, WhatIfReport};
use crate::domain::simulation::ledger::DisruptionLedger;
use crate::domain::simulation::train::TrainSchedule;
use crate::domain::topology::graph::TrackGraph;
use crate::error::{Error, Result};

/// A reroute decision variable: divert one event onto one alternative track.
#[derive(Debug, Clone)]
pub struct RerouteVar {
    pub event_index: usize,
    pub track: String,
    pub preserves_stops: bool,
    pub var: VarId,
}

/// The constructed MILP plus the bookkeeping needed to read a solution back.
#[derive(Debug)]
pub struct BuiltModel {
    pub problem: MilpProblem,
    pub events: Vec<Event>,
    pub time_vars: Vec<VarId>,
    /// Order variable per unordered pair (i, j) of events sharing a corridor;
    /// value 1 means event i precedes event j.
    pub order_vars: Vec<((usize, usize), VarId)>,
    /// Per event, one binary per physical track index of its corridor.
    pub track_vars: Vec<Vec<VarId>>,
    pub reroute_vars: Vec<RerouteVar>,
}

/// Builds the disruption-aware rescheduling MILP from current train states
/// and the ledger, and delegates solving to an external backend.
#[derive(Debug, Clone)]
pub struct RescheduleModel {
    config: OptimizerConfig,
}

impl RescheduleModel {
    pub fn new(config: OptimizerConfig) -> Self {
        RescheduleModel { config }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Constructs variables, objective and all constraint families. Fails
    /// with a configuration-class error when an event's corridor resolves to
    /// no physical track; that condition is validated explicitly rather than
    /// skipped.
    pub fn build(&self, graph: &TrackGraph, trains: &[TrainSnapshot], ledger: &DisruptionLedger) -> Result<BuiltModel> {
        let events = build_events(graph, trains)?;
        log::info!("Built {} events for rescheduling across {} trains", events.len(), trains.len());

        let mut problem = MilpProblem::new();

        // time[k]: continuous, bounded by the per-event delay budget.
        let time_vars: Vec<VarId> = events
            .iter()
            .enumerate()
            .map(|(k, event)| {
                problem.add_variable(
                    format!("t_{}_{}_{}_{}", event.train_id, event.corridor, event.kind.as_str(), k),
                    VarDomain::Continuous { lower: event.scheduled_time, upper: event.scheduled_time + self.config.max_delay_minutes },
                )
            })
            .collect();

        // order[i,j]: one binary per unordered pair sharing a corridor.
        let mut order_vars = Vec::new();

        for i in 0..events.len() {
            for j in (i + 1)..events.len() {
                if events[i].corridor == events[j].corridor {
                    let var = problem.add_variable(format!("x_{i}_{j}"), VarDomain::Binary);
                    order_vars.push(((i, j), var));
                }
            }
        }

        // track[k,t]: one binary per physical track index in the event's
        // corridor, up to the corridor's aggregate capacity.
        let mut track_vars: Vec<Vec<VarId>> = Vec::with_capacity(events.len());

        for (k, event) in events.iter().enumerate() {
            let corridor = graph.corridor(&event.corridor).ok_or_else(|| Error::UnknownCorridor(event.corridor.clone()))?;

            if corridor.aggregate_capacity == 0 || corridor.track_names.is_empty() {
                return Err(Error::ModelConstruction(format!("corridor '{}' has no track for event {}", event.corridor, k)));
            }

            let vars = (0..corridor.aggregate_capacity).map(|t| problem.add_variable(format!("y_{k}_{t}"), VarDomain::Binary)).collect();

            track_vars.push(vars);
        }

        // reroute[k,r]: one binary per siding/secondary alternative.
        let mut reroute_vars = Vec::new();

        for (k, event) in events.iter().enumerate() {
            for alternative in graph.alternatives(&event.corridor) {
                let var = problem.add_variable(format!("r_{}_{}", k, alternative.name), VarDomain::Binary);

                reroute_vars.push(RerouteVar {
                    event_index: k,
                    track: alternative.name.clone(),
                    preserves_stops: alternative.class.preserves_stops(),
                    var,
                });
            }
        }

        // Objective: delay penalty per minute past schedule plus a flat
        // penalty per selected reroute.
        let mut objective = LinearExpr::new();

        for (k, event) in events.iter().enumerate() {
            objective.add_term(time_vars[k], self.config.delay_penalty);
            objective.add_constant(-self.config.delay_penalty * event.scheduled_time);
        }

        for reroute in &reroute_vars {
            objective.add_term(reroute.var, self.config.reroute_penalty);
        }

        problem.set_objective(objective);

        self.add_headway_constraints(&mut problem, &events, &time_vars, &order_vars);
        self.add_capacity_constraints(&mut problem, &track_vars);
        self.add_stop_preservation_constraints(&mut problem, &events, &reroute_vars);
        self.add_precedence_budget(&mut problem, &order_vars);
        self.add_single_reroute_constraints(&mut problem, &events, &reroute_vars);
        self.add_disruption_floors(&mut problem, &events, &time_vars, ledger);

        Ok(BuiltModel { problem, events, time_vars, order_vars, track_vars, reroute_vars })
    }

    /// Disjunctive headway: whichever event precedes (per the order binary)
    /// must lead by at least the minimum headway. Big-M activation, with M
    /// tight against the pair's time bounds.
    fn add_headway_constraints(&self, problem: &mut MilpProblem, events: &[Event], time_vars: &[VarId], order_vars: &[((usize, usize), VarId)]) {
        let headway = self.config.headway_minutes;

        for ((i, j), order) in order_vars {
            let earlier = events[*i].scheduled_time.min(events[*j].scheduled_time);
            let later = events[*i].scheduled_time.max(events[*j].scheduled_time);
            let big_m = later + self.config.max_delay_minutes - earlier + headway;

            // t_j - t_i >= headway - M * (1 - order)
            let mut forward = LinearExpr::new();
            forward.add_term(time_vars[*j], 1.0).add_term(time_vars[*i], -1.0).add_term(*order, -big_m);
            problem.add_constraint(forward, Sense::Geq, headway - big_m);

            // t_i - t_j >= headway - M * order
            let mut backward = LinearExpr::new();
            backward.add_term(time_vars[*i], 1.0).add_term(time_vars[*j], -1.0).add_term(*order, big_m);
            problem.add_constraint(backward, Sense::Geq, headway);
        }
    }

    /// Each event occupies exactly one physical track of its corridor.
    fn add_capacity_constraints(&self, problem: &mut MilpProblem, track_vars: &[Vec<VarId>]) {
        for vars in track_vars {
            let mut assignment = LinearExpr::new();

            for var in vars {
                assignment.add_term(*var, 1.0);
            }

            problem.add_constraint(assignment, Sense::Eq, 1.0);
        }
    }

    /// Mandatory-stop events may only divert onto stop-preserving
    /// alternatives; every other reroute variable is forced to zero.
    fn add_stop_preservation_constraints(&self, problem: &mut MilpProblem, events: &[Event], reroute_vars: &[RerouteVar]) {
        for reroute in reroute_vars {
            if events[reroute.event_index].mandatory_stop && !reroute.preserves_stops {
                problem.add_constraint(LinearExpr::term(reroute.var, 1.0), Sense::Eq, 0.0);
            }
        }
    }

    /// Caps the number of pairwise order flips. Events are generated in
    /// scheduled order, so the natural assignment is all order binaries at 1
    /// and a flip is a zero.
    fn add_precedence_budget(&self, problem: &mut MilpProblem, order_vars: &[((usize, usize), VarId)]) {
        if order_vars.is_empty() {
            return;
        }

        let mut kept_order = LinearExpr::new();

        for (_, var) in order_vars {
            kept_order.add_term(*var, 1.0);
        }

        let minimum_kept = order_vars.len() as f64 - self.config.max_order_swaps as f64;
        problem.add_constraint(kept_order, Sense::Geq, minimum_kept);
    }

    /// At most one alternative route per event.
    fn add_single_reroute_constraints(&self, problem: &mut MilpProblem, events: &[Event], reroute_vars: &[RerouteVar]) {
        for k in 0..events.len() {
            let vars: Vec<VarId> = reroute_vars.iter().filter(|r| r.event_index == k).map(|r| r.var).collect();

            if vars.is_empty() {
                continue;
            }

            let mut selection = LinearExpr::new();

            for var in vars {
                selection.add_term(var, 1.0);
            }

            problem.add_constraint(selection, Sense::Leq, 1.0);
        }
    }

    /// Every ledger entry bounds its matching events from below by the
    /// recorded delay.
    fn add_disruption_floors(&self, problem: &mut MilpProblem, events: &[Event], time_vars: &[VarId], ledger: &DisruptionLedger) {
        for disruption in ledger.entries() {
            for (k, event) in events.iter().enumerate() {
                if event.train_id == disruption.train_id && event.corridor == disruption.corridor {
                    problem.add_constraint(LinearExpr::term(time_vars[k], 1.0), Sense::Geq, event.scheduled_time + disruption.delay_minutes);
                }
            }
        }
    }

    /// Full solve protocol: build the model, hand it to the backend with the
    /// configured time limit, and branch on the outcome. Any failure leaves
    /// the prior schedule authoritative; no partial schedule is produced.
    pub fn optimize(&self, graph: &TrackGraph, trains: &[TrainSnapshot], ledger: &DisruptionLedger, backend: &dyn MilpBackend) -> OptimizationResult {
        let started = Instant::now();

        let built = match self.build(graph, trains, ledger) {
            Ok(built) => built,
            Err(error) => {
                log::error!("Optimization aborted during model construction: {error}");
                return OptimizationResult::failure(format!("Model construction failed: {error}"), started.elapsed().as_secs_f64());
            }
        };

        log::info!("Solving rescheduling model with {} variables via {}", built.problem.variable_count(), backend.name());

        match backend.solve(&built.problem, self.config.solver_time_limit_secs) {
            Ok(solution) => {
                let solve_time = started.elapsed().as_secs_f64();

                // Backends that cannot stop themselves still answer; a solve
                // that overran the budget is rejected here.
                if solve_time > self.config.solver_time_limit_secs {
                    log::warn!("Discarding solution: solve took {:.2}s, limit is {:.0}s", solve_time, self.config.solver_time_limit_secs);
                    return OptimizationResult::failure(
                        format!("Time limit of {:.0}s exceeded after {:.2}s", self.config.solver_time_limit_secs, solve_time),
                        solve_time,
                    );
                }

                log::info!("Optimization completed in {:.2}s", solve_time);
                SolutionExtractor::extract(&built, &solution, solve_time)
            }
            Err(failure) => {
                let solve_time = started.elapsed().as_secs_f64();
                log::warn!("Optimization failed after {:.2}s: {}", solve_time, failure.status);
                OptimizationResult::failure(format!("Optimization failed: {}", failure.status), solve_time)
            }
        }
    }

    /// What-if scenario analysis: inserts a hypothetical extra train into a
    /// copy of the snapshot and re-runs the full optimize call. The live
    /// engine is never touched.
    pub fn what_if(
        &self,
        graph: &TrackGraph,
        base: &[TrainSnapshot],
        ledger: &DisruptionLedger,
        special: &TrainSchedule,
        backend: &dyn MilpBackend,
    ) -> Result<WhatIfReport> {
        let route = graph.resolve_route(&special.stops)?;

        let mut scenario = base.to_vec();
        scenario.push(TrainSnapshot {
            train_id: special.train_id.clone(),
            dep_time: special.dep_time,
            speed_kmh: special.speed_kmh,
            stops: special.stops.clone(),
            route,
            delay: 0.0,
        });

        let result = self.optimize(graph, &scenario, ledger, backend);

        let impact = WhatIfImpact {
            additional_delay: result.total_delay,
            affected_trains: result.rerouted_trains.len(),
            feasible: result.success,
        };

        Ok(WhatIfReport { result, impact })
    }
}
