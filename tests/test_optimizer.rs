mod common;

use std::collections::BTreeMap;

use rail_dss::config::OptimizerConfig;
use rail_dss::domain::optimizer::backend::MicrolpBackend;
use rail_dss::domain::optimizer::event::TrainSnapshot;
use rail_dss::domain::optimizer::model::RescheduleModel;
use rail_dss::domain::optimizer::result::{OptimizationResult, ScheduledEvent};
use rail_dss::domain::simulation::engine::SimulationEngine;
use rail_dss::domain::simulation::train::TrainStatus;

use common::{corridor_graph, engine_with, schedule};

fn optimize(engine: &SimulationEngine, config: OptimizerConfig) -> OptimizationResult {
    let model = RescheduleModel::new(config);
    let backend = MicrolpBackend::new();
    let snapshots = engine.snapshots();

    model.optimize(engine.graph(), &snapshots, engine.ledger(), &backend)
}

/// All rescheduled events grouped by corridor.
fn events_by_corridor(result: &OptimizationResult) -> BTreeMap<String, Vec<ScheduledEvent>> {
    let mut grouped: BTreeMap<String, Vec<ScheduledEvent>> = BTreeMap::new();

    for events in result.new_schedule.values() {
        for event in events {
            grouped.entry(event.corridor.clone()).or_default().push(event.clone());
        }
    }

    grouped
}

#[test]
fn test_headway_separates_same_corridor_events() {
    // MYA-MYS is a single-track corridor; both trains claim it at once.
    let engine = engine_with(vec![schedule("A1", 0.0, 60.0, &["MYA", "MYS"]), schedule("B2", 0.0, 60.0, &["MYA", "MYS"])]);

    let result = optimize(&engine, OptimizerConfig::default());

    assert!(result.success, "Two conflicting departures must be reschedulable: {}", result.message);
    assert!(result.total_delay >= 5.0 - 1e-6, "At least one train must give way by a full headway");

    for (corridor, events) in events_by_corridor(&result) {
        let capacity = engine.graph().corridor(&corridor).unwrap().aggregate_capacity as usize;

        for event in &events {
            assert!(event.track_index < capacity, "Track index {} exceeds the corridor's {} tracks", event.track_index, capacity);
        }

        for i in 0..events.len() {
            for j in (i + 1)..events.len() {
                let gap = (events[i].new_time - events[j].new_time).abs();
                assert!(gap >= 5.0 - 1e-6, "Events on '{}' are only {:.2} minutes apart", corridor, gap);

                // On the single-track corridor every event lands on track 0,
                // so the headway gap is what keeps occupancy exclusive.
                if capacity == 1 {
                    assert_eq!(events[i].track_index, events[j].track_index);
                }
            }
        }
    }
}

#[test]
fn test_wider_delay_budget_never_costs_more() {
    let mut engine = engine_with(vec![schedule("A1", 0.0, 60.0, &["SBC", "KGI"]), schedule("B2", 0.0, 60.0, &["SBC", "KGI"])]);
    engine.add_disruption("A1", "SBC-KGI", 20.0, "rolling stock fault").unwrap();

    let tight = optimize(&engine, OptimizerConfig { max_delay_minutes: 30.0, ..OptimizerConfig::default() });
    let wide = optimize(&engine, OptimizerConfig { max_delay_minutes: 120.0, ..OptimizerConfig::default() });

    assert!(tight.success, "30-minute budget should still absorb a 20-minute disruption: {}", tight.message);
    assert!(wide.success);
    assert!(wide.objective_value <= tight.objective_value + 1e-6, "Relaxing the delay budget must never worsen the optimum");
}

#[test]
fn test_disruption_beyond_budget_is_infeasible() {
    let mut engine = engine_with(vec![schedule("A1", 0.0, 60.0, &["SBC", "KGI"])]);
    engine.add_disruption("A1", "SBC-KGI", 50.0, "derailment").unwrap();

    let result = optimize(&engine, OptimizerConfig { max_delay_minutes: 10.0, ..OptimizerConfig::default() });

    assert!(!result.success);
    assert!(result.new_schedule.is_empty(), "A failed solve must not publish a partial schedule");
    assert!(!result.message.is_empty());
}

#[test]
fn test_overrunning_the_time_limit_fails_the_solve() {
    let engine = engine_with(vec![schedule("A1", 0.0, 60.0, &["SBC", "KGI"])]);

    let result = optimize(&engine, OptimizerConfig { solver_time_limit_secs: 0.0, ..OptimizerConfig::default() });

    assert!(!result.success, "A zero budget can never be met");
    assert!(result.message.contains("Time limit"), "unexpected message: {}", result.message);
    assert!(result.new_schedule.is_empty());
}

#[test]
fn test_recorded_disruptions_floor_the_new_times() {
    let mut engine = engine_with(vec![schedule("A1", 0.0, 60.0, &["SBC", "MYS"]), schedule("B2", 10.0, 60.0, &["SBC", "MYS"])]);
    engine.add_disruption("A1", "SBC-KGI", 15.0, "signal failure").unwrap();

    let result = optimize(&engine, OptimizerConfig::default());

    assert!(result.success, "{}", result.message);

    for event in &result.new_schedule["A1"] {
        if event.corridor == "SBC-KGI" {
            assert!(event.new_time >= event.original_time + 15.0 - 1e-6, "Disrupted events cannot be rescheduled below the recorded delay");
        }
    }
}

#[test]
fn test_mandatory_stops_are_flagged_and_never_bypassed() {
    let engine = engine_with(vec![schedule("A1", 0.0, 60.0, &["SBC", "KGI", "MYS"])]);

    let result = optimize(&engine, OptimizerConfig::default());

    assert!(result.success, "{}", result.message);

    // KGI is a declared stop, so events in corridors containing it carry the
    // mandatory flag and the train may not take the bypass.
    let flagged = result.new_schedule["A1"].iter().filter(|e| e.corridor == "KGI-MYA").collect::<Vec<_>>();

    assert!(!flagged.is_empty());
    assert!(flagged.iter().all(|e| e.mandatory_stop));
    assert!(!result.rerouted_trains.contains("A1"), "A stopping train must not end up on a non-stopping bypass");
}

#[test]
fn test_what_if_analyzes_without_touching_the_base() {
    let engine = engine_with(vec![schedule("A1", 0.0, 60.0, &["SBC", "MYS"])]);

    let model = RescheduleModel::new(OptimizerConfig::default());
    let backend = MicrolpBackend::new();
    let snapshots = engine.snapshots();

    let mut special = schedule("SPL01", 30.0, 65.0, &["SBC", "MYA", "MYS"]);
    special.arr_time = 210.0;

    let report = model.what_if(engine.graph(), &snapshots, engine.ledger(), &special, &backend).expect("special route must resolve");

    assert!(report.impact.feasible);
    assert!(report.result.new_schedule.contains_key("SPL01"), "The hypothetical train must appear in the scenario schedule");
    assert!(report.impact.additional_delay >= 0.0);
    assert!(report.result.rerouted_trains.is_empty(), "No train's constraints were violated badly enough to warrant a reroute");

    assert_eq!(engine.train_count(), 1, "What-if analysis must never insert into the live engine");
}

#[test]
fn test_unknown_corridor_fails_model_construction() {
    let engine = engine_with(vec![schedule("A1", 0.0, 60.0, &["SBC", "KGI"])]);

    let snapshot = TrainSnapshot {
        train_id: "GHOST".to_string(),
        dep_time: 0.0,
        speed_kmh: 60.0,
        stops: vec!["SBC".to_string()],
        route: vec!["NO-SUCH".to_string()],
        delay: 0.0,
    };

    let model = RescheduleModel::new(OptimizerConfig::default());
    let backend = MicrolpBackend::new();

    let result = model.optimize(engine.graph(), &[snapshot], engine.ledger(), &backend);

    assert!(!result.success);
    assert!(result.message.contains("Model construction failed"));
}

#[test]
fn test_applied_reschedule_shifts_one_departure() {
    let mut engine = engine_with(vec![schedule("A1", 0.0, 60.0, &["SBC", "KGI"]), schedule("B2", 0.0, 60.0, &["SBC", "KGI"])]);

    let result = optimize(&engine, OptimizerConfig::default());
    assert!(result.success, "{}", result.message);

    engine.apply_reschedule(&result);
    engine.advance(2.0);

    let a_status = engine.train("A1").unwrap().status();
    let b_status = engine.train("B2").unwrap().status();

    let one_waiting = (a_status == TrainStatus::Waiting) != (b_status == TrainStatus::Waiting);
    assert!(one_waiting, "Exactly one train should be held back for the headway, got {:?} and {:?}", a_status, b_status);
}

#[test]
fn test_applied_reschedule_charges_each_disruption_once() {
    // The disrupted traversal is already stretched by the ledger, so feeding
    // the reschedule back must not also postpone the departure by the same
    // minutes.
    let mut rescheduled = engine_with(vec![schedule("12613", 0.0, 60.0, &["SBC", "MYS"])]);
    let mut reference = engine_with(vec![schedule("12613", 0.0, 60.0, &["SBC", "MYS"])]);

    rescheduled.add_disruption("12613", "SBC-KGI", 15.0, "signal failure").unwrap();
    reference.add_disruption("12613", "SBC-KGI", 15.0, "signal failure").unwrap();

    let result = optimize(&rescheduled, OptimizerConfig::default());
    assert!(result.success, "{}", result.message);

    rescheduled.apply_reschedule(&result);

    // With a single train the solve can do no better than the disruption
    // floors, so the rescheduled run must track the plain disrupted run.
    rescheduled.advance(100.0);
    reference.advance(100.0);
    assert_eq!(rescheduled.positions(), reference.positions(), "A lone disrupted train must not fall further behind after rescheduling");

    rescheduled.advance(150.0);
    reference.advance(150.0);
    assert!(reference.train("12613").unwrap().status().is_terminal());
    assert_eq!(rescheduled.train("12613").unwrap().status(), reference.train("12613").unwrap().status());
}

#[test]
fn test_what_if_with_unresolvable_route_is_an_error() {
    let graph = corridor_graph();
    let model = RescheduleModel::new(OptimizerConfig::default());
    let backend = MicrolpBackend::new();

    let special = schedule("SPL01", 0.0, 80.0, &["SBC", "XXX"]);
    let ledger = rail_dss::domain::simulation::ledger::DisruptionLedger::new();

    let report = model.what_if(&graph, &[], &ledger, &special, &backend);

    assert!(report.is_err(), "A special train over unknown stations cannot be analyzed");
}
