use anyhow::Context;
use clap::Parser;

use rail_dss::api::request_dto::DisruptionRequestDto;
use rail_dss::config::OptimizerConfig;
use rail_dss::domain::optimizer::backend::MicrolpBackend;
use rail_dss::domain::optimizer::model::RescheduleModel;
use rail_dss::loader::parser::parse_json_file;

/// Corridor simulation and disruption-aware rescheduling from the command
/// line: load a network and timetable, run the clock, optionally inject
/// disruptions and re-optimize.
#[derive(Debug, Parser)]
#[command(name = "rail_dss", version, about = "Train corridor simulation and rescheduling")]
struct Args {
    /// GeoJSON file with tracks and stations
    #[arg(long)]
    network: String,

    /// Timetable CSV
    #[arg(long)]
    schedule: String,

    /// Virtual minutes per simulation step
    #[arg(long, default_value_t = 1.0)]
    step_minutes: f64,

    /// Number of steps to run
    #[arg(long, default_value_t = 240)]
    steps: u32,

    /// JSON file with disruptions to inject before the run
    #[arg(long)]
    disruptions: Option<String>,

    /// JSON file overriding optimizer defaults
    #[arg(long)]
    optimizer_config: Option<String>,

    /// Run the rescheduling optimizer after the simulation and apply the
    /// result
    #[arg(long)]
    optimize: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut engine = rail_dss::build_engine(&args.network, &args.schedule).context("failed to build simulation engine")?;

    if let Some(path) = &args.disruptions {
        let requests: Vec<DisruptionRequestDto> = parse_json_file(path).with_context(|| format!("failed to load disruptions from '{path}'"))?;

        // Configuration errors (unknown corridor, negative delay) abort;
        // a request naming an absent train is skipped with a warning.
        for request in requests {
            if let Err(error) = engine.add_disruption(&request.train_id, &request.corridor, request.delay_minutes, request.reason.as_deref().unwrap_or("unspecified")) {
                if error.is_configuration() {
                    return Err(error).with_context(|| format!("failed to inject disruption for train '{}'", request.train_id));
                }

                log::warn!("Skipping disruption for train '{}': {error}", request.train_id);
            }
        }
    }

    for _ in 0..args.steps {
        engine.step(args.step_minutes);
    }

    if args.optimize {
        let config = match &args.optimizer_config {
            Some(path) => parse_json_file::<OptimizerConfig>(path).with_context(|| format!("failed to load optimizer config from '{path}'"))?,
            None => OptimizerConfig::default(),
        };

        let model = RescheduleModel::new(config);
        let backend = MicrolpBackend::new();

        let snapshots = engine.snapshots();
        let result = model.optimize(engine.graph(), &snapshots, engine.ledger(), &backend);

        println!("{}", serde_json::to_string_pretty(&result)?);

        engine.apply_reschedule(&result);
    }

    println!("{}", serde_json::to_string_pretty(&engine.positions())?);
    println!("{}", serde_json::to_string_pretty(&engine.stats())?);

    Ok(())
}
