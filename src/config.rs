use serde::Deserialize;

/// Tuning parameters for the rescheduling optimizer.
///
/// None of these are hardcoded in the model; callers may load them from a
/// JSON file or construct them directly. The defaults match the corridor
/// deployment this crate was written for.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Minimum time separation between two events on the same corridor, in minutes.
    pub headway_minutes: f64,

    /// Maximum allowable delay per event, in minutes. Bounds every time variable.
    pub max_delay_minutes: f64,

    /// Objective penalty for selecting an alternative (siding/secondary) track.
    pub reroute_penalty: f64,

    /// Objective penalty per minute of event delay.
    pub delay_penalty: f64,

    /// Cap on pairwise order flips across the whole problem. Deliberately
    /// limits how much the original train sequencing may change, which also
    /// bounds solve time.
    pub max_order_swaps: u32,

    /// Wall-clock budget handed to the MILP backend, in seconds.
    pub solver_time_limit_secs: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig {
            headway_minutes: 5.0,
            max_delay_minutes: 120.0,
            reroute_penalty: 50.0,
            delay_penalty: 1.0,
            max_order_swaps: 3,
            solver_time_limit_secs: 30.0,
        }
    }
}
