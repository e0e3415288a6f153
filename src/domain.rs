pub mod optimizer;
pub mod simulation;
pub mod topology;
