pub mod graph;
pub mod segment;
pub mod station;
