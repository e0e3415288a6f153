pub mod clock;
pub mod engine;
pub mod ledger;
pub mod train;
