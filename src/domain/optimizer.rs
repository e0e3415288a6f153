pub mod backend;
pub mod event;
pub mod lp;
pub mod model;
pub mod result;
