//! REST API over the memory engine

pub mod handlers;
pub mod router;
pub mod state;
