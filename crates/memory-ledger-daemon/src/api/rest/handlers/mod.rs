//! API request handlers

mod collector;
mod memory;
mod runtime;

pub use collector::*;
pub use memory::*;
pub use runtime::*;
