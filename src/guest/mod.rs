pub mod gate;
pub mod repo;

pub use gate::{usage_gate, Caller};
