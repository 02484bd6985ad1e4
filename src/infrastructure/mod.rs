pub mod gpio;
pub mod observability;
pub mod simulated;

pub use observability::Metrics;
