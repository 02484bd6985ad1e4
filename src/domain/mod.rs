// Domain-specific error types
pub mod errors;

// Port interfaces
pub mod ports;

// Sensor readings and unit conversions
pub mod reading;
