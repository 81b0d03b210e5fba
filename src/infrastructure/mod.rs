//! Infrastructure layer - Logging and metrics adapters

pub mod logging;
pub mod observability;
