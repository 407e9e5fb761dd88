pub mod error;
pub mod money;
pub mod schedule;
pub mod simulation;
pub mod snapshot;
pub mod tax;
pub mod types;

pub use error::SimulationError;
pub use types::*;

/// Standard result type for all simulation operations
pub type SimResult<T> = Result<T, SimulationError>;
