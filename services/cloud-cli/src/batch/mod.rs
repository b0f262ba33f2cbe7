pub mod executor;

pub use executor::BatchExecutor;
pub use executor::BatchOutcome;
