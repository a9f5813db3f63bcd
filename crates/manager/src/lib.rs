pub mod error;
pub mod evaluator;
pub mod job;
pub mod scheduler;
