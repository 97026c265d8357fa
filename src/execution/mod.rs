//! Workflow execution engine

pub mod engine;
pub mod executor;
pub mod scheduler;

pub use engine::{EventEmitter, EventHandler, ExecutionEngine, ExecutionEvent};
pub use executor::{RunConfig, RunContext, StepExecutor, DEFAULT_CAPACITY};
pub use scheduler::ExecutionScheduler;
