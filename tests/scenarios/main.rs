//! Scenario-based tests for the workflow runner

mod helpers;

mod dependencies;
mod fail_fast;
mod matrix_expansion;
mod parallelism;
mod step_execution;
mod timeouts;
