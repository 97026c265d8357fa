//! Core domain models for workflows
//!
//! This module defines the fundamental data structures that represent
//! jobs, matrices, steps, the job graph and the run report.

pub mod config;
pub mod context;
pub mod error;
pub mod graph;
pub mod job;
pub mod matrix;
pub mod report;
pub mod state;
pub mod step;

pub use context::*;
pub use error::*;
pub use graph::*;
pub use job::*;
pub use matrix::*;
pub use report::*;
pub use state::*;
pub use step::*;
