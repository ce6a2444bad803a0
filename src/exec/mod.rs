//! Execution Control
//!
//! Single-script subprocess execution and sequential run-all orchestration.

pub mod batch;
pub mod runner;
