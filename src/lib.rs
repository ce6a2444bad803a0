//! proofgate: a sequential check-script orchestrator for manuscript folders
//!
//! Runs an ordered set of externally supplied analysis scripts against a book
//! folder, streams each script's output live, extracts its self-reported
//! one-line verdict, persists per-script status across runs, and issues a
//! completion certificate only when every gating check comes back clean.
//!
//! # Architecture
//!
//! ## Verdict Protocol ([`verdict`])
//! - [`verdict::status_line`]: the three-icon status-line grammar, icon
//!   normalization, and canonical verdict synthesis
//!
//! ## Execution Control ([`exec`])
//! - [`exec::runner`]: single-script subprocess launch with byte-exact live
//!   output streaming and verdict extraction
//! - [`exec::batch`]: sequential run-all orchestration and gating aggregation
//!
//! ## Persistence & Artifacts ([`status`], [`report`])
//! - [`status::store`]: per-directory last-known verdict record
//! - [`report::certificate`]: timestamped clean-run certificate
//!
//! ## Configuration ([`config`])
//! - [`config::types`]: shared type definitions and the crate error enum
//! - [`config::config`]: config loading with local overlay merge
//!
//! ## CLI ([`cli`], [`discovery`])
//! - [`discovery`]: book-folder and script discovery
//! - [`cli`]: clap surface and the interactive menus
//!
//! # Design Principles
//!
//! 1. **Exit code is truth** - a non-zero exit is a failure no matter what
//!    the script printed
//! 2. **One script at a time** - strictly sequential, no shared-state races
//! 3. **Local failures stay local** - a broken script never aborts the batch
//! 4. **Best-effort periphery** - status persistence and certificate
//!    issuance may degrade, never the run itself

// Verdict Protocol
pub mod verdict;

// Execution Control
pub mod exec;

// Persistence & Artifacts
pub mod report;
pub mod status;

// Configuration
pub mod config;

// Discovery & CLI
pub mod cli;
pub mod discovery;

// Re-export commonly used types for convenience
pub use config::types::*;
