//! Configuration
//!
//! Shared type definitions and config-file loading.

#[allow(clippy::module_inception)]
pub mod config;
pub mod types;
