//! Persistence
//!
//! Last-known verdict per script, per working directory.

pub mod store;
