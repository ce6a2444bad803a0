//! Artifacts
//!
//! The clean-run completion certificate.

pub mod certificate;
