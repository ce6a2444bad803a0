//! Verdict Protocol
//!
//! The one-line status contract every collaborator script is expected to
//! honor, and the canonical verdict synthesized when it does not.

pub mod status_line;

pub use status_line::{canonicalize, extract_status_line, normalize_icon, VerdictIcon};
