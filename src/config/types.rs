/// Core types and structures for the proofgate pipeline
use std::path::{Path, PathBuf};
use thiserror::Error;

/// How a discovered script is invoked
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScriptKind {
    /// Invoked as `<python> <script> <working_dir>`
    Python,
    /// Invoked as `<shell> <script>` with the working directory as cwd
    Shell,
}

impl ScriptKind {
    /// Infer the kind from a script path's extension. Anything other than
    /// `.py` or `.sh` has no kind and is rejected at run time.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("py") => Some(ScriptKind::Python),
            Some("sh") => Some(ScriptKind::Shell),
            _ => None,
        }
    }
}

/// One runnable unit as discovered on disk. Built fresh on every discovery
/// pass; never cached across menu visits.
#[derive(Clone, Debug)]
pub struct ScriptDescriptor {
    /// Filesystem path of the script
    pub path: PathBuf,
    /// Inferred invocation kind, if the extension is recognized
    pub kind: Option<ScriptKind>,
    /// Display name (base filename); also the status-store key
    pub name: String,
}

impl ScriptDescriptor {
    pub fn new(path: PathBuf) -> Self {
        let kind = ScriptKind::from_path(&path);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { path, kind, name }
    }
}

/// Outcome of one script invocation
#[derive(Clone, Debug)]
pub struct ExecutionResult {
    /// Child exit code (`128 + signal` for signal deaths, `130` for a
    /// user interrupt, `1` for runner-level errors)
    pub exit_code: i32,
    /// Last output line matching the status-line grammar, if any
    pub status_line: Option<String>,
}

/// Exit code reported for a user-interrupted script
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Certificate error: {0}")]
    Certificate(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
