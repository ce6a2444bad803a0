/// Sequential run-all orchestration and gating aggregation
///
/// Runs every discovered script once, in order, one at a time, and folds the
/// per-script verdicts into one aggregate outcome. The precedence rules are
/// the whole point:
///
/// - a non-zero exit code marks the batch bad for every script, gating or
///   informational, even when the script printed a success line;
/// - a failure verdict from a gating script marks the batch bad;
/// - a warning verdict from a gating script marks it needs-review;
/// - an informational script's warning is shown but never gates.
use crate::config::types::ScriptDescriptor;
use crate::exec::runner::ScriptRunner;
use crate::status::store::StatusStore;
use crate::verdict::status_line::{canonicalize, normalize_icon, VerdictIcon};
use std::collections::BTreeSet;
use std::path::Path;

/// One line of the run-all summary, in execution order
#[derive(Clone, Debug)]
pub struct SummaryEntry {
    pub name: String,
    pub line: String,
}

/// Aggregate classification of one run-all pass
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BatchOutcome {
    /// Every gating check clean: the certificate gate opens
    Clean,
    /// At least one gating warning, no hard failures
    NeedsReview,
    /// At least one failure verdict or non-zero exit
    Failed,
}

/// Result of one run-all pass. Lives for the single invocation; only the
/// status store survives it.
#[derive(Clone, Debug)]
pub struct BatchReport {
    pub entries: Vec<SummaryEntry>,
    pub any_bad: bool,
    pub any_needs_review: bool,
}

impl BatchReport {
    pub fn outcome(&self) -> BatchOutcome {
        if self.any_bad {
            BatchOutcome::Failed
        } else if self.any_needs_review {
            BatchOutcome::NeedsReview
        } else {
            BatchOutcome::Clean
        }
    }
}

/// Run every script in order against one working directory.
///
/// Scripts are expected in lexicographic filename order from discovery; the
/// summary preserves that order. Status-store updates happen per script as
/// it finishes, so an interrupted batch keeps the results of the scripts
/// that already ran.
pub fn run_all(
    runner: &ScriptRunner,
    scripts: &[ScriptDescriptor],
    working_dir: &Path,
    informational: &BTreeSet<String>,
) -> BatchReport {
    let mut entries = Vec::with_capacity(scripts.len());
    let mut any_bad = false;
    let mut any_needs_review = false;

    for script in scripts {
        println!("\n🔁 Running {}...", script.name);
        let result = runner.run(script, working_dir);
        let line = canonicalize(&script.name, result.exit_code, result.status_line.as_deref());
        let is_informational = informational.contains(&script.name);

        StatusStore::update(
            working_dir,
            &script.name,
            result.exit_code,
            Some(&line),
            is_informational,
        );

        if !is_informational {
            match normalize_icon(Some(&line)) {
                VerdictIcon::Failure => any_bad = true,
                VerdictIcon::Warning => any_needs_review = true,
                _ => {}
            }
        }

        // Exit code dominates: informational status waives the soft signal,
        // never a hard process failure.
        if result.exit_code != 0 {
            any_bad = true;
        }

        entries.push(SummaryEntry {
            name: script.name.clone(),
            line,
        });
        println!();
    }

    BatchReport {
        entries,
        any_bad,
        any_needs_review,
    }
}
