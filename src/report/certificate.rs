/// Clean-run certificate rendering
///
/// Issued once per fully clean run-all pass: a fixed-width plain-text
/// artifact naming the book, the issue date, and the checks that passed.
/// Issuance is best-effort - the caller prints a warning and moves on when
/// it fails; a clean run never turns into a failed one here.
use crate::config::types::{PipelineError, Result};
use crate::exec::batch::SummaryEntry;
use chrono::{Datelike, Local};
use std::fs;
use std::path::{Path, PathBuf};

/// Rendered line width for the certificate body
pub const DISPLAY_WIDTH: usize = 72;

/// Checklist display budget; overflow collapses into one "…and N more" line
pub const MAX_CHECKLIST_LINES: usize = 12;

/// Reports location under the working directory
const REPORTS_DIR: &str = "reports";

/// Produce one certificate file for a clean run. Returns the path written.
///
/// The filename embeds the working-directory name and a timestamp; an
/// existing path gets a numeric suffix, a prior certificate is never
/// overwritten.
pub fn issue(working_dir: &Path, entries: &[SummaryEntry]) -> Result<PathBuf> {
    let title = derive_title(working_dir)?;
    let now = Local::now();
    let body = render(&title, &format_issue_date(&now), entries);

    let reports_dir = working_dir.join(REPORTS_DIR);
    fs::create_dir_all(&reports_dir)?;

    let dir_name = working_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "book".to_string());
    let stem = format!(
        "{}-certificate-{}",
        dir_name,
        now.format("%Y%m%d-%H%M%S")
    );
    let path = unique_path(&reports_dir, &stem);

    fs::write(&path, body)?;
    Ok(path)
}

/// Human-readable title from the manuscript's identifying file: exactly one
/// `.docx` is expected at the top level of the working directory. Zero or
/// several is an error, never a guess.
pub fn derive_title(working_dir: &Path) -> Result<String> {
    let mut docx_files: Vec<PathBuf> = fs::read_dir(working_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| {
            p.is_file() && p.extension().and_then(|e| e.to_str()) == Some("docx")
        })
        .collect();
    docx_files.sort();

    match docx_files.len() {
        1 => Ok(docx_files[0]
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()),
        0 => Err(PipelineError::Certificate(format!(
            "no .docx manuscript found in {}",
            working_dir.display()
        ))),
        n => Err(PipelineError::Certificate(format!(
            "{} .docx files found in {}; cannot derive a title",
            n,
            working_dir.display()
        ))),
    }
}

/// Fixed, locale-independent long date: "Month D, YYYY". chrono's %B is
/// always English, so no locale can change the artifact.
fn format_issue_date(now: &chrono::DateTime<Local>) -> String {
    format!("{} {}, {}", now.format("%B"), now.day(), now.year())
}

fn render(title: &str, issue_date: &str, entries: &[SummaryEntry]) -> String {
    let border = "=".repeat(DISPLAY_WIDTH);
    let mut lines = vec![
        border.clone(),
        center("CERTIFICATE OF COMPLETED CHECKS"),
        border.clone(),
        String::new(),
        truncate_line(&format!("Book:   {}", title)),
        format!("Issued: {}", issue_date),
        String::new(),
        format!("All {} checks reported clean results:", entries.len()),
        String::new(),
    ];

    let shown = if entries.len() > MAX_CHECKLIST_LINES {
        MAX_CHECKLIST_LINES - 1
    } else {
        entries.len()
    };
    for entry in &entries[..shown] {
        lines.push(truncate_line(&format!("  ✔ {}: {}", entry.name, entry.line)));
    }
    if entries.len() > shown {
        lines.push(format!("  …and {} more", entries.len() - shown));
    }

    lines.push(String::new());
    lines.push(border);
    lines.push(String::new());
    lines.join("\n")
}

fn center(text: &str) -> String {
    let len = text.chars().count();
    if len >= DISPLAY_WIDTH {
        return text.to_string();
    }
    format!("{}{}", " ".repeat((DISPLAY_WIDTH - len) / 2), text)
}

/// Char-safe truncation to the display width, preferring an ellipsis over a
/// hard cut.
fn truncate_line(line: &str) -> String {
    if line.chars().count() <= DISPLAY_WIDTH {
        return line.to_string();
    }
    let mut out: String = line.chars().take(DISPLAY_WIDTH - 1).collect();
    out.push('…');
    out
}

/// First free path for the stem; a numeric suffix sidesteps collisions
/// within the same timestamp second.
fn unique_path(dir: &Path, stem: &str) -> PathBuf {
    let candidate = dir.join(format!("{}.txt", stem));
    if !candidate.exists() {
        return candidate;
    }
    let mut counter = 2;
    loop {
        let candidate = dir.join(format!("{}-{}.txt", stem, counter));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}
