/// Status-line grammar and canonical verdict synthesis
///
/// A script's last meaningful output line is its verdict. The grammar is a
/// closed set of three leading icons, an optional invisible variation
/// selector, mandatory whitespace, then free text:
///
/// ```text
/// ✅ all 41 chapters clean
/// ⚠️ 3 paragraphs need review - see report
/// ❌ spellcheck failed (exit 2)
/// ```
///
/// ⚠️ is often emitted as two codepoints, U+26A0 plus the U+FE0F variation
/// selector, so the selector is accepted after any icon. An icon that is not
/// followed by whitespace does not match. Classification here is a pure
/// function over the line text; no I/O, no hidden state.

/// Invisible emoji-presentation modifier tolerated after any icon
const VARIATION_SELECTOR: char = '\u{FE0F}';

const ICON_SUCCESS: char = '✅';
const ICON_WARNING: char = '⚠';
const ICON_FAILURE: char = '❌';

/// Closed set of per-script states as stored and displayed
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VerdictIcon {
    /// Script reported a clean result
    Success,
    /// Script reported something worth reviewing
    Warning,
    /// Script reported failure, exited non-zero, or was interrupted
    Failure,
    /// Script has never been run in this directory
    NotRun,
    /// Informational script: output shown, never gates
    InfoOnly,
    /// Line present but outside the grammar
    Unknown,
}

impl VerdictIcon {
    /// Literal icon string used in the status file and the menus
    pub fn as_str(self) -> &'static str {
        match self {
            VerdictIcon::Success => "✅",
            VerdictIcon::Warning => "⚠️",
            VerdictIcon::Failure => "❌",
            VerdictIcon::NotRun => "⏺",
            VerdictIcon::InfoOnly => "📝",
            VerdictIcon::Unknown => "❔",
        }
    }
}

impl std::fmt::Display for VerdictIcon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Split a trimmed line into its leading verdict icon and the rest, if the
/// line matches the grammar.
fn leading_icon(trimmed: &str) -> Option<(char, &str)> {
    let mut chars = trimmed.char_indices();
    let (_, icon) = chars.next()?;
    if !matches!(icon, ICON_SUCCESS | ICON_WARNING | ICON_FAILURE) {
        return None;
    }

    let mut rest_start = icon.len_utf8();
    let mut next = chars.next();
    if let Some((_, c)) = next {
        if c == VARIATION_SELECTOR {
            rest_start += c.len_utf8();
            next = chars.next();
        }
    }

    // The icon must be followed by whitespace. The line is trimmed, so
    // whitespace here implies real text after it.
    match next {
        Some((_, c)) if c.is_whitespace() => Some((icon, &trimmed[rest_start..])),
        _ => None,
    }
}

/// Return the trimmed line verbatim if it looks like a status one-liner,
/// else `None`.
pub fn extract_status_line(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    leading_icon(trimmed).map(|_| trimmed)
}

/// Map a (possibly absent) verdict line to its icon.
pub fn normalize_icon(line: Option<&str>) -> VerdictIcon {
    let Some(line) = line else {
        return VerdictIcon::NotRun;
    };
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return VerdictIcon::NotRun;
    }
    match trimmed.chars().next() {
        Some(ICON_SUCCESS) => VerdictIcon::Success,
        Some(ICON_WARNING) => VerdictIcon::Warning,
        Some(ICON_FAILURE) => VerdictIcon::Failure,
        _ => VerdictIcon::Unknown,
    }
}

/// Produce the one renderable verdict line for a finished run.
///
/// A matched line wins verbatim. Without one, a non-zero exit synthesizes a
/// failure naming the script and exit code; a zero exit synthesizes a
/// warning, because a script that finishes silently still deserves a look.
pub fn canonicalize(script_name: &str, exit_code: i32, matched_line: Option<&str>) -> String {
    match matched_line {
        Some(line) if !line.trim().is_empty() => line.trim().to_string(),
        _ => {
            if exit_code != 0 {
                format!(
                    "❌ {} failed (exit {}) - see output above",
                    script_name, exit_code
                )
            } else {
                format!(
                    "⚠️ {} finished - no status one-liner detected (open its report if unsure)",
                    script_name
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_lines_come_back_trimmed_and_verbatim() {
        assert_eq!(extract_status_line("✅ all clear"), Some("✅ all clear"));
        assert_eq!(
            extract_status_line("  ⚠️ 3 issues found  "),
            Some("⚠️ 3 issues found")
        );
        assert_eq!(
            extract_status_line("❌ spellcheck failed"),
            Some("❌ spellcheck failed")
        );
    }

    #[test]
    fn warning_matches_with_and_without_variation_selector() {
        assert_eq!(extract_status_line("⚠ bare warning"), Some("⚠ bare warning"));
        assert_eq!(
            extract_status_line("⚠\u{FE0F} styled warning"),
            Some("⚠\u{FE0F} styled warning")
        );
    }

    #[test]
    fn icon_must_lead_and_be_followed_by_whitespace() {
        assert_eq!(extract_status_line("done ✅"), None);
        assert_eq!(extract_status_line("✅done"), None);
        assert_eq!(extract_status_line("✅"), None);
        assert_eq!(extract_status_line("✅ "), None); // trims to bare icon
        assert_eq!(extract_status_line("⚠\u{FE0F}done"), None);
    }

    #[test]
    fn non_grammar_lines_do_not_match() {
        assert_eq!(extract_status_line(""), None);
        assert_eq!(extract_status_line("   "), None);
        assert_eq!(extract_status_line("processing chunk 7/41"), None);
        assert_eq!(extract_status_line("🎉 all scripts clean"), None);
    }

    #[test]
    fn normalize_maps_each_icon() {
        assert_eq!(normalize_icon(Some("✅ fine")), VerdictIcon::Success);
        assert_eq!(normalize_icon(Some("⚠️ hmm")), VerdictIcon::Warning);
        assert_eq!(normalize_icon(Some("⚠ hmm")), VerdictIcon::Warning);
        assert_eq!(normalize_icon(Some("❌ bad")), VerdictIcon::Failure);
        assert_eq!(normalize_icon(None), VerdictIcon::NotRun);
        assert_eq!(normalize_icon(Some("")), VerdictIcon::NotRun);
        assert_eq!(normalize_icon(Some("all good")), VerdictIcon::Unknown);
    }

    #[test]
    fn canonicalize_prefers_the_matched_line() {
        assert_eq!(
            canonicalize("a.py", 0, Some("✅ all clear")),
            "✅ all clear"
        );
        // Matched line wins even against a non-zero exit; the gate still
        // fails on the exit code downstream.
        assert_eq!(canonicalize("a.py", 2, Some("✅ fine")), "✅ fine");
    }

    #[test]
    fn canonicalize_synthesizes_failure_with_exit_code() {
        let line = canonicalize("08_ward_audit.py", 3, None);
        assert!(line.starts_with("❌"));
        assert!(line.contains("08_ward_audit.py"));
        assert!(line.contains("exit 3"));
    }

    #[test]
    fn canonicalize_synthesizes_warning_on_silent_success() {
        let line = canonicalize("quiet.sh", 0, None);
        assert_eq!(normalize_icon(Some(&line)), VerdictIcon::Warning);
        assert!(line.contains("quiet.sh"));
    }

    #[test]
    fn icon_strings_are_the_store_literals() {
        assert_eq!(VerdictIcon::Success.as_str(), "✅");
        assert_eq!(VerdictIcon::Warning.as_str(), "⚠️");
        assert_eq!(VerdictIcon::Failure.as_str(), "❌");
        assert_eq!(VerdictIcon::NotRun.as_str(), "⏺");
        assert_eq!(VerdictIcon::InfoOnly.as_str(), "📝");
        assert_eq!(VerdictIcon::Unknown.as_str(), "❔");
    }
}
