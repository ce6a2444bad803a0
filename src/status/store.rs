/// Per-directory verdict persistence
///
/// One small JSON file per working directory maps each script's display name
/// to its last verdict icon. The record is best-effort everywhere: a missing
/// or corrupt file reads as empty, a failed write is logged and swallowed.
/// Status history must never fail a run.
use crate::verdict::status_line::{normalize_icon, VerdictIcon};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Status record filename inside each working directory
pub const STATUS_FILE_NAME: &str = ".proofgate_status.json";

pub struct StatusStore;

impl StatusStore {
    pub fn status_file(working_dir: &Path) -> PathBuf {
        working_dir.join(STATUS_FILE_NAME)
    }

    /// Read the record for a directory. Missing, unreadable, or unparsable
    /// files all read as an empty mapping.
    pub fn load(working_dir: &Path) -> BTreeMap<String, String> {
        let path = Self::status_file(working_dir);
        let Ok(text) = fs::read_to_string(&path) else {
            return BTreeMap::new();
        };
        match serde_json::from_str(&text) {
            Ok(map) => map,
            Err(e) => {
                log::debug!("ignoring corrupt status file {}: {}", path.display(), e);
                BTreeMap::new()
            }
        }
    }

    /// Write the full record back, key-sorted for stable diffs. Failures
    /// are logged and swallowed.
    pub fn save(working_dir: &Path, record: &BTreeMap<String, String>) {
        let path = Self::status_file(working_dir);
        let json = match serde_json::to_string_pretty(record) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("could not serialize status record: {}", e);
                return;
            }
        };
        if let Err(e) = atomic_write(&path, json.as_bytes()) {
            log::warn!("could not persist status to {}: {}", path.display(), e);
        }
    }

    /// Record one script's result. Loads, replaces that script's entry, and
    /// saves; all other entries are untouched.
    pub fn update(
        working_dir: &Path,
        script_name: &str,
        exit_code: i32,
        verdict_line: Option<&str>,
        informational: bool,
    ) {
        let icon = Self::icon_for(exit_code, verdict_line, informational);
        let mut record = Self::load(working_dir);
        record.insert(script_name.to_string(), icon.as_str().to_string());
        Self::save(working_dir, &record);
    }

    /// Icon precedence, as a pure function: a non-zero exit is always a
    /// failure no matter what was printed; informational scripts otherwise
    /// store the info marker; everything else follows the verdict line.
    pub fn icon_for(exit_code: i32, verdict_line: Option<&str>, informational: bool) -> VerdictIcon {
        if exit_code != 0 {
            VerdictIcon::Failure
        } else if informational {
            VerdictIcon::InfoOnly
        } else {
            normalize_icon(verdict_line)
        }
    }
}

/// Write via a temp file and rename so a crash never leaves a half-written
/// record behind.
fn atomic_write(target: &Path, content: &[u8]) -> std::io::Result<()> {
    let parent = target.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "no parent dir")
    })?;
    let temp_path = parent.join(format!(
        ".{}.tmp.{}",
        target.file_name().unwrap_or_default().to_string_lossy(),
        std::process::id()
    ));

    {
        let mut f = fs::File::create(&temp_path)?;
        f.write_all(content)?;
        f.sync_all()?;
    }
    fs::rename(&temp_path, target)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir =
            std::env::temp_dir().join(format!("proofgate-store-{}-{}", tag, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn missing_file_loads_as_empty() {
        let dir = scratch_dir("missing");
        assert!(StatusStore::load(&dir).is_empty());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn corrupt_file_loads_as_empty() {
        let dir = scratch_dir("corrupt");
        fs::write(StatusStore::status_file(&dir), "{{{ not json").unwrap();
        assert!(StatusStore::load(&dir).is_empty());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn update_touches_only_its_own_entry() {
        let dir = scratch_dir("partial");
        StatusStore::update(&dir, "a.py", 0, Some("✅ fine"), false);
        StatusStore::update(&dir, "b.py", 0, Some("⚠️ hmm"), false);
        StatusStore::update(&dir, "a.py", 2, Some("✅ fine"), false);

        let record = StatusStore::load(&dir);
        assert_eq!(record.get("a.py").map(String::as_str), Some("❌"));
        assert_eq!(record.get("b.py").map(String::as_str), Some("⚠️"));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn update_is_idempotent() {
        let dir = scratch_dir("idem");
        StatusStore::update(&dir, "a.py", 0, Some("✅ fine"), false);
        let once = StatusStore::load(&dir);
        StatusStore::update(&dir, "a.py", 0, Some("✅ fine"), false);
        let twice = StatusStore::load(&dir);
        assert_eq!(once, twice);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn icon_precedence_matrix() {
        // Exit code dominates everything, even a printed success line.
        assert_eq!(
            StatusStore::icon_for(2, Some("✅ fine"), false),
            VerdictIcon::Failure
        );
        assert_eq!(StatusStore::icon_for(2, None, true), VerdictIcon::Failure);
        // Informational class wins over the line on a clean exit.
        assert_eq!(
            StatusStore::icon_for(0, Some("⚠️ fyi"), true),
            VerdictIcon::InfoOnly
        );
        // Otherwise the line decides.
        assert_eq!(
            StatusStore::icon_for(0, Some("✅ fine"), false),
            VerdictIcon::Success
        );
        assert_eq!(
            StatusStore::icon_for(0, Some("⚠️ hmm"), false),
            VerdictIcon::Warning
        );
        assert_eq!(StatusStore::icon_for(0, None, false), VerdictIcon::NotRun);
        assert_eq!(
            StatusStore::icon_for(0, Some("odd text"), false),
            VerdictIcon::Unknown
        );
    }

    #[test]
    fn saved_record_is_key_sorted_json() {
        let dir = scratch_dir("sorted");
        StatusStore::update(&dir, "z.py", 0, Some("✅ ok"), false);
        StatusStore::update(&dir, "a.py", 0, Some("✅ ok"), false);

        let text = fs::read_to_string(StatusStore::status_file(&dir)).unwrap();
        let a_pos = text.find("a.py").unwrap();
        let z_pos = text.find("z.py").unwrap();
        assert!(a_pos < z_pos);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn save_failure_is_swallowed() {
        // A file where the directory should be makes every write fail.
        let base = scratch_dir("unwritable");
        let bogus_dir = base.join("not_a_dir");
        fs::write(&bogus_dir, "file, not dir").unwrap();
        StatusStore::update(&bogus_dir, "a.py", 0, Some("✅ ok"), false);
        assert!(StatusStore::load(&bogus_dir).is_empty());
        let _ = fs::remove_dir_all(&base);
    }
}
