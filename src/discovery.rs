//! Book-folder and script discovery
//!
//! Discovery is re-run on every menu visit; nothing here is cached. Scripts
//! come back in lexicographic filename order, which is also the run-all
//! execution order.

use crate::config::types::{Result, ScriptDescriptor, ScriptKind};
use std::fs;
use std::path::{Path, PathBuf};

/// Folder names that never count as script folders
const EXCLUDED_FOLDERS: &[&str] = &["common", ".venv", "__pycache__"];

/// Subdirectories of the books root containing at least one `.docx`
/// anywhere below them, sorted by name.
pub fn find_book_folders(books_root: &Path) -> Result<Vec<PathBuf>> {
    let mut folders: Vec<PathBuf> = fs::read_dir(books_root)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.is_dir() && has_manuscript(p))
        .collect();
    folders.sort_by_key(|p| p.file_name().map(|n| n.to_os_string()).unwrap_or_default());
    Ok(folders)
}

/// Whether a directory holds a `.docx` at any depth. Unreadable
/// subdirectories are skipped, not fatal. Symlinked directories are not
/// followed, so a cyclic link cannot send the probe into infinite descent.
pub fn has_manuscript(dir: &Path) -> bool {
    let Ok(entries) = fs::read_dir(dir) else {
        return false;
    };
    for entry in entries.filter_map(|e| e.ok()) {
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        let path = entry.path();
        if file_type.is_dir() {
            if has_manuscript(&path) {
                return true;
            }
        } else if path.extension().and_then(|e| e.to_str()) == Some("docx") {
            return true;
        }
    }
    false
}

/// Script folders under the scripts root: non-hidden directories minus the
/// support folders, sorted case-insensitively.
pub fn list_script_folders(scripts_root: &Path) -> Result<Vec<PathBuf>> {
    let mut folders: Vec<PathBuf> = fs::read_dir(scripts_root)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| {
            if !p.is_dir() {
                return false;
            }
            let name = p.file_name().map(|n| n.to_string_lossy().into_owned());
            match name {
                Some(name) => !name.starts_with('.') && !EXCLUDED_FOLDERS.contains(&name.as_str()),
                None => false,
            }
        })
        .collect();
    folders.sort_by_key(|p| folder_sort_key(p));
    Ok(folders)
}

/// Runnable scripts in a folder, lexicographic by filename. Only `.py` and
/// `.sh` files are runnable.
pub fn list_scripts(scripts_dir: &Path) -> Result<Vec<ScriptDescriptor>> {
    let mut scripts: Vec<ScriptDescriptor> = fs::read_dir(scripts_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && ScriptKind::from_path(p).is_some())
        .map(ScriptDescriptor::new)
        .collect();
    scripts.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(scripts)
}

fn folder_sort_key(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir =
            std::env::temp_dir().join(format!("proofgate-discovery-{}-{}", tag, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn only_folders_with_a_manuscript_count() {
        let root = scratch_dir("books");
        fs::create_dir_all(root.join("Beta Book/chapters")).unwrap();
        fs::write(root.join("Beta Book/chapters/draft.docx"), "").unwrap();
        fs::create_dir_all(root.join("alpha")).unwrap();
        fs::write(root.join("alpha/draft.docx"), "").unwrap();
        fs::create_dir_all(root.join("empty")).unwrap();
        fs::write(root.join("loose.docx"), "").unwrap(); // file, not a folder

        let folders = find_book_folders(&root).unwrap();
        let names: Vec<String> = folders
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        // Plain name order: uppercase sorts before lowercase.
        assert_eq!(names, ["Beta Book", "alpha"]);
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn cyclic_symlink_does_not_hang_the_manuscript_probe() {
        let root = scratch_dir("cycle");
        let book = root.join("book");
        fs::create_dir_all(&book).unwrap();
        std::os::unix::fs::symlink(&book, book.join("loop")).unwrap();

        assert!(!has_manuscript(&book));

        fs::write(book.join("draft.docx"), "").unwrap();
        assert!(has_manuscript(&book));
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn support_and_hidden_folders_are_excluded() {
        let root = scratch_dir("folders");
        for name in ["rule-based", "llm-based", "common", ".venv", "__pycache__", ".git"] {
            fs::create_dir_all(root.join(name)).unwrap();
        }

        let folders = list_script_folders(&root).unwrap();
        let names: Vec<String> = folders
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["llm-based", "rule-based"]);
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn scripts_come_back_in_lexicographic_order() {
        let dir = scratch_dir("scripts");
        for name in ["10_late.py", "02_clean.py", "01_chunk.py", "wordcount.sh"] {
            fs::write(dir.join(name), "").unwrap();
        }
        fs::write(dir.join("README.md"), "").unwrap();
        fs::write(dir.join("data.txt"), "").unwrap();

        let scripts = list_scripts(&dir).unwrap();
        let names: Vec<&str> = scripts.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            ["01_chunk.py", "02_clean.py", "10_late.py", "wordcount.sh"]
        );
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_roots_surface_as_errors() {
        let root = scratch_dir("gone").join("nope");
        assert!(find_book_folders(&root).is_err());
        assert!(list_scripts(&root).is_err());
    }
}
