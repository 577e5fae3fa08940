//! State-file discovery, per spec.md §4.3: walk the filesystem tree,
//! recognize state files by suffix, and skip hidden directories except the
//! conventional nested-state ones.

use std::path::{Path, PathBuf};

use driftmgr_core::error::DriftError;
use walkdir::{DirEntry, WalkDir};

const STATE_SUFFIXES: &[&str] = &[".tfstate", ".tfstate.backup"];

/// Directories that are hidden (dot-prefixed) but conventionally hold
/// nested state and must still be walked.
const ALLOWED_HIDDEN_DIRS: &[&str] = &[".terraform"];

pub fn find_state_files(root_path: &Path) -> Result<Vec<PathBuf>, DriftError> {
    let mut paths = Vec::new();

    let walker = WalkDir::new(root_path).into_iter().filter_entry(is_not_excluded_hidden_dir);
    for entry in walker {
        let entry = entry.map_err(|e| DriftError::internal("state.find_state_files", e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy();
        if STATE_SUFFIXES.iter().any(|suffix| file_name.ends_with(suffix)) {
            paths.push(entry.path().to_path_buf());
        }
    }

    Ok(paths)
}

fn is_not_excluded_hidden_dir(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return true;
    }
    let name = entry.file_name().to_string_lossy();
    if !name.starts_with('.') {
        return true;
    }
    ALLOWED_HIDDEN_DIRS.contains(&name.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn finds_state_files_and_skips_unrelated_hidden_dirs() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("terraform.tfstate"), "{}").unwrap();
        fs::write(dir.path().join("terraform.tfstate.backup"), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "irrelevant").unwrap();

        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git/terraform.tfstate"), "{}").unwrap();

        fs::create_dir(dir.path().join(".terraform")).unwrap();
        fs::write(dir.path().join(".terraform/terraform.tfstate"), "{}").unwrap();

        let found = find_state_files(dir.path()).unwrap();
        assert_eq!(found.len(), 3);
        assert!(!found.iter().any(|p| p.to_string_lossy().contains(".git")));
    }
}
