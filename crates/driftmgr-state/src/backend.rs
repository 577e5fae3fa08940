//! Backend detection, per spec.md §4.3: read IaC config files alongside a
//! state file and match recognized backend declarations; tolerate
//! malformed configs via a regex fallback.

use std::fs;
use std::path::Path;

use regex::Regex;
use tracing::warn;

use crate::model::BackendKind;

const BACKEND_TYPE_ENV_VARS: &[&str] = &["DRIFTMGR_BACKEND_TYPE", "TF_BACKEND_TYPE"];

pub fn detect_backend(dir: &Path) -> BackendKind {
    if let Some(kind) = detect_from_config_files(dir) {
        return kind;
    }
    if let Some(kind) = detect_from_environment() {
        return kind;
    }
    BackendKind::Local
}

fn detect_from_config_files(dir: &Path) -> Option<BackendKind> {
    let entries = fs::read_dir(dir).ok()?;
    let backend_pattern = Regex::new(r#"backend\s+"(\w+)""#).ok()?;

    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("tf") {
            continue;
        }
        let Ok(contents) = fs::read_to_string(&path) else { continue };

        if let Some(captures) = backend_pattern.captures(&contents) {
            if let Some(label) = captures.get(1) {
                return Some(classify_backend_label(label.as_str()));
            }
        } else if contents.contains("backend") {
            warn!(path = %path.display(), "found a backend reference but could not parse it structurally; falling back to regex extraction");
            if let Some(kind) = fallback_extract(&contents) {
                return Some(kind);
            }
        }
    }
    None
}

/// Best-effort key/value extraction used when the structured match above
/// fails entirely (e.g. the config uses unusual whitespace or quoting).
fn fallback_extract(contents: &str) -> Option<BackendKind> {
    let loose_pattern = Regex::new(r#"backend\s*[:=]?\s*['"]?(\w+)['"]?"#).ok()?;
    loose_pattern.captures(contents).and_then(|c| c.get(1)).map(|m| classify_backend_label(m.as_str()))
}

fn classify_backend_label(label: &str) -> BackendKind {
    match label.to_lowercase().as_str() {
        "s3" => BackendKind::ObjectStore,
        "azurerm" => BackendKind::BlobStore,
        "gcs" => BackendKind::Gcs,
        "remote" | "cloud" => BackendKind::Remote,
        _ => BackendKind::Local,
    }
}

fn detect_from_environment() -> Option<BackendKind> {
    for var in BACKEND_TYPE_ENV_VARS {
        if let Ok(value) = std::env::var(var) {
            return Some(classify_backend_label(&value));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn recognizes_an_s3_backend_declaration() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("backend.tf"), r#"terraform { backend "s3" { bucket = "x" } }"#).unwrap();
        assert_eq!(detect_backend(dir.path()), BackendKind::ObjectStore);
    }

    #[test]
    fn falls_back_to_local_when_nothing_matches() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("main.tf"), "resource \"aws_instance\" \"x\" {}").unwrap();
        assert_eq!(detect_backend(dir.path()), BackendKind::Local);
    }

    #[test]
    fn recovers_a_backend_label_from_malformed_config_via_regex_fallback() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("backend.tf"), "terraform { backend = azurerm #unterminated").unwrap();
        assert_eq!(detect_backend(dir.path()), BackendKind::BlobStore);
    }
}
