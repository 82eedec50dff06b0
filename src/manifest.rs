use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::content_type;
use crate::error::{DeployError, Result};

/// One file selected for upload: where it lives locally, its path relative
/// to the walked root (always `/`-separated), and the MIME type it will be
/// stored with.
#[derive(Debug, Clone)]
pub struct FileManifestEntry {
    pub local_path: PathBuf,
    pub relative_path: String,
    pub content_type: &'static str,
}

/// Walks `local_root` and returns an entry per regular file. Relative paths
/// are unique by construction (they come from one filesystem tree).
pub fn walk(local_root: &Path) -> Result<Vec<FileManifestEntry>> {
    if !local_root.is_dir() {
        return Err(DeployError::Config(format!(
            "local directory {} does not exist",
            local_root.display()
        )));
    }
    let mut entries = Vec::new();
    for entry in WalkDir::new(local_root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry.path().strip_prefix(local_root).unwrap_or(entry.path());
        let relative_path = rel
            .components()
            .map(|component| component.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        let content_type = content_type::resolve(&relative_path);
        entries.push(FileManifestEntry {
            local_path: entry.into_path(),
            relative_path,
            content_type,
        });
    }
    Ok(entries)
}

/// Joins the optional key prefix and a relative path into an object key.
pub fn object_key(prefix: Option<&str>, relative_path: &str) -> String {
    match prefix {
        Some(prefix) if !prefix.is_empty() => {
            format!("{}/{relative_path}", prefix.trim_end_matches('/'))
        }
        _ => relative_path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs;

    #[test]
    fn walk_produces_expected_keys_and_content_types() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("a.html"), "<html></html>").expect("write");
        fs::create_dir(dir.path().join("sub")).expect("mkdir");
        fs::write(dir.path().join("sub/b.png"), [0u8; 4]).expect("write");

        let entries = walk(dir.path()).expect("walk");
        assert_eq!(entries.len(), 2);

        let keys: HashSet<String> = entries
            .iter()
            .map(|entry| object_key(Some("site"), &entry.relative_path))
            .collect();
        assert_eq!(
            keys,
            HashSet::from(["site/a.html".to_string(), "site/sub/b.png".to_string()])
        );

        for entry in &entries {
            match entry.relative_path.as_str() {
                "a.html" => assert_eq!(entry.content_type, "text/html"),
                "sub/b.png" => assert_eq!(entry.content_type, "image/png"),
                other => panic!("unexpected entry {other}"),
            }
        }
    }

    #[test]
    fn object_key_without_prefix_is_the_relative_path() {
        assert_eq!(object_key(None, "sub/b.png"), "sub/b.png");
        assert_eq!(object_key(Some(""), "a.html"), "a.html");
    }

    #[test]
    fn object_key_strips_trailing_slash_from_prefix() {
        assert_eq!(object_key(Some("site/"), "a.html"), "site/a.html");
    }

    #[test]
    fn walk_rejects_missing_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("nope");
        assert!(walk(&missing).is_err());
    }
}
