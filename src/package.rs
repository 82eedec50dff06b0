use std::fs;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use tar::Builder;
use tempfile::TempDir;
use walkdir::WalkDir;

use crate::error::{DeployError, Result};

/// A built deployment archive. Holds the staging tempdir so the local
/// archive is removed as soon as the value goes out of scope.
pub struct DeployArchive {
    path: PathBuf,
    _staging: TempDir,
}

impl DeployArchive {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Copies each manifest path into a fresh staging directory and produces one
/// gzip tar archive whose root is the staging directory's contents. Any
/// missing source path aborts; no partial archive is produced.
pub fn build_archive(project_root: &Path, manifest_paths: &[String]) -> Result<DeployArchive> {
    let temp = tempfile::tempdir()?;
    let staging = temp.path().join("deploy");
    fs::create_dir_all(&staging)?;

    for rel in manifest_paths {
        let source = project_root.join(rel);
        let dest = staging.join(rel);
        if source.is_dir() {
            copy_dir(&source, &dest)?;
        } else if source.is_file() {
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(&source, &dest)?;
        } else {
            return Err(DeployError::Config(format!(
                "deploy file {rel} not found under {}",
                project_root.display()
            )));
        }
        tracing::debug!(entry = rel.as_str(), "staged");
    }

    let archive_path = temp.path().join("deploy.tar.gz");
    create_tar_gz(&staging, &archive_path)?;
    Ok(DeployArchive {
        path: archive_path,
        _staging: temp,
    })
}

/// Replaces `dst` with a copy of `src` (delete-then-copy).
fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    if dst.exists() {
        fs::remove_dir_all(dst)?;
    }
    fs::create_dir_all(dst)?;
    for entry in WalkDir::new(src) {
        let entry = entry?;
        let rel = entry.path().strip_prefix(src).unwrap_or(entry.path());
        if rel.as_os_str().is_empty() {
            continue;
        }
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

fn create_tar_gz(source: &Path, dest: &Path) -> Result<()> {
    let tar_gz = fs::File::create(dest)?;
    let encoder = GzEncoder::new(tar_gz, Compression::default());
    let mut builder = Builder::new(encoder);
    builder.append_dir_all(".", source)?;
    let encoder = builder.into_inner()?;
    encoder.finish()?;
    Ok(())
}
