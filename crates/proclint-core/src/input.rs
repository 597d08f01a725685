//! Input classification and working-tree materialization
//!
//! The user-supplied input is a local directory, a local archive, a remote
//! archive URL, or a Git URL. Directories are used in place; everything else
//! is materialized into a scoped temp directory that is removed when the
//! [`ResolvedInput`] is dropped.

use crate::error::ProclintError;
use crate::result::Result;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use tracing::{debug, info};

const ARCHIVE_EXTENSIONS: &[&str] = &["zip", "jar"];

/// A materialized working tree, with its cleanup obligation
#[derive(Debug)]
pub struct ResolvedInput {
    working_path: PathBuf,
    temp: Option<TempDir>,
}

impl ResolvedInput {
    pub fn working_path(&self) -> &Path {
        &self.working_path
    }

    /// Whether the working tree is temporary and removed on drop
    pub fn requires_cleanup(&self) -> bool {
        self.temp.is_some()
    }
}

/// Classify the input and materialize a working tree
pub fn resolve(input: &str) -> Result<ResolvedInput> {
    if is_git_url(input) {
        return clone_repository(input);
    }
    if let Some(url) = archive_url(input) {
        return download_and_extract(url);
    }

    let path = Path::new(input);
    if path.is_dir() {
        debug!("Using directory input as-is: {}", path.display());
        return Ok(ResolvedInput {
            working_path: path.to_path_buf(),
            temp: None,
        });
    }
    if path.is_file() && is_archive(path) {
        return extract_local_archive(path);
    }
    if path.is_file() {
        return Err(ProclintError::input_error(format!(
            "'{input}' is not a directory, packaged artifact, or supported URL"
        )));
    }
    Err(ProclintError::input_error(format!(
        "'{input}' does not exist"
    )))
}

fn is_archive(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ARCHIVE_EXTENSIONS.iter().any(|a| ext.eq_ignore_ascii_case(a)))
}

fn is_git_url(input: &str) -> bool {
    if input.starts_with("git@") || input.starts_with("ssh://") {
        return true;
    }
    (input.starts_with("http://") || input.starts_with("https://")) && input.ends_with(".git")
}

fn archive_url(input: &str) -> Option<&str> {
    let is_http = input.starts_with("http://") || input.starts_with("https://");
    let is_archive = ARCHIVE_EXTENSIONS
        .iter()
        .any(|ext| input.to_ascii_lowercase().ends_with(&format!(".{ext}")));
    (is_http && is_archive).then_some(input)
}

fn temp_dir() -> Result<TempDir> {
    tempfile::Builder::new()
        .prefix("proclint-")
        .tempdir()
        .map_err(|e| ProclintError::io_error(std::env::temp_dir(), e))
}

fn extract_local_archive(path: &Path) -> Result<ResolvedInput> {
    info!("Extracting archive {}", path.display());
    let temp = temp_dir()?;
    extract_archive(path, temp.path())?;
    Ok(ResolvedInput {
        working_path: temp.path().to_path_buf(),
        temp: Some(temp),
    })
}

fn extract_archive(archive_path: &Path, dest: &Path) -> Result<()> {
    let file = std::fs::File::open(archive_path)
        .map_err(|e| ProclintError::io_error(archive_path.to_path_buf(), e))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| ProclintError::ArchiveError {
        path: archive_path.to_path_buf(),
        source: e,
    })?;
    archive.extract(dest).map_err(|e| ProclintError::ArchiveError {
        path: archive_path.to_path_buf(),
        source: e,
    })
}

fn download_and_extract(url: &str) -> Result<ResolvedInput> {
    info!("Downloading archive {}", url);
    let temp = temp_dir()?;
    let bytes = reqwest::blocking::get(url)
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.bytes())
        .map_err(|source| ProclintError::DownloadError {
            url: url.to_string(),
            source,
        })?;
    let leaf = url.rsplit('/').next().unwrap_or("artifact.zip");
    let archive_path = temp.path().join(leaf);
    std::fs::write(&archive_path, &bytes)
        .map_err(|e| ProclintError::io_error(archive_path.clone(), e))?;

    let extract_dir = temp.path().join("extracted");
    std::fs::create_dir_all(&extract_dir)
        .map_err(|e| ProclintError::io_error(extract_dir.clone(), e))?;
    extract_archive(&archive_path, &extract_dir)?;
    Ok(ResolvedInput {
        working_path: extract_dir,
        temp: Some(temp),
    })
}

fn clone_repository(url: &str) -> Result<ResolvedInput> {
    info!("Cloning repository {}", url);
    let temp = temp_dir()?;
    let output = Command::new("git")
        .arg("clone")
        .arg("--depth")
        .arg("1")
        .arg(url)
        .arg(temp.path())
        .output()
        .map_err(|e| ProclintError::clone_error(url, e.to_string()))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ProclintError::clone_error(url, stderr.trim().to_string()));
    }
    Ok(ResolvedInput {
        working_path: temp.path().to_path_buf(),
        temp: Some(temp),
    })
}
