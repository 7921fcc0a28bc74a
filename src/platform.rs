//! Collaborators outside the pipeline: pickers, storage, sharing, permissions
//!
//! Each is a trait so a front end can plug in its own; the implementations
//! here cover a desktop or command-line environment.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::model::PickedFile;

/// Result of an interactive pick
///
/// Cancellation is an ordinary outcome, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Ok(T),
    Cancelled,
    Failed(String),
}

/// Lets the user choose one or more PDF files
pub trait DocumentPicker {
    fn pick_documents(&self) -> Outcome<Vec<PickedFile>>;
}

/// Lets the user choose a writable directory
pub trait DirectoryPicker {
    fn pick_directory(&self) -> Outcome<PathBuf>;
}

/// Reads and writes whole files
pub trait FileStore {
    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>>;
    fn write_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()>;
}

/// What gets handed to the share target
#[derive(Debug, Clone, PartialEq)]
pub struct ShareRequest {
    pub url: PathBuf,
    pub mime_type: String,
    pub title: String,
}

/// Offers a finished file to the user
pub trait ShareTarget {
    fn share(&self, request: &ShareRequest) -> Result<()>;
}

/// Grants or denies storage access
pub trait PermissionGate {
    fn request_storage_access(&self) -> bool;
}

/// Picks a fixed list of paths, as given on a command line
///
/// An empty list counts as cancelled; a missing file fails the pick.
#[derive(Debug, Clone, Default)]
pub struct PathPicker {
    paths: Vec<PathBuf>,
}

impl PathPicker {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }
}

impl DocumentPicker for PathPicker {
    fn pick_documents(&self) -> Outcome<Vec<PickedFile>> {
        if self.paths.is_empty() {
            return Outcome::Cancelled;
        }

        let mut picked = Vec::with_capacity(self.paths.len());
        for path in &self.paths {
            let metadata = match fs::metadata(path) {
                Ok(metadata) if metadata.is_file() => metadata,
                Ok(_) => return Outcome::Failed(format!("not a file: {}", path.display())),
                Err(e) => return Outcome::Failed(format!("{}: {}", path.display(), e)),
            };

            picked.push(PickedFile {
                uri: path.clone(),
                name: path.file_name().map(|n| n.to_string_lossy().to_string()),
                size: Some(metadata.len()),
            });
        }

        Outcome::Ok(picked)
    }
}

/// Always picks the same directory; `None` behaves like a cancelled dialog
#[derive(Debug, Clone, Default)]
pub struct FixedDirectory(pub Option<PathBuf>);

impl DirectoryPicker for FixedDirectory {
    fn pick_directory(&self) -> Outcome<PathBuf> {
        match &self.0 {
            Some(dir) if dir.exists() && !dir.is_dir() => {
                Outcome::Failed(format!("not a directory: {}", dir.display()))
            }
            Some(dir) => Outcome::Ok(dir.clone()),
            None => Outcome::Cancelled,
        }
    }
}

/// Files on the local file system
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFiles;

impl FileStore for LocalFiles {
    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        Ok(fs::read(path)?)
    }

    /// Writes the full content, creating the parent directory if needed
    fn write_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, bytes)?;
        Ok(())
    }
}

/// Storage is always available on desktop platforms
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysGranted;

impl PermissionGate for AlwaysGranted {
    fn request_storage_access(&self) -> bool {
        true
    }
}

/// Opens the shared file with the system default application
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenWithDefaultApp;

impl ShareTarget for OpenWithDefaultApp {
    fn share(&self, request: &ShareRequest) -> Result<()> {
        open_file(&request.url).map_err(|e| Error::Share(e.to_string()))
    }
}

/// Leaves the file where it was written
#[derive(Debug, Clone, Copy, Default)]
pub struct NoShare;

impl ShareTarget for NoShare {
    fn share(&self, request: &ShareRequest) -> Result<()> {
        log::info!("output ready: {}", request.url.display());
        Ok(())
    }
}

/// Open a file with the system default application
fn open_file(path: &Path) -> std::io::Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(path).spawn()?;
    }
    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(path).spawn()?;
    }
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", "", &path.display().to_string()])
            .spawn()?;
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        log::warn!("no default opener on this platform for {}", path.display());
    }
    Ok(())
}
