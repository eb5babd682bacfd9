// SPDX-License-Identifier: MPL-2.0

//! Storage utilities for user-granted directories
//!
//! Photos leave the application's private cache through a directory the user
//! picked. Access follows a small document-style API: pick a root, get or
//! create a subfolder, create an empty typed file, then write base64 content
//! into it in one call.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// A user-authorized directory outside the application's private storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryGrant {
    pub root: PathBuf,
    pub granted_at: Instant,
}

/// Interactive "request directory access" call
pub trait DirectoryPicker {
    /// Ask the user for a directory; `None` means the request was declined
    fn request_directory(&self) -> impl Future<Output = Option<PathBuf>>;
}

/// Directory pickers available to the front ends
#[derive(Debug, Clone)]
pub enum FolderPicker {
    /// Native folder dialog
    Native { title: String },
    /// Directory chosen up front (e.g. a command line flag)
    Fixed(PathBuf),
}

impl FolderPicker {
    pub fn native() -> Self {
        Self::Native {
            title: "Choose where to save photos".to_string(),
        }
    }
}

impl DirectoryPicker for FolderPicker {
    async fn request_directory(&self) -> Option<PathBuf> {
        match self {
            FolderPicker::Native { title } => {
                let picked = rfd::AsyncFileDialog::new()
                    .set_title(title.as_str())
                    .pick_folder()
                    .await
                    .map(|handle| handle.path().to_path_buf());
                if picked.is_none() {
                    info!("Folder selection cancelled");
                }
                picked
            }
            FolderPicker::Fixed(path) => path.is_dir().then(|| path.clone()),
        }
    }
}

/// Directory-permission & write API
pub trait DirectoryAccess {
    /// Get `parent/name`, creating it if absent
    fn make_directory(
        &self,
        parent: &Path,
        name: &str,
    ) -> impl Future<Output = io::Result<PathBuf>>;

    /// Create a new empty file of `mime_type`
    ///
    /// Fails with [`io::ErrorKind::AlreadyExists`] if the name is taken; the
    /// check and the creation are one atomic step.
    fn create_file(
        &self,
        dir: &Path,
        name: &str,
        mime_type: &str,
    ) -> impl Future<Output = io::Result<PathBuf>>;

    /// Replace the content of `file` with the decoded base64 payload
    fn write_base64(&self, file: &Path, content: &str) -> impl Future<Output = io::Result<()>>;

    /// Remove a file created by [`create_file`](Self::create_file)
    fn delete_file(&self, file: &Path) -> impl Future<Output = io::Result<()>>;
}

/// [`DirectoryAccess`] on the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalDirectoryAccess;

impl DirectoryAccess for LocalDirectoryAccess {
    async fn make_directory(&self, parent: &Path, name: &str) -> io::Result<PathBuf> {
        let dir = parent.join(name);
        tokio::fs::create_dir_all(&dir).await?;
        debug!(path = %dir.display(), "Folder ready");
        Ok(dir)
    }

    async fn create_file(&self, dir: &Path, name: &str, mime_type: &str) -> io::Result<PathBuf> {
        if !extension_matches_mime(name, mime_type) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} does not match type {}", name, mime_type),
            ));
        }
        let path = dir.join(name);
        tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        Ok(path)
    }

    async fn write_base64(&self, file: &Path, content: &str) -> io::Result<()> {
        let bytes = BASE64
            .decode(content)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        // Write beside the target and rename over it so readers never see a partial photo
        let temp = partial_path(file)?;
        if let Err(e) = tokio::fs::write(&temp, &bytes).await {
            discard_partial(&temp).await;
            return Err(e);
        }
        if let Err(e) = tokio::fs::rename(&temp, file).await {
            discard_partial(&temp).await;
            return Err(e);
        }
        debug!(path = %file.display(), size = bytes.len(), "File written");
        Ok(())
    }

    async fn delete_file(&self, file: &Path) -> io::Result<()> {
        tokio::fs::remove_file(file).await
    }
}

/// Read a local file fully and return it base64 encoded
pub async fn read_as_base64(path: &Path) -> io::Result<String> {
    let bytes = tokio::fs::read(path).await?;
    Ok(BASE64.encode(bytes))
}

/// Size in bytes of a base64 payload once decoded
pub fn decoded_len(content: &str) -> usize {
    let padding = content.bytes().rev().take_while(|b| *b == b'=').count();
    (content.len() / 4 * 3).saturating_sub(padding)
}

async fn discard_partial(temp: &Path) {
    match tokio::fs::remove_file(temp).await {
        Ok(()) => debug!(path = %temp.display(), "Removed partial write"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %temp.display(), error = %e, "Failed to remove partial write"),
    }
}

fn partial_path(file: &Path) -> io::Result<PathBuf> {
    let name = file
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "file has no name"))?;
    Ok(file.with_file_name(format!(".{}.part", name.to_string_lossy())))
}

fn extension_matches_mime(name: &str, mime_type: &str) -> bool {
    let extension = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match mime_type {
        "image/jpeg" => matches!(extension.as_str(), "jpg" | "jpeg"),
        "image/png" => extension == "png",
        other => {
            warn!(mime_type = other, "Unknown MIME type, accepting any extension");
            true
        }
    }
}
