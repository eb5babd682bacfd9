// SPDX-License-Identifier: GPL-3.0-only

//! Saving captured photos into a user-granted directory
//!
//! ```text
//! grant → subfolder → read + encode → name → create entry → write
//! ```
//!
//! Every step aborts the save on failure; nothing is retried. The photo is
//! fully buffered before the destination entry exists, and an entry whose
//! write fails is deleted again, so a failed save leaves no empty file.

use super::capture::CapturedImage;
use crate::config::{Config, GrantCachePolicy};
use crate::constants::{DEFAULT_SAVE_FOLDER, photo};
use crate::errors::PersistError;
use crate::storage::{self, DirectoryAccess, DirectoryGrant, DirectoryPicker};
use std::io;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Source of capture timestamps for file names
pub trait Clock {
    /// Milliseconds since the Unix epoch
    fn now_millis(&self) -> u64;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        chrono::Utc::now().timestamp_millis().max(0) as u64
    }
}

/// A photo written to the granted directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFile {
    /// Application subfolder inside the granted root
    pub directory: PathBuf,
    pub file_name: String,
    pub mime_type: String,
    /// Number of photo bytes written
    pub byte_len: usize,
}

impl SavedFile {
    pub fn path(&self) -> PathBuf {
        self.directory.join(&self.file_name)
    }
}

/// Persistence writer
///
/// Owns the directory grant cache; see [`GrantCachePolicy`].
pub struct PersistenceWriter<A, P, C = SystemClock> {
    access: A,
    picker: P,
    clock: C,
    folder_name: String,
    grant_cache: GrantCachePolicy,
    grant: Mutex<Option<DirectoryGrant>>,
}

impl<A: DirectoryAccess, P: DirectoryPicker> PersistenceWriter<A, P, SystemClock> {
    pub fn new(access: A, picker: P) -> Self {
        Self::with_clock(access, picker, SystemClock)
    }
}

impl<A: DirectoryAccess, P: DirectoryPicker, C: Clock> PersistenceWriter<A, P, C> {
    pub fn with_clock(access: A, picker: P, clock: C) -> Self {
        Self {
            access,
            picker,
            clock,
            folder_name: DEFAULT_SAVE_FOLDER.to_string(),
            grant_cache: GrantCachePolicy::default(),
            grant: Mutex::new(None),
        }
    }

    /// Name of the application subfolder
    pub fn with_folder_name(mut self, name: impl Into<String>) -> Self {
        self.folder_name = name.into();
        self
    }

    pub fn with_grant_cache(mut self, policy: GrantCachePolicy) -> Self {
        self.grant_cache = policy;
        self
    }

    /// Apply the folder name and grant policy from the user config
    pub fn with_config(self, config: &Config) -> Self {
        self.with_folder_name(config.save_folder_name.clone())
            .with_grant_cache(config.grant_cache)
    }

    pub fn access(&self) -> &A {
        &self.access
    }

    /// Save a captured photo
    pub async fn persist(&self, image: CapturedImage) -> Result<SavedFile, PersistError> {
        let grant = self.directory_grant().await?;

        let folder = match self.access.make_directory(&grant.root, &self.folder_name).await {
            Ok(folder) => folder,
            Err(e) => {
                error!(root = %grant.root.display(), error = %e, "Failed to prepare save folder");
                // A grant that no longer works is not worth keeping
                self.forget_grant().await;
                return Err(PersistError::DirectoryCreateFailed(e.to_string()));
            }
        };

        let content = storage::read_as_base64(image.path()).await.map_err(|e| {
            error!(path = %image.path().display(), error = %e, "Failed to read captured image");
            PersistError::ReadFailed(e.to_string())
        })?;

        let (file, file_name) = self.create_photo_file(&folder).await?;

        if let Err(e) = self.access.write_base64(&file, &content).await {
            error!(path = %file.display(), error = %e, "Failed to write photo");
            if let Err(cleanup) = self.access.delete_file(&file).await {
                warn!(
                    path = %file.display(),
                    error = %cleanup,
                    "Failed to remove empty photo file"
                );
            }
            return Err(PersistError::WriteFailed(e.to_string()));
        }

        let saved = SavedFile {
            directory: folder,
            file_name,
            mime_type: photo::MIME_TYPE.to_string(),
            byte_len: storage::decoded_len(&content),
        };
        info!(path = %saved.path().display(), size = saved.byte_len, "Photo saved");
        Ok(saved)
    }

    /// Cached grant if still valid, otherwise prompt the user
    ///
    /// The grant slot stays locked while the picker is open, so saves that
    /// overlap wait for the first answer instead of prompting again.
    pub async fn directory_grant(&self) -> Result<DirectoryGrant, PersistError> {
        let mut slot = self.grant.lock().await;
        if let Some(grant) = slot.as_ref().filter(|grant| self.is_fresh(grant)) {
            debug!(root = %grant.root.display(), "Reusing directory grant");
            return Ok(grant.clone());
        }

        let Some(root) = self.picker.request_directory().await else {
            info!("Directory access declined, photo not saved");
            return Err(PersistError::PermissionDenied);
        };

        let grant = DirectoryGrant {
            root,
            granted_at: Instant::now(),
        };
        info!(root = %grant.root.display(), "Directory access granted");
        *slot = Some(grant.clone());
        Ok(grant)
    }

    /// Drop the cached grant so the next save prompts again
    pub async fn forget_grant(&self) {
        self.grant.lock().await.take();
    }

    fn is_fresh(&self, grant: &DirectoryGrant) -> bool {
        match self.grant_cache.max_age() {
            Some(max_age) => grant.granted_at.elapsed() < max_age,
            None => true,
        }
    }

    /// Create `photo_<millis>.jpg`, bumping the millisecond value while the
    /// name is taken
    ///
    /// Creation itself is the existence check, so concurrent saves in the
    /// same millisecond each end up with their own name.
    async fn create_photo_file(&self, folder: &Path) -> Result<(PathBuf, String), PersistError> {
        let millis = self.clock.now_millis();
        for bump in 0..photo::MAX_NAME_ATTEMPTS {
            let name = photo::file_name(millis + bump);
            match self.access.create_file(folder, &name, photo::MIME_TYPE).await {
                Ok(file) => {
                    if bump > 0 {
                        debug!(file_name = %name, bump, "Photo name taken, bumped timestamp");
                    }
                    return Ok((file, name));
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    error!(
                        folder = %folder.display(),
                        file_name = %name,
                        error = %e,
                        "Failed to create photo file"
                    );
                    return Err(PersistError::FileCreateFailed(e.to_string()));
                }
            }
        }
        Err(PersistError::FileCreateFailed(format!(
            "no free photo name near {}",
            photo::file_name(millis)
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FolderPicker, LocalDirectoryAccess};
    use std::cell::Cell;
    use std::time::Duration;

    struct FixedClock(u64);

    impl Clock for FixedClock {
        fn now_millis(&self) -> u64 {
            self.0
        }
    }

    /// Clock that advances one millisecond per reading
    struct TickingClock(Cell<u64>);

    impl Clock for TickingClock {
        fn now_millis(&self) -> u64 {
            let now = self.0.get();
            self.0.set(now + 1);
            now
        }
    }

    /// Picker that counts prompts and yields like a dialog would
    struct CountingPicker {
        root: PathBuf,
        prompts: Cell<u32>,
    }

    impl DirectoryPicker for CountingPicker {
        async fn request_directory(&self) -> Option<PathBuf> {
            self.prompts.set(self.prompts.get() + 1);
            tokio::task::yield_now().await;
            Some(self.root.clone())
        }
    }

    fn fixed_root(root: &Path) -> FolderPicker {
        FolderPicker::Fixed(root.to_path_buf())
    }

    /// Local access whose writes always fail
    struct FullDisk;

    impl DirectoryAccess for FullDisk {
        async fn make_directory(&self, parent: &Path, name: &str) -> io::Result<PathBuf> {
            LocalDirectoryAccess.make_directory(parent, name).await
        }

        async fn create_file(&self, dir: &Path, name: &str, mime: &str) -> io::Result<PathBuf> {
            LocalDirectoryAccess.create_file(dir, name, mime).await
        }

        async fn write_base64(&self, _file: &Path, _content: &str) -> io::Result<()> {
            Err(io::Error::other("disk full"))
        }

        async fn delete_file(&self, file: &Path) -> io::Result<()> {
            LocalDirectoryAccess.delete_file(file).await
        }
    }

    fn image_in(dir: &Path, name: &str, bytes: &[u8]) -> CapturedImage {
        let path = dir.join(name);
        std::fs::write(&path, bytes).unwrap();
        CapturedImage::from_file(path, 1, 1)
    }

    #[tokio::test]
    async fn test_persist_writes_into_app_folder() {
        let cache = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let writer = PersistenceWriter::with_clock(
            LocalDirectoryAccess,
            fixed_root(root.path()),
            FixedClock(1_700_000_000_000),
        );

        let saved = writer
            .persist(image_in(cache.path(), "a.jpg", b"jpegbytes"))
            .await
            .unwrap();

        assert_eq!(saved.directory, root.path().join(DEFAULT_SAVE_FOLDER));
        assert_eq!(saved.file_name, "photo_1700000000000.jpg");
        assert_eq!(saved.mime_type, "image/jpeg");
        assert_eq!(saved.byte_len, 9);
        assert_eq!(std::fs::read(saved.path()).unwrap(), b"jpegbytes");
    }

    #[tokio::test]
    async fn test_same_millisecond_does_not_overwrite() {
        let cache = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let writer = PersistenceWriter::with_clock(
            LocalDirectoryAccess,
            fixed_root(root.path()),
            FixedClock(42),
        );

        let first = writer.persist(image_in(cache.path(), "1.jpg", b"one")).await.unwrap();
        let second = writer.persist(image_in(cache.path(), "2.jpg", b"two")).await.unwrap();

        assert_eq!(first.file_name, "photo_42.jpg");
        assert_eq!(second.file_name, "photo_43.jpg");
        assert_eq!(std::fs::read(first.path()).unwrap(), b"one");
        assert_eq!(std::fs::read(second.path()).unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_concurrent_saves_in_same_millisecond_get_distinct_names() {
        let cache = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let writer = PersistenceWriter::with_clock(
            LocalDirectoryAccess,
            fixed_root(root.path()),
            FixedClock(42),
        );

        let (a, b) = futures::join!(
            writer.persist(image_in(cache.path(), "a.jpg", b"aaa")),
            writer.persist(image_in(cache.path(), "b.jpg", b"bbb")),
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        let mut names = vec![a.file_name.clone(), b.file_name.clone()];
        names.sort();
        assert_eq!(names, ["photo_42.jpg", "photo_43.jpg"]);
        assert_eq!(std::fs::read(a.path()).unwrap(), b"aaa");
        assert_eq!(std::fs::read(b.path()).unwrap(), b"bbb");
    }

    #[tokio::test]
    async fn test_consecutive_milliseconds_get_their_own_names() {
        let cache = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let clock = TickingClock(Cell::new(1_700_000_000_100));
        let writer =
            PersistenceWriter::with_clock(LocalDirectoryAccess, fixed_root(root.path()), clock);

        let first = writer.persist(image_in(cache.path(), "1.jpg", b"one")).await.unwrap();
        let second = writer.persist(image_in(cache.path(), "2.jpg", b"two")).await.unwrap();

        assert_eq!(first.file_name, "photo_1700000000100.jpg");
        assert_eq!(second.file_name, "photo_1700000000101.jpg");
        assert_eq!(std::fs::read(first.path()).unwrap(), b"one");
        assert_eq!(std::fs::read(second.path()).unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_read_failure_creates_nothing() {
        let root = tempfile::tempdir().unwrap();
        let writer = PersistenceWriter::new(
            LocalDirectoryAccess,
            fixed_root(root.path()),
        );

        let missing = CapturedImage::from_file(root.path().join("gone.jpg"), 1, 1);
        let err = writer.persist(missing).await.unwrap_err();
        assert!(matches!(err, PersistError::ReadFailed(_)));

        let folder = root.path().join(DEFAULT_SAVE_FOLDER);
        assert_eq!(std::fs::read_dir(folder).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_write_failure_leaves_no_empty_file() {
        let cache = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let writer = PersistenceWriter::new(FullDisk, fixed_root(root.path()));

        let err = writer.persist(image_in(cache.path(), "a.jpg", b"bytes")).await.unwrap_err();
        assert_eq!(err, PersistError::WriteFailed("disk full".into()));
        assert_eq!(err.to_string(), "Could not write photo: disk full");

        let folder = root.path().join(DEFAULT_SAVE_FOLDER);
        assert_eq!(std::fs::read_dir(folder).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_declined_grant_touches_nothing() {
        let cache = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let missing = root.path().join("missing");
        let writer = PersistenceWriter::new(LocalDirectoryAccess, fixed_root(&missing));

        let err = writer.persist(image_in(cache.path(), "a.jpg", b"bytes")).await.unwrap_err();
        assert_eq!(err, PersistError::PermissionDenied);
        assert!(!missing.exists());
        assert!(writer.grant.lock().await.is_none());
    }

    #[tokio::test]
    async fn test_config_applies_folder_name() {
        let cache = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let config = Config {
            save_folder_name: "Scans".into(),
            ..Config::default()
        };
        let writer = PersistenceWriter::new(LocalDirectoryAccess, fixed_root(root.path()))
            .with_config(&config);

        let saved = writer.persist(image_in(cache.path(), "a.jpg", b"x")).await.unwrap();
        assert_eq!(saved.directory, root.path().join("Scans"));
    }

    #[tokio::test]
    async fn test_process_policy_prompts_once() {
        let cache = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let picker = CountingPicker {
            root: root.path().to_path_buf(),
            prompts: Cell::new(0),
        };
        let writer = PersistenceWriter::new(LocalDirectoryAccess, picker)
            .with_grant_cache(GrantCachePolicy::Process);

        writer.persist(image_in(cache.path(), "1.jpg", b"1")).await.unwrap();
        writer.persist(image_in(cache.path(), "2.jpg", b"2")).await.unwrap();
        assert_eq!(writer.picker.prompts.get(), 1);
    }

    #[tokio::test]
    async fn test_overlapping_saves_share_one_prompt() {
        let cache = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let picker = CountingPicker {
            root: root.path().to_path_buf(),
            prompts: Cell::new(0),
        };
        let writer = PersistenceWriter::new(LocalDirectoryAccess, picker)
            .with_grant_cache(GrantCachePolicy::Process);

        let (a, b) = futures::join!(
            writer.persist(image_in(cache.path(), "1.jpg", b"1")),
            writer.persist(image_in(cache.path(), "2.jpg", b"2")),
        );
        a.unwrap();
        b.unwrap();
        assert_eq!(writer.picker.prompts.get(), 1);
    }

    #[tokio::test]
    async fn test_every_capture_policy_prompts_each_time() {
        let root = tempfile::tempdir().unwrap();
        let picker = CountingPicker {
            root: root.path().to_path_buf(),
            prompts: Cell::new(0),
        };
        let writer = PersistenceWriter::new(LocalDirectoryAccess, picker)
            .with_grant_cache(GrantCachePolicy::EveryCapture);

        writer.directory_grant().await.unwrap();
        writer.directory_grant().await.unwrap();
        assert_eq!(writer.picker.prompts.get(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_policy_expires() {
        let root = tempfile::tempdir().unwrap();
        let picker = CountingPicker {
            root: root.path().to_path_buf(),
            prompts: Cell::new(0),
        };
        let writer = PersistenceWriter::new(LocalDirectoryAccess, picker)
            .with_grant_cache(GrantCachePolicy::Minutes(1));

        writer.directory_grant().await.unwrap();
        tokio::time::advance(Duration::from_secs(59)).await;
        writer.directory_grant().await.unwrap();
        assert_eq!(writer.picker.prompts.get(), 1);

        tokio::time::advance(Duration::from_secs(1)).await;
        writer.directory_grant().await.unwrap();
        assert_eq!(writer.picker.prompts.get(), 2);
    }
}
