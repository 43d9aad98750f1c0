//! Local disk media store
//!
//! Photos go to `<root>/uploads`, rules PDFs to `<root>/rules`. References
//! are root-relative paths (`uploads/2026-...-<uuid>-cabin.jpg`) so the
//! static file routes can serve them directly. Files are created exclusively;
//! an existing file is never overwritten.

use async_trait::async_trait;
use chrono::Utc;
use homestay_common::config::{StorageBackend, RULES_DIR, UPLOADS_DIR};
use std::path::{Component, Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use uuid::Uuid;

use super::{CleanupOutcome, Destination, IncomingFile, MediaError, MediaStore, StoredAsset, UploadField};

pub struct LocalMediaStore {
    root: PathBuf,
}

impl LocalMediaStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn subdir(field: UploadField) -> &'static str {
        match field {
            UploadField::Photo => UPLOADS_DIR,
            UploadField::Details => RULES_DIR,
        }
    }

    /// Map a stored reference back to a path under the root
    fn resolve(&self, reference: &str) -> Result<PathBuf, MediaError> {
        let relative = Path::new(reference);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !safe || reference.is_empty() {
            return Err(MediaError::UnsafePath(reference.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

/// Unique, filesystem-safe name: `<UTC timestamp>-<uuid>-<original name>`
fn stored_file_name(original: &str) -> String {
    // Browsers may send a full client path
    let base = original.rsplit(['/', '\\']).next().unwrap_or_default();

    let mut cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        cleaned = "file".to_string();
    }

    format!(
        "{}-{}-{}",
        Utc::now().format("%Y-%m-%dT%H-%M-%S%.3fZ"),
        Uuid::new_v4().simple(),
        cleaned
    )
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    fn backend(&self) -> StorageBackend {
        StorageBackend::Local
    }

    fn destination(&self, field: UploadField) -> Destination {
        Destination::LocalDir(Self::subdir(field))
    }

    async fn store(&self, field: UploadField, file: IncomingFile) -> Result<StoredAsset, MediaError> {
        let subdir = Self::subdir(field);
        let dir = self.root.join(subdir);
        fs::create_dir_all(&dir).await?;

        let file_name = stored_file_name(&file.file_name);
        let path = dir.join(&file_name);
        let mut out = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        out.write_all(&file.bytes).await?;
        out.flush().await?;

        debug!(
            field = field.name(),
            path = %path.display(),
            size = file.bytes.len(),
            "Stored upload on local disk"
        );

        Ok(StoredAsset {
            reference: format!("{}/{}", subdir, file_name),
            asset_id: None,
        })
    }

    async fn finalize_rules(&self, home_id: Uuid, asset: StoredAsset) -> Result<StoredAsset, MediaError> {
        let target = format!("{}/{}.pdf", RULES_DIR, home_id);
        if asset.reference == target {
            return Ok(asset);
        }

        let from = self.resolve(&asset.reference)?;
        let to = self.resolve(&target)?;
        fs::rename(&from, &to).await?;

        info!(home_id = %home_id, from = %asset.reference, to = %target, "Rules document renamed");

        Ok(StoredAsset {
            reference: target,
            asset_id: None,
        })
    }

    async fn release(
        &self,
        field: UploadField,
        reference: &str,
        _asset_id: Option<&str>,
    ) -> Result<CleanupOutcome, MediaError> {
        // Remote URLs left over from a backend switch are not ours to delete
        if reference.is_empty()
            || reference.starts_with("http://")
            || reference.starts_with("https://")
        {
            return Ok(CleanupOutcome::Skipped);
        }

        let path = self.resolve(reference)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(field = field.name(), path = %path.display(), "Deleted local file");
                Ok(CleanupOutcome::Released)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(CleanupOutcome::Skipped),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn jpeg(name: &str) -> IncomingFile {
        IncomingFile {
            file_name: name.to_string(),
            content_type: "image/jpeg".to_string(),
            bytes: vec![0xFF, 0xD8, 0xFF, 0xE0],
        }
    }

    #[test]
    fn test_stored_file_name_is_sanitized() {
        let name = stored_file_name("C:\\fakepath\\my cabin (1).jpg");
        assert!(name.ends_with("-my_cabin__1_.jpg"), "got {}", name);
        assert!(!name.contains(':'));

        let name = stored_file_name("../../etc/passwd");
        assert!(name.ends_with("-passwd"));

        let name = stored_file_name("");
        assert!(name.ends_with("-file"));
    }

    #[test]
    fn test_stored_file_names_differ_within_same_instant() {
        let a = stored_file_name("cabin.jpg");
        let b = stored_file_name("cabin.jpg");
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_concurrent_stores_of_same_name_keep_both_files() {
        let dir = TempDir::new().unwrap();
        let store = LocalMediaStore::new(dir.path().to_path_buf());
        let second = IncomingFile {
            bytes: vec![0xFF, 0xD8, 0xFF, 0xE1],
            ..jpeg("IMG_0001.jpg")
        };

        let (a, b) = tokio::join!(
            store.store(UploadField::Photo, jpeg("IMG_0001.jpg")),
            store.store(UploadField::Photo, second)
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_ne!(a.reference, b.reference);
        assert_eq!(
            std::fs::read(dir.path().join(&a.reference)).unwrap(),
            vec![0xFF, 0xD8, 0xFF, 0xE0]
        );
        assert_eq!(
            std::fs::read(dir.path().join(&b.reference)).unwrap(),
            vec![0xFF, 0xD8, 0xFF, 0xE1]
        );
        assert_eq!(std::fs::read_dir(dir.path().join(UPLOADS_DIR)).unwrap().count(), 2);
    }

    #[tokio::test]
    async fn test_store_writes_under_uploads() {
        let dir = TempDir::new().unwrap();
        let store = LocalMediaStore::new(dir.path().to_path_buf());

        let asset = store.store(UploadField::Photo, jpeg("cabin.jpg")).await.unwrap();

        assert!(asset.reference.starts_with("uploads/"));
        assert!(asset.reference.ends_with("-cabin.jpg"));
        assert!(asset.asset_id.is_none());
        let written = std::fs::read(dir.path().join(&asset.reference)).unwrap();
        assert_eq!(written, vec![0xFF, 0xD8, 0xFF, 0xE0]);
    }

    #[tokio::test]
    async fn test_finalize_rules_renames_to_home_id() {
        let dir = TempDir::new().unwrap();
        let store = LocalMediaStore::new(dir.path().to_path_buf());
        let pdf = IncomingFile {
            file_name: "rules.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            bytes: b"%PDF-1.4".to_vec(),
        };

        let asset = store.store(UploadField::Details, pdf).await.unwrap();
        assert!(asset.reference.starts_with("rules/"));

        let home_id = Uuid::new_v4();
        let finalized = store.finalize_rules(home_id, asset.clone()).await.unwrap();

        assert_eq!(finalized.reference, format!("rules/{}.pdf", home_id));
        assert!(dir.path().join(&finalized.reference).exists());
        assert!(!dir.path().join(&asset.reference).exists());
    }

    #[tokio::test]
    async fn test_release_deletes_then_skips() {
        let dir = TempDir::new().unwrap();
        let store = LocalMediaStore::new(dir.path().to_path_buf());
        let asset = store.store(UploadField::Photo, jpeg("a.jpg")).await.unwrap();

        let first = store.release(UploadField::Photo, &asset.reference, None).await.unwrap();
        assert_eq!(first, CleanupOutcome::Released);
        assert!(!dir.path().join(&asset.reference).exists());

        let second = store.release(UploadField::Photo, &asset.reference, None).await.unwrap();
        assert_eq!(second, CleanupOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_release_refuses_paths_outside_root() {
        let dir = TempDir::new().unwrap();
        let store = LocalMediaStore::new(dir.path().join("root"));

        let result = store.release(UploadField::Photo, "../outside.jpg", None).await;
        assert!(matches!(result, Err(MediaError::UnsafePath(_))));

        let result = store.release(UploadField::Photo, "/etc/hosts", None).await;
        assert!(matches!(result, Err(MediaError::UnsafePath(_))));
    }

    #[tokio::test]
    async fn test_release_skips_remote_urls() {
        let dir = TempDir::new().unwrap();
        let store = LocalMediaStore::new(dir.path().to_path_buf());

        let outcome = store
            .release(UploadField::Photo, "https://res.example.com/a.jpg", None)
            .await
            .unwrap();
        assert_eq!(outcome, CleanupOutcome::Skipped);
    }
}
