//! Media store adapter
//!
//! Decides, per upload field, whether a file is accepted, where it is
//! written and how it is transformed. Two backends:
//! - [`LocalMediaStore`]: files under the root folder (`uploads/`, `rules/`)
//! - [`CloudMediaStore`]: files on a Cloudinary-compatible media service
//!
//! Every accepted file becomes a [`StoredAsset`]. For the cloud backend this
//! is a permanent remote asset; whoever drops the reference must call
//! [`MediaStore::release`] or the asset is orphaned.

mod cloud;
mod local;

pub use cloud::CloudMediaStore;
pub use local::LocalMediaStore;

use async_trait::async_trait;
use homestay_common::config::{StorageBackend, StorageConfig};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

const PHOTO_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png"];
const DETAILS_CONTENT_TYPES: &[&str] = &["application/pdf"];

/// Named upload slot of the add/edit home form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadField {
    /// Listing picture
    Photo,
    /// House rules PDF
    Details,
}

impl UploadField {
    /// Map a multipart field name to a slot; unknown names map to `None`
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "photo" => Some(UploadField::Photo),
            "details" => Some(UploadField::Details),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            UploadField::Photo => "photo",
            UploadField::Details => "details",
        }
    }

    /// Content-type allow-list for this slot
    ///
    /// Parameters such as `; charset=...` are ignored.
    pub fn accepts(&self, content_type: &str) -> bool {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        let allowed = match self {
            UploadField::Photo => PHOTO_CONTENT_TYPES,
            UploadField::Details => DETAILS_CONTENT_TYPES,
        };
        allowed.contains(&essence.as_str())
    }
}

/// Where a slot's files end up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Subdirectory of the root folder
    LocalDir(&'static str),
    /// Remote folder, resource type and optional transformation
    CloudFolder {
        folder: String,
        resource_type: &'static str,
        transformation: Option<String>,
    },
}

/// A file received from a form, not yet stored
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Reference to a stored file
///
/// `reference` is a root-relative path (local) or an absolute URL (cloud);
/// treat it as an opaque string. `asset_id` is the remote deletion handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAsset {
    pub reference: String,
    pub asset_id: Option<String>,
}

/// Result of a best-effort asset release
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    Released,
    /// Nothing to release (no handle, or already gone)
    Skipped,
    Failed(String),
}

impl CleanupOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, CleanupOutcome::Failed(_))
    }
}

/// Media store errors
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Media API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Refusing path outside storage root: {0}")]
    UnsafePath(String),
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    fn backend(&self) -> StorageBackend;

    fn destination(&self, field: UploadField) -> Destination;

    /// Persist an accepted file
    async fn store(&self, field: UploadField, file: IncomingFile) -> Result<StoredAsset, MediaError>;

    /// Bind a stored rules document to its home
    ///
    /// Local storage renames the file to `rules/<home_id>.pdf`; remote assets
    /// are returned unchanged.
    async fn finalize_rules(&self, home_id: Uuid, asset: StoredAsset) -> Result<StoredAsset, MediaError>;

    /// Delete a previously stored file
    async fn release(
        &self,
        field: UploadField,
        reference: &str,
        asset_id: Option<&str>,
    ) -> Result<CleanupOutcome, MediaError>;
}

/// Release an asset, logging instead of propagating failures
pub async fn release_best_effort(
    store: &dyn MediaStore,
    field: UploadField,
    reference: &str,
    asset_id: Option<&str>,
) -> CleanupOutcome {
    match store.release(field, reference, asset_id).await {
        Ok(outcome) => {
            debug!(field = field.name(), reference, ?outcome, "Asset release finished");
            outcome
        }
        Err(e) => {
            warn!(
                field = field.name(),
                reference,
                asset_id = asset_id.unwrap_or(""),
                error = %e,
                "Failed to release asset"
            );
            CleanupOutcome::Failed(e.to_string())
        }
    }
}

/// Build the configured media store
pub fn build_media_store(
    config: &StorageConfig,
    root_folder: &Path,
) -> homestay_common::Result<Arc<dyn MediaStore>> {
    match config.backend {
        StorageBackend::Local => Ok(Arc::new(LocalMediaStore::new(root_folder.to_path_buf()))),
        StorageBackend::Cloud => {
            let cloud = config.cloud.clone().ok_or_else(|| {
                homestay_common::Error::Config("Cloud storage selected but not configured".to_string())
            })?;
            let store = CloudMediaStore::new(cloud)
                .map_err(|e| homestay_common::Error::Config(e.to_string()))?;
            Ok(Arc::new(store))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names() {
        assert_eq!(UploadField::from_name("photo"), Some(UploadField::Photo));
        assert_eq!(UploadField::from_name("details"), Some(UploadField::Details));
        assert_eq!(UploadField::from_name("avatar"), None);
        assert_eq!(UploadField::from_name("Photo"), None);
    }

    #[test]
    fn test_photo_allow_list() {
        assert!(UploadField::Photo.accepts("image/jpeg"));
        assert!(UploadField::Photo.accepts("image/jpg"));
        assert!(UploadField::Photo.accepts("IMAGE/PNG"));
        assert!(!UploadField::Photo.accepts("image/gif"));
        assert!(!UploadField::Photo.accepts("text/plain"));
        assert!(!UploadField::Photo.accepts("application/pdf"));
    }

    #[test]
    fn test_details_allow_list() {
        assert!(UploadField::Details.accepts("application/pdf"));
        assert!(UploadField::Details.accepts("application/pdf; name=rules.pdf"));
        assert!(!UploadField::Details.accepts("image/png"));
        assert!(!UploadField::Details.accepts(""));
    }

    #[test]
    fn test_build_local_store() {
        let store = build_media_store(&StorageConfig::default(), Path::new("/tmp/homestay")).unwrap();
        assert_eq!(store.backend(), StorageBackend::Local);
        assert_eq!(store.destination(UploadField::Photo), Destination::LocalDir("uploads"));
        assert_eq!(store.destination(UploadField::Details), Destination::LocalDir("rules"));
    }

    #[test]
    fn test_build_cloud_store_requires_section() {
        let config = StorageConfig {
            backend: StorageBackend::Cloud,
            ..Default::default()
        };
        assert!(build_media_store(&config, Path::new("/tmp")).is_err());
    }
}
