//! Multipart upload pipeline
//!
//! Turns one add/edit form submission into text fields plus at most one
//! stored asset per [`UploadField`]. Files with a content type outside the
//! slot's allow-list are dropped without error.

use axum::extract::multipart::{Multipart, MultipartError};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

use crate::media::{release_best_effort, IncomingFile, MediaError, MediaStore, StoredAsset, UploadField};

/// Stored assets of one submission, by slot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadedFiles {
    pub photo: Option<StoredAsset>,
    pub details: Option<StoredAsset>,
}

impl UploadedFiles {
    fn slot_mut(&mut self, field: UploadField) -> &mut Option<StoredAsset> {
        match field {
            UploadField::Photo => &mut self.photo,
            UploadField::Details => &mut self.details,
        }
    }

    /// Consume into `(slot, asset)` pairs for the occupied slots
    pub fn into_assets(self) -> Vec<(UploadField, StoredAsset)> {
        let mut assets = Vec::new();
        if let Some(photo) = self.photo {
            assets.push((UploadField::Photo, photo));
        }
        if let Some(details) = self.details {
            assets.push((UploadField::Details, details));
        }
        assets
    }
}

/// A parsed form submission
#[derive(Debug, Default)]
pub struct Submission {
    pub fields: HashMap<String, String>,
    pub files: UploadedFiles,
}

#[derive(Debug, Error)]
pub enum UploadError {
    /// Client sent something we cannot accept
    #[error("Malformed upload: {0}")]
    Malformed(String),

    /// Body could not be read
    #[error("Upload transport failure: {0}")]
    Transport(String),

    #[error("Upload storage failure: {0}")]
    Storage(#[from] MediaError),
}

impl From<MultipartError> for UploadError {
    fn from(err: MultipartError) -> Self {
        if err.status().is_client_error() {
            UploadError::Malformed(err.body_text())
        } else {
            UploadError::Transport(err.body_text())
        }
    }
}

/// Read the whole submission, storing accepted files as they arrive
///
/// On error every asset already stored for this submission is released
/// before returning.
pub async fn parse_submission(
    multipart: Multipart,
    store: &dyn MediaStore,
) -> Result<Submission, UploadError> {
    let mut submission = Submission::default();

    match read_parts(multipart, store, &mut submission).await {
        Ok(()) => Ok(submission),
        Err(e) => {
            warn!(error = %e, "Upload rejected, releasing stored files");
            for (field, asset) in submission.files.into_assets() {
                release_best_effort(store, field, &asset.reference, asset.asset_id.as_deref()).await;
            }
            Err(e)
        }
    }
}

async fn read_parts(
    mut multipart: Multipart,
    store: &dyn MediaStore,
    submission: &mut Submission,
) -> Result<(), UploadError> {
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        let Some(file_name) = field.file_name().map(str::to_string) else {
            let value = field.text().await?;
            submission.fields.insert(name, value);
            continue;
        };

        let slot = UploadField::from_name(&name)
            .ok_or_else(|| UploadError::Malformed(format!("Unexpected file field: {}", name)))?;
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;

        // No file chosen in the browser
        if file_name.is_empty() && bytes.is_empty() {
            continue;
        }

        if submission.files.slot_mut(slot).is_some() {
            return Err(UploadError::Malformed(format!(
                "More than one file for field: {}",
                slot.name()
            )));
        }

        if !slot.accepts(&content_type) {
            debug!(
                field = slot.name(),
                file_name = %file_name,
                content_type = %content_type,
                "Ignoring file with unsupported content type"
            );
            continue;
        }

        let asset = store
            .store(
                slot,
                IncomingFile {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                },
            )
            .await?;
        debug!(field = slot.name(), reference = %asset.reference, "Stored upload");
        *submission.files.slot_mut(slot) = Some(asset);
    }

    Ok(())
}
