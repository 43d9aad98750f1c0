//! Home record service
//!
//! Owns create/read/update/delete of [`Home`] and reconciles uploaded files
//! with what a record already references. Asset release is best-effort: the
//! database mutation decides whether an operation succeeded, and a failed
//! release is logged and reported as a [`CleanupOutcome`], never propagated.

use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{Home, HomeError, HomeForm};
use crate::db;
use crate::media::{release_best_effort, CleanupOutcome, MediaStore, StoredAsset, UploadField};
use crate::upload::UploadedFiles;

/// Cleanup performed by an update; `None` means nothing was superseded
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateReport {
    pub photo_release: Option<CleanupOutcome>,
    pub rules_release: Option<CleanupOutcome>,
}

/// Cleanup performed by a delete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteReport {
    pub photo_release: CleanupOutcome,
    pub rules_release: CleanupOutcome,
}

#[derive(Clone)]
pub struct HomeService {
    db: SqlitePool,
    media: Arc<dyn MediaStore>,
}

impl HomeService {
    pub fn new(db: SqlitePool, media: Arc<dyn MediaStore>) -> Self {
        Self { db, media }
    }

    /// Create a home from a validated form and its uploads
    ///
    /// A photo is mandatory. Without one nothing is written and any uploaded
    /// rules document is released again.
    pub async fn create(&self, form: HomeForm, files: UploadedFiles) -> Result<Uuid, HomeError> {
        let UploadedFiles { photo, details } = files;

        let photo = match photo {
            Some(photo) if !photo.reference.is_empty() => photo,
            _ => {
                self.discard_uploads(UploadedFiles { photo: None, details }).await;
                return Err(HomeError::Validation("No image provided".to_string()));
            }
        };

        let id = Uuid::new_v4();
        let rules = match details {
            Some(details) => Some(self.attach_rules(id, details).await),
            None => None,
        };

        let home = Home {
            id,
            house_name: form.house_name,
            price: form.price,
            location: form.location,
            rating: form.rating,
            description: form.description,
            photo: photo.reference.clone(),
            photo_asset_id: photo.asset_id.clone(),
            rules_url: rules.as_ref().map(|r| r.reference.clone()),
            rules_asset_id: rules.as_ref().and_then(|r| r.asset_id.clone()),
        };

        if let Err(e) = db::homes::insert_home(&self.db, &home).await {
            error!(home_id = %id, error = %e, "Failed to save home");
            self.discard_uploads(UploadedFiles { photo: Some(photo), details: rules })
                .await;
            return Err(e.into());
        }

        info!(home_id = %id, house_name = %home.house_name, "Home saved");
        Ok(id)
    }

    /// Fetch a home for the edit form
    pub async fn read_for_edit(&self, id: Uuid) -> Result<Home, HomeError> {
        db::homes::load_home(&self.db, id)
            .await?
            .ok_or(HomeError::NotFound(id))
    }

    /// All homes in insertion order
    pub async fn list(&self) -> Result<Vec<Home>, HomeError> {
        Ok(db::homes::load_all_homes(&self.db).await?)
    }

    /// Overwrite scalar fields and swap in any newly uploaded files
    ///
    /// A missing rules upload keeps the current rules document. Superseded
    /// assets are released after the record is saved.
    pub async fn update(
        &self,
        id: Uuid,
        form: HomeForm,
        files: UploadedFiles,
    ) -> Result<UpdateReport, HomeError> {
        let mut home = match db::homes::load_home(&self.db, id).await {
            Ok(Some(home)) => home,
            Ok(None) => {
                self.discard_uploads(files).await;
                return Err(HomeError::NotFound(id));
            }
            Err(e) => {
                self.discard_uploads(files).await;
                return Err(e.into());
            }
        };
        let previous = home.clone();

        home.apply_form(form);

        let UploadedFiles { photo, details } = files;
        if let Some(photo) = &photo {
            home.photo = photo.reference.clone();
            home.photo_asset_id = photo.asset_id.clone();
        }
        let rules = match details {
            Some(details) => Some(self.attach_rules(id, details).await),
            None => None,
        };
        if let Some(rules) = &rules {
            home.rules_url = Some(rules.reference.clone());
            home.rules_asset_id = rules.asset_id.clone();
        }

        let saved = match db::homes::update_home(&self.db, &home).await {
            Ok(saved) => saved,
            Err(e) => {
                error!(home_id = %id, error = %e, "Failed to update home");
                self.discard_new_uploads(&previous, photo, rules).await;
                return Err(e.into());
            }
        };
        if !saved {
            // Deleted between load and save
            self.discard_new_uploads(&previous, photo, rules).await;
            return Err(HomeError::NotFound(id));
        }

        info!(home_id = %id, "Home updated");

        let mut report = UpdateReport::default();
        if photo.is_some() {
            report.photo_release = Some(
                self.release(
                    UploadField::Photo,
                    &previous.photo,
                    previous.photo_asset_id.as_deref(),
                )
                .await,
            );
        }
        if let (Some(new_rules), Some(old_reference)) = (&rules, &previous.rules_url) {
            // Local storage reuses rules/<id>.pdf, already overwritten in place
            report.rules_release = if *old_reference == new_rules.reference {
                Some(CleanupOutcome::Skipped)
            } else {
                Some(
                    self.release(
                        UploadField::Details,
                        old_reference,
                        previous.rules_asset_id.as_deref(),
                    )
                    .await,
                )
            };
        }

        Ok(report)
    }

    /// Release a home's assets and remove the record
    ///
    /// The two releases are independent; neither can block the deletion.
    pub async fn delete(&self, id: Uuid) -> Result<DeleteReport, HomeError> {
        let home = db::homes::load_home(&self.db, id)
            .await?
            .ok_or(HomeError::NotFound(id))?;

        let photo_release = self
            .release(UploadField::Photo, &home.photo, home.photo_asset_id.as_deref())
            .await;
        let rules_release = match &home.rules_url {
            Some(rules_url) => {
                self.release(UploadField::Details, rules_url, home.rules_asset_id.as_deref())
                    .await
            }
            None => CleanupOutcome::Skipped,
        };

        if !db::homes::delete_home(&self.db, id).await? {
            return Err(HomeError::NotFound(id));
        }

        info!(home_id = %id, "Home deleted");

        Ok(DeleteReport {
            photo_release,
            rules_release,
        })
    }

    /// Release every asset of a submission that will not be persisted
    pub async fn discard_uploads(&self, files: UploadedFiles) {
        for (field, asset) in files.into_assets() {
            self.release(field, &asset.reference, asset.asset_id.as_deref())
                .await;
        }
    }

    /// Like `discard_uploads`, but never touches what `previous` still uses
    async fn discard_new_uploads(
        &self,
        previous: &Home,
        photo: Option<StoredAsset>,
        rules: Option<StoredAsset>,
    ) {
        let rules = rules.filter(|r| previous.rules_url.as_deref() != Some(r.reference.as_str()));
        self.discard_uploads(UploadedFiles { photo, details: rules })
            .await;
    }

    /// Bind the rules document to the home; on failure keep it where it is
    async fn attach_rules(&self, id: Uuid, asset: StoredAsset) -> StoredAsset {
        match self.media.finalize_rules(id, asset.clone()).await {
            Ok(finalized) => finalized,
            Err(e) => {
                warn!(
                    home_id = %id,
                    reference = %asset.reference,
                    error = %e,
                    "Failed to finalize rules document, keeping upload reference"
                );
                asset
            }
        }
    }

    async fn release(&self, field: UploadField, reference: &str, asset_id: Option<&str>) -> CleanupOutcome {
        release_best_effort(self.media.as_ref(), field, reference, asset_id).await
    }
}
