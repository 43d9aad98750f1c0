//! Cloudinary-compatible media store
//!
//! Uploads are signed multipart POSTs to
//! `{base_url}/v1_1/{cloud_name}/{resource_type}/upload`; deletions go to
//! `.../destroy` with the asset's `public_id`. Signatures are a hex digest
//! of the sorted request parameters followed by the API secret. The digest
//! (SHA-1 or SHA-256) is an account setting on the media service, so it is
//! taken from `CloudConfig::signature_algorithm` and never sent per request.

use async_trait::async_trait;
use chrono::Utc;
use homestay_common::config::{CloudConfig, SignatureAlgorithm, StorageBackend};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use super::{CleanupOutcome, Destination, IncomingFile, MediaError, MediaStore, StoredAsset, UploadField};

const USER_AGENT: &str = concat!("homestay/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

pub struct CloudMediaStore {
    http_client: reqwest::Client,
    config: CloudConfig,
}

impl CloudMediaStore {
    pub fn new(config: CloudConfig) -> Result<Self, MediaError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| MediaError::Network(e.to_string()))?;

        Ok(Self { http_client, config })
    }

    fn resource_type(field: UploadField) -> &'static str {
        match field {
            UploadField::Photo => "image",
            // PDFs are stored untouched
            UploadField::Details => "raw",
        }
    }

    fn endpoint(&self, field: UploadField, action: &str) -> String {
        format!(
            "{}/v1_1/{}/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.cloud_name,
            Self::resource_type(field),
            action
        )
    }

    /// Signature over the signable parameters
    fn sign(params: &[(&str, String)], api_secret: &str, algorithm: SignatureAlgorithm) -> String {
        let mut sorted: Vec<&(&str, String)> = params.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(b.0));

        let to_sign = sorted
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        match algorithm {
            SignatureAlgorithm::Sha1 => hex_digest::<Sha1>(&to_sign, api_secret),
            SignatureAlgorithm::Sha256 => hex_digest::<Sha256>(&to_sign, api_secret),
        }
    }

    fn signature(&self, params: &[(&str, String)]) -> String {
        Self::sign(params, &self.config.api_secret, self.config.signature_algorithm)
    }

    async fn read_error(response: reqwest::Response) -> MediaError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        MediaError::Api(status, body)
    }
}

fn hex_digest<D: Digest>(to_sign: &str, api_secret: &str) -> String {
    let mut hasher = D::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

#[async_trait]
impl MediaStore for CloudMediaStore {
    fn backend(&self) -> StorageBackend {
        StorageBackend::Cloud
    }

    fn destination(&self, field: UploadField) -> Destination {
        match field {
            UploadField::Photo => Destination::CloudFolder {
                folder: self.config.photo_folder.clone(),
                resource_type: Self::resource_type(field),
                transformation: Some(format!(
                    "c_limit,h_{},w_{}",
                    self.config.photo_max_height, self.config.photo_max_width
                )),
            },
            UploadField::Details => Destination::CloudFolder {
                folder: self.config.rules_folder.clone(),
                resource_type: Self::resource_type(field),
                transformation: None,
            },
        }
    }

    async fn store(&self, field: UploadField, file: IncomingFile) -> Result<StoredAsset, MediaError> {
        let Destination::CloudFolder {
            folder,
            transformation,
            ..
        } = self.destination(field)
        else {
            return Err(MediaError::Parse("cloud store produced a local destination".to_string()));
        };

        let timestamp = Utc::now().timestamp().to_string();
        let mut params = vec![("folder", folder), ("timestamp", timestamp)];
        if let Some(transformation) = transformation {
            params.push(("transformation", transformation));
        }
        let signature = self.signature(&params);

        let size = file.bytes.len();
        let part = Part::bytes(file.bytes)
            .file_name(file.file_name)
            .mime_str(&file.content_type)
            .map_err(|e| MediaError::Parse(e.to_string()))?;

        let mut form = Form::new()
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature);
        for (key, value) in params {
            form = form.text(key, value);
        }
        let form = form.part("file", part);

        debug!(field = field.name(), size, "Uploading to media service");

        let response = self
            .http_client
            .post(self.endpoint(field, "upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| MediaError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::read_error(response).await);
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| MediaError::Parse(e.to_string()))?;

        info!(
            field = field.name(),
            public_id = %uploaded.public_id,
            "Uploaded asset to media service"
        );

        Ok(StoredAsset {
            reference: uploaded.secure_url,
            asset_id: Some(uploaded.public_id),
        })
    }

    async fn finalize_rules(&self, _home_id: Uuid, asset: StoredAsset) -> Result<StoredAsset, MediaError> {
        Ok(asset)
    }

    async fn release(
        &self,
        field: UploadField,
        _reference: &str,
        asset_id: Option<&str>,
    ) -> Result<CleanupOutcome, MediaError> {
        let Some(public_id) = asset_id.filter(|id| !id.is_empty()) else {
            return Ok(CleanupOutcome::Skipped);
        };

        let params = vec![
            ("public_id", public_id.to_string()),
            ("timestamp", Utc::now().timestamp().to_string()),
        ];
        let signature = self.signature(&params);

        let mut form: Vec<(&str, String)> = params;
        form.push(("api_key", self.config.api_key.clone()));
        form.push(("signature", signature));

        let response = self
            .http_client
            .post(self.endpoint(field, "destroy"))
            .form(&form)
            .send()
            .await
            .map_err(|e| MediaError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::read_error(response).await);
        }

        let destroyed: DestroyResponse = response
            .json()
            .await
            .map_err(|e| MediaError::Parse(e.to_string()))?;

        match destroyed.result.as_str() {
            "ok" => {
                info!(field = field.name(), public_id, "Deleted asset from media service");
                Ok(CleanupOutcome::Released)
            }
            "not found" => Ok(CleanupOutcome::Skipped),
            other => Err(MediaError::Api(200, format!("unexpected destroy result: {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn config(base_url: String) -> CloudConfig {
        CloudConfig {
            cloud_name: "demo".to_string(),
            api_key: "key123".to_string(),
            api_secret: "secret456".to_string(),
            base_url,
            ..Default::default()
        }
    }

    #[test]
    fn test_sign_sorts_parameters() {
        let a = CloudMediaStore::sign(
            &[("timestamp", "1".to_string()), ("folder", "f".to_string())],
            "s",
            SignatureAlgorithm::Sha256,
        );
        let b = CloudMediaStore::sign(
            &[("folder", "f".to_string()), ("timestamp", "1".to_string())],
            "s",
            SignatureAlgorithm::Sha256,
        );
        assert_eq!(a, b);

        let mut hasher = Sha256::new();
        hasher.update(b"folder=f&timestamp=1s");
        assert_eq!(a, format!("{:x}", hasher.finalize()));
    }

    #[test]
    fn test_sign_follows_account_algorithm() {
        let params = [("public_id", "sample".to_string()), ("timestamp", "1315060510".to_string())];

        let sha1 = CloudMediaStore::sign(&params, "abcd", SignatureAlgorithm::Sha1);
        let mut hasher = Sha1::new();
        hasher.update(b"public_id=sample&timestamp=1315060510abcd");
        assert_eq!(sha1, format!("{:x}", hasher.finalize()));
        assert_eq!(sha1.len(), 40);

        let sha256 = CloudMediaStore::sign(&params, "abcd", SignatureAlgorithm::Sha256);
        assert_eq!(sha256.len(), 64);
    }

    #[test]
    fn test_destinations() {
        let store = CloudMediaStore::new(config("http://localhost".to_string())).unwrap();

        assert_eq!(
            store.destination(UploadField::Photo),
            Destination::CloudFolder {
                folder: "airbnb/properties".to_string(),
                resource_type: "image",
                transformation: Some("c_limit,h_1000,w_1000".to_string()),
            }
        );
        assert_eq!(
            store.destination(UploadField::Details),
            Destination::CloudFolder {
                folder: "airbnb/rules".to_string(),
                resource_type: "raw",
                transformation: None,
            }
        );
    }

    #[tokio::test]
    async fn test_upload_returns_url_and_public_id() {
        let server = MockServer::start_async().await;
        let upload = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1_1/demo/image/upload");
                then.status(200).json_body(json!({
                    "secure_url": "https://res.example.com/demo/image/upload/airbnb/properties/abc.jpg",
                    "public_id": "airbnb/properties/abc",
                    "resource_type": "image"
                }));
            })
            .await;

        let store = CloudMediaStore::new(config(server.base_url())).unwrap();
        let asset = store
            .store(
                UploadField::Photo,
                IncomingFile {
                    file_name: "cabin.jpg".to_string(),
                    content_type: "image/jpeg".to_string(),
                    bytes: vec![1, 2, 3],
                },
            )
            .await
            .unwrap();

        upload.assert_async().await;
        assert_eq!(
            asset.reference,
            "https://res.example.com/demo/image/upload/airbnb/properties/abc.jpg"
        );
        assert_eq!(asset.asset_id.as_deref(), Some("airbnb/properties/abc"));
    }

    #[tokio::test]
    async fn test_upload_signs_with_configured_algorithm_only() {
        let server = MockServer::start_async().await;
        let upload = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1_1/demo/raw/upload")
                    .body_contains("name=\"signature\"")
                    .matches(|req| {
                        let body = req.body.as_deref().unwrap_or_default();
                        !String::from_utf8_lossy(body).contains("signature_algorithm")
                    });
                then.status(200).json_body(json!({
                    "secure_url": "https://res.example.com/demo/raw/upload/airbnb/rules/r.pdf",
                    "public_id": "airbnb/rules/r.pdf"
                }));
            })
            .await;

        let mut cloud = config(server.base_url());
        cloud.signature_algorithm = SignatureAlgorithm::Sha1;
        let store = CloudMediaStore::new(cloud).unwrap();
        store
            .store(
                UploadField::Details,
                IncomingFile {
                    file_name: "rules.pdf".to_string(),
                    content_type: "application/pdf".to_string(),
                    bytes: b"%PDF".to_vec(),
                },
            )
            .await
            .unwrap();

        upload.assert_async().await;
    }

    #[tokio::test]
    async fn test_upload_error_status_is_api_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1_1/demo/raw/upload");
                then.status(401).body("Invalid Signature");
            })
            .await;

        let store = CloudMediaStore::new(config(server.base_url())).unwrap();
        let result = store
            .store(
                UploadField::Details,
                IncomingFile {
                    file_name: "rules.pdf".to_string(),
                    content_type: "application/pdf".to_string(),
                    bytes: b"%PDF".to_vec(),
                },
            )
            .await;

        assert!(matches!(result, Err(MediaError::Api(401, _))));
    }

    #[tokio::test]
    async fn test_release_destroys_by_public_id() {
        let server = MockServer::start_async().await;
        let destroy = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1_1/demo/raw/destroy")
                    .body_contains("public_id=airbnb%2Frules%2Fxyz");
                then.status(200).json_body(json!({ "result": "ok" }));
            })
            .await;

        let store = CloudMediaStore::new(config(server.base_url())).unwrap();
        let outcome = store
            .release(UploadField::Details, "https://res.example.com/x.pdf", Some("airbnb/rules/xyz"))
            .await
            .unwrap();

        destroy.assert_async().await;
        assert_eq!(outcome, CleanupOutcome::Released);
    }

    #[tokio::test]
    async fn test_release_without_handle_is_skipped() {
        let store = CloudMediaStore::new(config("http://127.0.0.1:9".to_string())).unwrap();
        let outcome = store
            .release(UploadField::Photo, "uploads/old.jpg", None)
            .await
            .unwrap();
        assert_eq!(outcome, CleanupOutcome::Skipped);
    }
}
