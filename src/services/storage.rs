use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use sha2::{Digest, Sha256};

use crate::core::config::{S3Settings, Settings};
use crate::services::photos::PhotoStore;

/// S3-compatible bucket holding student photos.
#[derive(Debug, Clone)]
pub(crate) struct StorageService {
    client: Client,
    bucket: String,
}

impl StorageService {
    /// `None` when no credentials are configured; photo uploads are then refused.
    pub(crate) async fn from_settings(settings: &Settings) -> anyhow::Result<Option<Self>> {
        let s3 = settings.s3();
        if !s3.is_configured() {
            return Ok(None);
        }

        let client = build_client(s3).await;
        tracing::info!(endpoint = %s3.endpoint, bucket = %s3.bucket, "Photo storage enabled");
        Ok(Some(Self { client, bucket: s3.bucket.clone() }))
    }

    pub(crate) async fn presign_get(&self, key: &str, expires_in: Duration) -> anyhow::Result<String> {
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(PresigningConfig::expires_in(expires_in)?)
            .await?;

        Ok(request.uri().to_string())
    }
}

async fn build_client(s3: &S3Settings) -> Client {
    let credentials = Credentials::new(
        s3.access_key.clone(),
        s3.secret_key.clone(),
        None,
        None,
        "student-lab-static",
    );

    let shared = aws_config::defaults(BehaviorVersion::latest())
        .endpoint_url(s3.endpoint.clone())
        .region(aws_config::Region::new(s3.region.clone()))
        .credentials_provider(credentials)
        .load()
        .await;

    // MinIO and most self-hosted gateways only serve path-style URLs.
    let config = aws_sdk_s3::config::Builder::from(&shared).force_path_style(true).build();
    Client::from_conf(config)
}

#[async_trait]
impl PhotoStore for StorageService {
    async fn put(&self, key: &str, content_type: &str, bytes: Vec<u8>) -> anyhow::Result<()> {
        let checksum = hex::encode(Sha256::digest(&bytes));

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .metadata("sha256", &checksum)
            .body(ByteStream::from(bytes))
            .send()
            .await?;

        tracing::debug!(key, checksum = %checksum, "Stored student photo");
        Ok(())
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        self.client.delete_object().bucket(&self.bucket).key(key).send().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::StorageService;
    use crate::core::config::Settings;
    use crate::test_support;
    use std::time::Duration;

    #[tokio::test]
    async fn storage_is_disabled_without_credentials() {
        let settings = test_support::test_settings().await;

        let storage = StorageService::from_settings(&settings).await.expect("storage");
        assert!(storage.is_none());
    }

    #[tokio::test]
    async fn presigned_photo_url_uses_path_style() {
        let settings = {
            let _guard = test_support::env_lock().await;
            test_support::set_test_env();
            test_support::set_test_storage_env();
            Settings::load().expect("settings")
        };
        let storage = StorageService::from_settings(&settings)
            .await
            .expect("storage")
            .expect("storage enabled");

        let url = storage
            .presign_get("students/photos/abc.png", Duration::from_secs(300))
            .await
            .expect("presign get");

        assert!(url.starts_with("http://localhost:9000/student-lab-test-bucket/"), "{url}");
        assert!(url.contains("students/photos/abc.png"));
    }
}
