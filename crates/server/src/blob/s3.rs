#![forbid(unsafe_code)]

use super::{BlobError, FileRef, StoredFile};
use aws_config::meta::region::RegionProviderChain;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::{ByteStream, DateTimeFormat};
use tracing::info;

const FOLDER_MARKER: &str = ".keep";

/// S3-compatible object storage; the file reference is the object key.
#[derive(Clone, Debug)]
pub struct S3BlobStore {
    client: Client,
    bucket: String,
}

impl S3BlobStore {
    pub async fn connect(endpoint: Option<&str>, bucket: &str, region: &str) -> Self {
        let region_provider =
            RegionProviderChain::default_provider().or_else(Region::new(region.to_string()));
        let aws_config = aws_config::from_env().region(region_provider).load().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&aws_config).force_path_style(true);
        if let Some(endpoint) = endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        Self {
            client: Client::from_conf(builder.build()),
            bucket: bucket.to_string(),
        }
    }

    pub async fn ensure_bucket(&self) -> Result<(), BlobError> {
        if self
            .client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .is_ok()
        {
            return Ok(());
        }
        self.client
            .create_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(s3_error)?;
        info!(bucket = %self.bucket, "created bucket");
        Ok(())
    }

    pub(super) async fn create_folder(&self, folder: &str) -> Result<(), BlobError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(format!("{folder}/{FOLDER_MARKER}"))
            .body(ByteStream::from(Vec::new()))
            .send()
            .await
            .map_err(s3_error)?;
        Ok(())
    }

    pub(super) async fn put(
        &self,
        key: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), BlobError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(s3_error)?;
        Ok(())
    }

    pub(super) async fn get(&self, key: &str) -> Result<Vec<u8>, BlobError> {
        Ok(self.fetch(key).await?.0)
    }

    /// Copy by re-upload then delete; keys may contain characters that would
    /// need escaping in a server-side copy source.
    pub(super) async fn rename(&self, from: &str, to: &str) -> Result<u64, BlobError> {
        let (bytes, content_type) = self.fetch(from).await?;
        let size = bytes.len() as u64;
        let content_type = content_type.unwrap_or_else(|| "application/octet-stream".to_string());
        self.put(to, &content_type, bytes).await?;
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(from)
            .send()
            .await
            .map_err(s3_error)?;
        Ok(size)
    }

    pub(super) async fn list(&self, folder: &str) -> Result<Vec<StoredFile>, BlobError> {
        let prefix = format!("{folder}/");
        let mut files = Vec::new();
        let mut continuation: Option<String> = None;
        loop {
            let page = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(&prefix)
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(s3_error)?;

            for object in page.contents() {
                let Some(key) = object.key() else {
                    continue;
                };
                let Ok(file_ref) = FileRef::parse(key) else {
                    continue;
                };
                files.push(StoredFile {
                    file_id: key.to_string(),
                    name: file_ref.name.to_string(),
                    size: object.size().and_then(|n| u64::try_from(n).ok()).unwrap_or(0),
                    modified_at: object
                        .last_modified()
                        .and_then(|ts| ts.fmt(DateTimeFormat::DateTime).ok()),
                });
            }

            match page.next_continuation_token() {
                Some(token) if page.is_truncated().unwrap_or(false) => {
                    continuation = Some(token.to_string());
                }
                _ => break,
            }
        }
        Ok(files)
    }

    async fn fetch(&self, key: &str) -> Result<(Vec<u8>, Option<String>), BlobError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| {
                if err
                    .as_service_error()
                    .is_some_and(|service| service.is_no_such_key())
                {
                    BlobError::NotFound
                } else {
                    s3_error(err)
                }
            })?;
        let content_type = output.content_type().map(str::to_string);
        let bytes = output
            .body
            .collect()
            .await
            .map_err(|err| BlobError::S3(err.to_string()))?
            .into_bytes()
            .to_vec();
        Ok((bytes, content_type))
    }
}

fn s3_error<E: std::error::Error + 'static>(err: E) -> BlobError {
    BlobError::S3(DisplayErrorContext(&err).to_string())
}
