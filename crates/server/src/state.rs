#![forbid(unsafe_code)]

use crate::blob::{BlobError, BlobStore, LocalBlobStore, S3BlobStore};
use crate::config::{BlobBackend, Config};
use crate::error::ApiError;
use it_extract::{CommandExtractor, DocumentExtractor, TextExtractor, bin_detect};
use it_storage::{AccountStore, RecordStore, StoreError};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("store: {0}")]
    Store(#[from] StoreError),
    #[error("blob storage: {0}")]
    Blob(#[from] BlobError),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything a request handler needs, built once at startup and passed to
/// the router as state.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub accounts: Arc<Mutex<AccountStore>>,
    pub records: Arc<RecordStore>,
    pub blobs: BlobStore,
    pub extractor: Arc<dyn TextExtractor>,
}

impl AppContext {
    pub async fn open(config: Config) -> Result<Self, StartupError> {
        std::fs::create_dir_all(config.upload_dir())?;
        let accounts = AccountStore::open(&config.data_dir)?;
        let records = RecordStore::open(&config.records_file)?;

        let blobs = match &config.blob {
            BlobBackend::Local { root } => BlobStore::Local(LocalBlobStore::open(root)?),
            BlobBackend::S3 {
                endpoint,
                bucket,
                region,
            } => {
                let store = S3BlobStore::connect(endpoint.as_deref(), bucket, region).await;
                store.ensure_bucket().await?;
                BlobStore::S3(store)
            }
        };

        let extractor = Arc::new(build_extractor(&config));
        Ok(Self::from_parts(config, accounts, records, blobs, extractor))
    }

    pub fn from_parts(
        config: Config,
        accounts: AccountStore,
        records: RecordStore,
        blobs: BlobStore,
        extractor: Arc<dyn TextExtractor>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            accounts: Arc::new(Mutex::new(accounts)),
            records: Arc::new(records),
            blobs,
            extractor,
        }
    }

    /// Runs `f` against the account store on the blocking pool.
    pub async fn with_accounts<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&mut AccountStore) -> Result<T, StoreError> + Send + 'static,
    {
        let accounts = Arc::clone(&self.accounts);
        let result = tokio::task::spawn_blocking(move || f(&mut lock(&accounts))).await?;
        Ok(result?)
    }

    /// Runs `f` against the record store on the blocking pool.
    pub async fn with_records<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&RecordStore) -> Result<T, StoreError> + Send + 'static,
    {
        let records = Arc::clone(&self.records);
        let result = tokio::task::spawn_blocking(move || f(&records)).await?;
        Ok(result?)
    }
}

fn lock(accounts: &Mutex<AccountStore>) -> MutexGuard<'_, AccountStore> {
    accounts
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn build_extractor(config: &Config) -> DocumentExtractor {
    let ocr = config.ocr_command.as_deref().and_then(|command_line| {
        let extractor = CommandExtractor::from_command_line(command_line, config.ocr_timeout)?;
        if bin_detect::resolve_program(extractor.program()).is_none() {
            warn!(
                program = extractor.program(),
                "ocr command not found; image uploads will be unclassified"
            );
            return None;
        }
        Some(extractor)
    });
    info!(ocr = ocr.is_some(), "text extraction ready");
    DocumentExtractor::new(ocr)
}
