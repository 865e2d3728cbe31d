//! Object storage abstraction.
//!
//! Fee receipt files live in a private bucket of the backend's object store.
//! [`ObjectStorage`] keeps the services independent of that backend so tests
//! can run against [`MemoryObjectStorage`].

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use campus_core::RemoteError;
use reqwest::Method;

use crate::http::BackendClient;

type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StorageError>> + Send + 'a>>;

pub trait ObjectStorage: Send + Sync {
    /// Stores `content` under `key` in `bucket`. Fails if the key is taken.
    fn upload<'a>(
        &'a self,
        bucket: &'a str,
        key: &'a str,
        content: Vec<u8>,
    ) -> StorageFuture<'a, ()>;

    fn download<'a>(&'a self, bucket: &'a str, key: &'a str) -> StorageFuture<'a, Vec<u8>>;

    /// Removes the object. Missing objects are not an error.
    fn delete<'a>(&'a self, bucket: &'a str, key: &'a str) -> StorageFuture<'a, ()>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("File not found")]
    NotFound,

    #[error("A file already exists at {0}")]
    AlreadyExists(String),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Rejects keys that could escape the bucket.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty() || key.contains("..") || key.starts_with(['/', '\\']) {
        return Err(StorageError::InvalidKey(
            "Key must not be empty, contain '..', or start with a separator".to_string(),
        ));
    }
    if key.chars().any(|c| c.is_control() || c == '\\' || c == '?' || c == '#') {
        return Err(StorageError::InvalidKey(
            "Key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

pub fn content_type_for(key: &str) -> &'static str {
    let extension = key
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

/// [`ObjectStorage`] over the backend's storage endpoint.
#[derive(Clone)]
pub struct RemoteObjectStorage {
    client: BackendClient,
}

impl RemoteObjectStorage {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

fn storage_error(err: RemoteError, key: &str) -> StorageError {
    match err {
        RemoteError::Rejected { status: 404, .. } => StorageError::NotFound,
        RemoteError::Rejected { status: 409, .. } => StorageError::AlreadyExists(key.to_string()),
        other => StorageError::Remote(other),
    }
}

impl ObjectStorage for RemoteObjectStorage {
    fn upload<'a>(
        &'a self,
        bucket: &'a str,
        key: &'a str,
        content: Vec<u8>,
    ) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            validate_key(key)?;
            let url = self.client.config().storage_url(bucket, key);
            let request = self
                .client
                .request(Method::POST, &url)
                .header("Content-Type", content_type_for(key))
                .header("x-upsert", "false")
                .body(content);
            self.client
                .send(request)
                .await
                .map_err(|e| storage_error(e, key))?;
            Ok(())
        })
    }

    fn download<'a>(&'a self, bucket: &'a str, key: &'a str) -> StorageFuture<'a, Vec<u8>> {
        Box::pin(async move {
            validate_key(key)?;
            let url = self.client.config().storage_url(bucket, key);
            let response = self
                .client
                .send(self.client.request(Method::GET, &url))
                .await
                .map_err(|e| storage_error(e, key))?;
            let bytes = response
                .bytes()
                .await
                .map_err(|e| StorageError::Remote(RemoteError::Unavailable(e.to_string())))?;
            Ok(bytes.to_vec())
        })
    }

    fn delete<'a>(&'a self, bucket: &'a str, key: &'a str) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            validate_key(key)?;
            let url = self.client.config().storage_url(bucket, key);
            match self.client.send(self.client.request(Method::DELETE, &url)).await {
                Ok(_) => Ok(()),
                Err(e) => match storage_error(e, key) {
                    StorageError::NotFound => Ok(()),
                    other => Err(other),
                },
            }
        })
    }
}

/// In-memory [`ObjectStorage`] for tests and offline runs.
#[derive(Default)]
pub struct MemoryObjectStorage {
    objects: Mutex<HashMap<(String, String), Vec<u8>>>,
}

impl MemoryObjectStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<(String, String), Vec<u8>>> {
        self.objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ObjectStorage for MemoryObjectStorage {
    fn upload<'a>(
        &'a self,
        bucket: &'a str,
        key: &'a str,
        content: Vec<u8>,
    ) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            validate_key(key)?;
            let mut objects = self.lock();
            let slot = (bucket.to_string(), key.to_string());
            if objects.contains_key(&slot) {
                return Err(StorageError::AlreadyExists(key.to_string()));
            }
            objects.insert(slot, content);
            Ok(())
        })
    }

    fn download<'a>(&'a self, bucket: &'a str, key: &'a str) -> StorageFuture<'a, Vec<u8>> {
        Box::pin(async move {
            validate_key(key)?;
            self.lock()
                .get(&(bucket.to_string(), key.to_string()))
                .cloned()
                .ok_or(StorageError::NotFound)
        })
    }

    fn delete<'a>(&'a self, bucket: &'a str, key: &'a str) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            validate_key(key)?;
            self.lock().remove(&(bucket.to_string(), key.to_string()));
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key_accepts_receipt_paths() {
        assert!(validate_key("0000-11/1700000000000_receipt.pdf").is_ok());
        assert!(validate_key("abc/1_fee receipt (1).png").is_ok());
    }

    #[test]
    fn test_validate_key_rejects_escapes() {
        assert!(validate_key("").is_err());
        assert!(validate_key("../../etc/passwd").is_err());
        assert!(validate_key("/etc/passwd").is_err());
        assert!(validate_key("\\windows\\system32").is_err());
        assert!(validate_key("a/b?download").is_err());
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("x/receipt.PDF"), "application/pdf");
        assert_eq!(content_type_for("x/scan.jpeg"), "image/jpeg");
        assert_eq!(content_type_for("x/noext"), "application/octet-stream");
    }

    #[test]
    fn test_remote_status_mapping() {
        let missing = RemoteError::Rejected {
            status: 404,
            message: "Object not found".into(),
        };
        assert_eq!(storage_error(missing, "k"), StorageError::NotFound);

        let taken = RemoteError::Rejected {
            status: 409,
            message: "Duplicate".into(),
        };
        assert_eq!(
            storage_error(taken, "k"),
            StorageError::AlreadyExists("k".into())
        );
    }

    #[tokio::test]
    async fn test_memory_storage() {
        let storage = MemoryObjectStorage::new();
        storage
            .upload("fee-receipts", "a/1_r.pdf", b"pdf".to_vec())
            .await
            .unwrap();
        assert!(matches!(
            storage.upload("fee-receipts", "a/1_r.pdf", vec![]).await,
            Err(StorageError::AlreadyExists(_))
        ));
        assert_eq!(
            storage.download("fee-receipts", "a/1_r.pdf").await.unwrap(),
            b"pdf".to_vec()
        );
        storage.delete("fee-receipts", "a/1_r.pdf").await.unwrap();
        storage.delete("fee-receipts", "a/1_r.pdf").await.unwrap();
        assert_eq!(
            storage.download("fee-receipts", "a/1_r.pdf").await,
            Err(StorageError::NotFound)
        );
        assert!(storage.is_empty());
    }
}
