//! Object store destination (S3, Google Cloud Storage, Azure Blob)
//!
//! Uses the `object_store` crate. Credentials come from the usual provider
//! environment variables, e.g. `AWS_ACCESS_KEY_ID` or
//! `GOOGLE_SERVICE_ACCOUNT`. Each call blocks on a private current-thread
//! runtime, so the destination can be used from synchronous code.

use boxpub_core_interface::{normalize_key, Destination, DestinationError, Result};
use bytes::Bytes;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, WriteMultipart};
use std::io::Read;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::warn;
use url::Url;

/// Size of each uploaded part; S3 rejects non-final parts under 5 MiB
const PART_SIZE: usize = 8 * 1024 * 1024;

/// Parts allowed in flight before reading more of the source
const MAX_IN_FLIGHT: usize = 4;

/// Read size when pulling from the source
const READ_SIZE: usize = 64 * 1024;

/// Destination backed by a bucket or container
pub struct ObjectStoreDestination {
    store: Arc<dyn ObjectStore>,
    /// Prefix inside the bucket that acts as the root
    prefix: String,
    /// Root URL, used to build public locations
    base_url: String,
    runtime: Runtime,
}

impl ObjectStoreDestination {
    /// Create a destination from a URL such as `s3://bucket/boxes`
    pub fn from_url(url: &str) -> Result<Self> {
        let parsed = Url::parse(url).map_err(|e| {
            DestinationError::backend("object-store", format!("Invalid URL '{}': {}", url, e))
        })?;

        // Builder config keys are the lowercase form of the environment variables
        let options = std::env::vars().map(|(k, v)| (k.to_ascii_lowercase(), v));
        let (store, prefix) = object_store::parse_url_opts(&parsed, options).map_err(|e| {
            DestinationError::backend(
                parsed.scheme(),
                format!("Failed to create client for '{}': {}", url, e),
            )
        })?;

        let mut destination = Self::with_store(Arc::from(store), url)?;
        destination.prefix = prefix.as_ref().to_string();
        Ok(destination)
    }

    /// Wrap an existing store; `base_url` is the URL of the store's root
    pub fn with_store(store: Arc<dyn ObjectStore>, base_url: &str) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                DestinationError::backend(
                    "object-store",
                    format!("Failed to start runtime: {}", e),
                )
            })?;

        Ok(Self {
            store,
            prefix: String::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            runtime,
        })
    }

    fn object_path(&self, key: &str) -> Result<ObjectPath> {
        let key = normalize_key(key)?;
        let full = if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}/{}", self.prefix.trim_end_matches('/'), key)
        };
        ObjectPath::parse(&full).map_err(|_| DestinationError::InvalidKey(key.to_string()))
    }

    fn backend_error(&self, action: &str, key: &str, e: object_store::Error) -> DestinationError {
        DestinationError::backend(
            self.store.to_string(),
            format!("Failed to {} '{}': {}", action, key, e),
        )
    }
}

async fn abort_upload(writer: WriteMultipart, key: &str) {
    if let Err(e) = writer.abort().await {
        warn!(key, error = %e, "Failed to abort multipart upload");
    }
}

impl Destination for ObjectStoreDestination {
    fn kind(&self) -> &str {
        "object-store"
    }

    fn exists(&self, key: &str) -> Result<bool> {
        let path = self.object_path(key)?;
        match self.runtime.block_on(self.store.head(&path)) {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(self.backend_error("stat", key, e)),
        }
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.object_path(key)?;
        let result = self.runtime.block_on(async {
            let object = self.store.get(&path).await?;
            object.bytes().await
        });
        match result {
            Ok(bytes) => Ok(Some(bytes.to_vec())),
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(self.backend_error("get", key, e)),
        }
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.object_path(key)?;
        self.runtime
            .block_on(self.store.put(&path, Bytes::copy_from_slice(bytes).into()))
            .map_err(|e| self.backend_error("put", key, e))?;
        Ok(())
    }

    fn put_stream(&self, key: &str, reader: &mut dyn Read) -> Result<u64> {
        let path = self.object_path(key)?;

        // Multipart uploads only become visible once completed, so a failed
        // copy never replaces the previous object
        self.runtime.block_on(async {
            let upload = self
                .store
                .put_multipart(&path)
                .await
                .map_err(|e| self.backend_error("start upload of", key, e))?;
            let mut writer = WriteMultipart::new_with_chunk_size(upload, PART_SIZE);

            let mut buffer = vec![0u8; READ_SIZE];
            let mut written = 0u64;
            loop {
                let n = match reader.read(&mut buffer) {
                    Ok(0) => break,
                    Ok(n) => n,
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        abort_upload(writer, key).await;
                        return Err(DestinationError::io(key, e));
                    }
                };

                if let Err(e) = writer.wait_for_capacity(MAX_IN_FLIGHT).await {
                    abort_upload(writer, key).await;
                    return Err(self.backend_error("upload", key, e));
                }
                writer.write(&buffer[..n]);
                written += n as u64;
            }

            writer
                .finish()
                .await
                .map_err(|e| self.backend_error("complete upload of", key, e))?;
            Ok(written)
        })
    }

    fn locate(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::memory::InMemory;

    fn destination() -> (Arc<InMemory>, ObjectStoreDestination) {
        let store = Arc::new(InMemory::new());
        let dest = ObjectStoreDestination::with_store(store.clone(), "s3://bucket/boxes/").unwrap();
        (store, dest)
    }

    #[test]
    fn test_put_then_get() {
        let (_, dest) = destination();
        dest.put("mybox/manifest.json", b"{}").unwrap();

        assert!(dest.exists("/mybox/manifest.json").unwrap());
        assert_eq!(dest.get("mybox/manifest.json").unwrap(), Some(b"{}".to_vec()));
    }

    #[test]
    fn test_missing_object() {
        let (_, dest) = destination();
        assert!(!dest.exists("manifest.json").unwrap());
        assert_eq!(dest.get("manifest.json").unwrap(), None);
    }

    #[test]
    fn test_put_stream_counts_bytes() {
        let (store, dest) = destination();
        let written = dest.put_stream("mybox/1.0.0/pkg.box", &mut &b"box data"[..]).unwrap();
        assert_eq!(written, 8);

        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let bytes = rt
            .block_on(async {
                store
                    .get(&ObjectPath::from("mybox/1.0.0/pkg.box"))
                    .await
                    .unwrap()
                    .bytes()
                    .await
            })
            .unwrap();
        assert_eq!(&bytes[..], b"box data");
    }

    struct FailingReader {
        sent: bool,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.sent {
                return Err(std::io::Error::other("source went away"));
            }
            self.sent = true;
            buf[..4].copy_from_slice(b"part");
            Ok(4)
        }
    }

    #[test]
    fn test_put_stream_spans_several_parts() {
        let (_, dest) = destination();
        let data: Vec<u8> = (0..PART_SIZE * 2 + 123).map(|i| (i % 251) as u8).collect();

        let written = dest.put_stream("mybox/1.0.0/big.box", &mut &data[..]).unwrap();

        assert_eq!(written, data.len() as u64);
        assert_eq!(dest.get("mybox/1.0.0/big.box").unwrap(), Some(data));
    }

    #[test]
    fn test_put_stream_empty_source() {
        let (_, dest) = destination();
        assert_eq!(dest.put_stream("empty.box", &mut &b""[..]).unwrap(), 0);
        assert_eq!(dest.get("empty.box").unwrap(), Some(Vec::new()));
    }

    #[test]
    fn test_failed_stream_keeps_previous_object() {
        let (_, dest) = destination();
        dest.put("mybox/pkg.box", b"previous").unwrap();

        let err = dest
            .put_stream("mybox/pkg.box", &mut FailingReader { sent: false })
            .unwrap_err();

        assert!(matches!(err, DestinationError::Io { .. }));
        assert_eq!(dest.get("mybox/pkg.box").unwrap(), Some(b"previous".to_vec()));
    }

    #[test]
    fn test_prefix_applied() {
        let (store, mut dest) = destination();
        dest.prefix = "boxes".to_string();
        dest.put("manifest.json", b"{}").unwrap();

        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        assert!(rt
            .block_on(store.head(&ObjectPath::from("boxes/manifest.json")))
            .is_ok());
    }

    #[test]
    fn test_locate_uses_base_url() {
        let (_, dest) = destination();
        assert_eq!(
            dest.locate("/mybox/1.0.0/pkg.box"),
            "s3://bucket/boxes/mybox/1.0.0/pkg.box"
        );
    }
}
