//! boxpub Core Interface: the Destination capability
//!
//! This crate defines the `Destination` trait, which abstracts where published
//! boxes and their manifest end up. The manifest store and the publisher only
//! ever talk to a `Destination`, so a local directory tree and a remote object
//! store can sit behind the same interface.
//!
//! # Keys
//!
//! Every object is addressed by a `/`-separated key relative to the
//! destination root, e.g. `mybox/1.0.0/package.box`. A leading `/` is
//! ignored, so `"/manifest.json"` and `"manifest.json"` name the same object.
//!
//! # Example
//!
//! ```rust
//! use boxpub_core_interface::{Destination, MemoryDestination};
//!
//! let dest = MemoryDestination::new();
//! dest.put("mybox/manifest.json", b"{}").unwrap();
//! assert!(dest.exists("mybox/manifest.json").unwrap());
//! assert_eq!(dest.get("mybox/manifest.json").unwrap(), Some(b"{}".to_vec()));
//! ```

use std::io::Read;
use thiserror::Error;

mod memory;

pub use memory::MemoryDestination;

#[derive(Error, Debug)]
pub enum DestinationError {
    #[error("I/O error on '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid destination key: '{0}'")]
    InvalidKey(String),

    #[error("{backend} backend error: {message}")]
    Backend { backend: String, message: String },
}

impl DestinationError {
    /// Wrap an I/O error with the key it happened on
    pub fn io(key: impl Into<String>, source: std::io::Error) -> Self {
        DestinationError::Io {
            key: key.into(),
            source,
        }
    }

    /// Create a backend-specific error
    pub fn backend(backend: impl Into<String>, message: impl Into<String>) -> Self {
        DestinationError::Backend {
            backend: backend.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DestinationError>;

/// Storage that published boxes and manifests are written to
///
/// Implementations:
/// - **LocalDestination** (root crate): a directory on the local filesystem
/// - **ObjectStoreDestination** (root crate, `object-store` feature): S3, GCS, Azure
/// - **MemoryDestination**: in-memory, for tests and dry runs
///
/// # Atomicity
///
/// `put` and `put_stream` must replace the object as a whole: after a failed
/// write, readers see either the previous object or nothing, never a
/// truncated one.
pub trait Destination {
    /// Short label for log output ("local", "memory", ...)
    fn kind(&self) -> &str;

    /// Check whether an object exists at `key`
    fn exists(&self, key: &str) -> Result<bool>;

    /// Read the whole object at `key`, or `None` if there is nothing there
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Atomically write `bytes` to `key`, creating any missing parents
    fn put(&self, key: &str, bytes: &[u8]) -> Result<()>;

    /// Atomically write everything `reader` yields to `key`
    ///
    /// Returns the number of bytes written.
    fn put_stream(&self, key: &str, reader: &mut dyn Read) -> Result<u64>;

    /// Public location of `key`, as recorded in the manifest
    fn locate(&self, key: &str) -> String;
}

impl<D: Destination + ?Sized> Destination for &D {
    fn kind(&self) -> &str {
        (**self).kind()
    }

    fn exists(&self, key: &str) -> Result<bool> {
        (**self).exists(key)
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        (**self).put(key, bytes)
    }

    fn put_stream(&self, key: &str, reader: &mut dyn Read) -> Result<u64> {
        (**self).put_stream(key, reader)
    }

    fn locate(&self, key: &str) -> String {
        (**self).locate(key)
    }
}

impl<D: Destination + ?Sized> Destination for Box<D> {
    fn kind(&self) -> &str {
        (**self).kind()
    }

    fn exists(&self, key: &str) -> Result<bool> {
        (**self).exists(key)
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        (**self).put(key, bytes)
    }

    fn put_stream(&self, key: &str, reader: &mut dyn Read) -> Result<u64> {
        (**self).put_stream(key, reader)
    }

    fn locate(&self, key: &str) -> String {
        (**self).locate(key)
    }
}

/// Normalize a key: strip leading separators and reject empty keys
pub fn normalize_key(key: &str) -> Result<&str> {
    let trimmed = key.trim_start_matches('/');
    if trimmed.is_empty() {
        return Err(DestinationError::InvalidKey(key.to_string()));
    }
    Ok(trimmed)
}

/// Join key segments with a single `/`
///
/// Empty segments are skipped and surrounding separators on each segment are
/// trimmed, so `join_key(&["a/", "/b", "c"])` is `"a/b/c"`.
pub fn join_key(segments: &[&str]) -> String {
    segments
        .iter()
        .map(|s| s.trim_matches('/'))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("/manifest.json").unwrap(), "manifest.json");
        assert_eq!(normalize_key("a/b.box").unwrap(), "a/b.box");
        assert!(matches!(
            normalize_key("/"),
            Err(DestinationError::InvalidKey(_))
        ));
        assert!(normalize_key("").is_err());
    }

    #[test]
    fn test_join_key() {
        assert_eq!(join_key(&["mybox", "1.0.0", "pkg.box"]), "mybox/1.0.0/pkg.box");
        assert_eq!(join_key(&["mybox/", "/1.0.0", "pkg.box"]), "mybox/1.0.0/pkg.box");
        assert_eq!(join_key(&["", "1.0.0", "pkg.box"]), "1.0.0/pkg.box");
    }

    #[test]
    fn test_error_display_carries_key() {
        let err = DestinationError::io(
            "mybox/manifest.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("mybox/manifest.json"));
    }

    #[test]
    fn test_blanket_impl_for_references() {
        fn write_through<D: Destination>(dest: D) {
            dest.put("k", b"v").unwrap();
        }
        let dest = MemoryDestination::new();
        write_through(&dest);
        let boxed: Box<dyn Destination> = Box::new(dest.clone());
        assert!(boxed.exists("k").unwrap());
    }
}
