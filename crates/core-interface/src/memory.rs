//! In-memory destination
//!
//! Stores objects in a shared map so tests and dry runs can exercise the
//! manifest store and publisher without touching the filesystem.

use crate::{normalize_key, Destination, DestinationError, Result};
use std::collections::BTreeMap;
use std::io::Read;
use std::sync::{Arc, RwLock};

/// In-memory `Destination`
///
/// Clones share the same underlying storage.
///
/// # Example
///
/// ```rust
/// use boxpub_core_interface::{Destination, MemoryDestination};
///
/// let dest = MemoryDestination::new();
/// let mut reader: &[u8] = b"box bytes";
/// let written = dest.put_stream("mybox/1.0.0/pkg.box", &mut reader).unwrap();
/// assert_eq!(written, 9);
/// assert_eq!(dest.locate("mybox/1.0.0/pkg.box"), "memory://mybox/1.0.0/pkg.box");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryDestination {
    objects: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
    fail_prefix: Option<String>,
}

impl MemoryDestination {
    /// Create an empty destination
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write to a key starting with `prefix` fail
    ///
    /// Failed writes leave the stored object untouched.
    pub fn failing_writes(mut self, prefix: impl Into<String>) -> Self {
        self.fail_prefix = Some(prefix.into());
        self
    }

    /// Keys currently stored, in sorted order
    pub fn keys(&self) -> Vec<String> {
        self.objects
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect()
    }

    /// Number of stored objects
    pub fn len(&self) -> usize {
        self.objects.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// True when nothing has been written
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_writable(&self, key: &str) -> Result<()> {
        match &self.fail_prefix {
            Some(prefix) if key.starts_with(prefix.as_str()) => Err(DestinationError::io(
                key,
                std::io::Error::other("simulated write failure"),
            )),
            _ => Ok(()),
        }
    }

    fn store(&self, key: &str, bytes: Vec<u8>) {
        self.objects
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), bytes);
    }
}

impl Destination for MemoryDestination {
    fn kind(&self) -> &str {
        "memory"
    }

    fn exists(&self, key: &str) -> Result<bool> {
        let key = normalize_key(key)?;
        Ok(self
            .objects
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(key))
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let key = normalize_key(key)?;
        Ok(self
            .objects
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned())
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let key = normalize_key(key)?;
        self.check_writable(key)?;
        self.store(key, bytes.to_vec());
        Ok(())
    }

    fn put_stream(&self, key: &str, reader: &mut dyn Read) -> Result<u64> {
        let key = normalize_key(key)?;
        self.check_writable(key)?;

        // Buffer first so a failing reader never replaces the stored object
        let mut buffer = Vec::new();
        reader
            .read_to_end(&mut buffer)
            .map_err(|e| DestinationError::io(key, e))?;
        let written = buffer.len() as u64;
        self.store(key, buffer);
        Ok(written)
    }

    fn locate(&self, key: &str) -> String {
        format!("memory://{}", key.trim_start_matches('/'))
    }
}
