/*!
 * Streaming SHA-256 calculation for hashing boxes while they are copied
 */

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::{PublishError, Result};

/// Streaming hasher that calculates checksum incrementally
pub struct StreamingHasher {
    hasher: Sha256,
}

impl StreamingHasher {
    /// Create a new streaming hasher
    pub fn new() -> Self {
        Self {
            hasher: Sha256::new(),
        }
    }

    /// Update the hash with new data
    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    /// Finalize and return the lowercase hex digest
    pub fn finalize_hex(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}

impl Default for StreamingHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Reader that feeds every byte it yields into a SHA-256 digest
///
/// Wrapping the source in a `HashingReader` and handing it to the
/// destination writer produces the copy and its checksum in one pass, so the
/// recorded digest always describes exactly the bytes that were written.
pub struct HashingReader<R> {
    inner: R,
    hasher: StreamingHasher,
    bytes_read: u64,
}

impl<R: Read> HashingReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            hasher: StreamingHasher::new(),
            bytes_read: 0,
        }
    }

    /// Bytes passed through so far
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Consume the reader and return the hex digest of everything read
    pub fn finalize_hex(self) -> String {
        self.hasher.finalize_hex()
    }
}

impl<R: Read> Read for HashingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.hasher.update(&buf[..n]);
        self.bytes_read += n as u64;
        Ok(n)
    }
}

/// Calculate checksum of a file (standalone function)
pub fn calculate_checksum(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|e| PublishError::io(path, e))?;
    let mut reader = HashingReader::new(BufReader::with_capacity(64 * 1024, file));
    std::io::copy(&mut reader, &mut std::io::sink()).map_err(|e| PublishError::io(path, e))?;
    Ok(reader.finalize_hex())
}
