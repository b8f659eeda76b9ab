/*!
 * Destination backends and selection from a configured path
 *
 * A plain path (or a `file://` URL) selects a local directory. Any other
 * URL scheme is handed to the object store backend, which is only compiled
 * in with the `object-store` feature.
 */

pub mod local;

#[cfg(feature = "object-store")]
pub mod object_store;

pub use boxpub_core_interface::{Destination, DestinationError, MemoryDestination};
pub use local::LocalDestination;

#[cfg(feature = "object-store")]
pub use self::object_store::ObjectStoreDestination;

use crate::error::Result;

/// Open the destination named by `path`
pub fn open(path: &str) -> Result<Box<dyn Destination>> {
    if let Some(local) = path.strip_prefix("file://") {
        return Ok(Box::new(LocalDestination::new(local)));
    }

    if !path.contains("://") {
        return Ok(Box::new(LocalDestination::new(path)));
    }

    open_remote(path)
}

#[cfg(feature = "object-store")]
fn open_remote(url: &str) -> Result<Box<dyn Destination>> {
    Ok(Box::new(ObjectStoreDestination::from_url(url)?))
}

#[cfg(not(feature = "object-store"))]
fn open_remote(url: &str) -> Result<Box<dyn Destination>> {
    Err(crate::error::PublishError::Config(format!(
        "Destination '{}' needs the object-store feature",
        url
    )))
}
