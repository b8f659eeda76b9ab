/*!
 * boxpub - publish Vagrant boxes to a self-hosted catalog
 *
 * Takes a box produced by the vagrant post-processor and:
 * - copies it to `<path>/<box_dir>/<version>/<file>` on a destination
 * - computes its SHA-256 while it is copied, in a single pass
 * - merges a provider entry into the box's JSON manifest
 * - writes the manifest back only after the copy succeeded
 *
 * Destinations are a local directory, or with the `object-store` feature
 * an S3, Google Cloud Storage or Azure Blob URL.
 *
 * Version: 0.1.0
 * Author: Shane Wall <shaneawall@gmail.com>
 */

pub mod artifact;
pub mod config;
pub mod core;
pub mod destination;
pub mod error;
pub mod logging;
pub mod output;

// Re-export commonly used types
pub use artifact::{Artifact, BoxArtifact, ManifestArtifact, BUILDER_ID, VAGRANT_BUILDER_ID};
pub use config::{LogLevel, PublishConfig};
pub use core::{provider_for_builder, Publisher};
pub use destination::{Destination, LocalDestination};
pub use error::{PublishError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
