/*!
 * Publish orchestration: validate the box, stream it to the destination while
 * hashing it, and record it in the manifest
 */

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use boxpub_core_interface::Destination;
use boxpub_core_manifest::{Manifest, ManifestStore, Merge, Provider};
use tracing::{info, warn};

use super::checksum::HashingReader;
use super::provider::provider_for_builder;
use crate::artifact::{Artifact, ManifestArtifact, BOX_SUFFIX, VAGRANT_BUILDER_ID};
use crate::config::PublishConfig;
use crate::error::{PublishError, Result};
use crate::output::{StatusSink, TracingSink};

/// Publishes boxes to a destination and keeps its manifest current
///
/// One `publish` call runs start to finish on the calling thread. Nothing
/// guards the manifest against a second publisher writing it concurrently.
pub struct Publisher<D, S = TracingSink> {
    config: PublishConfig,
    destination: D,
    sink: S,
}

impl<D: Destination> Publisher<D, TracingSink> {
    /// Create a publisher, rejecting incomplete configuration
    pub fn new(config: PublishConfig, destination: D) -> Result<Self> {
        Self::with_sink(config, destination, TracingSink)
    }
}

impl<D: Destination, S: StatusSink> Publisher<D, S> {
    /// Create a publisher that reports progress to `sink`
    pub fn with_sink(config: PublishConfig, destination: D, sink: S) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            destination,
            sink,
        })
    }

    pub fn config(&self) -> &PublishConfig {
        &self.config
    }

    pub fn destination(&self) -> &D {
        &self.destination
    }

    /// Publish the box in `artifact` and record it in the manifest
    ///
    /// Any failure aborts the whole operation. The manifest is only written
    /// after the box has been copied in full, so it never advertises a
    /// missing or truncated file. Re-running with the same inputs replaces
    /// the same destination file and manifest entry.
    ///
    /// The version and provider are checked before anything is copied. A
    /// size mismatch is only detected once the copy has been committed, so
    /// in that case the destination file is already replaced while the
    /// manifest still describes the previous one.
    pub fn publish(&self, artifact: &dyn Artifact) -> Result<ManifestArtifact> {
        let box_path = check_source(artifact)?;
        let file_name = box_file_name(artifact, box_path)?;
        let provider = provider_for_builder(artifact.id());

        self.sink.say(&format!(
            "Preparing to copy box for '{}' provider to path '{}'",
            provider, self.config.path
        ));

        let file = File::open(box_path).map_err(|e| PublishError::io(box_path, e))?;
        let size = file
            .metadata()
            .map_err(|e| PublishError::io(box_path, e))?
            .len();
        self.sink.message(&format!(
            "Box to copy: {} ({} bytes)",
            box_path.display(),
            size
        ));

        self.sink.message("Fetching latest manifest");
        let store = ManifestStore::new(
            &self.destination,
            &self.config.manifest,
            &self.config.box_name,
        )?;
        let mut manifest = store.load()?;

        let key = self.config.box_key(file_name);
        let url = self.destination.locate(&key);
        Manifest::check_entry(&self.config.version, provider, &url)?;

        self.sink.message(&format!("Copying box to path: {}", url));
        let buffered = BufReader::with_capacity(self.config.chunk_size, file);
        let mut reader = HashingReader::new(buffered);
        let written = self.destination.put_stream(&key, &mut reader)?;
        if written != size {
            return Err(PublishError::IncompleteCopy {
                path: box_path.to_path_buf(),
                expected: size,
                written,
            });
        }
        let checksum = reader.finalize_hex();
        self.sink.message(&format!("Checksum is {}", checksum));

        self.sink.message(&format!(
            "Adding {} {} box to manifest",
            provider, self.config.version
        ));
        let merge = manifest.add(
            &self.config.version,
            Provider::sha256(provider, url.as_str(), checksum),
        )?;
        if merge == Merge::Replaced {
            info!(
                provider,
                version = %self.config.version,
                "Replaced existing manifest entry"
            );
        }

        self.sink
            .message(&format!("Uploading the manifest: {}", store.url()));
        store.save(&manifest)?;

        info!(
            provider,
            version = %self.config.version,
            destination = self.destination.kind(),
            url = %url,
            bytes = written,
            "Published box"
        );
        Ok(ManifestArtifact::new(store.url()))
    }
}

/// Check the artifact came from the vagrant post-processor and holds a box
///
/// Only the first listed file is published; any others are ignored.
fn check_source(artifact: &dyn Artifact) -> Result<&Path> {
    if artifact.builder_id() != VAGRANT_BUILDER_ID {
        return Err(PublishError::unsupported_source(
            artifact.builder_id(),
            artifact.files(),
            "requires box from vagrant post-processor",
        ));
    }

    let files = artifact.files();
    let first = files.first().ok_or_else(|| {
        PublishError::unsupported_source(artifact.builder_id(), files, "artifact has no files")
    })?;

    let is_box = first
        .to_str()
        .map(|name| name.ends_with(BOX_SUFFIX))
        .unwrap_or(false);
    if !is_box {
        return Err(PublishError::unsupported_source(
            artifact.builder_id(),
            files,
            "unknown files in artifact from vagrant post-processor",
        ));
    }

    if files.len() > 1 {
        warn!(
            ignored = files.len() - 1,
            "Artifact lists more than one file, publishing only {}",
            first.display()
        );
    }

    Ok(first.as_path())
}

fn box_file_name<'a>(artifact: &dyn Artifact, box_path: &'a Path) -> Result<&'a str> {
    box_path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            PublishError::unsupported_source(
                artifact.builder_id(),
                artifact.files(),
                "box path has no usable file name",
            )
        })
}
