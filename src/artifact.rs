/*!
 * Artifacts handed to and returned from the publisher
 */

use std::fmt;
use std::path::PathBuf;

/// Builder id of artifacts produced by the vagrant post-processor
pub const VAGRANT_BUILDER_ID: &str = "mitchellh.post-processor.vagrant";

/// Builder id of the manifest artifact this crate returns
pub const BUILDER_ID: &str = "boxpub.post-processor.manifest";

/// File suffix of a packaged box
pub const BOX_SUFFIX: &str = ".box";

/// Output of a build step
pub trait Artifact {
    /// Which step produced the artifact
    fn builder_id(&self) -> &str;

    /// Identifier reported by the step, e.g. the builder name `virtualbox`
    fn id(&self) -> &str;

    /// Files making up the artifact, in the order the step listed them
    fn files(&self) -> &[PathBuf];
}

/// A packaged box as produced upstream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxArtifact {
    builder_id: String,
    id: String,
    files: Vec<PathBuf>,
}

impl BoxArtifact {
    pub fn new<S: Into<String>>(builder_id: S, id: S, files: Vec<PathBuf>) -> Self {
        Self {
            builder_id: builder_id.into(),
            id: id.into(),
            files,
        }
    }

    /// Box produced by the vagrant post-processor for `builder`
    pub fn vagrant<S: Into<String>, P: Into<PathBuf>>(builder: S, file: P) -> Self {
        Self {
            builder_id: VAGRANT_BUILDER_ID.to_string(),
            id: builder.into(),
            files: vec![file.into()],
        }
    }
}

impl Artifact for BoxArtifact {
    fn builder_id(&self) -> &str {
        &self.builder_id
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn files(&self) -> &[PathBuf] {
        &self.files
    }
}

/// Result of a publish: the manifest is now the artifact of record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestArtifact {
    location: String,
    files: Vec<PathBuf>,
}

impl ManifestArtifact {
    pub fn new<S: Into<String>>(location: S) -> Self {
        let location = location.into();
        Self {
            files: vec![PathBuf::from(&location)],
            location,
        }
    }

    /// Where the manifest was written
    pub fn location(&self) -> &str {
        &self.location
    }
}

impl Artifact for ManifestArtifact {
    fn builder_id(&self) -> &str {
        BUILDER_ID
    }

    fn id(&self) -> &str {
        &self.location
    }

    fn files(&self) -> &[PathBuf] {
        &self.files
    }
}

impl fmt::Display for ManifestArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Box manifest: {}", self.location)
    }
}
