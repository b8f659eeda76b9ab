//! Box manifest data structures and merge rules
//!
//! A manifest lists every published version of one box, and for each version
//! the providers (virtualbox, vmware_desktop, aws, ...) it was built for.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Box manifest: the top-level persisted document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Manifest {
    /// Box name, fixed when the manifest is first created
    pub name: String,

    /// One entry per distinct version, in publication order
    #[serde(default)]
    pub versions: Vec<VersionEntry>,
}

/// All providers published under one version
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VersionEntry {
    pub version: String,

    #[serde(default)]
    pub providers: Vec<Provider>,
}

/// A single downloadable box for one provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Provider {
    /// Provider label, e.g. "virtualbox"
    pub name: String,

    /// Where the box bytes were placed
    pub url: String,

    /// Digest algorithm used for `checksum`
    pub checksum_type: ChecksumType,

    /// Lowercase hex digest of the box bytes
    pub checksum: String,
}

/// Digest algorithms a manifest can record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumType {
    #[default]
    Sha256,
}

/// What `Manifest::add` did with the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Merge {
    /// No provider with that name existed under the version
    Inserted,
    /// An existing provider with that name was replaced in place
    Replaced,
}

impl ChecksumType {
    /// Identifier written to `checksum_type`
    pub fn as_str(&self) -> &'static str {
        match self {
            ChecksumType::Sha256 => "sha256",
        }
    }

    /// Length of the hex-encoded digest
    pub fn hex_len(&self) -> usize {
        match self {
            ChecksumType::Sha256 => 64,
        }
    }
}

impl fmt::Display for ChecksumType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChecksumType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sha256" => Ok(ChecksumType::Sha256),
            _ => Err(Error::UnsupportedChecksumType(s.to_string())),
        }
    }
}

impl Manifest {
    /// Create an empty manifest for the named box
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            versions: Vec::new(),
        }
    }

    /// Record `provider` under `version`
    ///
    /// The version entry is created (appended) if missing. Within it a
    /// provider with the same name is replaced at its existing position,
    /// otherwise the provider is appended. Calling this twice with the same
    /// arguments leaves the manifest as after the first call.
    ///
    /// The provider is validated first; on error the manifest is unchanged.
    pub fn add(&mut self, version: &str, provider: Provider) -> Result<Merge> {
        Self::check_entry(version, &provider.name, &provider.url)?;
        provider.validate_checksum()?;

        let index = match self.versions.iter().position(|v| v.version == version) {
            Some(index) => index,
            None => {
                self.versions.push(VersionEntry::new(version));
                self.versions.len() - 1
            }
        };

        Ok(self.versions[index].upsert(provider))
    }

    /// Check the parts of an entry that are known before its checksum
    ///
    /// Lets a caller reject an entry before publishing the file it points to.
    pub fn check_entry(version: &str, provider: &str, url: &str) -> Result<()> {
        if version.is_empty() {
            return Err(Error::validation("Version cannot be empty"));
        }
        if provider.is_empty() {
            return Err(Error::validation("Provider name cannot be empty"));
        }
        if url.is_empty() {
            return Err(Error::validation(format!(
                "Provider '{}' has an empty url",
                provider
            )));
        }
        Ok(())
    }

    /// Look up a version entry
    pub fn version(&self, version: &str) -> Option<&VersionEntry> {
        self.versions.iter().find(|v| v.version == version)
    }

    /// Most recently added version
    pub fn latest(&self) -> Option<&VersionEntry> {
        self.versions.last()
    }

    /// Total providers across all versions
    pub fn provider_count(&self) -> usize {
        self.versions.iter().map(|v| v.providers.len()).sum()
    }

    /// Check key uniqueness and every provider entry
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::validation("Manifest name cannot be empty"));
        }

        let mut seen_versions = HashSet::new();
        for entry in &self.versions {
            if !seen_versions.insert(entry.version.as_str()) {
                return Err(Error::validation(format!(
                    "Duplicate version '{}'",
                    entry.version
                )));
            }

            let mut seen_providers = HashSet::new();
            for provider in &entry.providers {
                if !seen_providers.insert(provider.name.as_str()) {
                    return Err(Error::validation(format!(
                        "Duplicate provider '{}' in version '{}'",
                        provider.name, entry.version
                    )));
                }
                provider.validate()?;
            }
        }

        Ok(())
    }
}

impl VersionEntry {
    /// Create a version entry with no providers
    pub fn new<S: Into<String>>(version: S) -> Self {
        Self {
            version: version.into(),
            providers: Vec::new(),
        }
    }

    /// Look up a provider by name
    pub fn provider(&self, name: &str) -> Option<&Provider> {
        self.providers.iter().find(|p| p.name == name)
    }

    fn upsert(&mut self, provider: Provider) -> Merge {
        match self.providers.iter_mut().find(|p| p.name == provider.name) {
            Some(existing) => {
                *existing = provider;
                Merge::Replaced
            }
            None => {
                self.providers.push(provider);
                Merge::Inserted
            }
        }
    }
}

impl Provider {
    /// Create a provider entry
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        checksum_type: ChecksumType,
        checksum: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            checksum_type,
            checksum: checksum.into(),
        }
    }

    /// Shorthand for a SHA-256 provider entry
    pub fn sha256(
        name: impl Into<String>,
        url: impl Into<String>,
        checksum: impl Into<String>,
    ) -> Self {
        Self::new(name, url, ChecksumType::Sha256, checksum)
    }

    /// Check the entry is complete and the checksum is well-formed
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::validation("Provider name cannot be empty"));
        }
        if self.url.is_empty() {
            return Err(Error::validation(format!(
                "Provider '{}' has an empty url",
                self.name
            )));
        }
        self.validate_checksum()
    }

    fn validate_checksum(&self) -> Result<()> {
        let expected = self.checksum_type.hex_len();
        let well_formed = self.checksum.len() == expected
            && self
                .checksum
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !well_formed {
            return Err(Error::validation(format!(
                "Provider '{}' checksum must be {} lowercase hex characters for {}, got '{}'",
                self.name, expected, self.checksum_type, self.checksum
            )));
        }

        Ok(())
    }
}
