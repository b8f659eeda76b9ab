//! Box release manifest for boxpub
//!
//! This crate owns the manifest document that maps box versions and
//! providers to published, checksummed box files.
//!
//! # Key Concepts
//!
//! - **Manifest**: one per box, listing every published version
//! - **Version entry**: the providers published under one version string
//! - **Provider**: where one box file lives and its checksum
//!
//! Entries are merged by key: adding a provider that already exists under a
//! version replaces it in place, so re-running a publish never duplicates
//! anything.
//!
//! # Example
//!
//! ```
//! use boxpub_core_interface::MemoryDestination;
//! use boxpub_core_manifest::{ManifestStore, Provider};
//!
//! let dest = MemoryDestination::new();
//! let store = ManifestStore::new(&dest, "mybox/manifest.json", "mybox").unwrap();
//!
//! let mut manifest = store.load().unwrap();
//! manifest
//!     .add(
//!         "1.0.0",
//!         Provider::sha256(
//!             "virtualbox",
//!             "/dest/mybox/1.0.0/package.box",
//!             "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9",
//!         ),
//!     )
//!     .unwrap();
//! store.save(&manifest).unwrap();
//! ```

pub mod error;
pub mod manifest;
pub mod store;
pub mod validate;

// Re-export main types for convenience
pub use error::{Error, Result};
pub use manifest::{ChecksumType, Manifest, Merge, Provider, VersionEntry};
pub use store::{to_canonical_json, ManifestStore};
pub use validate::{validate_manifest, validate_manifest_value};
