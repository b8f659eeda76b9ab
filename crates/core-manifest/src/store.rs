//! Manifest persistence over a `Destination`
//!
//! The store reads the manifest at the start of a publish, and writes the
//! whole document back at the end. Writes go through `Destination::put`,
//! which replaces the object atomically.

use crate::error::{Error, Result};
use crate::validate::{validate_manifest, validate_manifest_value};
use crate::Manifest;
use boxpub_core_interface::{normalize_key, Destination};
use serde_json::Value;
use tracing::debug;

/// Loads and saves the manifest document at one location
#[derive(Debug)]
pub struct ManifestStore<D> {
    destination: D,
    location: String,
    box_name: String,
}

impl<D: Destination> ManifestStore<D> {
    /// Create a store for the manifest at `location` on `destination`
    ///
    /// `box_name` names a manifest synthesized when none exists yet.
    pub fn new(destination: D, location: &str, box_name: &str) -> Result<Self> {
        let location = normalize_key(location)?.to_string();
        Ok(Self {
            destination,
            location,
            box_name: box_name.to_string(),
        })
    }

    /// Key of the manifest document on the destination
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Public location of the manifest document
    pub fn url(&self) -> String {
        self.destination.locate(&self.location)
    }

    /// Read the current manifest
    ///
    /// A missing document is not an error: a fresh manifest named after the
    /// configured box is returned instead.
    pub fn load(&self) -> Result<Manifest> {
        let bytes = match self.destination.get(&self.location)? {
            Some(bytes) => bytes,
            None => {
                debug!(location = %self.location, "No manifest found, starting a new one");
                return Ok(Manifest::new(self.box_name.as_str()));
            }
        };

        let value: Value =
            serde_json::from_slice(&bytes).map_err(|e| Error::parse(self.location.as_str(), e))?;
        validate_manifest_value(&self.location, &value)?;
        let manifest: Manifest =
            serde_json::from_value(value).map_err(|e| Error::parse(self.location.as_str(), e))?;
        manifest.validate()?;

        debug!(
            location = %self.location,
            versions = manifest.versions.len(),
            providers = manifest.provider_count(),
            "Loaded manifest"
        );
        Ok(manifest)
    }

    /// Write the whole manifest back to its location
    pub fn save(&self, manifest: &Manifest) -> Result<()> {
        validate_manifest(manifest)?;

        let bytes = to_canonical_json(manifest)?;
        self.destination.put(&self.location, &bytes)?;

        debug!(
            location = %self.location,
            bytes = bytes.len(),
            "Saved manifest"
        );
        Ok(())
    }
}

/// Serialize a manifest the way it is stored: pretty JSON, newline-terminated
pub fn to_canonical_json(manifest: &Manifest) -> Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(manifest).map_err(Error::Serialize)?;
    bytes.push(b'\n');
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Provider;
    use boxpub_core_interface::MemoryDestination;

    const SUM_A: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";
    const SUM_B: &str = "916f0027a575074ce72a331777c3478d6513f786a591bd892da1a577bf2335f9";

    fn store(dest: &MemoryDestination) -> ManifestStore<&MemoryDestination> {
        ManifestStore::new(dest, "mybox/manifest.json", "mybox").unwrap()
    }

    #[test]
    fn test_load_missing_returns_fresh_manifest() {
        let dest = MemoryDestination::new();
        let manifest = store(&dest).load().unwrap();

        assert_eq!(manifest, Manifest::new("mybox"));
        assert!(dest.is_empty(), "loading must not write anything");
    }

    /// Destination whose reads fail with a permission error
    struct DeniedReads;

    impl Destination for DeniedReads {
        fn kind(&self) -> &str {
            "denied"
        }

        fn exists(&self, _key: &str) -> boxpub_core_interface::Result<bool> {
            Ok(true)
        }

        fn get(&self, key: &str) -> boxpub_core_interface::Result<Option<Vec<u8>>> {
            Err(boxpub_core_interface::DestinationError::io(
                key,
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            ))
        }

        fn put(&self, _key: &str, _bytes: &[u8]) -> boxpub_core_interface::Result<()> {
            Ok(())
        }

        fn put_stream(
            &self,
            _key: &str,
            _reader: &mut dyn std::io::Read,
        ) -> boxpub_core_interface::Result<u64> {
            Ok(0)
        }

        fn locate(&self, key: &str) -> String {
            key.to_string()
        }
    }

    #[test]
    fn test_inaccessible_manifest_is_not_absent() {
        let store = ManifestStore::new(DeniedReads, "mybox/manifest.json", "mybox").unwrap();
        let err = store.load().unwrap_err();

        assert!(matches!(err, Error::Destination(_)));
        assert!(!err.is_parse());
        assert!(!err.is_validation());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dest = MemoryDestination::new();
        let store = store(&dest);

        let mut manifest = store.load().unwrap();
        manifest
            .add("1.0.0", Provider::sha256("virtualbox", "/dest/a.box", SUM_A))
            .unwrap();
        manifest
            .add("1.1.0", Provider::sha256("aws", "/dest/b.box", SUM_B))
            .unwrap();
        store.save(&manifest).unwrap();

        let reloaded = store.load().unwrap();
        assert_eq!(reloaded, manifest);

        // Saving what was loaded reproduces the same bytes
        let first = dest.get("mybox/manifest.json").unwrap().unwrap();
        store.save(&reloaded).unwrap();
        let second = dest.get("mybox/manifest.json").unwrap().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_loaded_name_is_kept() {
        let dest = MemoryDestination::new();
        dest.put(
            "mybox/manifest.json",
            br#"{"name":"original","versions":[]}"#,
        )
        .unwrap();

        let manifest = store(&dest).load().unwrap();
        assert_eq!(manifest.name, "original");
    }

    #[test]
    fn test_malformed_bytes_are_parse_errors() {
        let dest = MemoryDestination::new();
        dest.put("mybox/manifest.json", b"{\"name\": ").unwrap();

        let err = store(&dest).load().unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
        assert!(err.to_string().contains("mybox/manifest.json"));
    }

    #[test]
    fn test_off_schema_document_is_parse_error() {
        let dest = MemoryDestination::new();
        dest.put("mybox/manifest.json", br#"{"name":"mybox","versions":{}}"#)
            .unwrap();

        let err = store(&dest).load().unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn test_duplicate_versions_rejected_on_load() {
        let dest = MemoryDestination::new();
        dest.put(
            "mybox/manifest.json",
            br#"{"name":"mybox","versions":[
                {"version":"1.0.0","providers":[]},
                {"version":"1.0.0","providers":[]}
            ]}"#,
        )
        .unwrap();

        assert!(store(&dest).load().unwrap_err().is_validation());
    }

    #[test]
    fn test_failed_save_keeps_previous_document() {
        let dest = MemoryDestination::new();
        let store_ok = store(&dest);
        let mut manifest = store_ok.load().unwrap();
        manifest
            .add("1.0.0", Provider::sha256("virtualbox", "/dest/a.box", SUM_A))
            .unwrap();
        store_ok.save(&manifest).unwrap();
        let before = dest.get("mybox/manifest.json").unwrap();

        let failing = dest.clone().failing_writes("mybox/");
        let store_failing = ManifestStore::new(&failing, "mybox/manifest.json", "mybox").unwrap();
        manifest
            .add("1.0.0", Provider::sha256("virtualbox", "/dest/a.box", SUM_B))
            .unwrap();
        let err = store_failing.save(&manifest).unwrap_err();

        assert!(matches!(err, Error::Destination(_)));
        assert_eq!(dest.get("mybox/manifest.json").unwrap(), before);
    }

    #[test]
    fn test_canonical_json_is_newline_terminated() {
        let bytes = to_canonical_json(&Manifest::new("mybox")).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.ends_with("}\n"));
        assert!(text.contains("\"versions\": []"));
    }

    #[test]
    fn test_leading_separator_in_location_is_ignored() {
        let dest = MemoryDestination::new();
        let store = ManifestStore::new(&dest, "/mybox/manifest.json", "mybox").unwrap();
        assert_eq!(store.location(), "mybox/manifest.json");
        assert_eq!(store.url(), "memory://mybox/manifest.json");
    }
}
