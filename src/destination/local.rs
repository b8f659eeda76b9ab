//! Local filesystem destination
//!
//! Objects live under a root directory; a key maps onto a relative path below
//! it. Writes go to a temporary file in the target directory which is then
//! renamed over the final path, so a reader never sees a partial file.

use boxpub_core_interface::{normalize_key, Destination, DestinationError, Result};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Destination rooted at a local directory
#[derive(Debug, Clone)]
pub struct LocalDestination {
    root: PathBuf,
}

impl LocalDestination {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path for a key
    pub fn resolve(&self, key: &str) -> Result<PathBuf> {
        let key = normalize_key(key)?;
        if key.split('/').any(|segment| segment == "..") {
            return Err(DestinationError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(key))
    }

    /// Open a temporary file next to `path`, creating parent directories
    fn temp_file_for(&self, key: &str, path: &Path) -> Result<NamedTempFile> {
        let parent = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(parent).map_err(|e| DestinationError::io(key, e))?;
        NamedTempFile::new_in(parent).map_err(|e| DestinationError::io(key, e))
    }

    fn commit(&self, key: &str, temp: NamedTempFile, path: &Path) -> Result<()> {
        temp.as_file()
            .sync_all()
            .map_err(|e| DestinationError::io(key, e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(temp.path(), fs::Permissions::from_mode(0o644))
                .map_err(|e| DestinationError::io(key, e))?;
        }

        temp.persist(path)
            .map_err(|e| DestinationError::io(key, e.error))?;
        Ok(())
    }
}

impl Destination for LocalDestination {
    fn kind(&self) -> &str {
        "local"
    }

    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.resolve(key)?.is_file())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.resolve(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DestinationError::io(key, e)),
        }
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.resolve(key)?;
        let mut temp = self.temp_file_for(key, &path)?;
        temp.write_all(bytes)
            .map_err(|e| DestinationError::io(key, e))?;
        self.commit(key, temp, &path)
    }

    fn put_stream(&self, key: &str, reader: &mut dyn Read) -> Result<u64> {
        let path = self.resolve(key)?;
        let mut temp = self.temp_file_for(key, &path)?;
        let written = io::copy(reader, &mut temp).map_err(|e| DestinationError::io(key, e))?;
        self.commit(key, temp, &path)?;
        Ok(written)
    }

    fn locate(&self, key: &str) -> String {
        let key = key.trim_start_matches('/');
        self.root.join(key).display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct FailingReader {
        sent: bool,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.sent {
                return Err(io::Error::other("source went away"));
            }
            self.sent = true;
            buf[..4].copy_from_slice(b"part");
            Ok(4)
        }
    }

    #[test]
    fn test_put_creates_directories() {
        let dir = TempDir::new().unwrap();
        let dest = LocalDestination::new(dir.path());

        dest.put("mybox/1.0.0/pkg.box", b"data").unwrap();

        let path = dir.path().join("mybox/1.0.0/pkg.box");
        assert_eq!(fs::read(&path).unwrap(), b"data");
        assert!(dest.exists("/mybox/1.0.0/pkg.box").unwrap());
    }

    #[test]
    fn test_get_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let dest = LocalDestination::new(dir.path());
        assert_eq!(dest.get("manifest.json").unwrap(), None);
        assert!(!dest.exists("manifest.json").unwrap());
    }

    #[test]
    fn test_unreadable_object_is_error() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("mybox/manifest.json")).unwrap();
        let dest = LocalDestination::new(dir.path());

        assert!(matches!(
            dest.get("mybox/manifest.json"),
            Err(DestinationError::Io { .. })
        ));
        assert!(!dest.exists("mybox/manifest.json").unwrap());
    }

    #[test]
    fn test_put_stream_replaces_existing() {
        let dir = TempDir::new().unwrap();
        let dest = LocalDestination::new(dir.path());
        dest.put("pkg.box", b"old contents that are longer").unwrap();

        let written = dest.put_stream("pkg.box", &mut &b"new"[..]).unwrap();

        assert_eq!(written, 3);
        assert_eq!(dest.get("pkg.box").unwrap(), Some(b"new".to_vec()));
    }

    #[test]
    fn test_failed_stream_keeps_previous_file() {
        let dir = TempDir::new().unwrap();
        let dest = LocalDestination::new(dir.path());
        dest.put("mybox/pkg.box", b"previous").unwrap();

        let err = dest
            .put_stream("mybox/pkg.box", &mut FailingReader { sent: false })
            .unwrap_err();

        assert!(matches!(err, DestinationError::Io { .. }));
        assert_eq!(dest.get("mybox/pkg.box").unwrap(), Some(b"previous".to_vec()));
        let leftovers: Vec<_> = fs::read_dir(dir.path().join("mybox")).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn test_locate_joins_root() {
        let dest = LocalDestination::new("/srv/boxes");
        assert_eq!(
            dest.locate("/mybox/1.0.0/pkg.box"),
            Path::new("/srv/boxes")
                .join("mybox/1.0.0/pkg.box")
                .display()
                .to_string()
        );
    }

    #[test]
    fn test_parent_segments_rejected() {
        let dest = LocalDestination::new("/srv/boxes");
        assert!(matches!(
            dest.resolve("../etc/passwd"),
            Err(DestinationError::InvalidKey(_))
        ));
        assert!(matches!(dest.resolve(""), Err(DestinationError::InvalidKey(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_written_files_are_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let dest = LocalDestination::new(dir.path());
        dest.put("manifest.json", b"{}").unwrap();

        let mode = fs::metadata(dir.path().join("manifest.json"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o644);
    }
}
