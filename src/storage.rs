//! File storage for configuration trees
//!
//! A [`ConfigFile`] binds a path to a [`ValueSerializer`], so any shipped
//! format can load a tree from disk and write it back.

use crate::error::{Error, Result};
use crate::serialization::{ValueSerializer, deserialize, serialize};
use crate::tree::ConfigTree;
use log::{debug, info, warn};
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

// =============================================================================
// Options
// =============================================================================

/// How a [`ConfigFile`] touches the filesystem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageOptions {
    /// Write to a temporary sibling file, then rename over the target
    pub atomic_write: bool,
    /// Create missing parent directories on save
    pub create_dirs: bool,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            atomic_write: true,
            create_dirs: true,
        }
    }
}

impl StorageOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_atomic_write(mut self, enabled: bool) -> Self {
        self.atomic_write = enabled;
        self
    }

    #[must_use]
    pub fn with_create_dirs(mut self, enabled: bool) -> Self {
        self.create_dirs = enabled;
        self
    }
}

// =============================================================================
// ConfigFile
// =============================================================================

/// A configuration file read and written through a [`ValueSerializer`]
///
/// # Example
///
/// ```no_run
/// use fiberconf::builder::ConfigTreeBuilder;
/// use fiberconf::schema::types;
/// use fiberconf::serialization::JsonValueSerializer;
/// use fiberconf::storage::ConfigFile;
///
/// # fn main() -> fiberconf::Result<()> {
/// let mut builder = ConfigTreeBuilder::new();
/// builder.begin_value("port", &types::unsigned_short(), 8080).finish_value()?;
/// let tree = builder.build()?;
///
/// let file = ConfigFile::new("settings.json", JsonValueSerializer::new());
/// if !file.load(&tree)? {
///     file.save(&tree)?;
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ConfigFile<S> {
    path: PathBuf,
    serializer: S,
    options: StorageOptions,
}

impl<S: ValueSerializer> ConfigFile<S> {
    pub fn new(path: impl Into<PathBuf>, serializer: S) -> Self {
        Self::with_options(path, serializer, StorageOptions::default())
    }

    pub fn with_options(path: impl Into<PathBuf>, serializer: S, options: StorageOptions) -> Self {
        Self {
            path: path.into(),
            serializer,
            options,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn serializer(&self) -> &S {
        &self.serializer
    }

    pub fn options(&self) -> StorageOptions {
        self.options
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load the file into `tree`.
    ///
    /// Returns `Ok(false)` and leaves the tree untouched when the file does
    /// not exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileRead`] if the file cannot be opened, or any
    /// decode error raised while applying its contents.
    pub fn load(&self, tree: &ConfigTree) -> Result<bool> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No configuration file at {}", self.path.display());
                return Ok(false);
            }
            Err(e) => {
                return Err(Error::FileRead {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };

        let mut reader = BufReader::new(file);
        deserialize(tree, &mut reader, &self.serializer)?;
        info!("Loaded configuration from {}", self.path.display());
        Ok(true)
    }

    /// Write every set leaf value of `tree` to the file.
    ///
    /// With atomic writes a failed save leaves the previous file untouched and
    /// removes its temporary sibling.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DirectoryCreate`] or [`Error::FileWrite`] on I/O
    /// failure, or any error raised while encoding the tree.
    pub fn save(&self, tree: &ConfigTree) -> Result<()> {
        if self.options.create_dirs {
            if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|e| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }

        let written = if self.options.atomic_write {
            self.temp_path()?
        } else {
            self.path.clone()
        };

        let result = self.write_to(tree, &written).and_then(|()| {
            if written == self.path {
                return Ok(());
            }
            fs::rename(&written, &self.path).map_err(|e| Error::FileWrite {
                path: self.path.clone(),
                source: e,
            })
        });
        if let Err(e) = result {
            if written != self.path {
                self.discard(&written);
            }
            return Err(e);
        }

        info!("Saved configuration to {}", self.path.display());
        Ok(())
    }

    fn write_to(&self, tree: &ConfigTree, path: &Path) -> Result<()> {
        let write_error = |e| Error::FileWrite {
            path: path.to_path_buf(),
            source: e,
        };

        let file = fs::File::create(path).map_err(write_error)?;
        let mut writer = BufWriter::new(file);
        serialize(tree, &mut writer, &self.serializer)?;
        writer.flush().map_err(write_error)
    }

    fn discard(&self, temp: &Path) {
        match fs::remove_file(temp) {
            Ok(()) => debug!("Removed unfinished {}", temp.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Could not remove {}: {e}", temp.display()),
        }
    }

    // Keeps the full file name and appends ".tmp"
    fn temp_path(&self) -> Result<PathBuf> {
        let file_name = self.path.file_name().ok_or_else(|| Error::FileWrite {
            path: self.path.clone(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
        })?;
        let mut temp_name = file_name.to_os_string();
        temp_name.push(".tmp");
        Ok(self.path.with_file_name(temp_name))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ConfigTreeBuilder;
    use crate::schema::{ConfigValue, types};
    use crate::serialization::JsonValueSerializer;
    use std::rc::Rc;
    use tempfile::tempdir;

    fn tree() -> Rc<ConfigTree> {
        let mut builder = ConfigTreeBuilder::new();
        builder
            .begin_value("name", &types::string(), "fiber".to_string())
            .finish_value()
            .unwrap()
            .begin_value("count", &types::integer(), 3)
            .finish_value()
            .unwrap();
        builder.build().unwrap()
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let file = ConfigFile::new(dir.path().join("config.json"), JsonValueSerializer::new());

        let source = tree();
        source
            .lookup_leaf("count")
            .unwrap()
            .set_value(ConfigValue::from(42));
        file.save(&source).unwrap();
        assert!(file.exists());

        let target = tree();
        assert!(file.load(&target).unwrap());
        assert_eq!(
            target.lookup_leaf("count").unwrap().value(),
            Some(ConfigValue::from(42))
        );
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/deeper/config.json");
        let file = ConfigFile::new(&path, JsonValueSerializer::new());

        file.save(&tree()).unwrap();
        assert!(path.is_file());
        assert!(!dir.path().join("nested/deeper/config.json.tmp").exists());
    }

    #[test]
    fn test_failed_save_removes_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::create_dir(&path).unwrap();
        let file = ConfigFile::new(&path, JsonValueSerializer::new());

        let err = file.save(&tree()).unwrap_err();
        assert!(matches!(err, Error::FileWrite { .. }));
        assert!(!dir.path().join("config.json.tmp").exists());
        assert!(path.is_dir());
    }

    #[test]
    fn test_missing_parent_without_create_dirs() {
        let dir = tempdir().unwrap();
        let options = StorageOptions::new().with_create_dirs(false).with_atomic_write(false);
        let file = ConfigFile::with_options(
            dir.path().join("missing/config.json"),
            JsonValueSerializer::new(),
            options,
        );

        let err = file.save(&tree()).unwrap_err();
        assert!(matches!(err, Error::FileWrite { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let file = ConfigFile::new(dir.path().join("absent.json"), JsonValueSerializer::new());

        let target = tree();
        assert!(!file.load(&target).unwrap());
        assert_eq!(
            target.lookup_leaf("count").unwrap().value(),
            Some(ConfigValue::from(3))
        );
    }

    #[test]
    fn test_load_reports_decode_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"count": "many"}"#).unwrap();

        let file = ConfigFile::new(&path, JsonValueSerializer::new());
        let err = file.load(&tree()).unwrap_err();
        assert!(err.is_decode_error());
    }
}
