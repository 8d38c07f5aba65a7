//! Resource lookup for auxiliary inputs such as the event filter list.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Opens a named resource for reading.
pub trait ResourceLocator: Send + Sync {
    fn open(&self, location: &str) -> io::Result<Box<dyn Read>>;
}

/// Filesystem locator.
///
/// Absolute locations are opened directly. Relative locations are tried
/// under each search root in order, then as given (relative to the working
/// directory).
#[derive(Debug, Clone, Default)]
pub struct FileLocator {
    roots: Vec<PathBuf>,
}

impl FileLocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.roots.push(root.into());
        self
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// First existing file for `location`, if any.
    pub fn resolve(&self, location: &str) -> Option<PathBuf> {
        let path = Path::new(location);
        if path.is_absolute() {
            return path.is_file().then(|| path.to_path_buf());
        }

        self.roots
            .iter()
            .map(|root| root.join(path))
            .chain(std::iter::once(path.to_path_buf()))
            .find(|candidate| candidate.is_file())
    }
}

impl ResourceLocator for FileLocator {
    fn open(&self, location: &str) -> io::Result<Box<dyn Read>> {
        let path = self.resolve(location).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("resource {:?} not found", location),
            )
        })?;
        Ok(Box::new(File::open(path)?))
    }
}
