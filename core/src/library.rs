//! Managed audio directory
//!
//! Clip file names are stored relative to a directory the application owns
//! (`<data dir>/chatsound/audio`). Importing copies a file in under a name
//! that does not collide with anything already there.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::rules::SoundRule;

/// Errors while managing the audio directory
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("source file not found: {path}")]
    SourceMissing { path: PathBuf },

    #[error("failed to create audio directory {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to copy {from} to {to}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no data directory available on this platform")]
    NoDataDir,
}

/// Turns a stored clip reference into a playable path
pub trait ClipResolver: Send + Sync {
    /// `None` if the reference is empty or the file does not exist
    fn resolve(&self, file_name: &str) -> Option<PathBuf>;
}

impl<F> ClipResolver for F
where
    F: Fn(&str) -> Option<PathBuf> + Send + Sync,
{
    fn resolve(&self, file_name: &str) -> Option<PathBuf> {
        self(file_name)
    }
}

#[derive(Debug, Clone)]
pub struct AudioLibrary {
    root: PathBuf,
}

impl AudioLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `<data dir>/chatsound/audio`, or the configured override
    pub fn from_settings(audio_dir: Option<&str>) -> Result<Self, LibraryError> {
        match audio_dir {
            Some(dir) if !dir.trim().is_empty() => Ok(Self::new(dir.trim())),
            _ => Self::default_location(),
        }
    }

    pub fn default_location() -> Result<Self, LibraryError> {
        let data = dirs::data_dir().ok_or(LibraryError::NoDataDir)?;
        Ok(Self::new(data.join("chatsound").join("audio")))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ensure_exists(&self) -> Result<(), LibraryError> {
        std::fs::create_dir_all(&self.root).map_err(|source| LibraryError::CreateDir {
            path: self.root.clone(),
            source,
        })
    }

    /// Where a stored reference points. Absolute paths are used as-is.
    pub fn path_for(&self, file_name: &str) -> PathBuf {
        let candidate = Path::new(file_name);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.root.join(file_name)
        }
    }

    pub fn exists(&self, file_name: &str) -> bool {
        !file_name.trim().is_empty() && self.path_for(file_name).is_file()
    }

    /// Clip references of `rule` that do not resolve to a file
    pub fn missing_files(&self, rule: &SoundRule) -> Vec<String> {
        rule.clips()
            .iter()
            .filter(|c| !self.exists(&c.file_name))
            .map(|c| c.file_name.clone())
            .collect()
    }

    /// Copy `source` into the library and return the stored file name
    pub fn import(&self, source: &Path) -> Result<String, LibraryError> {
        if !source.is_file() {
            return Err(LibraryError::SourceMissing {
                path: source.to_path_buf(),
            });
        }
        self.ensure_exists()?;

        let file_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| LibraryError::SourceMissing {
                path: source.to_path_buf(),
            })?;
        let unique = self.unique_name(&file_name);
        let destination = self.root.join(&unique);

        std::fs::copy(source, &destination).map_err(|e| LibraryError::Copy {
            from: source.to_path_buf(),
            to: destination.clone(),
            source: e,
        })?;
        info!(file = %unique, "Copied audio file to managed storage");
        Ok(unique)
    }

    /// `name.ext`, then `name_1.ext`, `name_2.ext`, ... until unused
    fn unique_name(&self, file_name: &str) -> String {
        if !self.root.join(file_name).exists() {
            return file_name.to_string();
        }

        let path = Path::new(file_name);
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        (1u32..)
            .map(|n| format!("{stem}_{n}{extension}"))
            .find(|candidate| !self.root.join(candidate).exists())
            .unwrap_or_else(|| file_name.to_string())
    }
}

impl ClipResolver for AudioLibrary {
    fn resolve(&self, file_name: &str) -> Option<PathBuf> {
        if file_name.trim().is_empty() {
            return None;
        }
        let path = self.path_for(file_name);
        if path.is_file() {
            Some(path)
        } else {
            warn!(path = %path.display(), "Managed audio file not found");
            None
        }
    }
}
