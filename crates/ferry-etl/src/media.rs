//! Media file resolution
//!
//! File fields hold paths relative to a media root directory. They are
//! resolved by the loader right before a record reaches the store, so a
//! missing file fails that record only.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use crate::error::MediaError;
use ferry_common::checksum::sha256_file;

/// Directory against which file fields are resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRoot {
    root: PathBuf,
}

/// A file field resolved to an existing file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaFile {
    pub field: String,
    /// Normalized path relative to the media root
    pub relative_path: String,
    #[serde(skip)]
    pub path: PathBuf,
    pub size: u64,
    pub sha256: String,
}

impl MediaRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Resolve `relative` for `field`, fingerprinting the file
    pub fn resolve(&self, field: &str, relative: &str) -> Result<MediaFile, MediaError> {
        let not_relative = || MediaError::NotRelative {
            field: field.to_string(),
            path: relative.to_string(),
        };

        let normalized = normalize(relative).ok_or_else(not_relative)?;
        let relative_path = normalized.to_string_lossy().replace('\\', "/");
        if relative_path.is_empty() || relative_path.starts_with('.') {
            return Err(not_relative());
        }

        let path = self.root.join(&normalized);
        if !path.is_file() {
            return Err(MediaError::NotFound {
                field: field.to_string(),
                path,
            });
        }

        let unreadable = |message: String| MediaError::Unreadable {
            field: field.to_string(),
            path: path.clone(),
            message,
        };
        let size = std::fs::metadata(&path)
            .map_err(|e| unreadable(e.to_string()))?
            .len();
        let sha256 = sha256_file(&path).map_err(|e| unreadable(e.to_string()))?;

        Ok(MediaFile {
            field: field.to_string(),
            relative_path,
            path,
            size,
            sha256,
        })
    }
}

/// Lexically normalize a relative path; `None` if it is absolute or climbs
/// out of its base.
fn normalize(relative: &str) -> Option<PathBuf> {
    let mut parts: Vec<&std::ffi::OsStr> = Vec::new();

    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => parts.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                parts.pop()?;
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    Some(parts.iter().collect())
}

/// Resolve every file field of a record that holds a path.
///
/// Records without file paths never need a media root.
pub fn resolve_files(
    root: Option<&MediaRoot>,
    files: &BTreeMap<String, Option<String>>,
) -> Result<Vec<MediaFile>, MediaError> {
    let mut paths = files
        .iter()
        .filter_map(|(field, path)| path.as_deref().map(|path| (field, path)))
        .peekable();

    let Some(&(first, _)) = paths.peek() else {
        return Ok(Vec::new());
    };

    let root = root.ok_or_else(|| MediaError::NoMediaRoot {
        field: first.clone(),
    })?;

    paths
        .map(|(field, relative)| root.resolve(field, relative))
        .collect()
}
