//! Icon resolution against a bundled local library
//!
//! Icons never come from the network. A library directory is indexed once by
//! file stem, and each slot's query terms are tried in order, most specific
//! first. An exact stem match anywhere in the term list beats a substring
//! match.

use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

use crate::error::AssetError;

const ICON_EXTENSIONS: [&str; 2] = ["png", "svg"];

/// Index over a directory of icon files
pub struct IconLibrary {
    entries: Vec<IconEntry>,
}

struct IconEntry {
    stem: String,
    path: Utf8PathBuf,
}

impl IconLibrary {
    /// Index the given directory
    ///
    /// Only `.png` and `.svg` files are indexed; subdirectories are not
    /// descended into.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::Io` when the directory cannot be read.
    pub fn open(dir: &Utf8Path) -> Result<Self, AssetError> {
        let mut entries = Vec::new();
        for entry in dir.read_dir_utf8()? {
            let entry = entry?;
            let path = entry.path();
            let is_icon = path
                .extension()
                .is_some_and(|ext| ICON_EXTENSIONS.contains(&ext));
            if !is_icon {
                continue;
            }
            if let Some(stem) = path.file_stem() {
                entries.push(IconEntry {
                    stem: stem.to_lowercase(),
                    path: path.to_path_buf(),
                });
            }
        }
        debug!(dir = %dir, icons = entries.len(), "Indexed icon library");
        Ok(Self { entries })
    }

    /// Number of indexed icons
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a query term list to an icon path
    ///
    /// Terms are tried in order. All exact stem matches are preferred over
    /// any substring match, so a generic later term cannot shadow a specific
    /// earlier one.
    #[must_use]
    pub fn resolve(&self, terms: &[String]) -> Option<&Utf8PathBuf> {
        for term in terms {
            let needle = term.to_lowercase();
            if let Some(entry) = self.entries.iter().find(|e| e.stem == needle) {
                return Some(&entry.path);
            }
        }
        for term in terms {
            let needle = term.to_lowercase();
            if needle.is_empty() {
                continue;
            }
            if let Some(entry) = self
                .entries
                .iter()
                .find(|e| e.stem.contains(&needle) || needle.contains(&e.stem))
            {
                return Some(&entry.path);
            }
        }
        None
    }
}
