use ignore::WalkBuilder;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::VaultError;
use crate::host::NoteSource;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteEntry {
    /// File stem, used as the link target.
    pub title: String,
    pub path: PathBuf,
}

impl AsRef<str> for NoteEntry {
    fn as_ref(&self) -> &str {
        &self.title
    }
}

/// A directory of markdown notes.
#[derive(Debug, Clone)]
pub struct Vault {
    root: PathBuf,
    include_hidden: bool,
}

impl Vault {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, VaultError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(VaultError::NotFound(root));
        }

        Ok(Self {
            root,
            include_hidden: false,
        })
    }

    pub fn with_hidden(mut self, include_hidden: bool) -> Self {
        self.include_hidden = include_hidden;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All markdown notes, ordered by relative path, one entry per title.
    pub fn list_markdown_titles(&self) -> Result<Vec<NoteEntry>, VaultError> {
        if !self.root.is_dir() {
            return Err(VaultError::NotFound(self.root.clone()));
        }

        let mut files: Vec<PathBuf> = WalkBuilder::new(&self.root)
            .standard_filters(false)
            .hidden(!self.include_hidden)
            .build()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    tracing::warn!("skipping vault entry: {err}");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
            .map(|entry| entry.into_path())
            .filter(|path| is_markdown(path))
            .collect();

        files.sort_by_cached_key(|path| {
            path.strip_prefix(&self.root)
                .unwrap_or(path)
                .to_string_lossy()
                .to_lowercase()
        });

        let mut seen = HashSet::new();
        let notes = files
            .into_iter()
            .filter_map(|path| {
                let stem = path.file_stem()?;
                if stem.to_str().is_none() {
                    tracing::warn!("note name is not UTF-8, listing it lossily: {}", path.display());
                }
                let title = stem.to_string_lossy().into_owned();
                if !seen.insert(title.clone()) {
                    tracing::debug!("duplicate note title {title} at {}", path.display());
                    return None;
                }
                Some(NoteEntry { title, path })
            })
            .collect();

        Ok(notes)
    }
}

impl NoteSource for Vault {
    fn list_markdown_titles(&self) -> Result<Vec<NoteEntry>, VaultError> {
        Vault::list_markdown_titles(self)
    }
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
}
