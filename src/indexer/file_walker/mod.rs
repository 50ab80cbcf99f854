//! Directory traversal producing the document sequence for a source tree

use super::ast_parser::{AstParser, is_supported_extension};
use super::documents::build_documents;
use super::extract_elements;
use crate::error::{ChunkingError, IndexingError};
use crate::types::Document;
use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Documents of a whole tree plus the number of files that produced them
#[derive(Debug, Clone, Default)]
pub struct WalkOutput {
    /// Grouped by file in traversal order, identifiers before functions
    pub documents: Vec<Document>,
    pub files_read: usize,
}

pub struct FileWalker {
    pub(crate) root: PathBuf,
    pub(crate) extensions: Vec<String>,
    pub(crate) private_prefix: String,
    pub(crate) skip_unreadable: bool,
}

impl FileWalker {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            extensions: vec!["py".to_string()],
            private_prefix: "__".to_string(),
            skip_unreadable: false,
        }
    }

    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    /// Names starting with this prefix are neither descended into nor read
    pub fn with_private_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.private_prefix = prefix.into();
        self
    }

    /// Log and skip files that cannot be read as UTF-8 instead of failing the walk
    pub fn with_skip_unreadable(mut self, skip: bool) -> Self {
        self.skip_unreadable = skip;
        self
    }

    fn is_private(prefix: &str, name: &str) -> bool {
        !prefix.is_empty() && name.starts_with(prefix)
    }

    pub(crate) fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|allowed| allowed == ext))
    }

    fn check_root(&self) -> Result<()> {
        if !self.root.exists() {
            return Err(IndexingError::DirectoryNotFound(self.root.display().to_string()).into());
        }
        if !self.root.is_dir() {
            return Err(IndexingError::NotADirectory(self.root.display().to_string()).into());
        }
        Ok(())
    }

    /// List the files that would be read, in traversal order.
    ///
    /// Within a directory files come before subdirectories, each sorted by name.
    pub fn source_files(&self) -> Result<Vec<PathBuf>> {
        self.check_root()?;

        let prefix = self.private_prefix.clone();
        let walker = WalkDir::new(&self.root)
            .sort_by(|a, b| {
                a.file_type()
                    .is_dir()
                    .cmp(&b.file_type().is_dir())
                    .then_with(|| a.file_name().cmp(b.file_name()))
            })
            .into_iter()
            .filter_entry(move |entry| {
                entry.depth() == 0
                    || !(entry.file_type().is_dir()
                        && Self::is_private(&prefix, &entry.file_name().to_string_lossy()))
            });

        let mut files = Vec::new();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if self.skip_unreadable => {
                    tracing::warn!("Skipping unreadable directory entry: {}", e);
                    continue;
                }
                Err(e) => return Err(IndexingError::WalkFailed(e.to_string()).into()),
            };

            if !Self::is_source_file(&entry) {
                continue;
            }
            if Self::is_private(&self.private_prefix, &entry.file_name().to_string_lossy()) {
                tracing::debug!("Skipping private file: {}", entry.path().display());
                continue;
            }
            if !self.matches_extension(entry.path()) {
                continue;
            }

            files.push(entry.into_path());
        }

        Ok(files)
    }

    fn is_source_file(entry: &DirEntry) -> bool {
        entry.file_type().is_file() || (entry.path_is_symlink() && entry.path().is_file())
    }

    /// Walk the tree, extracting identifier and function documents from every file
    pub fn walk(&self) -> Result<WalkOutput> {
        if let Some(ext) = self.extensions.iter().find(|e| !is_supported_extension(e)) {
            return Err(ChunkingError::UnsupportedLanguage(ext.clone()).into());
        }

        let files = self.source_files()?;
        let mut parser = AstParser::python()?;
        let mut output = WalkOutput::default();

        for path in files {
            tracing::info!("Reading file: {}", path.display());

            let content = match Self::read_source(&path) {
                Ok(content) => content,
                Err(reason) if self.skip_unreadable => {
                    tracing::warn!("Skipping unreadable file {}: {}", path.display(), reason);
                    continue;
                }
                Err(reason) => {
                    return Err(IndexingError::FileReadFailed {
                        file: path.display().to_string(),
                        reason,
                    }
                    .into());
                }
            };

            let elements = extract_elements(&mut parser, &content);
            let file = self.display_path(&path);
            output.documents.extend(build_documents(&file, elements));
            output.files_read += 1;
        }

        tracing::info!(
            "Extracted {} documents from {} files",
            output.documents.len(),
            output.files_read
        );
        Ok(output)
    }

    fn read_source(path: &Path) -> std::result::Result<String, String> {
        let bytes = fs::read(path).map_err(|e| e.to_string())?;
        String::from_utf8(bytes).map_err(|e| format!("not valid UTF-8: {}", e))
    }

    /// Path recorded in document metadata, relative to the walk root
    pub(crate) fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .to_string()
    }
}
