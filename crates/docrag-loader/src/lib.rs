//! docrag-loader
//!
//! Reads `.txt`, `.md` and `.docx` documents from disk and hands their
//! raw text to the chunking and indexing pipeline. Batch loads skip
//! individual failures instead of aborting the whole directory.

pub mod docx;

use anyhow::{Context, Result};
use docrag_core::error::Error;
use docrag_core::types::SourceInfo;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const SUPPORTED_EXTENSIONS: [&str; 3] = ["txt", "md", "docx"];

/// One loaded document, ready for chunking.
#[derive(Debug, Clone)]
pub struct Document {
    pub content: String,
    pub filename: String,
    pub extension: String,
    pub path: PathBuf,
}

impl Document {
    /// The metadata carried into the vector store for every chunk of
    /// this document.
    pub fn source_info(&self) -> SourceInfo {
        let mut info = SourceInfo::new();
        info.insert("filename".to_string(), self.filename.clone());
        info.insert("extension".to_string(), self.extension.clone());
        info.insert("file_path".to_string(), self.path.to_string_lossy().to_string());
        info
    }
}

#[derive(Debug, Default)]
pub struct DocumentLoader;

impl DocumentLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load a single document, failing with
    /// [`Error::UnsupportedFormat`] for anything but the supported
    /// extensions.
    pub fn load(&self, path: &Path) -> Result<Document> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(Error::UnsupportedFormat(format!(".{extension}")).into());
        }

        let content = match extension.as_str() {
            // Markdown is read as plain text.
            "txt" | "md" => read_text(path)?,
            "docx" => docx::extract_text(path)?,
            _ => unreachable!("extension filtered above"),
        };

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        Ok(Document {
            content,
            filename,
            extension: format!(".{extension}"),
            path: path.to_path_buf(),
        })
    }

    /// Load every supported document under `dir`, in sorted order.
    /// Files that fail to load individually are logged and skipped.
    pub fn load_directory(&self, dir: &Path) -> Result<Vec<Document>> {
        let mut paths: Vec<PathBuf> = walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path().to_path_buf())
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .map(str::to_lowercase)
                    .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
            })
            .collect();
        paths.sort();

        let mut documents = Vec::new();
        for path in paths {
            match self.load(&path) {
                Ok(doc) => documents.push(doc),
                Err(e) => warn!("skipping {}: {e:#}", path.display()),
            }
        }
        info!("loaded {} documents from {}", documents.len(), dir.display());
        Ok(documents)
    }
}

/// Read a file as UTF-8, falling back to a lossy conversion for files
/// with stray bytes.
fn read_text(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(_) => {
            let bytes = fs::read(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            Ok(String::from_utf8_lossy(&bytes).to_string())
        }
    }
}
