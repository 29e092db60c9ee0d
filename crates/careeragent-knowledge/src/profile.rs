//! The profile owner's background documents

use crate::error::{KnowledgeError, KnowledgeResult};
use careeragent_core::ProfileConfig;
use std::path::Path;
use tracing::{info, warn};

/// Name, short summary and longer career document of the person the agent
/// speaks for. Immutable once loaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    pub summary: String,
    pub document: String,
}

impl Profile {
    pub fn new(name: impl Into<String>, summary: impl Into<String>, document: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            summary: summary.into(),
            document: document.into(),
        }
    }

    /// Read both profile files. Missing or blank files are an error so the
    /// process stops before it starts answering with no background. A
    /// document ending in `.pdf` has its text extracted page by page.
    pub fn load(config: &ProfileConfig) -> KnowledgeResult<Self> {
        let summary = read_required(&config.summary_path())?;
        let document_path = config.document_path();
        let document = if is_pdf(&document_path) {
            read_pdf(&document_path)?
        } else {
            read_required(&document_path)?
        };
        info!(
            "Loaded profile for {} (summary {} chars, document {} chars)",
            config.name,
            summary.len(),
            document.len()
        );
        Ok(Self::new(&config.name, summary, document))
    }
}

fn read_required(path: &Path) -> KnowledgeResult<String> {
    let text = std::fs::read_to_string(path).map_err(|source| KnowledgeError::ProfileMissing {
        path: path.to_path_buf(),
        source,
    })?;
    if text.trim().is_empty() {
        return Err(KnowledgeError::ProfileEmpty { path: path.to_path_buf() });
    }
    Ok(text)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

fn read_pdf(path: &Path) -> KnowledgeResult<String> {
    let bytes = std::fs::read(path).map_err(|source| KnowledgeError::ProfileMissing {
        path: path.to_path_buf(),
        source,
    })?;
    let doc = lopdf::Document::load_mem(&bytes).map_err(|e| KnowledgeError::ProfileUnreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut text = String::new();
    for page in doc.get_pages().keys() {
        match doc.extract_text(&[*page]) {
            Ok(page_text) => text.push_str(&page_text),
            Err(e) => warn!("{}: no text on page {}: {}", path.display(), page, e),
        }
    }
    if text.trim().is_empty() {
        return Err(KnowledgeError::ProfileEmpty { path: path.to_path_buf() });
    }
    Ok(text)
}
