//! In-memory editor state shared between a UI and the agent.
//!
//! The agent reads it to build the context snapshot prepended to each user
//! turn, and writes to it when a tool changes a file that is open.

use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::util::truncate_with_marker;

pub const CONTEXT_OPEN_TAG: &str = "<editor_context>";
pub const CONTEXT_CLOSE_TAG: &str = "</editor_context>";

/// Characters of the active file included in the snapshot.
pub const ACTIVE_CONTENT_LIMIT: usize = 8_000;

/// A file open in the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenDocument {
    pub path: PathBuf,
    pub content: String,
    /// Edited in the editor but not saved.
    #[serde(default)]
    pub dirty: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorState {
    pub active_path: Option<PathBuf>,
    pub documents: Vec<OpenDocument>,
}

impl EditorState {
    pub fn document(&self, path: &Path) -> Option<&OpenDocument> {
        self.documents.iter().find(|d| d.path == path)
    }

    pub fn active_document(&self) -> Option<&OpenDocument> {
        self.active_path.as_deref().and_then(|p| self.document(p))
    }

    /// Open (or refresh) a document and make it active.
    pub fn open(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) {
        let path = path.into();
        let content = content.into();
        match self.documents.iter_mut().find(|d| d.path == path) {
            Some(doc) => {
                doc.content = content;
                doc.dirty = false;
            }
            None => self.documents.push(OpenDocument {
                path: path.clone(),
                content,
                dirty: false,
            }),
        }
        self.active_path = Some(path);
    }

    pub fn close(&mut self, path: &Path) {
        self.documents.retain(|d| d.path != path);
        if self.active_path.as_deref() == Some(path) {
            self.active_path = self.documents.last().map(|d| d.path.clone());
        }
    }

    /// Replace the buffer of an open document after the file changed on disk.
    ///
    /// Returns whether a document was open for `path`.
    pub fn mirror_write(&mut self, path: &Path, content: &str) -> bool {
        match self.documents.iter_mut().find(|d| d.path == path) {
            Some(doc) => {
                doc.content = content.to_string();
                doc.dirty = false;
                true
            }
            None => false,
        }
    }
}

/// Cloneable handle to editor state.
#[derive(Debug, Clone, Default)]
pub struct SharedEditorState(Arc<RwLock<EditorState>>);

impl SharedEditorState {
    pub fn new(state: EditorState) -> Self {
        Self(Arc::new(RwLock::new(state)))
    }

    pub fn snapshot(&self) -> EditorState {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn update<T>(&self, f: impl FnOnce(&mut EditorState) -> T) -> T {
        let mut guard = self.0.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    pub fn mirror_write(&self, path: &Path, content: &str) -> bool {
        let mirrored = self.update(|state| state.mirror_write(path, content));
        if mirrored {
            tracing::debug!(path = %path.display(), "mirrored write into open document");
        }
        mirrored
    }
}

/// Serialize the editor state into a tagged block for the current user turn.
///
/// Returns `None` when nothing is open.
pub fn render_context_block(state: &EditorState) -> Option<String> {
    if state.active_path.is_none() && state.documents.is_empty() {
        return None;
    }

    let mut block = String::from(CONTEXT_OPEN_TAG);
    block.push('\n');
    if let Some(active) = &state.active_path {
        block.push_str(&format!("Active file: {}\n", active.display()));
        if let Some(doc) = state.active_document() {
            let marker = if doc.dirty { " (unsaved changes)" } else { "" };
            block.push_str(&format!(
                "Active file content{marker}:\n```\n{}\n```\n",
                truncate_with_marker(&doc.content, ACTIVE_CONTENT_LIMIT)
            ));
        }
    }
    if !state.documents.is_empty() {
        block.push_str("Open files:\n");
        for doc in &state.documents {
            block.push_str(&format!("- {}\n", doc.path.display()));
        }
    }
    block.push_str(CONTEXT_CLOSE_TAG);
    Some(block)
}

static CONTEXT_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<editor_context>.*?</editor_context>\s*").expect("context block regex must compile")
});

/// Remove every editor context block from a message.
pub fn strip_context_block(text: &str) -> String {
    CONTEXT_BLOCK_RE.replace_all(text, "").to_string()
}

/// Prefix a user message with the editor context block, if there is one.
pub fn with_context(message: &str, state: &EditorState) -> String {
    match render_context_block(state) {
        Some(block) => format!("{block}\n\n{message}"),
        None => message.to_string(),
    }
}
