//! Note records: folders, notes, tags and links.

use super::RecordId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: RecordId,
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub parent_id: Option<RecordId>,
    pub sort_order: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewFolder {
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub parent_id: Option<RecordId>,
}

/// Partial folder update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderPatch {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub parent_id: Option<RecordId>,
    pub sort_order: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: RecordId,
    pub folder_id: Option<RecordId>,
    pub title: String,
    /// Raw markup source.
    pub content: String,
    /// Markup characters stripped from `content`; used for search and preview.
    pub content_plain: String,
    pub is_pinned: bool,
    pub is_archived: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewNote {
    pub title: String,
    /// Defaults to the empty string.
    pub content: Option<String>,
    pub folder_id: Option<RecordId>,
}

impl NewNote {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }
}

/// Partial note update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotePatch {
    pub title: Option<String>,
    /// When present, `content_plain` is recomputed.
    pub content: Option<String>,
    pub folder_id: Option<RecordId>,
    pub is_pinned: Option<bool>,
    pub is_archived: Option<bool>,
}

/// Conjunctive note filter; omitted fields do not constrain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteFilter {
    pub folder_id: Option<RecordId>,
    pub is_pinned: Option<bool>,
    pub is_archived: Option<bool>,
    /// Defaults to 100.
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteTag {
    pub id: RecordId,
    pub name: String,
    pub color: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteLink {
    pub id: RecordId,
    pub source_note_id: RecordId,
    pub target_note_id: RecordId,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteStats {
    pub total_notes: usize,
    pub pinned_notes: usize,
    pub archived_notes: usize,
    pub total_folders: usize,
}
