//! Folder/note use-case service.
//!
//! # Responsibility
//! - Validate folder/note writes before they reach storage.
//! - Expose search with the blank-query short-circuit at the API boundary.

use super::{require_text, ServiceError, ServiceResult};
use crate::model::notes::{
    Folder, FolderPatch, NewFolder, NewNote, Note, NoteFilter, NoteLink, NotePatch, NoteStats,
    NoteTag,
};
use crate::repo::note_repo::NoteRepository;
use crate::repo::RepoResult;
use crate::search::query::normalize_search_query;

/// Note service facade over repository implementations.
pub struct NoteService<R: NoteRepository> {
    repo: R,
}

impl<R: NoteRepository> NoteService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn list_folders(&self) -> RepoResult<Vec<Folder>> {
        self.repo.list_folders()
    }

    pub fn get_folder(&self, id: &str) -> RepoResult<Option<Folder>> {
        self.repo.get_folder(id)
    }

    pub fn create_folder(&self, folder: NewFolder) -> ServiceResult<Folder> {
        let folder = NewFolder {
            name: require_text(&folder.name, "name")?,
            ..folder
        };
        Ok(self.repo.create_folder(&folder)?)
    }

    pub fn update_folder(&self, id: &str, patch: &FolderPatch) -> RepoResult<Option<Folder>> {
        self.repo.update_folder(id, patch)
    }

    /// Deletes the folder together with every note inside it.
    pub fn delete_folder(&self, id: &str) -> RepoResult<bool> {
        self.repo.delete_folder(id)
    }

    pub fn list_notes(&self, filter: &NoteFilter) -> RepoResult<Vec<Note>> {
        self.repo.list_notes(filter)
    }

    pub fn recent_notes(&self, limit: u32) -> RepoResult<Vec<Note>> {
        self.repo.recent_notes(limit)
    }

    pub fn pinned_notes(&self) -> RepoResult<Vec<Note>> {
        self.repo.pinned_notes()
    }

    pub fn get_note(&self, id: &str) -> RepoResult<Option<Note>> {
        self.repo.get_note(id)
    }

    /// Creates a note; `content_plain` is derived from `content`.
    pub fn create_note(&self, note: NewNote) -> ServiceResult<Note> {
        let note = NewNote {
            title: require_text(&note.title, "title")?,
            ..note
        };
        Ok(self.repo.create_note(&note)?)
    }

    pub fn update_note(&self, id: &str, patch: &NotePatch) -> RepoResult<Option<Note>> {
        self.repo.update_note(id, patch)
    }

    pub fn delete_note(&self, id: &str) -> RepoResult<bool> {
        self.repo.delete_note(id)
    }

    /// Searches non-archived notes. Blank queries return no results without
    /// touching storage.
    pub fn search_notes(&self, query: &str) -> RepoResult<Vec<Note>> {
        match normalize_search_query(query) {
            Some(query) => self.repo.search_notes(query),
            None => Ok(Vec::new()),
        }
    }

    pub fn list_tags(&self) -> RepoResult<Vec<NoteTag>> {
        self.repo.list_tags()
    }

    pub fn create_tag(&self, name: &str, color: Option<&str>) -> ServiceResult<NoteTag> {
        let name = require_text(name, "name")?.to_lowercase();
        Ok(self.repo.create_tag(&name, color)?)
    }

    /// Replaces the note's tag set and returns the resulting tags, or `None`
    /// for an unknown note.
    pub fn set_note_tags(
        &self,
        note_id: &str,
        tags: &[String],
    ) -> ServiceResult<Option<Vec<NoteTag>>> {
        if tags.iter().any(|tag| tag.trim().is_empty()) {
            return Err(ServiceError::MissingField("tag"));
        }
        if !self.repo.set_note_tags(note_id, tags)? {
            return Ok(None);
        }
        Ok(Some(self.repo.list_note_tags(note_id)?))
    }

    pub fn link_notes(&self, source_note_id: &str, target_note_id: &str) -> RepoResult<NoteLink> {
        self.repo.link_notes(source_note_id, target_note_id)
    }

    pub fn list_links(&self, source_note_id: &str) -> RepoResult<Vec<NoteLink>> {
        self.repo.list_links(source_note_id)
    }

    pub fn stats(&self) -> RepoResult<NoteStats> {
        self.repo.stats()
    }
}
