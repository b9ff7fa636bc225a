//! Folder/note repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over folders and notes.
//! - Keep `content_plain` in sync with `content` on every write.
//! - Own tag-set replacement and note links.
//!
//! # Invariants
//! - Folders are listed by `sort_order ASC, name ASC`.
//! - Note lists put pinned notes first, then most recently updated.
//! - Search only sees non-archived notes and never runs for blank queries.
//! - Deleting a folder deletes its notes first, in one transaction.
//! - Deleting a note removes its tag links and note links with it.

use super::common::{
    ensure_tables, int_to_bool, load_required, new_record_id, query_all, query_one, Assignments,
    RepoResult, NOW_SQL,
};
use super::task_repo::{normalize_tags, to_count};
use crate::model::notes::{
    Folder, FolderPatch, NewFolder, NewNote, Note, NoteFilter, NoteLink, NotePatch, NoteStats,
    NoteTag,
};
use crate::search::plain_text::strip_markup;
use crate::search::query::{like_contains_pattern, normalize_search_query};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

/// Default cap applied by [`NoteRepository::list_notes`].
pub const NOTES_DEFAULT_LIMIT: u32 = 100;
/// Maximum rows returned by [`NoteRepository::search_notes`].
pub const SEARCH_LIMIT: u32 = 50;

const FOLDER_SELECT_SQL: &str = "SELECT
    id,
    name,
    icon,
    color,
    parent_id,
    sort_order,
    created_at,
    updated_at
FROM folders";

const NOTE_SELECT_SQL: &str = "SELECT
    id,
    folder_id,
    title,
    content,
    content_plain,
    is_pinned,
    is_archived,
    created_at,
    updated_at
FROM notes";

const TAG_SELECT_SQL: &str = "SELECT id, name, color, created_at FROM note_tags";

const LINK_SELECT_SQL: &str = "SELECT
    id,
    source_note_id,
    target_note_id,
    created_at
FROM note_links";

/// Repository interface for folders, notes, tags and links.
pub trait NoteRepository {
    fn list_folders(&self) -> RepoResult<Vec<Folder>>;
    fn get_folder(&self, id: &str) -> RepoResult<Option<Folder>>;
    fn create_folder(&self, folder: &NewFolder) -> RepoResult<Folder>;
    fn update_folder(&self, id: &str, patch: &FolderPatch) -> RepoResult<Option<Folder>>;
    /// Deletes the folder and every note in it. Sub-folders move to the root.
    fn delete_folder(&self, id: &str) -> RepoResult<bool>;

    fn list_notes(&self, filter: &NoteFilter) -> RepoResult<Vec<Note>>;
    /// Non-archived notes, most recently updated first.
    fn recent_notes(&self, limit: u32) -> RepoResult<Vec<Note>>;
    /// Pinned, non-archived notes, most recently updated first.
    fn pinned_notes(&self) -> RepoResult<Vec<Note>>;
    fn get_note(&self, id: &str) -> RepoResult<Option<Note>>;
    fn create_note(&self, note: &NewNote) -> RepoResult<Note>;
    fn update_note(&self, id: &str, patch: &NotePatch) -> RepoResult<Option<Note>>;
    fn delete_note(&self, id: &str) -> RepoResult<bool>;
    /// Substring search over title and plain text of non-archived notes.
    fn search_notes(&self, query: &str) -> RepoResult<Vec<Note>>;

    fn list_tags(&self) -> RepoResult<Vec<NoteTag>>;
    fn create_tag(&self, name: &str, color: Option<&str>) -> RepoResult<NoteTag>;
    fn list_note_tags(&self, note_id: &str) -> RepoResult<Vec<NoteTag>>;
    /// Replaces the full tag set of a note. Returns `false` for unknown notes.
    fn set_note_tags(&self, note_id: &str, tags: &[String]) -> RepoResult<bool>;

    fn link_notes(&self, source_note_id: &str, target_note_id: &str) -> RepoResult<NoteLink>;
    /// Outgoing links of one note.
    fn list_links(&self, source_note_id: &str) -> RepoResult<Vec<NoteLink>>;

    fn stats(&self) -> RepoResult<NoteStats>;
}

/// SQLite-backed note repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(
            conn,
            &["folders", "notes", "note_tags", "notes_to_tags", "note_links"],
        )?;
        Ok(Self { conn })
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn list_folders(&self) -> RepoResult<Vec<Folder>> {
        query_all(
            self.conn,
            &format!("{FOLDER_SELECT_SQL} ORDER BY sort_order ASC, name ASC, rowid ASC;"),
            Vec::new(),
            parse_folder_row,
        )
    }

    fn get_folder(&self, id: &str) -> RepoResult<Option<Folder>> {
        query_one(
            self.conn,
            &format!("{FOLDER_SELECT_SQL} WHERE id = ?1;"),
            id,
            parse_folder_row,
        )
    }

    fn create_folder(&self, folder: &NewFolder) -> RepoResult<Folder> {
        let id = new_record_id();
        self.conn.execute(
            "INSERT INTO folders (id, name, icon, color, parent_id)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![id, folder.name, folder.icon, folder.color, folder.parent_id],
        )?;
        load_required(self.get_folder(&id)?, "folders", &id)
    }

    fn update_folder(&self, id: &str, patch: &FolderPatch) -> RepoResult<Option<Folder>> {
        let changed = Assignments::default()
            .text("name", patch.name.as_deref())
            .text("icon", patch.icon.as_deref())
            .text("color", patch.color.as_deref())
            .text("parent_id", patch.parent_id.as_deref())
            .integer("sort_order", patch.sort_order)
            .execute(self.conn, "folders", id)?;
        if changed == 0 {
            return Ok(None);
        }
        self.get_folder(id)
    }

    fn delete_folder(&self, id: &str) -> RepoResult<bool> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        // Tag and link rows go with the notes via ON DELETE CASCADE.
        let removed_notes = tx.execute("DELETE FROM notes WHERE folder_id = ?1;", [id])?;
        tx.execute(
            &format!(
                "UPDATE folders SET parent_id = NULL, updated_at = {NOW_SQL} WHERE parent_id = ?1;"
            ),
            [id],
        )?;
        let changed = tx.execute("DELETE FROM folders WHERE id = ?1;", [id])?;
        tx.commit()?;

        debug!(
            "event=folder_delete module=repo status=ok found={} removed_notes={}",
            changed > 0,
            removed_notes
        );
        Ok(changed > 0)
    }

    fn list_notes(&self, filter: &NoteFilter) -> RepoResult<Vec<Note>> {
        let mut sql = format!("{NOTE_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(folder_id) = filter.folder_id.as_ref() {
            sql.push_str(" AND folder_id = ?");
            bind_values.push(Value::Text(folder_id.clone()));
        }
        if let Some(is_pinned) = filter.is_pinned {
            sql.push_str(" AND is_pinned = ?");
            bind_values.push(Value::Integer(i64::from(is_pinned)));
        }
        if let Some(is_archived) = filter.is_archived {
            sql.push_str(" AND is_archived = ?");
            bind_values.push(Value::Integer(i64::from(is_archived)));
        }

        sql.push_str(" ORDER BY is_pinned DESC, updated_at DESC, rowid DESC LIMIT ?");
        bind_values.push(Value::Integer(i64::from(normalize_note_limit(filter.limit))));
        query_all(self.conn, &sql, bind_values, parse_note_row)
    }

    fn recent_notes(&self, limit: u32) -> RepoResult<Vec<Note>> {
        query_all(
            self.conn,
            &format!(
                "{NOTE_SELECT_SQL}
                 WHERE is_archived = 0
                 ORDER BY updated_at DESC, rowid DESC
                 LIMIT ?;"
            ),
            vec![Value::Integer(i64::from(limit))],
            parse_note_row,
        )
    }

    fn pinned_notes(&self) -> RepoResult<Vec<Note>> {
        query_all(
            self.conn,
            &format!(
                "{NOTE_SELECT_SQL}
                 WHERE is_pinned = 1 AND is_archived = 0
                 ORDER BY updated_at DESC, rowid DESC;"
            ),
            Vec::new(),
            parse_note_row,
        )
    }

    fn get_note(&self, id: &str) -> RepoResult<Option<Note>> {
        query_one(
            self.conn,
            &format!("{NOTE_SELECT_SQL} WHERE id = ?1;"),
            id,
            parse_note_row,
        )
    }

    fn create_note(&self, note: &NewNote) -> RepoResult<Note> {
        let id = new_record_id();
        let content = note.content.as_deref().unwrap_or_default();
        self.conn.execute(
            "INSERT INTO notes (id, folder_id, title, content, content_plain)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![id, note.folder_id, note.title, content, strip_markup(content)],
        )?;
        load_required(self.get_note(&id)?, "notes", &id)
    }

    fn update_note(&self, id: &str, patch: &NotePatch) -> RepoResult<Option<Note>> {
        let content_plain = patch.content.as_deref().map(strip_markup);
        let changed = Assignments::default()
            .text("title", patch.title.as_deref())
            .text("content", patch.content.as_deref())
            .text("content_plain", content_plain.as_deref())
            .text("folder_id", patch.folder_id.as_deref())
            .flag("is_pinned", patch.is_pinned)
            .flag("is_archived", patch.is_archived)
            .execute(self.conn, "notes", id)?;
        if changed == 0 {
            return Ok(None);
        }
        self.get_note(id)
    }

    fn delete_note(&self, id: &str) -> RepoResult<bool> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute("DELETE FROM notes_to_tags WHERE note_id = ?1;", [id])?;
        tx.execute(
            "DELETE FROM note_links WHERE source_note_id = ?1 OR target_note_id = ?1;",
            [id],
        )?;
        let changed = tx.execute("DELETE FROM notes WHERE id = ?1;", [id])?;
        tx.commit()?;
        Ok(changed > 0)
    }

    fn search_notes(&self, query: &str) -> RepoResult<Vec<Note>> {
        let Some(query) = normalize_search_query(query) else {
            return Ok(Vec::new());
        };

        let pattern = like_contains_pattern(query);
        query_all(
            self.conn,
            &format!(
                "{NOTE_SELECT_SQL}
                 WHERE is_archived = 0
                   AND (
                     title LIKE ?1 ESCAPE '\\'
                     OR content_plain LIKE ?1 ESCAPE '\\'
                   )
                 ORDER BY updated_at DESC, rowid DESC
                 LIMIT ?2;"
            ),
            vec![Value::Text(pattern), Value::Integer(i64::from(SEARCH_LIMIT))],
            parse_note_row,
        )
    }

    fn list_tags(&self) -> RepoResult<Vec<NoteTag>> {
        query_all(
            self.conn,
            &format!("{TAG_SELECT_SQL} ORDER BY name COLLATE NOCASE ASC;"),
            Vec::new(),
            parse_tag_row,
        )
    }

    fn create_tag(&self, name: &str, color: Option<&str>) -> RepoResult<NoteTag> {
        let id = new_record_id();
        self.conn.execute(
            "INSERT INTO note_tags (id, name, color) VALUES (?1, ?2, ?3);",
            params![id, name, color],
        )?;
        let loaded = query_one(
            self.conn,
            &format!("{TAG_SELECT_SQL} WHERE id = ?1;"),
            &id,
            parse_tag_row,
        )?;
        load_required(loaded, "note_tags", &id)
    }

    fn list_note_tags(&self, note_id: &str) -> RepoResult<Vec<NoteTag>> {
        query_all(
            self.conn,
            "SELECT t.id AS id, t.name AS name, t.color AS color, t.created_at AS created_at
             FROM notes_to_tags nt
             INNER JOIN note_tags t ON t.id = nt.tag_id
             WHERE nt.note_id = ?
             ORDER BY t.name COLLATE NOCASE ASC;",
            vec![Value::Text(note_id.to_string())],
            parse_tag_row,
        )
    }

    fn set_note_tags(&self, note_id: &str, tags: &[String]) -> RepoResult<bool> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let exists: i64 = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM notes WHERE id = ?1);",
            [note_id],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Ok(false);
        }

        tx.execute("DELETE FROM notes_to_tags WHERE note_id = ?1;", [note_id])?;
        for tag in normalize_tags(tags) {
            tx.execute(
                "INSERT OR IGNORE INTO note_tags (id, name) VALUES (?1, ?2);",
                params![new_record_id(), tag],
            )?;
            tx.execute(
                "INSERT OR IGNORE INTO notes_to_tags (note_id, tag_id)
                 SELECT ?1, id
                 FROM note_tags
                 WHERE name = ?2 COLLATE NOCASE;",
                params![note_id, tag],
            )?;
        }
        tx.execute(
            &format!("UPDATE notes SET updated_at = {NOW_SQL} WHERE id = ?1;"),
            [note_id],
        )?;

        tx.commit()?;
        Ok(true)
    }

    fn link_notes(&self, source_note_id: &str, target_note_id: &str) -> RepoResult<NoteLink> {
        let id = new_record_id();
        self.conn.execute(
            "INSERT INTO note_links (id, source_note_id, target_note_id) VALUES (?1, ?2, ?3);",
            params![id, source_note_id, target_note_id],
        )?;
        let loaded = query_one(
            self.conn,
            &format!("{LINK_SELECT_SQL} WHERE id = ?1;"),
            &id,
            parse_link_row,
        )?;
        load_required(loaded, "note_links", &id)
    }

    fn list_links(&self, source_note_id: &str) -> RepoResult<Vec<NoteLink>> {
        query_all(
            self.conn,
            &format!(
                "{LINK_SELECT_SQL} WHERE source_note_id = ? ORDER BY created_at ASC, rowid ASC;"
            ),
            vec![Value::Text(source_note_id.to_string())],
            parse_link_row,
        )
    }

    fn stats(&self) -> RepoResult<NoteStats> {
        let (total_notes, pinned_notes, archived_notes): (i64, i64, i64) = self.conn.query_row(
            "SELECT
                COUNT(*),
                COALESCE(SUM(is_pinned = 1), 0),
                COALESCE(SUM(is_archived = 1), 0)
             FROM notes;",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;
        let total_folders: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM folders;", [], |row| row.get(0))?;

        Ok(NoteStats {
            total_notes: to_count(total_notes),
            pinned_notes: to_count(pinned_notes),
            archived_notes: to_count(archived_notes),
            total_folders: to_count(total_folders),
        })
    }
}

/// Normalizes the note list cap. `None` and `0` mean the default.
pub fn normalize_note_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) | None => NOTES_DEFAULT_LIMIT,
        Some(value) => value,
    }
}

fn parse_folder_row(row: &Row<'_>) -> RepoResult<Folder> {
    Ok(Folder {
        id: row.get("id")?,
        name: row.get("name")?,
        icon: row.get("icon")?,
        color: row.get("color")?,
        parent_id: row.get("parent_id")?,
        sort_order: row.get("sort_order")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_note_row(row: &Row<'_>) -> RepoResult<Note> {
    Ok(Note {
        id: row.get("id")?,
        folder_id: row.get("folder_id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        content_plain: row.get("content_plain")?,
        is_pinned: int_to_bool(row.get("is_pinned")?, "notes.is_pinned")?,
        is_archived: int_to_bool(row.get("is_archived")?, "notes.is_archived")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_tag_row(row: &Row<'_>) -> RepoResult<NoteTag> {
    Ok(NoteTag {
        id: row.get("id")?,
        name: row.get("name")?,
        color: row.get("color")?,
        created_at: row.get("created_at")?,
    })
}

fn parse_link_row(row: &Row<'_>) -> RepoResult<NoteLink> {
    Ok(NoteLink {
        id: row.get("id")?,
        source_note_id: row.get("source_note_id")?,
        target_note_id: row.get("target_note_id")?,
        created_at: row.get("created_at")?,
    })
}
