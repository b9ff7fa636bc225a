use nooma_core::db::open_db_in_memory;
use nooma_core::model::notes::{NewFolder, NewNote, NoteFilter, NotePatch};
use nooma_core::{NoteService, ServiceError, SqliteNoteRepository};
use rusqlite::Connection;

fn service(conn: &Connection) -> NoteService<SqliteNoteRepository<'_>> {
    NoteService::new(SqliteNoteRepository::try_new(conn).unwrap())
}

fn folder(name: &str, parent_id: Option<String>) -> NewFolder {
    NewFolder {
        name: name.to_string(),
        parent_id,
        ..NewFolder::default()
    }
}

fn count(conn: &Connection, sql: &str) -> i64 {
    conn.query_row(sql, [], |row| row.get(0)).unwrap()
}

#[test]
fn create_note_derives_plain_content() {
    let conn = open_db_in_memory().unwrap();
    let note = service(&conn)
        .create_note(NewNote::new("Greeting").with_content("# Hello *world*"))
        .unwrap();

    assert_eq!(note.content, "# Hello *world*");
    assert_eq!(note.content_plain, "Hello world");
    assert!(!note.is_pinned);
    assert!(!note.is_archived);
}

#[test]
fn create_note_without_content_stores_empty_strings() {
    let conn = open_db_in_memory().unwrap();
    let note = service(&conn).create_note(NewNote::new("Empty")).unwrap();
    assert_eq!(note.content, "");
    assert_eq!(note.content_plain, "");

    let err = service(&conn).create_note(NewNote::new(" ")).unwrap_err();
    assert!(matches!(err, ServiceError::MissingField("title")));
}

#[test]
fn update_note_recomputes_plain_content_only_when_content_changes() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let note = service
        .create_note(NewNote::new("Draft").with_content("**bold**"))
        .unwrap();

    let renamed = service
        .update_note(
            &note.id,
            &NotePatch {
                title: Some("Final".to_string()),
                ..NotePatch::default()
            },
        )
        .unwrap()
        .unwrap();
    assert_eq!(renamed.title, "Final");
    assert_eq!(renamed.content_plain, "bold");

    let rewritten = service
        .update_note(
            &note.id,
            &NotePatch {
                content: Some("~~gone~~ `code`".to_string()),
                ..NotePatch::default()
            },
        )
        .unwrap()
        .unwrap();
    assert_eq!(rewritten.content_plain, "gone code");

    assert!(service
        .update_note("missing", &NotePatch::default())
        .unwrap()
        .is_none());
}

#[test]
fn search_matches_title_or_plain_content_and_skips_archived() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let note = service
        .create_note(NewNote::new("Greeting").with_content("# Hello *world*"))
        .unwrap();
    service
        .create_note(NewNote::new("World tour").with_content("plans"))
        .unwrap();
    service
        .create_note(NewNote::new("Groceries").with_content("milk"))
        .unwrap();

    assert_eq!(service.search_notes("world").unwrap().len(), 2);
    assert_eq!(service.search_notes("  hello world ").unwrap().len(), 1);

    service
        .update_note(
            &note.id,
            &NotePatch {
                is_archived: Some(true),
                ..NotePatch::default()
            },
        )
        .unwrap();
    let hits = service.search_notes("hello").unwrap();
    assert!(hits.is_empty());
}

#[test]
fn search_treats_wildcards_literally_and_ignores_blank_queries() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let percent = service
        .create_note(NewNote::new("Progress").with_content("100% done"))
        .unwrap();
    service
        .create_note(NewNote::new("snake_case names").with_content("plain"))
        .unwrap();
    service.create_note(NewNote::new("Other")).unwrap();

    let hits = service.search_notes("%").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, percent.id);
    assert_eq!(service.search_notes("_").unwrap().len(), 1);
    assert!(service.search_notes("   ").unwrap().is_empty());
    assert!(service.search_notes("").unwrap().is_empty());
}

#[test]
fn search_is_capped_at_fifty_results() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    for index in 0..55 {
        service
            .create_note(NewNote::new(format!("match {index}")))
            .unwrap();
    }
    assert_eq!(service.search_notes("match").unwrap().len(), 50);
}

#[test]
fn pinned_notes_sort_first() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let first = service.create_note(NewNote::new("first")).unwrap();
    let second = service.create_note(NewNote::new("second")).unwrap();
    let third = service.create_note(NewNote::new("third")).unwrap();
    service
        .update_note(
            &first.id,
            &NotePatch {
                is_pinned: Some(true),
                ..NotePatch::default()
            },
        )
        .unwrap();

    let ids: Vec<_> = service
        .list_notes(&NoteFilter::default())
        .unwrap()
        .into_iter()
        .map(|note| note.id)
        .collect();
    assert_eq!(ids, vec![first.id.clone(), third.id, second.id]);

    let pinned = service.pinned_notes().unwrap();
    assert_eq!(pinned.len(), 1);
    assert_eq!(pinned[0].id, first.id);
}

#[test]
fn recent_notes_exclude_archived_and_respect_limit() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let archived = service.create_note(NewNote::new("old")).unwrap();
    service
        .update_note(
            &archived.id,
            &NotePatch {
                is_archived: Some(true),
                ..NotePatch::default()
            },
        )
        .unwrap();
    for title in ["a", "b", "c"] {
        service.create_note(NewNote::new(title)).unwrap();
    }

    let recent = service.recent_notes(2).unwrap();
    let titles: Vec<_> = recent.iter().map(|note| note.title.as_str()).collect();
    assert_eq!(titles, vec!["c", "b"]);
}

#[test]
fn deleting_folder_removes_its_notes_and_lifts_subfolders() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let parent = service.create_folder(folder("Work", None)).unwrap();
    let child = service
        .create_folder(folder("Meetings", Some(parent.id.clone())))
        .unwrap();
    let inside = service
        .create_note(NewNote {
            folder_id: Some(parent.id.clone()),
            ..NewNote::new("inside")
        })
        .unwrap();
    let outside = service.create_note(NewNote::new("outside")).unwrap();

    assert!(service.delete_folder(&parent.id).unwrap());
    assert!(service.get_folder(&parent.id).unwrap().is_none());
    assert!(service.get_note(&inside.id).unwrap().is_none());
    assert!(service.get_note(&outside.id).unwrap().is_some());
    let child = service.get_folder(&child.id).unwrap().unwrap();
    assert!(child.parent_id.is_none());
    assert!(!service.delete_folder(&parent.id).unwrap());
}

#[test]
fn note_tags_and_links_are_cleaned_up_on_delete() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let source = service.create_note(NewNote::new("source")).unwrap();
    let target = service.create_note(NewNote::new("target")).unwrap();

    let tags = service
        .set_note_tags(&source.id, &["Ideas".to_string(), "ideas".to_string()])
        .unwrap()
        .unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].name, "ideas");

    let link = service.link_notes(&source.id, &target.id).unwrap();
    assert_eq!(service.list_links(&source.id).unwrap(), vec![link]);

    assert!(service.delete_note(&target.id).unwrap());
    assert!(service.list_links(&source.id).unwrap().is_empty());
    assert!(service.delete_note(&source.id).unwrap());
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM notes_to_tags;"), 0);
    assert_eq!(service.list_tags().unwrap().len(), 1);
}

#[test]
fn stats_count_pinned_archived_and_folders() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    service.create_folder(folder("Inbox", None)).unwrap();
    let pinned = service.create_note(NewNote::new("pinned")).unwrap();
    let archived = service.create_note(NewNote::new("archived")).unwrap();
    service.create_note(NewNote::new("plain")).unwrap();
    service
        .update_note(
            &pinned.id,
            &NotePatch {
                is_pinned: Some(true),
                ..NotePatch::default()
            },
        )
        .unwrap();
    service
        .update_note(
            &archived.id,
            &NotePatch {
                is_archived: Some(true),
                ..NotePatch::default()
            },
        )
        .unwrap();

    let stats = service.stats().unwrap();
    assert_eq!(stats.total_notes, 3);
    assert_eq!(stats.pinned_notes, 1);
    assert_eq!(stats.archived_notes, 1);
    assert_eq!(stats.total_folders, 1);
}
