use std::time::Duration;

use rusqlite::{params, Connection, DatabaseName, OptionalExtension, Result, Row};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::domain::book::{BookRecord, CurrentPosition};
use crate::domain::chapter::ChapterRecord;

pub const CURRENT_SCHEMA_VERSION: i64 = 2;

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: [Migration; 2] = [
    Migration {
        version: 1,
        name: "library_schema_v1",
        sql: r#"
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS books (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    chapter_count INTEGER NOT NULL DEFAULT 0,
    cover_ref TEXT NOT NULL DEFAULT '',
    author_name TEXT NOT NULL DEFAULT '',
    last_read_at TEXT,
    completed_at TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS chapters (
    book_id TEXT NOT NULL,
    self_id TEXT NOT NULL,
    sort_order INTEGER NOT NULL,
    title TEXT NOT NULL,
    body TEXT NOT NULL,
    declared_next_id TEXT,
    declared_prev_id TEXT,
    summary TEXT,
    content_hash TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (book_id, self_id)
);

CREATE TABLE IF NOT EXISTS positions (
    book_id TEXT PRIMARY KEY,
    chapter_id TEXT NOT NULL,
    chapter_title TEXT,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_chapters_book_order ON chapters(book_id, sort_order);
CREATE INDEX IF NOT EXISTS idx_books_last_read_at ON books(last_read_at);
"#,
    },
    Migration {
        version: 2,
        name: "import_history_v1",
        sql: r#"
CREATE TABLE IF NOT EXISTS import_runs (
    run_id TEXT PRIMARY KEY,
    book_id TEXT NOT NULL,
    ran_at TEXT NOT NULL,
    chapter_count INTEGER NOT NULL DEFAULT 0,
    inserted_count INTEGER NOT NULL DEFAULT 0,
    updated_count INTEGER NOT NULL DEFAULT 0,
    unchanged_count INTEGER NOT NULL DEFAULT 0,
    retained_count INTEGER NOT NULL DEFAULT 0,
    preserved_summaries INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_import_runs_book_id ON import_runs(book_id, ran_at);
"#,
    },
];

pub fn open_connection(path: &str) -> Result<Connection> {
    let mut conn = Connection::open(path)?;
    configure_for_speed(&conn)?;
    apply_migrations(&mut conn)?;
    Ok(conn)
}

fn configure_for_speed(conn: &Connection) -> Result<()> {
    conn.pragma_update(None::<DatabaseName>, "journal_mode", "WAL")?;
    conn.pragma_update(None::<DatabaseName>, "synchronous", "NORMAL")?;
    conn.pragma_update(None::<DatabaseName>, "foreign_keys", "ON")?;
    conn.pragma_update(None::<DatabaseName>, "temp_store", "MEMORY")?;
    conn.pragma_update(None::<DatabaseName>, "busy_timeout", 5000i64)?;
    conn.busy_timeout(Duration::from_millis(5000))?;
    Ok(())
}

fn apply_migrations(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL
);
"#,
    )?;

    for migration in MIGRATIONS {
        let already_applied: Option<i64> = tx
            .query_row(
                "SELECT version FROM schema_migrations WHERE version = ?1",
                params![migration.version],
                |row| row.get(0),
            )
            .optional()?;

        if already_applied.is_some() {
            continue;
        }

        tracing::debug!(
            version = migration.version,
            name = migration.name,
            "applying migration"
        );
        tx.execute_batch(migration.sql)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
            params![migration.version, migration.name, now_utc_rfc3339()],
        )?;
    }

    tx.execute(
        r#"
INSERT INTO meta (key, value)
VALUES ('schema_version', ?1)
ON CONFLICT(key) DO UPDATE SET value = excluded.value
"#,
        params![CURRENT_SCHEMA_VERSION.to_string()],
    )?;

    tx.commit()
}

pub fn now_utc_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .expect("RFC3339 formatting for UTC timestamp should never fail")
}

pub fn get_meta(conn: &Connection, key: &str) -> Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM meta WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
}

const BOOK_COLUMNS: &str =
    "id, title, chapter_count, cover_ref, author_name, last_read_at, completed_at";

fn book_from_row(row: &Row<'_>) -> Result<BookRecord> {
    Ok(BookRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        chapter_count: row.get(2)?,
        cover_ref: row.get(3)?,
        author_name: row.get(4)?,
        last_read_at: row.get(5)?,
        completed_at: row.get(6)?,
    })
}

pub fn upsert_book(conn: &Connection, book: &BookRecord, now: &str) -> Result<()> {
    conn.execute(
        r#"
INSERT INTO books (
    id, title, chapter_count, cover_ref, author_name,
    last_read_at, completed_at, created_at, updated_at
)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
ON CONFLICT(id) DO UPDATE SET
    title = excluded.title,
    chapter_count = excluded.chapter_count,
    cover_ref = excluded.cover_ref,
    author_name = excluded.author_name,
    last_read_at = excluded.last_read_at,
    completed_at = excluded.completed_at,
    updated_at = excluded.updated_at
"#,
        params![
            book.id,
            book.title,
            book.chapter_count,
            book.cover_ref,
            book.author_name,
            book.last_read_at,
            book.completed_at,
            now
        ],
    )?;
    Ok(())
}

pub fn get_book(conn: &Connection, id: &str) -> Result<Option<BookRecord>> {
    conn.query_row(
        &format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?1"),
        params![id],
        book_from_row,
    )
    .optional()
}

/// Stamps are compared as instants; their fractional digits vary in width.
pub fn list_books(conn: &Connection) -> Result<Vec<BookRecord>> {
    let mut stmt = conn.prepare(&format!(
        r#"
SELECT {BOOK_COLUMNS}
FROM books
ORDER BY julianday(last_read_at) DESC NULLS LAST, title ASC, id ASC
"#
    ))?;

    let mut rows = stmt.query([])?;
    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        result.push(book_from_row(row)?);
    }
    Ok(result)
}

pub fn delete_book(conn: &Connection, id: &str) -> Result<usize> {
    conn.execute("DELETE FROM books WHERE id = ?1", params![id])
}

pub fn touch_book_last_read(conn: &Connection, id: &str, at: &str) -> Result<usize> {
    conn.execute(
        "UPDATE books SET last_read_at = ?2 WHERE id = ?1",
        params![id, at],
    )
}

/// Sets `completed_at` when `at` is given (keeping an earlier completion
/// time), clears it otherwise.
pub fn set_book_completed(conn: &Connection, id: &str, at: Option<&str>) -> Result<usize> {
    match at {
        Some(at) => conn.execute(
            "UPDATE books SET completed_at = COALESCE(completed_at, ?2) WHERE id = ?1",
            params![id, at],
        ),
        None => conn.execute(
            "UPDATE books SET completed_at = NULL WHERE id = ?1",
            params![id],
        ),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredChapter {
    pub sort_order: i64,
    pub content_hash: String,
    pub chapter: ChapterRecord,
}

pub struct UpsertChapter<'a> {
    pub book_id: &'a str,
    pub sort_order: i64,
    pub content_hash: &'a str,
    pub chapter: &'a ChapterRecord,
    pub updated_at: &'a str,
}

const CHAPTER_COLUMNS: &str = concat!(
    "sort_order, content_hash, self_id, title, body, ",
    "declared_next_id, declared_prev_id, summary"
);

fn chapter_from_row(row: &Row<'_>) -> Result<StoredChapter> {
    Ok(StoredChapter {
        sort_order: row.get(0)?,
        content_hash: row.get(1)?,
        chapter: ChapterRecord {
            self_id: row.get(2)?,
            title: row.get(3)?,
            body: row.get(4)?,
            declared_next_id: row.get(5)?,
            declared_prev_id: row.get(6)?,
            summary: row.get(7)?,
        },
    })
}

pub fn upsert_chapter(conn: &Connection, args: &UpsertChapter<'_>) -> Result<()> {
    conn.execute(
        r#"
INSERT INTO chapters (
    book_id, self_id, sort_order, title, body,
    declared_next_id, declared_prev_id, summary, content_hash, updated_at
)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
ON CONFLICT(book_id, self_id) DO UPDATE SET
    sort_order = excluded.sort_order,
    title = excluded.title,
    body = excluded.body,
    declared_next_id = excluded.declared_next_id,
    declared_prev_id = excluded.declared_prev_id,
    summary = excluded.summary,
    content_hash = excluded.content_hash,
    updated_at = excluded.updated_at
"#,
        params![
            args.book_id,
            args.chapter.self_id,
            args.sort_order,
            args.chapter.title,
            args.chapter.body,
            args.chapter.declared_next_id,
            args.chapter.declared_prev_id,
            args.chapter.summary,
            args.content_hash,
            args.updated_at
        ],
    )?;
    Ok(())
}

pub fn get_chapter(
    conn: &Connection,
    book_id: &str,
    self_id: &str,
) -> Result<Option<StoredChapter>> {
    conn.query_row(
        &format!("SELECT {CHAPTER_COLUMNS} FROM chapters WHERE book_id = ?1 AND self_id = ?2"),
        params![book_id, self_id],
        chapter_from_row,
    )
    .optional()
}

pub fn list_chapters(conn: &Connection, book_id: &str) -> Result<Vec<StoredChapter>> {
    let mut stmt = conn.prepare(&format!(
        r#"
SELECT {CHAPTER_COLUMNS}
FROM chapters
WHERE book_id = ?1
ORDER BY sort_order ASC, self_id ASC
"#
    ))?;

    let mut rows = stmt.query(params![book_id])?;
    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        result.push(chapter_from_row(row)?);
    }
    Ok(result)
}

pub fn set_chapter_sort_order(
    conn: &Connection,
    book_id: &str,
    self_id: &str,
    sort_order: i64,
) -> Result<usize> {
    conn.execute(
        "UPDATE chapters SET sort_order = ?3 WHERE book_id = ?1 AND self_id = ?2",
        params![book_id, self_id, sort_order],
    )
}

pub fn set_chapter_summary(
    conn: &Connection,
    book_id: &str,
    self_id: &str,
    summary: &str,
    updated_at: &str,
) -> Result<usize> {
    conn.execute(
        r#"
UPDATE chapters
SET summary = ?3, updated_at = ?4
WHERE book_id = ?1 AND self_id = ?2
"#,
        params![book_id, self_id, summary, updated_at],
    )
}

pub fn delete_chapters_for_book(conn: &Connection, book_id: &str) -> Result<usize> {
    conn.execute("DELETE FROM chapters WHERE book_id = ?1", params![book_id])
}

pub fn upsert_position(conn: &Connection, position: &CurrentPosition, at: &str) -> Result<()> {
    conn.execute(
        r#"
INSERT INTO positions (book_id, chapter_id, chapter_title, updated_at)
VALUES (?1, ?2, ?3, ?4)
ON CONFLICT(book_id) DO UPDATE SET
    chapter_id = excluded.chapter_id,
    chapter_title = excluded.chapter_title,
    updated_at = excluded.updated_at
"#,
        params![
            position.book_id,
            position.chapter_id,
            position.chapter_title,
            at
        ],
    )?;
    Ok(())
}

pub fn get_position(conn: &Connection, book_id: &str) -> Result<Option<CurrentPosition>> {
    conn.query_row(
        "SELECT book_id, chapter_id, chapter_title FROM positions WHERE book_id = ?1",
        params![book_id],
        |row| {
            Ok(CurrentPosition {
                book_id: row.get(0)?,
                chapter_id: row.get(1)?,
                chapter_title: row.get(2)?,
            })
        },
    )
    .optional()
}

pub fn delete_position(conn: &Connection, book_id: &str) -> Result<usize> {
    conn.execute("DELETE FROM positions WHERE book_id = ?1", params![book_id])
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRunRecord {
    pub run_id: String,
    pub book_id: String,
    pub ran_at: String,
    pub chapter_count: i64,
    pub inserted_count: i64,
    pub updated_count: i64,
    pub unchanged_count: i64,
    pub retained_count: i64,
    pub preserved_summaries: i64,
}

pub fn insert_import_run(conn: &Connection, run: &ImportRunRecord) -> Result<()> {
    conn.execute(
        concat!(
            "INSERT INTO import_runs (run_id, book_id, ran_at, chapter_count, inserted_count, ",
            "updated_count, unchanged_count, retained_count, preserved_summaries) ",
            "VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
        ),
        params![
            run.run_id,
            run.book_id,
            run.ran_at,
            run.chapter_count,
            run.inserted_count,
            run.updated_count,
            run.unchanged_count,
            run.retained_count,
            run.preserved_summaries
        ],
    )?;
    Ok(())
}

/// Oldest first; v7 run ids sort by creation time.
pub fn list_import_runs(conn: &Connection, book_id: &str) -> Result<Vec<ImportRunRecord>> {
    let mut stmt = conn.prepare(
        r#"
SELECT run_id, book_id, ran_at, chapter_count, inserted_count,
       updated_count, unchanged_count, retained_count, preserved_summaries
FROM import_runs
WHERE book_id = ?1
ORDER BY run_id ASC
"#,
    )?;

    let mut rows = stmt.query(params![book_id])?;
    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        result.push(ImportRunRecord {
            run_id: row.get(0)?,
            book_id: row.get(1)?,
            ran_at: row.get(2)?,
            chapter_count: row.get(3)?,
            inserted_count: row.get(4)?,
            updated_count: row.get(5)?,
            unchanged_count: row.get(6)?,
            retained_count: row.get(7)?,
            preserved_summaries: row.get(8)?,
        });
    }
    Ok(result)
}

pub fn delete_import_runs(conn: &Connection, book_id: &str) -> Result<usize> {
    conn.execute(
        "DELETE FROM import_runs WHERE book_id = ?1",
        params![book_id],
    )
}
