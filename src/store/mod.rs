mod errors;
mod merge;

use std::collections::{HashMap, HashSet};

use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

use crate::db::{self, ImportRunRecord, UpsertChapter};
use crate::domain::book::{BookRecord, CurrentPosition};
use crate::domain::chapter::ChapterRecord;

pub use errors::StoreError;
pub use merge::{content_fingerprint, merge_book, merge_chapter};

/// Library persistence over one SQLite connection. Multi-row writes each run
/// in a single transaction.
pub struct Store {
    conn: Connection,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SaveOutcome {
    pub run_id: String,
    pub inserted: u64,
    pub updated: u64,
    pub unchanged: u64,
    /// Stored chapters missing from this save, kept after the incoming ones.
    pub retained: u64,
    pub preserved_summaries: u64,
    /// Incoming records that could not be keyed (blank or repeated self id).
    pub skipped: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ImportRun {
    pub run_id: String,
    pub ran_at: String,
    pub chapter_count: i64,
    pub inserted: i64,
    pub updated: i64,
    pub unchanged: i64,
    pub retained: i64,
    pub preserved_summaries: i64,
}

impl From<ImportRunRecord> for ImportRun {
    fn from(value: ImportRunRecord) -> Self {
        Self {
            run_id: value.run_id,
            ran_at: value.ran_at,
            chapter_count: value.chapter_count,
            inserted: value.inserted_count,
            updated: value.updated_count,
            unchanged: value.unchanged_count,
            retained: value.retained_count,
            preserved_summaries: value.preserved_summaries,
        }
    }
}

impl Store {
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = db::open_connection(path)?;
        let schema_version = db::get_meta(&conn, "schema_version")?;
        tracing::debug!(path, schema_version = ?schema_version, "opened library");
        Ok(Self { conn })
    }

    /// Writes the book and its chapters in reading order, merging in any
    /// derived state already stored under the same keys.
    pub fn save_book(
        &mut self,
        book: &BookRecord,
        chapters: &[ChapterRecord],
    ) -> Result<SaveOutcome, StoreError> {
        let now = db::now_utc_rfc3339();
        let tx = self.conn.transaction()?;

        let existing_book = db::get_book(&tx, &book.id)?;
        let merged_book = merge_book(existing_book.as_ref(), book.clone());
        db::upsert_book(&tx, &merged_book, &now)?;

        let existing = db::list_chapters(&tx, &book.id)?;
        let mut existing_by_id = existing
            .iter()
            .map(|stored| (stored.chapter.self_id.as_str(), stored))
            .collect::<HashMap<_, _>>();

        let mut outcome = SaveOutcome {
            run_id: Uuid::now_v7().to_string(),
            inserted: 0,
            updated: 0,
            unchanged: 0,
            retained: 0,
            preserved_summaries: 0,
            skipped: 0,
        };
        let mut seen = HashSet::new();
        let mut next_order = 0i64;

        for incoming in chapters {
            if !incoming.has_self_id() || !seen.insert(incoming.self_id.as_str()) {
                outcome.skipped += 1;
                continue;
            }

            let previous = existing_by_id.remove(incoming.self_id.as_str());
            let merged = merge_chapter(previous.map(|stored| &stored.chapter), incoming.clone());
            let content_hash = content_fingerprint(&merged);

            match previous {
                None => outcome.inserted += 1,
                Some(stored) => {
                    if stored.content_hash == content_hash {
                        outcome.unchanged += 1;
                    } else {
                        outcome.updated += 1;
                    }
                    if stored.chapter.has_summary() {
                        outcome.preserved_summaries += 1;
                        tracing::debug!(
                            book_id = %book.id,
                            chapter_id = %merged.self_id,
                            "kept stored summary over re-imported chapter"
                        );
                    }
                }
            }

            db::upsert_chapter(
                &tx,
                &UpsertChapter {
                    book_id: &book.id,
                    sort_order: next_order,
                    content_hash: &content_hash,
                    chapter: &merged,
                    updated_at: &now,
                },
            )?;
            next_order += 1;
        }

        // Leftovers keep their previous relative order behind the new sequence.
        let mut stale = existing_by_id.into_values().collect::<Vec<_>>();
        stale.sort_by_key(|stored| stored.sort_order);
        for stored in stale {
            db::set_chapter_sort_order(&tx, &book.id, &stored.chapter.self_id, next_order)?;
            next_order += 1;
            outcome.retained += 1;
        }

        db::insert_import_run(
            &tx,
            &ImportRunRecord {
                run_id: outcome.run_id.clone(),
                book_id: book.id.clone(),
                ran_at: now.clone(),
                chapter_count: next_order,
                inserted_count: outcome.inserted as i64,
                updated_count: outcome.updated as i64,
                unchanged_count: outcome.unchanged as i64,
                retained_count: outcome.retained as i64,
                preserved_summaries: outcome.preserved_summaries as i64,
            },
        )?;
        tx.commit()?;

        tracing::info!(
            book_id = %book.id,
            inserted = outcome.inserted,
            updated = outcome.updated,
            unchanged = outcome.unchanged,
            retained = outcome.retained,
            preserved_summaries = outcome.preserved_summaries,
            "saved book"
        );
        Ok(outcome)
    }

    pub fn get_book(&self, id: &str) -> Result<Option<BookRecord>, StoreError> {
        Ok(db::get_book(&self.conn, id)?)
    }

    /// Most recently read first.
    pub fn get_all_books(&self) -> Result<Vec<BookRecord>, StoreError> {
        Ok(db::list_books(&self.conn)?)
    }

    /// Deletes the book with its chapters, position and import history.
    /// Returns whether a book record existed; removing an unknown id is a
    /// no-op.
    pub fn remove_book(&mut self, id: &str) -> Result<bool, StoreError> {
        let tx = self.conn.transaction()?;
        let books = db::delete_book(&tx, id)?;
        let chapters = db::delete_chapters_for_book(&tx, id)?;
        db::delete_position(&tx, id)?;
        db::delete_import_runs(&tx, id)?;
        tx.commit()?;

        if books > 0 || chapters > 0 {
            tracing::info!(book_id = %id, chapters, "removed book");
        }
        Ok(books > 0)
    }

    pub fn list_chapters_for_book(&self, book_id: &str) -> Result<Vec<ChapterRecord>, StoreError> {
        let stored = db::list_chapters(&self.conn, book_id)?;
        Ok(stored.into_iter().map(|stored| stored.chapter).collect())
    }

    pub fn get_chapter(
        &self,
        book_id: &str,
        chapter_id: &str,
    ) -> Result<Option<ChapterRecord>, StoreError> {
        let stored = db::get_chapter(&self.conn, book_id, chapter_id)?;
        Ok(stored.map(|stored| stored.chapter))
    }

    /// The only path that replaces a stored summary.
    pub fn save_chapter_summary(
        &mut self,
        book_id: &str,
        chapter_id: &str,
        text: &str,
    ) -> Result<(), StoreError> {
        let updated = db::set_chapter_summary(
            &self.conn,
            book_id,
            chapter_id,
            text,
            &db::now_utc_rfc3339(),
        )?;
        if updated == 0 {
            return Err(StoreError::ChapterNotFound {
                book_id: book_id.to_string(),
                chapter_id: chapter_id.to_string(),
            });
        }
        Ok(())
    }

    pub fn get_current_position(
        &self,
        book_id: &str,
    ) -> Result<Option<CurrentPosition>, StoreError> {
        Ok(db::get_position(&self.conn, book_id)?)
    }

    /// Overwrites the book's position and stamps the book as read now.
    pub fn set_current_position(
        &mut self,
        book_id: &str,
        chapter_id: &str,
        chapter_title: Option<&str>,
    ) -> Result<CurrentPosition, StoreError> {
        let position = CurrentPosition {
            book_id: book_id.to_string(),
            chapter_id: chapter_id.to_string(),
            chapter_title: chapter_title.map(str::to_string),
        };
        let now = db::now_utc_rfc3339();

        let tx = self.conn.transaction()?;
        db::upsert_position(&tx, &position, &now)?;
        db::touch_book_last_read(&tx, book_id, &now)?;
        tx.commit()?;

        Ok(position)
    }

    /// Returns the updated book, or `None` when the id is unknown.
    pub fn mark_completed(&mut self, book_id: &str) -> Result<Option<BookRecord>, StoreError> {
        let now = db::now_utc_rfc3339();
        self.set_completed(book_id, Some(&now))
    }

    pub fn unmark_completed(&mut self, book_id: &str) -> Result<Option<BookRecord>, StoreError> {
        self.set_completed(book_id, None)
    }

    fn set_completed(
        &mut self,
        book_id: &str,
        at: Option<&str>,
    ) -> Result<Option<BookRecord>, StoreError> {
        if db::set_book_completed(&self.conn, book_id, at)? == 0 {
            return Ok(None);
        }
        self.get_book(book_id)
    }

    pub fn list_import_runs(&self, book_id: &str) -> Result<Vec<ImportRun>, StoreError> {
        let runs = db::list_import_runs(&self.conn, book_id)?;
        Ok(runs.into_iter().map(ImportRun::from).collect())
    }
}
