use sha2::{Digest, Sha256};

use crate::domain::book::BookRecord;
use crate::domain::chapter::ChapterRecord;

/// Incoming book data wins, except for user state already recorded locally.
pub fn merge_book(existing: Option<&BookRecord>, incoming: BookRecord) -> BookRecord {
    let Some(existing) = existing else {
        return incoming;
    };
    BookRecord {
        last_read_at: keep_existing(existing.last_read_at.as_ref(), incoming.last_read_at),
        completed_at: keep_existing(existing.completed_at.as_ref(), incoming.completed_at),
        ..incoming
    }
}

/// Incoming chapter content wins; a stored non-empty summary is never
/// replaced by a re-import.
pub fn merge_chapter(existing: Option<&ChapterRecord>, incoming: ChapterRecord) -> ChapterRecord {
    let Some(existing) = existing else {
        return incoming;
    };
    ChapterRecord {
        summary: keep_existing(existing.summary.as_ref(), incoming.summary),
        ..incoming
    }
}

fn keep_existing(existing: Option<&String>, incoming: Option<String>) -> Option<String> {
    match existing {
        Some(value) if !value.trim().is_empty() => Some(value.clone()),
        _ => incoming,
    }
}

/// Fingerprint of the scraped content only; derived fields are excluded so
/// attaching a summary does not make a chapter look changed.
pub fn content_fingerprint(chapter: &ChapterRecord) -> String {
    let mut hasher = Sha256::new();
    for part in [
        chapter.title.as_str(),
        chapter.body.as_str(),
        chapter.declared_next_id.as_deref().unwrap_or(""),
        chapter.declared_prev_id.as_deref().unwrap_or(""),
    ] {
        hasher.update(part.as_bytes());
        hasher.update([0x1f]);
    }
    format!("{:x}", hasher.finalize())
}
