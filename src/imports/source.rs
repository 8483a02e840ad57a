use std::io::Read;

use serde::Deserialize;

use crate::domain::book::BookRecord;
use crate::domain::chapter::ChapterRecord;

use super::errors::ImportError;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceBook {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub chapter_count: Option<u32>,
    #[serde(default)]
    pub cover_ref: String,
    #[serde(default, alias = "author")]
    pub author_name: String,
}

impl SourceBook {
    /// User state starts empty; the store merges any recorded state back in.
    pub fn into_record(self, fallback_chapter_count: usize) -> BookRecord {
        BookRecord {
            chapter_count: self
                .chapter_count
                .unwrap_or_else(|| u32::try_from(fallback_chapter_count).unwrap_or(u32::MAX)),
            id: self.id.trim().to_string(),
            title: self.title,
            cover_ref: self.cover_ref,
            author_name: self.author_name,
            last_read_at: None,
            completed_at: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourcePayload {
    pub book: SourceBook,
    #[serde(default)]
    pub chapters: Vec<ChapterRecord>,
}

pub fn parse_payload(raw: &str) -> Result<SourcePayload, ImportError> {
    let payload: SourcePayload = serde_json::from_str(raw)
        .map_err(|err| ImportError::MalformedInput(format!("invalid payload JSON: {}", err)))?;
    if payload.book.id.trim().is_empty() {
        return Err(ImportError::MalformedInput(
            "book id must not be empty".to_string(),
        ));
    }
    Ok(payload)
}

/// Reads a payload from `path`, or from stdin when `path` is `-`.
pub fn read_payload(path: &str) -> Result<SourcePayload, ImportError> {
    let raw = if path == "-" {
        let mut raw = String::new();
        std::io::stdin().read_to_string(&mut raw)?;
        raw
    } else {
        std::fs::read_to_string(path)?
    };
    parse_payload(&raw)
}
