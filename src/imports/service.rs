use std::collections::HashSet;

use serde::Serialize;

use crate::linearize::{linearize, ChapterSequence, HeadRule};
use crate::numbering::NumberingPatterns;
use crate::store::{SaveOutcome, Store};

use super::errors::ImportError;
use super::source::{read_payload, SourcePayload};

pub struct ImportService<'a> {
    store: &'a mut Store,
    patterns: &'a NumberingPatterns,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ImportSummary {
    pub book_id: String,
    pub title: String,
    pub chapters: usize,
    pub head_rule: HeadRule,
    pub chained: usize,
    pub orphaned: usize,
    pub discarded: usize,
    #[serde(flatten)]
    pub saved: SaveOutcome,
}

impl<'a> ImportService<'a> {
    pub fn new(store: &'a mut Store, patterns: &'a NumberingPatterns) -> Self {
        Self { store, patterns }
    }

    pub fn import_file(&mut self, path: &str) -> Result<ImportSummary, ImportError> {
        let payload = read_payload(path)?;
        self.import_payload(payload)
    }

    /// Orders the payload's chapters and hands them to the store. Nothing is
    /// written unless the payload parsed.
    pub fn import_payload(&mut self, payload: SourcePayload) -> Result<ImportSummary, ImportError> {
        let SourcePayload { book, chapters } = payload;
        let sequence = linearize(chapters, self.patterns);
        let keyed = sequence
            .chapters
            .iter()
            .filter(|chapter| chapter.has_self_id())
            .map(|chapter| chapter.self_id.as_str())
            .collect::<HashSet<_>>()
            .len();
        let book = book.into_record(keyed);

        let saved = self.store.save_book(&book, &sequence.chapters)?;
        if sequence.orphaned > 0 {
            tracing::info!(
                book_id = %book.id,
                orphaned = sequence.orphaned,
                "appended chapters unreachable from the head"
            );
        }

        Ok(ImportSummary {
            book_id: book.id,
            title: book.title,
            chapters: sequence.chapters.len(),
            head_rule: sequence.head_rule,
            chained: sequence.chained,
            orphaned: sequence.orphaned,
            discarded: sequence.discarded,
            saved,
        })
    }
}

/// Linearizes without touching the store.
pub fn plan_order(payload: SourcePayload, patterns: &NumberingPatterns) -> ChapterSequence {
    linearize(payload.chapters, patterns)
}
