use std::error::Error;
use std::fmt;

use serde::Serialize;

use crate::config::{Config, ConfigError};
use crate::domain::book::{BookRecord, CurrentPosition};
use crate::domain::chapter::{ChapterRecord, Direction};
use crate::imports::{ImportError, ImportService, ImportSummary};
use crate::navigation::{advance, Advance};
use crate::numbering::NumberingPatterns;
use crate::store::{ImportRun, Store, StoreError};

pub struct App {
    store: Store,
    patterns: NumberingPatterns,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BookView {
    #[serde(flatten)]
    pub book: BookRecord,
    pub position: Option<CurrentPosition>,
}

/// A chapter row without its body.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChapterListing {
    pub index: usize,
    pub id: String,
    pub title: String,
    pub has_summary: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StepView {
    pub moved: bool,
    pub direction: &'static str,
    pub chapter: ChapterRecord,
}

impl App {
    pub fn open(db_path: &str, config: &Config) -> Result<Self, AppError> {
        ensure_parent_dir(db_path)?;
        let patterns = config.numbering_patterns()?;
        tracing::debug!(labels = patterns.len(), "compiled numbering labels");
        let store = Store::open(db_path)?;
        Ok(Self { store, patterns })
    }

    pub fn import_file(&mut self, path: &str) -> Result<ImportSummary, AppError> {
        let summary = ImportService::new(&mut self.store, &self.patterns).import_file(path)?;
        Ok(summary)
    }

    pub fn books(&self) -> Result<Vec<BookRecord>, AppError> {
        Ok(self.store.get_all_books()?)
    }

    pub fn show_book(&self, book_id: &str) -> Result<BookView, AppError> {
        let book = self.require_book(book_id)?;
        let position = self.store.get_current_position(book_id)?;
        Ok(BookView { book, position })
    }

    pub fn chapters(&self, book_id: &str) -> Result<Vec<ChapterListing>, AppError> {
        self.require_book(book_id)?;
        let chapters = self.store.list_chapters_for_book(book_id)?;
        Ok(chapters
            .into_iter()
            .enumerate()
            .map(|(index, chapter)| ChapterListing {
                index: index + 1,
                has_summary: chapter.has_summary(),
                id: chapter.self_id,
                title: chapter.title,
            })
            .collect())
    }

    pub fn chapter(&self, book_id: &str, chapter_id: &str) -> Result<ChapterRecord, AppError> {
        self.store
            .get_chapter(book_id, chapter_id)?
            .ok_or_else(|| AppError::NotFound(format!("chapter '{}' in book '{}'", chapter_id, book_id)))
    }

    pub fn save_summary(
        &mut self,
        book_id: &str,
        chapter_id: &str,
        text: &str,
    ) -> Result<ChapterRecord, AppError> {
        if text.trim().is_empty() {
            return Err(AppError::InvalidArgument(
                "summary text must not be empty".to_string(),
            ));
        }
        self.store.save_chapter_summary(book_id, chapter_id, text)?;
        self.chapter(book_id, chapter_id)
    }

    pub fn position(&self, book_id: &str) -> Result<Option<CurrentPosition>, AppError> {
        Ok(self.store.get_current_position(book_id)?)
    }

    /// Moves the position to a chapter that must already be stored.
    pub fn goto(&mut self, book_id: &str, chapter_id: &str) -> Result<CurrentPosition, AppError> {
        let chapter = self.chapter(book_id, chapter_id)?;
        let title = Some(chapter.title.as_str()).filter(|title| !title.trim().is_empty());
        Ok(self
            .store
            .set_current_position(book_id, &chapter.self_id, title)?)
    }

    pub fn step(&mut self, book_id: &str, direction: Direction) -> Result<StepView, AppError> {
        let position = self.store.get_current_position(book_id)?.ok_or_else(|| {
            AppError::InvalidArgument(format!(
                "book '{}' has no reading position; use `goto` first",
                book_id
            ))
        })?;
        let current = self.chapter(book_id, &position.chapter_id)?;

        let view = match advance(&mut self.store, &self.patterns, book_id, &current, direction)? {
            Advance::Moved(chapter) => StepView {
                moved: true,
                direction: direction.as_str(),
                chapter,
            },
            Advance::Stay => StepView {
                moved: false,
                direction: direction.as_str(),
                chapter: current,
            },
        };
        Ok(view)
    }

    pub fn complete(&mut self, book_id: &str) -> Result<BookRecord, AppError> {
        self.store
            .mark_completed(book_id)?
            .ok_or_else(|| book_not_found(book_id))
    }

    pub fn uncomplete(&mut self, book_id: &str) -> Result<BookRecord, AppError> {
        self.store
            .unmark_completed(book_id)?
            .ok_or_else(|| book_not_found(book_id))
    }

    pub fn remove(&mut self, book_id: &str) -> Result<bool, AppError> {
        Ok(self.store.remove_book(book_id)?)
    }

    pub fn history(&self, book_id: &str) -> Result<Vec<ImportRun>, AppError> {
        self.require_book(book_id)?;
        Ok(self.store.list_import_runs(book_id)?)
    }

    fn require_book(&self, book_id: &str) -> Result<BookRecord, AppError> {
        self.store
            .get_book(book_id)?
            .ok_or_else(|| book_not_found(book_id))
    }
}

fn book_not_found(book_id: &str) -> AppError {
    AppError::NotFound(format!("book '{}'", book_id))
}

fn ensure_parent_dir(path: &str) -> Result<(), AppError> {
    if let Some(parent) = std::path::Path::new(path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[derive(Debug)]
pub enum AppError {
    Io(std::io::Error),
    Config(ConfigError),
    Store(StoreError),
    Import(ImportError),
    Logging(String),
    InvalidArgument(String),
    NotFound(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Io(err) => write!(f, "I/O error: {}", err),
            AppError::Config(err) => write!(f, "{}", err),
            AppError::Store(err) => write!(f, "{}", err),
            AppError::Import(err) => write!(f, "import error: {}", err),
            AppError::Logging(message) => write!(f, "logging setup failed: {}", message),
            AppError::InvalidArgument(message) => write!(f, "{}", message),
            AppError::NotFound(what) => write!(f, "{} not found in library", what),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AppError::Io(err) => Some(err),
            AppError::Config(err) => Some(err),
            AppError::Store(err) => Some(err),
            AppError::Import(err) => Some(err),
            AppError::Logging(_) => None,
            AppError::InvalidArgument(_) => None,
            AppError::NotFound(_) => None,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        AppError::Io(value)
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        AppError::Config(value)
    }
}

impl From<ImportError> for AppError {
    fn from(value: ImportError) -> Self {
        AppError::Import(value)
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::ChapterNotFound {
                book_id,
                chapter_id,
            } => AppError::NotFound(format!("chapter '{}' in book '{}'", chapter_id, book_id)),
            other => AppError::Store(other),
        }
    }
}
