use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum StoreError {
    Unavailable(rusqlite::Error),
    ChapterNotFound { book_id: String, chapter_id: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable(err) => write!(f, "storage unavailable: {}", err),
            StoreError::ChapterNotFound {
                book_id,
                chapter_id,
            } => write!(
                f,
                "chapter '{}' not found in book '{}'",
                chapter_id, book_id
            ),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StoreError::Unavailable(err) => Some(err),
            StoreError::ChapterNotFound { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        StoreError::Unavailable(value)
    }
}
