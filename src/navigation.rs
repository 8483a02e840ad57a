use crate::domain::chapter::{ChapterRecord, Direction};
use crate::numbering::NumberingPatterns;
use crate::resolver::ResolutionSession;
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Moved(ChapterRecord),
    Stay,
}

/// Follows the current chapter's pointer for `direction` and records the
/// target as the book's position. A missing pointer or an unresolvable one
/// yields `Advance::Stay`.
pub fn advance(
    store: &mut Store,
    patterns: &NumberingPatterns,
    book_id: &str,
    current: &ChapterRecord,
    direction: Direction,
) -> Result<Advance, StoreError> {
    let Some(pointer) = current.pointer(direction) else {
        return Ok(Advance::Stay);
    };

    let target = match store.get_chapter(book_id, pointer)? {
        Some(chapter) => Some(chapter),
        None => {
            let chapters = store.list_chapters_for_book(book_id)?;
            fallback_target(&chapters, patterns, current, pointer, direction).cloned()
        }
    };

    let Some(target) = target else {
        tracing::debug!(
            book_id,
            chapter_id = %current.self_id,
            direction = direction.as_str(),
            pointer,
            "no chapter matches pointer; staying put"
        );
        return Ok(Advance::Stay);
    };

    let title = Some(target.title.as_str()).filter(|title| !title.trim().is_empty());
    store.set_current_position(book_id, &target.self_id, title)?;
    Ok(Advance::Moved(target))
}

fn fallback_target<'a>(
    chapters: &'a [ChapterRecord],
    patterns: &'a NumberingPatterns,
    current: &ChapterRecord,
    pointer: &str,
    direction: Direction,
) -> Option<&'a ChapterRecord> {
    let mut session = ResolutionSession::new(chapters, patterns);
    if let Some(chapter) = session.resolve(Some(pointer)) {
        if chapter.self_id != current.self_id {
            tracing::debug!(pointer, chapter_id = %chapter.self_id, "resolved stale pointer");
            return Some(chapter);
        }
    }

    let number = patterns
        .extract(&current.self_id)
        .or_else(|| patterns.extract(&current.title))?;
    let wanted = match direction {
        Direction::Next => number.checked_add(1)?,
        Direction::Prev => number.checked_sub(1)?,
    };
    session.find_by_number(wanted).map(|index| &chapters[index])
}
