use serde::Serialize;

use crate::domain::chapter::ChapterRecord;
use crate::numbering::NumberingPatterns;
use crate::resolver::{MatchKind, ResolutionSession};

/// Which heuristic picked the first chapter of the reading order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadRule {
    NoPrevPointer,
    DanglingPrevPointer,
    NeverNamedAsNext,
    InputOrder,
    Unordered,
}

impl HeadRule {
    pub fn as_str(self) -> &'static str {
        match self {
            HeadRule::NoPrevPointer => "no_prev_pointer",
            HeadRule::DanglingPrevPointer => "dangling_prev_pointer",
            HeadRule::NeverNamedAsNext => "never_named_as_next",
            HeadRule::InputOrder => "input_order",
            HeadRule::Unordered => "unordered",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterSequence {
    pub chapters: Vec<ChapterRecord>,
    pub head_rule: HeadRule,
    /// Chapters placed by following next pointers from the head.
    pub chained: usize,
    /// Chapters appended after traversal stopped.
    pub orphaned: usize,
    /// Records dropped for lacking a self id.
    pub discarded: usize,
}

impl ChapterSequence {
    pub fn ids(&self) -> Vec<&str> {
        self.chapters
            .iter()
            .map(|chapter| chapter.self_id.as_str())
            .collect()
    }
}

/// Rebuilds reading order from per-chapter next/prev pointers. Never fails:
/// cycles truncate the chain and unreachable chapters are appended in their
/// input order.
pub fn linearize(chapters: Vec<ChapterRecord>, patterns: &NumberingPatterns) -> ChapterSequence {
    let (valid, discarded): (Vec<_>, Vec<_>) =
        chapters.into_iter().partition(ChapterRecord::has_self_id);

    if valid.is_empty() {
        if !discarded.is_empty() {
            tracing::warn!(
                count = discarded.len(),
                "no chapter carries a self id; keeping input order"
            );
        }
        return ChapterSequence {
            chapters: discarded,
            head_rule: HeadRule::Unordered,
            chained: 0,
            orphaned: 0,
            discarded: 0,
        };
    }
    if !discarded.is_empty() {
        tracing::warn!(
            count = discarded.len(),
            "dropping chapters without a self id"
        );
    }

    let (order, head_rule, chained) = {
        let mut session = ResolutionSession::new(&valid, patterns);
        let (head, head_rule) = select_head(&mut session);

        let mut placed = vec![false; valid.len()];
        let mut order = Vec::with_capacity(valid.len());
        placed[head] = true;
        order.push(head);

        let mut current = head;
        while let Some(next) = session.resolve_index(valid[current].declared_next()) {
            if placed[next.index] {
                tracing::debug!(
                    from = %valid[current].self_id,
                    to = %valid[next.index].self_id,
                    "next pointer revisits a placed chapter; truncating chain"
                );
                break;
            }
            if next.kind != MatchKind::Exact {
                tracing::debug!(
                    from = %valid[current].self_id,
                    to = %valid[next.index].self_id,
                    strategy = next.kind.as_str(),
                    "followed next pointer by fallback match"
                );
            }
            placed[next.index] = true;
            order.push(next.index);
            current = next.index;
        }

        let chained = order.len();
        for (index, was_placed) in placed.iter().enumerate() {
            if !was_placed {
                order.push(index);
            }
        }
        (order, head_rule, chained)
    };

    let orphaned = order.len() - chained;
    tracing::debug!(
        head = %valid[order[0]].self_id,
        head_rule = head_rule.as_str(),
        chained,
        orphaned,
        "linearized chapters"
    );

    let mut slots = valid.into_iter().map(Some).collect::<Vec<_>>();
    let chapters = order
        .into_iter()
        .filter_map(|index| slots[index].take())
        .collect();

    ChapterSequence {
        chapters,
        head_rule,
        chained,
        orphaned,
        discarded: discarded.len(),
    }
}

fn select_head(session: &mut ResolutionSession<'_>) -> (usize, HeadRule) {
    let chapters = session.chapters();

    if let Some(index) = chapters
        .iter()
        .position(|chapter| chapter.declared_prev().is_none())
    {
        return (index, HeadRule::NoPrevPointer);
    }

    for (index, chapter) in chapters.iter().enumerate() {
        if session.resolve_index(chapter.declared_prev()).is_none() {
            return (index, HeadRule::DanglingPrevPointer);
        }
    }

    let mut named = vec![false; chapters.len()];
    for (index, chapter) in chapters.iter().enumerate() {
        if let Some(target) = session.resolve_index(chapter.declared_next()) {
            if target.index != index {
                named[target.index] = true;
            }
        }
    }
    if let Some(index) = named.iter().position(|was_named| !was_named) {
        return (index, HeadRule::NeverNamedAsNext);
    }

    (0, HeadRule::InputOrder)
}

#[cfg(test)]
mod tests;
