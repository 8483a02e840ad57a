use std::collections::HashMap;

use crate::canonical::CanonicalCache;
use crate::domain::chapter::ChapterRecord;
use crate::numbering::NumberingPatterns;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Canonical,
    NumericLabel,
}

impl MatchKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchKind::Exact => "exact",
            MatchKind::Canonical => "canonical",
            MatchKind::NumericLabel => "numeric_label",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    pub index: usize,
    pub kind: MatchKind,
}

type Strategy = fn(&mut ResolutionSession<'_>, &str) -> Option<usize>;

/// Tried in order; the first strategy that finds a chapter wins.
const STRATEGIES: [(MatchKind, Strategy); 3] = [
    (MatchKind::Exact, exact_match),
    (MatchKind::Canonical, canonical_match),
    (MatchKind::NumericLabel, numeric_label_match),
];

/// Pointer lookup over one chapter set. The canonical-key map and the title
/// numbers are built on first use and shared by every later lookup in the
/// session.
pub struct ResolutionSession<'a> {
    chapters: &'a [ChapterRecord],
    patterns: &'a NumberingPatterns,
    exact: HashMap<&'a str, usize>,
    canonical: Option<HashMap<String, usize>>,
    title_numbers: Option<Vec<Option<u64>>>,
    cache: CanonicalCache,
}

impl<'a> ResolutionSession<'a> {
    pub fn new(chapters: &'a [ChapterRecord], patterns: &'a NumberingPatterns) -> Self {
        let mut exact = HashMap::with_capacity(chapters.len());
        for (index, chapter) in chapters.iter().enumerate() {
            if chapter.has_self_id() {
                exact.entry(chapter.self_id.as_str()).or_insert(index);
            }
        }

        Self {
            chapters,
            patterns,
            exact,
            canonical: None,
            title_numbers: None,
            cache: CanonicalCache::new(),
        }
    }

    pub fn chapters(&self) -> &'a [ChapterRecord] {
        self.chapters
    }

    pub fn resolve(&mut self, target: Option<&str>) -> Option<&'a ChapterRecord> {
        let chapters = self.chapters;
        self.resolve_index(target)
            .map(|resolved| &chapters[resolved.index])
    }

    pub fn resolve_index(&mut self, target: Option<&str>) -> Option<Resolved> {
        let target = target.filter(|value| !value.trim().is_empty())?;
        for (kind, strategy) in STRATEGIES {
            if let Some(index) = strategy(self, target) {
                return Some(Resolved { index, kind });
            }
        }
        None
    }

    /// First chapter, in slice order, whose title carries `number`.
    pub fn find_by_number(&mut self, number: u64) -> Option<usize> {
        let chapters = self.chapters;
        let patterns = self.patterns;
        let numbers = self.title_numbers.get_or_insert_with(|| {
            chapters
                .iter()
                .map(|chapter| {
                    if chapter.has_self_id() {
                        patterns.extract(&chapter.title)
                    } else {
                        None
                    }
                })
                .collect()
        });
        numbers.iter().position(|value| *value == Some(number))
    }

    #[cfg(test)]
    pub fn canonical_map_built(&self) -> bool {
        self.canonical.is_some()
    }

    fn canonical_lookup(&mut self, key: &str) -> Option<usize> {
        let chapters = self.chapters;
        let cache = &mut self.cache;
        let map = self.canonical.get_or_insert_with(|| {
            let mut map = HashMap::with_capacity(chapters.len());
            for (index, chapter) in chapters.iter().enumerate() {
                if !chapter.has_self_id() {
                    continue;
                }
                let key = cache.key(&chapter.self_id);
                if !key.is_empty() {
                    map.entry(key).or_insert(index);
                }
            }
            map
        });
        map.get(key).copied()
    }
}

fn exact_match(session: &mut ResolutionSession<'_>, target: &str) -> Option<usize> {
    session.exact.get(target).copied()
}

fn canonical_match(session: &mut ResolutionSession<'_>, target: &str) -> Option<usize> {
    let key = session.cache.key(target);
    if key.is_empty() {
        return None;
    }
    session.canonical_lookup(&key)
}

fn numeric_label_match(session: &mut ResolutionSession<'_>, target: &str) -> Option<usize> {
    let number = session.patterns.extract(target)?;
    session.find_by_number(number)
}
