use regex::Regex;

pub const DEFAULT_LABELS: [&str; 3] = ["chapter", "chương", "chuong"];

/// Ordered chapter-number patterns, one per label. The first pattern that
/// yields a number wins.
#[derive(Debug, Clone)]
pub struct NumberingPatterns {
    patterns: Vec<Regex>,
}

impl NumberingPatterns {
    pub fn from_labels<I, S>(labels: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut patterns = Vec::new();
        for label in labels {
            let label = label.as_ref().trim();
            if label.is_empty() {
                continue;
            }
            let pattern = format!(r"(?i)\b{}[\s\-_:.#]*([0-9]+)", regex::escape(label));
            patterns.push(Regex::new(&pattern)?);
        }
        Ok(Self { patterns })
    }

    pub fn extract(&self, text: &str) -> Option<u64> {
        self.patterns.iter().find_map(|pattern| {
            pattern
                .captures(text)
                .and_then(|caps| caps.get(1))
                .and_then(|digits| digits.as_str().parse::<u64>().ok())
        })
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }
}

impl Default for NumberingPatterns {
    fn default() -> Self {
        Self::from_labels(DEFAULT_LABELS).expect("built-in numbering labels should compile")
    }
}

#[cfg(test)]
mod tests {
    use super::NumberingPatterns;

    #[test]
    fn extracts_numbers_from_titles_and_slugs() {
        let patterns = NumberingPatterns::default();
        assert_eq!(patterns.extract("Chapter 12: The Return"), Some(12));
        assert_eq!(patterns.extract("Chương 7 - Gió nổi"), Some(7));
        assert_eq!(patterns.extract("CHƯƠNG 3"), Some(3));
        assert_eq!(patterns.extract("chuong-45-ket-thuc"), Some(45));
        assert_eq!(patterns.extract("chapter_0009"), Some(9));
    }

    #[test]
    fn returns_none_without_a_numbering_label() {
        let patterns = NumberingPatterns::default();
        assert_eq!(patterns.extract("Prologue"), None);
        assert_eq!(patterns.extract("volume 2"), None);
        assert_eq!(patterns.extract("subchapter 4"), None);
        assert_eq!(patterns.extract(""), None);
    }

    #[test]
    fn label_order_decides_which_number_wins() {
        let patterns = NumberingPatterns::from_labels(["hồi", "chapter"]).expect("labels compile");
        assert_eq!(patterns.extract("Chapter 2 (Hồi 9)"), Some(9));
        assert_eq!(patterns.len(), 2);
    }

    #[test]
    fn blank_labels_are_ignored_and_overflow_is_skipped() {
        let patterns = NumberingPatterns::from_labels(["  ", "chapter"]).expect("labels compile");
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns.extract("chapter 99999999999999999999999"), None);
    }
}
