use std::collections::HashMap;

/// Reduces a scraped identifier to its comparison key: accents folded,
/// lowercased, every run outside `[a-z0-9]` collapsed into one `-`, with no
/// leading or trailing `-`.
pub fn canonicalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_dash = false;

    for ch in raw.chars() {
        if is_combining_mark(ch) {
            continue;
        }
        let folded = fold_latin(ch).unwrap_or(ch);
        for lower in folded.to_lowercase() {
            if is_combining_mark(lower) {
                continue;
            }
            if lower.is_ascii_lowercase() || lower.is_ascii_digit() {
                if pending_dash && !out.is_empty() {
                    out.push('-');
                }
                pending_dash = false;
                out.push(lower);
            } else {
                pending_dash = true;
            }
        }
    }

    out
}

/// Memoizes `canonicalize` per raw string for the lifetime of one
/// resolution session.
#[derive(Debug, Default)]
pub struct CanonicalCache {
    entries: HashMap<String, String>,
}

impl CanonicalCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(&mut self, raw: &str) -> String {
        if let Some(hit) = self.entries.get(raw) {
            return hit.clone();
        }
        let key = canonicalize(raw);
        self.entries.insert(raw.to_string(), key.clone());
        key
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

fn is_combining_mark(ch: char) -> bool {
    ('\u{0300}'..='\u{036F}').contains(&ch)
}

fn fold_latin(ch: char) -> Option<char> {
    let base = match ch {
        'à' | 'á' | 'ả' | 'ã' | 'ạ' | 'ă' | 'ằ' | 'ắ' | 'ẳ' | 'ẵ' | 'ặ' | 'â' | 'ầ' | 'ấ' | 'ẩ'
        | 'ẫ' | 'ậ' | 'ä' | 'å' | 'ā' => 'a',
        'À' | 'Á' | 'Ả' | 'Ã' | 'Ạ' | 'Ă' | 'Ằ' | 'Ắ' | 'Ẳ' | 'Ẵ' | 'Ặ' | 'Â' | 'Ầ' | 'Ấ' | 'Ẩ'
        | 'Ẫ' | 'Ậ' | 'Ä' | 'Å' | 'Ā' => 'a',
        'è' | 'é' | 'ẻ' | 'ẽ' | 'ẹ' | 'ê' | 'ề' | 'ế' | 'ể' | 'ễ' | 'ệ' | 'ë' | 'ē' => 'e',
        'È' | 'É' | 'Ẻ' | 'Ẽ' | 'Ẹ' | 'Ê' | 'Ề' | 'Ế' | 'Ể' | 'Ễ' | 'Ệ' | 'Ë' | 'Ē' => 'e',
        'ì' | 'í' | 'ỉ' | 'ĩ' | 'ị' | 'î' | 'ï' | 'ī' => 'i',
        'Ì' | 'Í' | 'Ỉ' | 'Ĩ' | 'Ị' | 'Î' | 'Ï' | 'Ī' => 'i',
        'ò' | 'ó' | 'ỏ' | 'õ' | 'ọ' | 'ô' | 'ồ' | 'ố' | 'ổ' | 'ỗ' | 'ộ' | 'ơ' | 'ờ' | 'ớ' | 'ở'
        | 'ỡ' | 'ợ' | 'ö' | 'ø' | 'ō' => 'o',
        'Ò' | 'Ó' | 'Ỏ' | 'Õ' | 'Ọ' | 'Ô' | 'Ồ' | 'Ố' | 'Ổ' | 'Ỗ' | 'Ộ' | 'Ơ' | 'Ờ' | 'Ớ' | 'Ở'
        | 'Ỡ' | 'Ợ' | 'Ö' | 'Ø' | 'Ō' => 'o',
        'ù' | 'ú' | 'ủ' | 'ũ' | 'ụ' | 'ư' | 'ừ' | 'ứ' | 'ử' | 'ữ' | 'ự' | 'û' | 'ü' | 'ū' => 'u',
        'Ù' | 'Ú' | 'Ủ' | 'Ũ' | 'Ụ' | 'Ư' | 'Ừ' | 'Ứ' | 'Ử' | 'Ữ' | 'Ự' | 'Û' | 'Ü' | 'Ū' => 'u',
        'ỳ' | 'ý' | 'ỷ' | 'ỹ' | 'ỵ' | 'ÿ' => 'y',
        'Ỳ' | 'Ý' | 'Ỷ' | 'Ỹ' | 'Ỵ' => 'y',
        'đ' | 'Đ' => 'd',
        'ç' | 'Ç' => 'c',
        'ñ' | 'Ñ' => 'n',
        _ => return None,
    };
    Some(base)
}

#[cfg(test)]
mod tests {
    use super::{canonicalize, CanonicalCache};

    #[test]
    fn folds_vietnamese_heading_into_slug() {
        assert_eq!(canonicalize("Chương 1: Bắt đầu"), "chuong-1-bat-dau");
        assert_eq!(canonicalize("ĐẠI CHIẾN Ở Hồ Gươm"), "dai-chien-o-ho-guom");
    }

    #[test]
    fn collapses_punctuation_runs_and_trims_separators() {
        assert_eq!(canonicalize("  --Chapter__12!!  "), "chapter-12");
        assert_eq!(canonicalize("a...b///c"), "a-b-c");
    }

    #[test]
    fn empty_and_symbol_only_inputs_yield_empty_key() {
        assert_eq!(canonicalize(""), "");
        assert_eq!(canonicalize("!?-- ::"), "");
    }

    #[test]
    fn decomposed_marks_fold_like_precomposed_letters() {
        // "ươ" written as u/o followed by combining horn and grave
        let decomposed = "chu\u{031B}o\u{031B}\u{0300}ng";
        assert_eq!(canonicalize(decomposed), "chuong");
    }

    #[test]
    fn canonicalize_is_idempotent() {
        let samples = [
            "Chương 1: Bắt đầu",
            "chapter-01",
            "  Quyển 2 -- Hồi 7 ",
            "ÀÁẢÃẠ__xyz",
            "",
        ];
        for sample in samples {
            let once = canonicalize(sample);
            assert_eq!(canonicalize(&once), once, "sample {sample:?}");
        }
    }

    #[test]
    fn cache_returns_same_key_and_counts_distinct_inputs() {
        let mut cache = CanonicalCache::new();
        assert_eq!(cache.key("Chương 2"), "chuong-2");
        assert_eq!(cache.key("Chương 2"), "chuong-2");
        assert_eq!(cache.key("chuong-2"), "chuong-2");
        assert_eq!(cache.len(), 2);
    }
}
