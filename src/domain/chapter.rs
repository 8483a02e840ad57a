use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Prev,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Next => "next",
            Direction::Prev => "prev",
        }
    }
}

/// One chapter as scraped upstream, plus the locally derived summary.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChapterRecord {
    #[serde(default, alias = "id", alias = "slug")]
    pub self_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default, alias = "next", skip_serializing_if = "Option::is_none")]
    pub declared_next_id: Option<String>,
    #[serde(default, alias = "prev", skip_serializing_if = "Option::is_none")]
    pub declared_prev_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

#[cfg(test)]
impl ChapterRecord {
    pub fn new(self_id: &str, title: &str) -> Self {
        Self {
            self_id: self_id.to_string(),
            title: title.to_string(),
            ..Self::default()
        }
    }

    pub fn with_next(mut self, next: &str) -> Self {
        self.declared_next_id = Some(next.to_string());
        self
    }

    pub fn with_prev(mut self, prev: &str) -> Self {
        self.declared_prev_id = Some(prev.to_string());
        self
    }
}

impl ChapterRecord {
    pub fn has_self_id(&self) -> bool {
        !self.self_id.trim().is_empty()
    }

    pub fn declared_next(&self) -> Option<&str> {
        non_blank(self.declared_next_id.as_deref())
    }

    pub fn declared_prev(&self) -> Option<&str> {
        non_blank(self.declared_prev_id.as_deref())
    }

    pub fn pointer(&self, direction: Direction) -> Option<&str> {
        match direction {
            Direction::Next => self.declared_next(),
            Direction::Prev => self.declared_prev(),
        }
    }

    pub fn has_summary(&self) -> bool {
        non_blank(self.summary.as_deref()).is_some()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}
