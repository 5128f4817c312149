//! Canonical corpus and account models

use crate::pagination::Page;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Author name used when neither the record nor the collection names one
pub const UNKNOWN_AUTHOR: &str = "佚名";

/// One canonical literary text record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Work {
    /// Source-provided ID, or `<file>-<index>` when the source has none
    pub id: String,
    pub title: String,
    pub author: String,
    /// Canonical dynasty label (e.g. 唐)
    pub dynasty: String,
    /// Collection id
    pub category: String,
    /// Body lines, order-significant, never empty
    pub paragraphs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rhythmic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prologue: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<Comment>,
}

impl Work {
    /// Substring match on title, then author, then each body line
    ///
    /// Case-sensitive. Stops at the first field that matches.
    pub fn matches(&self, query: &str) -> bool {
        self.title.contains(query)
            || self.author.contains(query)
            || self.paragraphs.iter().any(|line| line.contains(query))
    }
}

/// Annotation attached to exactly one work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub kind: CommentKind,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commenter: Option<String>,
}

/// Annotation type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentKind {
    Note,
    Comment,
    Translation,
}

impl CommentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommentKind::Note => "note",
            CommentKind::Comment => "comment",
            CommentKind::Translation => "translation",
        }
    }
}

impl fmt::Display for CommentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommentKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "note" => Ok(CommentKind::Note),
            "comment" => Ok(CommentKind::Comment),
            "translation" => Ok(CommentKind::Translation),
            other => Err(crate::Error::InvalidInput(format!(
                "unknown comment kind: {}",
                other
            ))),
        }
    }
}

/// Author, keyed by (name, dynasty), with the number of works attributed to them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorSummary {
    pub name: String,
    pub dynasty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biography: Option<String>,
    pub poem_count: usize,
}

/// Search results plus how long the match took
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub query: String,
    #[serde(flatten)]
    pub results: Page<Work>,
    pub duration_ms: f64,
}

/// Kind of entity a favorite or history entry points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Poem,
    Author,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Poem => "poem",
            TargetKind::Author => "author",
        }
    }
}

impl FromStr for TargetKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "poem" => Ok(TargetKind::Poem),
            "author" => Ok(TargetKind::Author),
            other => Err(crate::Error::InvalidInput(format!(
                "unknown target kind: {}",
                other
            ))),
        }
    }
}

/// Typed reference to a corpus entity
///
/// Serializes as `{"kind": "poem", "id": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum TargetRef {
    Poem(String),
    Author(String),
}

impl TargetRef {
    pub fn kind(&self) -> TargetKind {
        match self {
            TargetRef::Poem(_) => TargetKind::Poem,
            TargetRef::Author(_) => TargetKind::Author,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            TargetRef::Poem(id) | TargetRef::Author(id) => id,
        }
    }

    /// Rebuild from the stored (kind, id) pair
    pub fn from_parts(kind: &str, id: String) -> crate::Result<Self> {
        Ok(match kind.parse::<TargetKind>()? {
            TargetKind::Poem => TargetRef::Poem(id),
            TargetKind::Author => TargetRef::Author(id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn work(title: &str, author: &str, lines: &[&str]) -> Work {
        Work {
            id: "w-0".into(),
            title: title.into(),
            author: author.into(),
            dynasty: "唐".into(),
            category: "quantangshi".into(),
            paragraphs: lines.iter().map(|s| s.to_string()).collect(),
            rhythmic: None,
            volume: None,
            section: None,
            chapter: None,
            prologue: None,
            comments: Vec::new(),
        }
    }

    #[test]
    fn test_work_matches_each_field() {
        let w = work("静夜思", "李白", &["床前明月光，", "疑是地上霜。"]);
        assert!(w.matches("静夜"));
        assert!(w.matches("李白"));
        assert!(w.matches("地上霜"));
        assert!(!w.matches("杜甫"));
    }

    #[test]
    fn test_work_match_is_case_sensitive() {
        let w = work("Moon", "Li Bai", &["line"]);
        assert!(w.matches("Moon"));
        assert!(!w.matches("moon"));
    }

    #[test]
    fn test_target_ref_serde_shape() {
        let t = TargetRef::Poem("abc".into());
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "poem", "id": "abc"}));

        let back: TargetRef = serde_json::from_value(json).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn test_target_ref_rejects_unknown_kind() {
        assert!(TargetRef::from_parts("dynasty", "x".into()).is_err());
        assert!(serde_json::from_str::<TargetRef>(r#"{"kind":"dynasty","id":"x"}"#).is_err());
        assert_eq!(
            TargetRef::from_parts("author", "李白".into()).unwrap(),
            TargetRef::Author("李白".into())
        );
    }

    #[test]
    fn test_comment_kind_round_trip_names() {
        for kind in [CommentKind::Note, CommentKind::Comment, CommentKind::Translation] {
            assert_eq!(kind.as_str().parse::<CommentKind>().unwrap(), kind);
        }
    }
}
