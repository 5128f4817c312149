//! Record normalizer: raw source record to canonical [`Work`]
//!
//! Pure transformation, no I/O. Field precedence:
//! - body: `paragraphs`, else `content`, else `para` (first non-empty wins)
//! - title: `title`, else `rhythmic`, else the collection's title rule
//! - dynasty: record value with romanized names mapped, else collection default
//! - author: record value, else the collection's default-author rule
//!
//! Records without both a title and a body are dropped.

use crate::raw::{RawRecord, StringList};
use shici_common::catalog::{Collection, TitleRule};
use shici_common::{Comment, CommentKind, Work};

/// Delimiter between a commentator's name and their remark ("X曰：...")
pub const COMMENTER_DELIMITER: &str = "曰：";

const ROMANIZED_DYNASTIES: [(&str, &str); 5] = [
    ("tang", "唐"),
    ("song", "宋"),
    ("yuan", "元"),
    ("ming", "明"),
    ("qing", "清"),
];

/// Where a batch of records came from
#[derive(Debug, Clone, Copy)]
pub struct FileContext<'a> {
    pub collection: &'a Collection,
    /// File name without the `.json` extension
    pub file_stem: &'a str,
}

/// Normalize every record of one file, dropping the invalid ones
pub fn normalize_batch(records: &[RawRecord], ctx: FileContext<'_>) -> Vec<Work> {
    records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| normalize(record, index, ctx))
        .collect()
}

/// Normalize one record found at `index` in its file
pub fn normalize(record: &RawRecord, index: usize, ctx: FileContext<'_>) -> Option<Work> {
    let paragraphs = resolve_body(record)?;
    let title = resolve_title(record, index, ctx.collection)?;

    let id = non_empty(record.id.as_deref())
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}-{}", ctx.file_stem, index));

    let author = non_empty(record.author.as_deref())
        .unwrap_or_else(|| ctx.collection.default_author.author_for(ctx.file_stem))
        .to_string();

    let dynasty = normalize_dynasty(record.dynasty.as_deref(), ctx.collection.dynasty_label());

    Some(Work {
        id,
        title,
        author,
        dynasty,
        category: ctx.collection.id.to_string(),
        paragraphs,
        rhythmic: owned(record.rhythmic.as_deref()),
        volume: owned(record.volume.as_deref()),
        section: owned(record.section.as_deref()),
        chapter: owned(record.chapter.as_deref()),
        prologue: owned(record.prologue.as_deref()),
        comments: collect_comments(record),
    })
}

/// Map a record's dynasty to its canonical label
///
/// Known romanized names become their Chinese label; any other non-empty
/// value is kept as written; a missing value inherits `default`.
pub fn normalize_dynasty(raw: Option<&str>, default: &str) -> String {
    match non_empty(raw) {
        Some(value) => ROMANIZED_DYNASTIES
            .iter()
            .find(|(roman, _)| value.eq_ignore_ascii_case(roman))
            .map(|(_, label)| label.to_string())
            .unwrap_or_else(|| value.to_string()),
        None => default.to_string(),
    }
}

/// Split "X曰：remark" into commenter X and the remark
pub fn split_commenter(text: &str) -> (Option<String>, String) {
    match text.split_once(COMMENTER_DELIMITER) {
        Some((who, remark)) if !who.trim().is_empty() => {
            (Some(who.trim().to_string()), remark.trim().to_string())
        }
        _ => (None, text.trim().to_string()),
    }
}

fn resolve_body(record: &RawRecord) -> Option<Vec<String>> {
    [&record.paragraphs, &record.content, &record.para]
        .into_iter()
        .find(|lines| !lines.is_empty())
        .map(|lines: &StringList| lines.0.clone())
}

fn resolve_title(record: &RawRecord, index: usize, collection: &Collection) -> Option<String> {
    if let Some(title) = non_empty(record.title.as_deref()).or(non_empty(record.rhythmic.as_deref())) {
        return Some(title.to_string());
    }

    match collection.title_rule {
        TitleRule::None => None,
        TitleRule::Chapter => owned(record.chapter.as_deref()),
        TitleRule::Sequence(prefix) => Some(format!("{}-{}", prefix, index + 1)),
    }
}

fn collect_comments(record: &RawRecord) -> Vec<Comment> {
    let notes = record
        .notes
        .iter()
        .filter(|note| !note.trim().is_empty())
        .map(|note| Comment {
            kind: CommentKind::Note,
            content: note.trim().to_string(),
            commenter: None,
        });

    let remarks = record
        .comment
        .iter()
        .filter(|remark| !remark.trim().is_empty())
        .map(|remark| {
            let (commenter, content) = split_commenter(remark);
            Comment {
                kind: CommentKind::Comment,
                content,
                commenter,
            }
        });

    notes.chain(remarks).collect()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn owned(value: Option<&str>) -> Option<String> {
    non_empty(value).map(str::to_string)
}
