//! Work and comment inserts

use shici_common::{Comment, Error, Result, Work};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

/// Comments per multi-row INSERT
pub const COMMENT_BATCH_SIZE: usize = 100;

/// Insert one work and return its row id
///
/// `original_id` stores the normalized work ID so both entity stores expose
/// the same identifiers.
pub async fn insert_work(
    conn: &mut SqliteConnection,
    work: &Work,
    author_id: i64,
    category_id: i64,
) -> Result<i64> {
    let content = serde_json::to_string(&work.paragraphs)
        .map_err(|e| Error::Internal(format!("encode content of {}: {}", work.id, e)))?;

    let result = sqlx::query(
        r#"
        INSERT INTO works (
            original_id, title, author_id, category_id, content,
            rhythmic, volume, section, chapter, prologue
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&work.id)
    .bind(&work.title)
    .bind(author_id)
    .bind(category_id)
    .bind(content)
    .bind(&work.rhythmic)
    .bind(&work.volume)
    .bind(&work.section)
    .bind(&work.chapter)
    .bind(&work.prologue)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Insert comments in batches of [`COMMENT_BATCH_SIZE`]
///
/// Each entry is (work row id, position within the work, comment).
pub async fn insert_comments(
    conn: &mut SqliteConnection,
    comments: &[(i64, usize, &Comment)],
) -> Result<usize> {
    for chunk in comments.chunks(COMMENT_BATCH_SIZE) {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("INSERT INTO comments (work_id, position, kind, content, commenter) ");
        builder.push_values(chunk, |mut row, (work_id, position, comment)| {
            row.push_bind(*work_id)
                .push_bind(*position as i64)
                .push_bind(comment.kind.as_str())
                .push_bind(comment.content.clone())
                .push_bind(comment.commenter.clone());
        });
        builder.build().execute(&mut *conn).await?;
    }

    Ok(comments.len())
}

/// Remove all corpus rows (comments, works, authors, categories)
pub async fn clear_corpus(conn: &mut SqliteConnection) -> Result<()> {
    for table in ["comments", "works", "authors", "categories"] {
        sqlx::query(&format!("DELETE FROM {}", table))
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}
