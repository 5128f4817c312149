//! Relational entity store over the tables written by `shici-ingest`
//!
//! Works are ordered by row id, which is ingestion order and therefore
//! corpus order. Search uses `instr`, which is case-sensitive, so both
//! backends agree on what matches.

use super::EntityStore;
use async_trait::async_trait;
use shici_common::{AuthorSummary, Comment, CommentKind, Error, Page, PageRequest, Result, Work};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::collections::HashMap;

const WORK_COLUMNS: &str = r#"
    SELECT w.id AS row_id,
           COALESCE(NULLIF(w.original_id, ''), CAST(w.id AS TEXT)) AS work_id,
           w.title, a.name AS author, a.dynasty, c.slug AS category, w.content,
           w.rhythmic, w.volume, w.section, w.chapter, w.prologue
    FROM works w
    JOIN authors a ON a.id = w.author_id
    JOIN categories c ON c.id = w.category_id
"#;

const SEARCH_PREDICATE: &str = r#"
    instr(w.title, ?1) > 0
    OR instr(a.name, ?1) > 0
    OR EXISTS (SELECT 1 FROM json_each(w.content) AS line WHERE instr(line.value, ?1) > 0)
"#;

const AUTHOR_COLUMNS: &str = r#"
    SELECT a.name, a.dynasty, NULLIF(a.biography, '') AS biography, COUNT(w.id) AS poem_count
    FROM authors a
    JOIN works w ON w.author_id = a.id
"#;

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Decode work rows and attach their comments in one extra query
    async fn hydrate(&self, rows: Vec<SqliteRow>) -> Result<Vec<Work>> {
        let mut works = Vec::with_capacity(rows.len());
        let mut row_ids = Vec::with_capacity(rows.len());

        for row in rows {
            row_ids.push(row.get::<i64, _>("row_id"));
            works.push(work_from_row(&row)?);
        }

        let mut comments = self.comments_for(&row_ids).await?;
        for (work, row_id) in works.iter_mut().zip(&row_ids) {
            if let Some(list) = comments.remove(row_id) {
                work.comments = list;
            }
        }
        Ok(works)
    }

    async fn comments_for(&self, row_ids: &[i64]) -> Result<HashMap<i64, Vec<Comment>>> {
        let mut by_work: HashMap<i64, Vec<Comment>> = HashMap::new();
        if row_ids.is_empty() {
            return Ok(by_work);
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT work_id, kind, content, commenter FROM comments WHERE work_id IN (");
        let mut ids = builder.separated(", ");
        for id in row_ids {
            ids.push_bind(*id);
        }
        ids.push_unseparated(") ORDER BY work_id, position");

        for row in builder.build().fetch_all(&self.pool).await? {
            let kind: String = row.get("kind");
            let kind = kind
                .parse::<CommentKind>()
                .map_err(|e| Error::Internal(e.to_string()))?;
            by_work.entry(row.get("work_id")).or_default().push(Comment {
                kind,
                content: row.get("content"),
                commenter: row.get("commenter"),
            });
        }
        Ok(by_work)
    }

    async fn count(&self, sql: &str, arg: Option<&str>) -> Result<usize> {
        let total: i64 = sqlx::query_scalar(sql).bind(arg).fetch_one(&self.pool).await?;
        Ok(total as usize)
    }
}

fn work_from_row(row: &SqliteRow) -> Result<Work> {
    let content: String = row.get("content");
    let paragraphs: Vec<String> = serde_json::from_str(&content)
        .map_err(|e| Error::Internal(format!("corrupt content column: {}", e)))?;

    Ok(Work {
        id: row.get("work_id"),
        title: row.get("title"),
        author: row.get("author"),
        dynasty: row.get("dynasty"),
        category: row.get("category"),
        paragraphs,
        rhythmic: row.get("rhythmic"),
        volume: row.get("volume"),
        section: row.get("section"),
        chapter: row.get("chapter"),
        prologue: row.get("prologue"),
        comments: Vec::new(),
    })
}

fn author_from_row(row: &SqliteRow) -> AuthorSummary {
    AuthorSummary {
        name: row.get("name"),
        dynasty: row.get("dynasty"),
        biography: row.get("biography"),
        poem_count: row.get::<i64, _>("poem_count") as usize,
    }
}

/// `None` when the page lies beyond anything SQLite can address
fn limit_offset(page: PageRequest) -> Option<(i64, i64)> {
    Some((page.page_size as i64, page.sql_offset()?))
}

#[async_trait]
impl EntityStore for SqliteStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn list_works(&self, page: PageRequest, category: Option<&str>) -> Result<Page<Work>> {
        let total = self
            .count(
                r#"
                SELECT COUNT(*) FROM works w
                JOIN categories c ON c.id = w.category_id
                WHERE (?1 IS NULL OR c.slug = ?1)
                "#,
                category,
            )
            .await?;

        let Some((limit, offset)) = limit_offset(page) else {
            return Ok(page.page_of(Vec::new(), total));
        };
        let rows = sqlx::query(&format!(
            "{} WHERE (?1 IS NULL OR c.slug = ?1) ORDER BY w.id LIMIT ?2 OFFSET ?3",
            WORK_COLUMNS
        ))
        .bind(category)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(page.page_of(self.hydrate(rows).await?, total))
    }

    async fn work_by_id(&self, id: &str) -> Result<Work> {
        let mut row = sqlx::query(&format!(
            "{} WHERE w.original_id = ? ORDER BY w.id LIMIT 1",
            WORK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        if row.is_none() {
            if let Ok(row_id) = id.parse::<i64>() {
                row = sqlx::query(&format!("{} WHERE w.id = ?", WORK_COLUMNS))
                    .bind(row_id)
                    .fetch_optional(&self.pool)
                    .await?;
            }
        }

        let row = row.ok_or_else(|| Error::NotFound(format!("poem {}", id)))?;
        self.hydrate(vec![row])
            .await?
            .pop()
            .ok_or_else(|| Error::NotFound(format!("poem {}", id)))
    }

    async fn random_works(&self, count: usize, category: Option<&str>) -> Result<Vec<Work>> {
        let rows = sqlx::query(&format!(
            "{} WHERE (?1 IS NULL OR c.slug = ?1) ORDER BY RANDOM() LIMIT ?2",
            WORK_COLUMNS
        ))
        .bind(category)
        .bind(count as i64)
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }

    async fn works_by_author(&self, name: &str, page: PageRequest) -> Result<Page<Work>> {
        let total = self
            .count(
                "SELECT COUNT(*) FROM works w JOIN authors a ON a.id = w.author_id WHERE a.name = ?1",
                Some(name),
            )
            .await?;

        let Some((limit, offset)) = limit_offset(page) else {
            return Ok(page.page_of(Vec::new(), total));
        };
        let rows = sqlx::query(&format!(
            "{} WHERE a.name = ?1 ORDER BY w.id LIMIT ?2 OFFSET ?3",
            WORK_COLUMNS
        ))
        .bind(name)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(page.page_of(self.hydrate(rows).await?, total))
    }

    async fn list_authors(&self, page: PageRequest, dynasty: Option<&str>) -> Result<Page<AuthorSummary>> {
        let total = self
            .count(
                r#"
                SELECT COUNT(*) FROM authors a
                WHERE (?1 IS NULL OR a.dynasty = ?1)
                  AND a.name <> ''
                  AND EXISTS (SELECT 1 FROM works w WHERE w.author_id = a.id)
                "#,
                dynasty,
            )
            .await?;

        let Some((limit, offset)) = limit_offset(page) else {
            return Ok(page.page_of(Vec::new(), total));
        };
        let rows = sqlx::query(&format!(
            r#"{}
            WHERE (?1 IS NULL OR a.dynasty = ?1) AND a.name <> ''
            GROUP BY a.id
            ORDER BY MIN(w.id)
            LIMIT ?2 OFFSET ?3"#,
            AUTHOR_COLUMNS
        ))
        .bind(dynasty)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let items = rows.iter().map(author_from_row).collect();
        Ok(page.page_of(items, total))
    }

    async fn author_by_name(&self, name: &str) -> Result<AuthorSummary> {
        let row = sqlx::query(&format!(
            "{} WHERE a.name = ?1 GROUP BY a.id ORDER BY MIN(w.id) LIMIT 1",
            AUTHOR_COLUMNS
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref()
            .map(author_from_row)
            .ok_or_else(|| Error::NotFound(format!("author {}", name)))
    }

    async fn search(&self, query: &str, page: PageRequest) -> Result<Page<Work>> {
        let total = self
            .count(
                &format!(
                    r#"
                    SELECT COUNT(*) FROM works w
                    JOIN authors a ON a.id = w.author_id
                    WHERE {}
                    "#,
                    SEARCH_PREDICATE
                ),
                Some(query),
            )
            .await?;

        let Some((limit, offset)) = limit_offset(page) else {
            return Ok(page.page_of(Vec::new(), total));
        };
        let rows = sqlx::query(&format!(
            "{} WHERE {} ORDER BY w.id LIMIT ?2 OFFSET ?3",
            WORK_COLUMNS, SEARCH_PREDICATE
        ))
        .bind(query)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(page.page_of(self.hydrate(rows).await?, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shici_common::db::open_in_memory;
    use shici_ingest::db::{authors::upsert_author, categories, works::insert_work};

    async fn store_with(titles: &[&str]) -> SqliteStore {
        let pool = open_in_memory().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        categories::seed_categories(&mut conn).await.unwrap();
        let category_id = categories::category_ids(&mut conn).await.unwrap()["youmengying"];
        let author_id = upsert_author(&mut conn, "张潮", "清", None).await.unwrap();

        for (i, title) in titles.iter().enumerate() {
            let work = Work {
                id: format!("ymy-{}", i),
                title: title.to_string(),
                author: "张潮".into(),
                dynasty: "清".into(),
                category: "youmengying".into(),
                paragraphs: vec![format!("line {}", i)],
                rhythmic: None,
                volume: None,
                section: None,
                chapter: None,
                prologue: None,
                comments: Vec::new(),
            };
            insert_work(&mut conn, &work, author_id, category_id).await.unwrap();
        }
        drop(conn);
        SqliteStore::new(pool)
    }

    #[tokio::test]
    async fn test_search_is_case_sensitive() {
        let store = store_with(&["Moon Song", "moonless night"]).await;

        let upper = store.search("Moon", PageRequest::default()).await.unwrap();
        assert_eq!(upper.total, 1);
        assert_eq!(upper.items[0].title, "Moon Song");

        let lower = store.search("moon", PageRequest::default()).await.unwrap();
        assert_eq!(lower.total, 1);
        assert_eq!(lower.items[0].title, "moonless night");

        // Body lines are matched too
        assert_eq!(store.search("line 1", PageRequest::default()).await.unwrap().total, 1);
    }

    #[tokio::test]
    async fn test_work_by_numeric_row_id_fallback() {
        let store = store_with(&["Moon Song"]).await;
        let by_original = store.work_by_id("ymy-0").await.unwrap();
        let by_row = store.work_by_id("1").await.unwrap();
        assert_eq!(by_original, by_row);
        assert!(matches!(store.work_by_id("2").await, Err(Error::NotFound(_))));
    }
}
