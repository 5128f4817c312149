//! Author upserts keyed by (name, dynasty)

use shici_common::Result;
use sqlx::SqliteConnection;

/// Create the author if missing and return its row id
///
/// An existing author is only touched to backfill a missing biography.
pub async fn upsert_author(
    conn: &mut SqliteConnection,
    name: &str,
    dynasty: &str,
    biography: Option<&str>,
) -> Result<i64> {
    sqlx::query(
        r#"
        INSERT INTO authors (name, dynasty, biography)
        VALUES (?, ?, ?)
        ON CONFLICT(name, dynasty) DO UPDATE SET
            biography = excluded.biography
        WHERE excluded.biography IS NOT NULL
          AND (authors.biography IS NULL OR authors.biography = '')
        "#,
    )
    .bind(name)
    .bind(dynasty)
    .bind(biography)
    .execute(&mut *conn)
    .await?;

    let id: i64 = sqlx::query_scalar("SELECT id FROM authors WHERE name = ? AND dynasty = ?")
        .bind(name)
        .bind(dynasty)
        .fetch_one(&mut *conn)
        .await?;

    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shici_common::db::open_in_memory;

    async fn biography(conn: &mut SqliteConnection, id: i64) -> Option<String> {
        sqlx::query_scalar("SELECT biography FROM authors WHERE id = ?")
            .bind(id)
            .fetch_one(conn)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_upsert_returns_same_id() {
        let pool = open_in_memory().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        let a = upsert_author(&mut conn, "李白", "唐", None).await.unwrap();
        let b = upsert_author(&mut conn, "李白", "唐", None).await.unwrap();
        let c = upsert_author(&mut conn, "李白", "宋", None).await.unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn test_biography_backfilled_not_overwritten() {
        let pool = open_in_memory().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        let id = upsert_author(&mut conn, "杜甫", "唐", None).await.unwrap();
        assert_eq!(biography(&mut conn, id).await, None);

        upsert_author(&mut conn, "杜甫", "唐", Some("诗圣")).await.unwrap();
        assert_eq!(biography(&mut conn, id).await.as_deref(), Some("诗圣"));

        upsert_author(&mut conn, "杜甫", "唐", Some("另一说")).await.unwrap();
        assert_eq!(biography(&mut conn, id).await.as_deref(), Some("诗圣"));
    }
}
