//! Category seeding

use shici_common::catalog::collections;
use shici_common::Result;
use sqlx::{Row, SqliteConnection};
use std::collections::HashMap;

/// Upsert every catalog collection as a category row
///
/// Idempotent: re-running refreshes names and ordering in place.
pub async fn seed_categories(conn: &mut SqliteConnection) -> Result<usize> {
    for collection in collections() {
        sqlx::query(
            r#"
            INSERT INTO categories (slug, name, description, dynasty_id, sort_order)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(slug) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                dynasty_id = excluded.dynasty_id,
                sort_order = excluded.sort_order
            "#,
        )
        .bind(collection.id)
        .bind(collection.name)
        .bind(collection.description)
        .bind(collection.dynasty)
        .bind(collection.sort_order)
        .execute(&mut *conn)
        .await?;
    }

    Ok(collections().len())
}

/// Map of category slug to row id
pub async fn category_ids(conn: &mut SqliteConnection) -> Result<HashMap<String, i64>> {
    let rows = sqlx::query("SELECT id, slug FROM categories")
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| (row.get::<String, _>("slug"), row.get::<i64, _>("id")))
        .collect())
}
