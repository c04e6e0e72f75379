/**
 * Star Ledger
 *
 * The `document_stars` join table records which users starred which
 * document versions. The (user_id, document_id) primary key makes starring
 * idempotent: a repeated star is absorbed by `ON CONFLICT DO NOTHING` and
 * reported as success.
 *
 * Listings decorate many documents at once, so counts and membership are
 * fetched with one `IN (...)` query per listing rather than one per row.
 */

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteExecutor, SqlitePool};
use uuid::Uuid;

/// Record a star; returns whether a new row was written
pub async fn star(
    executor: impl SqliteExecutor<'_>,
    user_id: Uuid,
    document_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO document_stars (user_id, document_id, created_at)
        VALUES (?, ?, ?)
        ON CONFLICT (user_id, document_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(document_id)
    .bind(Utc::now())
    .execute(executor)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Remove a star; returns whether a row was removed
pub async fn unstar(
    executor: impl SqliteExecutor<'_>,
    user_id: Uuid,
    document_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM document_stars WHERE user_id = ? AND document_id = ?")
        .bind(user_id)
        .bind(document_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() == 1)
}

/// Star counts for a batch of documents
///
/// Documents without stars are absent from the map.
pub async fn counts_for(
    pool: &SqlitePool,
    document_ids: &[Uuid],
) -> Result<HashMap<Uuid, i64>, sqlx::Error> {
    if document_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let mut query: QueryBuilder<'_, Sqlite> =
        QueryBuilder::new("SELECT document_id, COUNT(*) FROM document_stars WHERE document_id IN (");
    let mut ids = query.separated(", ");
    for id in document_ids {
        ids.push_bind(*id);
    }
    ids.push_unseparated(") GROUP BY document_id");

    let rows: Vec<(Uuid, i64)> = query.build_query_as().fetch_all(pool).await?;
    Ok(rows.into_iter().collect())
}

/// The subset of `document_ids` starred by `user_id`
pub async fn starred_by(
    pool: &SqlitePool,
    user_id: Uuid,
    document_ids: &[Uuid],
) -> Result<HashSet<Uuid>, sqlx::Error> {
    if document_ids.is_empty() {
        return Ok(HashSet::new());
    }

    let mut query: QueryBuilder<'_, Sqlite> =
        QueryBuilder::new("SELECT document_id FROM document_stars WHERE user_id = ");
    query.push_bind(user_id);
    query.push(" AND document_id IN (");
    let mut ids = query.separated(", ");
    for id in document_ids {
        ids.push_bind(*id);
    }
    ids.push_unseparated(")");

    let rows: Vec<(Uuid,)> = query.build_query_as().fetch_all(pool).await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}
