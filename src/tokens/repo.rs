use sqlx::{FromRow, PgExecutor, PgPool};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use super::{opaque_token, TokenKind};

/// Single-use correlation token for password reset and email confirmation.
/// Consuming one deletes the row, so a value can never be spent twice.
#[derive(Debug, Clone, FromRow)]
pub struct SecurityToken {
    pub id: Uuid,
    pub token: String,
    pub kind: String,
    pub user_id: Uuid,
    pub created_at: OffsetDateTime,
}

/// Issue a fresh token for the user, replacing any prior unconsumed token of
/// the same kind. Returns the opaque value to hand to the notification.
pub async fn issue(db: &PgPool, user_id: Uuid, kind: TokenKind) -> sqlx::Result<String> {
    let value = opaque_token();
    let mut tx = db.begin().await?;
    sqlx::query("DELETE FROM security_tokens WHERE user_id = $1 AND kind = $2")
        .bind(user_id)
        .bind(kind.as_str())
        .execute(&mut *tx)
        .await?;
    sqlx::query("INSERT INTO security_tokens (token, kind, user_id) VALUES ($1, $2, $3)")
        .bind(&value)
        .bind(kind.as_str())
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(value)
}

/// Read-only lookup of an unexpired token. Does not consume.
pub async fn find_valid(
    db: impl PgExecutor<'_>,
    token: &str,
    kind: TokenKind,
    ttl: Duration,
) -> sqlx::Result<Option<SecurityToken>> {
    let cutoff = OffsetDateTime::now_utc() - ttl;
    sqlx::query_as::<_, SecurityToken>(
        r#"
        SELECT id, token, kind, user_id, created_at
        FROM security_tokens
        WHERE token = $1 AND kind = $2 AND created_at > $3
        "#,
    )
    .bind(token)
    .bind(kind.as_str())
    .bind(cutoff)
    .fetch_optional(db)
    .await
}

/// Atomically claim a token by id. Returns false when another request already
/// spent it.
pub async fn consume(db: impl PgExecutor<'_>, id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM security_tokens WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Atomically claim an unexpired token by value, kind and owner in one
/// statement. Returns false when absent, expired, spent, or foreign-owned.
pub async fn consume_for_user(
    db: impl PgExecutor<'_>,
    token: &str,
    kind: TokenKind,
    user_id: Uuid,
    ttl: Duration,
) -> sqlx::Result<bool> {
    let cutoff = OffsetDateTime::now_utc() - ttl;
    let result = sqlx::query(
        r#"
        DELETE FROM security_tokens
        WHERE token = $1 AND kind = $2 AND user_id = $3 AND created_at > $4
        "#,
    )
    .bind(token)
    .bind(kind.as_str())
    .bind(user_id)
    .bind(cutoff)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Drop every token the user owns. Called when the owning account is deleted.
pub async fn purge_for_user(db: impl PgExecutor<'_>, user_id: Uuid) -> sqlx::Result<u64> {
    let result = sqlx::query("DELETE FROM security_tokens WHERE user_id = $1")
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}
