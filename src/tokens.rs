//! Login-token store.
//!
//! Tokens are ephemeral: the store purges rows older than the configured TTL
//! (default one hour). Expiry is enforced at the store boundary — lazily on
//! lookup and periodically by [`run_sweeper`] while the server runs — so
//! request handlers never reason about it.

use anyhow::{bail, Result};
use sqlx::{Row, SqlitePool};
use std::time::Duration;
use uuid::Uuid;

use crate::models::LoginToken;

/// Persist a login token.
pub async fn create_token(pool: &SqlitePool, token: &str, user_id: &str) -> Result<LoginToken> {
    if token.trim().is_empty() {
        bail!("token must not be empty");
    }
    if user_id.trim().is_empty() {
        bail!("userId must not be empty");
    }

    let record = LoginToken {
        id: Uuid::new_v4().to_string(),
        token: token.to_string(),
        user_id: user_id.to_string(),
        created_at: chrono::Utc::now().timestamp(),
    };

    sqlx::query("INSERT INTO login_tokens (id, token, user_id, created_at) VALUES (?, ?, ?, ?)")
        .bind(&record.id)
        .bind(&record.token)
        .bind(&record.user_id)
        .bind(record.created_at)
        .execute(pool)
        .await?;

    Ok(record)
}

/// Look up a token, purging expired rows first so an expired token is never
/// returned.
pub async fn find_token(
    pool: &SqlitePool,
    token: &str,
    ttl: Duration,
) -> Result<Option<LoginToken>> {
    purge_expired(pool, ttl).await?;

    let row = sqlx::query(
        "SELECT id, token, user_id, created_at FROM login_tokens WHERE token = ? LIMIT 1",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| LoginToken {
        id: r.get("id"),
        token: r.get("token"),
        user_id: r.get("user_id"),
        created_at: r.get("created_at"),
    }))
}

/// Delete tokens older than the TTL. Returns the number purged.
pub async fn purge_expired(pool: &SqlitePool, ttl: Duration) -> Result<u64> {
    let cutoff = chrono::Utc::now().timestamp() - ttl.as_secs() as i64;

    let result = sqlx::query("DELETE FROM login_tokens WHERE created_at < ?")
        .bind(cutoff)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Number of live (non-expired) tokens.
pub async fn count_live(pool: &SqlitePool, ttl: Duration) -> Result<i64> {
    let cutoff = chrono::Utc::now().timestamp() - ttl.as_secs() as i64;
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM login_tokens WHERE created_at >= ?")
        .bind(cutoff)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Periodic purge loop, spawned alongside the HTTP server.
pub async fn run_sweeper(pool: SqlitePool, ttl: Duration, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    // First tick fires immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;
        match purge_expired(&pool, ttl).await {
            Ok(0) => {}
            Ok(purged) => tracing::debug!(purged, "purged expired login tokens"),
            Err(e) => tracing::warn!(error = %e, "token sweep failed"),
        }
    }
}
