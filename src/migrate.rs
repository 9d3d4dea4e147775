use anyhow::Result;
use sqlx::SqlitePool;

/// Create the schema. Every statement is idempotent so `shelf init`
/// can be run repeatedly.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    // Book records. The embedding column stores little-endian f32 bytes;
    // its decoded length must equal the configured vector index dims.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS books (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            author TEXT NOT NULL,
            price REAL NOT NULL,
            copies_sold INTEGER,
            description TEXT NOT NULL,
            embedding BLOB NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Ephemeral login tokens, purged after the configured TTL.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS login_tokens (
            id TEXT PRIMARY KEY,
            token TEXT NOT NULL,
            user_id TEXT NOT NULL,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_books_updated_at ON books(updated_at DESC)")
        .execute(pool)
        .await?;

    // The TTL sweep scans by creation time.
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_login_tokens_created_at ON login_tokens(created_at)",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_login_tokens_token ON login_tokens(token)")
        .execute(pool)
        .await?;

    Ok(())
}
