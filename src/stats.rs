use anyhow::Result;
use std::time::Duration;

use crate::catalog;
use crate::config::Config;
use crate::db;
use crate::tokens;

/// CLI stats: book and token counts.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    let books = catalog::count_books(&pool).await?;

    let ttl = Duration::from_secs(config.tokens.ttl_secs);
    let live_tokens = tokens::count_live(&pool, ttl).await?;
    let total_tokens: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM login_tokens")
        .fetch_one(&pool)
        .await?;

    println!("books: {}", books);
    println!("login tokens (live): {}", live_tokens);
    if total_tokens > live_tokens {
        println!("login tokens (awaiting sweep): {}", total_tokens - live_tokens);
    }
    println!(
        "vector index: {} dims, {} similarity",
        config.search.vector.dims, config.search.vector.metric
    );
    println!(
        "fuzzy index: max {} edits, prefix {}",
        config.search.fuzzy.max_edits, config.search.fuzzy.prefix_length
    );

    pool.close().await;
    Ok(())
}
