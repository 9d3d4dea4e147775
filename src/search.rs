use anyhow::{bail, Result};

use crate::catalog;
use crate::config::Config;
use crate::db;
use crate::embedding;

/// CLI search: embed (semantic) or tokenize (fuzzy) the query, rank, print.
pub async fn run_search(
    config: &Config,
    query: &str,
    mode: &str,
    limit: Option<i64>,
) -> Result<()> {
    if query.trim().is_empty() {
        println!("No results.");
        return Ok(());
    }

    match mode {
        "semantic" | "fuzzy" => {}
        _ => bail!("Unknown search mode: {}. Use semantic or fuzzy.", mode),
    }

    if mode == "semantic" && !config.embedding.is_enabled() {
        bail!("Mode 'semantic' requires embeddings. Set [embedding] provider in config.");
    }

    let pool = db::connect(config).await?;

    match mode {
        "semantic" => {
            let mut index = config.search.vector.clone();
            if let Some(lim) = limit {
                index.limit = lim;
            }

            let query_vec = embedding::embed_query(&config.embedding, query).await?;
            let hits = catalog::semantic_search(&pool, &query_vec, &index).await?;

            if hits.is_empty() {
                println!("No results.");
            }
            for (i, hit) in hits.iter().enumerate() {
                println!("{}. [{:.3}] {}", i + 1, hit.score, excerpt(&hit.description));
                println!("    id: {}", hit.id);
            }
        }
        "fuzzy" => {
            let mut index = config.search.fuzzy.clone();
            if let Some(lim) = limit {
                index.limit = lim;
            }

            let hits = catalog::fuzzy_search(&pool, query, &index).await?;

            if hits.is_empty() {
                println!("No results.");
            }
            for (i, hit) in hits.iter().enumerate() {
                println!(
                    "{}. [{:.3}] {} by {}",
                    i + 1,
                    hit.score,
                    hit.name,
                    hit.author
                );
                println!("    excerpt: \"{}\"", excerpt(&hit.description));
                println!("    id: {}", hit.id);
            }
        }
        _ => unreachable!(),
    }

    pool.close().await;
    Ok(())
}

fn excerpt(text: &str) -> String {
    let flat = text.replace('\n', " ");
    let trimmed = flat.trim();
    if trimmed.chars().count() > 120 {
        let cut: String = trimmed.chars().take(120).collect();
        format!("{}...", cut)
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt_short_text_unchanged() {
        assert_eq!(excerpt("a short\ndescription"), "a short description");
    }

    #[test]
    fn test_excerpt_truncates_long_text() {
        let long = "x".repeat(200);
        let result = excerpt(&long);
        assert!(result.ends_with("..."));
        assert_eq!(result.chars().count(), 123);
    }
}
