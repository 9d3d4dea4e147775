use anyhow::{bail, Result};

use crate::catalog;
use crate::config::Config;
use crate::db;
use crate::embedding;
use crate::models::NewBook;

/// CLI book creation: embed the description and persist the record.
pub async fn run_add(
    config: &Config,
    name: &str,
    author: &str,
    price: f64,
    description: &str,
    copies_sold: Option<i64>,
) -> Result<()> {
    if name.trim().is_empty() {
        bail!("name must not be empty");
    }
    if author.trim().is_empty() {
        bail!("author must not be empty");
    }
    if description.trim().is_empty() {
        bail!("description must not be empty");
    }
    if !price.is_finite() || price < 0.0 {
        bail!("price must be a non-negative number");
    }
    if let Some(copies) = copies_sold {
        if copies < 0 {
            bail!("copies sold must be non-negative");
        }
    }

    if !config.embedding.is_enabled() {
        bail!("Adding books requires embeddings. Set [embedding] provider in config.");
    }

    let pool = db::connect(config).await?;

    let new_book = NewBook {
        name: name.to_string(),
        author: author.to_string(),
        price,
        copies_sold,
        description: description.to_string(),
    };

    let embedding = embedding::embed_query(&config.embedding, description).await?;
    let saved = catalog::insert_book(&pool, &new_book, &embedding, &config.search.vector).await?;

    println!("added \"{}\" by {}", saved.name, saved.author);
    println!("  id: {}", saved.id);
    println!("  embedding dims: {}", saved.embedding.len());

    pool.close().await;
    Ok(())
}
