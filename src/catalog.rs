//! Book catalog store.
//!
//! Persists book records with their description embeddings and answers the
//! two retrieval modes: semantic (cosine similarity over stored vectors) and
//! fuzzy (typo-tolerant term matching over descriptions).

use anyhow::{bail, Result};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::config::{FuzzyIndexSpec, VectorIndexSpec};
use crate::embedding::{blob_to_vec, cosine_similarity, vec_to_blob};
use crate::fuzzy;
use crate::models::{Book, FuzzyHit, NewBook, SemanticHit};

/// Persist a new book with its description embedding.
///
/// The embedding length is checked against the vector index descriptor
/// before anything is written.
pub async fn insert_book(
    pool: &SqlitePool,
    new_book: &NewBook,
    embedding: &[f32],
    index: &VectorIndexSpec,
) -> Result<Book> {
    if embedding.len() != index.dims {
        bail!(
            "Embedding length {} does not match vector index dims {}",
            embedding.len(),
            index.dims
        );
    }

    let now = chrono::Utc::now().timestamp();
    let id = Uuid::new_v4().to_string();
    let blob = vec_to_blob(embedding);

    sqlx::query(
        r#"
        INSERT INTO books (id, name, author, price, copies_sold, description, embedding, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&new_book.name)
    .bind(&new_book.author)
    .bind(new_book.price)
    .bind(new_book.copies_sold)
    .bind(&new_book.description)
    .bind(&blob)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(Book {
        id,
        name: new_book.name.clone(),
        author: new_book.author.clone(),
        price: new_book.price,
        copies_sold: new_book.copies_sold,
        description: new_book.description.clone(),
        embedding: embedding.to_vec(),
        created_at: now,
        updated_at: now,
    })
}

/// Rank stored embeddings against a query vector by cosine similarity.
///
/// Samples up to `index.num_candidates` stored vectors, scores them, and
/// returns the top `index.limit` as `{id, description, score}` projections.
/// An empty catalog yields an empty list.
pub async fn semantic_search(
    pool: &SqlitePool,
    query_vec: &[f32],
    index: &VectorIndexSpec,
) -> Result<Vec<SemanticHit>> {
    let rows = sqlx::query(
        "SELECT id, description, embedding FROM books ORDER BY updated_at DESC LIMIT ?",
    )
    .bind(index.num_candidates)
    .fetch_all(pool)
    .await?;

    let mut hits: Vec<SemanticHit> = rows
        .iter()
        .map(|row| {
            let blob: Vec<u8> = row.get("embedding");
            let vec = blob_to_vec(&blob);
            let score = cosine_similarity(query_vec, &vec) as f64;
            SemanticHit {
                id: row.get("id"),
                description: row.get("description"),
                score,
            }
        })
        .collect();

    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    hits.truncate(index.limit as usize);

    Ok(hits)
}

/// Typo-tolerant text search over book descriptions.
///
/// Scores every description with term-level edit-distance matching
/// (see [`fuzzy::score_text`]), drops non-matches, and returns the top
/// `index.limit` records ordered by score descending (ties: most recently
/// updated first, then id).
pub async fn fuzzy_search(
    pool: &SqlitePool,
    query: &str,
    index: &FuzzyIndexSpec,
) -> Result<Vec<FuzzyHit>> {
    let rows = sqlx::query(
        "SELECT id, name, author, price, copies_sold, description, created_at, updated_at FROM books",
    )
    .fetch_all(pool)
    .await?;

    let mut hits: Vec<FuzzyHit> = rows
        .iter()
        .filter_map(|row| {
            let description: String = row.get("description");
            let score =
                fuzzy::score_text(query, &description, index.max_edits, index.prefix_length);
            if score <= 0.0 {
                return None;
            }
            Some(FuzzyHit {
                id: row.get("id"),
                name: row.get("name"),
                author: row.get("author"),
                price: row.get("price"),
                copies_sold: row.get("copies_sold"),
                description,
                score,
                created_at: row.get("created_at"),
                updated_at: row.get("updated_at"),
            })
        })
        .collect();

    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(b.updated_at.cmp(&a.updated_at))
            .then_with(|| a.id.cmp(&b.id))
    });
    hits.truncate(index.limit as usize);

    Ok(hits)
}

/// Number of books in the catalog.
pub async fn count_books(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        migrate::run_migrations(&pool).await.unwrap();
        pool
    }

    fn small_index(dims: usize) -> VectorIndexSpec {
        VectorIndexSpec {
            dims,
            ..VectorIndexSpec::default()
        }
    }

    fn book(name: &str, description: &str) -> NewBook {
        NewBook {
            name: name.to_string(),
            author: "Test Author".to_string(),
            price: 9.99,
            copies_sold: Some(100),
            description: description.to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_count() {
        let pool = test_pool().await;
        let index = small_index(3);

        let saved = insert_book(&pool, &book("A", "a tale of dragons"), &[1.0, 0.0, 0.0], &index)
            .await
            .unwrap();
        assert_eq!(saved.embedding.len(), 3);
        assert_eq!(saved.created_at, saved.updated_at);
        assert_eq!(count_books(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_insert_rejects_wrong_dims() {
        let pool = test_pool().await;
        let index = small_index(3);

        let err = insert_book(&pool, &book("A", "text"), &[1.0, 0.0], &index)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("does not match"));
        assert_eq!(count_books(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_semantic_search_ranks_by_similarity() {
        let pool = test_pool().await;
        let index = small_index(3);

        insert_book(&pool, &book("X", "about space"), &[1.0, 0.0, 0.0], &index)
            .await
            .unwrap();
        insert_book(&pool, &book("Y", "about cooking"), &[0.0, 1.0, 0.0], &index)
            .await
            .unwrap();
        insert_book(&pool, &book("Z", "about gardens"), &[0.0, 0.0, 1.0], &index)
            .await
            .unwrap();

        let hits = semantic_search(&pool, &[0.9, 0.1, 0.0], &index).await.unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].description, "about space");
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn test_semantic_search_empty_catalog() {
        let pool = test_pool().await;
        let hits = semantic_search(&pool, &[1.0, 0.0, 0.0], &small_index(3))
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_semantic_search_respects_limit() {
        let pool = test_pool().await;
        let mut index = small_index(2);
        index.limit = 2;

        for i in 0..5 {
            insert_book(&pool, &book(&format!("B{}", i), "desc"), &[1.0, i as f32], &index)
                .await
                .unwrap();
        }

        let hits = semantic_search(&pool, &[1.0, 0.0], &index).await.unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn test_fuzzy_search_tolerates_typos() {
        let pool = test_pool().await;
        let vindex = small_index(2);

        insert_book(
            &pool,
            &book("Wizard Book", "a young wizard attends a school of magic"),
            &[1.0, 0.0],
            &vindex,
        )
        .await
        .unwrap();
        insert_book(
            &pool,
            &book("Cook Book", "recipes for hearty winter stews"),
            &[0.0, 1.0],
            &vindex,
        )
        .await
        .unwrap();

        let hits = fuzzy_search(&pool, "wizzard", &FuzzyIndexSpec::default())
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Wizard Book");
        assert!(hits[0].score > 0.0);
    }

    #[tokio::test]
    async fn test_fuzzy_search_no_match() {
        let pool = test_pool().await;
        let vindex = small_index(2);

        insert_book(&pool, &book("A", "a tale of dragons"), &[1.0, 0.0], &vindex)
            .await
            .unwrap();

        let hits = fuzzy_search(&pool, "xylophone", &FuzzyIndexSpec::default())
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_fuzzy_search_respects_limit() {
        let pool = test_pool().await;
        let vindex = small_index(2);
        let findex = FuzzyIndexSpec {
            limit: 3,
            ..FuzzyIndexSpec::default()
        };

        for i in 0..6 {
            insert_book(
                &pool,
                &book(&format!("B{}", i), "the dragon kingdom chronicles"),
                &[1.0, 0.0],
                &vindex,
            )
            .await
            .unwrap();
        }

        let hits = fuzzy_search(&pool, "dragon", &findex).await.unwrap();
        assert_eq!(hits.len(), 3);
    }
}
