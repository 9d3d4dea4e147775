//! Core data models.
//!
//! These types represent the book and token records that flow through the
//! catalog and token stores, plus the projected search results.

/// Validated input for book creation, before an embedding is attached.
#[derive(Debug, Clone)]
pub struct NewBook {
    pub name: String,
    pub author: String,
    pub price: f64,
    pub copies_sold: Option<i64>,
    pub description: String,
}

/// A persisted book record.
#[derive(Debug, Clone)]
pub struct Book {
    pub id: String,
    pub name: String,
    pub author: String,
    pub price: f64,
    pub copies_sold: Option<i64>,
    pub description: String,
    pub embedding: Vec<f32>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A semantic search hit: description plus cosine similarity score.
#[derive(Debug, Clone)]
pub struct SemanticHit {
    pub id: String,
    pub description: String,
    pub score: f64,
}

/// A fuzzy search hit: the book record (embedding omitted) plus its
/// relevance score.
#[derive(Debug, Clone)]
pub struct FuzzyHit {
    pub id: String,
    pub name: String,
    pub author: String,
    pub price: f64,
    pub copies_sold: Option<i64>,
    pub description: String,
    pub score: f64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A persisted login token. Purged by the store after the TTL elapses.
#[derive(Debug, Clone)]
pub struct LoginToken {
    pub id: String,
    pub token: String,
    pub user_id: String,
    pub created_at: i64,
}
