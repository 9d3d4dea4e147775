//! # Bookshelf
//!
//! A book catalog HTTP API with semantic vector search and fuzzy text search.
//!
//! Bookshelf stores book records alongside text embeddings of their
//! descriptions and exposes two retrieval modes — vector similarity over the
//! embeddings and typo-tolerant fuzzy matching over the raw text — plus a
//! short-lived login-token store with TTL expiry.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────────┐   ┌──────────────┐
//! │   HTTP   │──▶│   Catalog /   │──▶│   SQLite     │
//! │  (axum)  │   │ Token stores  │   │ books+tokens │
//! └──────────┘   └──────┬────────┘   └──────────────┘
//!                       │
//!                       ▼
//!              ┌─────────────────┐
//!              │ Embedding       │
//!              │ OpenAI / Ollama │
//!              │ / fastembed     │
//!              └─────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! shelf init                                  # create database
//! shelf add "Dune" "Frank Herbert" 12.99 \
//!     "A desert planet and the spice that rules it"
//! shelf search "sand worms" --mode semantic
//! shelf search "dessert planet" --mode fuzzy
//! shelf serve                                 # start the HTTP API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and startup validation |
//! | [`models`] | Core data types: `Book`, `LoginToken`, search hits |
//! | [`embedding`] | Embedding provider abstraction and vector utilities |
//! | [`fuzzy`] | Bounded edit-distance matching and scoring |
//! | [`catalog`] | Book store: insert, semantic search, fuzzy search |
//! | [`tokens`] | Login-token store with TTL purge and sweeper |
//! | [`add`] | CLI book creation |
//! | [`search`] | CLI search (semantic / fuzzy) |
//! | [`stats`] | CLI database statistics |
//! | [`server`] | HTTP API (axum) with CORS and uniform error schema |
//! | [`db`] | SQLite connection pool with WAL mode |
//! | [`migrate`] | Database schema migrations (idempotent) |

pub mod add;
pub mod catalog;
pub mod config;
pub mod db;
pub mod embedding;
pub mod fuzzy;
pub mod migrate;
pub mod models;
pub mod search;
pub mod server;
pub mod stats;
pub mod tokens;
