//! Fetches movie metadata from the OMDb catalog and keeps a local SQLite copy.
//!
//! [`MovieService`] is the entry point: it searches the catalog and stores
//! partial records, and later fills those records in with full details. The
//! catalog and the store are injected through the [`CatalogClient`] and
//! [`MovieStore`] traits.

pub mod catalog;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod models;
pub mod omdb;
pub mod service;
pub mod store;

pub use catalog::CatalogClient;
pub use config::Config;
pub use error::{AppError, AppResult, ClientError};
pub use models::{Genre, Movie, MovieDetails, SearchOutcome, SearchResult, SearchTerm};
pub use omdb::OmdbClient;
pub use service::{MovieService, normalize_search_term, resolve_genres};
pub use store::{MovieStore, SeaOrmStore};
