use async_trait::async_trait;

use crate::{
    error::ClientError,
    models::{MovieDetails, SearchResult},
};

/// Read access to the remote movie catalog.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Fetch full details for a movie by its external (IMDb) ID.
    async fn get_by_external_id(&self, external_id: &str) -> Result<MovieDetails, ClientError>;

    /// Free-text search. An empty result set is not an error.
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ClientError>;
}
