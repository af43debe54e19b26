use std::{pin::pin, sync::Arc};

use futures::{Stream, StreamExt, stream};
use tracing::{debug, info, warn};

use crate::{
    catalog::CatalogClient,
    error::{AppError, AppResult},
    models::{Genre, Movie, MovieDefaults, SearchOutcome},
    store::MovieStore,
};

pub const DEFAULT_SEARCH_COOLDOWN_SECS: i64 = 86_400;

/// Keeps the local movie catalog in step with the remote one.
///
/// Every operation runs its store and catalog calls one after another. Nothing
/// here coordinates concurrent callers: two searches for the same term that
/// start together can both reach the catalog API.
pub struct MovieService {
    catalog: Arc<dyn CatalogClient>,
    store: Arc<dyn MovieStore>,
    search_cooldown_secs: i64,
}

impl MovieService {
    pub fn new(
        catalog: Arc<dyn CatalogClient>,
        store: Arc<dyn MovieStore>,
        search_cooldown_secs: i64,
    ) -> Self {
        Self { catalog, store, search_cooldown_secs }
    }

    pub fn store(&self) -> &dyn MovieStore {
        self.store.as_ref()
    }

    /// Fetch a movie's full details and persist them, replacing its genres.
    ///
    /// Safe to call with any movie: a full record is left untouched.
    pub async fn fill_movie_details(&self, movie: &mut Movie) -> AppResult<()> {
        if movie.is_full_record {
            warn!(title = %movie.title, imdb_id = %movie.imdb_id, "movie is already a full record");
            return Ok(());
        }

        let details = self.catalog.get_by_external_id(&movie.imdb_id).await?;
        movie.title = details.title;
        movie.year = details.year;
        movie.plot = details.plot;
        movie.runtime_minutes = details.runtime_minutes;

        self.store.clear_movie_genres(movie.id).await?;
        let mut genres = pin!(resolve_genres(self.store.as_ref(), &details.genres));
        while let Some(genre) = genres.next().await {
            self.store.add_movie_genre(movie.id, genre?.id).await?;
        }

        movie.is_full_record = true;
        self.store.save_movie(movie).await?;

        info!(title = %movie.title, imdb_id = %movie.imdb_id, "movie details filled");
        Ok(())
    }

    pub async fn search_and_save(&self, search: &str) -> AppResult<SearchOutcome> {
        self.search_and_save_at(search, jiff::Timestamp::now()).await
    }

    /// Search the catalog for `search` and save every hit as a partial record,
    /// unless the normalized term was already searched within the cooldown.
    pub async fn search_and_save_at(
        &self,
        search: &str,
        now: jiff::Timestamp,
    ) -> AppResult<SearchOutcome> {
        let term = normalize_search_term(search);
        let now = now.as_second();

        let (mut search_term, created) = self.store.find_or_create_search_term(&term, now).await?;

        if !created && search_term.last_search >= now - self.search_cooldown_secs {
            warn!(term = %term, "search was performed recently, not searching again");
            return Ok(SearchOutcome::Skipped);
        }

        let results = self.catalog.search(search).await?;

        let mut created_count = 0;
        for result in &results {
            info!(title = %result.title, imdb_id = %result.imdb_id, "saving movie");
            let defaults = MovieDefaults { title: result.title.clone(), year: result.year };
            let (movie, created) = self.store.find_or_create_movie(&result.imdb_id, defaults).await?;
            if created {
                info!(title = %movie.title, "movie created");
                created_count += 1;
            }
        }

        search_term.last_search = search_term.last_search.max(now);
        self.store.save_search_term(&search_term).await?;

        Ok(SearchOutcome::Searched { results: results.len(), created: created_count })
    }
}

/// Resolve genre names to stored genres, creating missing ones.
///
/// Lazy and ordered: one genre per name, looked up only as the stream is polled.
pub fn resolve_genres<'a>(
    store: &'a dyn MovieStore,
    names: &'a [String],
) -> impl Stream<Item = AppResult<Genre>> + 'a {
    stream::iter(names).then(move |name| async move {
        let (genre, created) = store.find_or_create_genre(name).await?;
        if created {
            debug!(genre = %genre.name, "genre created");
        }
        Ok::<_, AppError>(genre)
    })
}

/// Lowercase and collapse each run of whitespace to a single space.
pub fn normalize_search_term(search: &str) -> String {
    let lowered = search.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut in_space = false;
    for c in lowered.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}
