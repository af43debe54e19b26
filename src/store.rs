use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, Unchanged, sea_query::OnConflict,
};

use crate::{
    entities::{genre, movie, movie_genre, search_term},
    error::AppResult,
    models::{Genre, Movie, MovieDefaults, SearchTerm},
};

/// Durable storage for movies, genres and search terms.
///
/// The `find_or_create_*` methods look an entity up by its natural key and
/// insert it when missing, returning whether a row was created. They are not
/// atomic: two callers racing on the same key can both miss the lookup.
#[async_trait]
pub trait MovieStore: Send + Sync {
    async fn find_or_create_movie(
        &self,
        imdb_id: &str,
        defaults: MovieDefaults,
    ) -> AppResult<(Movie, bool)>;

    async fn save_movie(&self, movie: &Movie) -> AppResult<()>;

    async fn find_movie(&self, imdb_id: &str) -> AppResult<Option<Movie>>;

    /// Case-insensitive title substring match, ordered by title.
    async fn find_movies_by_title(&self, query: &str) -> AppResult<Vec<Movie>>;

    async fn find_or_create_genre(&self, name: &str) -> AppResult<(Genre, bool)>;

    async fn genres(&self) -> AppResult<Vec<Genre>>;

    async fn movie_genres(&self, movie_id: i32) -> AppResult<Vec<Genre>>;

    async fn clear_movie_genres(&self, movie_id: i32) -> AppResult<()>;

    /// Adding an association that already exists is a no-op.
    async fn add_movie_genre(&self, movie_id: i32, genre_id: i32) -> AppResult<()>;

    /// `last_search` is only used when the term is created.
    async fn find_or_create_search_term(
        &self,
        term: &str,
        last_search: i64,
    ) -> AppResult<(SearchTerm, bool)>;

    async fn save_search_term(&self, term: &SearchTerm) -> AppResult<()>;
}

#[derive(Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl MovieStore for SeaOrmStore {
    async fn find_or_create_movie(
        &self,
        imdb_id: &str,
        defaults: MovieDefaults,
    ) -> AppResult<(Movie, bool)> {
        if let Some(existing) = self.find_movie(imdb_id).await? {
            return Ok((existing, false));
        }

        let model = movie::ActiveModel {
            id: Default::default(),
            imdb_id: Set(imdb_id.to_string()),
            title: Set(defaults.title),
            year: Set(defaults.year),
            plot: Set(None),
            runtime_minutes: Set(None),
            is_full_record: Set(false),
        }
        .insert(&self.db)
        .await?;

        Ok((model.into(), true))
    }

    async fn save_movie(&self, movie: &Movie) -> AppResult<()> {
        movie::ActiveModel {
            id: Unchanged(movie.id),
            imdb_id: Set(movie.imdb_id.clone()),
            title: Set(movie.title.clone()),
            year: Set(movie.year),
            plot: Set(movie.plot.clone()),
            runtime_minutes: Set(movie.runtime_minutes),
            is_full_record: Set(movie.is_full_record),
        }
        .update(&self.db)
        .await?;

        Ok(())
    }

    async fn find_movie(&self, imdb_id: &str) -> AppResult<Option<Movie>> {
        let movie = movie::Entity::find()
            .filter(movie::Column::ImdbId.eq(imdb_id))
            .one(&self.db)
            .await?;
        Ok(movie.map(Into::into))
    }

    async fn find_movies_by_title(&self, query: &str) -> AppResult<Vec<Movie>> {
        let movies = movie::Entity::find()
            .filter(movie::Column::Title.contains(query))
            .order_by_asc(movie::Column::Title)
            .all(&self.db)
            .await?;
        Ok(movies.into_iter().map(Into::into).collect())
    }

    async fn find_or_create_genre(&self, name: &str) -> AppResult<(Genre, bool)> {
        let existing =
            genre::Entity::find().filter(genre::Column::Name.eq(name)).one(&self.db).await?;
        if let Some(existing) = existing {
            return Ok((existing.into(), false));
        }

        let model = genre::ActiveModel { id: Default::default(), name: Set(name.to_string()) }
            .insert(&self.db)
            .await?;

        Ok((model.into(), true))
    }

    async fn genres(&self) -> AppResult<Vec<Genre>> {
        let genres = genre::Entity::find().order_by_asc(genre::Column::Name).all(&self.db).await?;
        Ok(genres.into_iter().map(Into::into).collect())
    }

    async fn movie_genres(&self, movie_id: i32) -> AppResult<Vec<Genre>> {
        let genres = genre::Entity::find()
            .inner_join(movie_genre::Entity)
            .filter(movie_genre::Column::MovieId.eq(movie_id))
            .order_by_asc(genre::Column::Name)
            .all(&self.db)
            .await?;
        Ok(genres.into_iter().map(Into::into).collect())
    }

    async fn clear_movie_genres(&self, movie_id: i32) -> AppResult<()> {
        movie_genre::Entity::delete_many()
            .filter(movie_genre::Column::MovieId.eq(movie_id))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn add_movie_genre(&self, movie_id: i32, genre_id: i32) -> AppResult<()> {
        let model = movie_genre::ActiveModel { movie_id: Set(movie_id), genre_id: Set(genre_id) };

        movie_genre::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([movie_genre::Column::MovieId, movie_genre::Column::GenreId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(())
    }

    async fn find_or_create_search_term(
        &self,
        term: &str,
        last_search: i64,
    ) -> AppResult<(SearchTerm, bool)> {
        let existing = search_term::Entity::find()
            .filter(search_term::Column::Term.eq(term))
            .one(&self.db)
            .await?;
        if let Some(existing) = existing {
            return Ok((existing.into(), false));
        }

        let model = search_term::ActiveModel {
            id: Default::default(),
            term: Set(term.to_string()),
            last_search: Set(last_search),
        }
        .insert(&self.db)
        .await?;

        Ok((model.into(), true))
    }

    async fn save_search_term(&self, term: &SearchTerm) -> AppResult<()> {
        search_term::ActiveModel {
            id: Unchanged(term.id),
            term: Set(term.term.clone()),
            last_search: Set(term.last_search),
        }
        .update(&self.db)
        .await?;

        Ok(())
    }
}
