use serde::Serialize;

use crate::entities::{genre, movie, search_term};

/// A movie known to the local catalog.
///
/// Created as a partial record from search results and upgraded to a full
/// record once its details have been fetched.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Movie {
    pub id: i32,
    pub imdb_id: String,
    pub title: String,
    pub year: Option<i32>,
    pub plot: Option<String>,
    pub runtime_minutes: Option<i32>,
    pub is_full_record: bool,
}

/// Values applied to a movie only when it is first created.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MovieDefaults {
    pub title: String,
    pub year: Option<i32>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Genre {
    pub id: i32,
    pub name: String,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SearchTerm {
    pub id: i32,
    pub term: String,
    pub last_search: i64,
}

/// Full movie details as returned by the catalog API.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MovieDetails {
    pub title: String,
    pub year: Option<i32>,
    pub plot: Option<String>,
    pub runtime_minutes: Option<i32>,
    pub genres: Vec<String>,
}

/// One hit of a catalog search.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SearchResult {
    pub title: String,
    pub year: Option<i32>,
    pub imdb_id: String,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SearchOutcome {
    /// The term was searched recently; nothing was fetched.
    Skipped,
    Searched { results: usize, created: usize },
}

#[derive(Clone, Debug, Serialize)]
pub struct MovieWithGenres {
    #[serde(flatten)]
    pub movie: Movie,
    pub genres: Vec<String>,
}

impl From<movie::Model> for Movie {
    fn from(m: movie::Model) -> Self {
        Self {
            id: m.id,
            imdb_id: m.imdb_id,
            title: m.title,
            year: m.year,
            plot: m.plot,
            runtime_minutes: m.runtime_minutes,
            is_full_record: m.is_full_record,
        }
    }
}

impl From<genre::Model> for Genre {
    fn from(m: genre::Model) -> Self {
        Self { id: m.id, name: m.name }
    }
}

impl From<search_term::Model> for SearchTerm {
    fn from(m: search_term::Model) -> Self {
        Self { id: m.id, term: m.term, last_search: m.last_search }
    }
}
