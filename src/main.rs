use std::{sync::Arc, time::Duration};

use clap::{Parser, Subcommand};
use movie_catalog::{
    Config, MovieService, MovieStore, OmdbClient, SeaOrmStore, SearchOutcome, db,
    models::MovieWithGenres,
};

#[derive(Debug, Parser)]
#[command(name = "movie-catalog", version, about = "Mirror OMDb movie metadata into SQLite")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Search the catalog and save every hit as a partial record
    Search {
        #[arg(required = true, num_args = 1..)]
        terms: Vec<String>,
    },
    /// Fetch full details for a stored movie
    Fill { imdb_id: String },
    /// Print a stored movie as JSON
    Show { imdb_id: String },
    /// List stored movies whose title contains the query
    List { query: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,movie_catalog=debug,sqlx=warn".to_string()),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let http = reqwest::Client::builder()
        .user_agent("movie-catalog/0.1")
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .build()?;

    let db = db::connect_and_migrate(&config.database_url).await?;
    let store = Arc::new(SeaOrmStore::new(db));

    let omdb = OmdbClient::new(
        http,
        config.omdb_api_key.clone(),
        config.omdb_base_url.clone(),
        config.omdb_rps,
    );

    let service = MovieService::new(Arc::new(omdb), store, config.search_cooldown_secs());

    match cli.command {
        Command::Search { terms } => {
            let search = terms.join(" ");
            match service.search_and_save(&search).await? {
                SearchOutcome::Skipped => println!("'{search}' was searched recently, skipped"),
                SearchOutcome::Searched { results, created } => {
                    println!("{results} results, {created} new movies")
                },
            }
        },
        Command::Fill { imdb_id } => {
            let Some(mut movie) = service.store().find_movie(&imdb_id).await? else {
                anyhow::bail!("no stored movie with id {imdb_id}");
            };
            service.fill_movie_details(&mut movie).await?;
            println!("{} ({})", movie.title, movie.imdb_id);
        },
        Command::Show { imdb_id } => {
            let Some(movie) = service.store().find_movie(&imdb_id).await? else {
                anyhow::bail!("no stored movie with id {imdb_id}");
            };
            let genres =
                service.store().movie_genres(movie.id).await?.into_iter().map(|g| g.name).collect();
            let out = MovieWithGenres { movie, genres };
            println!("{}", serde_json::to_string_pretty(&out)?);
        },
        Command::List { query } => {
            for movie in service.store().find_movies_by_title(&query).await? {
                let year = movie.year.map(|y| y.to_string()).unwrap_or_else(|| "----".to_string());
                let marker = if movie.is_full_record { "full" } else { "partial" };
                println!("{}  {year}  {}  [{marker}]", movie.imdb_id, movie.title);
            }
        },
    }

    Ok(())
}
