use anyhow::Context;

#[derive(Clone, Debug)]
pub struct Config {
    pub omdb_api_key: String,
    pub omdb_base_url: String,
    pub database_url: String,
    pub search_cooldown_hours: i64,
    pub omdb_rps: u32,
    pub http_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let omdb_api_key = lookup("OMDB_API_KEY").unwrap_or_default();
        let omdb_base_url =
            lookup("OMDB_BASE_URL").unwrap_or_else(|| "https://www.omdbapi.com/".to_string());

        let database_url = lookup("DATABASE_URL")
            .unwrap_or_else(|| "sqlite://movie_catalog.db?mode=rwc".to_string());

        let search_cooldown_hours: i64 = lookup("SEARCH_COOLDOWN_HOURS")
            .map(|s| s.parse())
            .transpose()
            .context("SEARCH_COOLDOWN_HOURS")?
            .unwrap_or(24);

        let omdb_rps: u32 =
            lookup("OMDB_RPS").map(|s| s.parse()).transpose().context("OMDB_RPS")?.unwrap_or(4);

        let http_timeout_secs: u64 = lookup("HTTP_TIMEOUT_SECS")
            .map(|s| s.parse())
            .transpose()
            .context("HTTP_TIMEOUT_SECS")?
            .unwrap_or(30);

        if search_cooldown_hours < 0 {
            anyhow::bail!("SEARCH_COOLDOWN_HOURS must not be negative");
        }
        if search_cooldown_hours.checked_mul(3_600).is_none() {
            anyhow::bail!("SEARCH_COOLDOWN_HOURS is too large");
        }

        Ok(Self {
            omdb_api_key,
            omdb_base_url,
            database_url,
            search_cooldown_hours,
            omdb_rps,
            http_timeout_secs,
        })
    }

    pub fn search_cooldown_secs(&self) -> i64 {
        self.search_cooldown_hours.saturating_mul(3_600)
    }
}
