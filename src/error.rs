/// Failure talking to the movie catalog API.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered but reported an error (`Response: "False"`).
    #[error("catalog API error: {0}")]
    Api(String),

    #[error("malformed catalog response: {0}")]
    Malformed(String),
}

#[derive(Debug)]
pub struct AppError(anyhow::Error);

impl AppError {
    /// Returns the catalog failure behind this error, if that is what it is.
    pub fn client_error(&self) -> Option<&ClientError> {
        self.0.downcast_ref::<ClientError>()
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for AppError {}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self(err)
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self(anyhow::Error::new(err))
    }
}

impl From<ClientError> for AppError {
    fn from(err: ClientError) -> Self {
        Self(anyhow::Error::new(err))
    }
}

pub type AppResult<T> = Result<T, AppError>;
