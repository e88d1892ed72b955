use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed plan: {0}")]
    Malformed(String),

    #[error("Catalog Error: {0}")]
    Catalog(String),

    #[error("Usage: {0}")]
    Usage(String),

    #[error("Serialize Error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl From<sqlx::Error> for PlanError {
    fn from(e: sqlx::Error) -> Self {
        PlanError::Catalog(e.to_string())
    }
}
