use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Invalid database connection settings: {0}")]
    ConnectionConfigError(String),

    #[error("Database query failed: {0}")]
    QueryError(#[from] sqlx::Error),

    #[error("Database migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Failed to aggregate sales: {0}")]
    Aggregation(#[from] analytics::AnalyticsError),

    #[error("Invalid query argument: {0}")]
    InvalidArgument(String),

    #[error("Row contains an invalid value: {0}")]
    CorruptRow(String),

    #[error("The requested data was not found in the database.")]
    NotFound,
}
