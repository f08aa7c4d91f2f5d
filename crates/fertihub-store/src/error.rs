#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("{0}")]
    Validation(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("{0}")]
    Conflict(String),

    #[error("password hashing failed: {0}")]
    Password(String),

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Map an insert failure, turning constraint violations into caller errors.
    pub(crate) fn from_insert(err: sqlx::Error, entity: &'static str) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return Self::Conflict(format!("{entity} already exists"));
            }
            if db.is_foreign_key_violation() {
                return Self::Validation(format!("{entity} references an unknown clinic"));
            }
            if db.is_check_violation() {
                return Self::Validation(format!("{entity} has an invalid field value"));
            }
        }
        Self::Sqlite(err)
    }
}
