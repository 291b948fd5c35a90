use sea_orm::{DbErr, SqlErr};

/// Failure of a booking operation, classified so callers can decide between
/// a 404, a flash message and a 500.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
    #[error("Database unreachable: {0}")]
    Connectivity(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Database error: {0}")]
    Database(DbErr),
}

impl BookingError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    /// Short machine-readable category, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::ConstraintViolation(_) => "constraint_violation",
            Self::Connectivity(_) => "connectivity",
            Self::InvalidInput(_) => "invalid_input",
            Self::Database(_) => "database",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<DbErr> for BookingError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg))
            | Some(SqlErr::ForeignKeyConstraintViolation(msg)) => Self::ConstraintViolation(msg),
            _ => match err {
                DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => Self::Connectivity(err.to_string()),
                other => Self::Database(other),
            },
        }
    }
}

impl From<serde_json::Error> for BookingError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidInput(format!("genres are not a JSON list of strings: {err}"))
    }
}

pub type BookingResult<T> = Result<T, BookingError>;
