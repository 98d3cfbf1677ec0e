use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{DbErr, RuntimeErr, SqlErr};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{entity} {key} not found")]
    NotFound { entity: &'static str, key: String },

    #[error("{0}")]
    Conflict(String),

    #[error("movie {movie_id} does not exist")]
    ForeignKeyViolation { movie_id: i64 },

    #[error("store is not configured")]
    NotConfigured,

    #[error(transparent)]
    Database(#[from] DbErr),
}

impl AppError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound { entity, key: key.to_string() }
    }

    /// Folds store-level constraint failures into the request taxonomy. Used on
    /// writes, where a racing writer can slip past the application-level check.
    /// A write refused because another session committed first is a conflict
    /// as well.
    pub fn from_write(err: DbErr, conflict: impl FnOnce() -> String, movie_id: i64) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => Self::Conflict(conflict()),
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
                Self::ForeignKeyViolation { movie_id }
            },
            _ if is_busy(&err) => {
                Self::Conflict("a concurrent write changed the store; retry the request".into())
            },
            _ => Self::Database(err),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::ForeignKeyViolation { .. } => {
                StatusCode::BAD_REQUEST
            },
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotConfigured | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::NotFound { .. } => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::ForeignKeyViolation { .. } => "foreign_key_violation",
            AppError::NotConfigured => "not_configured",
            AppError::Database(_) => "internal_error",
        }
    }
}

/// SQLITE_BUSY and its extended codes (BUSY_SNAPSHOT, BUSY_TIMEOUT, ...).
fn is_busy(err: &DbErr) -> bool {
    let (DbErr::Exec(runtime) | DbErr::Query(runtime) | DbErr::Conn(runtime)) = err else {
        return false;
    };
    let RuntimeErr::SqlxError(sqlx) = runtime else {
        return false;
    };
    sqlx.as_database_error()
        .and_then(|db| db.code())
        .and_then(|code| code.parse::<i32>().ok())
        .is_some_and(|code| code & 0xff == 5)
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            AppError::Database(err) => {
                tracing::error!(error = %err, "store failure");
                "internal error".to_string()
            },
            AppError::NotConfigured => {
                tracing::error!("session requested from an unbound store");
                self.to_string()
            },
            other => other.to_string(),
        };

        let body = ErrorBody { error: self.kind(), message };
        (self.status(), Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
