use serde_json::json;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {message}")]
    Validation { message: String, fields: Vec<String> },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid operation [{code}]: {message}")]
    InvalidOperation { code: &'static str, message: String },

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn validation(message: impl Into<String>, fields: Vec<String>) -> Self {
        Error::Validation {
            message: message.into(),
            fields,
        }
    }

    pub fn invalid_op(code: &'static str, message: impl Into<String>) -> Self {
        Error::InvalidOperation {
            code,
            message: message.into(),
        }
    }

    /// Machine-readable code used by transports and tests to branch on the
    /// business-rule violation without parsing the message.
    pub fn code(&self) -> &str {
        match self {
            Error::Config(_) => "config",
            Error::Validation { .. } => "validation",
            Error::NotFound(_) => "not_found",
            Error::Forbidden(_) => "forbidden",
            Error::InvalidOperation { code, .. } => code,
            Error::Database(_) => "database",
            Error::Json(_) => "json",
            Error::Anyhow(_) => "internal",
            Error::Internal(_) => "internal",
        }
    }

    pub fn to_body(&self) -> serde_json::Value {
        match self {
            Error::Validation { message, fields } => {
                json!({ "error": message, "code": self.code(), "fields": fields })
            }
            other => json!({ "error": other.to_string(), "code": other.code() }),
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound("Resource not found".to_string()),
            other => Error::Database(other),
        }
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = err.field_errors().keys().map(|k| k.to_string()).collect();
        fields.sort();
        Error::Validation {
            message: format!("invalid fields: {}", fields.join(", ")),
            fields,
        }
    }
}
