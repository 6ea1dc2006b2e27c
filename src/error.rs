use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Error taxonomy shared by every route handler. Each variant carries a
/// machine-readable code and a user-facing message; the response body is
/// always `{"error": <code>, "message": <message>}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Token ausente")]
    MissingToken,
    #[error("Token inválido")]
    InvalidToken,
    #[error("Acesso negado")]
    Forbidden,
    #[error("{0}")]
    NotFound(String),
    #[error("{message}")]
    Validation { code: &'static str, message: String },
    #[error("{message}")]
    Conflict { code: &'static str, message: String },
    #[error("Já existe um administrador supremo")]
    SupremeAdminExists,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(code: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            code,
            message: message.into(),
        }
    }

    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        Self::Conflict {
            code,
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingToken => "unauthenticated",
            Self::InvalidToken | Self::Forbidden => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::Validation { code, .. } => code,
            Self::Conflict { code, .. } => code,
            Self::SupremeAdminExists => "supreme_admin_exists",
            Self::Internal(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingToken => StatusCode::UNAUTHORIZED,
            Self::InvalidToken | Self::Forbidden | Self::SupremeAdminExists => {
                StatusCode::FORBIDDEN
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation { .. } | Self::Conflict { .. } => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(e) = &self {
            tracing::error!(error = %e, "internal error");
        }
        let status = self.status();
        let body = Json(json!({ "error": self.code(), "message": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::NotFound("Registro não encontrado".into()),
            e => Self::Internal(e.into()),
        }
    }
}
