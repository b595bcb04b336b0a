use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use credential_indexer_logic::{CredentialIndexerError, MetadataError};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("metadata not found")]
    NotFound,
    #[error(transparent)]
    Indexer(#[from] CredentialIndexerError),
    #[error(transparent)]
    Metadata(#[from] MetadataError),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl ApiError {
    fn label(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "Validation failed",
            ApiError::NotFound => "Not found",
            ApiError::Indexer(CredentialIndexerError::Configuration(_)) => "Configuration error",
            ApiError::Indexer(CredentialIndexerError::NodeUnavailable(_)) => "Node unavailable",
            ApiError::Indexer(CredentialIndexerError::Profile(_)) => "Internal server error",
            ApiError::Metadata(_) => "Metadata unavailable",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Indexer(CredentialIndexerError::NodeUnavailable(_))
            | ApiError::Metadata(_) => StatusCode::BAD_GATEWAY,
            ApiError::Indexer(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(err = ?self, "request failed");
        }
        let details = match self {
            ApiError::NotFound => None,
            _ => Some(self.to_string()),
        };
        HttpResponse::build(status).json(ErrorBody {
            error: self.label(),
            details,
        })
    }
}
