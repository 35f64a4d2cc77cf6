// src/errors.rs
use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum MermaiderError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Image encoding error: {0}")]
    Encoding(String),

    #[error("Generation service error: {0}")]
    Generation(String),

    #[error("Malformed draft response: {0}")]
    MalformedDraft(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown session: {0}")]
    SessionNotFound(Uuid),
}

impl ResponseError for MermaiderError {
    fn status_code(&self) -> StatusCode {
        match self {
            MermaiderError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            MermaiderError::Encoding(_) => StatusCode::BAD_REQUEST,
            // Schema violations from the draft model are upstream misbehavior,
            // surfaced the same way as any other generation failure.
            MermaiderError::Generation(_) | MermaiderError::MalformedDraft(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            MermaiderError::Validation(_) => StatusCode::BAD_REQUEST,
            MermaiderError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let label = match self {
            MermaiderError::Configuration(_) => "Configuration error",
            MermaiderError::Encoding(_) => "Invalid image",
            MermaiderError::Generation(_) | MermaiderError::MalformedDraft(_) => {
                "Generation failed"
            }
            MermaiderError::Validation(_) => "Validation error",
            MermaiderError::SessionNotFound(_) => "Session not found",
        };
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": label,
            "message": self.to_string()
        }))
    }
}
