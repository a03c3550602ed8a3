use crate::processor::ProcessorError;
use crate::templates;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use minijinja::context;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Invalid request data (malformed multipart body, bad parameters)
    #[error("{message}")]
    BadRequest { message: String },

    /// Upload body exceeded the configured maximum size
    #[error("{message}")]
    PayloadTooLarge { message: String },

    /// Requested resource not found
    #[error("{resource} {name} not found")]
    NotFound { resource: String, name: String },

    /// The processing collaborator failed on a stored file
    #[error(transparent)]
    Processing(#[from] ProcessorError),

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Processing(proc_err) => match proc_err {
                ProcessorError::UnsupportedType(_) => StatusCode::UNPROCESSABLE_ENTITY,
                ProcessorError::Engine(_) | ProcessorError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::BadRequest { message } => message.clone(),
            Error::PayloadTooLarge { message } => message.clone(),
            Error::NotFound { resource, name } => format!("{resource} {name} not found"),
            Error::Processing(proc_err) => match proc_err {
                ProcessorError::UnsupportedType(kind) => format!("This file type is not supported: {kind}"),
                ProcessorError::Engine(_) | ProcessorError::Io(_) => "The document could not be processed".to_string(),
            },
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Processing(_) => {
                tracing::error!("Processing engine error: {:#}", self);
            }
            Error::PayloadTooLarge { .. } => {
                tracing::warn!("Oversized upload rejected: {}", self);
            }
            Error::BadRequest { .. } | Error::NotFound { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();
        let message = self.user_message();

        // Render the error page; if templating itself fails, fall back to plain text
        match templates::render("error.html", context! { status => status.as_u16(), message => message }) {
            Ok(html) => (status, html).into_response(),
            Err(e) => {
                tracing::error!("Failed to render error page: {}", e);
                (status, message).into_response()
            }
        }
    }
}

impl From<minijinja::Error> for Error {
    fn from(err: minijinja::Error) -> Self {
        Error::Internal {
            operation: format!("render template: {err}"),
        }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let err = Error::BadRequest {
            message: "bad multipart".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = Error::PayloadTooLarge {
            message: "too big".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);

        let err = Error::NotFound {
            resource: "upload".to_string(),
            name: "scan.png".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err = Error::Processing(ProcessorError::Engine("ocr crashed".to_string()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = Error::Processing(ProcessorError::UnsupportedType("application/zip".to_string()));
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_internal_detail_does_not_leak() {
        let err = Error::Internal {
            operation: "rename /srv/uploads/.part-123 to /srv/uploads/scan.png".to_string(),
        };
        assert_eq!(err.user_message(), "Internal server error");

        let err = Error::Processing(ProcessorError::Engine("panic in libtesseract at 0x1f".to_string()));
        assert!(!err.user_message().contains("libtesseract"));
    }

    #[tokio::test]
    async fn test_error_response_renders_page() {
        let err = Error::Processing(ProcessorError::Engine("boom".to_string()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("The document could not be processed"));
        assert!(text.contains("500"));
    }
}
