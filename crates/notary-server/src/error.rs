use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use notary_service::{ErrorKind, ErrorReport, ServiceError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("no file uploaded: expected multipart field `document`")]
    MissingDocument,

    #[error("invalid upload: {0}")]
    Upload(String),

    #[error("upload exceeds the configured size limit")]
    PayloadTooLarge,

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

impl From<MultipartError> for ServerError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge
        } else {
            Self::Upload(e.body_text())
        }
    }
}

impl ServerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingDocument | Self::Upload(_) | Self::PayloadTooLarge => {
                ErrorKind::InputError
            }
            Self::Service(e) => e.kind(),
            Self::Config(_) | Self::Io(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            _ => status_for(self.kind()),
        }
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InputError => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::LedgerUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::ConfirmationTimeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::TransactionReverted | ErrorKind::EventNotFound | ErrorKind::Internal => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let report = ErrorReport {
            kind: self.kind(),
            message: self.to_string(),
        };
        if status.is_server_error() {
            tracing::error!(kind = %report.kind, %status, "{}", report.message);
        } else {
            tracing::debug!(kind = %report.kind, %status, "{}", report.message);
        }
        (status, Json(json!({ "success": false, "error": report }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use notary_ledger::LedgerError;

    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(status_for(ErrorKind::InputError), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            status_for(ErrorKind::LedgerUnavailable),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_for(ErrorKind::ConfirmationTimeout),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status_for(ErrorKind::EventNotFound),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn service_errors_keep_their_kind() {
        let err = ServerError::from(ServiceError::from(LedgerError::Unavailable("down".into())));
        assert_eq!(err.kind(), ErrorKind::LedgerUnavailable);
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn too_large_is_input_error_with_413() {
        assert_eq!(ServerError::PayloadTooLarge.kind(), ErrorKind::InputError);
        assert_eq!(
            ServerError::PayloadTooLarge.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }
}
