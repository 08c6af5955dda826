//! Error taxonomy for the ingestion service
//!
//! Every failure a request can end with is an `ErrorKind`. The `Display` text is
//! the message returned to the caller, and the HTTP status is derived from the
//! kind's category.

use actix_web::http::header::{self, ContentType};
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

/// Coarse classification used for status mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorCategory {
    /// Bad method, missing or invalid form fields
    RequestMalformed,
    /// Shared secret mismatch
    Unauthorized,
    /// A single photo failed its own checks
    ItemValidationFailed,
    /// Transcoding, storage, catalog or notification failure
    UpstreamFailure,
}

/// All request, photo and post-batch failures
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum ErrorKind {
    #[error("Error: Method {0} not allowed. Only POST allowed.")]
    MethodNotAllowed(String),

    #[error("Error: Could not parse form data.")]
    MalformedForm,

    #[error("Error: Could not determine number of photos uploaded.")]
    InvalidPhotoCount,

    #[error("Error: Title not defined.")]
    MissingTitle,

    #[error("Error: Passphrase incorrect.")]
    BadPassphrase,

    #[error("Error: Date must be formatted as YYYY-MM-DD.")]
    InvalidDate,

    #[error("Error: Could not determine photo index.")]
    InvalidPhotoIndex,

    #[error("Error: Could not read photo file uploaded.")]
    MissingPhoto,

    #[error("Error: Size of photo is 0.")]
    EmptyPhoto,

    #[error("Error: Photo is not JPEG or PNG.")]
    UnsupportedType,

    #[error("Error. Could not save photo to file.")]
    WorkspaceFailed,

    #[error("Error. Could not optimize original photo file.")]
    TranscodeFailed,

    #[error("Error. Could not iterate over compressed files.")]
    RenditionListingFailed,

    #[error("Error: Issue transferring photo to storage bucket.")]
    TransferFailed,

    #[error("Error: Issue closing connection to storage bucket.")]
    StoreCloseFailed,

    #[error("Error. Could not create new photogroup in repository.")]
    CatalogCreateFailed,

    #[error("Error. Could not send upload notification.")]
    NotificationFailed,

    #[error("Error. Photo processing stopped unexpectedly.")]
    WorkerFailed,
}

impl ErrorKind {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ErrorKind::MethodNotAllowed(_)
            | ErrorKind::MalformedForm
            | ErrorKind::InvalidPhotoCount
            | ErrorKind::MissingTitle
            | ErrorKind::InvalidDate
            | ErrorKind::InvalidPhotoIndex => ErrorCategory::RequestMalformed,
            ErrorKind::BadPassphrase => ErrorCategory::Unauthorized,
            ErrorKind::MissingPhoto | ErrorKind::EmptyPhoto | ErrorKind::UnsupportedType => {
                ErrorCategory::ItemValidationFailed
            }
            ErrorKind::WorkspaceFailed
            | ErrorKind::TranscodeFailed
            | ErrorKind::RenditionListingFailed
            | ErrorKind::TransferFailed
            | ErrorKind::StoreCloseFailed
            | ErrorKind::CatalogCreateFailed
            | ErrorKind::NotificationFailed
            | ErrorKind::WorkerFailed => ErrorCategory::UpstreamFailure,
        }
    }
}

impl ResponseError for ErrorKind {
    fn status_code(&self) -> StatusCode {
        match (self, self.category()) {
            (ErrorKind::MethodNotAllowed(_), _) => StatusCode::METHOD_NOT_ALLOWED,
            (_, ErrorCategory::RequestMalformed) => StatusCode::BAD_REQUEST,
            (_, ErrorCategory::Unauthorized) => StatusCode::UNAUTHORIZED,
            (_, ErrorCategory::ItemValidationFailed) | (_, ErrorCategory::UpstreamFailure) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut response = HttpResponse::build(self.status_code());
        response.insert_header(ContentType::plaintext());
        if let ErrorKind::MethodNotAllowed(_) = self {
            response.insert_header((header::ALLOW, "POST"));
        }
        response.body(self.to_string())
    }
}
