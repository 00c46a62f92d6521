use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::borrow::Cow;
use std::time::Duration;

/// Failure of a single compression call.
///
/// A non-image input is not an error: it is passed through unchanged.
#[derive(thiserror::Error, Debug)]
pub enum CompressError {
    #[error("Invalid options: {0}")]
    InvalidOptions(Cow<'static, str>),
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("Encode error: {0}")]
    Encode(String),
    #[error("Compression timed out after {0:?}")]
    Timeout(Duration),
    #[error("Worker failed: {0}")]
    Worker(String),
}

impl CompressError {
    pub fn invalid_options(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidOptions(msg.into())
    }

    pub fn decode(err: impl std::fmt::Display) -> Self {
        Self::Decode(err.to_string())
    }

    pub fn encode(err: impl std::fmt::Display) -> Self {
        Self::Encode(err.to_string())
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }

    pub fn is_encode(&self) -> bool {
        matches!(self, Self::Encode(_))
    }
}

/// Errors returned by the HTTP handlers.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("Bad Request: {0}")]
    BadRequest(Cow<'static, str>),
    #[error("Internal Server Error")]
    Internal,
}

#[derive(serde::Serialize)]
pub struct ErrorBody {
    pub message: Cow<'static, str>,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(err: impl std::fmt::Debug) -> Self {
        log::error!("Internal Server Error: {:?}", err);
        Self::Internal
    }
}

impl From<CompressError> for ApiError {
    fn from(value: CompressError) -> Self {
        match value {
            CompressError::InvalidOptions(msg) => ApiError::BadRequest(msg),
            other => ApiError::internal(other),
        }
    }
}

impl From<actix_multipart::MultipartError> for ApiError {
    fn from(value: actix_multipart::MultipartError) -> Self {
        ApiError::bad_request(format!("Malformed multipart payload: {}", value))
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::Internal => "Internal Server Error".into(),
        };
        HttpResponse::build(self.status_code()).json(ErrorBody { message })
    }
}
