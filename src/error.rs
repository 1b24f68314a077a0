use std::fmt;

use statement_xlsx::ExtractError;
use worker::Response;

use crate::models::ErrorResponse;

/// Request-level failure; per-file problems end up in the conversion report instead.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    UnsupportedMediaType(String),
    Internal(String),
}

impl ApiError {
    const fn status_and_code(&self) -> (u16, &'static str) {
        match self {
            Self::BadRequest(_) => (400, "bad_request"),
            Self::UnsupportedMediaType(_) => (415, "unsupported_media_type"),
            Self::Internal(_) => (500, "internal_error"),
        }
    }

    pub const fn code(&self) -> &'static str {
        self.status_and_code().1
    }

    pub const fn status_code(&self) -> u16 {
        self.status_and_code().0
    }

    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest(message)
            | Self::UnsupportedMediaType(message)
            | Self::Internal(message) => message,
        }
    }

    pub fn body(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.code().to_owned(),
            message: self.message().to_owned(),
        }
    }

    pub fn into_response(self) -> worker::Result<Response> {
        let status = self.status_code();
        let mut response = Response::from_json(&self.body())?.with_status(status);
        response.headers_mut().set("Cache-Control", "no-store")?;
        Ok(response)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.code(), self.status_code(), self.message())
    }
}

impl std::error::Error for ApiError {}

impl From<worker::Error> for ApiError {
    fn from(error: worker::Error) -> Self {
        Self::Internal(format!("worker runtime error: {error}"))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(error: serde_json::Error) -> Self {
        Self::Internal(format!("failed to serialize conversion report: {error}"))
    }
}

impl From<ExtractError> for ApiError {
    fn from(error: ExtractError) -> Self {
        Self::Internal(format!("failed to build spreadsheet: {error}"))
    }
}
