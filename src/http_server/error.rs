use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::error::BookingError;
use crate::http_server::page::RenderError;

/// Failure of a request outside the guarded create/edit/delete blocks.
#[derive(Debug)]
pub enum AppError {
    NotFound,
    Internal(color_eyre::Report),
}

/// Marks a response whose body should be replaced by the matching error page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorPage(pub StatusCode);

impl ErrorPage {
    pub fn template(self) -> &'static str {
        if self.0 == StatusCode::NOT_FOUND {
            "errors/404.html"
        } else {
            "errors/500.html"
        }
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        if err.is_not_found() {
            log::debug!("{err}");
            return AppError::NotFound;
        }
        tracing::error!(kind = err.kind(), error = %err, "Request failed");
        AppError::Internal(color_eyre::Report::new(err))
    }
}

impl From<RenderError> for AppError {
    fn from(err: RenderError) -> Self {
        AppError::Internal(color_eyre::Report::new(err))
    }
}

// Tell axum how to convert `AppError` into a response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Internal(err) => {
                log::error!("{err:?}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        // The body is filled in by the error page layer
        let mut response = (status, "Something went wrong").into_response();
        response.extensions_mut().insert(ErrorPage(status));
        response
    }
}
