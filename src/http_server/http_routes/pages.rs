use std::sync::Arc;

use axum::{extract::State, response::Response};
use axum_extra::extract::cookie::CookieJar;
use serde_json::json;

use crate::http_server::{error::AppError, page::Page, state::AppState};

use super::render_page;

pub async fn index(
    State(app_state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    render_page(&app_state, jar, Page::new("pages/home.html", json!({})))
}

/// Fallback for every unknown route
pub async fn not_found() -> AppError {
    AppError::NotFound
}
