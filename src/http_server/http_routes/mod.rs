pub mod artists;
pub mod pages;
pub mod shows;
pub mod venues;

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Path, Request, State},
    http::{StatusCode, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::json;

use crate::error::BookingError;
use crate::http_server::{
    error::{AppError, ErrorPage},
    flash,
    page::Page,
    state::AppState,
};

/// Numeric id from the single path parameter. Anything that is not an
/// integer is answered with the 404 page.
pub struct EntityId(pub i64);

impl<S> FromRequestParts<S> for EntityId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::NotFound)?;
        raw.parse().map(EntityId).map_err(|_| AppError::NotFound)
    }
}

/// Render `page` with 200, prepending any flash message carried over by a redirect
pub(crate) fn render_page(state: &AppState, jar: CookieJar, mut page: Page) -> Result<Response, AppError> {
    let (jar, mut flashes) = flash::take(jar);
    flashes.append(&mut page.flashes);
    page.flashes = flashes;

    let rendered = state.renderer.render(&page)?;
    Ok((
        StatusCode::OK,
        jar,
        [(header::CONTENT_TYPE, rendered.content_type)],
        rendered.body,
    )
        .into_response())
}

/// The landing page every create and delete submission ends on
pub(crate) fn home_page(flash: String) -> Page {
    Page::new("pages/home.html", json!({})).with_flash(flash)
}

pub(crate) fn redirect_with_flash(jar: CookieJar, to: &str, message: &str) -> Response {
    (flash::push(jar, message), Redirect::to(to)).into_response()
}

/// Log a failed mutation. Its transaction has already been rolled back.
pub(crate) fn log_failure(action: &'static str, entity: &'static str, err: &BookingError) {
    tracing::error!(
        action,
        entity,
        kind = err.kind(),
        error = %err,
        "Booking change failed and was rolled back"
    );
}

/// Replace the body of 404/500 responses produced by `AppError` with the rendered error page.
/// Pending flash messages are shown there and cleared, like on any other page.
pub async fn render_error_pages(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let jar = CookieJar::from_headers(request.headers());
    let response = next.run(request).await;
    let Some(error_page) = response.extensions().get::<ErrorPage>().copied() else {
        return response;
    };

    let (jar, flashes) = flash::take(jar);
    let mut page = Page::new(error_page.template(), json!({}));
    page.flashes = flashes;

    match state.renderer.render(&page) {
        Ok(rendered) => (
            error_page.0,
            jar,
            [(header::CONTENT_TYPE, rendered.content_type)],
            rendered.body,
        )
            .into_response(),
        Err(err) => {
            log::error!("Failed to render {}: {}", error_page.template(), err);
            response
        }
    }
}
