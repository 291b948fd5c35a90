use std::sync::Arc;

use axum::{extract::State, response::Response};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde_json::json;

use crate::error::BookingError;
use crate::http_server::{
    error::AppError,
    form::{FormData, ShowFormValues, show_input},
    page::Page,
    state::AppState,
};
use crate::services::show::ShowService;

use super::{home_page, log_failure, render_page};

pub async fn list_shows(
    State(app_state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let shows = ShowService::new(app_state.db.clone()).list().await?;

    render_page(
        &app_state,
        jar,
        Page::new("pages/shows.html", json!({ "shows": shows })),
    )
}

pub async fn create_show_form(
    State(app_state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    render_page(
        &app_state,
        jar,
        Page::new(
            "forms/new_show.html",
            json!({ "form": ShowFormValues::starting_at(Utc::now()) }),
        ),
    )
}

pub async fn create_show_submission(
    State(app_state): State<Arc<AppState>>,
    jar: CookieJar,
    form: FormData,
) -> Result<Response, AppError> {
    let outcome = match show_input(&form) {
        Ok(input) => ShowService::new(app_state.db.clone())
            .create(input)
            .await
            .map(|_| ()),
        Err(err) => Err(BookingError::from(err)),
    };

    let message = match outcome {
        Ok(()) => "Show was successfully listed!",
        Err(err) => {
            log_failure("create", "show", &err);
            "An error occurred. Show could not be listed."
        }
    };

    render_page(&app_state, jar, home_page(message.to_string()))
}
