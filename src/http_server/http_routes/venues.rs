use std::sync::Arc;

use axum::{extract::State, response::Response};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde_json::json;

use crate::error::BookingError;
use crate::http_server::{
    error::AppError,
    form::{FormData, SeekingRule, VenueFormValues, venue_input},
    page::Page,
    state::AppState,
};
use crate::services::venue::VenueService;

use super::{EntityId, home_page, log_failure, redirect_with_flash, render_page};

pub async fn list_venues(
    State(app_state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let areas = VenueService::new(app_state.db.clone())
        .list_by_area(Utc::now())
        .await?;

    render_page(
        &app_state,
        jar,
        Page::new("pages/venues.html", json!({ "areas": areas })),
    )
}

pub async fn search_venues(
    State(app_state): State<Arc<AppState>>,
    jar: CookieJar,
    form: FormData,
) -> Result<Response, AppError> {
    let search_term = form.get("search_term").unwrap_or_default().to_string();
    let results = VenueService::new(app_state.db.clone())
        .search(&search_term, Utc::now())
        .await?;

    render_page(
        &app_state,
        jar,
        Page::new(
            "pages/search_venues.html",
            json!({ "results": results, "search_term": search_term }),
        ),
    )
}

pub async fn show_venue(
    State(app_state): State<Arc<AppState>>,
    jar: CookieJar,
    EntityId(venue_id): EntityId,
) -> Result<Response, AppError> {
    let venue = VenueService::new(app_state.db.clone())
        .detail(venue_id, Utc::now())
        .await?;

    render_page(
        &app_state,
        jar,
        Page::new("pages/show_venue.html", json!({ "venue": venue })),
    )
}

pub async fn create_venue_form(
    State(app_state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    render_page(
        &app_state,
        jar,
        Page::new(
            "forms/new_venue.html",
            json!({ "form": VenueFormValues::default() }),
        ),
    )
}

pub async fn create_venue_submission(
    State(app_state): State<Arc<AppState>>,
    jar: CookieJar,
    form: FormData,
) -> Result<Response, AppError> {
    let name = form.get("name").unwrap_or_default().to_string();

    let outcome = match venue_input(&form, SeekingRule::LiteralYes) {
        Ok(input) => VenueService::new(app_state.db.clone())
            .create(input)
            .await
            .map(|_| ()),
        Err(err) => Err(BookingError::from(err)),
    };

    let message = match outcome {
        Ok(()) => format!("Venue {name} was successfully listed!"),
        Err(err) => {
            log_failure("create", "venue", &err);
            format!("An error occurred. Venue {name} could not be listed.")
        }
    };

    render_page(&app_state, jar, home_page(message))
}

/// Edit form, filled with the venue's current values. An unknown id gets an empty form.
pub async fn edit_venue(
    State(app_state): State<Arc<AppState>>,
    jar: CookieJar,
    EntityId(venue_id): EntityId,
) -> Result<Response, AppError> {
    let venue = VenueService::new(app_state.db.clone())
        .find(venue_id)
        .await?;

    let form = match &venue {
        Some(venue) => VenueFormValues::from_model(venue)?,
        None => VenueFormValues::default(),
    };
    let venue = venue.map(|venue| json!({ "id": venue.id, "name": venue.name }));

    render_page(
        &app_state,
        jar,
        Page::new("forms/edit_venue.html", json!({ "form": form, "venue": venue })),
    )
}

pub async fn edit_venue_submission(
    State(app_state): State<Arc<AppState>>,
    jar: CookieJar,
    EntityId(venue_id): EntityId,
    form: FormData,
) -> Response {
    let outcome = match venue_input(&form, SeekingRule::KeyPresent) {
        Ok(input) => VenueService::new(app_state.db.clone())
            .update(venue_id, input)
            .await
            .map(|_| ()),
        Err(err) => Err(BookingError::from(err)),
    };

    let message = match outcome {
        Ok(()) => "Venue was successfully updated!",
        Err(err) => {
            log_failure("update", "venue", &err);
            "An error occurred. Venue could not be changed."
        }
    };

    redirect_with_flash(jar, &format!("/venues/{venue_id}"), message)
}

pub async fn delete_venue(
    State(app_state): State<Arc<AppState>>,
    jar: CookieJar,
    EntityId(venue_id): EntityId,
) -> Result<Response, AppError> {
    let service = VenueService::new(app_state.db.clone());

    let message = match service.delete(venue_id).await {
        Ok(venue) => format!("The Venue {} was successfully deleted.", venue.name),
        Err(err) => {
            log_failure("delete", "venue", &err);
            let label = match err {
                BookingError::NotFound { .. } => None,
                _ => service.find(venue_id).await.ok().flatten().map(|venue| venue.name),
            }
            .unwrap_or_else(|| format!("#{venue_id}"));
            format!("Error while trying to delete venue {label}. Please Try again.")
        }
    };

    render_page(&app_state, jar, home_page(message))
}
