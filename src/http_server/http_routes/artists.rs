use std::sync::Arc;

use axum::{extract::State, response::Response};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde_json::json;

use crate::error::BookingError;
use crate::http_server::{
    error::AppError,
    form::{ArtistFormValues, FormData, SeekingRule, artist_input},
    page::Page,
    state::AppState,
};
use crate::services::artist::ArtistService;

use super::{EntityId, home_page, log_failure, redirect_with_flash, render_page};

pub async fn list_artists(
    State(app_state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let artists = ArtistService::new(app_state.db.clone()).list().await?;

    render_page(
        &app_state,
        jar,
        Page::new("pages/artists.html", json!({ "artists": artists })),
    )
}

pub async fn search_artists(
    State(app_state): State<Arc<AppState>>,
    jar: CookieJar,
    form: FormData,
) -> Result<Response, AppError> {
    let search_term = form.get("search_term").unwrap_or_default().to_string();
    let results = ArtistService::new(app_state.db.clone())
        .search(&search_term, Utc::now())
        .await?;

    render_page(
        &app_state,
        jar,
        Page::new(
            "pages/search_artists.html",
            json!({ "results": results, "search_term": search_term }),
        ),
    )
}

pub async fn show_artist(
    State(app_state): State<Arc<AppState>>,
    jar: CookieJar,
    EntityId(artist_id): EntityId,
) -> Result<Response, AppError> {
    let artist = ArtistService::new(app_state.db.clone())
        .detail(artist_id, Utc::now())
        .await?;

    render_page(
        &app_state,
        jar,
        Page::new("pages/show_artist.html", json!({ "artist": artist })),
    )
}

pub async fn create_artist_form(
    State(app_state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    render_page(
        &app_state,
        jar,
        Page::new(
            "forms/new_artist.html",
            json!({ "form": ArtistFormValues::default() }),
        ),
    )
}

pub async fn create_artist_submission(
    State(app_state): State<Arc<AppState>>,
    jar: CookieJar,
    form: FormData,
) -> Result<Response, AppError> {
    let name = form.get("name").unwrap_or_default().to_string();

    let outcome = match artist_input(&form, SeekingRule::LiteralYes) {
        Ok(input) => ArtistService::new(app_state.db.clone())
            .create(input)
            .await
            .map(|_| ()),
        Err(err) => Err(BookingError::from(err)),
    };

    let message = match outcome {
        Ok(()) => format!("Artist {name} was successfully listed!"),
        Err(err) => {
            log_failure("create", "artist", &err);
            format!("An error occurred. Artist {name} could not be listed.")
        }
    };

    render_page(&app_state, jar, home_page(message))
}

pub async fn edit_artist(
    State(app_state): State<Arc<AppState>>,
    jar: CookieJar,
    EntityId(artist_id): EntityId,
) -> Result<Response, AppError> {
    let artist = ArtistService::new(app_state.db.clone())
        .find(artist_id)
        .await?;

    let form = match &artist {
        Some(artist) => ArtistFormValues::from_model(artist)?,
        None => ArtistFormValues::default(),
    };
    let artist = artist.map(|artist| json!({ "id": artist.id, "name": artist.name }));

    render_page(
        &app_state,
        jar,
        Page::new(
            "forms/edit_artist.html",
            json!({ "form": form, "artist": artist }),
        ),
    )
}

pub async fn edit_artist_submission(
    State(app_state): State<Arc<AppState>>,
    jar: CookieJar,
    EntityId(artist_id): EntityId,
    form: FormData,
) -> Response {
    let outcome = match artist_input(&form, SeekingRule::KeyPresent) {
        Ok(input) => ArtistService::new(app_state.db.clone())
            .update(artist_id, input)
            .await
            .map(|_| ()),
        Err(err) => Err(BookingError::from(err)),
    };

    let message = match outcome {
        Ok(()) => "Artist was updated!".to_string(),
        Err(err) => {
            log_failure("update", "artist", &err);
            format!("An error occurred, Artist {artist_id} was not edited!")
        }
    };

    redirect_with_flash(jar, &format!("/artists/{artist_id}"), &message)
}

pub async fn delete_artist(
    State(app_state): State<Arc<AppState>>,
    jar: CookieJar,
    EntityId(artist_id): EntityId,
) -> Result<Response, AppError> {
    let service = ArtistService::new(app_state.db.clone());

    let message = match service.delete(artist_id).await {
        Ok(artist) => format!("The Artist {} was successfully deleted.", artist.name),
        Err(err) => {
            log_failure("delete", "artist", &err);
            let label = match err {
                BookingError::NotFound { .. } => None,
                _ => service.find(artist_id).await.ok().flatten().map(|artist| artist.name),
            }
            .unwrap_or_else(|| format!("#{artist_id}"));
            format!("Error while trying to delete Artist {label}. Please Try again.")
        }
    };

    render_page(&app_state, jar, home_page(message))
}
