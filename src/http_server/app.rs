use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
use color_eyre::eyre::{Context, eyre};
use tower_http::trace::TraceLayer;

use crate::{
    database::Database,
    http_server::{
        http_routes::{artists, pages, render_error_pages, shows, venues},
        page::JsonPageRenderer,
        state::AppState,
    },
};

pub struct HttpServerConfig {
    pub host: String,
    pub port: u16,
    pub database: Database,
}

pub fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(pages::index))
        .route("/venues", get(venues::list_venues))
        .route("/venues/search", post(venues::search_venues))
        .route(
            "/venues/create",
            get(venues::create_venue_form).post(venues::create_venue_submission),
        )
        .route("/venues/{id}", get(venues::show_venue))
        .route(
            "/venues/{id}/edit",
            get(venues::edit_venue).post(venues::edit_venue_submission),
        )
        .route("/venues/{id}/delete", post(venues::delete_venue))
        .route("/artists", get(artists::list_artists))
        .route("/artists/search", post(artists::search_artists))
        .route(
            "/artists/create",
            get(artists::create_artist_form).post(artists::create_artist_submission),
        )
        .route("/artists/{id}", get(artists::show_artist))
        .route(
            "/artists/{id}/edit",
            get(artists::edit_artist).post(artists::edit_artist_submission),
        )
        .route("/artist/{id}", delete(artists::delete_artist))
        .route("/shows", get(shows::list_shows))
        .route(
            "/shows/create",
            get(shows::create_show_form).post(shows::create_show_submission),
        )
        .fallback(pages::not_found)
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            render_error_pages,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

pub async fn start(config: HttpServerConfig) -> color_eyre::Result<()> {
    let app_state = Arc::new(AppState {
        db: Arc::new(config.database),
        renderer: Arc::new(JsonPageRenderer),
    });

    let app = router(app_state);

    let address = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .wrap_err_with(|| eyre!("Failed to bind to {}", address))?;
    log::info!("Listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .wrap_err("Failed to start HTTP server")?;

    log::info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{Body, to_bytes},
        http::{HeaderMap, Method, Request, StatusCode, header},
    };
    use axum_extra::extract::cookie::Cookie;
    use chrono::{Duration, Utc};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::http_server::page::{MockPageRenderer, RenderError};
    use crate::test_utils::{insert_artist, insert_show, insert_venue, test_db};

    async fn test_app() -> (Router, Arc<Database>) {
        let db = test_db().await;
        let app_state = Arc::new(AppState {
            db: db.clone(),
            renderer: Arc::new(JsonPageRenderer),
        });
        (router(app_state), db)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, String) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, String::from_utf8(body.to_vec()).unwrap())
    }

    async fn get_page(app: &Router, uri: &str) -> (StatusCode, Value) {
        let request = Request::get(uri).body(Body::empty()).unwrap();
        let (status, _, body) = send(app, request).await;
        (status, serde_json::from_str(&body).unwrap())
    }

    fn form_request(method: Method, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    /// The decoded `flash` cookie a response sets
    fn flash_cookie(headers: &HeaderMap) -> Cookie<'static> {
        let set_cookie = headers[header::SET_COOKIE].to_str().unwrap().to_string();
        let cookie = Cookie::parse_encoded(set_cookie).unwrap();
        assert_eq!(cookie.name(), "flash");
        cookie
    }

    async fn post_page(app: &Router, uri: &str, body: &str) -> (StatusCode, Value) {
        let (status, _, body) = send(app, form_request(Method::POST, uri, body)).await;
        (status, serde_json::from_str(&body).unwrap())
    }

    #[tokio::test]
    async fn test_home_page() {
        let (app, _db) = test_app().await;

        let (status, page) = get_page(&app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["template"], "pages/home.html");
        assert_eq!(page["flashes"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_create_venue_then_view_detail() {
        let (app, _db) = test_app().await;

        let (status, page) = post_page(
            &app,
            "/venues/create",
            "name=The+Fillmore&city=San+Francisco&state=CA&address=1805+Geary+Blvd\
             &genres=Jazz&genres=Folk&seeking_talent=y&website_link=https%3A%2F%2Ffillmore.example",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["template"], "pages/home.html");
        assert_eq!(
            page["flashes"][0],
            "Venue The Fillmore was successfully listed!"
        );

        let (status, page) = get_page(&app, "/venues/1").await;
        assert_eq!(status, StatusCode::OK);
        let venue = &page["context"]["venue"];
        assert_eq!(venue["name"], "The Fillmore");
        assert_eq!(venue["genres"], serde_json::json!(["Jazz", "Folk"]));
        assert_eq!(venue["seeking_talent"], true);
        assert_eq!(venue["website"], "https://fillmore.example");
        assert_eq!(venue["past_shows_count"], 0);
        assert_eq!(venue["upcoming_shows_count"], 0);
    }

    #[tokio::test]
    async fn test_create_venue_seeking_needs_literal_yes() {
        let (app, _db) = test_app().await;

        post_page(
            &app,
            "/venues/create",
            "name=Bluebird&city=Nashville&state=TN&seeking_talent=on",
        )
        .await;

        let (_, page) = get_page(&app, "/venues/1").await;
        assert_eq!(page["context"]["venue"]["seeking_talent"], false);
    }

    #[tokio::test]
    async fn test_create_venue_without_name_flashes_error() {
        let (app, _db) = test_app().await;

        let (status, page) =
            post_page(&app, "/venues/create", "city=Austin&state=TX").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            page["flashes"][0],
            "An error occurred. Venue  could not be listed."
        );

        let (_, page) = get_page(&app, "/venues").await;
        assert_eq!(page["context"]["areas"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_unknown_or_malformed_ids_render_404() {
        let (app, _db) = test_app().await;

        for uri in ["/venues/99", "/venues/abc", "/artists/99", "/nowhere"] {
            let (status, page) = get_page(&app, uri).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
            assert_eq!(page["template"], "errors/404.html");
        }
    }

    #[tokio::test]
    async fn test_venues_grouped_by_area() {
        let (app, db) = test_app().await;
        insert_venue(&db, "Continental Club", "Austin", "TX").await;
        insert_venue(&db, "Mohawk", "Austin", "TX").await;
        insert_venue(&db, "Bluebird", "Nashville", "TN").await;

        let (_, page) = get_page(&app, "/venues").await;
        let areas = page["context"]["areas"].as_array().unwrap();
        assert_eq!(areas.len(), 2);
        assert_eq!(areas[0]["city"], "Austin");
        assert_eq!(areas[0]["venues"].as_array().unwrap().len(), 2);
        assert_eq!(areas[1]["city"], "Nashville");
    }

    #[tokio::test]
    async fn test_edit_venue_redirects_with_flash() {
        let (app, db) = test_app().await;
        let venue = insert_venue(&db, "Mohawk", "Austin", "TX").await;

        let (status, headers, _) = send(
            &app,
            form_request(
                Method::POST,
                &format!("/venues/{}/edit", venue.id),
                "name=Mohawk+Austin&city=Austin&state=TX&seeking_talent=",
            ),
        )
        .await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(
            headers[header::LOCATION],
            format!("/venues/{}", venue.id).as_str()
        );

        let set_cookie = headers[header::SET_COOKIE].to_str().unwrap();
        let cookie = set_cookie.split(';').next().unwrap().to_string();

        let request = Request::get(format!("/venues/{}", venue.id))
            .header(header::COOKIE, cookie)
            .body(Body::empty())
            .unwrap();
        let (status, headers, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert!(headers.contains_key(header::SET_COOKIE));

        let page: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(page["flashes"][0], "Venue was successfully updated!");
        assert_eq!(page["context"]["venue"]["name"], "Mohawk Austin");
        assert_eq!(page["context"]["venue"]["seeking_talent"], true);
    }

    #[tokio::test]
    async fn test_edit_artist_failure_flashes_id() {
        let (app, db) = test_app().await;
        let artist = insert_artist(&db, "Nina").await;

        let (status, headers, _) = send(
            &app,
            form_request(
                Method::POST,
                &format!("/artists/{}/edit", artist.id),
                "name=&city=Oakland&state=CA",
            ),
        )
        .await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(
            flash_cookie(&headers).value(),
            format!("An error occurred, Artist {} was not edited!", artist.id)
        );
    }

    #[tokio::test]
    async fn test_failed_edit_flash_shows_on_404_page_once() {
        let (app, _db) = test_app().await;

        let (status, headers, _) = send(
            &app,
            form_request(
                Method::POST,
                "/venues/42/edit",
                "name=Ghost&city=Austin&state=TX",
            ),
        )
        .await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(headers[header::LOCATION], "/venues/42");
        let cookie = flash_cookie(&headers);

        let request = Request::get("/venues/42")
            .header(header::COOKIE, cookie.stripped().encoded().to_string())
            .body(Body::empty())
            .unwrap();
        let (status, headers, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let page: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(page["template"], "errors/404.html");
        assert_eq!(
            page["flashes"],
            serde_json::json!(["An error occurred. Venue could not be changed."])
        );
        assert_eq!(flash_cookie(&headers).value(), "");
    }

    #[tokio::test]
    async fn test_edit_form_prefills_and_tolerates_unknown_id() {
        let (app, db) = test_app().await;
        let artist = insert_artist(&db, "Nina").await;

        let (status, page) = get_page(&app, &format!("/artists/{}/edit", artist.id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["template"], "forms/edit_artist.html");
        assert_eq!(page["context"]["form"]["name"], "Nina");
        assert_eq!(page["context"]["form"]["genres"], serde_json::json!(["Jazz"]));
        assert_eq!(page["context"]["artist"]["id"], artist.id);

        let (status, page) = get_page(&app, "/venues/42/edit").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["context"]["form"]["name"], "");
        assert_eq!(page["context"]["venue"], Value::Null);
    }

    #[tokio::test]
    async fn test_delete_venue_removes_its_shows() {
        let (app, db) = test_app().await;
        let venue = insert_venue(&db, "Mohawk", "Austin", "TX").await;
        let artist = insert_artist(&db, "Nina").await;
        insert_show(&db, venue.id, artist.id, Utc::now() + Duration::days(3)).await;

        let (status, page) =
            post_page(&app, &format!("/venues/{}/delete", venue.id), "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            page["flashes"][0],
            "The Venue Mohawk was successfully deleted."
        );

        let (_, page) = get_page(&app, "/shows").await;
        assert_eq!(page["context"]["shows"], serde_json::json!([]));
        let (status, _) = get_page(&app, &format!("/venues/{}", venue.id)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_unknown_venue_flashes_id() {
        let (app, _db) = test_app().await;

        let (status, page) = post_page(&app, "/venues/7/delete", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            page["flashes"][0],
            "Error while trying to delete venue #7. Please Try again."
        );
    }

    #[tokio::test]
    async fn test_delete_artist_uses_delete_method() {
        let (app, db) = test_app().await;
        let artist = insert_artist(&db, "Nina").await;

        let request = Request::delete(format!("/artist/{}", artist.id))
            .body(Body::empty())
            .unwrap();
        let (status, _, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        let page: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(
            page["flashes"][0],
            "The Artist Nina was successfully deleted."
        );

        let (_, page) = get_page(&app, "/artists").await;
        assert_eq!(page["context"]["artists"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_create_show() {
        let (app, db) = test_app().await;
        let venue = insert_venue(&db, "Mohawk", "Austin", "TX").await;
        let artist = insert_artist(&db, "Nina").await;

        let (_, page) = post_page(
            &app,
            "/shows/create",
            &format!("artist_id={}&venue_id=999&start_time=2035-05-21+21%3A30%3A00", artist.id),
        )
        .await;
        assert_eq!(page["flashes"][0], "An error occurred. Show could not be listed.");

        let (_, page) = post_page(
            &app,
            "/shows/create",
            &format!(
                "artist_id={}&venue_id={}&start_time=2035-05-21+21%3A30%3A00",
                artist.id, venue.id
            ),
        )
        .await;
        assert_eq!(page["flashes"][0], "Show was successfully listed!");

        let (_, page) = get_page(&app, "/shows").await;
        let shows = page["context"]["shows"].as_array().unwrap();
        assert_eq!(shows.len(), 1);
        assert_eq!(shows[0]["venue_name"], "Mohawk");
        assert_eq!(shows[0]["artist_name"], "Nina");

        let (_, page) = get_page(&app, &format!("/artists/{}", artist.id)).await;
        assert_eq!(page["context"]["artist"]["upcoming_shows_count"], 1);
    }

    #[tokio::test]
    async fn test_search_counts_upcoming_per_result() {
        let (app, db) = test_app().await;
        let mohawk = insert_venue(&db, "Mohawk", "Austin", "TX").await;
        insert_venue(&db, "Mohawk Annex", "Austin", "TX").await;
        let artist = insert_artist(&db, "Nina").await;
        insert_show(&db, mohawk.id, artist.id, Utc::now() + Duration::days(1)).await;
        insert_show(&db, mohawk.id, artist.id, Utc::now() - Duration::days(1)).await;

        let (status, page) = post_page(&app, "/venues/search", "search_term=mohawk").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["context"]["search_term"], "mohawk");
        let results = &page["context"]["results"];
        assert_eq!(results["count"], 2);
        assert_eq!(results["data"][0]["num_upcoming_shows"], 1);
        assert_eq!(results["data"][1]["num_upcoming_shows"], 0);

        let (_, page) = post_page(&app, "/artists/search", "search_term=zzz").await;
        assert_eq!(page["context"]["results"]["count"], 0);
    }

    #[tokio::test]
    async fn test_renderer_failure_is_500() {
        let db = test_db().await;
        let mut renderer = MockPageRenderer::new();
        renderer
            .expect_render()
            .returning(|page| Err(RenderError::MissingTemplate(page.template.to_string())));
        let app = router(Arc::new(AppState {
            db,
            renderer: Arc::new(renderer),
        }));

        let request = Request::get("/").body(Body::empty()).unwrap();
        let (status, _, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Something went wrong");
    }
}
