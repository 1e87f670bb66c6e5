use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{StatusCode, header},
    response::{Html, IntoResponse},
    routing::{get, post},
};

use crate::{
    modules,
    web::{AppState, admin, auth, landing, storage, templates, uploads},
};

const ROBOTS_TXT_BODY: &str = include_str!("../../robots.txt");

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(landing::landing_page))
        .route("/contact", get(landing::contact_page))
        .route("/login", get(auth::login_page).post(auth::process_login))
        .route("/logout", post(auth::logout))
        .route("/healthz", get(healthz))
        .route("/robots.txt", get(robots_txt))
        .route("/dashboard", get(admin::dashboard))
        .route("/media/*path", get(storage::serve_media))
        .merge(modules::publications::router())
        .merge(modules::catalogs::router())
        .merge(modules::comments::router())
        .fallback(not_found)
        // Raise axum's default 2 MB body cap so catalog PDF uploads reach
        // the per-field limits in `uploads`.
        .layer(DefaultBodyLimit::max(uploads::MAX_FORM_BODY_BYTES))
        .with_state(state)
}

async fn robots_txt() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        ROBOTS_TXT_BODY,
    )
}

async fn healthz() -> impl IntoResponse {
    StatusCode::OK
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Html(templates::render_not_found()))
}
