use axum::{
    Router,
    extract::{ConnectInfo, Form, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::post,
};
use serde::Deserialize;
use std::net::SocketAddr;
use tracing::{error, info};

use crate::{
    modules::publications,
    sanitize::sanitize_comment_html,
    web::{
        AppState, auth, data,
        models::{FieldError, error_for},
        storage,
    },
};

pub mod admin;

pub const NAMA_MIN_CHARS: usize = 3;
pub const NAMA_MAX_CHARS: usize = 100;
pub const EMAIL_MAX_CHARS: usize = 100;
pub const KOMENTAR_MIN_CHARS: usize = 5;
pub const KOMENTAR_MAX_CHARS: usize = 1000;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/comments", post(submit_comment))
        .merge(admin::router())
}

#[derive(Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub nama: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub komentar: String,
    pub publication_id: Option<i64>,
    #[serde(default)]
    pub recaptcha_token: String,
}

/// Submitted comment form values plus their validation errors, carried back
/// into the publication detail page so the visitor's input is preserved.
#[derive(Default)]
pub struct CommentFormState {
    pub nama: String,
    pub email: String,
    pub komentar: String,
    pub errors: Vec<FieldError>,
}

impl CommentFormState {
    pub fn error_for(&self, field: &str) -> Option<&str> {
        error_for(&self.errors, field)
    }
}

/// Field validation mirrors the public form contract: nama 3-100 chars,
/// valid email up to 100 chars, komentar 5-1000 chars.
pub fn validate_submission(nama: &str, email: &str, komentar: &str) -> Vec<FieldError> {
    let mut errors = Vec::new();

    let nama_len = nama.chars().count();
    if nama.is_empty() {
        errors.push(FieldError::new("nama", "Nama wajib diisi."));
    } else if nama_len < NAMA_MIN_CHARS {
        errors.push(FieldError::new("nama", "Nama minimal 3 karakter."));
    } else if nama_len > NAMA_MAX_CHARS {
        errors.push(FieldError::new("nama", "Nama maksimal 100 karakter."));
    }

    if email.is_empty() {
        errors.push(FieldError::new("email", "Email wajib diisi."));
    } else if !is_valid_email(email) || email.chars().count() > EMAIL_MAX_CHARS {
        errors.push(FieldError::new("email", "Format email tidak valid."));
    }

    let komentar_len = komentar.chars().count();
    if komentar.is_empty() {
        errors.push(FieldError::new("komentar", "Komentar wajib diisi."));
    } else if komentar_len < KOMENTAR_MIN_CHARS {
        errors.push(FieldError::new("komentar", "Komentar minimal 5 karakter."));
    } else if komentar_len > KOMENTAR_MAX_CHARS {
        errors.push(FieldError::new("komentar", "Komentar maksimal 1000 karakter."));
    }

    errors
}

fn is_valid_email(email: &str) -> bool {
    if email.contains(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty() && !tld.is_empty()
}

/// Submitter IP: honor the proxy header when present, otherwise the socket
/// peer address.
fn client_ip(headers: &HeaderMap, peer: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| peer.ip().to_string())
}

pub async fn submit_comment(
    State(state): State<AppState>,
    jar: axum_extra::extract::cookie::CookieJar,
    headers: HeaderMap,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Form(form): Form<CommentForm>,
) -> Response {
    let pool = state.pool();
    let ip = client_ip(&headers, peer);

    // A comment must point at an existing publication; anything else is a 404,
    // not a validation round-trip, because there is no page to re-render.
    let Some(publication_id) = form.publication_id else {
        return storage::not_found_response();
    };
    match data::publication_exists(&pool, publication_id).await {
        Ok(true) => {}
        Ok(false) => return storage::not_found_response(),
        Err(err) => {
            error!(?err, publication_id, "failed to check publication for comment");
            return storage::not_found_response();
        }
    }

    let nama = form.nama.trim().to_string();
    let email = form.email.trim().to_string();
    let komentar = form.komentar.trim().to_string();

    let mut errors = validate_submission(&nama, &email, &komentar);

    // The bot gate runs only when the field checks pass, so a visitor fixing
    // a typo is not forced through verification twice.
    if errors.is_empty() && state.config().recaptcha_required() {
        let passed = state
            .recaptcha()
            .verify(&form.recaptcha_token, Some(&ip))
            .await;
        if !passed {
            errors.push(FieldError::new(
                "recaptcha_token",
                "Verifikasi reCAPTCHA gagal. Silakan coba lagi.",
            ));
        }
    }

    if !errors.is_empty() {
        let form_state = CommentFormState {
            nama,
            email,
            komentar,
            errors,
        };
        return render_detail_with_form(&state, &jar, publication_id, form_state).await;
    }

    let sanitized = sanitize_comment_html(&komentar);

    let inserted: Result<i64, sqlx::Error> = sqlx::query_scalar(
        "INSERT INTO comments (publication_id, nama, email, komentar, status, ip_address) VALUES ($1, $2, $3, $4, 'pending', $5) RETURNING id",
    )
    .bind(publication_id)
    .bind(&nama)
    .bind(&email)
    .bind(&sanitized)
    .bind(&ip)
    .fetch_one(state.pool_ref())
    .await;

    match inserted {
        Ok(comment_id) => {
            info!(comment_id, publication_id, %ip, "new comment received");
            Redirect::to(&format!(
                "/publications/{publication_id}?status=comment_pending#komentar"
            ))
            .into_response()
        }
        Err(err) => {
            error!(?err, %ip, "failed to create comment");
            let form_state = CommentFormState {
                nama,
                email,
                komentar,
                errors: vec![FieldError::new(
                    "komentar",
                    "Terjadi kesalahan saat menyimpan komentar. Silakan coba lagi.",
                )],
            };
            render_detail_with_form(&state, &jar, publication_id, form_state).await
        }
    }
}

async fn render_detail_with_form(
    state: &AppState,
    jar: &axum_extra::extract::cookie::CookieJar,
    publication_id: i64,
    form_state: CommentFormState,
) -> Response {
    let user = auth::current_user(state, jar).await;
    match publications::render_detail(state, user.as_ref(), publication_id, "", &form_state).await {
        Ok(Some(html)) => (StatusCode::UNPROCESSABLE_ENTITY, Html(html)).into_response(),
        Ok(None) => storage::not_found_response(),
        Err(err) => {
            error!(?err, publication_id, "failed to re-render publication detail");
            storage::not_found_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_submission_passes() {
        let errors = validate_submission("Ana", "a@b.com", "Artikel ini sangat membantu");
        assert!(errors.is_empty());
    }

    #[test]
    fn short_and_long_komentar_are_rejected() {
        let errors = validate_submission("Ana", "a@b.com", "oke");
        assert_eq!(error_for(&errors, "komentar"), Some("Komentar minimal 5 karakter."));

        let long = "a".repeat(1001);
        let errors = validate_submission("Ana", "a@b.com", &long);
        assert_eq!(
            error_for(&errors, "komentar"),
            Some("Komentar maksimal 1000 karakter.")
        );

        let exactly_max = "a".repeat(1000);
        assert!(validate_submission("Ana", "a@b.com", &exactly_max).is_empty());
    }

    #[test]
    fn nama_length_bounds() {
        let errors = validate_submission("Al", "a@b.com", "komentar valid");
        assert_eq!(error_for(&errors, "nama"), Some("Nama minimal 3 karakter."));

        let long = "n".repeat(101);
        let errors = validate_submission(&long, "a@b.com", "komentar valid");
        assert_eq!(error_for(&errors, "nama"), Some("Nama maksimal 100 karakter."));

        assert!(validate_submission("Ana", "a@b.com", "komentar valid").is_empty());
    }

    #[test]
    fn missing_fields_report_required_messages() {
        let errors = validate_submission("", "", "");
        assert_eq!(error_for(&errors, "nama"), Some("Nama wajib diisi."));
        assert_eq!(error_for(&errors, "email"), Some("Email wajib diisi."));
        assert_eq!(error_for(&errors, "komentar"), Some("Komentar wajib diisi."));
    }

    #[test]
    fn email_format_is_checked() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("nama.belakang@kampus.ac.id"));
        assert!(!is_valid_email("tanpa-at"));
        assert!(!is_valid_email("@b.com"));
        assert!(!is_valid_email("a@"));
        assert!(!is_valid_email("a@domain"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email("a@.com"));
    }

    #[test]
    fn overlong_email_is_invalid() {
        let email = format!("{}@contoh.com", "x".repeat(100));
        let errors = validate_submission("Ana", &email, "komentar valid");
        assert_eq!(error_for(&errors, "email"), Some("Format email tidak valid."));
    }

    #[test]
    fn client_ip_prefers_forwarded_header() {
        let peer: SocketAddr = "203.0.113.9:443".parse().unwrap();
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers, peer), "203.0.113.9");

        headers.insert("x-forwarded-for", "198.51.100.4, 10.0.0.1".parse().unwrap());
        assert_eq!(client_ip(&headers, peer), "198.51.100.4");
    }
}
