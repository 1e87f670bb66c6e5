use std::borrow::Cow;

use axum::{
    Router,
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::error;

use crate::{
    modules::comments::CommentFormState,
    web::{
        AppState, AuthUser, auth, data, flash,
        models::{CommentRow, PublicationRow},
        storage,
        templates::{
            ActiveNav, PageLayout, escape_html, format_date, render_page,
            render_publication_card,
        },
    },
};

pub mod admin;

const DETAIL_STYLES: &str = r#"
        .detail-hero { width: 100%; max-height: 420px; object-fit: cover; border-radius: 14px; border: 1px solid var(--border); margin-bottom: 1.5rem; }
        .detail-meta { color: var(--faint); font-size: 0.9rem; margin-bottom: 1.5rem; }
        .detail-body p { line-height: 1.75; color: var(--text); }
        .external-link { display: inline-block; margin: 1rem 0 2rem; }
        .comment-list { list-style: none; padding: 0; margin: 0 0 2rem; display: flex; flex-direction: column; gap: 1rem; }
        .comment-list li { background: var(--surface); border: 1px solid var(--border); border-radius: 10px; padding: 1rem 1.25rem; }
        .comment-list .who { font-weight: 700; margin: 0 0 0.25rem; }
        .comment-list .when { color: var(--faint); font-size: 0.85rem; margin-left: 0.5rem; font-weight: 400; }
        .comment-list .body { margin: 0; color: var(--muted); line-height: 1.6; }
        .recaptcha-slot { margin-bottom: 1.25rem; }
"#;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/publications", get(index).post(admin::store))
        .route("/publications/create", get(admin::create_form))
        .route("/publications/:id", get(show).post(admin::update))
        .route("/publications/:id/edit", get(admin::edit_form))
        .route("/publications/:id/delete", post(admin::destroy))
        .route("/manage-publications", get(admin::manage))
}

#[derive(Default, Deserialize)]
pub struct PageQuery {
    pub status: Option<String>,
    pub error: Option<String>,
}

async fn index(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<PageQuery>,
) -> Response {
    let user = auth::current_user(&state, &jar).await;
    let pool = state.pool();

    let publications = match data::fetch_publications(&pool).await {
        Ok(rows) => rows,
        Err(err) => {
            error!(?err, "failed to load publications index");
            Vec::new()
        }
    };

    let cards = if publications.is_empty() {
        r#"<p class="page-subtitle">Belum ada publikasi.</p>"#.to_string()
    } else {
        format!(
            r#"<div class="card-grid">{}</div>"#,
            publications
                .iter()
                .map(render_publication_card)
                .collect::<String>()
        )
    };

    let content = format!(
        r#"        <h1 class="page-heading">Publikasi</h1>
        <p class="page-subtitle">Artikel dan terbitan jurnal terbaru.</p>
        {cards}
"#,
    );

    let flash_html = flash::compose_flash_message(params.status.as_deref(), params.error.as_deref());
    Html(render_page(PageLayout {
        meta_title: "Publikasi | Jurnal & Katalog",
        active_nav: ActiveNav::Publications,
        user: user.as_ref(),
        flash_html: Cow::Owned(flash_html),
        content_html: Cow::Owned(content),
        extra_style_blocks: Vec::new(),
        body_scripts: Vec::new(),
    }))
    .into_response()
}

async fn show(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<i64>,
    Query(params): Query<PageQuery>,
) -> Response {
    let user = auth::current_user(&state, &jar).await;
    let flash_html = flash::compose_flash_message(params.status.as_deref(), params.error.as_deref());

    match render_detail(
        &state,
        user.as_ref(),
        id,
        &flash_html,
        &CommentFormState::default(),
    )
    .await
    {
        Ok(Some(html)) => Html(html).into_response(),
        Ok(None) => storage::not_found_response(),
        Err(err) => {
            error!(?err, publication_id = id, "failed to load publication detail");
            storage::not_found_response()
        }
    }
}

/// Full publication detail page: body, approved comments, and the comment
/// form. The comment submit handler re-renders through this with the
/// visitor's rejected input so nothing they typed is lost.
pub async fn render_detail(
    state: &AppState,
    user: Option<&AuthUser>,
    publication_id: i64,
    flash_html: &str,
    form: &CommentFormState,
) -> sqlx::Result<Option<String>> {
    let pool = state.pool();

    let Some(publication) = data::fetch_publication(&pool, publication_id).await? else {
        return Ok(None);
    };
    let comments = data::fetch_approved_comments(&pool, publication_id).await?;

    let meta_title = format!("{} | Jurnal & Katalog", publication.title);
    let content = render_detail_content(state, &publication, &comments, form);

    let mut body_scripts = Vec::new();
    if state.config().recaptcha_site_key.is_some() {
        body_scripts.push(Cow::Borrowed(RECAPTCHA_FORM_SCRIPT));
    }

    Ok(Some(render_page(PageLayout {
        meta_title: &meta_title,
        active_nav: ActiveNav::Publications,
        user,
        flash_html: Cow::Borrowed(flash_html),
        content_html: Cow::Owned(content),
        extra_style_blocks: vec![Cow::Borrowed(DETAIL_STYLES)],
        body_scripts,
    })))
}

/// Copy the widget's response into the form field the server reads.
const RECAPTCHA_FORM_SCRIPT: &str = r#"<script src="https://www.google.com/recaptcha/api.js" async defer></script>
<script>
document.getElementById('comment-form').addEventListener('submit', () => {
    const widget = document.querySelector('textarea[name="g-recaptcha-response"]');
    document.getElementById('recaptcha_token').value = widget ? widget.value : '';
});
</script>"#;

fn render_detail_content(
    state: &AppState,
    publication: &PublicationRow,
    comments: &[CommentRow],
    form: &CommentFormState,
) -> String {
    let title = escape_html(&publication.title);

    let hero = match publication.image.as_deref() {
        Some(image) => format!(
            r#"<img class="detail-hero" src="/media/{src}" alt="{title}">"#,
            src = escape_html(image),
        ),
        None => String::new(),
    };

    let external_link = match publication.link_route.as_deref() {
        Some(url) if !url.is_empty() => format!(
            r#"<a class="external-link" href="{url}" target="_blank" rel="noopener">Baca selengkapnya &rarr;</a>"#,
            url = escape_html(url),
        ),
        _ => String::new(),
    };

    format!(
        r#"        <article>
            {hero}
            <h1 class="page-heading">{title}</h1>
            <p class="detail-meta">{author} · {date}</p>
            <div class="detail-body">{body}</div>
            {external_link}
        </article>
        <section id="komentar">
            <h2>Komentar ({count})</h2>
            {comment_list}
            {comment_form}
        </section>
"#,
        author = escape_html(&publication.author_name),
        date = format_date(publication.created_at),
        body = render_paragraphs(&publication.description),
        count = comments.len(),
        comment_list = render_comment_list(comments),
        comment_form = render_comment_form(state, publication.id, form),
    )
}

/// Escape plain text and split it into paragraphs on blank lines.
fn render_paragraphs(text: &str) -> String {
    text.split("\n\n")
        .map(str::trim)
        .filter(|block| !block.is_empty())
        .map(|block| format!("<p>{}</p>", escape_html(block).replace('\n', "<br>")))
        .collect()
}

fn render_comment_list(comments: &[CommentRow]) -> String {
    if comments.is_empty() {
        return r#"<p class="page-subtitle">Belum ada komentar. Jadilah yang pertama berkomentar.</p>"#
            .to_string();
    }

    let items = comments
        .iter()
        .map(|comment| {
            // `komentar` was run through the allowlist sanitizer on write.
            format!(
                r#"<li>
                    <p class="who">{nama}<span class="when">{date}</span></p>
                    <p class="body">{komentar}</p>
                </li>"#,
                nama = escape_html(&comment.nama),
                date = format_date(comment.created_at),
                komentar = comment.komentar,
            )
        })
        .collect::<String>();

    format!(r#"<ul class="comment-list">{items}</ul>"#)
}

fn field_error_html(form: &CommentFormState, field: &str) -> String {
    form.error_for(field)
        .map(|message| format!(r#"<p class="field-error">{}</p>"#, escape_html(message)))
        .unwrap_or_default()
}

fn render_comment_form(state: &AppState, publication_id: i64, form: &CommentFormState) -> String {
    let recaptcha_slot = match state.config().recaptcha_site_key.as_deref() {
        Some(site_key) => format!(
            r#"<div class="recaptcha-slot">
                    <div class="g-recaptcha" data-sitekey="{site_key}"></div>
                    {error}
                </div>"#,
            site_key = escape_html(site_key),
            error = field_error_html(form, "recaptcha_token"),
        ),
        None => field_error_html(form, "recaptcha_token"),
    };

    format!(
        r#"<section class="panel">
                <h2>Tulis Komentar</h2>
                <form id="comment-form" method="post" action="/comments">
                    <input type="hidden" name="publication_id" value="{publication_id}">
                    <input type="hidden" id="recaptcha_token" name="recaptcha_token" value="">
                    <div class="form-field">
                        <label for="nama">Nama</label>
                        <input id="nama" type="text" name="nama" value="{nama}" required>
                        {nama_error}
                    </div>
                    <div class="form-field">
                        <label for="email">Email</label>
                        <input id="email" type="email" name="email" value="{email}" required>
                        <p class="field-hint">Email tidak akan ditampilkan.</p>
                        {email_error}
                    </div>
                    <div class="form-field">
                        <label for="komentar">Komentar</label>
                        <textarea id="komentar" name="komentar" required>{komentar}</textarea>
                        {komentar_error}
                    </div>
                    {recaptcha_slot}
                    <button class="primary" type="submit">Kirim Komentar</button>
                </form>
            </section>"#,
        nama = escape_html(&form.nama),
        nama_error = field_error_html(form, "nama"),
        email = escape_html(&form.email),
        email_error = field_error_html(form, "email"),
        komentar = escape_html(&form.komentar),
        komentar_error = field_error_html(form, "komentar"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::models::FieldError;

    #[test]
    fn paragraphs_split_on_blank_lines() {
        let html = render_paragraphs("Paragraf satu.\n\nParagraf dua.\nLanjutan baris.");
        assert_eq!(
            html,
            "<p>Paragraf satu.</p><p>Paragraf dua.<br>Lanjutan baris.</p>"
        );
    }

    #[test]
    fn paragraphs_escape_markup() {
        let html = render_paragraphs("<script>alert(1)</script>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn empty_comment_list_shows_invite() {
        assert!(render_comment_list(&[]).contains("Belum ada komentar"));
    }

    #[test]
    fn form_errors_render_next_to_fields() {
        let form = CommentFormState {
            nama: "Al".to_string(),
            email: String::new(),
            komentar: String::new(),
            errors: vec![FieldError::new("nama", "Nama minimal 3 karakter.")],
        };
        assert_eq!(
            field_error_html(&form, "nama"),
            r#"<p class="field-error">Nama minimal 3 karakter.</p>"#
        );
        assert!(field_error_html(&form, "email").is_empty());
    }
}
