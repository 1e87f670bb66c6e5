use std::borrow::Cow;

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, Redirect},
    routing::{delete, get, put},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::{error, info};

use crate::web::{
    AppState,
    admin::{require_admin_api, require_admin_user},
    flash,
    models::{AdminCommentRow, CommentCounts, CommentFilter, CommentStatus},
    templates::{self, ActiveNav, PageLayout, escape_html, render_page},
};

pub const COMMENTS_PER_PAGE: i64 = 15;

const PANEL_STYLES: &str = r#"
        .filter-row { display: flex; gap: 0.6rem; flex-wrap: wrap; margin-bottom: 1.5rem; }
        .filter-row a { padding: 0.45rem 0.95rem; border-radius: 999px; border: 1px solid var(--border); background: var(--surface); color: var(--muted); text-decoration: none; font-weight: 600; font-size: 0.9rem; }
        .filter-row a.active { border-color: var(--accent); color: var(--accent); background: var(--accent-soft); }
        td.komentar-cell { max-width: 340px; }
        td.komentar-cell .body { margin: 0; line-height: 1.55; color: var(--muted); }
        .comment-actions { display: flex; gap: 0.4rem; flex-wrap: wrap; }
        .pagination { display: flex; gap: 0.5rem; margin-top: 1.5rem; align-items: center; }
        .pagination a, .pagination span { padding: 0.4rem 0.85rem; border-radius: 8px; border: 1px solid var(--border); text-decoration: none; color: var(--muted); font-weight: 600; }
        .pagination span.current { border-color: var(--accent); color: var(--accent); }
"#;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/comments", get(moderation_panel))
        .route("/admin/comments/:id/approve", put(approve_comment))
        .route("/admin/comments/:id/reject", put(reject_comment))
        .route("/admin/comments/:id", delete(delete_comment))
}

#[derive(Default, Deserialize)]
pub struct ModerationQuery {
    pub filter: Option<String>,
    pub page: Option<i64>,
    pub status: Option<String>,
    pub error: Option<String>,
}

/// Number of pages needed for `total` rows; always at least one so the panel
/// renders a current page even when empty.
fn page_count(total: i64, per_page: i64) -> i64 {
    if total <= 0 {
        return 1;
    }
    (total + per_page - 1) / per_page
}

fn filtered_total(counts: CommentCounts, filter: CommentFilter) -> i64 {
    match filter {
        CommentFilter::All => counts.total(),
        CommentFilter::Status(CommentStatus::Pending) => counts.pending,
        CommentFilter::Status(CommentStatus::Approved) => counts.approved,
        CommentFilter::Status(CommentStatus::Rejected) => counts.rejected,
    }
}

async fn fetch_comment_counts(pool: &PgPool) -> sqlx::Result<CommentCounts> {
    let rows: Vec<(String, i64)> =
        sqlx::query_as("SELECT status, COUNT(*) FROM comments GROUP BY status")
            .fetch_all(pool)
            .await?;

    let mut counts = CommentCounts::default();
    for (status, count) in rows {
        match CommentStatus::parse(&status) {
            Some(CommentStatus::Pending) => counts.pending = count,
            Some(CommentStatus::Approved) => counts.approved = count,
            Some(CommentStatus::Rejected) => counts.rejected = count,
            None => {}
        }
    }
    Ok(counts)
}

async fn fetch_admin_comments(
    pool: &PgPool,
    filter: CommentFilter,
    page: i64,
) -> sqlx::Result<Vec<AdminCommentRow>> {
    const COLUMNS: &str = "comments.id, comments.publication_id, publications.title AS publication_title, comments.nama, comments.email, comments.komentar, comments.status, comments.ip_address, comments.created_at";
    let offset = (page - 1) * COMMENTS_PER_PAGE;

    match filter {
        CommentFilter::All => {
            sqlx::query_as::<_, AdminCommentRow>(&format!(
                "SELECT {COLUMNS} FROM comments JOIN publications ON publications.id = comments.publication_id ORDER BY comments.created_at DESC LIMIT $1 OFFSET $2",
            ))
            .bind(COMMENTS_PER_PAGE)
            .bind(offset)
            .fetch_all(pool)
            .await
        }
        CommentFilter::Status(status) => {
            sqlx::query_as::<_, AdminCommentRow>(&format!(
                "SELECT {COLUMNS} FROM comments JOIN publications ON publications.id = comments.publication_id WHERE comments.status = $1 ORDER BY comments.created_at DESC LIMIT $2 OFFSET $3",
            ))
            .bind(status.as_str())
            .bind(COMMENTS_PER_PAGE)
            .bind(offset)
            .fetch_all(pool)
            .await
        }
    }
}

pub async fn moderation_panel(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<ModerationQuery>,
) -> Result<Html<String>, Redirect> {
    let user = require_admin_user(&state, &jar).await?;
    let pool = state.pool();

    let filter = CommentFilter::parse(params.filter.as_deref());

    let counts = match fetch_comment_counts(&pool).await {
        Ok(counts) => counts,
        Err(err) => {
            error!(?err, "failed to load comment counts");
            CommentCounts::default()
        }
    };

    let pages = page_count(filtered_total(counts, filter), COMMENTS_PER_PAGE);
    let page = params.page.unwrap_or(1).clamp(1, pages);

    let comments = match fetch_admin_comments(&pool, filter, page).await {
        Ok(rows) => rows,
        Err(err) => {
            error!(?err, "failed to load comments for moderation");
            Vec::new()
        }
    };

    let flash_html = flash::compose_flash_message(params.status.as_deref(), params.error.as_deref());
    let content = render_panel_content(filter, page, pages, counts, &comments);
    let script = moderation_script(filter, page);

    Ok(Html(render_page(PageLayout {
        meta_title: "Moderasi Komentar | Jurnal & Katalog",
        active_nav: ActiveNav::Dashboard,
        user: Some(&user),
        flash_html: Cow::Owned(flash_html),
        content_html: Cow::Owned(content),
        extra_style_blocks: vec![Cow::Borrowed(PANEL_STYLES)],
        body_scripts: vec![Cow::Owned(script)],
    })))
}

fn render_panel_content(
    filter: CommentFilter,
    page: i64,
    pages: i64,
    counts: CommentCounts,
    comments: &[AdminCommentRow],
) -> String {
    let filters = [
        (CommentFilter::All, "Semua", counts.total()),
        (
            CommentFilter::Status(CommentStatus::Pending),
            "Menunggu",
            counts.pending,
        ),
        (
            CommentFilter::Status(CommentStatus::Approved),
            "Disetujui",
            counts.approved,
        ),
        (
            CommentFilter::Status(CommentStatus::Rejected),
            "Ditolak",
            counts.rejected,
        ),
    ];

    let filter_links = filters
        .iter()
        .map(|(value, label, count)| {
            let class = if *value == filter { r#" class="active""# } else { "" };
            format!(
                r#"<a href="/admin/comments?filter={value}"{class}>{label} ({count})</a>"#,
                value = value.as_str(),
            )
        })
        .collect::<String>();

    let rows = if comments.is_empty() {
        r#"<tr><td colspan="6">Tidak ada komentar untuk filter ini.</td></tr>"#.to_string()
    } else {
        comments.iter().map(render_comment_row).collect::<String>()
    };

    let pagination = render_pagination(filter, page, pages);

    format!(
        r#"        <h1 class="page-heading">Moderasi Komentar</h1>
        <p class="page-subtitle">Setujui, tolak, atau hapus komentar pengunjung.</p>
        <div class="filter-row">{filter_links}</div>
        <table>
            <thead><tr><th>Pengirim</th><th>Komentar</th><th>Publikasi</th><th>Status</th><th>Tanggal</th><th>Aksi</th></tr></thead>
            <tbody>{rows}</tbody>
        </table>
        {pagination}
"#,
    )
}

fn render_comment_row(comment: &AdminCommentRow) -> String {
    let status_tag = match CommentStatus::parse(&comment.status) {
        Some(status) => format!(
            r#"<span class="status-tag {class}">{label}</span>"#,
            class = status.as_str(),
            label = status.label(),
        ),
        None => escape_html(&comment.status),
    };

    let ip = comment
        .ip_address
        .as_deref()
        .map(escape_html)
        .unwrap_or_default();

    format!(
        r#"<tr>
            <td>{nama}<br><small>{email}</small><br><small>{ip}</small></td>
            <td class="komentar-cell"><p class="body">{komentar}</p></td>
            <td><a href="/publications/{publication_id}">{title}</a></td>
            <td>{status_tag}</td>
            <td>{date}</td>
            <td>
                <div class="comment-actions">
                    <button class="button-secondary" data-action="approve" data-id="{id}">Setujui</button>
                    <button class="button-secondary" data-action="reject" data-id="{id}">Tolak</button>
                    <button class="button-danger" data-action="delete" data-id="{id}">Hapus</button>
                </div>
            </td>
        </tr>"#,
        nama = escape_html(&comment.nama),
        email = escape_html(&comment.email),
        ip = ip,
        // Sanitized at submission time; rendered as stored.
        komentar = comment.komentar,
        publication_id = comment.publication_id,
        title = escape_html(&comment.publication_title),
        status_tag = status_tag,
        date = templates::format_datetime(comment.created_at),
        id = comment.id,
    )
}

fn render_pagination(filter: CommentFilter, page: i64, pages: i64) -> String {
    if pages <= 1 {
        return String::new();
    }

    let links = (1..=pages)
        .map(|number| {
            if number == page {
                format!(r#"<span class="current">{number}</span>"#)
            } else {
                format!(
                    r#"<a href="/admin/comments?filter={filter}&page={number}">{number}</a>"#,
                    filter = filter.as_str(),
                )
            }
        })
        .collect::<String>();

    format!(r#"<nav class="pagination">{links}</nav>"#)
}

/// Wires the row buttons to the moderation endpoints. Approve and reject are
/// PUTs, delete is a DELETE with confirmation; on success the page reloads
/// with the matching flash code.
fn moderation_script(filter: CommentFilter, page: i64) -> String {
    format!(
        r#"<script>
const returnQuery = 'filter={filter}&page={page}';
const actions = {{
    approve: {{ method: 'PUT', path: id => `/admin/comments/${{id}}/approve`, done: 'comment_approved' }},
    reject: {{ method: 'PUT', path: id => `/admin/comments/${{id}}/reject`, done: 'comment_rejected' }},
    delete: {{ method: 'DELETE', path: id => `/admin/comments/${{id}}`, done: 'comment_deleted' }},
}};

document.querySelectorAll('button[data-action]').forEach((button) => {{
    button.addEventListener('click', async () => {{
        const action = actions[button.dataset.action];
        if (!action) return;
        if (button.dataset.action === 'delete' && !confirm('Hapus komentar ini secara permanen?')) return;
        button.disabled = true;
        try {{
            const response = await fetch(action.path(button.dataset.id), {{ method: action.method }});
            if (response.ok) {{
                window.location = `/admin/comments?${{returnQuery}}&status=${{action.done}}`;
            }} else {{
                alert('Aksi gagal (' + response.status + ').');
                button.disabled = false;
            }}
        }} catch (err) {{
            alert('Aksi gagal. Periksa koneksi Anda.');
            button.disabled = false;
        }}
    }});
}});
</script>"#,
        filter = filter.as_str(),
        page = page,
    )
}

/// Moderation decisions overwrite the status unconditionally, so approving an
/// already approved comment (or flipping a rejected one) simply succeeds.
async fn set_comment_status(
    state: &AppState,
    jar: &CookieJar,
    id: i64,
    status: CommentStatus,
) -> StatusCode {
    let user = match require_admin_api(state, jar).await {
        Ok(user) => user,
        Err(code) => return code,
    };

    let result = sqlx::query("UPDATE comments SET status = $1, updated_at = NOW() WHERE id = $2")
        .bind(status.as_str())
        .bind(id)
        .execute(state.pool_ref())
        .await;

    match result {
        Ok(outcome) if outcome.rows_affected() == 0 => StatusCode::NOT_FOUND,
        Ok(_) => {
            info!(
                comment_id = id,
                status = status.as_str(),
                admin_id = user.id,
                "comment moderated"
            );
            StatusCode::NO_CONTENT
        }
        Err(err) => {
            error!(?err, comment_id = id, "failed to update comment status");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

pub async fn approve_comment(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> StatusCode {
    set_comment_status(&state, &jar, id, CommentStatus::Approved).await
}

pub async fn reject_comment(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> StatusCode {
    set_comment_status(&state, &jar, id, CommentStatus::Rejected).await
}

pub async fn delete_comment(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> StatusCode {
    let user = match require_admin_api(&state, &jar).await {
        Ok(user) => user,
        Err(code) => return code,
    };

    let result = sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(id)
        .execute(state.pool_ref())
        .await;

    match result {
        Ok(outcome) if outcome.rows_affected() == 0 => StatusCode::NOT_FOUND,
        Ok(_) => {
            info!(comment_id = id, admin_id = user.id, "comment deleted");
            StatusCode::NO_CONTENT
        }
        Err(err) => {
            error!(?err, comment_id = id, "failed to delete comment");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(page_count(0, 15), 1);
        assert_eq!(page_count(1, 15), 1);
        assert_eq!(page_count(15, 15), 1);
        assert_eq!(page_count(16, 15), 2);
        assert_eq!(page_count(45, 15), 3);
    }

    #[test]
    fn filtered_total_picks_matching_bucket() {
        let counts = CommentCounts {
            pending: 4,
            approved: 10,
            rejected: 2,
        };
        assert_eq!(filtered_total(counts, CommentFilter::All), 16);
        assert_eq!(
            filtered_total(counts, CommentFilter::Status(CommentStatus::Pending)),
            4
        );
        assert_eq!(
            filtered_total(counts, CommentFilter::Status(CommentStatus::Rejected)),
            2
        );
    }

    #[test]
    fn pagination_is_hidden_for_single_page() {
        assert!(render_pagination(CommentFilter::All, 1, 1).is_empty());
        let nav = render_pagination(CommentFilter::All, 2, 3);
        assert!(nav.contains(r#"<span class="current">2</span>"#));
        assert!(nav.contains("filter=all&page=3"));
    }

    #[test]
    fn moderation_script_carries_filter_and_page() {
        let script = moderation_script(CommentFilter::Status(CommentStatus::Pending), 2);
        assert!(script.contains("filter=pending&page=2"));
        assert!(script.contains("comment_approved"));
    }
}
