use std::borrow::Cow;

use axum::{
    extract::{Query, State},
    response::{Html, Redirect},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::error;

use crate::web::{
    AppState, AuthUser, auth, data,
    data::DashboardStats,
    flash,
    models::PublicationRow,
    templates::{self, ActiveNav, PageLayout, escape_html, render_page},
};

const RECENT_PUBLICATION_COUNT: i64 = 5;

const DASHBOARD_STYLES: &str = r#"
        .stat-grid { display: grid; gap: 1.25rem; grid-template-columns: repeat(auto-fit, minmax(200px, 1fr)); margin-bottom: 2rem; }
        .stat-card { background: var(--surface); border: 1px solid var(--border); border-radius: 12px; padding: 1.25rem 1.5rem; }
        .stat-card .value { font-size: 2rem; font-weight: 700; margin: 0; }
        .stat-card .label { margin: 0.25rem 0 0; color: var(--muted); font-size: 0.92rem; }
        .stat-card.highlight { border-color: #fcd34d; background: #fffbeb; }
        :root[data-theme="dark"] .stat-card.highlight { background: #3a2e12; border-color: #92400e; }
        .quick-links { display: flex; gap: 0.75rem; flex-wrap: wrap; margin-bottom: 2.5rem; }
"#;

#[derive(Default, Deserialize)]
pub struct DashboardQuery {
    pub status: Option<String>,
    pub error: Option<String>,
}

pub async fn dashboard(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<DashboardQuery>,
) -> Result<Html<String>, Redirect> {
    let user = auth::require_user_redirect(&state, &jar).await?;
    let pool = state.pool();

    let stats = match data::fetch_dashboard_stats(&pool).await {
        Ok(stats) => stats,
        Err(err) => {
            error!(?err, "failed to load dashboard stats");
            DashboardStats::default()
        }
    };
    let recent = match data::fetch_latest_publications(&pool, RECENT_PUBLICATION_COUNT).await {
        Ok(rows) => rows,
        Err(err) => {
            error!(?err, "failed to load recent publications for dashboard");
            Vec::new()
        }
    };

    let flash_html = flash::compose_flash_message(params.status.as_deref(), params.error.as_deref());
    let content = render_dashboard_content(&user, stats, &recent);

    Ok(Html(render_page(PageLayout {
        meta_title: "Dashboard | Jurnal & Katalog",
        active_nav: ActiveNav::Dashboard,
        user: Some(&user),
        flash_html: Cow::Owned(flash_html),
        content_html: Cow::Owned(content),
        extra_style_blocks: vec![Cow::Borrowed(DASHBOARD_STYLES)],
        body_scripts: Vec::new(),
    })))
}

fn render_dashboard_content(
    user: &AuthUser,
    stats: DashboardStats,
    recent: &[PublicationRow],
) -> String {
    let moderation_link = if user.is_admin {
        format!(
            r#"<a class="button-secondary" href="/admin/comments">Moderasi Komentar ({pending} menunggu)</a>"#,
            pending = stats.pending_comments,
        )
    } else {
        String::new()
    };

    let recent_rows = if recent.is_empty() {
        r#"<tr><td colspan="4">Belum ada publikasi.</td></tr>"#.to_string()
    } else {
        recent
            .iter()
            .map(|publication| {
                format!(
                    r#"<tr>
                        <td><a href="/publications/{id}">{title}</a></td>
                        <td>{author}</td>
                        <td>{date}</td>
                        <td><a href="/publications/{id}/edit">Ubah</a></td>
                    </tr>"#,
                    id = publication.id,
                    title = escape_html(&publication.title),
                    author = escape_html(&publication.author_name),
                    date = templates::format_date(publication.created_at),
                )
            })
            .collect::<String>()
    };

    format!(
        r#"        <h1 class="page-heading">Dashboard</h1>
        <p class="page-subtitle">Selamat datang, {name}.</p>
        <div class="stat-grid">
            <div class="stat-card">
                <p class="value">{total_publications}</p>
                <p class="label">Total Publikasi</p>
            </div>
            <div class="stat-card">
                <p class="value">{total_catalogs}</p>
                <p class="label">Total Katalog</p>
            </div>
            <div class="stat-card">
                <p class="value">{total_comments}</p>
                <p class="label">Total Komentar</p>
            </div>
            <div class="stat-card highlight">
                <p class="value">{pending_comments}</p>
                <p class="label">Komentar Menunggu Moderasi</p>
            </div>
        </div>
        <div class="quick-links">
            <a class="button-primary" href="/publications/create">Tulis Publikasi</a>
            <a class="button-primary" href="/admin/catalogs/create">Tambah Katalog</a>
            <a class="button-secondary" href="/manage-publications">Kelola Publikasi</a>
            <a class="button-secondary" href="/manage-catalogs">Kelola Katalog</a>
            {moderation_link}
        </div>
        <section class="panel">
            <h2>Publikasi Terakhir</h2>
            <table>
                <thead><tr><th>Judul</th><th>Penulis</th><th>Tanggal</th><th></th></tr></thead>
                <tbody>{recent_rows}</tbody>
            </table>
        </section>
"#,
        name = escape_html(&user.name),
        total_publications = stats.total_publications,
        total_catalogs = stats.total_catalogs,
        total_comments = stats.total_comments,
        pending_comments = stats.pending_comments,
        moderation_link = moderation_link,
        recent_rows = recent_rows,
    )
}
