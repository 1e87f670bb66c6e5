use std::borrow::Cow;

use axum::{
    Router,
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{error, info};

use crate::{
    modules::publications::PageQuery,
    web::{
        AppState, auth, data, flash,
        models::CatalogRow,
        storage,
        templates::{
            ActiveNav, PageLayout, escape_html, format_date, render_catalog_card, render_page,
        },
    },
};

pub mod admin;

const RELATED_CATALOG_COUNT: i64 = 4;

const DETAIL_STYLES: &str = r#"
        .catalog-detail { display: grid; gap: 2rem; grid-template-columns: 280px 1fr; align-items: start; margin-bottom: 3rem; }
        .catalog-detail .cover { width: 100%; border-radius: 14px; border: 1px solid var(--border); }
        .catalog-detail .cover-placeholder { width: 100%; aspect-ratio: 3 / 4; display: flex; align-items: center; justify-content: center; background: var(--accent-soft); color: var(--accent); font-weight: 700; font-size: 1.5rem; border-radius: 14px; }
        .catalog-detail .detail-meta { color: var(--faint); font-size: 0.9rem; margin-bottom: 1.25rem; }
        .catalog-detail p.deskripsi { line-height: 1.75; color: var(--text); white-space: pre-line; }
        @media (max-width: 768px) { .catalog-detail { grid-template-columns: 1fr; } }
"#;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/catalogs", get(index))
        .route("/catalogs/:id", get(show))
        .route("/catalogs/:id/download", get(download))
        .route("/manage-catalogs", get(admin::manage))
        .route("/admin/catalogs", post(admin::store))
        .route("/admin/catalogs/create", get(admin::create_form))
        .route("/admin/catalogs/:id", post(admin::update))
        .route("/admin/catalogs/:id/edit", get(admin::edit_form))
        .route("/admin/catalogs/:id/delete", post(admin::destroy))
}

async fn index(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<PageQuery>,
) -> Response {
    let user = auth::current_user(&state, &jar).await;
    let pool = state.pool();

    let catalogs = match data::fetch_catalogs(&pool).await {
        Ok(rows) => rows,
        Err(err) => {
            error!(?err, "failed to load catalogs index");
            Vec::new()
        }
    };

    let cards = if catalogs.is_empty() {
        r#"<p class="page-subtitle">Belum ada katalog.</p>"#.to_string()
    } else {
        format!(
            r#"<div class="card-grid">{}</div>"#,
            catalogs.iter().map(render_catalog_card).collect::<String>()
        )
    };

    let content = format!(
        r#"        <h1 class="page-heading">Katalog Buku</h1>
        <p class="page-subtitle">Koleksi buku terbitan yang dapat diunduh.</p>
        {cards}
"#,
    );

    let flash_html = flash::compose_flash_message(params.status.as_deref(), params.error.as_deref());
    Html(render_page(PageLayout {
        meta_title: "Katalog Buku | Jurnal & Katalog",
        active_nav: ActiveNav::Catalogs,
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
    let pool = state.pool();

    let catalog = match data::fetch_catalog(&pool, id).await {
        Ok(Some(row)) => row,
        Ok(None) => return storage::not_found_response(),
        Err(err) => {
            error!(?err, catalog_id = id, "failed to load catalog detail");
            return storage::not_found_response();
        }
    };

    let related = match data::fetch_related_catalogs(&pool, id, RELATED_CATALOG_COUNT).await {
        Ok(rows) => rows,
        Err(err) => {
            error!(?err, catalog_id = id, "failed to load related catalogs");
            Vec::new()
        }
    };

    let meta_title = format!("{} | Jurnal & Katalog", catalog.nama);
    let content = render_detail_content(&catalog, &related);
    let flash_html = flash::compose_flash_message(params.status.as_deref(), params.error.as_deref());

    Html(render_page(PageLayout {
        meta_title: &meta_title,
        active_nav: ActiveNav::Catalogs,
        user: user.as_ref(),
        flash_html: Cow::Owned(flash_html),
        content_html: Cow::Owned(content),
        extra_style_blocks: vec![Cow::Borrowed(DETAIL_STYLES)],
        body_scripts: Vec::new(),
    }))
    .into_response()
}

fn render_detail_content(catalog: &CatalogRow, related: &[CatalogRow]) -> String {
    let nama = escape_html(&catalog.nama);

    let cover = match catalog.gambar_sampul.as_deref() {
        Some(image) => format!(
            r#"<img class="cover" src="/media/{src}" alt="{nama}">"#,
            src = escape_html(image),
        ),
        None => r#"<div class="cover-placeholder">Katalog</div>"#.to_string(),
    };

    let download_button = if catalog.pdf_file_buku.is_some() {
        format!(
            r#"<a class="button-primary" href="/catalogs/{id}/download">Unduh PDF</a>"#,
            id = catalog.id,
        )
    } else {
        r#"<p class="page-subtitle">Berkas PDF belum tersedia.</p>"#.to_string()
    };

    let related_html = if related.is_empty() {
        String::new()
    } else {
        format!(
            r#"<section>
                <h2>Katalog Lainnya</h2>
                <div class="card-grid">{cards}</div>
            </section>"#,
            cards = related.iter().map(render_catalog_card).collect::<String>(),
        )
    };

    format!(
        r#"        <article class="catalog-detail">
            <div>{cover}</div>
            <div>
                <h1 class="page-heading">{nama}</h1>
                <p class="detail-meta">{author} · {date}</p>
                <p class="deskripsi">{deskripsi}</p>
                {download_button}
            </div>
        </article>
        {related_html}
"#,
        author = escape_html(&catalog.author_name),
        date = format_date(catalog.created_at),
        deskripsi = escape_html(&catalog.deskripsi),
    )
}

/// Download filename presented to the visitor: the catalog name with a pdf
/// extension, regardless of what the file is called on disk.
fn download_filename(nama: &str) -> String {
    format!("{}.pdf", nama.trim())
}

/// Serve the catalog's PDF as an attachment. A catalog without a stored PDF
/// path, or whose file is missing from disk, is a plain 404.
async fn download(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    let pool = state.pool();

    let catalog = match data::fetch_catalog(&pool, id).await {
        Ok(Some(row)) => row,
        Ok(None) => return storage::not_found_response(),
        Err(err) => {
            error!(?err, catalog_id = id, "failed to load catalog for download");
            return storage::not_found_response();
        }
    };

    let Some(relative) = catalog.pdf_file_buku.as_deref() else {
        return storage::not_found_response();
    };
    let Some(disk_path) = storage::media_disk_path(&state.config().media_root, relative) else {
        return storage::not_found_response();
    };

    match storage::stream_download(&disk_path, &download_filename(&catalog.nama), "application/pdf")
        .await
    {
        Ok(response) => {
            info!(catalog_id = id, "catalog pdf downloaded");
            response
        }
        Err(not_found) => not_found,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn catalog(pdf: Option<&str>) -> CatalogRow {
        CatalogRow {
            id: 7,
            nama: "Tata Kota Nusantara".to_string(),
            deskripsi: "Kajian tata kota.".to_string(),
            gambar_sampul: None,
            pdf_file_buku: pdf.map(str::to_string),
            user_id: 1,
            author_name: "Admin".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn download_filename_uses_catalog_name() {
        assert_eq!(
            download_filename("Tata Kota Nusantara"),
            "Tata Kota Nusantara.pdf"
        );
        assert_eq!(download_filename("  spasi  "), "spasi.pdf");
    }

    #[test]
    fn detail_offers_download_only_with_pdf() {
        let with_pdf = render_detail_content(&catalog(Some("catalogs/pdfs/a.pdf")), &[]);
        assert!(with_pdf.contains("/catalogs/7/download"));

        let without_pdf = render_detail_content(&catalog(None), &[]);
        assert!(!without_pdf.contains("/catalogs/7/download"));
        assert!(without_pdf.contains("Berkas PDF belum tersedia."));
    }

    #[test]
    fn detail_escapes_catalog_fields() {
        let mut row = catalog(None);
        row.nama = "<b>Nama</b>".to_string();
        let html = render_detail_content(&row, &[]);
        assert!(html.contains("&lt;b&gt;Nama&lt;/b&gt;"));
    }
}
