use std::borrow::Cow;

use axum::{
    extract::{Query, State},
    response::Html,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::error;

use crate::web::{
    AppState, auth, data, flash,
    models::{CatalogRow, PublicationRow},
    templates::{
        ActiveNav, PageLayout, render_catalog_card, render_page, render_publication_card,
    },
};

const HOME_PUBLICATION_COUNT: i64 = 6;
const HOME_CATALOG_COUNT: i64 = 4;

#[derive(Default, Deserialize)]
pub struct LandingQuery {
    pub status: Option<String>,
    pub error: Option<String>,
}

pub async fn landing_page(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<LandingQuery>,
) -> Html<String> {
    let user = auth::current_user(&state, &jar).await;
    let pool = state.pool();

    let publications = match data::fetch_latest_publications(&pool, HOME_PUBLICATION_COUNT).await {
        Ok(rows) => rows,
        Err(err) => {
            error!(?err, "failed to load publications for home page");
            Vec::new()
        }
    };
    let catalogs = match data::fetch_latest_catalogs(&pool, HOME_CATALOG_COUNT).await {
        Ok(rows) => rows,
        Err(err) => {
            error!(?err, "failed to load catalogs for home page");
            Vec::new()
        }
    };

    let flash_html = flash::compose_flash_message(params.status.as_deref(), params.error.as_deref());
    let content = render_home_content(&publications, &catalogs);

    Html(render_page(PageLayout {
        meta_title: "Beranda | Jurnal & Katalog",
        active_nav: ActiveNav::Home,
        user: user.as_ref(),
        flash_html: Cow::Owned(flash_html),
        content_html: Cow::Owned(content),
        extra_style_blocks: Vec::new(),
        body_scripts: Vec::new(),
    }))
}

fn render_home_content(publications: &[PublicationRow], catalogs: &[CatalogRow]) -> String {
    let publication_cards = if publications.is_empty() {
        r#"<p class="page-subtitle">Belum ada publikasi.</p>"#.to_string()
    } else {
        let cards = publications
            .iter()
            .map(render_publication_card)
            .collect::<String>();
        format!(r#"<div class="card-grid">{cards}</div>"#)
    };

    let catalog_cards = if catalogs.is_empty() {
        r#"<p class="page-subtitle">Belum ada katalog.</p>"#.to_string()
    } else {
        let cards = catalogs.iter().map(render_catalog_card).collect::<String>();
        format!(r#"<div class="card-grid">{cards}</div>"#)
    };

    format!(
        r#"        <section style="margin-bottom: 3rem;">
            <h1 class="page-heading">Jurnal &amp; Katalog</h1>
            <p class="page-subtitle">Kumpulan publikasi ilmiah dan katalog buku yang dapat diakses secara terbuka.</p>
        </section>
        <section style="margin-bottom: 3rem;">
            <div style="display: flex; justify-content: space-between; align-items: baseline; gap: 1rem; flex-wrap: wrap;">
                <h2 style="margin: 0 0 1.25rem;">Publikasi Terbaru</h2>
                <a href="/publications">Lihat semua &rarr;</a>
            </div>
            {publication_cards}
        </section>
        <section>
            <div style="display: flex; justify-content: space-between; align-items: baseline; gap: 1rem; flex-wrap: wrap;">
                <h2 style="margin: 0 0 1.25rem;">Katalog Buku</h2>
                <a href="/catalogs">Lihat semua &rarr;</a>
            </div>
            {catalog_cards}
        </section>
"#,
        publication_cards = publication_cards,
        catalog_cards = catalog_cards,
    )
}

pub async fn contact_page(State(state): State<AppState>, jar: CookieJar) -> Html<String> {
    let user = auth::current_user(&state, &jar).await;

    let content = r#"        <section class="panel" style="max-width: 640px; margin: 0 auto;">
            <h1 class="page-heading">Kontak</h1>
            <p class="page-subtitle">Hubungi pengelola untuk pertanyaan seputar publikasi dan katalog.</p>
            <table>
                <tr><th>Email</th><td>redaksi@jurnal.local</td></tr>
                <tr><th>Telepon</th><td>(021) 555-0123</td></tr>
                <tr><th>Alamat</th><td>Jl. Pendidikan No. 1, Jakarta</td></tr>
            </table>
        </section>
"#;

    Html(render_page(PageLayout {
        meta_title: "Kontak | Jurnal & Katalog",
        active_nav: ActiveNav::Contact,
        user: user.as_ref(),
        flash_html: Cow::Borrowed(""),
        content_html: Cow::Borrowed(content),
        extra_style_blocks: Vec::new(),
        body_scripts: Vec::new(),
    }))
}
