use sqlx::PgPool;

use super::models::{CatalogRow, CommentRow, PublicationRow};

const PUBLICATION_COLUMNS: &str = "publications.id, publications.title, publications.description, publications.image, publications.link_route, publications.user_id, users.name AS author_name, publications.created_at, publications.updated_at";

const CATALOG_COLUMNS: &str = "catalogs.id, catalogs.nama, catalogs.deskripsi, catalogs.gambar_sampul, catalogs.pdf_file_buku, catalogs.user_id, users.name AS author_name, catalogs.created_at, catalogs.updated_at";

pub async fn fetch_publications(pool: &PgPool) -> sqlx::Result<Vec<PublicationRow>> {
    sqlx::query_as::<_, PublicationRow>(&format!(
        "SELECT {PUBLICATION_COLUMNS} FROM publications JOIN users ON users.id = publications.user_id ORDER BY publications.created_at DESC",
    ))
    .fetch_all(pool)
    .await
}

pub async fn fetch_latest_publications(
    pool: &PgPool,
    limit: i64,
) -> sqlx::Result<Vec<PublicationRow>> {
    sqlx::query_as::<_, PublicationRow>(&format!(
        "SELECT {PUBLICATION_COLUMNS} FROM publications JOIN users ON users.id = publications.user_id ORDER BY publications.created_at DESC LIMIT $1",
    ))
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn fetch_publication(pool: &PgPool, id: i64) -> sqlx::Result<Option<PublicationRow>> {
    sqlx::query_as::<_, PublicationRow>(&format!(
        "SELECT {PUBLICATION_COLUMNS} FROM publications JOIN users ON users.id = publications.user_id WHERE publications.id = $1",
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn publication_exists(pool: &PgPool, id: i64) -> sqlx::Result<bool> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM publications WHERE id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await
}

pub async fn fetch_catalogs(pool: &PgPool) -> sqlx::Result<Vec<CatalogRow>> {
    sqlx::query_as::<_, CatalogRow>(&format!(
        "SELECT {CATALOG_COLUMNS} FROM catalogs JOIN users ON users.id = catalogs.user_id ORDER BY catalogs.created_at DESC",
    ))
    .fetch_all(pool)
    .await
}

pub async fn fetch_latest_catalogs(pool: &PgPool, limit: i64) -> sqlx::Result<Vec<CatalogRow>> {
    sqlx::query_as::<_, CatalogRow>(&format!(
        "SELECT {CATALOG_COLUMNS} FROM catalogs JOIN users ON users.id = catalogs.user_id ORDER BY catalogs.created_at DESC LIMIT $1",
    ))
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn fetch_catalog(pool: &PgPool, id: i64) -> sqlx::Result<Option<CatalogRow>> {
    sqlx::query_as::<_, CatalogRow>(&format!(
        "SELECT {CATALOG_COLUMNS} FROM catalogs JOIN users ON users.id = catalogs.user_id WHERE catalogs.id = $1",
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// "Related" catalogs are simply the most recent other catalogs, not a
/// similarity match.
pub async fn fetch_related_catalogs(
    pool: &PgPool,
    exclude_id: i64,
    limit: i64,
) -> sqlx::Result<Vec<CatalogRow>> {
    sqlx::query_as::<_, CatalogRow>(&format!(
        "SELECT {CATALOG_COLUMNS} FROM catalogs JOIN users ON users.id = catalogs.user_id WHERE catalogs.id != $1 ORDER BY catalogs.created_at DESC LIMIT $2",
    ))
    .bind(exclude_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Approved comments only, for public display under a publication.
pub async fn fetch_approved_comments(
    pool: &PgPool,
    publication_id: i64,
) -> sqlx::Result<Vec<CommentRow>> {
    sqlx::query_as::<_, CommentRow>(
        "SELECT id, nama, komentar, created_at FROM comments WHERE publication_id = $1 AND status = 'approved' ORDER BY created_at DESC",
    )
    .bind(publication_id)
    .fetch_all(pool)
    .await
}

/// Headline totals for the dashboard.
#[derive(Clone, Copy, Debug, Default)]
pub struct DashboardStats {
    pub total_publications: i64,
    pub total_catalogs: i64,
    pub total_comments: i64,
    pub pending_comments: i64,
}

pub async fn fetch_dashboard_stats(pool: &PgPool) -> sqlx::Result<DashboardStats> {
    let (total_publications, total_catalogs, total_comments, pending_comments): (
        i64,
        i64,
        i64,
        i64,
    ) = sqlx::query_as(
        "SELECT
            (SELECT COUNT(*) FROM publications),
            (SELECT COUNT(*) FROM catalogs),
            (SELECT COUNT(*) FROM comments),
            (SELECT COUNT(*) FROM comments WHERE status = 'pending')",
    )
    .fetch_one(pool)
    .await?;

    Ok(DashboardStats {
        total_publications,
        total_catalogs,
        total_comments,
        pending_comments,
    })
}
