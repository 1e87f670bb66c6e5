use std::borrow::Cow;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{error, info};

use crate::{
    modules::publications::PageQuery,
    web::{
        AppState, AuthUser, auth, data, flash,
        models::{CatalogRow, FieldError, error_for},
        storage, templates,
        templates::{ActiveNav, PageLayout, escape_html, render_page},
        uploads::{self, FileFieldConfig, UploadError},
    },
};

pub const NAMA_MAX_CHARS: usize = 255;

/// Text inputs of the catalog form, preserved across a failed submit.
#[derive(Default)]
struct CatalogFormValues {
    nama: String,
    deskripsi: String,
}

impl CatalogFormValues {
    fn from_outcome(outcome: &uploads::UploadOutcome) -> Self {
        Self {
            nama: outcome.text_or_empty("nama").trim().to_string(),
            deskripsi: outcome.text_or_empty("deskripsi").trim().to_string(),
        }
    }

    fn from_row(row: &CatalogRow) -> Self {
        Self {
            nama: row.nama.clone(),
            deskripsi: row.deskripsi.clone(),
        }
    }
}

/// Current media paths shown on the edit form.
#[derive(Clone, Copy, Default)]
struct CurrentFiles<'a> {
    gambar_sampul: Option<&'a str>,
    pdf_file_buku: Option<&'a str>,
}

impl<'a> CurrentFiles<'a> {
    fn of(row: &'a CatalogRow) -> Self {
        Self {
            gambar_sampul: row.gambar_sampul.as_deref(),
            pdf_file_buku: row.pdf_file_buku.as_deref(),
        }
    }
}

fn validate_catalog(values: &CatalogFormValues) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if values.nama.is_empty() {
        errors.push(FieldError::new("nama", "Nama buku wajib diisi."));
    } else if values.nama.chars().count() > NAMA_MAX_CHARS {
        errors.push(FieldError::new("nama", "Nama buku maksimal 255 karakter."));
    }

    if values.deskripsi.is_empty() {
        errors.push(FieldError::new("deskripsi", "Deskripsi wajib diisi."));
    }

    errors
}

fn upload_field_error(err: &UploadError) -> FieldError {
    let field = match err.field() {
        "gambar_sampul" => "gambar_sampul",
        "pdf_file_buku" => "pdf_file_buku",
        _ => "form",
    };
    FieldError::new(field, err.message().to_string())
}

fn file_configs() -> [FileFieldConfig<'static>; 2] {
    [
        FileFieldConfig::image("gambar_sampul", storage::FOLDER_CATALOG_COVERS),
        FileFieldConfig::pdf("pdf_file_buku", storage::FOLDER_CATALOG_PDFS),
    ]
}

pub async fn manage(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<PageQuery>,
) -> Result<Html<String>, Redirect> {
    let user = auth::require_user_redirect(&state, &jar).await?;
    let pool = state.pool();

    let catalogs = match data::fetch_catalogs(&pool).await {
        Ok(rows) => rows,
        Err(err) => {
            error!(?err, "failed to load catalogs for management");
            Vec::new()
        }
    };

    let rows = if catalogs.is_empty() {
        r#"<tr><td colspan="5">Belum ada katalog.</td></tr>"#.to_string()
    } else {
        catalogs
            .iter()
            .map(|catalog| {
                let pdf = if catalog.pdf_file_buku.is_some() {
                    "Ada"
                } else {
                    "Belum ada"
                };
                format!(
                    r#"<tr>
                        <td><a href="/catalogs/{id}">{nama}</a></td>
                        <td>{pdf}</td>
                        <td>{author}</td>
                        <td>{updated}</td>
                        <td>
                            <a class="button-secondary" href="/admin/catalogs/{id}/edit">Ubah</a>
                            <form method="post" action="/admin/catalogs/{id}/delete" style="display:inline" onsubmit="return confirm('Hapus katalog ini beserta berkasnya?');">
                                <button class="button-danger" type="submit">Hapus</button>
                            </form>
                        </td>
                    </tr>"#,
                    id = catalog.id,
                    nama = escape_html(&catalog.nama),
                    pdf = pdf,
                    author = escape_html(&catalog.author_name),
                    updated = templates::format_datetime(catalog.updated_at),
                )
            })
            .collect::<String>()
    };

    let content = format!(
        r#"        <h1 class="page-heading">Kelola Katalog</h1>
        <p class="page-subtitle">Tambah, ubah, atau hapus katalog buku.</p>
        <a class="button-primary" href="/admin/catalogs/create">Tambah Katalog</a>
        <table>
            <thead><tr><th>Nama Buku</th><th>PDF</th><th>Dibuat Oleh</th><th>Terakhir Diubah</th><th>Aksi</th></tr></thead>
            <tbody>{rows}</tbody>
        </table>
"#,
    );

    let flash_html = flash::compose_flash_message(params.status.as_deref(), params.error.as_deref());
    Ok(Html(render_page(PageLayout {
        meta_title: "Kelola Katalog | Jurnal & Katalog",
        active_nav: ActiveNav::Dashboard,
        user: Some(&user),
        flash_html: Cow::Owned(flash_html),
        content_html: Cow::Owned(content),
        extra_style_blocks: Vec::new(),
        body_scripts: Vec::new(),
    })))
}

pub async fn create_form(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Html<String>, Redirect> {
    let user = auth::require_user_redirect(&state, &jar).await?;
    Ok(Html(render_form_page(
        &user,
        "Tambah Katalog",
        "/admin/catalogs",
        &CatalogFormValues::default(),
        &[],
        CurrentFiles::default(),
    )))
}

pub async fn store(
    State(state): State<AppState>,
    jar: CookieJar,
    multipart: Multipart,
) -> Response {
    let user = match auth::require_user_redirect(&state, &jar).await {
        Ok(user) => user,
        Err(redirect) => return redirect.into_response(),
    };

    let media_root = state.config().media_root.clone();
    let configs = file_configs();

    let outcome = match uploads::process_upload_form(multipart, &media_root, &configs).await {
        Ok(outcome) => outcome,
        Err(err) => {
            return form_error_response(
                &user,
                "Tambah Katalog",
                "/admin/catalogs",
                CatalogFormValues::default(),
                vec![upload_field_error(&err)],
                CurrentFiles::default(),
            );
        }
    };

    let values = CatalogFormValues::from_outcome(&outcome);
    let errors = validate_catalog(&values);
    if !errors.is_empty() {
        outcome.discard_files(&media_root).await;
        return form_error_response(
            &user,
            "Tambah Katalog",
            "/admin/catalogs",
            values,
            errors,
            CurrentFiles::default(),
        );
    }

    let gambar_sampul = outcome
        .file_for("gambar_sampul")
        .map(|file| file.relative_path.clone());
    let pdf_file_buku = outcome
        .file_for("pdf_file_buku")
        .map(|file| file.relative_path.clone());

    let inserted: Result<i64, sqlx::Error> = sqlx::query_scalar(
        "INSERT INTO catalogs (nama, deskripsi, gambar_sampul, pdf_file_buku, user_id) VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(&values.nama)
    .bind(&values.deskripsi)
    .bind(&gambar_sampul)
    .bind(&pdf_file_buku)
    .bind(user.id)
    .fetch_one(state.pool_ref())
    .await;

    match inserted {
        Ok(id) => {
            info!(catalog_id = id, user_id = user.id, "catalog created");
            Redirect::to("/manage-catalogs?status=catalog_created").into_response()
        }
        Err(err) => {
            error!(?err, "failed to create catalog");
            outcome.discard_files(&media_root).await;
            form_error_response(
                &user,
                "Tambah Katalog",
                "/admin/catalogs",
                values,
                vec![FieldError::new(
                    "form",
                    "Gagal menyimpan katalog. Silakan coba lagi.",
                )],
                CurrentFiles::default(),
            )
        }
    }
}

pub async fn edit_form(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Response {
    let user = match auth::require_user_redirect(&state, &jar).await {
        Ok(user) => user,
        Err(redirect) => return redirect.into_response(),
    };
    let pool = state.pool();

    let catalog = match data::fetch_catalog(&pool, id).await {
        Ok(Some(row)) => row,
        Ok(None) => return storage::not_found_response(),
        Err(err) => {
            error!(?err, catalog_id = id, "failed to load catalog for edit");
            return storage::not_found_response();
        }
    };

    Html(render_form_page(
        &user,
        "Ubah Katalog",
        &format!("/admin/catalogs/{id}"),
        &CatalogFormValues::from_row(&catalog),
        &[],
        CurrentFiles::of(&catalog),
    ))
    .into_response()
}

pub async fn update(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Response {
    let user = match auth::require_user_redirect(&state, &jar).await {
        Ok(user) => user,
        Err(redirect) => return redirect.into_response(),
    };
    let pool = state.pool();

    let existing = match data::fetch_catalog(&pool, id).await {
        Ok(Some(row)) => row,
        Ok(None) => return storage::not_found_response(),
        Err(err) => {
            error!(?err, catalog_id = id, "failed to load catalog for update");
            return storage::not_found_response();
        }
    };

    let media_root = state.config().media_root.clone();
    let configs = file_configs();
    let action = format!("/admin/catalogs/{id}");

    let outcome = match uploads::process_upload_form(multipart, &media_root, &configs).await {
        Ok(outcome) => outcome,
        Err(err) => {
            return form_error_response(
                &user,
                "Ubah Katalog",
                &action,
                CatalogFormValues::from_row(&existing),
                vec![upload_field_error(&err)],
                CurrentFiles::of(&existing),
            );
        }
    };

    let values = CatalogFormValues::from_outcome(&outcome);
    let errors = validate_catalog(&values);
    if !errors.is_empty() {
        outcome.discard_files(&media_root).await;
        return form_error_response(
            &user,
            "Ubah Katalog",
            &action,
            values,
            errors,
            CurrentFiles::of(&existing),
        );
    }

    let (new_cover, old_cover) = replacement(
        outcome
            .file_for("gambar_sampul")
            .map(|file| file.relative_path.clone()),
        outcome.text("hapus_sampul").is_some(),
        existing.gambar_sampul.clone(),
    );
    let (new_pdf, old_pdf) = replacement(
        outcome
            .file_for("pdf_file_buku")
            .map(|file| file.relative_path.clone()),
        outcome.text("hapus_pdf").is_some(),
        existing.pdf_file_buku.clone(),
    );

    let updated = sqlx::query(
        "UPDATE catalogs SET nama = $1, deskripsi = $2, gambar_sampul = $3, pdf_file_buku = $4, updated_at = NOW() WHERE id = $5",
    )
    .bind(&values.nama)
    .bind(&values.deskripsi)
    .bind(&new_cover)
    .bind(&new_pdf)
    .bind(id)
    .execute(state.pool_ref())
    .await;

    match updated {
        Ok(_) => {
            for old in [old_cover, old_pdf].into_iter().flatten() {
                storage::delete_media(&media_root, &old).await;
            }
            info!(catalog_id = id, user_id = user.id, "catalog updated");
            Redirect::to("/manage-catalogs?status=catalog_updated").into_response()
        }
        Err(err) => {
            error!(?err, catalog_id = id, "failed to update catalog");
            outcome.discard_files(&media_root).await;
            form_error_response(
                &user,
                "Ubah Katalog",
                &action,
                values,
                vec![FieldError::new(
                    "form",
                    "Gagal menyimpan perubahan. Silakan coba lagi.",
                )],
                CurrentFiles::of(&existing),
            )
        }
    }
}

/// New stored value and old file to delete for one media column. A fresh
/// upload wins over the removal checkbox; the replaced file is deleted only
/// after the record update succeeds.
fn replacement(
    uploaded: Option<String>,
    remove_requested: bool,
    current: Option<String>,
) -> (Option<String>, Option<String>) {
    match (uploaded, remove_requested) {
        (Some(path), _) => (Some(path), current),
        (None, true) => (None, current),
        (None, false) => (current, None),
    }
}

pub async fn destroy(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Response {
    let user = match auth::require_user_redirect(&state, &jar).await {
        Ok(user) => user,
        Err(redirect) => return redirect.into_response(),
    };
    let pool = state.pool();

    let existing = match data::fetch_catalog(&pool, id).await {
        Ok(Some(row)) => row,
        Ok(None) => return Redirect::to("/manage-catalogs?error=not_found").into_response(),
        Err(err) => {
            error!(?err, catalog_id = id, "failed to load catalog for delete");
            return Redirect::to("/manage-catalogs?error=server").into_response();
        }
    };

    if let Err(err) = sqlx::query("DELETE FROM catalogs WHERE id = $1")
        .bind(id)
        .execute(state.pool_ref())
        .await
    {
        error!(?err, catalog_id = id, "failed to delete catalog");
        return Redirect::to("/manage-catalogs?error=server").into_response();
    }

    let media_root = &state.config().media_root;
    for relative in [existing.gambar_sampul.as_deref(), existing.pdf_file_buku.as_deref()]
        .into_iter()
        .flatten()
    {
        storage::delete_media(media_root, relative).await;
    }

    info!(catalog_id = id, user_id = user.id, "catalog deleted");
    Redirect::to("/manage-catalogs?status=catalog_deleted").into_response()
}

fn form_error_response(
    user: &AuthUser,
    heading: &str,
    action: &str,
    values: CatalogFormValues,
    errors: Vec<FieldError>,
    current: CurrentFiles<'_>,
) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Html(render_form_page(user, heading, action, &values, &errors, current)),
    )
        .into_response()
}

fn field_error_html(errors: &[FieldError], field: &str) -> String {
    error_for(errors, field)
        .map(|message| format!(r#"<p class="field-error">{}</p>"#, escape_html(message)))
        .unwrap_or_default()
}

fn current_file_html(current: Option<&str>, remove_field: &str, label: &str) -> String {
    match current {
        Some(path) => format!(
            r#"<p class="field-hint">Berkas saat ini: <a href="/media/{src}" target="_blank">{src}</a></p>
                    <label style="font-weight: 400;"><input type="checkbox" name="{remove_field}" value="1" style="width: auto;"> {label}</label>"#,
            src = escape_html(path),
        ),
        None => String::new(),
    }
}

fn render_form_page(
    user: &AuthUser,
    heading: &str,
    action: &str,
    values: &CatalogFormValues,
    errors: &[FieldError],
    current: CurrentFiles<'_>,
) -> String {
    let content = format!(
        r#"        <h1 class="page-heading">{heading}</h1>
        <section class="panel">
            {form_error}
            <form method="post" action="{action}" enctype="multipart/form-data">
                <div class="form-field">
                    <label for="nama">Nama Buku</label>
                    <input id="nama" type="text" name="nama" value="{nama}" required>
                    {nama_error}
                </div>
                <div class="form-field">
                    <label for="deskripsi">Deskripsi</label>
                    <textarea id="deskripsi" name="deskripsi" required>{deskripsi}</textarea>
                    {deskripsi_error}
                </div>
                <div class="form-field">
                    <label for="gambar_sampul">Gambar Sampul (opsional, maksimal 2 MB)</label>
                    <input id="gambar_sampul" type="file" name="gambar_sampul" accept="image/*">
                    {sampul_error}
                    {current_sampul}
                </div>
                <div class="form-field">
                    <label for="pdf_file_buku">Berkas PDF (opsional, maksimal 10 MB)</label>
                    <input id="pdf_file_buku" type="file" name="pdf_file_buku" accept="application/pdf">
                    {pdf_error}
                    {current_pdf}
                </div>
                <button class="primary" type="submit">Simpan</button>
                <a class="button-secondary" href="/manage-catalogs">Batal</a>
            </form>
        </section>
"#,
        heading = escape_html(heading),
        form_error = field_error_html(errors, "form"),
        action = escape_html(action),
        nama = escape_html(&values.nama),
        nama_error = field_error_html(errors, "nama"),
        deskripsi = escape_html(&values.deskripsi),
        deskripsi_error = field_error_html(errors, "deskripsi"),
        sampul_error = field_error_html(errors, "gambar_sampul"),
        current_sampul = current_file_html(
            current.gambar_sampul,
            "hapus_sampul",
            "Hapus gambar sampul saat ini"
        ),
        pdf_error = field_error_html(errors, "pdf_file_buku"),
        current_pdf = current_file_html(
            current.pdf_file_buku,
            "hapus_pdf",
            "Hapus berkas PDF saat ini"
        ),
    );

    let meta_title = format!("{heading} | Jurnal & Katalog");
    render_page(PageLayout {
        meta_title: &meta_title,
        active_nav: ActiveNav::Dashboard,
        user: Some(user),
        flash_html: Cow::Borrowed(""),
        content_html: Cow::Owned(content),
        extra_style_blocks: Vec::new(),
        body_scripts: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(nama: &str, deskripsi: &str) -> CatalogFormValues {
        CatalogFormValues {
            nama: nama.to_string(),
            deskripsi: deskripsi.to_string(),
        }
    }

    #[test]
    fn valid_catalog_passes() {
        assert!(validate_catalog(&values("Buku Tata Kota", "Kajian.")).is_empty());
    }

    #[test]
    fn missing_fields_are_rejected() {
        let errors = validate_catalog(&values("", ""));
        assert_eq!(error_for(&errors, "nama"), Some("Nama buku wajib diisi."));
        assert_eq!(error_for(&errors, "deskripsi"), Some("Deskripsi wajib diisi."));
    }

    #[test]
    fn overlong_nama_is_rejected() {
        let long = "n".repeat(256);
        let errors = validate_catalog(&values(&long, "Kajian."));
        assert_eq!(
            error_for(&errors, "nama"),
            Some("Nama buku maksimal 255 karakter.")
        );
    }

    #[test]
    fn replacement_prefers_new_upload() {
        let (new, old) = replacement(
            Some("catalogs/pdfs/baru.pdf".to_string()),
            true,
            Some("catalogs/pdfs/lama.pdf".to_string()),
        );
        assert_eq!(new.as_deref(), Some("catalogs/pdfs/baru.pdf"));
        assert_eq!(old.as_deref(), Some("catalogs/pdfs/lama.pdf"));
    }

    #[test]
    fn replacement_honors_removal_checkbox() {
        let (new, old) = replacement(None, true, Some("catalogs/covers/lama.png".to_string()));
        assert!(new.is_none());
        assert_eq!(old.as_deref(), Some("catalogs/covers/lama.png"));
    }

    #[test]
    fn replacement_keeps_current_by_default() {
        let (new, old) = replacement(None, false, Some("catalogs/covers/lama.png".to_string()));
        assert_eq!(new.as_deref(), Some("catalogs/covers/lama.png"));
        assert!(old.is_none());
    }
}
