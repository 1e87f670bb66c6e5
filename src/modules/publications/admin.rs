use std::borrow::Cow;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{error, info};

use super::PageQuery;
use crate::web::{
    AppState, AuthUser, auth, data, flash,
    models::{FieldError, PublicationRow, error_for},
    storage, templates,
    templates::{ActiveNav, PageLayout, escape_html, render_page},
    uploads::{self, FileFieldConfig, UploadError},
};

pub const TITLE_MAX_CHARS: usize = 255;

/// Text inputs of the publication form, kept around so a failed submit
/// re-renders with everything the editor already typed.
#[derive(Default)]
struct PublicationFormValues {
    title: String,
    description: String,
    link_route: String,
}

impl PublicationFormValues {
    fn from_outcome(outcome: &uploads::UploadOutcome) -> Self {
        Self {
            title: outcome.text_or_empty("title").trim().to_string(),
            description: outcome.text_or_empty("description").trim().to_string(),
            link_route: outcome.text_or_empty("link_route").trim().to_string(),
        }
    }

    fn from_row(row: &PublicationRow) -> Self {
        Self {
            title: row.title.clone(),
            description: row.description.clone(),
            link_route: row.link_route.clone().unwrap_or_default(),
        }
    }
}

fn validate_publication(values: &PublicationFormValues) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if values.title.is_empty() {
        errors.push(FieldError::new("title", "Judul wajib diisi."));
    } else if values.title.chars().count() > TITLE_MAX_CHARS {
        errors.push(FieldError::new("title", "Judul maksimal 255 karakter."));
    }

    if values.description.is_empty() {
        errors.push(FieldError::new("description", "Deskripsi wajib diisi."));
    }

    if !values.link_route.is_empty() {
        if !(values.link_route.starts_with("http://")
            || values.link_route.starts_with("https://"))
        {
            errors.push(FieldError::new(
                "link_route",
                "Tautan harus diawali http:// atau https://.",
            ));
        } else if values.link_route.chars().count() > TITLE_MAX_CHARS {
            errors.push(FieldError::new(
                "link_route",
                "Tautan maksimal 255 karakter.",
            ));
        }
    }

    errors
}

/// Upload failures surface as form field errors so the page re-renders the
/// message in place, like any other validation failure.
fn upload_field_error(err: &UploadError) -> FieldError {
    let field = match err.field() {
        "image" => "image",
        _ => "form",
    };
    FieldError::new(field, err.message().to_string())
}

pub async fn manage(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<PageQuery>,
) -> Result<Html<String>, Redirect> {
    let user = auth::require_user_redirect(&state, &jar).await?;
    let pool = state.pool();

    let publications = match data::fetch_publications(&pool).await {
        Ok(rows) => rows,
        Err(err) => {
            error!(?err, "failed to load publications for management");
            Vec::new()
        }
    };

    let rows = if publications.is_empty() {
        r#"<tr><td colspan="4">Belum ada publikasi.</td></tr>"#.to_string()
    } else {
        publications
            .iter()
            .map(|publication| {
                format!(
                    r#"<tr>
                        <td><a href="/publications/{id}">{title}</a></td>
                        <td>{author}</td>
                        <td>{updated}</td>
                        <td>
                            <a class="button-secondary" href="/publications/{id}/edit">Ubah</a>
                            <form method="post" action="/publications/{id}/delete" style="display:inline" onsubmit="return confirm('Hapus publikasi ini beserta semua komentarnya?');">
                                <button class="button-danger" type="submit">Hapus</button>
                            </form>
                        </td>
                    </tr>"#,
                    id = publication.id,
                    title = escape_html(&publication.title),
                    author = escape_html(&publication.author_name),
                    updated = templates::format_datetime(publication.updated_at),
                )
            })
            .collect::<String>()
    };

    let content = format!(
        r#"        <h1 class="page-heading">Kelola Publikasi</h1>
        <p class="page-subtitle">Tulis, ubah, atau hapus publikasi.</p>
        <a class="button-primary" href="/publications/create">Tulis Publikasi</a>
        <table>
            <thead><tr><th>Judul</th><th>Penulis</th><th>Terakhir Diubah</th><th>Aksi</th></tr></thead>
            <tbody>{rows}</tbody>
        </table>
"#,
    );

    let flash_html = flash::compose_flash_message(params.status.as_deref(), params.error.as_deref());
    Ok(Html(render_page(PageLayout {
        meta_title: "Kelola Publikasi | Jurnal & Katalog",
        active_nav: ActiveNav::Dashboard,
        user: Some(&user),
        flash_html: Cow::Owned(flash_html),
        content_html: Cow::Owned(content),
        extra_style_blocks: Vec::new(),
        body_scripts: Vec::new(),
    })))
}

pub async fn create_form(State(state): State<AppState>, jar: CookieJar) -> Result<Html<String>, Redirect> {
    let user = auth::require_user_redirect(&state, &jar).await?;
    Ok(Html(render_form_page(
        &user,
        "Tulis Publikasi",
        "/publications",
        &PublicationFormValues::default(),
        &[],
        None,
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
    let configs = [FileFieldConfig::image("image", storage::FOLDER_PUBLICATIONS)];

    let outcome = match uploads::process_upload_form(multipart, &media_root, &configs).await {
        Ok(outcome) => outcome,
        Err(err) => {
            return form_error_response(
                &user,
                "Tulis Publikasi",
                "/publications",
                PublicationFormValues::default(),
                vec![upload_field_error(&err)],
                None,
            );
        }
    };

    let values = PublicationFormValues::from_outcome(&outcome);
    let errors = validate_publication(&values);
    if !errors.is_empty() {
        outcome.discard_files(&media_root).await;
        return form_error_response(&user, "Tulis Publikasi", "/publications", values, errors, None);
    }

    let image = outcome.file_for("image").map(|file| file.relative_path.clone());
    let link_route = (!values.link_route.is_empty()).then(|| values.link_route.clone());

    let inserted: Result<i64, sqlx::Error> = sqlx::query_scalar(
        "INSERT INTO publications (title, description, image, link_route, user_id) VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(&values.title)
    .bind(&values.description)
    .bind(&image)
    .bind(&link_route)
    .bind(user.id)
    .fetch_one(state.pool_ref())
    .await;

    match inserted {
        Ok(id) => {
            info!(publication_id = id, user_id = user.id, "publication created");
            Redirect::to("/manage-publications?status=publication_created").into_response()
        }
        Err(err) => {
            error!(?err, "failed to create publication");
            outcome.discard_files(&media_root).await;
            form_error_response(
                &user,
                "Tulis Publikasi",
                "/publications",
                values,
                vec![FieldError::new(
                    "form",
                    "Gagal menyimpan publikasi. Silakan coba lagi.",
                )],
                None,
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

    let publication = match data::fetch_publication(&pool, id).await {
        Ok(Some(row)) => row,
        Ok(None) => return storage::not_found_response(),
        Err(err) => {
            error!(?err, publication_id = id, "failed to load publication for edit");
            return storage::not_found_response();
        }
    };

    Html(render_form_page(
        &user,
        "Ubah Publikasi",
        &format!("/publications/{id}"),
        &PublicationFormValues::from_row(&publication),
        &[],
        publication.image.as_deref(),
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

    let existing = match data::fetch_publication(&pool, id).await {
        Ok(Some(row)) => row,
        Ok(None) => return storage::not_found_response(),
        Err(err) => {
            error!(?err, publication_id = id, "failed to load publication for update");
            return storage::not_found_response();
        }
    };

    let media_root = state.config().media_root.clone();
    let configs = [FileFieldConfig::image("image", storage::FOLDER_PUBLICATIONS)];
    let action = format!("/publications/{id}");

    let outcome = match uploads::process_upload_form(multipart, &media_root, &configs).await {
        Ok(outcome) => outcome,
        Err(err) => {
            return form_error_response(
                &user,
                "Ubah Publikasi",
                &action,
                PublicationFormValues::from_row(&existing),
                vec![upload_field_error(&err)],
                existing.image.as_deref(),
            );
        }
    };

    let values = PublicationFormValues::from_outcome(&outcome);
    let errors = validate_publication(&values);
    if !errors.is_empty() {
        outcome.discard_files(&media_root).await;
        return form_error_response(
            &user,
            "Ubah Publikasi",
            &action,
            values,
            errors,
            existing.image.as_deref(),
        );
    }

    let uploaded = outcome.file_for("image").map(|file| file.relative_path.clone());
    let remove_requested = outcome.text("hapus_gambar").is_some();

    // New upload wins over the removal checkbox; the old file goes away in
    // either case, after the record update succeeds.
    let (new_image, old_to_delete) = match (&uploaded, remove_requested) {
        (Some(path), _) => (Some(path.clone()), existing.image.clone()),
        (None, true) => (None, existing.image.clone()),
        (None, false) => (existing.image.clone(), None),
    };

    let link_route = (!values.link_route.is_empty()).then(|| values.link_route.clone());

    let updated = sqlx::query(
        "UPDATE publications SET title = $1, description = $2, image = $3, link_route = $4, updated_at = NOW() WHERE id = $5",
    )
    .bind(&values.title)
    .bind(&values.description)
    .bind(&new_image)
    .bind(&link_route)
    .bind(id)
    .execute(state.pool_ref())
    .await;

    match updated {
        Ok(_) => {
            if let Some(old) = old_to_delete {
                storage::delete_media(&media_root, &old).await;
            }
            info!(publication_id = id, user_id = user.id, "publication updated");
            Redirect::to("/manage-publications?status=publication_updated").into_response()
        }
        Err(err) => {
            error!(?err, publication_id = id, "failed to update publication");
            outcome.discard_files(&media_root).await;
            form_error_response(
                &user,
                "Ubah Publikasi",
                &action,
                values,
                vec![FieldError::new(
                    "form",
                    "Gagal menyimpan perubahan. Silakan coba lagi.",
                )],
                existing.image.as_deref(),
            )
        }
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

    let existing = match data::fetch_publication(&pool, id).await {
        Ok(Some(row)) => row,
        Ok(None) => {
            return Redirect::to("/manage-publications?error=not_found").into_response();
        }
        Err(err) => {
            error!(?err, publication_id = id, "failed to load publication for delete");
            return Redirect::to("/manage-publications?error=server").into_response();
        }
    };

    // Comments on the publication go with it via the foreign key cascade.
    if let Err(err) = sqlx::query("DELETE FROM publications WHERE id = $1")
        .bind(id)
        .execute(state.pool_ref())
        .await
    {
        error!(?err, publication_id = id, "failed to delete publication");
        return Redirect::to("/manage-publications?error=server").into_response();
    }

    if let Some(image) = existing.image.as_deref() {
        storage::delete_media(&state.config().media_root, image).await;
    }

    info!(publication_id = id, user_id = user.id, "publication deleted");
    Redirect::to("/manage-publications?status=publication_deleted").into_response()
}

fn form_error_response(
    user: &AuthUser,
    heading: &str,
    action: &str,
    values: PublicationFormValues,
    errors: Vec<FieldError>,
    current_image: Option<&str>,
) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Html(render_form_page(
            user,
            heading,
            action,
            &values,
            &errors,
            current_image,
        )),
    )
        .into_response()
}

fn field_error_html(errors: &[FieldError], field: &str) -> String {
    error_for(errors, field)
        .map(|message| format!(r#"<p class="field-error">{}</p>"#, escape_html(message)))
        .unwrap_or_default()
}

fn render_form_page(
    user: &AuthUser,
    heading: &str,
    action: &str,
    values: &PublicationFormValues,
    errors: &[FieldError],
    current_image: Option<&str>,
) -> String {
    let form_error = field_error_html(errors, "form");

    let current_image_html = match current_image {
        Some(image) => format!(
            r#"<p class="field-hint">Gambar saat ini: <a href="/media/{src}" target="_blank">{src}</a></p>
                    <label style="font-weight: 400;"><input type="checkbox" name="hapus_gambar" value="1" style="width: auto;"> Hapus gambar saat ini</label>"#,
            src = escape_html(image),
        ),
        None => String::new(),
    };

    let content = format!(
        r#"        <h1 class="page-heading">{heading}</h1>
        <section class="panel">
            {form_error}
            <form method="post" action="{action}" enctype="multipart/form-data">
                <div class="form-field">
                    <label for="title">Judul</label>
                    <input id="title" type="text" name="title" value="{title}" required>
                    {title_error}
                </div>
                <div class="form-field">
                    <label for="description">Deskripsi</label>
                    <textarea id="description" name="description" required>{description}</textarea>
                    {description_error}
                </div>
                <div class="form-field">
                    <label for="link_route">Tautan Eksternal (opsional)</label>
                    <input id="link_route" type="url" name="link_route" value="{link_route}">
                    {link_route_error}
                </div>
                <div class="form-field">
                    <label for="image">Gambar (opsional, maksimal 2 MB)</label>
                    <input id="image" type="file" name="image" accept="image/*">
                    {image_error}
                    {current_image_html}
                </div>
                <button class="primary" type="submit">Simpan</button>
                <a class="button-secondary" href="/manage-publications">Batal</a>
            </form>
        </section>
"#,
        heading = escape_html(heading),
        action = escape_html(action),
        title = escape_html(&values.title),
        title_error = field_error_html(errors, "title"),
        description = escape_html(&values.description),
        description_error = field_error_html(errors, "description"),
        link_route = escape_html(&values.link_route),
        link_route_error = field_error_html(errors, "link_route"),
        image_error = field_error_html(errors, "image"),
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

    fn values(title: &str, description: &str, link_route: &str) -> PublicationFormValues {
        PublicationFormValues {
            title: title.to_string(),
            description: description.to_string(),
            link_route: link_route.to_string(),
        }
    }

    #[test]
    fn valid_publication_passes() {
        assert!(validate_publication(&values("Judul", "Isi.", "")).is_empty());
        assert!(validate_publication(&values("Judul", "Isi.", "https://contoh.id")).is_empty());
    }

    #[test]
    fn missing_title_and_description_are_rejected() {
        let errors = validate_publication(&values("", "", ""));
        assert_eq!(error_for(&errors, "title"), Some("Judul wajib diisi."));
        assert_eq!(error_for(&errors, "description"), Some("Deskripsi wajib diisi."));
    }

    #[test]
    fn overlong_title_is_rejected() {
        let long = "j".repeat(256);
        let errors = validate_publication(&values(&long, "Isi.", ""));
        assert_eq!(error_for(&errors, "title"), Some("Judul maksimal 255 karakter."));

        let max = "j".repeat(255);
        assert!(validate_publication(&values(&max, "Isi.", "")).is_empty());
    }

    #[test]
    fn link_route_must_be_http() {
        let errors = validate_publication(&values("Judul", "Isi.", "javascript:alert(1)"));
        assert_eq!(
            error_for(&errors, "link_route"),
            Some("Tautan harus diawali http:// atau https://.")
        );
    }
}
