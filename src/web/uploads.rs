use std::{collections::HashMap, path::Path};

use axum::extract::Multipart;
use tokio::{fs::File, io::AsyncWriteExt};
use tracing::warn;
use uuid::Uuid;

use crate::web::storage;

/// Result type used by the shared upload helpers.
pub type UploadResult<T> = Result<T, UploadError>;

/// Error returned when validating or persisting uploaded files. The message
/// is user-facing (Indonesian) and keyed to a form field so the page can be
/// re-rendered with the failure next to the right input.
#[derive(Debug)]
pub struct UploadError {
    field: String,
    message: String,
}

impl UploadError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for UploadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for UploadError {}

/// Expectations for a single optional multipart file field. Each field maps
/// to one media folder; at most one file per field is accepted.
#[derive(Debug, Clone, Copy)]
pub struct FileFieldConfig<'a> {
    pub field_name: &'a str,
    pub folder: &'a str,
    pub allowed_extensions: &'a [&'a str],
    pub max_bytes: u64,
}

pub const MAX_IMAGE_BYTES: u64 = 2 * 1024 * 1024;
pub const MAX_PDF_BYTES: u64 = 10 * 1024 * 1024;

/// Request-body ceiling for the router. The largest legal form carries a
/// catalog PDF plus a cover image, with headroom for multipart framing; the
/// per-field caps below remain the real limit.
pub const MAX_FORM_BODY_BYTES: usize = (MAX_PDF_BYTES + MAX_IMAGE_BYTES) as usize + 1024 * 1024;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];
pub const PDF_EXTENSIONS: &[&str] = &["pdf"];

impl<'a> FileFieldConfig<'a> {
    pub fn image(field_name: &'a str, folder: &'a str) -> Self {
        Self {
            field_name,
            folder,
            allowed_extensions: IMAGE_EXTENSIONS,
            max_bytes: MAX_IMAGE_BYTES,
        }
    }

    pub fn pdf(field_name: &'a str, folder: &'a str) -> Self {
        Self {
            field_name,
            folder,
            allowed_extensions: PDF_EXTENSIONS,
            max_bytes: MAX_PDF_BYTES,
        }
    }
}

/// Metadata for a file persisted under the media root.
#[derive(Debug, Clone)]
pub struct SavedUpload {
    pub field_name: String,
    pub original_name: String,
    /// Path relative to the media root, as stored on the record.
    pub relative_path: String,
    pub file_size: u64,
}

/// Aggregated output of the upload processor: stored files plus all plain
/// text fields from the same form.
#[derive(Debug, Default)]
pub struct UploadOutcome {
    pub files: Vec<SavedUpload>,
    pub text_fields: HashMap<String, String>,
}

impl UploadOutcome {
    pub fn file_for(&self, field_name: &str) -> Option<&SavedUpload> {
        self.files.iter().find(|file| file.field_name == field_name)
    }

    pub fn text(&self, field_name: &str) -> Option<&str> {
        self.text_fields.get(field_name).map(|s| s.as_str())
    }

    pub fn text_or_empty(&self, field_name: &str) -> &str {
        self.text(field_name).unwrap_or("")
    }

    /// Remove every stored file, used when validation fails after the form
    /// has already been parsed. Best-effort, like all media deletion.
    pub async fn discard_files(&self, media_root: &Path) {
        for file in &self.files {
            storage::delete_media(media_root, &file.relative_path).await;
        }
    }
}

fn extension_of(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default()
}

fn check_extension(config: &FileFieldConfig<'_>, extension: &str) -> Result<(), String> {
    if config.allowed_extensions.contains(&extension) {
        return Ok(());
    }

    Err(format!(
        "Jenis berkas `.{extension}` tidak didukung (diperbolehkan: {}).",
        config
            .allowed_extensions
            .iter()
            .map(|ext| format!(".{ext}"))
            .collect::<Vec<_>>()
            .join(", ")
    ))
}

/// Unique stored filename: random prefix plus the sanitized original name so
/// repeated uploads never collide while staying recognizable on disk.
fn stored_name(original: &str, extension: &str) -> String {
    let mut sanitized = sanitize_filename::sanitize(original);
    if sanitized.is_empty() {
        sanitized = if extension.is_empty() {
            "berkas".to_string()
        } else {
            format!("berkas.{extension}")
        };
    }
    format!("{}_{}", Uuid::new_v4().simple(), sanitized)
}

fn size_limit_message(max_bytes: u64) -> String {
    format!(
        "Ukuran berkas melebihi batas {} MB.",
        max_bytes / (1024 * 1024)
    )
}

/// Parse a multipart form, streaming file fields to their configured media
/// folders and collecting text fields. On any error the files written so far
/// are removed before returning.
pub async fn process_upload_form(
    mut multipart: Multipart,
    media_root: &Path,
    field_configs: &[FileFieldConfig<'_>],
) -> UploadResult<UploadOutcome> {
    let mut outcome = UploadOutcome::default();

    let result = loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break Ok(()),
            Err(err) => {
                break Err(UploadError::new(
                    "form",
                    format!("Gagal membaca formulir unggahan: {err}"),
                ));
            }
        };

        let field_name = field.name().unwrap_or("").to_string();

        if field.file_name().is_none() {
            match field.text().await {
                Ok(value) => {
                    outcome.text_fields.insert(field_name, value);
                }
                Err(err) => {
                    break Err(UploadError::new(
                        field_name.clone(),
                        format!("Gagal membaca isian formulir: {err}"),
                    ));
                }
            }
            continue;
        }

        let Some(config) = field_configs
            .iter()
            .find(|config| config.field_name == field_name)
        else {
            break Err(UploadError::new(
                field_name.clone(),
                "Kolom berkas tidak dikenal.",
            ));
        };

        let original_name = field.file_name().unwrap_or("").to_string();
        // Browsers submit an empty file part when the input is left blank.
        if original_name.is_empty() {
            continue;
        }

        if outcome.file_for(config.field_name).is_some() {
            break Err(UploadError::new(
                config.field_name,
                "Hanya satu berkas yang diperbolehkan.",
            ));
        }

        let extension = extension_of(&original_name);
        if let Err(message) = check_extension(config, &extension) {
            break Err(UploadError::new(config.field_name, message));
        }

        match save_file_field(field, config, media_root, &original_name, &extension).await {
            Ok(saved) => outcome.files.push(saved),
            Err(err) => break Err(err),
        }
    };

    if let Err(err) = result {
        outcome.discard_files(media_root).await;
        return Err(err);
    }

    Ok(outcome)
}

async fn save_file_field(
    mut field: axum::extract::multipart::Field<'_>,
    config: &FileFieldConfig<'_>,
    media_root: &Path,
    original_name: &str,
    extension: &str,
) -> UploadResult<SavedUpload> {
    let stored = stored_name(original_name, extension);
    let relative_path = format!("{}/{}", config.folder, stored);
    let disk_path = media_root.join(config.folder).join(&stored);

    let mut file = File::create(&disk_path).await.map_err(|err| {
        UploadError::new(
            config.field_name,
            format!("Gagal menyimpan berkas: {err}"),
        )
    })?;

    let mut total_bytes: u64 = 0;
    loop {
        let chunk = match field.chunk().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(err) => {
                remove_partial(&disk_path).await;
                return Err(UploadError::new(
                    config.field_name,
                    format!("Gagal membaca data unggahan: {err}"),
                ));
            }
        };

        total_bytes += chunk.len() as u64;
        if total_bytes > config.max_bytes {
            remove_partial(&disk_path).await;
            return Err(UploadError::new(
                config.field_name,
                size_limit_message(config.max_bytes),
            ));
        }

        if let Err(err) = file.write_all(&chunk).await {
            remove_partial(&disk_path).await;
            return Err(UploadError::new(
                config.field_name,
                format!("Gagal menulis berkas: {err}"),
            ));
        }
    }

    if let Err(err) = file.flush().await {
        remove_partial(&disk_path).await;
        return Err(UploadError::new(
            config.field_name,
            format!("Gagal menyelesaikan penyimpanan berkas: {err}"),
        ));
    }

    Ok(SavedUpload {
        field_name: config.field_name.to_string(),
        original_name: original_name.to_string(),
        relative_path,
        file_size: total_bytes,
    })
}

async fn remove_partial(path: &Path) {
    if let Err(err) = tokio::fs::remove_file(path).await {
        warn!(?err, file = %path.display(), "failed to remove partial upload");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::Body,
        extract::{DefaultBodyLimit, Multipart},
        http::{Request, StatusCode, header},
        routing::post,
    };
    use tempfile::tempdir;
    use tower::ServiceExt;

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(extension_of("Sampul.PNG"), "png");
        assert_eq!(extension_of("buku.pdf"), "pdf");
        assert_eq!(extension_of("tanpa-ekstensi"), "");
    }

    #[test]
    fn image_config_rejects_pdf() {
        let config = FileFieldConfig::image("gambar_sampul", "catalogs/covers");
        assert!(check_extension(&config, "png").is_ok());
        assert!(check_extension(&config, "webp").is_ok());
        let err = check_extension(&config, "pdf").unwrap_err();
        assert!(err.contains(".pdf"));
    }

    #[test]
    fn pdf_config_is_mime_restricted() {
        let config = FileFieldConfig::pdf("pdf_file_buku", "catalogs/pdfs");
        assert!(check_extension(&config, "pdf").is_ok());
        assert!(check_extension(&config, "exe").is_err());
        assert!(check_extension(&config, "").is_err());
    }

    #[test]
    fn stored_name_is_unique_and_recognizable() {
        let first = stored_name("laporan tahunan.pdf", "pdf");
        let second = stored_name("laporan tahunan.pdf", "pdf");
        assert_ne!(first, second);
        assert!(first.ends_with("laporan tahunan.pdf"));
    }

    #[test]
    fn stored_name_handles_hostile_input() {
        let name = stored_name("../../etc/passwd", "");
        assert!(!name.contains(".."));
        assert!(!name.contains('/'));
    }

    #[test]
    fn size_limit_message_reports_megabytes() {
        assert_eq!(MAX_IMAGE_BYTES, 2 * 1024 * 1024);
        assert_eq!(MAX_PDF_BYTES, 10 * 1024 * 1024);
        assert_eq!(size_limit_message(MAX_PDF_BYTES), "Ukuran berkas melebihi batas 10 MB.");
    }

    /// A routed PDF upload larger than axum's 2 MB default body cap must
    /// reach the streaming processor intact once the router raises the cap.
    #[tokio::test]
    async fn oversize_pdf_reaches_processor_through_body_limit() {
        const PDF_BYTES: usize = 3 * 1024 * 1024;

        let dir = tempdir().expect("tempdir");
        storage::ensure_media_layout(dir.path()).await.expect("layout");
        let root = dir.path().to_path_buf();

        let app = Router::new().route(
            "/admin/catalogs",
            post(move |multipart: Multipart| {
                let root = root.clone();
                async move {
                    let configs =
                        [FileFieldConfig::pdf("pdf_file_buku", "catalogs/pdfs")];
                    match process_upload_form(multipart, &root, &configs).await {
                        Ok(outcome) => match outcome.file_for("pdf_file_buku") {
                            Some(file) if file.file_size == PDF_BYTES as u64 => StatusCode::OK,
                            _ => StatusCode::INTERNAL_SERVER_ERROR,
                        },
                        Err(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    }
                }
            })
            .layer(DefaultBodyLimit::max(MAX_FORM_BODY_BYTES)),
        );

        let boundary = "batas-uji";
        let mut body = Vec::with_capacity(PDF_BYTES + 512);
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"pdf_file_buku\"; filename=\"buku.pdf\"\r\nContent-Type: application/pdf\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(&vec![b'a'; PDF_BYTES]);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        let request = Request::builder()
            .method("POST")
            .uri("/admin/catalogs")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .expect("request");

        let response = app.oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn outcome_accessors() {
        let mut outcome = UploadOutcome::default();
        outcome
            .text_fields
            .insert("title".to_string(), "Judul".to_string());
        outcome.files.push(SavedUpload {
            field_name: "image".to_string(),
            original_name: "foto.png".to_string(),
            relative_path: "publications/x_foto.png".to_string(),
            file_size: 10,
        });

        assert_eq!(outcome.text("title"), Some("Judul"));
        assert_eq!(outcome.text_or_empty("missing"), "");
        assert!(outcome.file_for("image").is_some());
        assert!(outcome.file_for("pdf_file_buku").is_none());
    }
}
