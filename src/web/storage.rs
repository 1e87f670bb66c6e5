use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use axum::{
    extract::{Path as AxumPath, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use tracing::warn;

use crate::web::{AppState, templates};

/// Media folders, one per upload purpose.
pub const FOLDER_PUBLICATIONS: &str = "publications";
pub const FOLDER_CATALOG_COVERS: &str = "catalogs/covers";
pub const FOLDER_CATALOG_PDFS: &str = "catalogs/pdfs";

/// Create the media root and its per-purpose subdirectories.
pub async fn ensure_media_layout(root: &Path) -> Result<()> {
    for folder in [FOLDER_PUBLICATIONS, FOLDER_CATALOG_COVERS, FOLDER_CATALOG_PDFS] {
        let path = root.join(folder);
        tokio::fs::create_dir_all(&path)
            .await
            .with_context(|| format!("failed to create media directory {}", path.display()))?;
    }
    Ok(())
}

/// Resolve a stored relative path against the media root, rejecting anything
/// that would escape it.
pub fn media_disk_path(root: &Path, relative: &str) -> Option<PathBuf> {
    let candidate = Path::new(relative);
    if candidate.is_absolute() {
        return None;
    }
    for component in candidate.components() {
        match component {
            Component::Normal(_) => {}
            _ => return None,
        }
    }
    Some(root.join(candidate))
}

/// Best-effort media deletion. Failures are logged and reported as `false`;
/// they never block the record operation that triggered the cleanup.
pub async fn delete_media(root: &Path, relative: &str) -> bool {
    let Some(path) = media_disk_path(root, relative) else {
        warn!(%relative, "refusing to delete media path outside the media root");
        return false;
    };

    match tokio::fs::remove_file(&path).await {
        Ok(()) => true,
        Err(err) => {
            warn!(?err, file = %path.display(), "failed to delete media file");
            false
        }
    }
}

pub async fn media_exists(root: &Path, relative: &str) -> bool {
    match media_disk_path(root, relative) {
        Some(path) => tokio::fs::metadata(&path).await.is_ok(),
        None => false,
    }
}

fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        _ => mime::APPLICATION_OCTET_STREAM.as_ref(),
    }
}

/// Serve an uploaded file from the media root. Unknown or unsafe paths get
/// the regular 404 page.
pub async fn serve_media(
    State(state): State<AppState>,
    AxumPath(relative): AxumPath<String>,
) -> Response {
    let root = &state.config().media_root;
    let Some(path) = media_disk_path(root, &relative) else {
        return not_found_response();
    };

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(_) => return not_found_response(),
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(content_type_for(&path)),
    );
    (headers, bytes).into_response()
}

/// Stream a file with an attachment disposition, for catalog PDF downloads.
pub async fn stream_download(
    path: &Path,
    filename: &str,
    content_type: &'static str,
) -> Result<Response, Response> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|_| not_found_response())?;

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));

    let sanitized = filename.replace(['"', '\r', '\n'], "");
    let disposition = format!("attachment; filename=\"{sanitized}\"");
    let disposition =
        HeaderValue::from_str(&disposition).map_err(|_| not_found_response())?;
    headers.insert(header::CONTENT_DISPOSITION, disposition);

    Ok((headers, bytes).into_response())
}

pub fn not_found_response() -> Response {
    (StatusCode::NOT_FOUND, Html(templates::render_not_found())).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn ensure_media_layout_creates_purpose_folders() {
        let dir = tempdir().expect("tempdir");
        ensure_media_layout(dir.path()).await.expect("layout");

        assert!(dir.path().join("publications").is_dir());
        assert!(dir.path().join("catalogs/covers").is_dir());
        assert!(dir.path().join("catalogs/pdfs").is_dir());
    }

    #[test]
    fn media_disk_path_rejects_traversal() {
        let root = Path::new("/srv/media");
        assert!(media_disk_path(root, "../etc/passwd").is_none());
        assert!(media_disk_path(root, "publications/../../x").is_none());
        assert!(media_disk_path(root, "/etc/passwd").is_none());
        assert_eq!(
            media_disk_path(root, "publications/foto.png"),
            Some(PathBuf::from("/srv/media/publications/foto.png"))
        );
    }

    #[tokio::test]
    async fn delete_media_is_best_effort() {
        let dir = tempdir().expect("tempdir");
        let file = dir.path().join("sampul.png");
        tokio::fs::write(&file, b"data").await.expect("write");

        assert!(delete_media(dir.path(), "sampul.png").await);
        assert!(!file.exists());
        // Second delete fails quietly.
        assert!(!delete_media(dir.path(), "sampul.png").await);
        assert!(!delete_media(dir.path(), "../outside.png").await);
    }

    #[tokio::test]
    async fn media_exists_checks_disk() {
        let dir = tempdir().expect("tempdir");
        tokio::fs::write(dir.path().join("buku.pdf"), b"%PDF-")
            .await
            .expect("write");

        assert!(media_exists(dir.path(), "buku.pdf").await);
        assert!(!media_exists(dir.path(), "hilang.pdf").await);
        assert!(!media_exists(dir.path(), "../buku.pdf").await);
    }

    #[test]
    fn content_type_covers_media_kinds() {
        assert_eq!(content_type_for(Path::new("a.JPG")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("b.webp")), "image/webp");
        assert_eq!(content_type_for(Path::new("c.pdf")), "application/pdf");
        assert_eq!(
            content_type_for(Path::new("d.bin")),
            "application/octet-stream"
        );
    }
}
