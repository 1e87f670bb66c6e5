/// Compose a flash message HTML snippet for known status or error codes
/// carried in the query string after a redirect.
pub fn compose_flash_message(status: Option<&str>, error: Option<&str>) -> String {
    if let Some(status) = status {
        let message = match status {
            "logged_out" => "Anda telah keluar.",
            "comment_pending" => {
                "Komentar Anda telah diterima dan sedang menunggu moderasi oleh admin."
            }
            "publication_created" => "Publikasi berhasil ditambahkan.",
            "publication_updated" => "Publikasi berhasil diperbarui.",
            "publication_deleted" => "Publikasi berhasil dihapus.",
            "catalog_created" => "Katalog buku berhasil ditambahkan.",
            "catalog_updated" => "Katalog buku berhasil diperbarui.",
            "catalog_deleted" => "Katalog buku berhasil dihapus.",
            "comment_approved" => "Komentar berhasil disetujui.",
            "comment_rejected" => "Komentar ditolak.",
            "comment_deleted" => "Komentar berhasil dihapus.",
            _ => "",
        };

        if !message.is_empty() {
            return format!(r#"<div class="flash success">{message}</div>"#);
        }
    }

    if let Some(error) = error {
        let message = match error {
            "not_authorized" => "Tindakan ini memerlukan hak akses admin.",
            "not_found" => "Data yang diminta tidak ditemukan.",
            _ => "Terjadi kesalahan. Silakan coba lagi.",
        };

        return format!(r#"<div class="flash error">{message}</div>"#);
    }

    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_status_renders_success_flash() {
        let html = compose_flash_message(Some("catalog_created"), None);
        assert!(html.contains("flash success"));
        assert!(html.contains("Katalog buku berhasil ditambahkan."));
    }

    #[test]
    fn unknown_status_renders_nothing() {
        assert_eq!(compose_flash_message(Some("mystery"), None), "");
        assert_eq!(compose_flash_message(None, None), "");
    }

    #[test]
    fn errors_always_render_a_message() {
        let html = compose_flash_message(None, Some("not_authorized"));
        assert!(html.contains("flash error"));
        assert!(html.contains("hak akses admin"));

        let html = compose_flash_message(None, Some("anything-else"));
        assert!(html.contains("Terjadi kesalahan"));
    }

    #[test]
    fn status_takes_precedence_over_error() {
        let html = compose_flash_message(Some("comment_approved"), Some("unknown"));
        assert!(html.contains("flash success"));
    }
}
