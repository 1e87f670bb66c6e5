use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Moderation state of a visitor comment. New comments always start out
/// `Pending`; only an admin action moves them to a terminal state, and the
/// admin panel may re-decide between `Approved` and `Rejected` freely.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CommentStatus {
    Pending,
    Approved,
    Rejected,
}

impl CommentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CommentStatus::Pending => "pending",
            CommentStatus::Approved => "approved",
            CommentStatus::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(CommentStatus::Pending),
            "approved" => Some(CommentStatus::Approved),
            "rejected" => Some(CommentStatus::Rejected),
            _ => None,
        }
    }

    /// Indonesian label shown in the admin panel.
    pub fn label(self) -> &'static str {
        match self {
            CommentStatus::Pending => "Menunggu",
            CommentStatus::Approved => "Disetujui",
            CommentStatus::Rejected => "Ditolak",
        }
    }
}

/// Admin comment listing filter. Unknown values fall back to `All`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CommentFilter {
    All,
    Status(CommentStatus),
}

impl CommentFilter {
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("all") | None => CommentFilter::All,
            Some(other) => CommentStatus::parse(other)
                .map(CommentFilter::Status)
                .unwrap_or(CommentFilter::All),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CommentFilter::All => "all",
            CommentFilter::Status(status) => status.as_str(),
        }
    }
}

/// One validation failure, keyed to the form field it belongs to so pages
/// can re-render the message next to the right input.
#[derive(Clone, Debug)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// First error message recorded for a field, if any.
pub fn error_for<'a>(errors: &'a [FieldError], field: &str) -> Option<&'a str> {
    errors
        .iter()
        .find(|err| err.field == field)
        .map(|err| err.message.as_str())
}

#[derive(Clone, FromRow)]
pub struct PublicationRow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub link_route: Option<String>,
    pub user_id: i64,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, FromRow)]
pub struct CatalogRow {
    pub id: i64,
    pub nama: String,
    pub deskripsi: String,
    pub gambar_sampul: Option<String>,
    pub pdf_file_buku: Option<String>,
    pub user_id: i64,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Approved comment as shown on the public publication page.
#[derive(Clone, FromRow)]
pub struct CommentRow {
    pub id: i64,
    pub nama: String,
    pub komentar: String,
    pub created_at: DateTime<Utc>,
}

/// Comment joined with its publication title for the moderation panel.
#[derive(Clone, FromRow)]
pub struct AdminCommentRow {
    pub id: i64,
    pub publication_id: i64,
    pub publication_title: String,
    pub nama: String,
    pub email: String,
    pub komentar: String,
    pub status: String,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Per-status totals rendered as badges in the moderation panel.
#[derive(Clone, Copy, Debug, Default)]
pub struct CommentCounts {
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
}

impl CommentCounts {
    pub fn total(&self) -> i64 {
        self.pending + self.approved + self.rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            CommentStatus::Pending,
            CommentStatus::Approved,
            CommentStatus::Rejected,
        ] {
            assert_eq!(CommentStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert_eq!(CommentStatus::parse("spam"), None);
        assert_eq!(CommentStatus::parse("PENDING"), None);
        assert_eq!(CommentStatus::parse(""), None);
    }

    #[test]
    fn filter_falls_back_to_all() {
        assert_eq!(CommentFilter::parse(None), CommentFilter::All);
        assert_eq!(CommentFilter::parse(Some("all")), CommentFilter::All);
        assert_eq!(CommentFilter::parse(Some("bogus")), CommentFilter::All);
        assert_eq!(
            CommentFilter::parse(Some("pending")),
            CommentFilter::Status(CommentStatus::Pending)
        );
    }

    #[test]
    fn counts_total_sums_all_statuses() {
        let counts = CommentCounts {
            pending: 3,
            approved: 5,
            rejected: 2,
        };
        assert_eq!(counts.total(), 10);
    }
}
