pub mod admin;
pub mod auth;
pub mod data;
pub mod flash;
pub mod landing;
pub mod models;
pub mod router;
pub mod state;
pub mod storage;
pub mod templates;
pub mod uploads;

pub use auth::{AuthUser, SESSION_COOKIE, SESSION_TTL_DAYS};
pub use state::AppState;
pub use templates::{escape_html, render_footer};
