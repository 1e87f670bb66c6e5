mod auth;
mod dashboard;

pub use auth::{require_admin_api, require_admin_user};
pub use dashboard::dashboard;
