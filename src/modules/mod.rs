pub mod catalogs;
pub mod comments;
pub mod publications;
