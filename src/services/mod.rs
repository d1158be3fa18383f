pub mod images;
pub mod sessions;
