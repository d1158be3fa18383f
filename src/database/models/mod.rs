pub mod comments;
pub mod newsletter_subscribers;
pub mod posts;
pub mod sessions;
pub mod users;
