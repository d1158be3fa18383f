pub mod connector;
pub mod models;
pub mod schema;

pub use connector::{DB, connect, ping};
pub use schema::create_schema;
