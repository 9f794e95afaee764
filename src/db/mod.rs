mod loader;
mod repository;
mod schema;

pub use loader::{load_posts, LoadReport};
pub use repository::Repository;
