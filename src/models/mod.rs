mod post;

pub use post::{normalize_posts, BlogPost};
