mod literal;
mod reader;
mod repair;

pub use reader::read_lossy;
pub use repair::{into_records, parse_posts, StrategyError};
