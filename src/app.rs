use std::path::Path;

use crate::config::Config;
use crate::db::{load_posts, LoadReport, Repository};
use crate::error::Result;
use crate::models::{normalize_posts, BlogPost};
use crate::source::{into_records, parse_posts, read_lossy};

/// Read, repair and clean the export at `path`.
pub fn prepare_posts(path: &Path) -> Result<Vec<BlogPost>> {
    println!("Reading {}...", path.display());
    let text = read_lossy(path)?;

    println!("Parsing JSON...");
    let outcome = parse_posts(&text)?;
    if let Some(first) = outcome.failures.first() {
        match first.position {
            Some((line, column)) => println!(
                "JSON decode error at line {} column {}: {}",
                line, column, first.message
            ),
            None => println!("JSON decode error: {}", first.message),
        }
        println!("Attempting to fix...");
        tracing::debug!("Parsed using {}", outcome.strategy);
    }

    let records = into_records(outcome.value)?;
    println!("Successfully parsed {} posts", records.len());

    let posts = normalize_posts(&records);
    println!("Valid posts: {}", posts.len());
    Ok(posts)
}

/// Full seed run: prepare the posts, then replace the collection contents.
pub async fn run(path: &Path, config: &Config) -> Result<LoadReport> {
    let posts = prepare_posts(path)?;

    println!("Connecting to MongoDB...");
    let repository = Repository::connect(config).await?;

    load_posts(&repository, &posts, config.batch_size).await
}
