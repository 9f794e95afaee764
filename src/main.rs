use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

mod app;
mod config;
mod db;
mod error;
mod models;
mod source;

use config::Config;

const DEFAULT_POSTS_PATH: &str = "../blog_posts3.json";

/// Load a blog post JSON export into MongoDB, replacing the `blogposts` collection.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the posts export
    #[arg(default_value = DEFAULT_POSTS_PATH)]
    path: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    // MONGODB_URI may come from a local .env file
    dotenvy::dotenv().ok();

    // Initialize logging (only show warnings and errors by default)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    match app::run(&cli.path, &config).await {
        Ok(report) => {
            println!(
                "\n✅ Successfully loaded {} unique posts into MongoDB!",
                report.inserted
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("\n❌ Error: {}", e);
            eprintln!("{:?}", anyhow::Error::new(e));
            ExitCode::FAILURE
        }
    }
}
