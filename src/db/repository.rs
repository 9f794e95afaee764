use mongodb::bson::doc;
use mongodb::error::{Error as MongoError, ErrorKind};
use mongodb::{Client, Collection};

use crate::config::Config;
use crate::error::{InsertFailure, Result};
use crate::models::BlogPost;

use super::loader::PostStore;
use super::schema::blog_post_indexes;

pub struct Repository {
    collection: Collection<BlogPost>,
}

impl Repository {
    pub async fn connect(config: &Config) -> Result<Self> {
        let client = Client::with_uri_str(config.resolved_uri()).await?;

        // The driver connects lazily; ping so a bad host fails here.
        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;

        let database = client
            .default_database()
            .unwrap_or_else(|| client.database(&config.database));
        tracing::debug!("Using database {}", database.name());

        Ok(Self {
            collection: database.collection::<BlogPost>(&config.collection),
        })
    }
}

impl PostStore for Repository {
    async fn clear(&self) -> Result<u64> {
        let result = self.collection.delete_many(doc! {}).await?;
        Ok(result.deleted_count)
    }

    async fn ensure_indexes(&self) -> Result<()> {
        let created = self.collection.create_indexes(blog_post_indexes()).await?;
        tracing::debug!("Ensured indexes: {:?}", created.index_names);
        Ok(())
    }

    async fn insert_batch(&self, batch: &[BlogPost]) -> std::result::Result<usize, InsertFailure> {
        match self.collection.insert_many(batch).ordered(false).await {
            Ok(result) => Ok(result.inserted_ids.len()),
            Err(e) => Err(insert_failure(batch.len(), e)),
        }
    }
}

/// With an unordered insert every document that has no write error was
/// stored, so the partial count is what's left after the write errors.
fn insert_failure(attempted: usize, err: MongoError) -> InsertFailure {
    let partial = match err.kind.as_ref() {
        ErrorKind::InsertMany(failure) => {
            let failed = failure.write_errors.as_ref().map_or(0, Vec::len);
            Some(attempted.saturating_sub(failed))
        }
        _ => None,
    };
    InsertFailure {
        partial,
        message: err.to_string(),
    }
}
