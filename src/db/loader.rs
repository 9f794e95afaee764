use crate::error::{InsertFailure, Result};
use crate::models::BlogPost;

/// Destination for a full replace of the posts collection.
#[allow(async_fn_in_trait)]
pub trait PostStore {
    /// Remove every stored post, returning how many were deleted.
    async fn clear(&self) -> Result<u64>;

    async fn ensure_indexes(&self) -> Result<()>;

    /// Insert one batch without stopping at the first bad document.
    async fn insert_batch(&self, batch: &[BlogPost]) -> std::result::Result<usize, InsertFailure>;
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub deleted: u64,
    pub batches: usize,
    pub inserted: usize,
}

/// Replace the store's contents with `posts`, inserted `batch_size` at a
/// time. Indexes are ensured before anything is deleted. A failed batch only contributes what the store reports as stored;
/// it never stops the load.
pub async fn load_posts<S: PostStore>(
    store: &S,
    posts: &[BlogPost],
    batch_size: usize,
) -> Result<LoadReport> {
    let mut report = LoadReport::default();

    // An index conflict must fail the run while the old posts are still there.
    store.ensure_indexes().await?;

    println!("Clearing existing data...");
    report.deleted = store.clear().await?;
    tracing::debug!("Deleted {} existing posts", report.deleted);

    let total = posts.len();
    let mut processed = 0;
    for batch in posts.chunks(batch_size.max(1)) {
        report.batches += 1;
        match store.insert_batch(batch).await {
            Ok(inserted) => report.inserted += inserted,
            Err(failure) => {
                let stored = failure.partial.unwrap_or(0);
                tracing::warn!(
                    "Batch {} stored {} of {} posts: {}",
                    report.batches,
                    stored,
                    batch.len(),
                    failure
                );
                report.inserted += stored;
            }
        }
        processed += batch.len();
        println!(
            "Processed {} / {} posts (inserted: {})",
            processed, total, report.inserted
        );
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    use crate::error::AppError;
    use std::sync::Mutex;

    use serde_json::json;

    /// In-memory store with a unique `basename`, like the real collection.
    #[derive(Default)]
    struct FakeStore {
        docs: Mutex<Vec<BlogPost>>,
        batch_sizes: Mutex<Vec<usize>>,
        scripted: Mutex<VecDeque<InsertFailure>>,
        index_calls: Mutex<usize>,
        reject_indexes: bool,
    }

    impl FakeStore {
        fn fail_next(&self, partial: Option<usize>, message: &str) {
            self.scripted.lock().unwrap().push_back(InsertFailure {
                partial,
                message: message.to_string(),
            });
        }

        fn basenames(&self) -> Vec<String> {
            self.docs
                .lock()
                .unwrap()
                .iter()
                .map(|p| p.basename.clone())
                .collect()
        }
    }

    impl PostStore for FakeStore {
        async fn clear(&self) -> Result<u64> {
            let mut docs = self.docs.lock().unwrap();
            let deleted = docs.len() as u64;
            docs.clear();
            Ok(deleted)
        }

        async fn ensure_indexes(&self) -> Result<()> {
            *self.index_calls.lock().unwrap() += 1;
            if self.reject_indexes {
                return Err(AppError::Read {
                    path: "blogposts".into(),
                    source: std::io::Error::other("index options conflict on basename_1"),
                });
            }
            Ok(())
        }

        async fn insert_batch(
            &self,
            batch: &[BlogPost],
        ) -> std::result::Result<usize, InsertFailure> {
            self.batch_sizes.lock().unwrap().push(batch.len());
            let mut docs = self.docs.lock().unwrap();

            if let Some(failure) = self.scripted.lock().unwrap().pop_front() {
                let keep = failure.partial.unwrap_or(0);
                docs.extend(batch.iter().take(keep).cloned());
                return Err(failure);
            }

            let mut inserted = 0;
            for post in batch {
                if docs.iter().all(|d| d.basename != post.basename) {
                    docs.push(post.clone());
                    inserted += 1;
                }
            }
            if inserted < batch.len() {
                return Err(InsertFailure {
                    partial: Some(inserted),
                    message: "E11000 duplicate key error".to_string(),
                });
            }
            Ok(inserted)
        }
    }

    fn posts(count: usize) -> Vec<BlogPost> {
        (0..count)
            .map(|i| {
                let record = json!({
                    "title": format!("Post {}", i),
                    "basename": format!("post-{}", i),
                    "category": "News",
                });
                BlogPost::from_record(&record).unwrap()
            })
            .collect()
    }

    #[tokio::test]
    async fn test_batches_are_ceil_of_count() {
        let store = FakeStore::default();
        let input = posts(250);

        let report = load_posts(&store, &input, 100).await.unwrap();

        assert_eq!(report.batches, 3);
        assert_eq!(*store.batch_sizes.lock().unwrap(), vec![100, 100, 50]);
        assert_eq!(report.inserted, 250);
        let expected: Vec<_> = input.iter().map(|p| p.basename.clone()).collect();
        assert_eq!(store.basenames(), expected);
    }

    #[tokio::test]
    async fn test_exact_multiple_of_batch_size() {
        let store = FakeStore::default();
        let report = load_posts(&store, &posts(200), 100).await.unwrap();
        assert_eq!(report.batches, 2);
    }

    #[tokio::test]
    async fn test_empty_input_clears_and_inserts_nothing() {
        let store = FakeStore::default();
        store.docs.lock().unwrap().extend(posts(3));

        let report = load_posts(&store, &[], 100).await.unwrap();

        assert_eq!(
            report,
            LoadReport {
                deleted: 3,
                batches: 0,
                inserted: 0
            }
        );
        assert!(store.basenames().is_empty());
        assert_eq!(*store.index_calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_index_failure_keeps_existing_posts() {
        let store = FakeStore {
            reject_indexes: true,
            ..FakeStore::default()
        };
        store.docs.lock().unwrap().extend(posts(3));

        let result = load_posts(&store, &posts(10), 100).await;

        assert!(result.is_err());
        assert_eq!(store.basenames().len(), 3);
        assert!(store.batch_sizes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_partial_batch_counts_reported_inserts() {
        let store = FakeStore::default();
        store.fail_next(Some(60), "E11000 duplicate key error");

        let report = load_posts(&store, &posts(150), 100).await.unwrap();

        assert_eq!(report.inserted, 60 + 50);
        assert_eq!(report.batches, 2);
    }

    #[tokio::test]
    async fn test_failed_batch_without_count_contributes_zero() {
        let store = FakeStore::default();
        store.fail_next(None, "connection reset");

        let report = load_posts(&store, &posts(120), 100).await.unwrap();

        assert_eq!(report.inserted, 20);
        assert_eq!(report.batches, 2);
    }

    #[tokio::test]
    async fn test_duplicate_basenames_are_counted_once() {
        let store = FakeStore::default();
        let mut input = posts(5);
        input.push(input[0].clone());

        let report = load_posts(&store, &input, 100).await.unwrap();

        assert_eq!(report.inserted, 5);
        assert_eq!(store.basenames().len(), 5);
    }

    #[tokio::test]
    async fn test_reload_is_idempotent() {
        let store = FakeStore::default();
        let input = posts(130);

        let first = load_posts(&store, &input, 100).await.unwrap();
        let after_first = store.docs.lock().unwrap().clone();
        let second = load_posts(&store, &input, 100).await.unwrap();
        let after_second = store.docs.lock().unwrap().clone();

        assert_eq!(after_first, after_second);
        assert_eq!(second.deleted, first.inserted as u64);
        assert_eq!(second.inserted, first.inserted);
    }

    #[tokio::test]
    async fn test_zero_batch_size_is_treated_as_one() {
        let store = FakeStore::default();
        let report = load_posts(&store, &posts(3), 0).await.unwrap();
        assert_eq!(report.batches, 3);
    }
}
