use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::IndexModel;

/// Indexes the news portal expects on the `blogposts` collection.
///
/// `basename` is unique, so re-imported duplicates surface as per-document
/// write errors during the batch insert.
pub fn blog_post_indexes() -> Vec<IndexModel> {
    vec![
        IndexModel::builder()
            .keys(doc! { "basename": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build(),
        IndexModel::builder().keys(doc! { "category": 1 }).build(),
        IndexModel::builder().keys(doc! { "date_parsed": 1 }).build(),
        IndexModel::builder()
            .keys(doc! { "title": "text", "body": "text", "excerpt": "text" })
            .build(),
        IndexModel::builder()
            .keys(doc! { "category": 1, "date_parsed": -1 })
            .build(),
    ]
}
