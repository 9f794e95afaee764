use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_AUTHOR: &str = "Unknown";
pub const DEFAULT_STATUS: &str = "Publish";
pub const DEFAULT_CONVERT_BREAKS: &str = "wysiwyg";
pub const DEFAULT_ALLOW_COMMENTS: i32 = 1;
pub const DEFAULT_ALLOW_PINGS: i32 = 0;

/// Fields a record must carry (and be truthy) to be loaded.
pub const REQUIRED_FIELDS: [&str; 3] = ["title", "basename", "category"];

/// A blog post document as stored in the `blogposts` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogPost {
    pub author: String,
    pub author_email: String,
    pub title: String,
    pub status: String,
    pub allow_comments: i32,
    pub convert_breaks: String,
    pub allow_pings: i32,
    pub basename: String,
    pub category: String,
    pub unique_url: String,
    pub date: String,
    pub body: String,
    pub extended_body: String,
    pub excerpt: String,
    pub keywords: String,
    pub date_parsed: String,
}

impl BlogPost {
    /// Build a post from a raw source record, or `None` when the record is
    /// not an object or is missing one of [`REQUIRED_FIELDS`].
    pub fn from_record(record: &Value) -> Option<Self> {
        let fields = record.as_object()?;
        if !REQUIRED_FIELDS
            .iter()
            .all(|name| fields.get(*name).is_some_and(is_truthy))
        {
            return None;
        }

        let date = text_field(fields, "date", "");
        // date_parsed falls back to whatever date resolved to
        let date_parsed = text_field(fields, "date_parsed", &date);

        Some(Self {
            author: text_field(fields, "author", DEFAULT_AUTHOR),
            author_email: text_field(fields, "author_email", ""),
            title: text_field(fields, "title", ""),
            status: text_field(fields, "status", DEFAULT_STATUS),
            allow_comments: flag_field(fields, "allow_comments", DEFAULT_ALLOW_COMMENTS),
            convert_breaks: text_field(fields, "convert_breaks", DEFAULT_CONVERT_BREAKS),
            allow_pings: flag_field(fields, "allow_pings", DEFAULT_ALLOW_PINGS),
            basename: text_field(fields, "basename", ""),
            category: text_field(fields, "category", ""),
            unique_url: text_field(fields, "unique_url", ""),
            date,
            body: text_field(fields, "body", ""),
            extended_body: text_field(fields, "extended_body", ""),
            excerpt: text_field(fields, "excerpt", ""),
            keywords: text_field(fields, "keywords", ""),
            date_parsed,
        })
    }
}

/// Filter and clean raw records, keeping source order.
pub fn normalize_posts(records: &[Value]) -> Vec<BlogPost> {
    records.iter().filter_map(BlogPost::from_record).collect()
}

/// Truthiness the way the export's producer treated it: empty strings,
/// zero, `false`, `null` and empty containers don't count.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn text_field(fields: &Map<String, Value>, name: &str, default: &str) -> String {
    match fields.get(name) {
        None | Some(Value::Null) => default.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(true)) => "True".to_string(),
        Some(Value::Bool(false)) => "False".to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
    }
}

fn flag_field(fields: &Map<String, Value>, name: &str, default: i32) -> i32 {
    let parsed = match fields.get(name) {
        Some(Value::Bool(b)) => Some(i64::from(*b)),
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed
        .and_then(|n| i32::try_from(n).ok())
        .unwrap_or(default)
}
