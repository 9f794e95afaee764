pub const DEFAULT_MONGODB_URI: &str = "mongodb://localhost:27017/";
pub const DEFAULT_DATABASE: &str = "news-portal";
pub const COLLECTION_NAME: &str = "blogposts";
pub const BATCH_SIZE: usize = 100;

#[derive(Debug, Clone)]
pub struct Config {
    pub mongodb_uri: String,
    pub database: String,
    pub collection: String,
    pub batch_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mongodb_uri: DEFAULT_MONGODB_URI.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            collection: COLLECTION_NAME.to_string(),
            batch_size: BATCH_SIZE,
        }
    }
}

impl Config {
    /// Build the configuration once at startup. Only the connection string is
    /// taken from the environment (`MONGODB_URI`).
    pub fn from_env() -> Self {
        let mut config = Config::default();
        if let Ok(uri) = std::env::var("MONGODB_URI") {
            config.mongodb_uri = uri;
        }
        config
    }

    /// Connection string with the default database appended when the
    /// configured URI doesn't already name one.
    pub fn resolved_uri(&self) -> String {
        resolve_uri(&self.mongodb_uri, &self.database)
    }
}

/// Whether a MongoDB connection string already carries a database name.
///
/// Looks at the part after the scheme and any credentials, up to the query
/// string, and checks for a non-empty path after the host list.
pub fn uri_names_database(uri: &str) -> bool {
    if uri.contains(&format!("/{}", DEFAULT_DATABASE)) {
        return true;
    }
    let without_query = uri.split('?').next().unwrap_or(uri);
    let without_scheme = without_query
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(without_query);
    let hosts_and_path = without_scheme.rsplit('@').next().unwrap_or(without_scheme);
    match hosts_and_path.split_once('/') {
        Some((_, path)) => !path.is_empty(),
        None => false,
    }
}

pub fn resolve_uri(uri: &str, database: &str) -> String {
    if uri_names_database(uri) {
        return uri.to_string();
    }
    let (base, query) = match uri.split_once('?') {
        Some((base, query)) => (base, Some(query)),
        None => (uri, None),
    };
    let base = base.trim_end_matches('/');
    match query {
        Some(query) => format!("{}/{}?{}", base, database, query),
        None => format!("{}/{}", base, database),
    }
}
