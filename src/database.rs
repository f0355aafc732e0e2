use mongodb::{Client, Database};

use crate::config::Settings;

/// Connect to the configured document database.
///
/// Returns `None` when `DATABASE_URL` or `DATABASE_NAME` is unset, or when the
/// client cannot be constructed. The server still starts in that case and the
/// store reports itself as unavailable.
pub async fn connect(settings: &Settings) -> Option<Database> {
    let (url, name) = match (&settings.database_url, &settings.database_name) {
        (Some(url), Some(name)) => (url, name),
        _ => {
            tracing::warn!("DATABASE_URL or DATABASE_NAME not set, document store disabled");
            return None;
        }
    };

    match Client::with_uri_str(url).await {
        Ok(client) => {
            tracing::info!(database = %name, "document store client created");
            Some(client.database(name))
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to create document store client");
            None
        }
    }
}
