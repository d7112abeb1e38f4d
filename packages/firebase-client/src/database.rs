//! Realtime Database REST access (`<database>/<path>.json`).

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{FirebaseError, Result};
use crate::types::DatabaseErrorBody;

/// Client for one Realtime Database instance.
#[derive(Clone)]
pub struct FirebaseDatabase {
    http_client: Client,
    base_url: String,
}

impl FirebaseDatabase {
    /// Create a client for `base_url`, e.g. `https://my-project.firebaseio.com`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// REST URL of a database path.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}.json",
            self.base_url.trim_end_matches('/'),
            path.trim_matches('/')
        )
    }

    /// Read the value at `path`.
    ///
    /// An empty path reads as JSON `null`, which is returned as `None`.
    pub async fn get<T: DeserializeOwned>(&self, path: &str, auth: Option<&str>) -> Result<Option<T>> {
        let mut request = self.http_client.get(self.url(path));
        if let Some(token) = auth {
            request = request.query(&[("auth", token)]);
        }

        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(path, status = %status, "Firebase database read failed");
            return Err(parse_database_error(status.as_u16(), &text));
        }

        let text = resp.text().await?;
        let value: Option<T> = serde_json::from_str(&text)
            .map_err(|e| FirebaseError::Parse(format!("Failed to parse {}: {}", path, e)))?;
        debug!(path, found = value.is_some(), "Firebase database read");
        Ok(value)
    }

    /// Replace the value at `path`.
    ///
    /// The response body (an echo of the written value) is not consumed.
    pub async fn put<T: Serialize + ?Sized>(&self, path: &str, value: &T, auth: Option<&str>) -> Result<()> {
        let body = serde_json::to_vec(value)
            .map_err(|e| FirebaseError::Parse(format!("Failed to serialize {}: {}", path, e)))?;
        debug!(path, bytes = body.len(), "uploading to Firebase database");

        let mut request = self
            .http_client
            .put(self.url(path))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body);
        if let Some(token) = auth {
            request = request.query(&[("auth", token)]);
        }

        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(path, status = %status, "Firebase database write failed");
            return Err(parse_database_error(status.as_u16(), &text));
        }

        Ok(())
    }
}

impl std::fmt::Debug for FirebaseDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseDatabase")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

pub(crate) fn parse_database_error(status: u16, body: &str) -> FirebaseError {
    let message = serde_json::from_str::<DatabaseErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| body.to_string());
    FirebaseError::Api { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_building() {
        let db = FirebaseDatabase::new("https://sandbox.firebaseio.com/");
        assert_eq!(db.url("recipes"), "https://sandbox.firebaseio.com/recipes.json");
        assert_eq!(db.url("/users/u1/"), "https://sandbox.firebaseio.com/users/u1.json");
    }

    #[test]
    fn test_null_body_reads_as_none() {
        let value: Option<Vec<serde_json::Value>> = serde_json::from_str("null").unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn test_parse_database_error() {
        let err = parse_database_error(401, r#"{"error":"Permission denied"}"#);
        assert!(matches!(
            err,
            FirebaseError::Api { status: 401, ref message } if message == "Permission denied"
        ));

        let err = parse_database_error(500, "oops");
        assert_eq!(err.to_string(), "API error (500): oops");
    }
}
