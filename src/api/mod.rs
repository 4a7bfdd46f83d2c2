//! API client module for the Riffle terminal client.
//!
//! Provides the HTTP request wrapper with auth header injection and
//! refresh-on-401, keychain token storage, the list-envelope adapter,
//! and one module per domain group of the backend API.

pub mod auth;
pub mod catalog;
pub mod client;
pub mod comments;
pub mod envelope;
pub mod posts;
pub mod tokens;
pub mod types;
pub mod users;

use serde::de::DeserializeOwned;
use serde_json::Value;

use client::ApiError;

/// Append URL-encoded query parameters to a path.
pub(crate) fn with_query(path: &str, params: &[(&str, String)]) -> String {
    if params.is_empty() {
        return path.to_string();
    }
    let query = params
        .iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&");
    format!("{}?{}", path, query)
}

/// Deserialize a response value, mapping shape mismatches to
/// [`ApiError::Decode`].
pub(crate) fn from_value<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::with_query;

    #[test]
    fn test_with_query_empty_params() {
        assert_eq!(with_query("/posts/", &[]), "/posts/");
    }

    #[test]
    fn test_with_query_encodes_values() {
        let path = with_query(
            "/users/",
            &[("limit", "50".to_string()), ("search", "a b".to_string())],
        );
        assert_eq!(path, "/users/?limit=50&search=a%20b");
    }
}
