//! Login, registration, logout, and token refresh flows.
//!
//! Auth responses from the platform have drifted over time and name the
//! token fields inconsistently; [`normalize_token_fields`] is the single
//! place that maps every accepted shape to a [`TokenPair`] before
//! anything is persisted.

use serde_json::{json, Value};

use super::client::{ApiClient, ApiError, FormData};
use super::tokens::TokenPair;

/// Registration payload. When `avatar` is present the request is sent
/// as a multipart form, otherwise as plain JSON.
#[derive(Debug, Clone, Default)]
pub struct RegisterProfile {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Avatar image as (file name, bytes).
    pub avatar: Option<(String, Vec<u8>)>,
}

/// Map an auth response to a credential pair.
///
/// Accepted access field names, first match wins:
/// `access`, `access_token`, `token`, `key`.
/// Accepted refresh field names: `refresh`, `refresh_token`.
pub fn normalize_token_fields(response: &Value) -> TokenPair {
    let field = |names: &[&str]| {
        names
            .iter()
            .find_map(|name| response.get(*name).and_then(Value::as_str))
            .map(str::to_string)
    };
    TokenPair::new(
        field(&["access", "access_token", "token", "key"]),
        field(&["refresh", "refresh_token"]),
    )
}

/// Log in with username and password.
///
/// On success the normalized tokens are persisted (if an access token
/// was found) and the raw response is returned either way, so callers
/// can surface server-provided detail.
pub async fn login(api: &ApiClient, username: &str, password: &str) -> Result<Value, ApiError> {
    let response = api
        .post(
            "/users/login/",
            json!({ "username": username, "password": password }),
        )
        .await?;

    let pair = normalize_token_fields(&response);
    if pair.access.is_some() {
        api.tokens().save(&pair);
        log::info!("Logged in as {}", username);
    } else {
        log::warn!("Login response carried no access token");
    }
    Ok(response)
}

/// Register a new account. Does not log the user in -- callers that
/// want an authenticated session must call [`login`] afterward.
pub async fn register(api: &ApiClient, profile: &RegisterProfile) -> Result<Value, ApiError> {
    match profile.avatar {
        Some((ref file_name, ref bytes)) => {
            let mut form = FormData::new()
                .text("username", profile.username.clone())
                .text("password", profile.password.clone());
            if let Some(ref email) = profile.email {
                form = form.text("email", email.clone());
            }
            if let Some(ref first_name) = profile.first_name {
                form = form.text("first_name", first_name.clone());
            }
            if let Some(ref last_name) = profile.last_name {
                form = form.text("last_name", last_name.clone());
            }
            form = form.file("avatar", file_name.clone(), "application/octet-stream", bytes.clone());
            api.post_form("/users/", form).await
        }
        None => {
            let mut body = json!({
                "username": profile.username,
                "password": profile.password,
            });
            if let Some(ref email) = profile.email {
                body["email"] = json!(email);
            }
            if let Some(ref first_name) = profile.first_name {
                body["first_name"] = json!(first_name);
            }
            if let Some(ref last_name) = profile.last_name {
                body["last_name"] = json!(last_name);
            }
            api.post("/users/", body).await
        }
    }
}

/// Log out: notify the server (best-effort), then clear stored tokens.
///
/// The store is always cleared, even when the logout call fails or the
/// session is only partially present.
pub async fn logout(api: &ApiClient) {
    let access = api.tokens().access();
    let refresh = api.tokens().refresh();

    if let (Some(_), Some(refresh)) = (access, refresh) {
        let result = api
            .post("/users/logout/", json!({ "refresh_token": refresh }))
            .await;
        if let Err(e) = result {
            log::warn!("Logout request failed (continuing local cleanup): {}", e);
        }
    }

    api.tokens().clear();
    log::info!("Logged out");
}

/// Exchange the stored refresh token for a new access token.
///
/// Talks to the refresh endpoint directly (not through the request
/// wrapper) so a 401 here can never recurse into another refresh.
/// On success the new access token is persisted along with the rotated
/// refresh token, or the old refresh token is retained when the server
/// omits one. Never clears the store; the caller decides that.
pub(crate) async fn try_refresh(api: &ApiClient) -> bool {
    let refresh = match api.tokens().refresh() {
        Some(r) => r,
        None => return false,
    };

    let url = format!("{}/users/token/refresh/", api.base_url());
    let response = match api
        .http()
        .post(&url)
        .json(&json!({ "refresh": refresh }))
        .send()
        .await
    {
        Ok(r) => r,
        Err(e) => {
            log::warn!("Token refresh request failed: {}", e);
            return false;
        }
    };

    if !response.status().is_success() {
        log::warn!("Token refresh rejected with status {}", response.status());
        return false;
    }

    let body: Value = match response.json().await {
        Ok(b) => b,
        Err(e) => {
            log::warn!("Token refresh response unreadable: {}", e);
            return false;
        }
    };

    match body.get("access").and_then(Value::as_str) {
        Some(access) => {
            let rotated = body
                .get("refresh")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or(refresh);
            api.tokens().save(&TokenPair::new(
                Some(access.to_string()),
                Some(rotated),
            ));
            log::debug!("Session tokens refreshed");
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_canonical_fields() {
        let pair = normalize_token_fields(&json!({ "access": "A", "refresh": "R" }));
        assert_eq!(pair.access.as_deref(), Some("A"));
        assert_eq!(pair.refresh.as_deref(), Some("R"));
    }

    #[test]
    fn test_normalize_access_token_fallback() {
        let pair = normalize_token_fields(&json!({ "access_token": "A" }));
        assert_eq!(pair.access.as_deref(), Some("A"));
        assert_eq!(pair.refresh, None);
    }

    #[test]
    fn test_normalize_token_and_key_fallbacks() {
        let pair = normalize_token_fields(&json!({ "token": "X" }));
        assert_eq!(pair.access.as_deref(), Some("X"));

        let pair = normalize_token_fields(&json!({ "key": "K" }));
        assert_eq!(pair.access.as_deref(), Some("K"));
    }

    #[test]
    fn test_normalize_priority_order() {
        // `access` beats every legacy name.
        let pair = normalize_token_fields(&json!({
            "key": "4", "token": "3", "access_token": "2", "access": "1",
        }));
        assert_eq!(pair.access.as_deref(), Some("1"));

        let pair = normalize_token_fields(&json!({
            "refresh_token": "2", "refresh": "1",
        }));
        assert_eq!(pair.refresh.as_deref(), Some("1"));
    }

    #[test]
    fn test_normalize_refresh_token_fallback() {
        let pair = normalize_token_fields(&json!({ "access": "A", "refresh_token": "R" }));
        assert_eq!(pair.refresh.as_deref(), Some("R"));
    }

    #[test]
    fn test_normalize_empty_response() {
        let pair = normalize_token_fields(&json!({ "user": { "id": 1 } }));
        assert_eq!(pair.access, None);
        assert_eq!(pair.refresh, None);
    }

    #[test]
    fn test_normalize_ignores_non_string_values() {
        let pair = normalize_token_fields(&json!({ "access": 42, "token": "X" }));
        assert_eq!(pair.access.as_deref(), Some("X"));
    }
}
