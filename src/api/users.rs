//! User and profile operations.

use reqwest::Method;
use serde_json::Value;

use super::client::{ApiClient, ApiError};
use super::types::User;
use super::{envelope, from_value, with_query};

/// Fetch the authenticated user's profile.
pub async fn current(api: &ApiClient) -> Result<User, ApiError> {
    from_value(api.get("/users/me/").await?)
}

/// Fetch a user by id.
pub async fn get(api: &ApiClient, user_id: u64) -> Result<User, ApiError> {
    from_value(api.get(&format!("/users/{}/", user_id)).await?)
}

/// List users, optionally filtered (`limit`, `search`, ...).
pub async fn list(api: &ApiClient, params: &[(&str, String)]) -> Result<Vec<User>, ApiError> {
    let value = api.get(&with_query("/users/", params)).await?;
    Ok(envelope::parse_rows(&value))
}

/// Follow or unfollow a user (server-side toggle).
pub async fn follow_toggle(api: &ApiClient, user_id: u64) -> Result<Value, ApiError> {
    Ok(api
        .request(Method::POST, &format!("/users/follow/{}/", user_id), None)
        .await?
        .into_value())
}

/// Update the authenticated user's profile.
pub async fn update_profile(api: &ApiClient, fields: Value) -> Result<User, ApiError> {
    from_value(api.put("/users/me/", fields).await?)
}

/// Permanently delete the authenticated user's account.
pub async fn delete_account(api: &ApiClient) -> Result<(), ApiError> {
    api.delete("/users/me/").await
}
