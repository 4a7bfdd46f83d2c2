//! Post operations: feed listing, upload, likes, views, saves,
//! reposts.

use serde_json::{json, Value};

use super::client::{ApiClient, ApiError, FormData};
use super::types::{Post, SavedPost};
use super::{envelope, from_value, with_query};

/// A new post to upload: media file plus metadata.
#[derive(Debug, Clone)]
pub struct PostUpload {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub music_id: Option<u64>,
    pub hashtag_ids: Vec<u64>,
}

impl PostUpload {
    /// Build the multipart form the create endpoint expects. Hashtag
    /// ids are sent as repeated `hashtag_ids` fields.
    fn into_form(self) -> FormData {
        let mut form =
            FormData::new().file("post", self.file_name, &self.mime, self.bytes);
        if let Some(title) = self.title {
            form = form.text("title", title);
        }
        if let Some(description) = self.description {
            form = form.text("description", description);
        }
        if let Some(music_id) = self.music_id {
            form = form.text("music_id", music_id.to_string());
        }
        for id in self.hashtag_ids {
            form = form.text("hashtag_ids", id.to_string());
        }
        form
    }
}

/// List feed posts, optionally filtered (`user`, `limit`, ...).
pub async fn list(api: &ApiClient, params: &[(&str, String)]) -> Result<Vec<Post>, ApiError> {
    let value = api.get(&with_query("/posts/", params)).await?;
    Ok(envelope::parse_rows(&value))
}

/// Fetch one post by id.
pub async fn retrieve(api: &ApiClient, post_id: u64) -> Result<Post, ApiError> {
    from_value(api.get(&format!("/posts/{}/", post_id)).await?)
}

/// Upload a new post.
pub async fn create(api: &ApiClient, upload: PostUpload) -> Result<Value, ApiError> {
    api.post_form("/posts/", upload.into_form()).await
}

/// Partially update a post's metadata.
pub async fn update(api: &ApiClient, post_id: u64, fields: Value) -> Result<Value, ApiError> {
    api.patch(&format!("/posts/{}/", post_id), fields).await
}

/// Delete a post.
pub async fn delete(api: &ApiClient, post_id: u64) -> Result<(), ApiError> {
    api.delete(&format!("/posts/{}/", post_id)).await
}

/// Like or unlike a post (server-side toggle).
pub async fn like_toggle(api: &ApiClient, post_id: u64) -> Result<Value, ApiError> {
    api.post("/posts/likes/", json!({ "post": post_id })).await
}

/// Record that the current user viewed a post.
///
/// View recording is analytics, not state the user cares about, so any
/// failure is logged and swallowed.
pub async fn record_view(api: &ApiClient, post_id: u64) -> Option<Value> {
    match api.post("/views/", json!({ "post": post_id })).await {
        Ok(value) => Some(value),
        Err(e) => {
            log::debug!("View recording failed for post {}: {}", post_id, e);
            None
        }
    }
}

/// List who reposted a post. Failures degrade to an empty list so the
/// feed keeps rendering.
pub async fn reposts_of(api: &ApiClient, post_id: u64) -> Vec<Value> {
    match api.get(&format!("/posts/{}/reposts/", post_id)).await {
        Ok(value) => envelope::extract_rows(&value),
        Err(e) => {
            log::warn!("Repost listing failed for post {}: {}", post_id, e);
            Vec::new()
        }
    }
}

/// Repost or un-repost a post (server-side toggle).
pub async fn repost_toggle(api: &ApiClient, post_id: u64) -> Result<Value, ApiError> {
    api.post("/posts/reposts/", json!({ "post": post_id })).await
}

/// List the current user's saved posts.
pub async fn saves(api: &ApiClient, params: &[(&str, String)]) -> Result<Vec<SavedPost>, ApiError> {
    let value = api.get(&with_query("/posts/saves/", params)).await?;
    Ok(envelope::parse_rows(&value))
}

/// Save or unsave a post (server-side toggle on create).
pub async fn save_toggle(api: &ApiClient, post_id: u64) -> Result<Value, ApiError> {
    api.post("/posts/saves/", json!({ "post": post_id })).await
}

/// Remove a saved-post record by its save id.
pub async fn save_delete(api: &ApiClient, save_id: u64) -> Result<(), ApiError> {
    api.delete(&format!("/posts/saves/{}/", save_id)).await
}
