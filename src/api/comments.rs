//! Comment and reply operations, including their like/dislike toggles.

use serde_json::{json, Value};

use super::client::{ApiClient, ApiError};
use super::types::{Comment, Reply};
use super::{envelope, from_value, with_query};

/// List comments, usually filtered by post (`post` param).
pub async fn list(api: &ApiClient, params: &[(&str, String)]) -> Result<Vec<Comment>, ApiError> {
    let value = api.get(&with_query("/posts/comments/", params)).await?;
    Ok(envelope::parse_rows(&value))
}

/// Create a comment on a post.
pub async fn create(api: &ApiClient, post_id: u64, text: &str) -> Result<Comment, ApiError> {
    from_value(
        api.post("/posts/comments/", json!({ "post": post_id, "text": text }))
            .await?,
    )
}

/// Edit a comment's text.
pub async fn update(api: &ApiClient, comment_id: u64, text: &str) -> Result<Value, ApiError> {
    api.patch(
        &format!("/posts/comments/{}/", comment_id),
        json!({ "text": text }),
    )
    .await
}

/// Delete a comment.
pub async fn delete(api: &ApiClient, comment_id: u64) -> Result<(), ApiError> {
    api.delete(&format!("/posts/comments/{}/", comment_id)).await
}

/// Like or unlike a comment (server-side toggle).
pub async fn like_toggle(api: &ApiClient, comment_id: u64) -> Result<Value, ApiError> {
    api.post("/posts/comment_likes/", json!({ "comment": comment_id }))
        .await
}

/// Dislike or un-dislike a comment (server-side toggle).
pub async fn dislike_toggle(api: &ApiClient, comment_id: u64) -> Result<Value, ApiError> {
    api.post("/posts/comment_dislikes/", json!({ "comment": comment_id }))
        .await
}

/// List replies, usually filtered by comment (`comment` param).
pub async fn reply_list(
    api: &ApiClient,
    params: &[(&str, String)],
) -> Result<Vec<Reply>, ApiError> {
    let value = api
        .get(&with_query("/posts/reply_comments/", params))
        .await?;
    Ok(envelope::parse_rows(&value))
}

/// Create a reply under a comment.
pub async fn reply_create(
    api: &ApiClient,
    post_id: u64,
    comment_id: u64,
    text: &str,
) -> Result<Reply, ApiError> {
    from_value(
        api.post(
            "/posts/reply_comments/",
            json!({ "post": post_id, "comment": comment_id, "text": text }),
        )
        .await?,
    )
}

/// Edit a reply's text.
pub async fn reply_update(api: &ApiClient, reply_id: u64, text: &str) -> Result<Value, ApiError> {
    api.patch(
        &format!("/posts/reply_comments/{}/", reply_id),
        json!({ "text": text }),
    )
    .await
}

/// Delete a reply.
pub async fn reply_delete(api: &ApiClient, reply_id: u64) -> Result<(), ApiError> {
    api.delete(&format!("/posts/reply_comments/{}/", reply_id))
        .await
}

/// Like or unlike a reply (server-side toggle).
pub async fn reply_like_toggle(api: &ApiClient, reply_id: u64) -> Result<Value, ApiError> {
    api.post(
        "/posts/reply_comment_likes/",
        json!({ "reply_comment": reply_id }),
    )
    .await
}

/// Dislike or un-dislike a reply (server-side toggle).
pub async fn reply_dislike_toggle(api: &ApiClient, reply_id: u64) -> Result<Value, ApiError> {
    api.post(
        "/posts/reply_comment_dislikes/",
        json!({ "reply_comment": reply_id }),
    )
    .await
}
