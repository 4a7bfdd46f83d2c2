//! Response types for the Riffle backend API.
//!
//! The backend is lax about optional fields, so every struct derives
//! `Default` and fills missing fields instead of failing the row.

use serde::Deserialize;
use serde_json::Value;

/// Post author / account profile.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub followers_count: i64,
    pub following_count: i64,
    pub is_following: bool,
}

/// One like/dislike record: which user reacted.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Reaction {
    pub user: u64,
}

/// A reply nested under a comment.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Reply {
    pub id: u64,
    pub text: String,
    pub user: User,
    pub created_at: String,
    pub likes: Vec<Reaction>,
    pub likes_count: i64,
    pub dislikes: Vec<Reaction>,
    pub dislikes_count: i64,
}

/// A comment on a post, with its nested replies.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Comment {
    pub id: u64,
    pub text: String,
    pub user: User,
    pub created_at: String,
    pub likes: Vec<Reaction>,
    pub likes_count: i64,
    pub dislikes: Vec<Reaction>,
    pub dislikes_count: i64,
    pub replies: Vec<Reply>,
    pub replies_count: i64,
}

/// A music track attachable to posts.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Track {
    pub id: u64,
    pub title: String,
    pub artist: Option<String>,
    pub audio: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Hashtag {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Genre {
    pub id: u64,
    pub name: String,
}

/// A saved-post record (save id, not post id, is what DELETE takes).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SavedPost {
    pub id: u64,
    pub post: Value,
    pub created_at: String,
}

/// A feed post. Media lives in `post` on current deployments, with
/// `video`/`image` as legacy field names.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Post {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub post: Option<String>,
    pub video: Option<String>,
    pub image: Option<String>,
    pub post_type: Option<String>,
    pub user: User,
    pub created_at: String,
    pub likes: Vec<Reaction>,
    pub likes_count: i64,
    pub liked_by_current_user: bool,
    pub comments: Vec<Comment>,
    pub comments_count: i64,
    pub reposts_count: i64,
    pub reposted: bool,
    pub reposted_by: Option<Value>,
    pub saves_count: i64,
    pub saved: bool,
    pub hashtags: Vec<Hashtag>,
    pub music: Option<Track>,
}

impl Post {
    /// Media URL, resolving the legacy field names.
    pub fn media_url(&self) -> Option<&str> {
        self.post
            .as_deref()
            .or(self.video.as_deref())
            .or(self.image.as_deref())
    }

    /// Media kind: the explicit `post_type` when present, otherwise
    /// guessed from the file extension, defaulting to video.
    pub fn media_kind(&self) -> &str {
        if let Some(ref kind) = self.post_type {
            return kind;
        }
        match self.media_url() {
            Some(url) if url.ends_with(".jpg") || url.ends_with(".png") || url.ends_with(".webp") => {
                "image"
            }
            _ => "video",
        }
    }
}
