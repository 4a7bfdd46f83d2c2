//! Local view state for the feed.
//!
//! [`FeedState`] holds the validated post list the way the UI renders
//! it: raw API rows are mapped into view rows with defaults filled in,
//! membership lists collapsed into [`Toggle`] states for the current
//! user, and every toggle mutation applied optimistically with rollback
//! on failure. Commits go through the [`FeedBackend`] trait so tests
//! can substitute a mock for the real API client.

pub mod optimistic;
#[cfg(test)]
mod tests;

pub use optimistic::{optimistic_toggle, Toggle};

use crate::api::client::{ApiClient, ApiError};
use crate::api::types::{Comment, Post, Reaction, Reply};
use crate::api::{comments, posts};

/// Errors from feed mutations.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// The target entity is not in the loaded feed.
    #[error("{kind} {id} is not in the loaded feed")]
    NotLoaded { kind: &'static str, id: u64 },

    /// The underlying API call failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Trait abstracting the server mutations the feed issues.
///
/// In production, [`ApiClient`] implements this via the domain API
/// groups. In tests, a mock implementation controls success/failure
/// behavior.
#[allow(async_fn_in_trait)]
pub trait FeedBackend {
    async fn like_toggle(&self, post_id: u64) -> Result<(), ApiError>;
    async fn save_toggle(&self, post_id: u64) -> Result<(), ApiError>;
    async fn repost_toggle(&self, post_id: u64) -> Result<(), ApiError>;
    async fn comment_like_toggle(&self, comment_id: u64) -> Result<(), ApiError>;
    async fn comment_dislike_toggle(&self, comment_id: u64) -> Result<(), ApiError>;
    async fn reply_like_toggle(&self, reply_id: u64) -> Result<(), ApiError>;
    async fn reply_dislike_toggle(&self, reply_id: u64) -> Result<(), ApiError>;
    async fn create_comment(&self, post_id: u64, text: &str) -> Result<Comment, ApiError>;
    async fn update_comment(&self, comment_id: u64, text: &str) -> Result<(), ApiError>;
    async fn delete_comment(&self, comment_id: u64) -> Result<(), ApiError>;
    async fn create_reply(
        &self,
        post_id: u64,
        comment_id: u64,
        text: &str,
    ) -> Result<Reply, ApiError>;
    async fn update_reply(&self, reply_id: u64, text: &str) -> Result<(), ApiError>;
    async fn delete_reply(&self, reply_id: u64) -> Result<(), ApiError>;
    async fn record_view(&self, post_id: u64);
}

impl FeedBackend for ApiClient {
    async fn like_toggle(&self, post_id: u64) -> Result<(), ApiError> {
        posts::like_toggle(self, post_id).await.map(|_| ())
    }

    async fn save_toggle(&self, post_id: u64) -> Result<(), ApiError> {
        posts::save_toggle(self, post_id).await.map(|_| ())
    }

    async fn repost_toggle(&self, post_id: u64) -> Result<(), ApiError> {
        posts::repost_toggle(self, post_id).await.map(|_| ())
    }

    async fn comment_like_toggle(&self, comment_id: u64) -> Result<(), ApiError> {
        comments::like_toggle(self, comment_id).await.map(|_| ())
    }

    async fn comment_dislike_toggle(&self, comment_id: u64) -> Result<(), ApiError> {
        comments::dislike_toggle(self, comment_id).await.map(|_| ())
    }

    async fn reply_like_toggle(&self, reply_id: u64) -> Result<(), ApiError> {
        comments::reply_like_toggle(self, reply_id).await.map(|_| ())
    }

    async fn reply_dislike_toggle(&self, reply_id: u64) -> Result<(), ApiError> {
        comments::reply_dislike_toggle(self, reply_id)
            .await
            .map(|_| ())
    }

    async fn create_comment(&self, post_id: u64, text: &str) -> Result<Comment, ApiError> {
        comments::create(self, post_id, text).await
    }

    async fn update_comment(&self, comment_id: u64, text: &str) -> Result<(), ApiError> {
        comments::update(self, comment_id, text).await.map(|_| ())
    }

    async fn delete_comment(&self, comment_id: u64) -> Result<(), ApiError> {
        comments::delete(self, comment_id).await
    }

    async fn create_reply(
        &self,
        post_id: u64,
        comment_id: u64,
        text: &str,
    ) -> Result<Reply, ApiError> {
        comments::reply_create(self, post_id, comment_id, text).await
    }

    async fn update_reply(&self, reply_id: u64, text: &str) -> Result<(), ApiError> {
        comments::reply_update(self, reply_id, text).await.map(|_| ())
    }

    async fn delete_reply(&self, reply_id: u64) -> Result<(), ApiError> {
        comments::reply_delete(self, reply_id).await
    }

    async fn record_view(&self, post_id: u64) {
        posts::record_view(self, post_id).await;
    }
}

/// A reply as the feed renders it.
#[derive(Debug, Clone)]
pub struct FeedReply {
    pub id: u64,
    pub text: String,
    pub author: String,
    pub likes: Toggle,
    pub dislikes: Toggle,
}

/// A comment as the feed renders it, with nested replies.
#[derive(Debug, Clone)]
pub struct FeedComment {
    pub id: u64,
    pub text: String,
    pub author: String,
    pub likes: Toggle,
    pub dislikes: Toggle,
    pub replies: Vec<FeedReply>,
    pub replies_count: i64,
}

/// A post as the feed renders it.
#[derive(Debug, Clone)]
pub struct FeedPost {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub media_url: String,
    pub media_kind: String,
    pub author: String,
    pub created_at: String,
    pub likes: Toggle,
    pub saves: Toggle,
    pub reposts: Toggle,
    pub comments: Vec<FeedComment>,
    pub comments_count: i64,
    pub hashtags: Vec<String>,
    pub music: Option<String>,
}

/// Whether the current user appears in a reaction membership list.
fn reacted(reactions: &[Reaction], current_user: Option<u64>) -> bool {
    match current_user {
        Some(me) => reactions.iter().any(|r| r.user == me),
        None => false,
    }
}

fn map_reply(reply: Reply, current_user: Option<u64>) -> FeedReply {
    FeedReply {
        id: reply.id,
        text: reply.text,
        author: reply.user.username,
        likes: Toggle::new(reacted(&reply.likes, current_user), reply.likes_count),
        dislikes: Toggle::new(reacted(&reply.dislikes, current_user), reply.dislikes_count),
    }
}

fn map_comment(comment: Comment, current_user: Option<u64>) -> FeedComment {
    FeedComment {
        id: comment.id,
        text: comment.text,
        author: comment.user.username,
        likes: Toggle::new(reacted(&comment.likes, current_user), comment.likes_count),
        dislikes: Toggle::new(
            reacted(&comment.dislikes, current_user),
            comment.dislikes_count,
        ),
        replies_count: comment.replies_count.max(comment.replies.len() as i64),
        replies: comment
            .replies
            .into_iter()
            .map(|r| map_reply(r, current_user))
            .collect(),
    }
}

fn map_post(post: Post, current_user: Option<u64>) -> FeedPost {
    let media_url = post
        .media_url()
        .unwrap_or("/default-video.mp4")
        .to_string();
    let media_kind = post.media_kind().to_string();
    FeedPost {
        id: post.id,
        title: if post.title.is_empty() {
            "No Title".to_string()
        } else {
            post.title
        },
        description: post.description,
        media_url,
        media_kind,
        author: post.user.username,
        created_at: post.created_at,
        likes: Toggle::new(
            post.liked_by_current_user,
            post.likes_count.max(post.likes.len() as i64),
        ),
        saves: Toggle::new(post.saved, post.saves_count),
        reposts: Toggle::new(post.reposted, post.reposts_count),
        comments_count: post.comments_count.max(post.comments.len() as i64),
        comments: post
            .comments
            .into_iter()
            .map(|c| map_comment(c, current_user))
            .collect(),
        hashtags: post.hashtags.into_iter().map(|h| h.name).collect(),
        music: post.music.map(|m| m.title),
    }
}

/// The loaded feed, with all view mutations defined on it. The current
/// user's id is passed in where reaction membership matters.
#[derive(Debug, Default)]
pub struct FeedState {
    posts: Vec<FeedPost>,
}

impl FeedState {
    /// Build view state from raw API rows.
    pub fn from_posts(rows: Vec<Post>, current_user: Option<u64>) -> Self {
        Self {
            posts: rows
                .into_iter()
                .map(|p| map_post(p, current_user))
                .collect(),
        }
    }

    pub fn posts(&self) -> &[FeedPost] {
        &self.posts
    }

    pub fn post(&self, post_id: u64) -> Option<&FeedPost> {
        self.posts.iter().find(|p| p.id == post_id)
    }

    fn post_mut(&mut self, post_id: u64) -> Result<&mut FeedPost, FeedError> {
        self.posts
            .iter_mut()
            .find(|p| p.id == post_id)
            .ok_or(FeedError::NotLoaded {
                kind: "post",
                id: post_id,
            })
    }

    fn comment_mut(
        &mut self,
        post_id: u64,
        comment_id: u64,
    ) -> Result<&mut FeedComment, FeedError> {
        self.post_mut(post_id)?
            .comments
            .iter_mut()
            .find(|c| c.id == comment_id)
            .ok_or(FeedError::NotLoaded {
                kind: "comment",
                id: comment_id,
            })
    }

    fn reply_mut(
        &mut self,
        post_id: u64,
        comment_id: u64,
        reply_id: u64,
    ) -> Result<&mut FeedReply, FeedError> {
        self.comment_mut(post_id, comment_id)?
            .replies
            .iter_mut()
            .find(|r| r.id == reply_id)
            .ok_or(FeedError::NotLoaded {
                kind: "reply",
                id: reply_id,
            })
    }

    // ---- toggle mutations (optimistic with rollback) ----

    pub async fn toggle_like<B: FeedBackend>(
        &mut self,
        backend: &B,
        post_id: u64,
    ) -> Result<(), FeedError> {
        let toggle = &mut self.post_mut(post_id)?.likes;
        Ok(optimistic_toggle(toggle, backend.like_toggle(post_id)).await?)
    }

    pub async fn toggle_save<B: FeedBackend>(
        &mut self,
        backend: &B,
        post_id: u64,
    ) -> Result<(), FeedError> {
        let toggle = &mut self.post_mut(post_id)?.saves;
        Ok(optimistic_toggle(toggle, backend.save_toggle(post_id)).await?)
    }

    pub async fn toggle_repost<B: FeedBackend>(
        &mut self,
        backend: &B,
        post_id: u64,
    ) -> Result<(), FeedError> {
        let toggle = &mut self.post_mut(post_id)?.reposts;
        Ok(optimistic_toggle(toggle, backend.repost_toggle(post_id)).await?)
    }

    pub async fn toggle_comment_like<B: FeedBackend>(
        &mut self,
        backend: &B,
        post_id: u64,
        comment_id: u64,
    ) -> Result<(), FeedError> {
        let toggle = &mut self.comment_mut(post_id, comment_id)?.likes;
        Ok(optimistic_toggle(toggle, backend.comment_like_toggle(comment_id)).await?)
    }

    pub async fn toggle_comment_dislike<B: FeedBackend>(
        &mut self,
        backend: &B,
        post_id: u64,
        comment_id: u64,
    ) -> Result<(), FeedError> {
        let toggle = &mut self.comment_mut(post_id, comment_id)?.dislikes;
        Ok(optimistic_toggle(toggle, backend.comment_dislike_toggle(comment_id)).await?)
    }

    pub async fn toggle_reply_like<B: FeedBackend>(
        &mut self,
        backend: &B,
        post_id: u64,
        comment_id: u64,
        reply_id: u64,
    ) -> Result<(), FeedError> {
        let toggle = &mut self.reply_mut(post_id, comment_id, reply_id)?.likes;
        Ok(optimistic_toggle(toggle, backend.reply_like_toggle(reply_id)).await?)
    }

    pub async fn toggle_reply_dislike<B: FeedBackend>(
        &mut self,
        backend: &B,
        post_id: u64,
        comment_id: u64,
        reply_id: u64,
    ) -> Result<(), FeedError> {
        let toggle = &mut self.reply_mut(post_id, comment_id, reply_id)?.dislikes;
        Ok(optimistic_toggle(toggle, backend.reply_dislike_toggle(reply_id)).await?)
    }

    // ---- comment and reply CRUD (server-first, local bookkeeping) ----

    /// Post a comment, then prepend it locally and bump the count.
    pub async fn add_comment<B: FeedBackend>(
        &mut self,
        backend: &B,
        post_id: u64,
        text: &str,
        current_user: Option<u64>,
    ) -> Result<u64, FeedError> {
        self.post_mut(post_id)?;
        let created = backend.create_comment(post_id, text).await?;
        let comment = map_comment(created, current_user);
        let id = comment.id;
        let post = self.post_mut(post_id)?;
        post.comments.insert(0, comment);
        post.comments_count += 1;
        Ok(id)
    }

    /// Edit a comment's text on the server, then locally.
    pub async fn edit_comment<B: FeedBackend>(
        &mut self,
        backend: &B,
        post_id: u64,
        comment_id: u64,
        text: &str,
    ) -> Result<(), FeedError> {
        self.comment_mut(post_id, comment_id)?;
        backend.update_comment(comment_id, text).await?;
        self.comment_mut(post_id, comment_id)?.text = text.to_string();
        Ok(())
    }

    /// Delete a comment on the server, then remove it locally.
    pub async fn delete_comment<B: FeedBackend>(
        &mut self,
        backend: &B,
        post_id: u64,
        comment_id: u64,
    ) -> Result<(), FeedError> {
        self.comment_mut(post_id, comment_id)?;
        backend.delete_comment(comment_id).await?;
        let post = self.post_mut(post_id)?;
        post.comments.retain(|c| c.id != comment_id);
        post.comments_count = (post.comments_count - 1).max(0);
        Ok(())
    }

    /// Post a reply, then prepend it under its comment.
    pub async fn add_reply<B: FeedBackend>(
        &mut self,
        backend: &B,
        post_id: u64,
        comment_id: u64,
        text: &str,
        current_user: Option<u64>,
    ) -> Result<u64, FeedError> {
        self.comment_mut(post_id, comment_id)?;
        let created = backend.create_reply(post_id, comment_id, text).await?;
        let reply = map_reply(created, current_user);
        let id = reply.id;
        let comment = self.comment_mut(post_id, comment_id)?;
        comment.replies.insert(0, reply);
        comment.replies_count += 1;
        Ok(id)
    }

    /// Edit a reply's text on the server, then locally.
    pub async fn edit_reply<B: FeedBackend>(
        &mut self,
        backend: &B,
        post_id: u64,
        comment_id: u64,
        reply_id: u64,
        text: &str,
    ) -> Result<(), FeedError> {
        self.reply_mut(post_id, comment_id, reply_id)?;
        backend.update_reply(reply_id, text).await?;
        self.reply_mut(post_id, comment_id, reply_id)?.text = text.to_string();
        Ok(())
    }

    /// Delete a reply on the server, then remove it locally.
    pub async fn delete_reply<B: FeedBackend>(
        &mut self,
        backend: &B,
        post_id: u64,
        comment_id: u64,
        reply_id: u64,
    ) -> Result<(), FeedError> {
        self.reply_mut(post_id, comment_id, reply_id)?;
        backend.delete_reply(reply_id).await?;
        let comment = self.comment_mut(post_id, comment_id)?;
        comment.replies.retain(|r| r.id != reply_id);
        comment.replies_count = (comment.replies_count - 1).max(0);
        Ok(())
    }

    /// Record a view for analytics; failures are already swallowed by
    /// the backend.
    pub async fn record_view<B: FeedBackend>(&self, backend: &B, post_id: u64) {
        backend.record_view(post_id).await;
    }
}
