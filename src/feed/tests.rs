//! Unit tests for the feed view state.
//!
//! Uses a mock FeedBackend that can be configured to succeed or fail,
//! so optimistic apply/rollback behavior is verified without a server.

#[cfg(test)]
mod feed_state_tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use serde_json::json;

    use crate::api::client::ApiError;
    use crate::api::types::{Comment, Post, Reply};
    use crate::feed::{FeedBackend, FeedError, FeedState, Toggle};

    // ── Mock backend ─────────────────────────────────────────────────────

    /// Mock backend that succeeds or fails every call, counting them.
    struct MockBackend {
        fail: bool,
        calls: AtomicU32,
    }

    impl MockBackend {
        fn ok() -> Self {
            Self {
                fail: false,
                calls: AtomicU32::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }

        fn outcome(&self) -> Result<(), ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(ApiError::Status {
                    status: 500,
                    message: "server unavailable".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    impl FeedBackend for MockBackend {
        async fn like_toggle(&self, _post_id: u64) -> Result<(), ApiError> {
            self.outcome()
        }
        async fn save_toggle(&self, _post_id: u64) -> Result<(), ApiError> {
            self.outcome()
        }
        async fn repost_toggle(&self, _post_id: u64) -> Result<(), ApiError> {
            self.outcome()
        }
        async fn comment_like_toggle(&self, _comment_id: u64) -> Result<(), ApiError> {
            self.outcome()
        }
        async fn comment_dislike_toggle(&self, _comment_id: u64) -> Result<(), ApiError> {
            self.outcome()
        }
        async fn reply_like_toggle(&self, _reply_id: u64) -> Result<(), ApiError> {
            self.outcome()
        }
        async fn reply_dislike_toggle(&self, _reply_id: u64) -> Result<(), ApiError> {
            self.outcome()
        }
        async fn create_comment(&self, post_id: u64, text: &str) -> Result<Comment, ApiError> {
            self.outcome()?;
            Ok(serde_json::from_value(json!({
                "id": 900, "post": post_id, "text": text,
            }))
            .unwrap())
        }
        async fn update_comment(&self, _comment_id: u64, _text: &str) -> Result<(), ApiError> {
            self.outcome()
        }
        async fn delete_comment(&self, _comment_id: u64) -> Result<(), ApiError> {
            self.outcome()
        }
        async fn create_reply(
            &self,
            _post_id: u64,
            _comment_id: u64,
            text: &str,
        ) -> Result<Reply, ApiError> {
            self.outcome()?;
            Ok(serde_json::from_value(json!({ "id": 901, "text": text })).unwrap())
        }
        async fn update_reply(&self, _reply_id: u64, _text: &str) -> Result<(), ApiError> {
            self.outcome()
        }
        async fn delete_reply(&self, _reply_id: u64) -> Result<(), ApiError> {
            self.outcome()
        }
        async fn record_view(&self, _post_id: u64) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    // ── Helpers ──────────────────────────────────────────────────────────

    /// One post (id 1) liked by nobody, with one comment (id 10) the
    /// current user (id 7) already liked, holding one reply (id 20).
    fn sample_feed() -> FeedState {
        let rows: Vec<Post> = serde_json::from_value(json!([{
            "id": 1,
            "title": "first clip",
            "post": "/clips/1.mp4",
            "user": { "id": 2, "username": "ava" },
            "likes_count": 3,
            "liked_by_current_user": false,
            "saves_count": 1,
            "saved": true,
            "reposts_count": 0,
            "reposted": false,
            "comments_count": 1,
            "comments": [{
                "id": 10,
                "text": "nice",
                "user": { "id": 3, "username": "ben" },
                "likes": [{ "user": 7 }],
                "likes_count": 4,
                "replies": [{ "id": 20, "text": "agreed" }],
                "replies_count": 1,
            }],
        }]))
        .unwrap();
        FeedState::from_posts(rows, Some(7))
    }

    // ── Mapping ──────────────────────────────────────────────────────────

    #[test]
    fn test_mapping_collapses_membership_into_toggles() {
        let feed = sample_feed();
        let post = feed.post(1).unwrap();

        assert_eq!(post.likes, Toggle::new(false, 3));
        assert_eq!(post.saves, Toggle::new(true, 1));
        // Comment 10 carries a like from user 7, the current user.
        assert_eq!(post.comments[0].likes, Toggle::new(true, 4));
        assert_eq!(post.comments[0].replies.len(), 1);
    }

    #[test]
    fn test_mapping_fills_defaults() {
        let rows: Vec<Post> = serde_json::from_value(json!([{ "id": 5 }])).unwrap();
        let feed = FeedState::from_posts(rows, None);
        let post = feed.post(5).unwrap();
        assert_eq!(post.title, "No Title");
        assert_eq!(post.media_url, "/default-video.mp4");
        assert_eq!(post.media_kind, "video");
        assert_eq!(post.likes, Toggle::new(false, 0));
    }

    // ── Toggles ──────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_like_toggle_applies_on_success() {
        let mut feed = sample_feed();
        let backend = MockBackend::ok();

        feed.toggle_like(&backend, 1).await.unwrap();
        assert_eq!(feed.post(1).unwrap().likes, Toggle::new(true, 4));
        assert_eq!(backend.calls(), 1);

        // Toggling back down.
        feed.toggle_like(&backend, 1).await.unwrap();
        assert_eq!(feed.post(1).unwrap().likes, Toggle::new(false, 3));
    }

    #[tokio::test]
    async fn test_like_toggle_rolls_back_on_failure() {
        let mut feed = sample_feed();
        let backend = MockBackend::failing();

        let before = feed.post(1).unwrap().likes;
        let err = feed.toggle_like(&backend, 1).await.unwrap_err();
        assert!(matches!(err, FeedError::Api(ApiError::Status { status: 500, .. })));

        // Round-trip: apply then rollback yields the original state.
        assert_eq!(feed.post(1).unwrap().likes, before);
    }

    #[tokio::test]
    async fn test_save_and_repost_rollback() {
        let mut feed = sample_feed();
        let backend = MockBackend::failing();

        assert!(feed.toggle_save(&backend, 1).await.is_err());
        assert_eq!(feed.post(1).unwrap().saves, Toggle::new(true, 1));

        assert!(feed.toggle_repost(&backend, 1).await.is_err());
        assert_eq!(feed.post(1).unwrap().reposts, Toggle::new(false, 0));
    }

    #[tokio::test]
    async fn test_comment_like_toggle_counts_down_for_existing_like() {
        let mut feed = sample_feed();
        let backend = MockBackend::ok();

        // Current user already liked comment 10; toggling removes it.
        feed.toggle_comment_like(&backend, 1, 10).await.unwrap();
        assert_eq!(
            feed.post(1).unwrap().comments[0].likes,
            Toggle::new(false, 3)
        );
    }

    #[tokio::test]
    async fn test_reply_dislike_rollback() {
        let mut feed = sample_feed();
        let backend = MockBackend::failing();

        assert!(feed
            .toggle_reply_dislike(&backend, 1, 10, 20)
            .await
            .is_err());
        let reply = &feed.post(1).unwrap().comments[0].replies[0];
        assert_eq!(reply.dislikes, Toggle::new(false, 0));
    }

    #[tokio::test]
    async fn test_toggle_unknown_post_fails_without_backend_call() {
        let mut feed = sample_feed();
        let backend = MockBackend::ok();

        let err = feed.toggle_like(&backend, 999).await.unwrap_err();
        assert!(matches!(err, FeedError::NotLoaded { kind: "post", id: 999 }));
        assert_eq!(backend.calls(), 0);
    }

    // ── Comment / reply CRUD ─────────────────────────────────────────────

    #[tokio::test]
    async fn test_add_comment_prepends_and_bumps_count() {
        let mut feed = sample_feed();
        let backend = MockBackend::ok();

        let id = feed
            .add_comment(&backend, 1, "fresh take", Some(7))
            .await
            .unwrap();
        assert_eq!(id, 900);

        let post = feed.post(1).unwrap();
        assert_eq!(post.comments_count, 2);
        assert_eq!(post.comments[0].text, "fresh take");
        // Existing comment shifted down, untouched.
        assert_eq!(post.comments[1].id, 10);
    }

    #[tokio::test]
    async fn test_add_comment_failure_leaves_state_untouched() {
        let mut feed = sample_feed();
        let backend = MockBackend::failing();

        assert!(feed.add_comment(&backend, 1, "nope", Some(7)).await.is_err());
        let post = feed.post(1).unwrap();
        assert_eq!(post.comments_count, 1);
        assert_eq!(post.comments.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_comment_removes_and_clamps_count() {
        let mut feed = sample_feed();
        let backend = MockBackend::ok();

        feed.delete_comment(&backend, 1, 10).await.unwrap();
        let post = feed.post(1).unwrap();
        assert!(post.comments.is_empty());
        assert_eq!(post.comments_count, 0);
    }

    #[tokio::test]
    async fn test_edit_comment_rewrites_text() {
        let mut feed = sample_feed();
        let backend = MockBackend::ok();

        feed.edit_comment(&backend, 1, 10, "edited").await.unwrap();
        assert_eq!(feed.post(1).unwrap().comments[0].text, "edited");
    }

    #[tokio::test]
    async fn test_reply_lifecycle() {
        let mut feed = sample_feed();
        let backend = MockBackend::ok();

        let id = feed
            .add_reply(&backend, 1, 10, "me too", Some(7))
            .await
            .unwrap();
        assert_eq!(id, 901);
        {
            let comment = &feed.post(1).unwrap().comments[0];
            assert_eq!(comment.replies_count, 2);
            assert_eq!(comment.replies[0].text, "me too");
        }

        feed.edit_reply(&backend, 1, 10, 901, "me three").await.unwrap();
        assert_eq!(
            feed.post(1).unwrap().comments[0].replies[0].text,
            "me three"
        );

        feed.delete_reply(&backend, 1, 10, 901).await.unwrap();
        let comment = &feed.post(1).unwrap().comments[0];
        assert_eq!(comment.replies_count, 1);
        assert_eq!(comment.replies.len(), 1);
        assert_eq!(comment.replies[0].id, 20);
    }
}
