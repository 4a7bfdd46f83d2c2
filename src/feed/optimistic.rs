//! Reusable optimistic-mutation helper for toggle interactions.
//!
//! Every like/dislike/save/repost toggle in the feed goes through
//! [`optimistic_toggle`]: flip the local state first so the UI responds
//! immediately, then commit to the server, and restore the exact prior
//! state when the commit fails.

use std::future::Future;

use crate::api::client::ApiError;

/// Local state of one toggle-style interaction: whether the current
/// user has it active, and the displayed count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Toggle {
    pub active: bool,
    pub count: i64,
}

impl Toggle {
    pub fn new(active: bool, count: i64) -> Self {
        Self { active, count }
    }

    /// Flip the flag and adjust the count, clamping at zero so a
    /// server row that under-reported its count can never go negative.
    pub fn flip(&mut self) {
        self.count = if self.active {
            (self.count - 1).max(0)
        } else {
            self.count + 1
        };
        self.active = !self.active;
    }
}

/// Apply a toggle optimistically and commit it.
///
/// The pre-mutation state is snapshotted before the flip; on commit
/// failure it is restored exactly and the error is returned so the
/// caller can surface it. Two overlapping toggles on the same state are
/// not coalesced -- the last commit to resolve wins locally, which can
/// transiently disagree with the server (known race, documented in the
/// concurrency notes).
pub async fn optimistic_toggle<Fut>(toggle: &mut Toggle, commit: Fut) -> Result<(), ApiError>
where
    Fut: Future<Output = Result<(), ApiError>>,
{
    let before = *toggle;
    toggle.flip();
    match commit.await {
        Ok(()) => Ok(()),
        Err(e) => {
            *toggle = before;
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_flip_counts_up_and_down() {
        let mut toggle = Toggle::new(false, 3);
        toggle.flip();
        assert_eq!(toggle, Toggle::new(true, 4));
        toggle.flip();
        assert_eq!(toggle, Toggle::new(false, 3));
    }

    #[tokio::test]
    async fn test_flip_clamps_at_zero() {
        let mut toggle = Toggle::new(true, 0);
        toggle.flip();
        assert_eq!(toggle, Toggle::new(false, 0));
    }

    #[tokio::test]
    async fn test_successful_commit_keeps_applied_state() {
        let mut toggle = Toggle::new(false, 7);
        let result = optimistic_toggle(&mut toggle, async { Ok(()) }).await;
        assert!(result.is_ok());
        assert_eq!(toggle, Toggle::new(true, 8));
    }

    #[tokio::test]
    async fn test_failed_commit_restores_exact_prior_state() {
        let mut toggle = Toggle::new(true, 12);
        let result = optimistic_toggle(&mut toggle, async {
            Err(ApiError::Status {
                status: 500,
                message: "boom".to_string(),
            })
        })
        .await;
        assert!(result.is_err());
        assert_eq!(toggle, Toggle::new(true, 12));
    }
}
