//! # Ports
//!
//! Any storage or membership backend must implement these traits to be
//! wired into the services.

use crate::errors::Result;
use crate::models::{Page, Reply, ReplyId, Thread, ThreadFilter, ThreadFlag, ThreadId, ThreadPatch, User, UserId};
use async_trait::async_trait;

/// Persistence contract for threads.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ThreadRepository: Send + Sync {
    async fn insert(&self, thread: &Thread) -> Result<()>;
    async fn find_by_id(&self, id: ThreadId) -> Result<Option<Thread>>;

    /// Sets the fields present in `patch` on a single document.
    async fn apply_patch(&self, id: ThreadId, patch: &ThreadPatch) -> Result<()>;

    async fn set_flag(&self, id: ThreadId, flag: ThreadFlag, value: bool) -> Result<()>;

    /// Adds one to `reply_nb` as a single atomic operation on the store.
    /// Implementations must not read-modify-write.
    async fn increment_reply_nb(&self, id: ThreadId) -> Result<()>;

    /// Pinned threads first, then newest first.
    async fn list(&self, filter: &ThreadFilter, page: Page) -> Result<Vec<Thread>>;
}

/// Persistence contract for replies.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ReplyRepository: Send + Sync {
    async fn insert(&self, reply: &Reply) -> Result<()>;
    async fn find_by_id(&self, id: ReplyId) -> Result<Option<Reply>>;
    async fn update_message(&self, id: ReplyId, message: &str) -> Result<()>;

    /// Deletes a reply. Only used to undo an insert whose counter bump failed.
    async fn remove(&self, id: ReplyId) -> Result<()>;

    /// Oldest first.
    async fn list_by_thread(&self, thread: ThreadId, page: Page) -> Result<Vec<Reply>>;
}

/// Read access to the host application's membership subsystem.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MemberDirectory: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn is_admin(&self, id: UserId) -> Result<bool>;
    async fn is_banned(&self, id: UserId) -> Result<bool>;
}
