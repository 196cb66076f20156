//! # In-memory adapters
//!
//! `dashmap`-backed implementations of every port. Used by the test suites
//! and by single-node deployments that do not need durability.
//!
//! Each mutation runs under the owning shard's write lock, so
//! `increment_reply_nb` is atomic with respect to concurrent callers.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use domains::{
    DomainError, MemberDirectory, Page, Reply, ReplyId, ReplyRepository, Result, Thread, ThreadFilter,
    ThreadFlag, ThreadId, ThreadPatch, ThreadRepository, User, UserId,
};
use std::cmp::Reverse;

fn paginate<T>(items: Vec<T>, page: Page) -> Vec<T> {
    items
        .into_iter()
        .skip(page.offset as usize)
        .take(page.limit as usize)
        .collect()
}

#[derive(Default)]
pub struct InMemoryThreadRepository {
    threads: DashMap<ThreadId, Thread>,
}

impl InMemoryThreadRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ThreadRepository for InMemoryThreadRepository {
    async fn insert(&self, thread: &Thread) -> Result<()> {
        match self.threads.entry(thread.id) {
            Entry::Occupied(_) => Err(DomainError::Storage(format!("duplicate thread id {}", thread.id))),
            Entry::Vacant(slot) => {
                slot.insert(thread.clone());
                Ok(())
            }
        }
    }

    async fn find_by_id(&self, id: ThreadId) -> Result<Option<Thread>> {
        Ok(self.threads.get(&id).map(|t| t.value().clone()))
    }

    async fn apply_patch(&self, id: ThreadId, patch: &ThreadPatch) -> Result<()> {
        let mut thread = self
            .threads
            .get_mut(&id)
            .ok_or_else(|| DomainError::thread_not_found(id))?;
        patch.apply_to(thread.value_mut());
        Ok(())
    }

    async fn set_flag(&self, id: ThreadId, flag: ThreadFlag, value: bool) -> Result<()> {
        let mut thread = self
            .threads
            .get_mut(&id)
            .ok_or_else(|| DomainError::thread_not_found(id))?;
        match flag {
            ThreadFlag::Pinned => thread.pinned = value,
            ThreadFlag::Locked => thread.locked = value,
            ThreadFlag::Featured => thread.featured = value,
        }
        Ok(())
    }

    async fn increment_reply_nb(&self, id: ThreadId) -> Result<()> {
        let mut thread = self
            .threads
            .get_mut(&id)
            .ok_or_else(|| DomainError::thread_not_found(id))?;
        thread.reply_nb += 1;
        Ok(())
    }

    async fn list(&self, filter: &ThreadFilter, page: Page) -> Result<Vec<Thread>> {
        let mut threads: Vec<Thread> = self
            .threads
            .iter()
            .filter(|t| filter.community.as_deref().map_or(true, |c| t.community == c))
            .map(|t| t.value().clone())
            .collect();
        threads.sort_by_key(|t| (!t.pinned, Reverse(t.created_at), Reverse(t.id)));
        Ok(paginate(threads, page))
    }
}

#[derive(Default)]
pub struct InMemoryReplyRepository {
    replies: DashMap<ReplyId, Reply>,
}

impl InMemoryReplyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored replies pointing at `thread`. Recomputed, for checks only.
    pub fn count_for(&self, thread: ThreadId) -> usize {
        self.replies.iter().filter(|r| r.thread == thread).count()
    }
}

#[async_trait]
impl ReplyRepository for InMemoryReplyRepository {
    async fn insert(&self, reply: &Reply) -> Result<()> {
        match self.replies.entry(reply.id) {
            Entry::Occupied(_) => Err(DomainError::Storage(format!("duplicate reply id {}", reply.id))),
            Entry::Vacant(slot) => {
                slot.insert(reply.clone());
                Ok(())
            }
        }
    }

    async fn find_by_id(&self, id: ReplyId) -> Result<Option<Reply>> {
        Ok(self.replies.get(&id).map(|r| r.value().clone()))
    }

    async fn update_message(&self, id: ReplyId, message: &str) -> Result<()> {
        let mut reply = self
            .replies
            .get_mut(&id)
            .ok_or_else(|| DomainError::reply_not_found(id))?;
        reply.message = message.to_string();
        Ok(())
    }

    async fn remove(&self, id: ReplyId) -> Result<()> {
        self.replies
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| DomainError::reply_not_found(id))
    }

    async fn list_by_thread(&self, thread: ThreadId, page: Page) -> Result<Vec<Reply>> {
        let mut replies: Vec<Reply> = self
            .replies
            .iter()
            .filter(|r| r.thread == thread)
            .map(|r| r.value().clone())
            .collect();
        replies.sort_by_key(|r| (r.created_at, r.id));
        Ok(paginate(replies, page))
    }
}

/// Stand-in for the host application's membership subsystem.
#[derive(Default)]
pub struct InMemoryMemberDirectory {
    users: DashMap<UserId, User>,
    admins: DashSet<UserId>,
    banned: DashSet<UserId>,
}

impl InMemoryMemberDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a user with fixed roles. Used for configured seeds.
    pub fn upsert(&self, user: User, admin: bool, banned: bool) {
        self.set_admin(user.id, admin);
        self.set_banned(user.id, banned);
        self.users.insert(user.id, user);
    }

    /// Registers a user under a fresh id.
    pub fn add_user(&self, username: &str) -> User {
        let user = User {
            id: UserId::new(),
            username: username.to_string(),
        };
        self.users.insert(user.id, user.clone());
        user
    }

    pub fn add_admin(&self, username: &str) -> User {
        let user = self.add_user(username);
        self.admins.insert(user.id);
        user
    }

    pub fn set_admin(&self, id: UserId, admin: bool) {
        if admin {
            self.admins.insert(id);
        } else {
            self.admins.remove(&id);
        }
    }

    pub fn set_banned(&self, id: UserId, banned: bool) {
        if banned {
            self.banned.insert(id);
        } else {
            self.banned.remove(&id);
        }
    }

    pub fn rename(&self, id: UserId, username: &str) {
        if let Some(mut user) = self.users.get_mut(&id) {
            user.username = username.to_string();
        }
    }
}

#[async_trait]
impl MemberDirectory for InMemoryMemberDirectory {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|u| u.username == username)
            .map(|u| u.value().clone()))
    }

    async fn is_admin(&self, id: UserId) -> Result<bool> {
        Ok(self.admins.contains(&id))
    }

    async fn is_banned(&self, id: UserId) -> Result<bool> {
        Ok(self.banned.contains(&id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use std::sync::Arc;

    fn thread(community: &str, pinned: bool, age_minutes: i64) -> Thread {
        Thread {
            id: ThreadId::new(),
            title: "Hello World Title".into(),
            message: "body".into(),
            community: community.into(),
            pinned,
            locked: false,
            featured: false,
            reply_nb: 0,
            author: UserId::new(),
            author_name: "alice".into(),
            created_at: Utc::now() - Duration::minutes(age_minutes),
        }
    }

    #[tokio::test]
    async fn test_list_orders_pinned_then_newest() {
        let repo = InMemoryThreadRepository::new();
        let old_pinned = thread("general", true, 60);
        let new = thread("general", false, 1);
        let old = thread("general", false, 30);
        let elsewhere = thread("help", false, 0);
        for t in [&old_pinned, &new, &old, &elsewhere] {
            repo.insert(t).await.unwrap();
        }

        let filter = ThreadFilter {
            community: Some("general".into()),
        };
        let ids: Vec<ThreadId> = repo
            .list(&filter, Page::default())
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec![old_pinned.id, new.id, old.id]);

        let second_page = repo.list(&filter, Page::new(Some(2), Some(2))).await.unwrap();
        assert_eq!(second_page.len(), 1);
        assert_eq!(second_page[0].id, old.id);
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_rejected() {
        let repo = InMemoryThreadRepository::new();
        let t = thread("general", false, 0);
        tokio_test::assert_ok!(repo.insert(&t).await);
        tokio_test::assert_err!(repo.insert(&t).await);
    }

    #[tokio::test]
    async fn test_increment_on_missing_thread() {
        let repo = InMemoryThreadRepository::new();
        let err = repo.increment_reply_nb(ThreadId::new()).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_concurrent_increments_are_not_lost() {
        let repo = Arc::new(InMemoryThreadRepository::new());
        let t = thread("general", false, 0);
        repo.insert(&t).await.unwrap();
        let id = t.id;

        let mut handles = Vec::new();
        for _ in 0..64 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move { repo.increment_reply_nb(id).await }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }
        assert_eq!(repo.find_by_id(id).await.unwrap().unwrap().reply_nb, 64);
    }

    #[tokio::test]
    async fn test_directory_roles() {
        let dir = InMemoryMemberDirectory::new();
        let alice = dir.add_user("alice");
        let root = dir.add_admin("root");

        assert!(dir.is_admin(root.id).await.unwrap());
        assert!(!dir.is_admin(alice.id).await.unwrap());

        dir.set_banned(alice.id, true);
        assert!(dir.is_banned(alice.id).await.unwrap());

        dir.rename(alice.id, "alicia");
        assert_eq!(dir.find_by_username("alicia").await.unwrap(), Some(User {
            id: alice.id,
            username: "alicia".into(),
        }));
        assert_eq!(dir.find_by_username("alice").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_upsert_replaces_roles() {
        let dir = InMemoryMemberDirectory::new();
        let user = User {
            id: UserId::new(),
            username: "mod".into(),
        };
        dir.upsert(user.clone(), true, false);
        assert!(dir.is_admin(user.id).await.unwrap());

        dir.upsert(user.clone(), false, true);
        assert!(!dir.is_admin(user.id).await.unwrap());
        assert!(dir.is_banned(user.id).await.unwrap());
        assert_eq!(dir.find_by_id(user.id).await.unwrap(), Some(user));
    }
}
