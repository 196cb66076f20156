//! Shared wiring for the integration tests: a forum over the in-memory
//! adapters with a few known members.

use std::sync::Arc;

use domains::{CommunitySet, User};
use services::Forum;
use storage_adapters::{InMemoryMemberDirectory, InMemoryReplyRepository, InMemoryThreadRepository};

pub struct World {
    pub forum: Forum,
    pub threads: Arc<InMemoryThreadRepository>,
    pub replies: Arc<InMemoryReplyRepository>,
    pub directory: Arc<InMemoryMemberDirectory>,
    pub alice: User,
    pub bob: User,
    pub admin: User,
}

impl World {
    pub fn new() -> Self {
        let threads = Arc::new(InMemoryThreadRepository::new());
        let replies = Arc::new(InMemoryReplyRepository::new());
        let directory = Arc::new(InMemoryMemberDirectory::new());
        let alice = directory.add_user("alice");
        let bob = directory.add_user("bob");
        let admin = directory.add_admin("admin");
        let forum = Forum::new(
            threads.clone(),
            replies.clone(),
            directory.clone(),
            CommunitySet::default(),
        );
        Self {
            forum,
            threads,
            replies,
            directory,
            alice,
            bob,
            admin,
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
