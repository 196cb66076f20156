//! # services
//!
//! The forum method layer. Each public method follows the same pipeline:
//! validate input, resolve and authorize the caller, check entity state,
//! then mutate through the repository ports.

pub mod authz;
pub mod replies;
pub mod threads;

#[cfg(test)]
mod test_support;

pub use authz::Gatekeeper;
pub use replies::ReplyService;
pub use threads::ThreadService;

use domains::{CommunitySet, MemberDirectory, ReplyRepository, ThreadRepository};
use std::sync::Arc;

/// Both services wired against the same ports.
pub struct Forum {
    pub threads: ThreadService,
    pub replies: ReplyService,
}

impl Forum {
    pub fn new(
        threads: Arc<dyn ThreadRepository>,
        replies: Arc<dyn ReplyRepository>,
        directory: Arc<dyn MemberDirectory>,
        communities: CommunitySet,
    ) -> Self {
        let gate = Gatekeeper::new(directory);
        Self {
            threads: ThreadService::new(threads.clone(), gate.clone(), communities),
            replies: ReplyService::new(replies, threads, gate),
        }
    }
}
