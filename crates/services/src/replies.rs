//! Reply methods. A reply insert touches two entities: the reply itself and
//! the parent thread's `reply_nb` counter.

use crate::authz::{is_author_or_admin, Gatekeeper};
use chrono::Utc;
use domains::validation::check_reply_document;
use domains::{
    Caller, DomainError, NewReply, Page, Reply, ReplyEdit, ReplyId, ReplyRepository, Result, Thread, ThreadId,
    ThreadRepository,
};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

pub struct ReplyService {
    replies: Arc<dyn ReplyRepository>,
    threads: Arc<dyn ThreadRepository>,
    gate: Gatekeeper,
}

impl ReplyService {
    pub fn new(replies: Arc<dyn ReplyRepository>, threads: Arc<dyn ThreadRepository>, gate: Gatekeeper) -> Self {
        Self {
            replies,
            threads,
            gate,
        }
    }

    async fn parent(&self, id: ThreadId) -> Result<Thread> {
        self.threads
            .find_by_id(id)
            .await?
            .ok_or(DomainError::ThreadNotFound(id))
    }

    /// Adds a reply to an unlocked thread, then bumps the thread's counter.
    /// The counter is only touched once the reply is stored, and the reply is
    /// removed again if the counter cannot be moved.
    #[instrument(skip_all, fields(caller = %caller, thread_id = %input.thread))]
    pub async fn insert_reply(&self, caller: &Caller, input: NewReply) -> Result<Reply> {
        input.validate()?;
        let member = self.gate.require_active(caller).await?;
        let thread = self.parent(input.thread).await?;
        if thread.locked {
            return Err(DomainError::Locked(thread.id));
        }

        let reply = Reply {
            id: ReplyId::new(),
            thread: thread.id,
            message: input.message,
            author: member.user.id,
            author_name: member.user.username.clone(),
            created_at: Utc::now(),
        };
        check_reply_document(&reply, &member.user)?;

        self.replies.insert(&reply).await?;
        if let Err(e) = self.threads.increment_reply_nb(thread.id).await {
            warn!(reply_id = %reply.id, error = %e, "thread counter not incremented, removing reply");
            if let Err(undo) = self.replies.remove(reply.id).await {
                error!(reply_id = %reply.id, error = %undo, "reply left without a counted parent");
            }
            return Err(e);
        }

        info!(reply_id = %reply.id, "reply created");
        Ok(reply)
    }

    /// Replaces a reply's message. Order of checks: reply, parent, lock, ownership.
    #[instrument(skip_all, fields(caller = %caller, reply_id = %id))]
    pub async fn edit_reply(&self, caller: &Caller, id: ReplyId, edit: ReplyEdit) -> Result<Reply> {
        edit.validate()?;
        let member = self.gate.require_active(caller).await?;

        let mut reply = self
            .replies
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::reply_not_found(id))?;
        let thread = self.parent(reply.thread).await?;
        if thread.locked {
            return Err(DomainError::Locked(thread.id));
        }
        if !is_author_or_admin(&member, &reply) {
            warn!("rejected reply edit by non-author");
            return Err(DomainError::Forbidden("you are not authorised to take this action".into()));
        }

        self.replies.update_message(id, &edit.message).await?;
        reply.message = edit.message;
        info!("reply edited");
        Ok(reply)
    }

    pub async fn list_replies(&self, thread: ThreadId, page: Page) -> Result<Vec<Reply>> {
        self.parent(thread).await?;
        self.replies.list_by_thread(thread, page).await
    }
}
