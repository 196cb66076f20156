//! Thread methods: user insert/update, admin insert/update and the admin flag toggles.

use crate::authz::{is_author_or_admin, Gatekeeper};
use chrono::Utc;
use domains::validation::{check_thread_document, check_thread_patch};
use domains::{
    AdminNewThread, AdminThreadUpdate, Caller, CommunitySet, DomainError, NewThread, Page, Result, Thread,
    ThreadFilter, ThreadFlag, ThreadId, ThreadRepository, ThreadUpdate, WriteMode,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub struct ThreadService {
    threads: Arc<dyn ThreadRepository>,
    gate: Gatekeeper,
    communities: CommunitySet,
}

impl ThreadService {
    pub fn new(threads: Arc<dyn ThreadRepository>, gate: Gatekeeper, communities: CommunitySet) -> Self {
        Self {
            threads,
            gate,
            communities,
        }
    }

    async fn existing(&self, id: ThreadId) -> Result<Thread> {
        self.threads
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::thread_not_found(id))
    }

    /// Creates a thread owned by the caller with every server-side field at its default.
    #[instrument(skip_all, fields(caller = %caller))]
    pub async fn insert_thread(&self, caller: &Caller, input: NewThread) -> Result<Thread> {
        input.validate(&self.communities)?;
        let member = self.gate.require_active(caller).await?;

        let thread = Thread {
            id: ThreadId::new(),
            title: input.title,
            message: input.message,
            community: input.community,
            pinned: false,
            locked: false,
            featured: false,
            reply_nb: 0,
            author: member.user.id,
            author_name: member.user.username.clone(),
            created_at: Utc::now(),
        };
        check_thread_document(&thread, &self.communities, WriteMode::Insert, Some(&member.user))?;

        self.threads.insert(&thread).await?;
        info!(thread_id = %thread.id, community = %thread.community, "thread created");
        Ok(thread)
    }

    /// Author-or-admin edit of title and/or message. Locked threads are frozen.
    #[instrument(skip_all, fields(caller = %caller, thread_id = %id))]
    pub async fn update_thread(&self, caller: &Caller, id: ThreadId, update: ThreadUpdate) -> Result<Thread> {
        update.validate()?;
        let member = self.gate.require_active(caller).await?;
        let mut thread = self.existing(id).await?;

        if !is_author_or_admin(&member, &thread) {
            warn!("rejected thread update by non-author");
            return Err(DomainError::Forbidden("you are not allowed to take this action".into()));
        }
        if thread.locked {
            return Err(DomainError::Locked(id));
        }

        let patch = update.into_patch();
        check_thread_patch(&patch, &self.communities, None)?;
        self.threads.apply_patch(id, &patch).await?;

        patch.apply_to(&mut thread);
        info!("thread updated");
        Ok(thread)
    }

    /// Admin insert on behalf of a named user. Flags come from the input.
    #[instrument(skip_all, fields(caller = %caller))]
    pub async fn admin_insert_thread(&self, caller: &Caller, input: AdminNewThread) -> Result<Thread> {
        input.validate(&self.communities)?;
        self.gate.require_admin(caller).await?;
        let author = self.gate.resolve_username(&input.author_name).await?;

        let thread = Thread {
            id: ThreadId::new(),
            title: input.title,
            message: input.message,
            community: input.community,
            pinned: input.pinned,
            locked: input.locked,
            featured: input.featured,
            reply_nb: 0,
            author: author.id,
            author_name: author.username.clone(),
            created_at: Utc::now(),
        };
        check_thread_document(&thread, &self.communities, WriteMode::Insert, Some(&author))?;

        self.threads.insert(&thread).await?;
        info!(thread_id = %thread.id, author = %author.username, "thread created by admin");
        Ok(thread)
    }

    /// Admin update of any mutable field. Changing `authorName` re-resolves `author`.
    /// Not blocked by `locked`.
    #[instrument(skip_all, fields(caller = %caller, thread_id = %id))]
    pub async fn admin_update_thread(
        &self,
        caller: &Caller,
        id: ThreadId,
        update: AdminThreadUpdate,
    ) -> Result<Thread> {
        update.validate(&self.communities)?;
        self.gate.require_admin(caller).await?;
        let mut thread = self.existing(id).await?;

        let mut patch = update.into_patch();
        let author = match &patch.author_name {
            Some(name) => Some(self.gate.resolve_username(name).await?),
            None => None,
        };
        if let Some(user) = &author {
            patch.author = Some(user.id);
        }
        check_thread_patch(&patch, &self.communities, author.as_ref())?;
        self.threads.apply_patch(id, &patch).await?;

        patch.apply_to(&mut thread);
        info!("thread updated by admin");
        Ok(thread)
    }

    #[instrument(skip_all, fields(caller = %caller, thread_id = %id, flag = flag.field(), value = value))]
    async fn set_flag(&self, caller: &Caller, id: ThreadId, flag: ThreadFlag, value: bool) -> Result<Thread> {
        self.gate.require_admin(caller).await?;
        let mut thread = self.existing(id).await?;

        self.threads.set_flag(id, flag, value).await?;
        match flag {
            ThreadFlag::Pinned => thread.pinned = value,
            ThreadFlag::Locked => thread.locked = value,
            ThreadFlag::Featured => thread.featured = value,
        }
        info!("thread flag set");
        Ok(thread)
    }

    pub async fn thread_pin_update(&self, caller: &Caller, id: ThreadId, pin_value: bool) -> Result<Thread> {
        self.set_flag(caller, id, ThreadFlag::Pinned, pin_value).await
    }

    pub async fn thread_lock_update(&self, caller: &Caller, id: ThreadId, lock_value: bool) -> Result<Thread> {
        self.set_flag(caller, id, ThreadFlag::Locked, lock_value).await
    }

    pub async fn thread_featured_update(
        &self,
        caller: &Caller,
        id: ThreadId,
        featured_value: bool,
    ) -> Result<Thread> {
        self.set_flag(caller, id, ThreadFlag::Featured, featured_value).await
    }

    pub async fn get_thread(&self, id: ThreadId) -> Result<Thread> {
        self.existing(id).await
    }

    pub async fn list_threads(&self, filter: &ThreadFilter, page: Page) -> Result<Vec<Thread>> {
        self.threads.list(filter, page).await
    }
}
