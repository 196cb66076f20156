//! Role and state predicates shared by every forum method.
//!
//! The predicates are plain functions over a resolved [`Member`] and the
//! target entity so each method composes the same rules instead of
//! re-deriving them inline.

use domains::{Authored, Caller, DomainError, Member, MemberDirectory, Result, User, UserId};
use std::sync::Arc;
use tracing::warn;

/// True when nobody is logged in or the caller is banned.
pub fn is_banned_or_out(member: Option<&Member>) -> bool {
    member.map_or(true, |m| m.is_banned)
}

pub fn is_admin(member: &Member) -> bool {
    member.is_admin
}

pub fn is_author_or_admin<T: Authored>(member: &Member, target: &T) -> bool {
    member.is_admin || member.user.id == target.author()
}

/// Resolves callers against the membership subsystem and enforces the
/// entry checks common to all mutations.
#[derive(Clone)]
pub struct Gatekeeper {
    directory: Arc<dyn MemberDirectory>,
}

impl Gatekeeper {
    pub fn new(directory: Arc<dyn MemberDirectory>) -> Self {
        Self { directory }
    }

    /// `None` for anonymous callers and for ids the directory does not know.
    pub async fn resolve(&self, caller: &Caller) -> Result<Option<Member>> {
        let Caller::User(id) = caller else {
            return Ok(None);
        };
        let Some(user) = self.directory.find_by_id(*id).await? else {
            return Ok(None);
        };
        let is_banned = self.directory.is_banned(*id).await?;
        let is_admin = self.directory.is_admin(*id).await?;
        Ok(Some(Member {
            user,
            is_admin,
            is_banned,
        }))
    }

    /// Logged in and not banned.
    pub async fn require_active(&self, caller: &Caller) -> Result<Member> {
        let member = self.resolve(caller).await?;
        match member {
            Some(m) if !is_banned_or_out(Some(&m)) => Ok(m),
            _ => {
                warn!(%caller, "rejected banned or logged out caller");
                Err(DomainError::Unauthorized(
                    "a banned or logged out user cannot take this action".into(),
                ))
            }
        }
    }

    /// Active and an admin.
    pub async fn require_admin(&self, caller: &Caller) -> Result<Member> {
        let member = self.require_active(caller).await?;
        if !is_admin(&member) {
            warn!(%caller, "rejected non-admin caller");
            return Err(DomainError::Forbidden(
                "you are not authorised to take this action".into(),
            ));
        }
        Ok(member)
    }

    pub async fn resolve_username(&self, username: &str) -> Result<User> {
        self.directory
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::UserNotFound(username.to_string()))
    }

    pub async fn user(&self, id: UserId) -> Result<Option<User>> {
        self.directory.find_by_id(id).await
    }
}
