//! # Domain Models
//!
//! These structs represent the core entities of the forum.
//! We use UUID v7 for time-ordered, globally unique identification.
//! Field names serialize in camelCase (`replyNb`, `authorName`, ...) and ids
//! as `_id`, the shape clients of the method surface already expect.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a fresh, time-ordered id.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

entity_id!(
    /// Identifies a [`Thread`].
    ThreadId
);
entity_id!(
    /// Identifies a [`Reply`].
    ReplyId
);
entity_id!(
    /// Identifies a user of the host application.
    UserId
);

/// A top-level forum post starting a discussion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    #[serde(rename = "_id")]
    pub id: ThreadId,
    pub title: String,
    pub message: String,
    pub community: String,
    pub pinned: bool,
    pub locked: bool,
    pub featured: bool,
    /// Number of accepted replies. Only ever moved by an atomic increment.
    pub reply_nb: u64,
    pub author: UserId,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
}

/// A response attached to exactly one [`Thread`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    #[serde(rename = "_id")]
    pub id: ReplyId,
    pub thread: ThreadId,
    pub message: String,
    pub author: UserId,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
}

/// Entities that carry a write-once author.
pub trait Authored {
    fn author(&self) -> UserId;
}

impl Authored for Thread {
    fn author(&self) -> UserId {
        self.author
    }
}

impl Authored for Reply {
    fn author(&self) -> UserId {
        self.author
    }
}

/// Read-only projection of a user record owned by the host application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
}

/// Who is making a call, as established by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caller {
    Anonymous,
    User(UserId),
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Caller::Anonymous => f.write_str("anonymous"),
            Caller::User(id) => id.fmt(f),
        }
    }
}

/// A caller resolved against the membership subsystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub user: User,
    pub is_admin: bool,
    pub is_banned: bool,
}

/// The admin-controlled boolean flags on a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThreadFlag {
    Pinned,
    Locked,
    Featured,
}

impl ThreadFlag {
    /// Column / document field holding the flag.
    pub fn field(&self) -> &'static str {
        match self {
            ThreadFlag::Pinned => "pinned",
            ThreadFlag::Locked => "locked",
            ThreadFlag::Featured => "featured",
        }
    }
}

/// A partial `$set` over the mutable thread fields.
///
/// `author` changes only through an admin update that re-resolves
/// `author_name`; `id`, `reply_nb` and `created_at` have no slot here at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThreadPatch {
    pub title: Option<String>,
    pub message: Option<String>,
    pub community: Option<String>,
    pub author: Option<UserId>,
    pub author_name: Option<String>,
    pub pinned: Option<bool>,
    pub locked: Option<bool>,
    pub featured: Option<bool>,
}

impl ThreadPatch {
    pub fn is_empty(&self) -> bool {
        *self == ThreadPatch::default()
    }

    /// Applies the set fields to `thread` in place.
    pub fn apply_to(&self, thread: &mut Thread) {
        if let Some(title) = &self.title {
            thread.title = title.clone();
        }
        if let Some(message) = &self.message {
            thread.message = message.clone();
        }
        if let Some(community) = &self.community {
            thread.community = community.clone();
        }
        if let Some(author) = self.author {
            thread.author = author;
        }
        if let Some(author_name) = &self.author_name {
            thread.author_name = author_name.clone();
        }
        if let Some(pinned) = self.pinned {
            thread.pinned = pinned;
        }
        if let Some(locked) = self.locked {
            thread.locked = locked;
        }
        if let Some(featured) = self.featured {
            thread.featured = featured;
        }
    }
}

/// Filter for thread listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadFilter {
    pub community: Option<String>,
}

/// Offset pagination, clamped to sane bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}

impl Page {
    pub const DEFAULT_LIMIT: u32 = 20;
    pub const MAX_LIMIT: u32 = 100;

    pub fn new(limit: Option<u32>, offset: Option<u32>) -> Self {
        Self {
            limit: limit
                .unwrap_or(Self::DEFAULT_LIMIT)
                .clamp(1, Self::MAX_LIMIT),
            offset: offset.unwrap_or(0),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Communities used when the deployment does not configure its own.
pub const DEFAULT_COMMUNITIES: &[&str] = &["general", "announcements", "help", "events", "off-topic"];

/// The fixed set of communities a thread may belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommunitySet(BTreeSet<String>);

impl CommunitySet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Default for CommunitySet {
    fn default() -> Self {
        Self::new(DEFAULT_COMMUNITIES.iter().copied())
    }
}
