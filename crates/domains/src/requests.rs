//! Typed method inputs.
//!
//! Each request rejects unknown keys on deserialization, so a client cannot
//! smuggle server-owned fields (`pinned`, `replyNb`, `author`, ...) into a
//! user-level call. `validate` runs before any other logic in the services.

use crate::models::{CommunitySet, ThreadId, ThreadPatch};
use crate::validation::{check_community, check_required, check_title, ErrorCode, ValidationErrors};
use serde::{Deserialize, Serialize};

/// Input of `insertThread`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewThread {
    pub title: String,
    pub message: String,
    pub community: String,
}

impl NewThread {
    pub fn validate(&self, communities: &CommunitySet) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_title(&mut errors, &self.title);
        check_required(&mut errors, "message", &self.message);
        check_community(&mut errors, communities, &self.community);
        errors.into_result()
    }
}

/// The `update` part of `updateThread`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ThreadUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ThreadUpdate {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.title.is_none() && self.message.is_none() {
            errors.push("update", ErrorCode::EmptyUpdate, "update sets no fields");
        }
        if let Some(title) = &self.title {
            check_title(&mut errors, title);
        }
        if let Some(message) = &self.message {
            check_required(&mut errors, "message", message);
        }
        errors.into_result()
    }

    pub fn into_patch(self) -> ThreadPatch {
        ThreadPatch {
            title: self.title,
            message: self.message,
            ..Default::default()
        }
    }
}

/// Input of `adminInsertThread`. The author is named, not taken from the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AdminNewThread {
    pub title: String,
    pub message: String,
    pub community: String,
    pub author_name: String,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub featured: bool,
}

impl AdminNewThread {
    pub fn validate(&self, communities: &CommunitySet) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_title(&mut errors, &self.title);
        check_required(&mut errors, "message", &self.message);
        check_community(&mut errors, communities, &self.community);
        check_required(&mut errors, "authorName", &self.author_name);
        errors.into_result()
    }
}

/// The `update` part of `adminUpdateThread`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AdminThreadUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub community: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
}

impl AdminThreadUpdate {
    pub fn validate(&self, communities: &CommunitySet) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if *self == AdminThreadUpdate::default() {
            errors.push("update", ErrorCode::EmptyUpdate, "update sets no fields");
        }
        if let Some(title) = &self.title {
            check_title(&mut errors, title);
        }
        if let Some(message) = &self.message {
            check_required(&mut errors, "message", message);
        }
        if let Some(community) = &self.community {
            check_community(&mut errors, communities, community);
        }
        if let Some(author_name) = &self.author_name {
            check_required(&mut errors, "authorName", author_name);
        }
        errors.into_result()
    }

    /// Builds the patch; `author` is filled in by the caller once
    /// `author_name` has been resolved.
    pub fn into_patch(self) -> ThreadPatch {
        ThreadPatch {
            title: self.title,
            message: self.message,
            community: self.community,
            author: None,
            author_name: self.author_name,
            pinned: self.pinned,
            locked: self.locked,
            featured: self.featured,
        }
    }
}

/// Input of `insertReply`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewReply {
    pub thread: ThreadId,
    pub message: String,
}

impl NewReply {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_required(&mut errors, "message", &self.message);
        errors.into_result()
    }
}

/// Input of `editReply`, minus the reply id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReplyEdit {
    pub message: String,
}

impl ReplyEdit {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_required(&mut errors, "message", &self.message);
        errors.into_result()
    }
}
