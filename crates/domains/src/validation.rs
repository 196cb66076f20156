//! Field constraints and document-level schema checks.
//!
//! Method inputs are validated by the request types in [`crate::requests`].
//! The `check_*_document` functions here guard the stored shape and run
//! right before a repository write.

use crate::models::{CommunitySet, Reply, Thread, ThreadPatch, User};
use serde::Serialize;
use std::fmt;

pub const TITLE_MIN_CHARS: usize = 10;
pub const TITLE_MAX_CHARS: usize = 80;

/// Stable machine-readable reason for a rejected field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCode {
    Required,
    MinString,
    MaxString,
    InexistentCommunity,
    ZeroOnInsert,
    UserInconsistency,
    EmptyUpdate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub code: ErrorCode,
    pub message: String,
}

/// Every problem found in one input, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &'static str, code: ErrorCode, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            code,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    pub fn has(&self, field: &str, code: ErrorCode) -> bool {
        self.0.iter().any(|e| e.field == field && e.code == code)
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for e in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", e.field, e.message)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Whether a document is being created or modified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Insert,
    Update,
}

pub(crate) fn check_required(errors: &mut ValidationErrors, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        errors.push(field, ErrorCode::Required, format!("{field} is required"));
    }
}

pub(crate) fn check_title(errors: &mut ValidationErrors, title: &str) {
    let len = title.chars().count();
    if title.trim().is_empty() {
        errors.push("title", ErrorCode::Required, "title is required");
    } else if len < TITLE_MIN_CHARS {
        errors.push(
            "title",
            ErrorCode::MinString,
            format!("title must be at least {TITLE_MIN_CHARS} characters"),
        );
    } else if len > TITLE_MAX_CHARS {
        errors.push(
            "title",
            ErrorCode::MaxString,
            format!("title cannot exceed {TITLE_MAX_CHARS} characters"),
        );
    }
}

pub(crate) fn check_community(errors: &mut ValidationErrors, communities: &CommunitySet, community: &str) {
    if community.trim().is_empty() {
        errors.push("community", ErrorCode::Required, "community is required");
    } else if !communities.contains(community) {
        errors.push(
            "community",
            ErrorCode::InexistentCommunity,
            format!("community '{community}' does not exist"),
        );
    }
}

fn check_author_name(errors: &mut ValidationErrors, author_name: &str, author: Option<&User>) {
    match author {
        Some(user) if user.username == author_name => {}
        _ => errors.push(
            "authorName",
            ErrorCode::UserInconsistency,
            "authorName must be the author's current username",
        ),
    }
}

/// Full-document check for a thread about to be stored.
///
/// `author` is the current user record behind `thread.author`, if any.
pub fn check_thread_document(
    thread: &Thread,
    communities: &CommunitySet,
    mode: WriteMode,
    author: Option<&User>,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_title(&mut errors, &thread.title);
    check_required(&mut errors, "message", &thread.message);
    check_community(&mut errors, communities, &thread.community);
    if mode == WriteMode::Insert && thread.reply_nb != 0 {
        errors.push("replyNb", ErrorCode::ZeroOnInsert, "replyNb must be 0 on insert");
    }
    check_author_name(&mut errors, &thread.author_name, author);
    if let Some(user) = author {
        if user.id != thread.author {
            errors.push(
                "author",
                ErrorCode::UserInconsistency,
                "author does not match the resolved user",
            );
        }
    }
    errors.into_result()
}

/// Check for the fields a patch sets. Untouched fields are not revalidated.
pub fn check_thread_patch(
    patch: &ThreadPatch,
    communities: &CommunitySet,
    author: Option<&User>,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if patch.is_empty() {
        errors.push("update", ErrorCode::EmptyUpdate, "update sets no fields");
    }
    if let Some(title) = &patch.title {
        check_title(&mut errors, title);
    }
    if let Some(message) = &patch.message {
        check_required(&mut errors, "message", message);
    }
    if let Some(community) = &patch.community {
        check_community(&mut errors, communities, community);
    }
    if let Some(author_name) = &patch.author_name {
        check_author_name(&mut errors, author_name, author);
    }
    errors.into_result()
}

pub fn check_reply_document(reply: &Reply, author: &User) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_required(&mut errors, "message", &reply.message);
    check_author_name(&mut errors, &reply.author_name, Some(author));
    errors.into_result()
}
