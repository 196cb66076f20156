//! # storage-adapters
//!
//! Implementations of the `domains` ports. The in-memory adapters are always
//! compiled; Postgres sits behind the `db-postgres` feature.

pub mod memory;

#[cfg(feature = "db-postgres")]
pub mod postgres;

pub use memory::{InMemoryMemberDirectory, InMemoryReplyRepository, InMemoryThreadRepository};
