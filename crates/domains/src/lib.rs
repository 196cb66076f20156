//! forum/crates/domains/src/lib.rs
//!
//! The central domain types and port definitions for the forum service.
//! Nothing in here performs I/O; adapters live in `storage-adapters`,
//! `auth-adapters` and `api-adapters`.

pub mod errors;
pub mod models;
pub mod ports;
pub mod requests;
pub mod validation;

// Re-exporting for easier access in other crates
pub use errors::*;
pub use models::*;
pub use ports::*;
pub use requests::*;
pub use validation::{ErrorCode, FieldError, ValidationErrors, WriteMode};

#[cfg(test)]
mod tests {
    use super::models::*;

    #[test]
    fn test_thread_ids_are_time_ordered() {
        let first = ThreadId::new();
        let second = ThreadId::new();
        assert!(first.as_uuid() <= second.as_uuid());
    }

    #[test]
    fn test_id_parses_from_display_form() {
        let id = ReplyId::new();
        let parsed: ReplyId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }
}
