//! Behaviour every storage adapter must share. Each backend module runs the
//! same contract functions; the Postgres module needs the `db-postgres`
//! feature and `DATABASE_URL`, and skips otherwise.

use std::sync::Arc;

use chrono::{Duration, SubsecRound, Utc};
use domains::{
    DomainError, Page, Reply, ReplyId, ReplyRepository, Thread, ThreadFilter, ThreadFlag, ThreadId, ThreadPatch,
    ThreadRepository, UserId,
};

struct Stores {
    threads: Arc<dyn ThreadRepository>,
    replies: Arc<dyn ReplyRepository>,
}

// Postgres keeps microseconds.
fn thread(community: &str, pinned: bool, age_minutes: i64) -> Thread {
    Thread {
        id: ThreadId::new(),
        title: "Contract thread title".into(),
        message: "body".into(),
        community: community.into(),
        pinned,
        locked: false,
        featured: false,
        reply_nb: 0,
        author: UserId::new(),
        author_name: "alice".into(),
        created_at: Utc::now().trunc_subsecs(6) - Duration::minutes(age_minutes),
    }
}

fn reply(thread: ThreadId, message: &str, age_minutes: i64) -> Reply {
    Reply {
        id: ReplyId::new(),
        thread,
        message: message.into(),
        author: UserId::new(),
        author_name: "bob".into(),
        created_at: Utc::now().trunc_subsecs(6) - Duration::minutes(age_minutes),
    }
}

/// A community name no other test run uses.
fn fresh_community() -> String {
    format!("c-{}", ThreadId::new())
}

mod contracts {
    use super::*;

    pub async fn thread_roundtrip(s: &Stores) {
        let t = thread("general", false, 0);
        s.threads.insert(&t).await.unwrap();
        assert_eq!(s.threads.find_by_id(t.id).await.unwrap(), Some(t.clone()));
        assert!(s.threads.insert(&t).await.is_err());
        assert_eq!(s.threads.find_by_id(ThreadId::new()).await.unwrap(), None);
    }

    pub async fn patch_sets_only_present_fields(s: &Stores) {
        let t = thread("general", false, 0);
        s.threads.insert(&t).await.unwrap();

        let new_author = UserId::new();
        let patch = ThreadPatch {
            title: Some("A brand new title".into()),
            author: Some(new_author),
            author_name: Some("bob".into()),
            pinned: Some(true),
            ..Default::default()
        };
        s.threads.apply_patch(t.id, &patch).await.unwrap();

        let stored = s.threads.find_by_id(t.id).await.unwrap().unwrap();
        let mut expected = t.clone();
        patch.apply_to(&mut expected);
        assert_eq!(stored, expected);
        assert_eq!(stored.message, t.message);
        assert_eq!(stored.author, new_author);

        let err = s.threads.apply_patch(ThreadId::new(), &patch).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    pub async fn set_flag_touches_one_column(s: &Stores) {
        let t = thread("general", false, 0);
        s.threads.insert(&t).await.unwrap();

        s.threads.set_flag(t.id, ThreadFlag::Locked, true).await.unwrap();
        let stored = s.threads.find_by_id(t.id).await.unwrap().unwrap();
        assert!(stored.locked && !stored.pinned && !stored.featured);

        s.threads.set_flag(t.id, ThreadFlag::Pinned, true).await.unwrap();
        s.threads.set_flag(t.id, ThreadFlag::Featured, true).await.unwrap();
        s.threads.set_flag(t.id, ThreadFlag::Locked, false).await.unwrap();
        let stored = s.threads.find_by_id(t.id).await.unwrap().unwrap();
        assert!(!stored.locked && stored.pinned && stored.featured);

        let err = s
            .threads
            .set_flag(ThreadId::new(), ThreadFlag::Pinned, true)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    pub async fn concurrent_increments_are_not_lost(s: &Stores) {
        let t = thread("general", false, 0);
        s.threads.insert(&t).await.unwrap();
        let id = t.id;

        let mut handles = Vec::new();
        for _ in 0..32 {
            let threads = s.threads.clone();
            handles.push(tokio::spawn(async move { threads.increment_reply_nb(id).await }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }
        assert_eq!(s.threads.find_by_id(id).await.unwrap().unwrap().reply_nb, 32);

        let err = s.threads.increment_reply_nb(ThreadId::new()).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    pub async fn list_orders_pinned_then_newest(s: &Stores) {
        let community = fresh_community();
        let old_pinned = thread(&community, true, 60);
        let new = thread(&community, false, 1);
        let old = thread(&community, false, 30);
        for t in [&old_pinned, &new, &old] {
            s.threads.insert(t).await.unwrap();
        }

        let filter = ThreadFilter {
            community: Some(community),
        };
        let ids: Vec<_> = s
            .threads
            .list(&filter, Page::default())
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec![old_pinned.id, new.id, old.id]);

        let page = s.threads.list(&filter, Page::new(Some(1), Some(1))).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, new.id);
    }

    pub async fn reply_lifecycle(s: &Stores) {
        let t = thread("general", false, 0);
        s.threads.insert(&t).await.unwrap();

        let second = reply(t.id, "second", 5);
        let first = reply(t.id, "first", 10);
        let third = reply(t.id, "third", 1);
        for r in [&second, &first, &third] {
            s.replies.insert(r).await.unwrap();
        }
        assert!(s.replies.insert(&first).await.is_err());

        let listed: Vec<_> = s
            .replies
            .list_by_thread(t.id, Page::default())
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.message)
            .collect();
        assert_eq!(listed, ["first", "second", "third"]);

        s.replies.update_message(first.id, "edited").await.unwrap();
        let stored = s.replies.find_by_id(first.id).await.unwrap().unwrap();
        assert_eq!(stored.message, "edited");
        assert_eq!(stored.author, first.author);

        let err = s.replies.update_message(ReplyId::new(), "x").await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { kind: "reply", .. }));

        s.replies.remove(third.id).await.unwrap();
        assert_eq!(s.replies.find_by_id(third.id).await.unwrap(), None);
        assert!(s.replies.remove(third.id).await.is_err());
    }
}

macro_rules! contract_tests {
    ($stores:ident) => {
        #[tokio::test]
        async fn thread_roundtrip() {
            if let Some(s) = $stores().await {
                contracts::thread_roundtrip(&s).await;
            }
        }

        #[tokio::test]
        async fn patch_sets_only_present_fields() {
            if let Some(s) = $stores().await {
                contracts::patch_sets_only_present_fields(&s).await;
            }
        }

        #[tokio::test]
        async fn set_flag_touches_one_column() {
            if let Some(s) = $stores().await {
                contracts::set_flag_touches_one_column(&s).await;
            }
        }

        #[tokio::test]
        async fn concurrent_increments_are_not_lost() {
            if let Some(s) = $stores().await {
                contracts::concurrent_increments_are_not_lost(&s).await;
            }
        }

        #[tokio::test]
        async fn list_orders_pinned_then_newest() {
            if let Some(s) = $stores().await {
                contracts::list_orders_pinned_then_newest(&s).await;
            }
        }

        #[tokio::test]
        async fn reply_lifecycle() {
            if let Some(s) = $stores().await {
                contracts::reply_lifecycle(&s).await;
            }
        }
    };
}

mod memory {
    use super::*;
    use storage_adapters::{InMemoryReplyRepository, InMemoryThreadRepository};

    async fn stores() -> Option<Stores> {
        Some(Stores {
            threads: Arc::new(InMemoryThreadRepository::new()),
            replies: Arc::new(InMemoryReplyRepository::new()),
        })
    }

    contract_tests!(stores);
}

#[cfg(feature = "db-postgres")]
mod postgres {
    use super::*;
    use domains::{MemberDirectory, User};
    use storage_adapters::postgres::{connect, PgMemberDirectory, PgReplyRepository, PgThreadRepository};

    async fn directory() -> Option<PgMemberDirectory> {
        let url = std::env::var("DATABASE_URL").ok()?;
        let pool = connect(&url, 8).await.unwrap();
        Some(PgMemberDirectory::new(pool))
    }

    async fn stores() -> Option<Stores> {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set, skipping postgres contracts");
            return None;
        };
        let pool = connect(&url, 8).await.unwrap();
        Some(Stores {
            threads: Arc::new(PgThreadRepository::new(pool.clone())),
            replies: Arc::new(PgReplyRepository::new(pool)),
        })
    }

    contract_tests!(stores);

    #[tokio::test]
    async fn member_upsert_and_lookup() {
        let Some(dir) = directory().await else {
            return;
        };
        let user = User {
            id: UserId::new(),
            username: format!("member-{}", UserId::new()),
        };
        dir.upsert(&user, true, false).await.unwrap();
        assert_eq!(dir.find_by_id(user.id).await.unwrap(), Some(user.clone()));
        assert_eq!(dir.find_by_username(&user.username).await.unwrap(), Some(user.clone()));
        assert!(dir.is_admin(user.id).await.unwrap());
        assert!(!dir.is_banned(user.id).await.unwrap());

        dir.upsert(&user, false, true).await.unwrap();
        assert!(!dir.is_admin(user.id).await.unwrap());
        assert!(dir.is_banned(user.id).await.unwrap());

        assert!(!dir.is_admin(UserId::new()).await.unwrap());
        assert_eq!(dir.find_by_id(UserId::new()).await.unwrap(), None);
    }
}
