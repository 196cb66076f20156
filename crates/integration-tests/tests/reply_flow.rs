use std::sync::Arc;

use async_trait::async_trait;
use domains::{
    Caller, CommunitySet, DomainError, NewReply, NewThread, Page, ReplyEdit, ReplyId, Result, Thread, ThreadFilter,
    ThreadFlag, ThreadId, ThreadPatch, ThreadRepository,
};
use integration_tests::World;
use services::Forum;
use storage_adapters::{InMemoryMemberDirectory, InMemoryReplyRepository, InMemoryThreadRepository};

/// Thread store whose counter cannot move.
struct StuckCounter(InMemoryThreadRepository);

#[async_trait]
impl ThreadRepository for StuckCounter {
    async fn insert(&self, thread: &Thread) -> Result<()> {
        self.0.insert(thread).await
    }

    async fn find_by_id(&self, id: ThreadId) -> Result<Option<Thread>> {
        self.0.find_by_id(id).await
    }

    async fn apply_patch(&self, id: ThreadId, patch: &ThreadPatch) -> Result<()> {
        self.0.apply_patch(id, patch).await
    }

    async fn set_flag(&self, id: ThreadId, flag: ThreadFlag, value: bool) -> Result<()> {
        self.0.set_flag(id, flag, value).await
    }

    async fn increment_reply_nb(&self, _id: ThreadId) -> Result<()> {
        Err(DomainError::Storage("connection reset".into()))
    }

    async fn list(&self, filter: &ThreadFilter, page: Page) -> Result<Vec<Thread>> {
        self.0.list(filter, page).await
    }
}

async fn open_thread(w: &World) -> Thread {
    let input = NewThread {
        title: "A thread to reply to".into(),
        message: "Say something".into(),
        community: "general".into(),
    };
    w.forum
        .threads
        .insert_thread(&Caller::User(w.alice.id), input)
        .await
        .unwrap()
}

fn reply(thread: ThreadId, message: &str) -> NewReply {
    NewReply {
        thread,
        message: message.into(),
    }
}

#[tokio::test]
async fn reply_bumps_counter_and_lock_is_admin_only() {
    let w = World::new();
    let thread = open_thread(&w).await;

    let r = w
        .forum
        .replies
        .insert_reply(&Caller::User(w.bob.id), reply(thread.id, "Hello!"))
        .await
        .unwrap();
    assert_eq!(r.thread, thread.id);
    assert_eq!(r.author_name, "bob");

    let stored = w.forum.threads.get_thread(thread.id).await.unwrap();
    assert_eq!(stored.reply_nb, 1);

    let err = w
        .forum
        .threads
        .thread_lock_update(&Caller::User(w.alice.id), thread.id, true)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));
}

#[tokio::test]
async fn concurrent_replies_are_all_counted() {
    let w = Arc::new(World::new());
    let thread = open_thread(&w).await;

    let mut handles = Vec::new();
    for i in 0..32 {
        let w = w.clone();
        let caller = if i % 2 == 0 { w.alice.id } else { w.bob.id };
        let id = thread.id;
        handles.push(tokio::spawn(async move {
            w.forum
                .replies
                .insert_reply(&Caller::User(caller), reply(id, &format!("reply {i}")))
                .await
        }));
    }
    for h in handles {
        h.await.unwrap().unwrap();
    }

    let stored = w.forum.threads.get_thread(thread.id).await.unwrap();
    assert_eq!(stored.reply_nb, 32);
    assert_eq!(stored.reply_nb as usize, w.replies.count_for(thread.id));
}

#[tokio::test]
async fn locked_thread_rejects_replies_and_edits() {
    let w = World::new();
    let thread = open_thread(&w).await;
    let bob = Caller::User(w.bob.id);
    let admin = Caller::User(w.admin.id);

    let r = w
        .forum
        .replies
        .insert_reply(&bob, reply(thread.id, "before the lock"))
        .await
        .unwrap();
    w.forum.threads.thread_lock_update(&admin, thread.id, true).await.unwrap();

    let err = w
        .forum
        .replies
        .insert_reply(&bob, reply(thread.id, "after the lock"))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Locked(_)));

    let edit = ReplyEdit {
        message: "edited".into(),
    };
    let err = w.forum.replies.edit_reply(&admin, r.id, edit).await.unwrap_err();
    assert!(matches!(err, DomainError::Locked(_)));

    let stored = w.forum.threads.get_thread(thread.id).await.unwrap();
    assert_eq!(stored.reply_nb, 1);
}

#[tokio::test]
async fn reply_to_missing_thread() {
    let w = World::new();
    let err = w
        .forum
        .replies
        .insert_reply(&Caller::User(w.bob.id), reply(ThreadId::new(), "anyone?"))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::ThreadNotFound(_)));

    let err = w
        .forum
        .replies
        .list_replies(ThreadId::new(), Page::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::ThreadNotFound(_)));
}

#[tokio::test]
async fn only_author_or_admin_edits_a_reply() {
    let w = World::new();
    let thread = open_thread(&w).await;
    let r = w
        .forum
        .replies
        .insert_reply(&Caller::User(w.bob.id), reply(thread.id, "original"))
        .await
        .unwrap();

    let err = w
        .forum
        .replies
        .edit_reply(
            &Caller::User(w.alice.id),
            r.id,
            ReplyEdit {
                message: "not yours".into(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));

    let edited = w
        .forum
        .replies
        .edit_reply(
            &Caller::User(w.bob.id),
            r.id,
            ReplyEdit {
                message: "fixed typo".into(),
            },
        )
        .await
        .unwrap();
    assert_eq!(edited.message, "fixed typo");

    let err = w
        .forum
        .replies
        .edit_reply(
            &Caller::User(w.admin.id),
            ReplyId::new(),
            ReplyEdit {
                message: "ghost".into(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound { .. }));
}

#[tokio::test]
async fn replies_list_oldest_first() {
    let w = World::new();
    let thread = open_thread(&w).await;
    let bob = Caller::User(w.bob.id);

    for message in ["one", "two", "three"] {
        w.forum
            .replies
            .insert_reply(&bob, reply(thread.id, message))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }

    let listed = w
        .forum
        .replies
        .list_replies(thread.id, Page::default())
        .await
        .unwrap();
    let messages: Vec<_> = listed.iter().map(|r| r.message.as_str()).collect();
    assert_eq!(messages, ["one", "two", "three"]);
}

#[tokio::test]
async fn failed_counter_bump_leaves_no_reply_behind() {
    let threads = Arc::new(StuckCounter(InMemoryThreadRepository::new()));
    let replies = Arc::new(InMemoryReplyRepository::new());
    let directory = Arc::new(InMemoryMemberDirectory::new());
    let alice = Caller::User(directory.add_user("alice").id);
    let forum = Forum::new(threads.clone(), replies.clone(), directory, CommunitySet::default());

    let thread = forum
        .threads
        .insert_thread(
            &alice,
            NewThread {
                title: "Counter is broken".into(),
                message: "Say something".into(),
                community: "general".into(),
            },
        )
        .await
        .unwrap();

    let err = forum
        .replies
        .insert_reply(&alice, reply(thread.id, "lost?"))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Storage(_)));

    let stored = forum.threads.get_thread(thread.id).await.unwrap();
    assert_eq!(stored.reply_nb, 0);
    assert_eq!(replies.count_for(thread.id), 0);
}
