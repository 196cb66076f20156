//! Shared fixtures for the service unit tests.

use chrono::Utc;
use domains::{Member, MockMemberDirectory, Thread, ThreadId, User, UserId};

fn user(name: &str) -> User {
    User {
        id: UserId::new(),
        username: name.to_string(),
    }
}

/// A fixed set of users with every role combination the rules care about.
#[derive(Clone)]
pub(crate) struct Cast {
    pub alice: User,
    pub bob: User,
    pub admin: User,
    pub banned: User,
    pub banned_admin: User,
}

impl Cast {
    pub fn new() -> Self {
        Self {
            alice: user("alice"),
            bob: user("bob"),
            admin: user("admin"),
            banned: user("banned"),
            banned_admin: user("banned_admin"),
        }
    }

    pub fn users(&self) -> Vec<User> {
        vec![
            self.alice.clone(),
            self.bob.clone(),
            self.admin.clone(),
            self.banned.clone(),
            self.banned_admin.clone(),
        ]
    }

    pub fn is_admin(&self, id: UserId) -> bool {
        id == self.admin.id || id == self.banned_admin.id
    }

    pub fn is_banned(&self, id: UserId) -> bool {
        id == self.banned.id || id == self.banned_admin.id
    }

    pub fn member(&self, user: &User) -> Member {
        Member {
            user: user.clone(),
            is_admin: self.is_admin(user.id),
            is_banned: self.is_banned(user.id),
        }
    }
}

/// A directory mock answering for every member of `cast`.
pub(crate) fn directory(cast: &Cast) -> MockMemberDirectory {
    let mut dir = MockMemberDirectory::new();

    let users = cast.users();
    dir.expect_find_by_id()
        .returning(move |id| Ok(users.iter().find(|u| u.id == id).cloned()));

    let users = cast.users();
    dir.expect_find_by_username()
        .returning(move |name| Ok(users.iter().find(|u| u.username == name).cloned()));

    let c = cast.clone();
    dir.expect_is_admin().returning(move |id| Ok(c.is_admin(id)));

    let c = cast.clone();
    dir.expect_is_banned().returning(move |id| Ok(c.is_banned(id)));

    dir
}

pub(crate) fn thread_by(author: &User) -> Thread {
    Thread {
        id: ThreadId::new(),
        title: "Hello World Title".into(),
        message: "body text".into(),
        community: "general".into(),
        pinned: false,
        locked: false,
        featured: false,
        reply_nb: 0,
        author: author.id,
        author_name: author.username.clone(),
        created_at: Utc::now(),
    }
}
