//! # Postgres adapters
//!
//! Maps the relational model onto the domain models. Enabled by the
//! `db-postgres` feature.
//!
//! The reply counter is moved with `SET reply_nb = reply_nb + 1`, a single
//! statement, so concurrent inserts never lose an increment.

use async_trait::async_trait;
use domains::{
    DomainError, MemberDirectory, Page, Reply, ReplyId, ReplyRepository, Result, Thread, ThreadFilter,
    ThreadFlag, ThreadId, ThreadPatch, ThreadRepository, User, UserId,
};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::info;
use uuid::Uuid;

const THREAD_COLUMNS: &str =
    "id, title, message, community, pinned, locked, featured, reply_nb, author, author_name, created_at";
const REPLY_COLUMNS: &str = "id, thread, message, author, author_name, created_at";

fn storage(err: sqlx::Error) -> DomainError {
    DomainError::Storage(err.to_string())
}

/// Opens a pool and brings the schema up to date.
pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(url)
        .await
        .map_err(storage)?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| DomainError::Storage(e.to_string()))?;
    info!(max_connections, "postgres pool ready");
    Ok(pool)
}

fn thread_from_row(row: &PgRow) -> std::result::Result<Thread, sqlx::Error> {
    let reply_nb: i64 = row.try_get("reply_nb")?;
    Ok(Thread {
        id: ThreadId::from_uuid(row.try_get("id")?),
        title: row.try_get("title")?,
        message: row.try_get("message")?,
        community: row.try_get("community")?,
        pinned: row.try_get("pinned")?,
        locked: row.try_get("locked")?,
        featured: row.try_get("featured")?,
        reply_nb: u64::try_from(reply_nb).unwrap_or_default(),
        author: UserId::from_uuid(row.try_get("author")?),
        author_name: row.try_get("author_name")?,
        created_at: row.try_get("created_at")?,
    })
}

fn reply_from_row(row: &PgRow) -> std::result::Result<Reply, sqlx::Error> {
    Ok(Reply {
        id: ReplyId::from_uuid(row.try_get("id")?),
        thread: ThreadId::from_uuid(row.try_get("thread")?),
        message: row.try_get("message")?,
        author: UserId::from_uuid(row.try_get("author")?),
        author_name: row.try_get("author_name")?,
        created_at: row.try_get("created_at")?,
    })
}

pub struct PgThreadRepository {
    pool: PgPool,
}

impl PgThreadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ThreadRepository for PgThreadRepository {
    async fn insert(&self, thread: &Thread) -> Result<()> {
        sqlx::query(&format!(
            "INSERT INTO threads ({THREAD_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"
        ))
        .bind(thread.id.as_uuid())
        .bind(&thread.title)
        .bind(&thread.message)
        .bind(&thread.community)
        .bind(thread.pinned)
        .bind(thread.locked)
        .bind(thread.featured)
        .bind(thread.reply_nb as i64)
        .bind(thread.author.as_uuid())
        .bind(&thread.author_name)
        .bind(thread.created_at)
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        Ok(())
    }

    async fn find_by_id(&self, id: ThreadId) -> Result<Option<Thread>> {
        let row = sqlx::query(&format!("SELECT {THREAD_COLUMNS} FROM threads WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;
        row.as_ref().map(thread_from_row).transpose().map_err(storage)
    }

    async fn apply_patch(&self, id: ThreadId, patch: &ThreadPatch) -> Result<()> {
        let result = sqlx::query(
            "UPDATE threads SET \
                title = COALESCE($2, title), \
                message = COALESCE($3, message), \
                community = COALESCE($4, community), \
                author = COALESCE($5, author), \
                author_name = COALESCE($6, author_name), \
                pinned = COALESCE($7, pinned), \
                locked = COALESCE($8, locked), \
                featured = COALESCE($9, featured) \
             WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(patch.title.as_deref())
        .bind(patch.message.as_deref())
        .bind(patch.community.as_deref())
        .bind(patch.author.map(|a| a.as_uuid()))
        .bind(patch.author_name.as_deref())
        .bind(patch.pinned)
        .bind(patch.locked)
        .bind(patch.featured)
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::thread_not_found(id));
        }
        Ok(())
    }

    async fn set_flag(&self, id: ThreadId, flag: ThreadFlag, value: bool) -> Result<()> {
        // `field()` only yields fixed column names.
        let result = sqlx::query(&format!("UPDATE threads SET {} = $2 WHERE id = $1", flag.field()))
            .bind(id.as_uuid())
            .bind(value)
            .execute(&self.pool)
            .await
            .map_err(storage)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::thread_not_found(id));
        }
        Ok(())
    }

    async fn increment_reply_nb(&self, id: ThreadId) -> Result<()> {
        let result = sqlx::query("UPDATE threads SET reply_nb = reply_nb + 1 WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(storage)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::thread_not_found(id));
        }
        Ok(())
    }

    async fn list(&self, filter: &ThreadFilter, page: Page) -> Result<Vec<Thread>> {
        let rows = sqlx::query(&format!(
            "SELECT {THREAD_COLUMNS} FROM threads \
             WHERE ($1::TEXT IS NULL OR community = $1) \
             ORDER BY pinned DESC, created_at DESC, id DESC \
             LIMIT $2 OFFSET $3"
        ))
        .bind(filter.community.as_deref())
        .bind(i64::from(page.limit))
        .bind(i64::from(page.offset))
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;
        rows.iter()
            .map(thread_from_row)
            .collect::<std::result::Result<_, _>>()
            .map_err(storage)
    }
}

pub struct PgReplyRepository {
    pool: PgPool,
}

impl PgReplyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReplyRepository for PgReplyRepository {
    async fn insert(&self, reply: &Reply) -> Result<()> {
        sqlx::query(&format!("INSERT INTO replies ({REPLY_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6)"))
            .bind(reply.id.as_uuid())
            .bind(reply.thread.as_uuid())
            .bind(&reply.message)
            .bind(reply.author.as_uuid())
            .bind(&reply.author_name)
            .bind(reply.created_at)
            .execute(&self.pool)
            .await
            .map_err(storage)?;
        Ok(())
    }

    async fn find_by_id(&self, id: ReplyId) -> Result<Option<Reply>> {
        let row = sqlx::query(&format!("SELECT {REPLY_COLUMNS} FROM replies WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;
        row.as_ref().map(reply_from_row).transpose().map_err(storage)
    }

    async fn update_message(&self, id: ReplyId, message: &str) -> Result<()> {
        let result = sqlx::query("UPDATE replies SET message = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(message)
            .execute(&self.pool)
            .await
            .map_err(storage)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::reply_not_found(id));
        }
        Ok(())
    }

    async fn remove(&self, id: ReplyId) -> Result<()> {
        let result = sqlx::query("DELETE FROM replies WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(storage)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::reply_not_found(id));
        }
        Ok(())
    }

    async fn list_by_thread(&self, thread: ThreadId, page: Page) -> Result<Vec<Reply>> {
        let rows = sqlx::query(&format!(
            "SELECT {REPLY_COLUMNS} FROM replies WHERE thread = $1 \
             ORDER BY created_at ASC, id ASC LIMIT $2 OFFSET $3"
        ))
        .bind(thread.as_uuid())
        .bind(i64::from(page.limit))
        .bind(i64::from(page.offset))
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;
        rows.iter()
            .map(reply_from_row)
            .collect::<std::result::Result<_, _>>()
            .map_err(storage)
    }
}

/// Reads the `members` table kept in sync by the host application.
pub struct PgMemberDirectory {
    pool: PgPool,
}

impl PgMemberDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts or replaces a member row. Used for configured seeds.
    pub async fn upsert(&self, user: &User, admin: bool, banned: bool) -> Result<()> {
        sqlx::query(
            "INSERT INTO members (id, username, is_admin, is_banned) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (id) DO UPDATE SET \
                username = EXCLUDED.username, \
                is_admin = EXCLUDED.is_admin, \
                is_banned = EXCLUDED.is_banned",
        )
        .bind(user.id.as_uuid())
        .bind(&user.username)
        .bind(admin)
        .bind(banned)
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        Ok(())
    }

    async fn flag(&self, id: UserId, column: &'static str) -> Result<bool> {
        let value: Option<bool> = sqlx::query_scalar(&format!("SELECT {column} FROM members WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;
        Ok(value.unwrap_or(false))
    }
}

#[async_trait]
impl MemberDirectory for PgMemberDirectory {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, username FROM members WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;
        row.map(|r| user_from_row(&r)).transpose().map_err(storage)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, username FROM members WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;
        row.map(|r| user_from_row(&r)).transpose().map_err(storage)
    }

    async fn is_admin(&self, id: UserId) -> Result<bool> {
        self.flag(id, "is_admin").await
    }

    async fn is_banned(&self, id: UserId) -> Result<bool> {
        self.flag(id, "is_banned").await
    }
}

fn user_from_row(row: &PgRow) -> std::result::Result<User, sqlx::Error> {
    let id: Uuid = row.try_get("id")?;
    Ok(User {
        id: UserId::from_uuid(id),
        username: row.try_get("username")?,
    })
}
