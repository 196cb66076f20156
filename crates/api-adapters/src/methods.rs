//! Method table: maps RPC method names onto forum service calls.

use crate::rpc::{parse_params, to_json, RpcError};
use domains::{
    AdminNewThread, AdminThreadUpdate, Caller, NewReply, NewThread, Page, ReplyEdit, ReplyId, ThreadFilter,
    ThreadId, ThreadUpdate,
};
use serde::Deserialize;
use serde_json::Value;
use services::Forum;

pub const INSERT_THREAD: &str = "Threads.methods.insertThread";
pub const UPDATE_THREAD: &str = "Threads.methods.updateThread";
pub const ADMIN_INSERT_THREAD: &str = "Threads.methods.adminInsertThread";
pub const ADMIN_UPDATE_THREAD: &str = "Threads.methods.adminUpdateThread";
pub const THREAD_PIN_UPDATE: &str = "Threads.methods.threadPinUpdate";
pub const THREAD_LOCK_UPDATE: &str = "Threads.methods.threadLockUpdate";
pub const THREAD_FEATURED_UPDATE: &str = "Threads.methods.threadFeaturedUpdate";
pub const INSERT_REPLY: &str = "Replies.methods.insertReply";
pub const EDIT_REPLY: &str = "Replies.methods.editReply";
pub const GET_THREAD: &str = "Threads.queries.get";
pub const LIST_THREADS: &str = "Threads.queries.list";
pub const LIST_REPLIES: &str = "Replies.queries.list";

/// Every method name the dispatcher answers.
pub const METHODS: &[&str] = &[
    INSERT_THREAD,
    UPDATE_THREAD,
    ADMIN_INSERT_THREAD,
    ADMIN_UPDATE_THREAD,
    THREAD_PIN_UPDATE,
    THREAD_LOCK_UPDATE,
    THREAD_FEATURED_UPDATE,
    INSERT_REPLY,
    EDIT_REPLY,
    GET_THREAD,
    LIST_THREADS,
    LIST_REPLIES,
];

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct UpdateThreadParams {
    #[serde(rename = "_id")]
    id: ThreadId,
    update: ThreadUpdate,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct AdminUpdateThreadParams {
    #[serde(rename = "_id")]
    id: ThreadId,
    update: AdminThreadUpdate,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct PinParams {
    #[serde(rename = "_id")]
    id: ThreadId,
    pin_value: bool,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct LockParams {
    #[serde(rename = "_id")]
    id: ThreadId,
    lock_value: bool,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct FeaturedParams {
    #[serde(rename = "_id")]
    id: ThreadId,
    featured_value: bool,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct EditReplyParams {
    #[serde(rename = "_id")]
    id: ReplyId,
    message: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct GetThreadParams {
    #[serde(rename = "_id")]
    id: ThreadId,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields, default)]
struct ListThreadsParams {
    community: Option<String>,
    limit: Option<u32>,
    offset: Option<u32>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ListRepliesParams {
    thread: ThreadId,
    limit: Option<u32>,
    offset: Option<u32>,
}

/// Runs `method` for `caller`. Domain failures come back as their RPC
/// counterparts; malformed params are `INVALID_PARAMS`.
pub async fn dispatch(forum: &Forum, caller: &Caller, method: &str, params: Value) -> Result<Value, RpcError> {
    match method {
        INSERT_THREAD => {
            let input: NewThread = parse_params(params)?;
            to_json(forum.threads.insert_thread(caller, input).await?)
        }
        UPDATE_THREAD => {
            let p: UpdateThreadParams = parse_params(params)?;
            to_json(forum.threads.update_thread(caller, p.id, p.update).await?)
        }
        ADMIN_INSERT_THREAD => {
            let input: AdminNewThread = parse_params(params)?;
            to_json(forum.threads.admin_insert_thread(caller, input).await?)
        }
        ADMIN_UPDATE_THREAD => {
            let p: AdminUpdateThreadParams = parse_params(params)?;
            to_json(forum.threads.admin_update_thread(caller, p.id, p.update).await?)
        }
        THREAD_PIN_UPDATE => {
            let p: PinParams = parse_params(params)?;
            to_json(forum.threads.thread_pin_update(caller, p.id, p.pin_value).await?)
        }
        THREAD_LOCK_UPDATE => {
            let p: LockParams = parse_params(params)?;
            to_json(forum.threads.thread_lock_update(caller, p.id, p.lock_value).await?)
        }
        THREAD_FEATURED_UPDATE => {
            let p: FeaturedParams = parse_params(params)?;
            to_json(forum.threads.thread_featured_update(caller, p.id, p.featured_value).await?)
        }
        INSERT_REPLY => {
            let input: NewReply = parse_params(params)?;
            to_json(forum.replies.insert_reply(caller, input).await?)
        }
        EDIT_REPLY => {
            let p: EditReplyParams = parse_params(params)?;
            let edit = ReplyEdit { message: p.message };
            to_json(forum.replies.edit_reply(caller, p.id, edit).await?)
        }
        GET_THREAD => {
            let p: GetThreadParams = parse_params(params)?;
            to_json(forum.threads.get_thread(p.id).await?)
        }
        LIST_THREADS => {
            let p: ListThreadsParams = if params.is_null() {
                ListThreadsParams::default()
            } else {
                parse_params(params)?
            };
            let filter = ThreadFilter { community: p.community };
            to_json(forum.threads.list_threads(&filter, Page::new(p.limit, p.offset)).await?)
        }
        LIST_REPLIES => {
            let p: ListRepliesParams = parse_params(params)?;
            to_json(forum.replies.list_replies(p.thread, Page::new(p.limit, p.offset)).await?)
        }
        _ => Err(RpcError::method_not_found(method)),
    }
}
