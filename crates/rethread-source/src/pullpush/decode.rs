// Conversion of raw PullPush JSON objects into posts and replies

use rethread_types::{Post, Reply, Timestamp};
use serde_json::Value;

use crate::error::{Result, SourceError};

const DELETED_AUTHOR: &str = "[deleted]";

/// Reddit fullnames carry a kind prefix (`t1_`, `t3_`); ids in the store do not
pub(crate) fn strip_prefix(fullname: &str) -> &str {
    fullname
        .strip_prefix("t1_")
        .or_else(|| fullname.strip_prefix("t3_"))
        .unwrap_or(fullname)
}

fn field_str<'a>(raw: &'a Value, key: &str) -> Option<&'a str> {
    raw.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn required_id(raw: &Value) -> Result<String> {
    field_str(raw, "id")
        .map(str::to_string)
        .ok_or_else(|| SourceError::Decode(format!("item without id: {}", raw)))
}

/// `created_utc` arrives as an integer or a float depending on the archive shard
fn created_utc(raw: &Value, id: &str) -> Result<Timestamp> {
    match raw.get("created_utc") {
        Some(v) => v
            .as_i64()
            .or_else(|| v.as_f64().map(|f| f as i64))
            .or_else(|| v.as_str().and_then(|s| s.parse::<f64>().ok()).map(|f| f as i64))
            .ok_or_else(|| SourceError::Decode(format!("item {} has invalid created_utc: {}", id, v))),
        None => Err(SourceError::Decode(format!("item {} has no created_utc", id))),
    }
}

pub(crate) fn to_post(raw: Value) -> Result<Post> {
    let id = required_id(&raw)?;
    let created = created_utc(&raw, &id)?;
    let author = field_str(&raw, "author").unwrap_or(DELETED_AUTHOR).to_string();

    Ok(Post::new(id, author, created).with_payload(raw))
}

pub(crate) fn to_reply(raw: Value) -> Result<Reply> {
    let id = required_id(&raw)?;
    let created = created_utc(&raw, &id)?;
    let author = field_str(&raw, "author").unwrap_or(DELETED_AUTHOR).to_string();
    let thread_id = field_str(&raw, "link_id")
        .map(|link| strip_prefix(link).to_string())
        .ok_or_else(|| SourceError::Decode(format!("reply {} has no link_id", id)))?;
    let parent_id = field_str(&raw, "parent_id").map(|parent| strip_prefix(parent).to_string());

    Ok(Reply {
        id,
        author,
        created_utc: created,
        thread_id,
        parent_id,
        payload: raw,
    })
}
