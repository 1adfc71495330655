//! REST store client
//!
//! Talks to a Redis-compatible store over its HTTP command endpoint
//! (Upstash-style): every command is a `POST` of a JSON array
//! `["CMD", "arg", ...]` with a bearer token, answered by
//! `{"result": ...}` or `{"error": "..."}`.
//!
//! ## Command Mapping
//!
//! | Operation | Command |
//! |-----------|---------|
//! | list_all_keys | `KEYS *` |
//! | scan | `SCAN cursor COUNT n` |
//! | type_of | `TYPE` |
//! | get_all_hash_fields | `HGETALL` (flat field/value pairs) |
//! | get_sorted_set_range_with_scores | `ZRANGE key 0 -1 WITHSCORES` |
//! | get_full_list | `LRANGE key 0 -1` |
//! | set_if_absent | `SET key value NX PX ms` |
//! | delete_if_equals | `EVAL` compare-and-delete script |

use crate::error::{StoreError, StoreResult};
use crate::traits::{KeyValueStore, ScanPage};
use async_trait::async_trait;
use kvsnap_core::{format_score, ScoredMember, StoreType};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const COMPARE_AND_DELETE: &str =
    "if redis.call('get', KEYS[1]) == ARGV[1] then return redis.call('del', KEYS[1]) else return 0 end";

#[derive(Debug, Deserialize)]
struct CommandReply {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

/// [`KeyValueStore`] over a REST command endpoint
pub struct RestStore {
    client: reqwest::Client,
    url: String,
    token: String,
}

impl std::fmt::Debug for RestStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestStore")
            .field("url", &self.url)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl RestStore {
    /// Create a client for `url` authenticated with `token`
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> StoreResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("kvsnap/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            url: url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    /// Endpoint URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Execute one command and return its `result`
    pub async fn command(&self, args: Vec<String>) -> StoreResult<Value> {
        let command = args.first().cloned().unwrap_or_default();
        let key = args.get(1).cloned().unwrap_or_default();
        debug!(command = %command, "store command");

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&args)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(StoreError::Unauthorized {
                status: status.as_u16(),
            });
        }

        let text = response.text().await?;
        let reply: CommandReply = serde_json::from_str(&text).map_err(|_| {
            StoreError::protocol(
                &command,
                format!("HTTP {}: {}", status.as_u16(), truncate(&text)),
            )
        })?;

        if let Some(message) = reply.error {
            return Err(classify_error(command, key, message));
        }
        if !status.is_success() {
            return Err(StoreError::Command {
                command,
                message: format!("HTTP {}", status.as_u16()),
            });
        }
        Ok(reply.result.unwrap_or(Value::Null))
    }
}

fn classify_error(command: String, key: String, message: String) -> StoreError {
    let lower = message.to_ascii_lowercase();
    if message.starts_with("WRONGTYPE") {
        StoreError::WrongType { key }
    } else if lower.contains("unknown command")
        || lower.contains("not supported")
        || lower.contains("disabled")
    {
        StoreError::Unsupported { command }
    } else {
        StoreError::Command { command, message }
    }
}

fn truncate(text: &str) -> String {
    const MAX: usize = 200;
    match text.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

fn args<const N: usize>(parts: [&str; N]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

fn reply_string(command: &str, value: &Value) -> StoreResult<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(StoreError::protocol(
            command,
            format!("expected string, got {other}"),
        )),
    }
}

fn reply_strings(command: &str, value: &Value) -> StoreResult<Vec<String>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items.iter().map(|v| reply_string(command, v)).collect(),
        other => Err(StoreError::protocol(
            command,
            format!("expected array, got {other}"),
        )),
    }
}

fn reply_pairs(command: &str, value: &Value) -> StoreResult<Vec<(String, String)>> {
    let flat = reply_strings(command, value)?;
    if flat.len() % 2 != 0 {
        return Err(StoreError::protocol(
            command,
            format!("odd number of elements ({})", flat.len()),
        ));
    }
    let mut pairs = Vec::with_capacity(flat.len() / 2);
    let mut iter = flat.into_iter();
    while let (Some(a), Some(b)) = (iter.next(), iter.next()) {
        pairs.push((a, b));
    }
    Ok(pairs)
}

fn reply_integer(command: &str, value: &Value) -> StoreResult<i64> {
    value
        .as_i64()
        .ok_or_else(|| StoreError::protocol(command, format!("expected integer, got {value}")))
}

fn scan_command(cursor: &str, count: usize) -> Vec<String> {
    let count = count.to_string();
    args(["SCAN", cursor, "COUNT", count.as_str()])
}

fn scan_reply(reply: &Value) -> StoreResult<ScanPage> {
    match reply.as_array().map(Vec::as_slice) {
        Some([next, keys]) => Ok(ScanPage {
            cursor: reply_string("SCAN", next)?,
            keys: reply_strings("SCAN", keys)?,
        }),
        _ => Err(StoreError::protocol(
            "SCAN",
            format!("expected [cursor, keys], got {reply}"),
        )),
    }
}

fn hset_command(key: &str, fields: &BTreeMap<String, String>) -> Vec<String> {
    let mut cmd = args(["HSET", key]);
    for (field, value) in fields {
        cmd.push(field.clone());
        cmd.push(value.clone());
    }
    cmd
}

/// `ZADD key score member [score member ...]`
fn zadd_command(key: &str, members: &[ScoredMember]) -> Vec<String> {
    let mut cmd = args(["ZADD", key]);
    for m in members {
        cmd.push(format_score(m.score));
        cmd.push(m.member.clone());
    }
    cmd
}

fn set_nx_command(key: &str, value: &str, ttl: Duration) -> Vec<String> {
    let millis = ttl.as_millis().max(1).to_string();
    args(["SET", key, value, "NX", "PX", millis.as_str()])
}

fn compare_and_delete_command(key: &str, expected: &str) -> Vec<String> {
    args(["EVAL", COMPARE_AND_DELETE, "1", key, expected])
}

#[async_trait]
impl KeyValueStore for RestStore {
    async fn list_all_keys(&self) -> StoreResult<Vec<String>> {
        let reply = self.command(args(["KEYS", "*"])).await?;
        reply_strings("KEYS", &reply)
    }

    async fn scan(&self, cursor: &str, count: usize) -> StoreResult<ScanPage> {
        let reply = self.command(scan_command(cursor, count)).await?;
        scan_reply(&reply)
    }

    async fn type_of(&self, key: &str) -> StoreResult<StoreType> {
        let reply = self.command(args(["TYPE", key])).await?;
        Ok(StoreType::parse(&reply_string("TYPE", &reply)?))
    }

    async fn get_string(&self, key: &str) -> StoreResult<Option<String>> {
        match self.command(args(["GET", key])).await? {
            Value::Null => Ok(None),
            other => reply_string("GET", &other).map(Some),
        }
    }

    async fn get_all_hash_fields(&self, key: &str) -> StoreResult<BTreeMap<String, String>> {
        let reply = self.command(args(["HGETALL", key])).await?;
        // Some endpoints answer HGETALL with an object instead of flat pairs
        if let Value::Object(fields) = &reply {
            return fields
                .iter()
                .map(|(f, v)| Ok((f.clone(), reply_string("HGETALL", v)?)))
                .collect();
        }
        Ok(reply_pairs("HGETALL", &reply)?.into_iter().collect())
    }

    async fn get_all_set_members(&self, key: &str) -> StoreResult<Vec<String>> {
        let reply = self.command(args(["SMEMBERS", key])).await?;
        reply_strings("SMEMBERS", &reply)
    }

    async fn get_sorted_set_range_with_scores(&self, key: &str) -> StoreResult<Vec<ScoredMember>> {
        let reply = self
            .command(args(["ZRANGE", key, "0", "-1", "WITHSCORES"]))
            .await?;
        reply_pairs("ZRANGE", &reply)?
            .into_iter()
            .map(|(member, score)| {
                let score: f64 = score.parse().map_err(|_| {
                    StoreError::protocol("ZRANGE", format!("invalid score {score:?}"))
                })?;
                Ok(ScoredMember { member, score })
            })
            .collect()
    }

    async fn get_full_list(&self, key: &str) -> StoreResult<Vec<String>> {
        let reply = self.command(args(["LRANGE", key, "0", "-1"])).await?;
        reply_strings("LRANGE", &reply)
    }

    async fn set_string(&self, key: &str, value: &str) -> StoreResult<()> {
        self.command(args(["SET", key, value])).await?;
        Ok(())
    }

    async fn delete_key(&self, key: &str) -> StoreResult<bool> {
        let reply = self.command(args(["DEL", key])).await?;
        Ok(reply_integer("DEL", &reply)? > 0)
    }

    async fn set_hash_fields(
        &self,
        key: &str,
        fields: &BTreeMap<String, String>,
    ) -> StoreResult<()> {
        self.command(hset_command(key, fields)).await?;
        Ok(())
    }

    async fn add_set_members(&self, key: &str, members: &[String]) -> StoreResult<()> {
        let mut cmd = args(["SADD", key]);
        cmd.extend(members.iter().cloned());
        self.command(cmd).await?;
        Ok(())
    }

    async fn add_sorted_set_members(
        &self,
        key: &str,
        members: &[ScoredMember],
    ) -> StoreResult<()> {
        self.command(zadd_command(key, members)).await?;
        Ok(())
    }

    async fn append_list_items(&self, key: &str, items: &[String]) -> StoreResult<()> {
        let mut cmd = args(["RPUSH", key]);
        cmd.extend(items.iter().cloned());
        self.command(cmd).await?;
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<bool> {
        let reply = self.command(set_nx_command(key, value, ttl)).await?;
        Ok(!reply.is_null())
    }

    async fn delete_if_equals(&self, key: &str, expected: &str) -> StoreResult<bool> {
        let reply = self
            .command(compare_and_delete_command(key, expected))
            .await?;
        Ok(reply_integer("EVAL", &reply)? > 0)
    }
}
