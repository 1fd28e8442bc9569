//! 进程内后端
//!
//! 按顺序把命令应用到 `RedisStore` 上，回复的形状与真实服务端一致。
//! 第一条失败的命令使整批失败，之前的修改保持可见。

use async_trait::async_trait;
use indexmap::IndexMap;
use redisstore::{MemoryStore, RedisStore, ScoreBound, parse_score};
use std::sync::Arc;
use tracing::{debug, trace, warn};

use super::Backend;
use crate::command::{Command, Opcode, format_score};
use crate::error::{BackendError, BackendResult};
use crate::value::Value;

const DEFAULT_SCAN_COUNT: usize = 10;

#[derive(Clone)]
pub struct MemoryBackend {
    store: Arc<dyn RedisStore>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    /// 共享同一张表
    pub fn with_store(store: Arc<dyn RedisStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn RedisStore> {
        &self.store
    }

    fn apply(&self, cmd: &Command) -> BackendResult<Value> {
        let store = self.store.as_ref();
        let key = cmd.key.as_bytes();

        let value = match cmd.opcode {
            // ==================== 通用 ====================
            Opcode::Exists => {
                let keys = all_keys(cmd);
                int(store.exists(&keys))
            }
            Opcode::Del => {
                let keys = all_keys(cmd);
                int(store.del(&keys))
            }
            Opcode::Keys => strings(store.keys(key)),
            Opcode::Expire => {
                expect_args(cmd, 1)?;
                Value::Int(store.expire(key, int_arg(cmd, 0)?) as i64)
            }
            Opcode::Ttl => Value::Int(store.ttl(key)),

            // ==================== String ====================
            Opcode::Get => bulk(store.get(key)?),
            Opcode::Set => {
                expect_args(cmd, 1)?;
                store.set(key.to_vec(), bytes(&cmd.args[0]));
                ok()
            }
            Opcode::Incr => Value::Int(store.incrby(key, 1)?),

            // ==================== Set ====================
            Opcode::Sadd => {
                expect_args(cmd, 1)?;
                int(store.sadd(key, owned_args(cmd, 0))?)
            }
            Opcode::Srem => {
                expect_args(cmd, 1)?;
                int(store.srem(key, &borrowed_args(cmd, 0))?)
            }
            Opcode::Smembers => strings(store.smembers(key)?),
            Opcode::Sismember => {
                expect_args(cmd, 1)?;
                Value::Int(store.sismember(key, cmd.args[0].as_bytes())? as i64)
            }
            Opcode::Scard => int(store.scard(key)?),
            Opcode::Sscan => {
                let (cursor, count) = scan_args(cmd)?;
                let (next, page) = store.sscan(key, cursor, count)?;
                Value::List(vec![Value::Str(next.to_string()), strings(page)])
            }

            // ==================== Hash ====================
            Opcode::Hset => {
                expect_args(cmd, 2)?;
                let added = store.hset(key, bytes(&cmd.args[0]), bytes(&cmd.args[1]))?;
                Value::Int(added as i64)
            }
            Opcode::Hmset => {
                if cmd.args.is_empty() || cmd.args.len() % 2 != 0 {
                    return Err(wrong_arity(cmd));
                }
                let fvs = cmd
                    .args
                    .chunks(2)
                    .map(|pair| (bytes(&pair[0]), bytes(&pair[1])))
                    .collect();
                store.hmset(key, fvs)?;
                ok()
            }
            Opcode::Hget => {
                expect_args(cmd, 1)?;
                bulk(store.hget(key, cmd.args[0].as_bytes())?)
            }
            Opcode::Hdel => {
                expect_args(cmd, 1)?;
                int(store.hdel(key, &borrowed_args(cmd, 0))?)
            }
            Opcode::Hexists => {
                expect_args(cmd, 1)?;
                Value::Int(store.hexists(key, cmd.args[0].as_bytes())? as i64)
            }
            Opcode::Hgetall => {
                let pairs = store.hgetall(key)?;
                if pairs.is_empty() {
                    Value::Nil
                } else {
                    Value::Map(
                        pairs
                            .into_iter()
                            .map(|(f, v)| (text(f), Value::Str(text(v))))
                            .collect::<IndexMap<_, _>>(),
                    )
                }
            }
            Opcode::Hkeys => strings(store.hkeys(key)?),

            // ==================== Sorted Set ====================
            Opcode::Zadd => {
                expect_args(cmd, 2)?;
                if cmd.args.len() % 2 != 0 {
                    return Err(wrong_arity(cmd));
                }
                let mut added = 0;
                for pair in cmd.args.chunks(2) {
                    let score = parse_score(pair[0].as_bytes())?;
                    added += store.zadd(key, score, bytes(&pair[1]))? as i64;
                }
                Value::Int(added)
            }
            Opcode::Zincrby => {
                expect_args(cmd, 2)?;
                let delta = parse_score(cmd.args[0].as_bytes())?;
                Value::Str(format_score(store.zincrby(key, delta, bytes(&cmd.args[1]))?))
            }
            Opcode::Zrem => {
                expect_args(cmd, 1)?;
                int(store.zrem(key, &borrowed_args(cmd, 0))?)
            }
            Opcode::Zcard => int(store.zcard(key)?),
            Opcode::Zrank => {
                expect_args(cmd, 1)?;
                match store.zrank(key, cmd.args[0].as_bytes())? {
                    Some(rank) => int(rank),
                    None => Value::Nil,
                }
            }
            Opcode::Zscore => {
                expect_args(cmd, 1)?;
                match store.zscore(key, cmd.args[0].as_bytes())? {
                    Some(score) => Value::Str(format_score(score)),
                    None => Value::Nil,
                }
            }
            Opcode::Zrange | Opcode::Zrevrange => {
                expect_args(cmd, 2)?;
                let (start, stop) = (int_arg(cmd, 0)?, int_arg(cmd, 1)?);
                let entries = if cmd.opcode == Opcode::Zrange {
                    store.zrange(key, start, stop)?
                } else {
                    store.zrevrange(key, start, stop)?
                };
                scored(entries, with_scores(cmd, 2))
            }
            Opcode::Zrangebyscore => {
                expect_args(cmd, 2)?;
                let (min, max) = bounds(cmd)?;
                scored(store.zrangebyscore(key, min, max)?, with_scores(cmd, 2))
            }
            Opcode::Zremrangebyscore => {
                expect_args(cmd, 2)?;
                let (min, max) = bounds(cmd)?;
                int(store.zremrangebyscore(key, min, max)?)
            }
            Opcode::Zremrangebyrank => {
                expect_args(cmd, 2)?;
                int(store.zremrangebyrank(key, int_arg(cmd, 0)?, int_arg(cmd, 1)?)?)
            }
            Opcode::Zscan => {
                let (cursor, count) = scan_args(cmd)?;
                let (next, page) = store.zscan(key, cursor, count)?;
                Value::List(vec![Value::Str(next.to_string()), scored(page, true)])
            }

            // ==================== List ====================
            Opcode::Llen => int(store.llen(key)?),
            Opcode::Lrange => {
                expect_args(cmd, 2)?;
                strings(store.lrange(key, int_arg(cmd, 0)?, int_arg(cmd, 1)?)?)
            }
            Opcode::Lindex => {
                expect_args(cmd, 1)?;
                bulk(store.lindex(key, int_arg(cmd, 0)?)?)
            }
            Opcode::Lset => {
                expect_args(cmd, 2)?;
                store.lset(key, int_arg(cmd, 0)?, bytes(&cmd.args[1]))?;
                ok()
            }
            Opcode::Lpop => bulk(store.lpop(key)?),
            Opcode::Rpop => bulk(store.rpop(key)?),
            Opcode::Lpush => {
                expect_args(cmd, 1)?;
                int(store.lpush(key, owned_args(cmd, 0))?)
            }
            Opcode::Rpush => {
                expect_args(cmd, 1)?;
                int(store.rpush(key, owned_args(cmd, 0))?)
            }
            Opcode::Ltrim => {
                expect_args(cmd, 2)?;
                store.ltrim(key, int_arg(cmd, 0)?, int_arg(cmd, 1)?)?;
                ok()
            }
            Opcode::Lrem => {
                expect_args(cmd, 2)?;
                int(store.lrem(key, int_arg(cmd, 0)?, cmd.args[1].as_bytes())?)
            }
        };
        Ok(value)
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn execute(&self, commands: &[Command]) -> BackendResult<Vec<Value>> {
        debug!("Applying batch of {} commands in memory", commands.len());
        let mut results = Vec::with_capacity(commands.len());
        for cmd in commands {
            trace!("Applying {}", cmd);
            match self.apply(cmd) {
                Ok(value) => results.push(value),
                Err(e) => {
                    warn!("Command {} failed: {}", cmd, e);
                    return Err(e);
                }
            }
        }
        Ok(results)
    }
}

// ==================== 参数解析 ====================

fn wrong_arity(cmd: &Command) -> BackendError {
    BackendError::InvalidArgument(format!(
        "wrong number of arguments for '{}' command",
        cmd.opcode.as_str().to_lowercase()
    ))
}

fn expect_args(cmd: &Command, min: usize) -> BackendResult<()> {
    if cmd.args.len() < min {
        return Err(wrong_arity(cmd));
    }
    Ok(())
}

fn int_arg(cmd: &Command, i: usize) -> BackendResult<i64> {
    cmd.args
        .get(i)
        .ok_or_else(|| wrong_arity(cmd))?
        .parse::<i64>()
        .map_err(|_| {
            BackendError::InvalidArgument("value is not an integer or out of range".to_string())
        })
}

fn bounds(cmd: &Command) -> BackendResult<(ScoreBound, ScoreBound)> {
    Ok((
        ScoreBound::parse(cmd.args[0].as_bytes())?,
        ScoreBound::parse(cmd.args[1].as_bytes())?,
    ))
}

fn with_scores(cmd: &Command, from: usize) -> bool {
    cmd.args
        .iter()
        .skip(from)
        .any(|a| a.eq_ignore_ascii_case("WITHSCORES"))
}

/// SCAN 参数：cursor [COUNT n]
fn scan_args(cmd: &Command) -> BackendResult<(u64, usize)> {
    expect_args(cmd, 1)?;
    let cursor = cmd.args[0]
        .parse::<u64>()
        .map_err(|_| BackendError::InvalidArgument("invalid cursor".to_string()))?;
    let mut count = DEFAULT_SCAN_COUNT;
    let mut rest = cmd.args[1..].iter();
    while let Some(opt) = rest.next() {
        if opt.eq_ignore_ascii_case("COUNT") {
            count = rest
                .next()
                .and_then(|n| n.parse::<usize>().ok())
                .filter(|n| *n > 0)
                .ok_or_else(|| BackendError::InvalidArgument("syntax error".to_string()))?;
        }
    }
    Ok((cursor, count))
}

/// 多键命令：key 本身加上全部参数
fn all_keys(cmd: &Command) -> Vec<&[u8]> {
    std::iter::once(cmd.key.as_str())
        .chain(cmd.args.iter().map(String::as_str))
        .map(str::as_bytes)
        .collect()
}

fn owned_args(cmd: &Command, from: usize) -> Vec<Vec<u8>> {
    cmd.args[from..].iter().map(|a| bytes(a)).collect()
}

fn borrowed_args(cmd: &Command, from: usize) -> Vec<&[u8]> {
    cmd.args[from..].iter().map(|a| a.as_bytes()).collect()
}

fn bytes(s: &str) -> Vec<u8> {
    s.as_bytes().to_vec()
}

// ==================== 回复构造 ====================

fn text(raw: Vec<u8>) -> String {
    String::from_utf8_lossy(&raw).into_owned()
}

fn ok() -> Value {
    Value::Str("OK".to_string())
}

fn int(n: usize) -> Value {
    Value::Int(n as i64)
}

fn bulk(raw: Option<Vec<u8>>) -> Value {
    raw.map_or(Value::Nil, |r| Value::Str(text(r)))
}

fn strings(items: Vec<Vec<u8>>) -> Value {
    Value::List(items.into_iter().map(|r| Value::Str(text(r))).collect())
}

/// WITHSCORES 回复交错排列 member, score
fn scored(entries: Vec<(Vec<u8>, f64)>, with_scores: bool) -> Value {
    let mut out = Vec::with_capacity(entries.len() * if with_scores { 2 } else { 1 });
    for (member, score) in entries {
        out.push(Value::Str(text(member)));
        if with_scores {
            out.push(Value::Str(format_score(score)));
        }
    }
    Value::List(out)
}
