//! 内存存储实现
//!
//! 使用 HashMap 实现的内存存储，语义对齐 Redis：
//! 类型不匹配返回 WRONGTYPE，集合类结构清空后删除键。
//! Hash 与 Set 保持插入顺序，便于测试中得到确定的结果。

use indexmap::{IndexMap, IndexSet};
use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use std::hash::{DefaultHasher, Hash as _, Hasher};
use std::sync::Arc;
use tracing::debug;

use crate::glob::GlobPattern;
use crate::sorted_set::{normalize_range, ScoreBound, SortedSet};
use crate::traits::{RedisStore, StoreError, StoreResult};

/// Redis 值类型
#[derive(Debug, Clone)]
pub enum RedisValue {
    String(Vec<u8>),
    List(VecDeque<Vec<u8>>),
    Hash(IndexMap<Vec<u8>, Vec<u8>>),
    Set(IndexSet<Vec<u8>>),
    SortedSet(SortedSet),
}

impl RedisValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            RedisValue::String(_) => "string",
            RedisValue::List(_) => "list",
            RedisValue::Hash(_) => "hash",
            RedisValue::Set(_) => "set",
            RedisValue::SortedSet(_) => "zset",
        }
    }
}

type Data = HashMap<Vec<u8>, RedisValue>;

/// 某一种值类型在 RedisValue 中的槽位
trait Slot: Default + Sized {
    fn view(value: &RedisValue) -> Option<&Self>;
    fn view_mut(value: &mut RedisValue) -> Option<&mut Self>;
    fn wrap(self) -> RedisValue;
    fn is_empty(&self) -> bool;
}

macro_rules! impl_slot {
    ($ty:ty, $variant:ident) => {
        impl Slot for $ty {
            fn view(value: &RedisValue) -> Option<&Self> {
                match value {
                    RedisValue::$variant(inner) => Some(inner),
                    _ => None,
                }
            }

            fn view_mut(value: &mut RedisValue) -> Option<&mut Self> {
                match value {
                    RedisValue::$variant(inner) => Some(inner),
                    _ => None,
                }
            }

            fn wrap(self) -> RedisValue {
                RedisValue::$variant(self)
            }

            fn is_empty(&self) -> bool {
                <$ty>::is_empty(self)
            }
        }
    };
}

impl_slot!(Vec<u8>, String);
impl_slot!(VecDeque<Vec<u8>>, List);
impl_slot!(IndexMap<Vec<u8>, Vec<u8>>, Hash);
impl_slot!(IndexSet<Vec<u8>>, Set);
impl_slot!(SortedSet, SortedSet);

type List = VecDeque<Vec<u8>>;
type Hash = IndexMap<Vec<u8>, Vec<u8>>;
type Set = IndexSet<Vec<u8>>;

/// 只读查找：键不存在返回 None，类型不符返回 WrongType
fn lookup<'a, T: Slot>(data: &'a Data, key: &[u8]) -> StoreResult<Option<&'a T>> {
    match data.get(key) {
        None => Ok(None),
        Some(value) => T::view(value).map(Some).ok_or(StoreError::WrongType),
    }
}

fn lookup_mut<'a, T: Slot>(data: &'a mut Data, key: &[u8]) -> StoreResult<Option<&'a mut T>> {
    match data.get_mut(key) {
        None => Ok(None),
        Some(value) => T::view_mut(value).map(Some).ok_or(StoreError::WrongType),
    }
}

/// 写入前的查找，键不存在时创建空结构
fn lookup_or_insert<'a, T: Slot>(data: &'a mut Data, key: &[u8]) -> StoreResult<&'a mut T> {
    let value = data
        .entry(key.to_vec())
        .or_insert_with(|| T::default().wrap());
    T::view_mut(value).ok_or(StoreError::WrongType)
}

/// 集合类结构为空时删除键
fn drop_if_empty<T: Slot>(data: &mut Data, key: &[u8]) {
    if data.get(key).and_then(T::view).is_some_and(T::is_empty) {
        data.remove(key);
    }
}

fn parse_int(raw: &[u8]) -> StoreResult<i64> {
    std::str::from_utf8(raw)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| StoreError::InvalidArgument("value is not an integer or out of range".to_string()))
}

fn normalize_index(len: usize, index: i64) -> Option<usize> {
    let len = len as i64;
    let idx = if index < 0 { len + index } else { index };
    (0..len).contains(&idx).then_some(idx as usize)
}

/// 成员的游标位置，保留 0 作为起止游标
fn scan_hash(member: &[u8]) -> u64 {
    let mut hasher = DefaultHasher::new();
    member.hash(&mut hasher);
    hasher.finish() | 1
}

/// 按成员哈希分页：游标是下一页的起始哈希，遍历结束时为 0
///
/// 成员的位置只取决于它自己，删除或新增其他成员不会移动游标，
/// 整个遍历期间都存在的成员恰好返回一次。
fn page<T>(
    items: impl Iterator<Item = T>,
    member: impl Fn(&T) -> &[u8],
    cursor: u64,
    count: usize,
) -> (u64, Vec<T>) {
    let mut entries: Vec<(u64, T)> = items
        .map(|item| (scan_hash(member(&item)), item))
        .filter(|(hash, _)| *hash >= cursor)
        .collect();
    entries.sort_by_key(|(hash, _)| *hash);

    let mut split = count.max(1).min(entries.len());
    // 哈希相同的成员放进同一页，游标严格前进
    while split > 0 && split < entries.len() && entries[split].0 == entries[split - 1].0 {
        split += 1;
    }
    let next = entries.get(split).map_or(0, |(hash, _)| *hash);
    entries.truncate(split);
    (next, entries.into_iter().map(|(_, item)| item).collect())
}

/// 内存存储实现
#[derive(Clone)]
pub struct MemoryStore {
    data: Arc<RwLock<Data>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// 查看某个键的类型名，键不存在返回 None
    pub fn key_type(&self, key: &[u8]) -> Option<&'static str> {
        self.data.read().get(key).map(RedisValue::type_name)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RedisStore for MemoryStore {
    // ==================== String 操作 ====================

    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        let data = self.data.read();
        Ok(lookup::<Vec<u8>>(&data, key)?.cloned())
    }

    fn set(&self, key: Vec<u8>, value: Vec<u8>) {
        self.data.write().insert(key, RedisValue::String(value));
    }

    fn incrby(&self, key: &[u8], delta: i64) -> StoreResult<i64> {
        let mut data = self.data.write();
        let current = match lookup::<Vec<u8>>(&data, key)? {
            Some(raw) => parse_int(raw)?,
            None => 0,
        };
        let new_value = current.checked_add(delta).ok_or_else(|| {
            StoreError::InvalidArgument("increment or decrement would overflow".to_string())
        })?;
        data.insert(
            key.to_vec(),
            RedisValue::String(new_value.to_string().into_bytes()),
        );
        Ok(new_value)
    }

    // ==================== List 操作 ====================

    fn lpush(&self, key: &[u8], values: Vec<Vec<u8>>) -> StoreResult<usize> {
        let mut data = self.data.write();
        let list = lookup_or_insert::<List>(&mut data, key)?;
        // LPUSH a b c 的结果是 c b a
        for v in values {
            list.push_front(v);
        }
        let len = list.len();
        drop_if_empty::<List>(&mut data, key);
        Ok(len)
    }

    fn rpush(&self, key: &[u8], values: Vec<Vec<u8>>) -> StoreResult<usize> {
        let mut data = self.data.write();
        let list = lookup_or_insert::<List>(&mut data, key)?;
        list.extend(values);
        let len = list.len();
        drop_if_empty::<List>(&mut data, key);
        Ok(len)
    }

    fn lpop(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        let mut data = self.data.write();
        let popped = lookup_mut::<List>(&mut data, key)?.and_then(|list| list.pop_front());
        drop_if_empty::<List>(&mut data, key);
        Ok(popped)
    }

    fn rpop(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        let mut data = self.data.write();
        let popped = lookup_mut::<List>(&mut data, key)?.and_then(|list| list.pop_back());
        drop_if_empty::<List>(&mut data, key);
        Ok(popped)
    }

    fn lrange(&self, key: &[u8], start: i64, stop: i64) -> StoreResult<Vec<Vec<u8>>> {
        let data = self.data.read();
        let Some(list) = lookup::<List>(&data, key)? else {
            return Ok(vec![]);
        };
        Ok(match normalize_range(list.len(), start, stop) {
            Some((a, b)) => list.iter().skip(a).take(b - a + 1).cloned().collect(),
            None => vec![],
        })
    }

    fn llen(&self, key: &[u8]) -> StoreResult<usize> {
        let data = self.data.read();
        Ok(lookup::<List>(&data, key)?.map_or(0, |list| list.len()))
    }

    fn lindex(&self, key: &[u8], index: i64) -> StoreResult<Option<Vec<u8>>> {
        let data = self.data.read();
        Ok(lookup::<List>(&data, key)?
            .and_then(|list| normalize_index(list.len(), index).and_then(|i| list.get(i)))
            .cloned())
    }

    fn lset(&self, key: &[u8], index: i64, value: Vec<u8>) -> StoreResult<()> {
        let mut data = self.data.write();
        let list = lookup_mut::<List>(&mut data, key)?.ok_or(StoreError::KeyNotFound)?;
        let idx = normalize_index(list.len(), index).ok_or(StoreError::IndexOutOfRange)?;
        list[idx] = value;
        Ok(())
    }

    fn ltrim(&self, key: &[u8], start: i64, stop: i64) -> StoreResult<()> {
        let mut data = self.data.write();
        let Some(list) = lookup_mut::<List>(&mut data, key)? else {
            return Ok(());
        };
        match normalize_range(list.len(), start, stop) {
            Some((a, b)) => {
                list.truncate(b + 1);
                list.drain(..a);
            }
            None => list.clear(),
        }
        drop_if_empty::<List>(&mut data, key);
        Ok(())
    }

    fn lrem(&self, key: &[u8], count: i64, value: &[u8]) -> StoreResult<usize> {
        let mut data = self.data.write();
        let Some(list) = lookup_mut::<List>(&mut data, key)? else {
            return Ok(0);
        };
        let limit = if count == 0 {
            usize::MAX
        } else {
            count.unsigned_abs() as usize
        };
        let matching = (0..list.len()).filter(|&i| list[i].as_slice() == value);
        let doomed: Vec<usize> = if count < 0 {
            matching.rev().take(limit).collect()
        } else {
            matching.take(limit).collect()
        };

        let mut idx = 0;
        list.retain(|_| {
            let keep = !doomed.contains(&idx);
            idx += 1;
            keep
        });
        drop_if_empty::<List>(&mut data, key);
        Ok(doomed.len())
    }

    // ==================== Hash 操作 ====================

    fn hget(&self, key: &[u8], field: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        let data = self.data.read();
        Ok(lookup::<Hash>(&data, key)?.and_then(|h| h.get(field)).cloned())
    }

    fn hset(&self, key: &[u8], field: Vec<u8>, value: Vec<u8>) -> StoreResult<bool> {
        let mut data = self.data.write();
        let hash = lookup_or_insert::<Hash>(&mut data, key)?;
        Ok(hash.insert(field, value).is_none())
    }

    fn hmset(&self, key: &[u8], fvs: Vec<(Vec<u8>, Vec<u8>)>) -> StoreResult<()> {
        let mut data = self.data.write();
        let hash = lookup_or_insert::<Hash>(&mut data, key)?;
        hash.extend(fvs);
        drop_if_empty::<Hash>(&mut data, key);
        Ok(())
    }

    fn hdel(&self, key: &[u8], fields: &[&[u8]]) -> StoreResult<usize> {
        let mut data = self.data.write();
        let removed = match lookup_mut::<Hash>(&mut data, key)? {
            Some(hash) => fields
                .iter()
                .filter(|f| hash.shift_remove(**f).is_some())
                .count(),
            None => 0,
        };
        drop_if_empty::<Hash>(&mut data, key);
        Ok(removed)
    }

    fn hexists(&self, key: &[u8], field: &[u8]) -> StoreResult<bool> {
        let data = self.data.read();
        Ok(lookup::<Hash>(&data, key)?.is_some_and(|h| h.contains_key(field)))
    }

    fn hgetall(&self, key: &[u8]) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let data = self.data.read();
        Ok(lookup::<Hash>(&data, key)?
            .map(|h| h.iter().map(|(f, v)| (f.clone(), v.clone())).collect())
            .unwrap_or_default())
    }

    fn hkeys(&self, key: &[u8]) -> StoreResult<Vec<Vec<u8>>> {
        let data = self.data.read();
        Ok(lookup::<Hash>(&data, key)?
            .map(|h| h.keys().cloned().collect())
            .unwrap_or_default())
    }

    // ==================== Set 操作 ====================

    fn sadd(&self, key: &[u8], members: Vec<Vec<u8>>) -> StoreResult<usize> {
        let mut data = self.data.write();
        let set = lookup_or_insert::<Set>(&mut data, key)?;
        let added = members.into_iter().filter(|m| set.insert(m.clone())).count();
        drop_if_empty::<Set>(&mut data, key);
        Ok(added)
    }

    fn srem(&self, key: &[u8], members: &[&[u8]]) -> StoreResult<usize> {
        let mut data = self.data.write();
        let removed = match lookup_mut::<Set>(&mut data, key)? {
            Some(set) => members.iter().filter(|m| set.shift_remove(**m)).count(),
            None => 0,
        };
        drop_if_empty::<Set>(&mut data, key);
        Ok(removed)
    }

    fn smembers(&self, key: &[u8]) -> StoreResult<Vec<Vec<u8>>> {
        let data = self.data.read();
        Ok(lookup::<Set>(&data, key)?
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default())
    }

    fn sismember(&self, key: &[u8], member: &[u8]) -> StoreResult<bool> {
        let data = self.data.read();
        Ok(lookup::<Set>(&data, key)?.is_some_and(|s| s.contains(member)))
    }

    fn scard(&self, key: &[u8]) -> StoreResult<usize> {
        let data = self.data.read();
        Ok(lookup::<Set>(&data, key)?.map_or(0, |s| s.len()))
    }

    fn sscan(&self, key: &[u8], cursor: u64, count: usize) -> StoreResult<(u64, Vec<Vec<u8>>)> {
        let data = self.data.read();
        Ok(match lookup::<Set>(&data, key)? {
            Some(set) => page(set.iter().cloned(), |m| m.as_slice(), cursor, count),
            None => (0, vec![]),
        })
    }

    // ==================== Sorted Set 操作 ====================

    fn zadd(&self, key: &[u8], score: f64, member: Vec<u8>) -> StoreResult<bool> {
        let mut data = self.data.write();
        Ok(lookup_or_insert::<SortedSet>(&mut data, key)?.put(member, score))
    }

    fn zincrby(&self, key: &[u8], delta: f64, member: Vec<u8>) -> StoreResult<f64> {
        let mut data = self.data.write();
        let result = lookup_or_insert::<SortedSet>(&mut data, key)?.incr(member, delta);
        drop_if_empty::<SortedSet>(&mut data, key);
        result
    }

    fn zrem(&self, key: &[u8], members: &[&[u8]]) -> StoreResult<usize> {
        let mut data = self.data.write();
        let removed = match lookup_mut::<SortedSet>(&mut data, key)? {
            Some(z) => members.iter().filter(|m| z.remove(m)).count(),
            None => 0,
        };
        drop_if_empty::<SortedSet>(&mut data, key);
        Ok(removed)
    }

    fn zcard(&self, key: &[u8]) -> StoreResult<usize> {
        let data = self.data.read();
        Ok(lookup::<SortedSet>(&data, key)?.map_or(0, |z| z.len()))
    }

    fn zrank(&self, key: &[u8], member: &[u8]) -> StoreResult<Option<usize>> {
        let data = self.data.read();
        Ok(lookup::<SortedSet>(&data, key)?.and_then(|z| z.rank(member)))
    }

    fn zscore(&self, key: &[u8], member: &[u8]) -> StoreResult<Option<f64>> {
        let data = self.data.read();
        Ok(lookup::<SortedSet>(&data, key)?.and_then(|z| z.score(member)))
    }

    fn zrange(&self, key: &[u8], start: i64, stop: i64) -> StoreResult<Vec<(Vec<u8>, f64)>> {
        let data = self.data.read();
        Ok(lookup::<SortedSet>(&data, key)?
            .map(|z| z.range(start, stop))
            .unwrap_or_default())
    }

    fn zrevrange(&self, key: &[u8], start: i64, stop: i64) -> StoreResult<Vec<(Vec<u8>, f64)>> {
        let data = self.data.read();
        Ok(lookup::<SortedSet>(&data, key)?
            .map(|z| z.rev_range(start, stop))
            .unwrap_or_default())
    }

    fn zrangebyscore(
        &self,
        key: &[u8],
        min: ScoreBound,
        max: ScoreBound,
    ) -> StoreResult<Vec<(Vec<u8>, f64)>> {
        let data = self.data.read();
        Ok(lookup::<SortedSet>(&data, key)?
            .map(|z| z.range_by_score(min, max))
            .unwrap_or_default())
    }

    fn zremrangebyscore(&self, key: &[u8], min: ScoreBound, max: ScoreBound) -> StoreResult<usize> {
        let mut data = self.data.write();
        let removed = lookup_mut::<SortedSet>(&mut data, key)?
            .map_or(0, |z| z.remove_range_by_score(min, max));
        drop_if_empty::<SortedSet>(&mut data, key);
        Ok(removed)
    }

    fn zremrangebyrank(&self, key: &[u8], start: i64, stop: i64) -> StoreResult<usize> {
        let mut data = self.data.write();
        let removed = lookup_mut::<SortedSet>(&mut data, key)?
            .map_or(0, |z| z.remove_range_by_rank(start, stop));
        drop_if_empty::<SortedSet>(&mut data, key);
        Ok(removed)
    }

    fn zscan(
        &self,
        key: &[u8],
        cursor: u64,
        count: usize,
    ) -> StoreResult<(u64, Vec<(Vec<u8>, f64)>)> {
        let data = self.data.read();
        Ok(match lookup::<SortedSet>(&data, key)? {
            Some(z) => page(z.ascending().cloned(), |(m, _)| m.as_slice(), cursor, count),
            None => (0, vec![]),
        })
    }

    // ==================== 通用操作 ====================

    fn del(&self, keys: &[&[u8]]) -> usize {
        let mut data = self.data.write();
        keys.iter().filter(|k| data.remove(**k).is_some()).count()
    }

    fn exists(&self, keys: &[&[u8]]) -> usize {
        let data = self.data.read();
        keys.iter().filter(|k| data.contains_key(**k)).count()
    }

    fn keys(&self, pattern: &[u8]) -> Vec<Vec<u8>> {
        let glob = GlobPattern::new(pattern);
        let data = self.data.read();
        data.keys().filter(|k| glob.matches(k)).cloned().collect()
    }

    fn ttl(&self, _key: &[u8]) -> i64 {
        -1
    }

    fn expire(&self, key: &[u8], ttl_secs: i64) -> bool {
        let exists = self.data.read().contains_key(key);
        if exists {
            debug!(ttl_secs, "EXPIRE accepted without effect");
        }
        exists
    }

    fn dbsize(&self) -> usize {
        self.data.read().len()
    }

    fn flushdb(&self) {
        let mut data = self.data.write();
        debug!(keys = data.len(), "Flushing in-memory store");
        data.clear();
    }
}
