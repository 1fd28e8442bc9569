//! Redis 存储 trait 定义

use crate::sorted_set::ScoreBound;

/// Redis 存储错误，Display 与 Redis 服务端的错误文本保持一致
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// 键不存在（LSET 等要求键存在的操作）
    KeyNotFound,
    /// 类型不匹配（如对 String 执行 List 操作）
    WrongType,
    /// 索引越界
    IndexOutOfRange,
    /// 无效参数
    InvalidArgument(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::KeyNotFound => write!(f, "ERR no such key"),
            StoreError::WrongType => {
                write!(f, "WRONGTYPE Operation against a key holding the wrong kind of value")
            }
            StoreError::IndexOutOfRange => write!(f, "ERR index out of range"),
            StoreError::InvalidArgument(msg) => write!(f, "ERR {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

pub type StoreResult<T> = Result<T, StoreError>;

/// Redis 存储抽象 trait
///
/// 语义对齐 Redis：读取不存在的键返回空值，集合类结构在最后一个元素
/// 被删除时连同键一起删除。过期时间不建模。
pub trait RedisStore: Send + Sync {
    // ==================== String 操作 ====================

    /// GET: 获取字符串值
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    /// SET: 设置字符串值（覆盖任意类型）
    fn set(&self, key: Vec<u8>, value: Vec<u8>);

    /// INCRBY: 值不存在时视为 0，不是整数时返回 InvalidArgument
    fn incrby(&self, key: &[u8], delta: i64) -> StoreResult<i64>;

    // ==================== List 操作 ====================

    /// LPUSH: 依次插入到左侧，返回新长度
    fn lpush(&self, key: &[u8], values: Vec<Vec<u8>>) -> StoreResult<usize>;

    /// RPUSH: 依次追加到右侧，返回新长度
    fn rpush(&self, key: &[u8], values: Vec<Vec<u8>>) -> StoreResult<usize>;

    fn lpop(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    fn rpop(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    /// LRANGE: 闭区间，支持负索引
    fn lrange(&self, key: &[u8], start: i64, stop: i64) -> StoreResult<Vec<Vec<u8>>>;

    fn llen(&self, key: &[u8]) -> StoreResult<usize>;

    fn lindex(&self, key: &[u8], index: i64) -> StoreResult<Option<Vec<u8>>>;

    /// LSET: 键不存在返回 KeyNotFound，越界返回 IndexOutOfRange
    fn lset(&self, key: &[u8], index: i64, value: Vec<u8>) -> StoreResult<()>;

    /// LTRIM: 只保留闭区间内的元素，区间为空时删除键
    fn ltrim(&self, key: &[u8], start: i64, stop: i64) -> StoreResult<()>;

    /// LREM: count > 0 从头删除，count < 0 从尾删除，0 删除全部
    fn lrem(&self, key: &[u8], count: i64, value: &[u8]) -> StoreResult<usize>;

    // ==================== Hash 操作 ====================

    fn hget(&self, key: &[u8], field: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    /// HSET: 返回字段是否为新增
    fn hset(&self, key: &[u8], field: Vec<u8>, value: Vec<u8>) -> StoreResult<bool>;

    fn hmset(&self, key: &[u8], fvs: Vec<(Vec<u8>, Vec<u8>)>) -> StoreResult<()>;

    fn hdel(&self, key: &[u8], fields: &[&[u8]]) -> StoreResult<usize>;

    fn hexists(&self, key: &[u8], field: &[u8]) -> StoreResult<bool>;

    /// HGETALL: 按插入顺序返回
    fn hgetall(&self, key: &[u8]) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>>;

    fn hkeys(&self, key: &[u8]) -> StoreResult<Vec<Vec<u8>>>;

    // ==================== Set 操作 ====================

    /// SADD: 返回新增成员数
    fn sadd(&self, key: &[u8], members: Vec<Vec<u8>>) -> StoreResult<usize>;

    fn srem(&self, key: &[u8], members: &[&[u8]]) -> StoreResult<usize>;

    /// SMEMBERS: 按插入顺序返回
    fn smembers(&self, key: &[u8]) -> StoreResult<Vec<Vec<u8>>>;

    fn sismember(&self, key: &[u8], member: &[u8]) -> StoreResult<bool>;

    fn scard(&self, key: &[u8]) -> StoreResult<usize>;

    /// SSCAN: 返回 (下一个游标, 本页成员)，遍历结束时游标为 0
    ///
    /// 遍历期间一直存在的成员恰好出现一次，与其他成员的增删无关。
    fn sscan(&self, key: &[u8], cursor: u64, count: usize) -> StoreResult<(u64, Vec<Vec<u8>>)>;

    // ==================== Sorted Set 操作 ====================

    /// ZADD: 返回成员是否为新增
    fn zadd(&self, key: &[u8], score: f64, member: Vec<u8>) -> StoreResult<bool>;

    /// ZINCRBY: 返回新分数
    fn zincrby(&self, key: &[u8], delta: f64, member: Vec<u8>) -> StoreResult<f64>;

    fn zrem(&self, key: &[u8], members: &[&[u8]]) -> StoreResult<usize>;

    fn zcard(&self, key: &[u8]) -> StoreResult<usize>;

    /// ZRANK: 升序排名
    fn zrank(&self, key: &[u8], member: &[u8]) -> StoreResult<Option<usize>>;

    fn zscore(&self, key: &[u8], member: &[u8]) -> StoreResult<Option<f64>>;

    /// ZRANGE: 升序排名区间
    fn zrange(&self, key: &[u8], start: i64, stop: i64) -> StoreResult<Vec<(Vec<u8>, f64)>>;

    /// ZREVRANGE: 降序排名区间
    fn zrevrange(&self, key: &[u8], start: i64, stop: i64) -> StoreResult<Vec<(Vec<u8>, f64)>>;

    /// ZRANGEBYSCORE: 升序分数区间
    fn zrangebyscore(
        &self,
        key: &[u8],
        min: ScoreBound,
        max: ScoreBound,
    ) -> StoreResult<Vec<(Vec<u8>, f64)>>;

    fn zremrangebyscore(&self, key: &[u8], min: ScoreBound, max: ScoreBound) -> StoreResult<usize>;

    fn zremrangebyrank(&self, key: &[u8], start: i64, stop: i64) -> StoreResult<usize>;

    /// ZSCAN: 游标语义与 SSCAN 相同，返回 (成员, 分数)
    fn zscan(
        &self,
        key: &[u8],
        cursor: u64,
        count: usize,
    ) -> StoreResult<(u64, Vec<(Vec<u8>, f64)>)>;

    // ==================== 通用操作 ====================

    /// DEL: 删除键（支持多个）
    fn del(&self, keys: &[&[u8]]) -> usize;

    /// EXISTS: 检查键是否存在（支持多个）
    fn exists(&self, keys: &[&[u8]]) -> usize;

    /// KEYS: glob 模式匹配
    fn keys(&self, pattern: &[u8]) -> Vec<Vec<u8>>;

    /// TTL: 不建模过期，固定返回 -1（永不过期）
    fn ttl(&self, key: &[u8]) -> i64;

    /// EXPIRE: 接受但不生效，键存在时返回 true
    fn expire(&self, key: &[u8], ttl_secs: i64) -> bool;

    /// DBSIZE: 获取键数量
    fn dbsize(&self) -> usize;

    /// FLUSHDB: 清空所有数据
    fn flushdb(&self);
}
