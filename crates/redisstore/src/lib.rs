//! Redis 存储抽象层
//!
//! 定义存储 trait 以及进程内的内存实现，作为真实 Redis 的替身使用
//!
//! # 支持的 Redis 数据类型
//! - String: GET, SET, INCRBY
//! - List: LPUSH, RPUSH, LPOP, RPOP, LRANGE, LLEN, LINDEX, LSET, LTRIM, LREM
//! - Hash: HGET, HSET, HMSET, HDEL, HEXISTS, HGETALL, HKEYS
//! - Set: SADD, SREM, SMEMBERS, SISMEMBER, SCARD, SSCAN
//! - Sorted Set: ZADD, ZINCRBY, ZREM, ZCARD, ZRANK, ZSCORE, ZRANGE, ZREVRANGE,
//!   ZRANGEBYSCORE, ZREMRANGEBYSCORE, ZREMRANGEBYRANK, ZSCAN
//! - 通用: DEL, EXISTS, KEYS, TTL, EXPIRE
//!
//! # 示例
//! ```rust
//! use redisstore::{MemoryStore, RedisStore};
//!
//! let store = MemoryStore::new();
//! store.set(b"key".to_vec(), b"value".to_vec());
//! assert_eq!(store.get(b"key").unwrap(), Some(b"value".to_vec()));
//! ```

mod glob;
mod memory;
mod sorted_set;
mod traits;

pub use glob::GlobPattern;
pub use memory::{MemoryStore, RedisValue};
pub use sorted_set::{parse_score, ScoreBound, SortedSet};
pub use traits::{RedisStore, StoreError, StoreResult};
