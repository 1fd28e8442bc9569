//! 延迟执行的命令描述

use std::fmt;

/// 支持的命令
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // 通用
    Exists,
    Del,
    Keys,
    Expire,
    Ttl,
    // String
    Get,
    Set,
    Incr,
    // Set
    Sadd,
    Srem,
    Smembers,
    Sismember,
    Scard,
    Sscan,
    // Hash
    Hset,
    Hmset,
    Hget,
    Hdel,
    Hexists,
    Hgetall,
    Hkeys,
    // Sorted Set
    Zadd,
    Zincrby,
    Zrem,
    Zcard,
    Zrank,
    Zscore,
    Zrange,
    Zrevrange,
    Zrangebyscore,
    Zremrangebyscore,
    Zremrangebyrank,
    Zscan,
    // List
    Llen,
    Lrange,
    Lindex,
    Lset,
    Lpop,
    Rpop,
    Lpush,
    Rpush,
    Ltrim,
    Lrem,
}

impl Opcode {
    /// 线上的命令名
    pub fn as_str(&self) -> &'static str {
        match self {
            Opcode::Exists => "EXISTS",
            Opcode::Del => "DEL",
            Opcode::Keys => "KEYS",
            Opcode::Expire => "EXPIRE",
            Opcode::Ttl => "TTL",
            Opcode::Get => "GET",
            Opcode::Set => "SET",
            Opcode::Incr => "INCR",
            Opcode::Sadd => "SADD",
            Opcode::Srem => "SREM",
            Opcode::Smembers => "SMEMBERS",
            Opcode::Sismember => "SISMEMBER",
            Opcode::Scard => "SCARD",
            Opcode::Sscan => "SSCAN",
            Opcode::Hset => "HSET",
            Opcode::Hmset => "HMSET",
            Opcode::Hget => "HGET",
            Opcode::Hdel => "HDEL",
            Opcode::Hexists => "HEXISTS",
            Opcode::Hgetall => "HGETALL",
            Opcode::Hkeys => "HKEYS",
            Opcode::Zadd => "ZADD",
            Opcode::Zincrby => "ZINCRBY",
            Opcode::Zrem => "ZREM",
            Opcode::Zcard => "ZCARD",
            Opcode::Zrank => "ZRANK",
            Opcode::Zscore => "ZSCORE",
            Opcode::Zrange => "ZRANGE",
            Opcode::Zrevrange => "ZREVRANGE",
            Opcode::Zrangebyscore => "ZRANGEBYSCORE",
            Opcode::Zremrangebyscore => "ZREMRANGEBYSCORE",
            Opcode::Zremrangebyrank => "ZREMRANGEBYRANK",
            Opcode::Zscan => "ZSCAN",
            Opcode::Llen => "LLEN",
            Opcode::Lrange => "LRANGE",
            Opcode::Lindex => "LINDEX",
            Opcode::Lset => "LSET",
            Opcode::Lpop => "LPOP",
            Opcode::Rpop => "RPOP",
            Opcode::Lpush => "LPUSH",
            Opcode::Rpush => "RPUSH",
            Opcode::Ltrim => "LTRIM",
            Opcode::Lrem => "LREM",
        }
    }

    /// 是否支持游标遍历
    pub fn is_scannable(&self) -> bool {
        matches!(self, Opcode::Sscan | Opcode::Zscan)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 游标遍历标记
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Iterate {
    /// 起始游标，规范值为 "0"
    pub cursor: String,
    /// 每页数量提示
    pub count: Option<usize>,
}

/// 一个尚未执行的命令
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub opcode: Opcode,
    pub key: String,
    pub args: Vec<String>,
    pub iterate: Option<Iterate>,
}

impl Command {
    pub fn new(opcode: Opcode, key: impl Into<String>) -> Self {
        Self {
            opcode,
            key: key.into(),
            args: Vec::new(),
            iterate: None,
        }
    }

    /// 游标遍历命令，从 "0" 开始
    pub fn iterate(opcode: Opcode, key: impl Into<String>, count: Option<usize>) -> Self {
        Self {
            iterate: Some(Iterate {
                cursor: "0".to_string(),
                count,
            }),
            ..Self::new(opcode, key)
        }
    }

    pub fn arg(mut self, arg: impl ToString) -> Self {
        self.args.push(arg.to_string());
        self
    }

    pub fn args<I>(mut self, args: I) -> Self
    where
        I: IntoIterator,
        I::Item: ToString,
    {
        self.args.extend(args.into_iter().map(|a| a.to_string()));
        self
    }

    pub fn is_iterate(&self) -> bool {
        self.iterate.is_some()
    }

    /// 编码成 RESP 参数数组: OPCODE key args...
    pub fn to_argv(&self) -> Vec<Vec<u8>> {
        let mut argv = Vec::with_capacity(self.args.len() + 2);
        argv.push(self.opcode.as_str().as_bytes().to_vec());
        argv.push(self.key.as_bytes().to_vec());
        argv.extend(self.args.iter().map(|a| a.as_bytes().to_vec()));
        argv
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.opcode, self.key)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// 分数的字符串形式：最短的可往返十进制表示，无穷大写作 inf / -inf
pub fn format_score(score: f64) -> String {
    if score == f64::INFINITY {
        "inf".to_string()
    } else if score == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        score.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argv_layout() {
        let cmd = Command::new(Opcode::Zadd, "sorted:n").arg(1.5).arg("one");
        assert_eq!(
            cmd.to_argv(),
            vec![
                b"ZADD".to_vec(),
                b"sorted:n".to_vec(),
                b"1.5".to_vec(),
                b"one".to_vec()
            ]
        );
        assert_eq!(cmd.to_string(), "ZADD sorted:n 1.5 one");
    }

    #[test]
    fn test_iterate_marker() {
        let cmd = Command::iterate(Opcode::Sscan, "set:a", Some(100));
        assert!(cmd.is_iterate());
        assert_eq!(cmd.iterate.as_ref().map(|i| i.cursor.as_str()), Some("0"));
        assert!(Opcode::Sscan.is_scannable());
        assert!(Opcode::Zscan.is_scannable());
        assert!(!Opcode::Smembers.is_scannable());
    }

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(1.1), "1.1");
        assert_eq!(format_score(2.0), "2");
        assert_eq!(format_score(-0.5), "-0.5");
        assert_eq!(format_score(f64::INFINITY), "inf");
        assert_eq!(format_score(f64::NEG_INFINITY), "-inf");
    }
}
