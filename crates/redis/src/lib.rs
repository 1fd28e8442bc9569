//! Redis 协议 (RESP) 客户端支持库
//!
//! 只实现客户端需要的部分：把命令编码成 bulk string 数组写出，
//! 再按顺序把服务端回复解析回来。`Connection` 把两者组合成
//! 一次写出、一次 flush、按序读回 N 个回复的 pipeline。

mod connection;
mod reader;
mod writer;

pub use connection::Connection;
pub use reader::{DEFAULT_MAX_FRAME_SIZE, ReplyReader};
pub use writer::CommandWriter;

use std::io;

/// RESP 回复类型
#[derive(Debug, Clone, PartialEq)]
pub enum RespValue {
    /// 简单字符串: +OK\r\n
    SimpleString(String),
    /// 错误: -ERR message\r\n
    Error(String),
    /// 整数: :123\r\n
    Integer(i64),
    /// 批量字符串: $5\r\nhello\r\n
    BulkString(Vec<u8>),
    /// 数组: *2\r\n...
    Array(Vec<RespValue>),
    /// Null bulk string ($-1) 或 null array (*-1)
    Null,
}

impl RespValue {
    pub fn is_error(&self) -> bool {
        matches!(self, RespValue::Error(_))
    }

    /// 把 bulk / simple string 按 UTF-8 读出（有损）
    pub fn as_text(&self) -> Option<String> {
        match self {
            RespValue::BulkString(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
            RespValue::SimpleString(s) => Some(s.clone()),
            _ => None,
        }
    }
}

/// RESP 解析错误
#[derive(Debug, thiserror::Error)]
pub enum RespError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid RESP format: {0}")]
    InvalidFormat(String),
    #[error("Unexpected end of input")]
    UnexpectedEof,
    #[error("Integer overflow")]
    IntegerOverflow,
    #[error("Frame too large: {0} bytes (max: {1} bytes)")]
    FrameTooLarge(usize, usize),
}
