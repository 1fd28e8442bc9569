//! RESP 回复异步读取器

use std::future::Future;
use std::pin::Pin;

use crate::{RespError, RespValue};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};

/// 默认单个回复的最大帧大小：512MB
pub const DEFAULT_MAX_FRAME_SIZE: usize = 512 * 1024 * 1024;

/// 按声明的元素个数预分配的上限，实际大小由字节上限约束
const ARRAY_PREALLOC: usize = 1024;

type ReplyFuture<'a> = Pin<Box<dyn Future<Output = Result<RespValue, RespError>> + Send + 'a>>;

/// RESP 回复读取器
///
/// 帧大小按单个回复统计，每次 `read_reply` 都会重新计数。
pub struct ReplyReader<R: AsyncRead + Unpin + Send> {
    reader: BufReader<R>,
    max_bytes: usize,
    bytes_read: usize,
}

impl<R: AsyncRead + Unpin + Send> ReplyReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_max_bytes(reader, DEFAULT_MAX_FRAME_SIZE)
    }

    pub fn with_max_bytes(reader: R, max_bytes: usize) -> Self {
        Self {
            reader: BufReader::new(reader),
            max_bytes,
            bytes_read: 0,
        }
    }

    fn check_frame_size(&mut self, additional: usize) -> Result<(), RespError> {
        self.bytes_read = self.bytes_read.saturating_add(additional);
        if self.bytes_read > self.max_bytes {
            Err(RespError::FrameTooLarge(self.bytes_read, self.max_bytes))
        } else {
            Ok(())
        }
    }

    /// 读取下一个完整回复
    pub async fn read_reply(&mut self) -> Result<RespValue, RespError> {
        self.bytes_read = 0;
        self.read_value().await
    }

    /// 按顺序读取 `count` 个回复，对应 pipeline 中的 `count` 条命令
    pub async fn read_replies(&mut self, count: usize) -> Result<Vec<RespValue>, RespError> {
        let mut replies = Vec::with_capacity(count);
        for _ in 0..count {
            replies.push(self.read_reply().await?);
        }
        Ok(replies)
    }

    // 数组元素递归解析，装箱以切断 future 的自引用类型
    fn read_value_boxed(&mut self) -> ReplyFuture<'_> {
        Box::pin(self.read_value())
    }

    async fn read_value(&mut self) -> Result<RespValue, RespError> {
        let mut line = String::new();
        let n = self.reader.read_line(&mut line).await?;
        if n == 0 {
            return Err(RespError::UnexpectedEof);
        }
        self.check_frame_size(n)?;

        let line = line.trim_end_matches(['\r', '\n']);
        let mut chars = line.chars();
        let prefix = chars
            .next()
            .ok_or_else(|| RespError::InvalidFormat("Empty line".to_string()))?;
        let body = chars.as_str();

        match prefix {
            '+' => Ok(RespValue::SimpleString(body.to_string())),
            '-' => Ok(RespValue::Error(body.to_string())),
            ':' => {
                let num = body
                    .parse::<i128>()
                    .map_err(|_| RespError::InvalidFormat(format!("Invalid integer: {}", body)))?;
                i64::try_from(num)
                    .map(RespValue::Integer)
                    .map_err(|_| RespError::IntegerOverflow)
            }
            '$' => {
                let len = Self::parse_len(body, "bulk string")?;
                let Some(len) = len else {
                    return Ok(RespValue::Null);
                };
                self.check_frame_size(len + 2)?;

                let mut buffer = vec![0u8; len];
                self.reader.read_exact(&mut buffer).await?;
                let mut crlf = [0u8; 2];
                self.reader.read_exact(&mut crlf).await?;
                if crlf != *b"\r\n" {
                    return Err(RespError::InvalidFormat(
                        "Expected \\r\\n after bulk string".to_string(),
                    ));
                }
                Ok(RespValue::BulkString(buffer))
            }
            '*' => {
                let count = Self::parse_len(body, "array")?;
                let Some(count) = count else {
                    return Ok(RespValue::Null);
                };
                let mut items = Vec::with_capacity(count.min(ARRAY_PREALLOC));
                for _ in 0..count {
                    items.push(self.read_value_boxed().await?);
                }
                Ok(RespValue::Array(items))
            }
            _ => Err(RespError::InvalidFormat(format!(
                "Unknown RESP type: {}",
                prefix
            ))),
        }
    }

    /// 解析长度字段，`-1` 表示 null
    fn parse_len(body: &str, what: &str) -> Result<Option<usize>, RespError> {
        let len = body
            .parse::<i64>()
            .map_err(|_| RespError::InvalidFormat(format!("Invalid {} length: {}", what, body)))?;
        match len {
            -1 => Ok(None),
            n if n < 0 => Err(RespError::InvalidFormat(format!(
                "Invalid {} length: {}",
                what, n
            ))),
            n => Ok(Some(n as usize)),
        }
    }
}
