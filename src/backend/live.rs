//! 真实服务端后端
//!
//! 每个批次持有连接锁：写出全部命令，flush 一次，读回同样数量的回复。
//! 两个批次不会共享一次往返。

use async_trait::async_trait;
use indexmap::IndexMap;
use redis_protocol::{Connection, RespValue};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use super::Backend;
use crate::command::{Command, Opcode};
use crate::config::LiveConfig;
use crate::error::{BackendError, BackendResult};
use crate::value::Value;

/// 真实服务端后端
///
/// 有序集合的同分成员按服务端规则排序（按成员字节序，降序视图中反转），
/// 而 `MemoryBackend` 让最近写入的成员排在前面。两者只在同分时可能不同。
///
/// 一个批次读取回复失败后（帧过大、协议错误、调用方中途放弃），连接上
/// 可能残留未读的回复，此后的批次都返回 `ConnectionBroken`。
pub struct LiveBackend<S = TcpStream>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    conn: Mutex<Option<Connection<S>>>,
    config: LiveConfig,
}

impl LiveBackend<TcpStream> {
    /// 连接到 `config.addr`，超过 `connect_timeout` 返回 Timeout
    pub async fn connect(config: LiveConfig) -> BackendResult<Self> {
        let stream = tokio::time::timeout(config.connect_timeout, TcpStream::connect(&config.addr))
            .await
            .map_err(|_| BackendError::Timeout)??;
        stream.set_nodelay(true)?;
        info!("Connected to {}", config.addr);
        Ok(Self::from_stream(stream, config))
    }
}

impl<S> LiveBackend<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// 在任意已建立的双向流上工作
    pub fn from_stream(stream: S, config: LiveConfig) -> Self {
        Self {
            conn: Mutex::new(Some(Connection::new(stream, config.max_frame_size))),
            config,
        }
    }

    pub fn config(&self) -> &LiveConfig {
        &self.config
    }
}

#[async_trait]
impl<S> Backend for LiveBackend<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn execute(&self, commands: &[Command]) -> BackendResult<Vec<Value>> {
        if commands.is_empty() {
            return Ok(Vec::new());
        }
        let argv: Vec<Vec<Vec<u8>>> = commands.iter().map(Command::to_argv).collect();

        let replies = {
            let mut slot = self.conn.lock().await;
            // 批次进行期间连接不在槽中，future 被丢弃时连接随之丢弃
            let mut conn = slot.take().ok_or(BackendError::ConnectionBroken)?;
            match conn.pipeline(&argv).await {
                Ok(replies) => {
                    *slot = Some(conn);
                    replies
                }
                Err(e) => {
                    error!("Pipeline to {} failed, dropping connection: {}", self.config.addr, e);
                    return Err(e.into());
                }
            }
        };
        debug!(
            "Pipeline to {} returned {} replies",
            self.config.addr,
            replies.len()
        );

        if replies.len() != commands.len() {
            return Err(BackendError::UnexpectedReply(format!(
                "expected {} replies, got {}",
                commands.len(),
                replies.len()
            )));
        }

        // 整批读完之后再报告错误回复，连接保持同步
        for (cmd, reply) in commands.iter().zip(&replies) {
            if let RespValue::Error(msg) = reply {
                error!("Command {} failed: {}", cmd, msg);
                return Err(BackendError::Server(msg.clone()));
            }
        }

        commands
            .iter()
            .zip(replies)
            .map(|(cmd, reply)| shape_reply(cmd, reply))
            .collect()
    }
}

/// 把 RESP 回复转成 Value；HGETALL 的扁平数组整理成 Map，空表为 Nil
fn shape_reply(cmd: &Command, reply: RespValue) -> BackendResult<Value> {
    match (cmd.opcode, reply) {
        (Opcode::Hgetall, RespValue::Array(items)) => {
            if items.is_empty() {
                return Ok(Value::Nil);
            }
            if items.len() % 2 != 0 {
                return Err(BackendError::UnexpectedReply(format!(
                    "HGETALL returned {} elements",
                    items.len()
                )));
            }
            let mut map = IndexMap::with_capacity(items.len() / 2);
            let mut iter = items.into_iter();
            while let (Some(field), Some(value)) = (iter.next(), iter.next()) {
                let field = field.as_text().ok_or_else(|| {
                    BackendError::UnexpectedReply("HGETALL field is not a string".to_string())
                })?;
                map.insert(field, to_value(value));
            }
            Ok(Value::Map(map))
        }
        (_, reply) => Ok(to_value(reply)),
    }
}

fn to_value(reply: RespValue) -> Value {
    match reply {
        RespValue::SimpleString(s) => Value::Str(s),
        RespValue::BulkString(bytes) => Value::Str(String::from_utf8_lossy(&bytes).into_owned()),
        RespValue::Integer(n) => Value::Int(n),
        RespValue::Array(items) => Value::List(items.into_iter().map(to_value).collect()),
        RespValue::Null => Value::Nil,
        // 错误回复在 execute 中已经拦截
        RespValue::Error(msg) => Value::Str(msg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redis_protocol::RespError;
    use tokio_test::io::Builder;

    fn encode(parts: &[&str]) -> Vec<u8> {
        let mut out = format!("*{}\r\n", parts.len()).into_bytes();
        for p in parts {
            out.extend_from_slice(format!("${}\r\n{}\r\n", p.len(), p).as_bytes());
        }
        out
    }

    #[tokio::test]
    async fn test_batch_is_one_write_then_ordered_replies() {
        let mut request = encode(&["ZADD", "sorted:n", "1", "one"]);
        request.extend(encode(&["ZREVRANGE", "sorted:n", "0", "1", "WITHSCORES"]));
        let stream = Builder::new()
            .write(&request)
            .read(b":1\r\n*2\r\n$3\r\none\r\n$1\r\n1\r\n")
            .build();
        let backend = LiveBackend::from_stream(stream, LiveConfig::default());

        let results = backend
            .execute(&[
                Command::new(Opcode::Zadd, "sorted:n").args(["1", "one"]),
                Command::new(Opcode::Zrevrange, "sorted:n").args(["0", "1", "WITHSCORES"]),
            ])
            .await
            .unwrap();
        assert_eq!(results, vec![Value::Int(1), Value::strings(["one", "1"])]);
    }

    #[tokio::test]
    async fn test_hgetall_shaping() {
        let mut request = encode(&["HGETALL", "h"]);
        request.extend(encode(&["HGETALL", "empty"]));
        let stream = Builder::new()
            .write(&request)
            .read(b"*4\r\n$1\r\nb\r\n$1\r\n2\r\n$1\r\na\r\n$1\r\n1\r\n*0\r\n")
            .build();
        let backend = LiveBackend::from_stream(stream, LiveConfig::default());

        let results = backend
            .execute(&[
                Command::new(Opcode::Hgetall, "h"),
                Command::new(Opcode::Hgetall, "empty"),
            ])
            .await
            .unwrap();
        let map = results[0].as_map().unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(map["b"], Value::from("2"));
        assert_eq!(results[1], Value::Nil);
    }

    #[tokio::test]
    async fn test_error_reply_fails_batch_after_drain() {
        let mut request = encode(&["SET", "s", "v"]);
        request.extend(encode(&["SADD", "s", "x"]));
        request.extend(encode(&["GET", "s"]));
        let stream = Builder::new()
            .write(&request)
            .read(b"+OK\r\n-WRONGTYPE Operation against a key holding the wrong kind of value\r\n$1\r\nv\r\n")
            .build();
        let backend = LiveBackend::from_stream(stream, LiveConfig::default());

        let err = backend
            .execute(&[
                Command::new(Opcode::Set, "s").arg("v"),
                Command::new(Opcode::Sadd, "s").arg("x"),
                Command::new(Opcode::Get, "s"),
            ])
            .await
            .unwrap_err();
        match err {
            BackendError::Server(msg) => assert!(msg.starts_with("WRONGTYPE")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failed_read_breaks_connection() {
        let mut request = encode(&["SMEMBERS", "big"]);
        request.extend(encode(&["GET", "b"]));
        let stream = Builder::new()
            .write(&request)
            .read(b"*3\r\n:1\r\n:2\r\n:3\r\n$1\r\nB\r\n")
            .build();
        let config = LiveConfig {
            max_frame_size: 10,
            ..LiveConfig::default()
        };
        let backend = LiveBackend::from_stream(stream, config);

        let err = backend
            .execute(&[
                Command::new(Opcode::Smembers, "big"),
                Command::new(Opcode::Get, "b"),
            ])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BackendError::Protocol(RespError::FrameTooLarge(12, 10))
        ));

        // 残留的回复不能被当成下一个批次的结果
        let err = backend
            .execute(&[Command::new(Opcode::Get, "c")])
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::ConnectionBroken));
    }

    #[tokio::test]
    async fn test_sorted_replies_keep_server_order() {
        // 同分成员 b、a 先后写入：服务端按字节序给出 b, a，原样返回不重排
        let stream = Builder::new()
            .write(&encode(&["ZREVRANGE", "z", "0", "-1"]))
            .read(b"*2\r\n$1\r\nb\r\n$1\r\na\r\n")
            .build();
        let backend = LiveBackend::from_stream(stream, LiveConfig::default());
        let results = backend
            .execute(&[Command::new(Opcode::Zrevrange, "z").args(["0", "-1"])])
            .await
            .unwrap();
        assert_eq!(results, vec![Value::strings(["b", "a"])]);
    }

    #[tokio::test]
    async fn test_null_and_empty_batch() {
        let stream = Builder::new()
            .write(&encode(&["HGET", "h", "f"]))
            .read(b"$-1\r\n")
            .build();
        let backend = LiveBackend::from_stream(stream, LiveConfig::default());
        assert!(backend.execute(&[]).await.unwrap().is_empty());
        let results = backend
            .execute(&[Command::new(Opcode::Hget, "h").arg("f")])
            .await
            .unwrap();
        assert_eq!(results, vec![Value::Nil]);
    }
}
