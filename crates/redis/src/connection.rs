//! Pipeline 连接
//!
//! 一个批次：全部命令写入缓冲区 → 一次 flush → 按顺序读回同样数量的回复。
//! 错误回复 (`-ERR ...`) 作为 `RespValue::Error` 原样返回，
//! 以保证连接上剩余的回复都被读完。

use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf, split};
use tracing::trace;

use crate::{CommandWriter, ReplyReader, RespError, RespValue};

pub struct Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    reader: ReplyReader<ReadHalf<S>>,
    writer: CommandWriter<WriteHalf<S>>,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(stream: S, max_frame_size: usize) -> Self {
        let (reader, writer) = split(stream);
        Self {
            reader: ReplyReader::with_max_bytes(reader, max_frame_size),
            writer: CommandWriter::new(writer),
        }
    }

    /// 在一次往返中执行整批命令，回复顺序与命令顺序一致
    pub async fn pipeline(&mut self, commands: &[Vec<Vec<u8>>]) -> Result<Vec<RespValue>, RespError> {
        if commands.is_empty() {
            return Ok(Vec::new());
        }
        for argv in commands {
            self.writer.write_command(argv).await?;
        }
        trace!("Flushing pipeline of {} commands", self.writer.pending());
        self.writer.flush().await?;
        self.reader.read_replies(commands.len()).await
    }
}
