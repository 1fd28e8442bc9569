//! RESP 命令写出端
//!
//! 命令只会是 bulk string 数组，所以这里不需要通用的 RespValue 编码。
//! `write_command` 只写进缓冲区，调用方写完整个批次后再 `flush` 一次。

use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

/// Pipeline 命令写出器
pub struct CommandWriter<W: AsyncWrite + Unpin> {
    writer: BufWriter<W>,
    pending: usize,
}

impl<W: AsyncWrite + Unpin> CommandWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
            pending: 0,
        }
    }

    /// 把一条命令编码为 `*N\r\n$len\r\narg\r\n...` 写入缓冲区（不 flush）
    pub async fn write_command(&mut self, argv: &[Vec<u8>]) -> std::io::Result<()> {
        let header = format!("*{}\r\n", argv.len());
        self.writer.write_all(header.as_bytes()).await?;
        for arg in argv {
            let len = format!("${}\r\n", arg.len());
            self.writer.write_all(len.as_bytes()).await?;
            self.writer.write_all(arg).await?;
            self.writer.write_all(b"\r\n").await?;
        }
        self.pending += 1;
        Ok(())
    }

    /// 已写入缓冲区但尚未 flush 的命令数
    pub fn pending(&self) -> usize {
        self.pending
    }

    pub async fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush().await?;
        self.pending = 0;
        Ok(())
    }
}
