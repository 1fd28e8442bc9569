//! 命令执行后端
//!
//! `LiveBackend` 通过 pipeline 驱动真实服务端，`MemoryBackend` 在进程内的
//! 表上执行。两者对外表现一致：缺失值的返回、有序集合的排序、分数格式化、
//! KEYS 的 glob 语义都相同。

use async_trait::async_trait;

use crate::command::Command;
use crate::error::BackendResult;
use crate::value::Value;

mod live;
mod memory;

pub use live::LiveBackend;
pub use memory::MemoryBackend;

/// 执行一批命令，按命令顺序返回结果
#[async_trait]
pub trait Backend: Send + Sync {
    async fn execute(&self, commands: &[Command]) -> BackendResult<Vec<Value>>;
}
