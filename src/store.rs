//! 批量解析入口
//!
//! 单个命令单独执行（游标命令走 ScanIterator）；嵌套结构中的全部命令
//! 按发现顺序组成一个批次，只访问后端一次，结果写回同形的副本。

use std::sync::Arc;

use tracing::{debug, error};

use crate::backend::Backend;
use crate::command::Command;
use crate::error::{BackendError, Error, Result};
use crate::scan::ScanIterator;
use crate::value::{Structure, Value};
use crate::walker;

#[derive(Clone)]
pub struct Store {
    backend: Arc<dyn Backend>,
}

impl Store {
    pub fn new(backend: impl Backend + 'static) -> Self {
        Self::with_backend(Arc::new(backend))
    }

    pub fn with_backend(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// 解析命令、结构或普通值
    ///
    /// 不含命令的结构和普通值原样返回，不访问后端；根为 Nil 时返回 Structure 错误。
    pub async fn resolve(&self, structure: impl Into<Structure>) -> Result<Value> {
        match structure.into() {
            Structure::Command(cmd) => self.execute(&cmd).await,
            Structure::Value(Value::Nil) => {
                Err(Error::Structure("missing command: nothing to resolve".to_string()))
            }
            Structure::Value(value) => Ok(value),
            composite => self.resolve_structure(&composite).await,
        }
    }

    /// 单个命令作为大小为 1 的批次执行
    pub async fn execute(&self, command: &Command) -> Result<Value> {
        if command.is_iterate() {
            return self.iterate(command).await;
        }
        let mut results = self
            .backend
            .execute(std::slice::from_ref(command))
            .await
            .inspect_err(|e| error!("Command {} failed: {}", command, e))?;
        if results.len() != 1 {
            return Err(BackendError::UnexpectedReply(format!(
                "expected 1 result for {}, got {}",
                command,
                results.len()
            ))
            .into());
        }
        Ok(results.remove(0))
    }

    /// 一次往返解析整个结构
    pub async fn resolve_structure(&self, structure: &Structure) -> Result<Value> {
        let pending = walker::find_commands(structure)?;
        let mut clone = walker::clone_structure(structure);
        if pending.is_empty() {
            return Ok(clone);
        }

        let commands: Vec<Command> = pending.iter().map(|p| p.command.clone()).collect();
        debug!("Resolving structure with {} commands in one batch", commands.len());
        let results = self
            .backend
            .execute(&commands)
            .await
            .inspect_err(|e| error!("Batch of {} commands failed: {}", commands.len(), e))?;

        walker::rehydrate(&mut clone, &pending, results)?;
        Ok(clone)
    }

    /// 游标遍历直到结束，结果去重
    pub async fn iterate(&self, command: &Command) -> Result<Value> {
        ScanIterator::new(self.backend.as_ref(), command)?.run().await
    }
}
