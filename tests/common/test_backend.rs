// test_backend.rs
use async_trait::async_trait;
use parking_lot::Mutex;
use redis_collections::{
    Backend, BackendError, BackendResult, Command, MemoryBackend, Opcode, Value,
};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// 包装内存后端，记录每次 execute 的批次大小
#[derive(Clone, Default)]
pub struct CountingBackend {
    inner: MemoryBackend,
    calls: Arc<AtomicUsize>,
    batches: Arc<Mutex<Vec<usize>>>,
}

impl CountingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn batches(&self) -> Vec<usize> {
        self.batches.lock().clone()
    }

    pub fn reset(&self) {
        self.calls.store(0, Ordering::SeqCst);
        self.batches.lock().clear();
    }
}

#[async_trait]
impl Backend for CountingBackend {
    async fn execute(&self, commands: &[Command]) -> BackendResult<Vec<Value>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.batches.lock().push(commands.len());
        self.inner.execute(commands).await
    }
}

/// 按顺序回放预先准备的 SCAN 页，用来模拟遍历期间的并发修改
#[derive(Clone, Default)]
pub struct ScriptedScanBackend {
    pages: Arc<Mutex<VecDeque<Value>>>,
    seen: Arc<Mutex<Vec<Command>>>,
}

impl ScriptedScanBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一页 `[cursor, [values...]]`
    pub fn page(self, cursor: &str, values: &[&str]) -> Self {
        self.pages.lock().push_back(Value::List(vec![
            Value::from(cursor),
            Value::strings(values.iter().copied()),
        ]));
        self
    }

    pub fn commands(&self) -> Vec<Command> {
        self.seen.lock().clone()
    }
}

#[async_trait]
impl Backend for ScriptedScanBackend {
    async fn execute(&self, commands: &[Command]) -> BackendResult<Vec<Value>> {
        let mut out = Vec::with_capacity(commands.len());
        for cmd in commands {
            self.seen.lock().push(cmd.clone());
            if !cmd.opcode.is_scannable() {
                return Err(BackendError::InvalidArgument(format!(
                    "scripted backend only answers scans, got {}",
                    cmd.opcode
                )));
            }
            let page = self
                .pages
                .lock()
                .pop_front()
                .ok_or_else(|| BackendError::UnexpectedReply("script exhausted".to_string()))?;
            out.push(page);
        }
        Ok(out)
    }
}

/// 任何调用都失败的后端
pub struct FailingBackend;

#[async_trait]
impl Backend for FailingBackend {
    async fn execute(&self, _commands: &[Command]) -> BackendResult<Vec<Value>> {
        Err(BackendError::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "connection reset by peer",
        )))
    }
}

pub fn get(key: &str) -> Command {
    Command::new(Opcode::Get, key)
}
