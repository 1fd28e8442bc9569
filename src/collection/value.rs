use super::{Collection, Ids, KeyedCollection};
use crate::command::{Command, Opcode};
use crate::config::CollectionConfig;
use crate::error::Result;

/// String 门面
#[derive(Debug, Clone)]
pub struct ValueCollection {
    base: Collection,
}

impl ValueCollection {
    pub fn new(config: impl Into<CollectionConfig>, arity: usize) -> Result<Self> {
        Ok(Self {
            base: Collection::new(&config.into(), arity)?,
        })
    }

    pub fn get(&self, ids: impl Ids) -> Result<Command> {
        self.base.command(Opcode::Get, ids)
    }

    pub fn set(&self, ids: impl Ids, value: impl ToString) -> Result<Command> {
        Ok(self.base.command(Opcode::Set, ids)?.arg(value))
    }

    /// 整数加一
    pub fn inc(&self, ids: impl Ids) -> Result<Command> {
        self.base.command(Opcode::Incr, ids)
    }

    pub fn remove(&self, ids: impl Ids) -> Result<Command> {
        self.base.command(Opcode::Del, ids)
    }

    /// 内存后端接受但不生效
    pub fn set_ttl(&self, ids: impl Ids, seconds: u64) -> Result<Command> {
        Ok(self.base.command(Opcode::Expire, ids)?.arg(seconds))
    }

    pub fn get_ttl(&self, ids: impl Ids) -> Result<Command> {
        self.base.command(Opcode::Ttl, ids)
    }
}

impl KeyedCollection for ValueCollection {
    fn collection(&self) -> &Collection {
        &self.base
    }
}
