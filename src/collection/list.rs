use super::{Collection, Ids, KeyedCollection};
use crate::command::{Command, Opcode};
use crate::config::CollectionConfig;
use crate::error::Result;

/// List 门面，下标规则与 LRANGE 相同（闭区间，负数从尾部数）
#[derive(Debug, Clone)]
pub struct ListCollection {
    base: Collection,
}

impl ListCollection {
    pub fn new(config: impl Into<CollectionConfig>, arity: usize) -> Result<Self> {
        Ok(Self {
            base: Collection::new(&config.into(), arity)?,
        })
    }

    fn span(&self, opcode: Opcode, ids: impl Ids, from: i64, to: i64) -> Result<Command> {
        Ok(self.base.command(opcode, ids)?.arg(from).arg(to))
    }

    pub fn get_length(&self, ids: impl Ids) -> Result<Command> {
        self.base.command(Opcode::Llen, ids)
    }

    pub fn get_all(&self, ids: impl Ids, from: i64, to: i64) -> Result<Command> {
        self.span(Opcode::Lrange, ids, from, to)
    }

    /// [0, to]
    pub fn get_left(&self, ids: impl Ids, to: i64) -> Result<Command> {
        self.get_all(ids, 0, to)
    }

    /// [from, -1]
    pub fn get_right(&self, ids: impl Ids, from: i64) -> Result<Command> {
        self.get_all(ids, from, -1)
    }

    pub fn get(&self, ids: impl Ids, index: i64) -> Result<Command> {
        Ok(self.base.command(Opcode::Lindex, ids)?.arg(index))
    }

    pub fn set(&self, ids: impl Ids, index: i64, value: impl ToString) -> Result<Command> {
        Ok(self.base.command(Opcode::Lset, ids)?.arg(index).arg(value))
    }

    pub fn pop_left(&self, ids: impl Ids) -> Result<Command> {
        self.base.command(Opcode::Lpop, ids)
    }

    /// 依次插入左侧，最后一个值成为表头
    pub fn push_left<I, S>(&self, ids: impl Ids, values: I) -> Result<Command>
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        Ok(self.base.command(Opcode::Lpush, ids)?.args(values))
    }

    pub fn pop_right(&self, ids: impl Ids) -> Result<Command> {
        self.base.command(Opcode::Rpop, ids)
    }

    pub fn push_right<I, S>(&self, ids: impl Ids, values: I) -> Result<Command>
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        Ok(self.base.command(Opcode::Rpush, ids)?.args(values))
    }

    /// 只保留 [from, to]
    pub fn keep(&self, ids: impl Ids, from: i64, to: i64) -> Result<Command> {
        self.span(Opcode::Ltrim, ids, from, to)
    }

    /// 丢弃左侧 `from` 个
    pub fn trim_left(&self, ids: impl Ids, from: i64) -> Result<Command> {
        self.keep(ids, from, -1)
    }

    /// 丢弃右侧 `to` 个
    pub fn trim_right(&self, ids: impl Ids, to: i64) -> Result<Command> {
        self.keep(ids, 0, -(to.saturating_add(1)))
    }

    pub fn remove_all(&self, ids: impl Ids, value: &str) -> Result<Command> {
        self.remove_n(ids, 0, value)
    }

    pub fn remove_first(&self, ids: impl Ids, value: &str, count: i64) -> Result<Command> {
        self.remove_n(ids, count, value)
    }

    pub fn remove_last(&self, ids: impl Ids, value: &str, count: i64) -> Result<Command> {
        self.remove_n(ids, count.saturating_neg(), value)
    }

    fn remove_n(&self, ids: impl Ids, count: i64, value: &str) -> Result<Command> {
        Ok(self.base.command(Opcode::Lrem, ids)?.arg(count).arg(value))
    }
}

impl KeyedCollection for ListCollection {
    fn collection(&self) -> &Collection {
        &self.base
    }

    /// 用空区间的 LTRIM 清空
    fn clear(&self, ids: impl Ids) -> Result<Command> {
        self.keep(ids, 1, 0)
    }
}
