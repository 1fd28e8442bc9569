use super::{Collection, Ids, KeyedCollection};
use crate::command::{Command, Opcode, format_score};
use crate::config::CollectionConfig;
use crate::error::Result;

const WITHSCORES: &str = "WITHSCORES";

/// Sorted Set 门面
///
/// top 系列按分数降序，bottom / range / list 按升序。
/// 带分数的回复是 member, score 交错排列。
#[derive(Debug, Clone)]
pub struct SortedSetCollection {
    base: Collection,
}

impl SortedSetCollection {
    pub fn new(config: impl Into<CollectionConfig>, arity: usize) -> Result<Self> {
        Ok(Self {
            base: Collection::new(&config.into(), arity)?,
        })
    }

    fn ranged(
        &self,
        opcode: Opcode,
        ids: impl Ids,
        start: impl ToString,
        stop: impl ToString,
        with_scores: bool,
    ) -> Result<Command> {
        let cmd = self.base.command(opcode, ids)?.arg(start).arg(stop);
        Ok(if with_scores { cmd.arg(WITHSCORES) } else { cmd })
    }

    pub fn size(&self, ids: impl Ids) -> Result<Command> {
        self.base.command(Opcode::Zcard, ids)
    }

    /// 写入或更新成员分数
    pub fn put(&self, ids: impl Ids, score: f64, member: &str) -> Result<Command> {
        Ok(self
            .base
            .command(Opcode::Zadd, ids)?
            .arg(format_score(score))
            .arg(member))
    }

    pub fn inc(&self, ids: impl Ids, delta: f64, member: &str) -> Result<Command> {
        Ok(self
            .base
            .command(Opcode::Zincrby, ids)?
            .arg(format_score(delta))
            .arg(member))
    }

    pub fn remove(&self, ids: impl Ids, member: &str) -> Result<Command> {
        Ok(self.base.command(Opcode::Zrem, ids)?.arg(member))
    }

    /// 升序排名
    pub fn get_rank(&self, ids: impl Ids, member: &str) -> Result<Command> {
        Ok(self.base.command(Opcode::Zrank, ids)?.arg(member))
    }

    pub fn get_score(&self, ids: impl Ids, member: &str) -> Result<Command> {
        Ok(self.base.command(Opcode::Zscore, ids)?.arg(member))
    }

    /// 从升序排名 `from` 开始取 `count` 个
    pub fn get_range(
        &self,
        ids: impl Ids,
        from: i64,
        count: i64,
        with_scores: bool,
    ) -> Result<Command> {
        let stop = from.saturating_add(count).saturating_sub(1);
        self.ranged(Opcode::Zrange, ids, from, stop, with_scores)
    }

    pub fn get_top_one(&self, ids: impl Ids, with_scores: bool) -> Result<Command> {
        self.ranged(Opcode::Zrevrange, ids, 0, 0, with_scores)
    }

    /// 分数最高的 `size` 个，降序
    pub fn get_top(&self, ids: impl Ids, size: i64, with_scores: bool) -> Result<Command> {
        self.ranged(Opcode::Zrevrange, ids, 0, size.saturating_sub(1), with_scores)
    }

    /// 分数最低的 `size` 个，升序
    pub fn get_bottom(&self, ids: impl Ids, size: i64, with_scores: bool) -> Result<Command> {
        self.ranged(Opcode::Zrange, ids, 0, size.saturating_sub(1), with_scores)
    }

    pub fn get_list(&self, ids: impl Ids, with_scores: bool) -> Result<Command> {
        self.ranged(Opcode::Zrangebyscore, ids, "-inf", "+inf", with_scores)
    }

    /// 闭区间 [min, max] 内的成员，升序
    pub fn get_list_between(
        &self,
        ids: impl Ids,
        min: f64,
        max: f64,
        with_scores: bool,
    ) -> Result<Command> {
        self.ranged(
            Opcode::Zrangebyscore,
            ids,
            format_score(min),
            format_score(max),
            with_scores,
        )
    }

    /// 删除分数不高于 `score` 的成员
    pub fn remove_below(&self, ids: impl Ids, score: f64) -> Result<Command> {
        Ok(self
            .base
            .command(Opcode::Zremrangebyscore, ids)?
            .arg("-inf")
            .arg(format_score(score)))
    }

    /// 只保留分数最高的 `new_size` 个
    pub fn remove_bottom(&self, ids: impl Ids, new_size: i64) -> Result<Command> {
        Ok(self
            .base
            .command(Opcode::Zremrangebyrank, ids)?
            .arg(0)
            .arg(-(new_size.saturating_add(1))))
    }

    /// ZSCAN 遍历，结果为 member, score 交错排列
    pub fn iterate_list(&self, ids: impl Ids) -> Result<Command> {
        Ok(Command::iterate(Opcode::Zscan, self.base.key(ids)?, None))
    }
}

impl KeyedCollection for SortedSetCollection {
    fn collection(&self) -> &Collection {
        &self.base
    }
}
