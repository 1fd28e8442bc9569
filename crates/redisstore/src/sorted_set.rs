//! 有序集合
//!
//! 条目按分数降序存放。同分时最近写入（ZADD / ZINCRBY）的成员排在前面，
//! 等价于“先插到头部再做稳定排序”。升序视图就是降序数组的逆序，
//! 因此同分成员在升序视图中是最早写入的在前。

use crate::traits::{StoreError, StoreResult};

/// 分数区间边界，对应 ZRANGEBYSCORE 的 `1.5` / `(1.5` / `-inf` / `+inf`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreBound {
    Inclusive(f64),
    Exclusive(f64),
}

impl ScoreBound {
    pub fn parse(raw: &[u8]) -> StoreResult<Self> {
        let invalid = || StoreError::InvalidArgument("min or max is not a float".to_string());
        let text = std::str::from_utf8(raw).map_err(|_| invalid())?;
        let (exclusive, number) = match text.strip_prefix('(') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let value = parse_score(number.as_bytes()).map_err(|_| invalid())?;
        Ok(if exclusive {
            ScoreBound::Exclusive(value)
        } else {
            ScoreBound::Inclusive(value)
        })
    }

    fn above_min(&self, score: f64) -> bool {
        match *self {
            ScoreBound::Inclusive(min) => score >= min,
            ScoreBound::Exclusive(min) => score > min,
        }
    }

    fn below_max(&self, score: f64) -> bool {
        match *self {
            ScoreBound::Inclusive(max) => score <= max,
            ScoreBound::Exclusive(max) => score < max,
        }
    }
}

/// 解析分数，接受 `inf` / `+inf` / `-inf`，拒绝 NaN
pub fn parse_score(raw: &[u8]) -> StoreResult<f64> {
    let invalid = || StoreError::InvalidArgument("value is not a valid float".to_string());
    let value = std::str::from_utf8(raw)
        .map_err(|_| invalid())?
        .trim()
        .parse::<f64>()
        .map_err(|_| invalid())?;
    if value.is_nan() {
        return Err(invalid());
    }
    Ok(value)
}

/// 把 Redis 风格的闭区间（支持负索引）换算成 `[start, stop]` 下标
pub(crate) fn normalize_range(len: usize, start: i64, stop: i64) -> Option<(usize, usize)> {
    let len = len as i64;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop };
    if start > stop || start >= len {
        return None;
    }
    Some((start as usize, stop.min(len - 1) as usize))
}

#[derive(Debug, Clone, Default)]
pub struct SortedSet {
    /// (成员, 分数)，分数降序
    entries: Vec<(Vec<u8>, f64)>,
}

impl SortedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, member: &[u8]) -> Option<usize> {
        self.entries.iter().position(|(m, _)| m.as_slice() == member)
    }

    /// 写入或更新成员，返回是否为新成员
    pub fn put(&mut self, member: Vec<u8>, score: f64) -> bool {
        let existed = match self.position(&member) {
            Some(ix) => {
                self.entries.remove(ix);
                true
            }
            None => false,
        };
        // 插到第一个分数不大于它的位置之前：同分时新写入的在前
        let pos = self
            .entries
            .iter()
            .position(|(_, s)| *s <= score)
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, (member, score));
        !existed
    }

    /// 累加分数，按一次新的写入处理排序
    pub fn incr(&mut self, member: Vec<u8>, delta: f64) -> StoreResult<f64> {
        let current = self.score(&member).unwrap_or(0.0);
        let score = current + delta;
        if score.is_nan() {
            return Err(StoreError::InvalidArgument(
                "resulting score is not a number (NaN)".to_string(),
            ));
        }
        self.put(member, score);
        Ok(score)
    }

    pub fn remove(&mut self, member: &[u8]) -> bool {
        match self.position(member) {
            Some(ix) => {
                self.entries.remove(ix);
                true
            }
            None => false,
        }
    }

    pub fn score(&self, member: &[u8]) -> Option<f64> {
        self.position(member).map(|ix| self.entries[ix].1)
    }

    /// 升序排名
    pub fn rank(&self, member: &[u8]) -> Option<usize> {
        self.position(member).map(|ix| self.entries.len() - 1 - ix)
    }

    /// 升序遍历
    pub fn ascending(&self) -> impl Iterator<Item = &(Vec<u8>, f64)> {
        self.entries.iter().rev()
    }

    /// 升序排名区间 [start, stop]
    pub fn range(&self, start: i64, stop: i64) -> Vec<(Vec<u8>, f64)> {
        match normalize_range(self.len(), start, stop) {
            Some((a, b)) => self.ascending().skip(a).take(b - a + 1).cloned().collect(),
            None => Vec::new(),
        }
    }

    /// 降序排名区间 [start, stop]
    pub fn rev_range(&self, start: i64, stop: i64) -> Vec<(Vec<u8>, f64)> {
        match normalize_range(self.len(), start, stop) {
            Some((a, b)) => self.entries[a..=b].to_vec(),
            None => Vec::new(),
        }
    }

    pub fn range_by_score(&self, min: ScoreBound, max: ScoreBound) -> Vec<(Vec<u8>, f64)> {
        self.ascending()
            .filter(|(_, s)| min.above_min(*s) && max.below_max(*s))
            .cloned()
            .collect()
    }

    pub fn remove_range_by_score(&mut self, min: ScoreBound, max: ScoreBound) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|(_, s)| !(min.above_min(*s) && max.below_max(*s)));
        before - self.entries.len()
    }

    /// 按升序排名删除 [start, stop]
    pub fn remove_range_by_rank(&mut self, start: i64, stop: i64) -> usize {
        let len = self.len();
        match normalize_range(len, start, stop) {
            Some((a, b)) => {
                // 升序排名 r 对应降序下标 len - 1 - r
                self.entries.drain(len - 1 - b..=len - 1 - a).count()
            }
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn members(entries: &[(Vec<u8>, f64)]) -> Vec<&str> {
        entries
            .iter()
            .map(|(m, _)| std::str::from_utf8(m).unwrap())
            .collect()
    }

    #[test]
    fn test_put_orders_by_score() {
        let mut z = SortedSet::new();
        assert!(z.put(b"one".to_vec(), 1.1));
        assert!(z.put(b"two".to_vec(), 2.1));
        assert_eq!(members(&z.range(0, -1)), vec!["one", "two"]);
        assert_eq!(members(&z.rev_range(0, -1)), vec!["two", "one"]);
    }

    #[test]
    fn test_reput_updates_instead_of_duplicating() {
        let mut z = SortedSet::new();
        z.put(b"a".to_vec(), 1.0);
        assert!(!z.put(b"a".to_vec(), 5.0));
        assert_eq!(z.len(), 1);
        assert_eq!(z.score(b"a"), Some(5.0));
    }

    #[test]
    fn test_tie_most_recent_first_in_descending_view() {
        let mut z = SortedSet::new();
        z.put(b"one".to_vec(), 1.0);
        z.put(b"two".to_vec(), 2.0);
        z.put(b"three".to_vec(), 1.0);
        assert_eq!(members(&z.rev_range(0, -1)), vec!["two", "three", "one"]);
        // 升序视图是降序的逆序
        assert_eq!(members(&z.range(0, -1)), vec!["one", "three", "two"]);
        assert_eq!(z.rank(b"one"), Some(0));
        assert_eq!(z.rank(b"three"), Some(1));
    }

    #[test]
    fn test_incr_counts_as_put() {
        let mut z = SortedSet::new();
        z.put(b"a".to_vec(), 2.0);
        z.put(b"b".to_vec(), 1.0);
        assert_eq!(z.incr(b"b".to_vec(), 1.0).unwrap(), 2.0);
        assert_eq!(members(&z.rev_range(0, -1)), vec!["b", "a"]);
        assert_eq!(z.incr(b"c".to_vec(), 0.5).unwrap(), 0.5);
        assert!(z.incr(b"c".to_vec(), f64::NAN).is_err());
    }

    #[test]
    fn test_range_by_score_bounds() {
        let mut z = SortedSet::new();
        for (m, s) in [("a", 1.0), ("b", 2.0), ("c", 3.0)] {
            z.put(m.as_bytes().to_vec(), s);
        }
        let all = z.range_by_score(
            ScoreBound::parse(b"-inf").unwrap(),
            ScoreBound::parse(b"+inf").unwrap(),
        );
        assert_eq!(members(&all), vec!["a", "b", "c"]);
        let open = z.range_by_score(
            ScoreBound::parse(b"(1").unwrap(),
            ScoreBound::parse(b"3").unwrap(),
        );
        assert_eq!(members(&open), vec!["b", "c"]);
        assert!(ScoreBound::parse(b"abc").is_err());
    }

    #[test]
    fn test_remove_ranges() {
        let mut z = SortedSet::new();
        for (m, s) in [("a", 1.0), ("b", 2.0), ("c", 3.0)] {
            z.put(m.as_bytes().to_vec(), s);
        }
        // 只保留最高的 2 个
        assert_eq!(z.remove_range_by_rank(0, -3), 1);
        assert_eq!(members(&z.range(0, -1)), vec!["b", "c"]);
        assert_eq!(
            z.remove_range_by_score(
                ScoreBound::Inclusive(f64::NEG_INFINITY),
                ScoreBound::Inclusive(2.0)
            ),
            1
        );
        assert_eq!(members(&z.range(0, -1)), vec!["c"]);
        assert_eq!(z.remove_range_by_rank(0, -1), 1);
        assert!(z.is_empty());
    }

    #[test]
    fn test_normalize_range() {
        assert_eq!(normalize_range(3, 0, -1), Some((0, 2)));
        assert_eq!(normalize_range(3, -2, 10), Some((1, 2)));
        assert_eq!(normalize_range(3, 2, 1), None);
        assert_eq!(normalize_range(0, 0, -1), None);
        assert_eq!(normalize_range(3, 5, 9), None);
    }
}
