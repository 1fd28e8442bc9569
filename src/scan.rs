//! 游标遍历
//!
//! 反复发送 `SSCAN/ZSCAN key cursor [COUNT n]`，直到游标回到 "0"。
//! 遍历过程中集合被修改时同一成员可能重复出现，按成员去重，先出现的保留。

use std::collections::HashSet;

use tracing::debug;

use crate::backend::Backend;
use crate::command::{Command, Opcode};
use crate::error::{BackendError, Error, Result};
use crate::value::Value;

/// 起始与终止游标
pub const START_CURSOR: &str = "0";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanState {
    Scanning { cursor: String },
    Done,
}

pub struct ScanIterator<'a> {
    backend: &'a dyn Backend,
    opcode: Opcode,
    key: String,
    count: Option<usize>,
    state: ScanState,
    seen: HashSet<String>,
    results: Vec<Value>,
}

impl<'a> ScanIterator<'a> {
    /// opcode 不支持游标遍历时返回 UnsupportedOperation
    pub fn new(backend: &'a dyn Backend, command: &Command) -> Result<Self> {
        if !command.opcode.is_scannable() {
            return Err(Error::UnsupportedOperation(format!(
                "{} cannot be iterated",
                command.opcode
            )));
        }
        let (cursor, count) = match &command.iterate {
            Some(it) => (it.cursor.clone(), it.count),
            None => (START_CURSOR.to_string(), None),
        };
        Ok(Self {
            backend,
            opcode: command.opcode,
            key: command.key.clone(),
            count,
            state: ScanState::Scanning { cursor },
            seen: HashSet::new(),
            results: Vec::new(),
        })
    }

    pub fn state(&self) -> &ScanState {
        &self.state
    }

    fn page_command(&self, cursor: &str) -> Command {
        let cmd = Command::new(self.opcode, self.key.clone()).arg(cursor);
        match self.count {
            Some(n) => cmd.arg("COUNT").arg(n),
            None => cmd,
        }
    }

    /// 执行一次往返，返回之后是否还需要继续
    pub async fn step(&mut self) -> Result<bool> {
        let cursor = match &self.state {
            ScanState::Scanning { cursor } => cursor.clone(),
            ScanState::Done => return Ok(false),
        };
        let cmd = self.page_command(&cursor);
        let reply = self
            .backend
            .execute(std::slice::from_ref(&cmd))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::UnexpectedReply(format!("no reply to {}", cmd)))?;

        let (next, page) = split_page(reply)?;
        let before = self.results.len();
        match self.opcode {
            Opcode::Zscan => self.absorb_scored(page)?,
            _ => self.absorb(page)?,
        }
        debug!(
            "{} {} cursor {} -> {}, {} new",
            self.opcode,
            self.key,
            cursor,
            next,
            self.results.len() - before
        );

        self.state = if next == START_CURSOR {
            ScanState::Done
        } else {
            ScanState::Scanning { cursor: next }
        };
        Ok(self.state != ScanState::Done)
    }

    /// 遍历到结束并返回去重后的结果
    pub async fn run(mut self) -> Result<Value> {
        while self.step().await? {}
        Ok(Value::List(self.results))
    }

    fn absorb(&mut self, page: Vec<Value>) -> Result<()> {
        for item in page {
            let member = member_text(&item)?;
            if self.seen.insert(member) {
                self.results.push(item);
            }
        }
        Ok(())
    }

    /// ZSCAN 的页是 member, score 交错排列，成员与分数一起保留
    fn absorb_scored(&mut self, page: Vec<Value>) -> Result<()> {
        if page.len() % 2 != 0 {
            return Err(BackendError::UnexpectedReply(
                "ZSCAN page has an odd number of elements".to_string(),
            )
            .into());
        }
        let mut iter = page.into_iter();
        while let (Some(member), Some(score)) = (iter.next(), iter.next()) {
            if self.seen.insert(member_text(&member)?) {
                self.results.push(member);
                self.results.push(score);
            }
        }
        Ok(())
    }
}

fn member_text(item: &Value) -> Result<String> {
    match item {
        Value::Str(s) => Ok(s.clone()),
        Value::Int(n) => Ok(n.to_string()),
        other => Err(BackendError::UnexpectedReply(format!("scan member {}", other)).into()),
    }
}

/// 拆分 `[nextCursor, [values...]]`
fn split_page(reply: Value) -> Result<(String, Vec<Value>)> {
    match reply {
        Value::List(mut parts) if parts.len() == 2 => {
            let page = parts.pop();
            let cursor = parts.pop();
            match (cursor, page) {
                (Some(Value::Str(cursor)), Some(Value::List(page))) => Ok((cursor, page)),
                (cursor, page) => Err(BackendError::UnexpectedReply(format!(
                    "malformed scan page: cursor {:?}, values {:?}",
                    cursor, page
                ))
                .into()),
            }
        }
        other => Err(BackendError::UnexpectedReply(format!("malformed scan reply {}", other)).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;

    #[tokio::test]
    async fn test_rejects_non_scannable_opcode() {
        let backend = MemoryBackend::new();
        let cmd = Command::iterate(Opcode::Smembers, "s", None);
        assert!(matches!(
            ScanIterator::new(&backend, &cmd),
            Err(Error::UnsupportedOperation(_))
        ));
    }

    fn sorted(value: Value) -> Vec<String> {
        let mut items: Vec<String> = value
            .as_list()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect();
        items.sort();
        items
    }

    #[tokio::test]
    async fn test_scans_whole_set() {
        let backend = MemoryBackend::new();
        let mut members: Vec<String> = (0..30).map(|i| format!("m{i}")).collect();
        backend
            .execute(&[Command::new(Opcode::Sadd, "s").args(&members)])
            .await
            .unwrap();

        let cmd = Command::iterate(Opcode::Sscan, "s", Some(7));
        let mut scan = ScanIterator::new(&backend, &cmd).unwrap();
        assert!(scan.step().await.unwrap());
        assert!(matches!(scan.state(), ScanState::Scanning { cursor } if cursor != START_CURSOR));

        let result = scan.run().await.unwrap();
        members.sort();
        assert_eq!(sorted(result), members);
    }

    #[tokio::test]
    async fn test_members_removed_mid_scan_do_not_hide_others() {
        let backend = MemoryBackend::new();
        let members: Vec<String> = (0..30).map(|i| format!("m{i}")).collect();
        backend
            .execute(&[Command::new(Opcode::Sadd, "s").args(&members)])
            .await
            .unwrap();

        let cmd = Command::iterate(Opcode::Sscan, "s", Some(10));
        let mut scan = ScanIterator::new(&backend, &cmd).unwrap();
        assert!(scan.step().await.unwrap());
        backend
            .execute(&[Command::new(Opcode::Srem, "s").args(["m0", "m1", "m2"])])
            .await
            .unwrap();
        let result = sorted(scan.run().await.unwrap());

        for member in members.iter().skip(3) {
            assert_eq!(
                result.iter().filter(|m| *m == member).count(),
                1,
                "{member} stayed in the set and must be returned once"
            );
        }
    }

    #[tokio::test]
    async fn test_zscan_keeps_scores() {
        let backend = MemoryBackend::new();
        backend
            .execute(&[Command::new(Opcode::Zadd, "z").args(["1", "a", "2", "b"])])
            .await
            .unwrap();
        let cmd = Command::iterate(Opcode::Zscan, "z", None);
        let result = ScanIterator::new(&backend, &cmd).unwrap().run().await.unwrap();
        let mut pairs: Vec<(String, String)> = result
            .as_list()
            .unwrap()
            .chunks(2)
            .map(|p| (p[0].as_str().unwrap().to_string(), p[1].as_str().unwrap().to_string()))
            .collect();
        pairs.sort();
        assert_eq!(
            pairs,
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string())
            ]
        );
    }

    #[test]
    fn test_split_page_rejects_garbage() {
        assert!(split_page(Value::Int(1)).is_err());
        assert!(split_page(Value::List(vec![Value::Int(0), Value::List(vec![])])).is_err());
        let (cursor, page) =
            split_page(Value::List(vec![Value::from("0"), Value::strings(["x"])])).unwrap();
        assert_eq!(cursor, "0");
        assert_eq!(page, vec![Value::from("x")]);
    }
}
