use super::{Collection, Ids, KeyedCollection};
use crate::command::{Command, Opcode};
use crate::config::CollectionConfig;
use crate::error::Result;

/// 遍历时每页的数量提示
const ITERATE_COUNT: usize = 100;

/// Set 门面
#[derive(Debug, Clone)]
pub struct SetCollection {
    base: Collection,
}

impl SetCollection {
    pub fn new(config: impl Into<CollectionConfig>, arity: usize) -> Result<Self> {
        Ok(Self {
            base: Collection::new(&config.into(), arity)?,
        })
    }

    pub fn size(&self, ids: impl Ids) -> Result<Command> {
        self.base.command(Opcode::Scard, ids)
    }

    /// 成员存在返回 1，否则 0
    pub fn contains(&self, ids: impl Ids, value: &str) -> Result<Command> {
        Ok(self.base.command(Opcode::Sismember, ids)?.arg(value))
    }

    pub fn get_list(&self, ids: impl Ids) -> Result<Command> {
        self.base.command(Opcode::Smembers, ids)
    }

    /// SSCAN 遍历，只能单独解析
    pub fn iterate_list(&self, ids: impl Ids) -> Result<Command> {
        Ok(Command::iterate(
            Opcode::Sscan,
            self.base.key(ids)?,
            Some(ITERATE_COUNT),
        ))
    }

    pub fn add(&self, ids: impl Ids, value: &str) -> Result<Command> {
        Ok(self.base.command(Opcode::Sadd, ids)?.arg(value))
    }

    pub fn add_all<I, S>(&self, ids: impl Ids, values: I) -> Result<Command>
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        Ok(self.base.command(Opcode::Sadd, ids)?.args(values))
    }

    pub fn remove(&self, ids: impl Ids, value: &str) -> Result<Command> {
        Ok(self.base.command(Opcode::Srem, ids)?.arg(value))
    }
}

impl KeyedCollection for SetCollection {
    fn collection(&self) -> &Collection {
        &self.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builds_commands() {
        let friends = SetCollection::new("user:${id}:friends", 1).unwrap();
        assert_eq!(
            friends.add("U1", "U2").unwrap(),
            Command::new(Opcode::Sadd, "user:U1:friends").arg("U2")
        );
        assert_eq!(
            friends.add_all("U1", ["a", "b"]).unwrap().args,
            vec!["a".to_string(), "b".to_string()]
        );
        let it = friends.iterate_list("U1").unwrap();
        assert_eq!(it.opcode, Opcode::Sscan);
        assert_eq!(it.iterate.unwrap().count, Some(100));
        assert_eq!(friends.clear("U1").unwrap().opcode, Opcode::Del);
        assert_eq!(
            friends.find_keys(()).unwrap(),
            Command::new(Opcode::Keys, "user:*:friends")
        );
        assert_eq!(friends.to_id("user:U9:friends"), Some("U9".to_string()));
    }
}
