use std::collections::BTreeSet;

use super::{Collection, Ids, KeyedCollection};
use crate::command::{Command, Opcode};
use crate::config::CollectionConfig;
use crate::error::{Error, Result};

/// Hash 门面，可选的字段白名单在构造命令时检查
#[derive(Debug, Clone)]
pub struct MapCollection {
    base: Collection,
    fields: Option<BTreeSet<String>>,
}

impl MapCollection {
    pub fn new(config: impl Into<CollectionConfig>, arity: usize) -> Result<Self> {
        let config = config.into();
        Ok(Self {
            base: Collection::new(&config, arity)?,
            fields: config.fields,
        })
    }

    fn check_field(&self, field: &str) -> Result<()> {
        match &self.fields {
            Some(fields) if !fields.contains(field) => {
                Err(Error::FieldNotDeclared(field.to_string()))
            }
            _ => Ok(()),
        }
    }

    fn field_command(&self, opcode: Opcode, ids: impl Ids, field: &str) -> Result<Command> {
        self.check_field(field)?;
        Ok(self.base.command(opcode, ids)?.arg(field))
    }

    pub fn has(&self, ids: impl Ids, field: &str) -> Result<Command> {
        self.field_command(Opcode::Hexists, ids, field)
    }

    pub fn get(&self, ids: impl Ids, field: &str) -> Result<Command> {
        self.field_command(Opcode::Hget, ids, field)
    }

    /// 整个 hash，不存在时解析为 Nil
    pub fn get_map(&self, ids: impl Ids) -> Result<Command> {
        self.base.command(Opcode::Hgetall, ids)
    }

    pub fn set_all<I, K, V>(&self, ids: impl Ids, entries: I) -> Result<Command>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: ToString,
    {
        let mut cmd = self.base.command(Opcode::Hmset, ids)?;
        for (field, value) in entries {
            self.check_field(field.as_ref())?;
            cmd = cmd.arg(field.as_ref()).arg(value);
        }
        Ok(cmd)
    }

    pub fn set(&self, ids: impl Ids, field: &str, value: impl ToString) -> Result<Command> {
        Ok(self.field_command(Opcode::Hset, ids, field)?.arg(value))
    }

    pub fn remove(&self, ids: impl Ids, field: &str) -> Result<Command> {
        self.field_command(Opcode::Hdel, ids, field)
    }

    pub fn get_fields(&self, ids: impl Ids) -> Result<Command> {
        self.base.command(Opcode::Hkeys, ids)
    }
}

impl KeyedCollection for MapCollection {
    fn collection(&self) -> &Collection {
        &self.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undeclared_field_rejected() {
        let users = MapCollection::new(
            CollectionConfig::new("user:${id}").with_fields(["name", "age"]),
            1,
        )
        .unwrap();
        assert!(users.get("U1", "name").is_ok());
        assert!(matches!(
            users.set("U1", "email", "x"),
            Err(Error::FieldNotDeclared(f)) if f == "email"
        ));
        assert!(matches!(
            users.set_all("U1", [("name", "a"), ("zip", "1")]),
            Err(Error::FieldNotDeclared(_))
        ));
        // 不涉及字段的操作不受限制
        assert!(users.get_map("U1").is_ok());
    }

    #[test]
    fn test_open_map_accepts_any_field() {
        let settings = MapCollection::new("settings:${id}", 1).unwrap();
        let cmd = settings.set_all("U1", [("theme", "dark"), ("lang", "en")]).unwrap();
        assert_eq!(cmd.to_string(), "HMSET settings:U1 theme dark lang en");
    }
}
