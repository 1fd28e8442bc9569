//! 集合门面
//!
//! 每种数据结构一个门面，持有自己的 `KeyTemplate`，只负责构造 `Command`，
//! 执行交给 `Store`。id 个数在每次调用时检查。

use crate::command::{Command, Opcode};
use crate::config::CollectionConfig;
use crate::error::Result;
use crate::key_template::KeyTemplate;

mod list;
mod map;
mod set;
mod sorted_set;
mod value;

pub use list::ListCollection;
pub use map::MapCollection;
pub use set::SetCollection;
pub use sorted_set::SortedSetCollection;
pub use value::ValueCollection;

/// 调用时传入的 id，按位置替换模板中的占位符
pub trait Ids {
    fn id_list(&self) -> Vec<String>;
}

impl Ids for () {
    fn id_list(&self) -> Vec<String> {
        Vec::new()
    }
}

impl Ids for &str {
    fn id_list(&self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl Ids for String {
    fn id_list(&self) -> Vec<String> {
        vec![self.clone()]
    }
}

impl Ids for (&str, &str) {
    fn id_list(&self) -> Vec<String> {
        vec![self.0.to_string(), self.1.to_string()]
    }
}

impl<const N: usize> Ids for [&str; N] {
    fn id_list(&self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

impl Ids for &[&str] {
    fn id_list(&self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

impl Ids for Vec<&str> {
    fn id_list(&self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

impl Ids for Vec<String> {
    fn id_list(&self) -> Vec<String> {
        self.clone()
    }
}

/// 门面共享的键处理
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    template: KeyTemplate,
}

impl Collection {
    pub fn new(config: &CollectionConfig, arity: usize) -> Result<Self> {
        Ok(Self {
            template: KeyTemplate::compile(&config.key, arity)?,
        })
    }

    pub fn template(&self) -> &KeyTemplate {
        &self.template
    }

    pub fn key(&self, ids: impl Ids) -> Result<String> {
        self.template.to_key(&ids.id_list())
    }

    pub(crate) fn command(&self, opcode: Opcode, ids: impl Ids) -> Result<Command> {
        Ok(Command::new(opcode, self.key(ids)?))
    }
}

/// 所有门面共有的操作
pub trait KeyedCollection {
    fn collection(&self) -> &Collection;

    fn key(&self, ids: impl Ids) -> Result<String> {
        self.collection().key(ids)
    }

    fn to_ids(&self, key: &str) -> Option<Vec<String>> {
        self.collection().template().to_ids(key)
    }

    fn to_id(&self, key: &str) -> Option<String> {
        self.collection().template().to_id(key)
    }

    /// KEYS：未给出的尾部 id 用 `*` 匹配
    fn find_keys(&self, partial: impl Ids) -> Result<Command> {
        let pattern = self.collection().template().glob(&partial.id_list())?;
        Ok(Command::new(Opcode::Keys, pattern))
    }

    fn exists(&self, ids: impl Ids) -> Result<Command> {
        self.collection().command(Opcode::Exists, ids)
    }

    fn clear(&self, ids: impl Ids) -> Result<Command> {
        self.collection().command(Opcode::Del, ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_ids_shapes() {
        assert!(().id_list().is_empty());
        assert_eq!("a".id_list(), vec!["a"]);
        assert_eq!(("a", "b").id_list(), vec!["a", "b"]);
        assert_eq!(["a", "b", "c"].id_list(), vec!["a", "b", "c"]);
        assert_eq!(vec!["x".to_string()].id_list(), vec!["x"]);
    }

    #[test]
    fn test_collection_key_checks_arity() {
        let c = Collection::new(&"pair:${a}:${b}".into(), 2).unwrap();
        assert_eq!(c.key(("1", "2")).unwrap(), "pair:1:2");
        assert!(matches!(
            c.key("1"),
            Err(Error::Arity {
                expected: 2,
                given: 1
            })
        ));
        assert!(matches!(
            Collection::new(&"pair:${a}".into(), 2),
            Err(Error::Configuration(_))
        ));
    }
}
