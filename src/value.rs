//! 待解析的结构与解析后的值

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::fmt;

use crate::command::Command;

/// 解析后的数据
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
}

impl Value {
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// 字符串列表的便捷构造
    pub fn strings<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::List(items.into_iter().map(|s| Value::Str(s.into())).collect())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Nil => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Str(s) => serializer.serialize_str(s),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => Err(fmt::Error),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

/// 路径上的一段：序列下标或映射键
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Index(usize),
    Key(String),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Index(i) => write!(f, "[{}]", i),
            PathSegment::Key(k) => write!(f, ".{}", k),
        }
    }
}

/// 提交解析的结构，命令只会出现在叶子上
#[derive(Debug, Clone, PartialEq)]
pub enum Structure {
    Command(Command),
    Seq(Vec<Structure>),
    Map(IndexMap<String, Structure>),
    Value(Value),
}

impl Structure {
    pub fn seq<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Structure>,
    {
        Structure::Seq(items.into_iter().map(Into::into).collect())
    }

    pub fn map<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Structure)>,
        K: Into<String>,
    {
        Structure::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl From<Command> for Structure {
    fn from(cmd: Command) -> Self {
        Structure::Command(cmd)
    }
}

impl From<Value> for Structure {
    fn from(value: Value) -> Self {
        Structure::Value(value)
    }
}

impl From<Vec<Structure>> for Structure {
    fn from(items: Vec<Structure>) -> Self {
        Structure::Seq(items)
    }
}

impl From<Vec<Command>> for Structure {
    fn from(items: Vec<Command>) -> Self {
        Structure::Seq(items.into_iter().map(Structure::Command).collect())
    }
}

impl From<&str> for Structure {
    fn from(s: &str) -> Self {
        Structure::Value(Value::from(s))
    }
}

impl From<i64> for Structure {
    fn from(n: i64) -> Self {
        Structure::Value(Value::Int(n))
    }
}

impl From<bool> for Structure {
    fn from(b: bool) -> Self {
        Structure::Value(Value::Bool(b))
    }
}

impl<K: Into<String>> FromIterator<(K, Structure)> for Structure {
    fn from_iter<T: IntoIterator<Item = (K, Structure)>>(iter: T) -> Self {
        Structure::map(iter)
    }
}

impl FromIterator<Structure> for Structure {
    fn from_iter<T: IntoIterator<Item = Structure>>(iter: T) -> Self {
        Structure::Seq(iter.into_iter().collect())
    }
}

/// 一个待执行的命令及其在结构中的位置
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCommand {
    pub path: Vec<PathSegment>,
    pub command: Command,
}
