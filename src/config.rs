//! 集合与连接配置

use std::collections::BTreeSet;
use std::time::Duration;

use redis_protocol::DEFAULT_MAX_FRAME_SIZE;

/// 集合配置：键模板以及可选的字段白名单（仅 Hash 使用）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionConfig {
    pub key: String,
    pub fields: Option<BTreeSet<String>>,
}

impl CollectionConfig {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            fields: None,
        }
    }

    /// 声明封闭的字段集合，引用未声明字段时报 FieldNotDeclared
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }
}

impl From<&str> for CollectionConfig {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for CollectionConfig {
    fn from(key: String) -> Self {
        Self::new(key)
    }
}

/// 真实服务端的连接配置
#[derive(Debug, Clone)]
pub struct LiveConfig {
    pub addr: String,
    pub connect_timeout: Duration,
    /// 单个回复的最大字节数
    pub max_frame_size: usize,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:6379".to_string(),
            connect_timeout: Duration::from_secs(5),
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

impl LiveConfig {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            ..Self::default()
        }
    }
}
