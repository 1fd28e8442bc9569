//! 基于 Redis 的类型化集合
//!
//! 集合门面（Value / Set / Map / SortedSet / List）根据键模板构造延迟执行的
//! `Command`；`Store` 把单个命令或任意嵌套的命令结构交给后端执行，一个结构
//! 只需一次往返。后端可以是真实服务端（`LiveBackend`），也可以是语义相同的
//! 进程内实现（`MemoryBackend`）。

pub mod backend;
pub mod collection;
pub mod command;
pub mod config;
pub mod error;
pub mod key_template;
pub mod scan;
pub mod store;
pub mod value;
pub mod walker;

pub use backend::{Backend, LiveBackend, MemoryBackend};
pub use collection::{
    Ids, KeyedCollection, ListCollection, MapCollection, SetCollection, SortedSetCollection,
    ValueCollection,
};
pub use command::{Command, Iterate, Opcode, format_score};
pub use config::{CollectionConfig, LiveConfig};
pub use error::{BackendError, BackendResult, Error, Result};
pub use key_template::KeyTemplate;
pub use scan::{ScanIterator, ScanState};
pub use store::Store;
pub use value::{PathSegment, PendingCommand, Structure, Value};
