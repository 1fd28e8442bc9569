use redis_protocol::RespError;
use redisstore::StoreError;
use thiserror::Error;

/// 顶层错误类型
///
/// 配置、参数个数与字段错误在构造命令时同步返回；
/// 结构与后端错误来自异步的 resolve 调用。
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Arity error: expected {expected} ids, got {given}")]
    Arity { expected: usize, given: usize },

    #[error("Field not declared: {0}")]
    FieldNotDeclared(String),

    #[error("Structure error: {0}")]
    Structure(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

/// 后端执行错误
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(#[from] RespError),

    #[error("Connection timeout")]
    Timeout,

    /// 之前的批次读取失败，连接已不可用
    #[error("Connection broken by an earlier failed batch")]
    ConnectionBroken,

    /// 服务端返回的错误回复
    #[error("Server error: {0}")]
    Server(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unexpected reply: {0}")]
    UnexpectedReply(String),
}

pub type Result<T> = std::result::Result<T, Error>;
pub type BackendResult<T> = std::result::Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_converts_through_backend() {
        let err: Error = BackendError::from(StoreError::WrongType).into();
        assert!(matches!(err, Error::Backend(BackendError::Store(StoreError::WrongType))));
        assert!(err.to_string().contains("WRONGTYPE"));
    }

    #[test]
    fn test_arity_message() {
        let err = Error::Arity {
            expected: 2,
            given: 1,
        };
        assert_eq!(err.to_string(), "Arity error: expected 2 ids, got 1");
    }
}
