use thiserror::Error;
use utils::AppError;

/// Ledger-Indexer 错误类型定义
#[derive(Error, Debug)]
pub enum LedgerError {
    /// 不可能出现的事件顺序（例如给不存在的推荐人累加），该事件必须中止并人工排查
    #[error("不变量被破坏: {0}")]
    InvariantViolation(String),

    /// 读取链上合约失败，整个事件需要由上游平台重试
    #[error("外部读取失败: {0}")]
    ExternalRead(String),

    #[error("存储错误: {0}")]
    Store(#[from] AppError),

    #[error("配置错误: {0}")]
    Config(String),

    #[error("事件校验失败: {0}")]
    EventValidation(String),

    #[error("事件源错误: {0}")]
    EventSource(String),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO错误: {0}")]
    IO(#[from] std::io::Error),
}

impl LedgerError {
    /// 是否为可重试的瞬时错误
    pub fn is_transient(&self) -> bool {
        matches!(self, LedgerError::ExternalRead(_))
    }

    /// 存储层返回"不存在"时转换为不变量错误
    pub fn missing(what: impl Into<String>) -> Self {
        LedgerError::InvariantViolation(format!("{} 不存在", what.into()))
    }
}

impl From<validator::ValidationErrors> for LedgerError {
    fn from(err: validator::ValidationErrors) -> Self {
        LedgerError::EventValidation(err.to_string())
    }
}

/// Result类型别名
pub type Result<T> = std::result::Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_external_reads_are_transient() {
        assert!(LedgerError::ExternalRead("timeout".into()).is_transient());
        assert!(!LedgerError::missing("Referrer domob").is_transient());
        assert!(!LedgerError::Store(AppError::NotFound("Referrer domob".into())).is_transient());
    }

    #[test]
    fn test_missing_message() {
        assert_eq!(
            LedgerError::missing("SaleTier 0xabc").to_string(),
            "不变量被破坏: SaleTier 0xabc 不存在"
        );
    }
}
