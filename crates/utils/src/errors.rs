use thiserror::Error;

/// 全局通用错误类型
///
/// 存储层与配置层的错误统一收敛到这里，业务层（ledger-indexer）再把它包装进自己的错误枚举
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("MongoDB错误: {0}")]
    MongoError(#[from] mongodb::error::Error),

    #[error("BSON序列化错误: {0}")]
    BsonSerialization(#[from] mongodb::bson::ser::Error),

    #[error("BSON反序列化错误: {0}")]
    BsonDeserialization(#[from] mongodb::bson::de::Error),

    #[error("JSON序列化错误: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// 是否为"记录不存在"类错误
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;
