use thiserror::Error;

/// 领域层错误类型
#[derive(Error, Debug)]
pub enum DomainError {
    /// 配置缺失（凭据或环境变量）
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// 上游网关请求或解析失败
    #[error("Upstream error: {0}")]
    UpstreamError(String),

    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 记录未找到
    #[error("Purchase record not found for payment: {0}")]
    RecordNotFound(String),

    /// 一个支付ID匹配到多条记录
    #[error("Payment {payment_id} matched {} records", record_ids.len())]
    AmbiguousMatch {
        payment_id: String,
        record_ids: Vec<String>,
    },

    /// 记录写入失败
    #[error("Record store write failed: {0}")]
    WriteError(String),

    /// 序列化错误
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// 加密错误
    #[error("Cryptography error: {0}")]
    CryptoError(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// 是否为客户端输入错误（映射为400）
    pub fn is_client_error(&self) -> bool {
        matches!(self, DomainError::ValidationError(_))
    }
}

/// 领域结果类型
pub type DomainResult<T> = Result<T, DomainError>;
