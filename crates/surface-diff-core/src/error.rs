use thiserror::Error;

/// surface-diff 工具的错误类型定义
#[derive(Error, Debug)]
pub enum SurfaceDiffError {
    /// 同一作用域内出现了重复的身份键（类型的限定名或成员签名）
    #[error("Duplicate identity in {scope}: {key}")]
    DuplicateIdentity { scope: String, key: String },

    #[error("Malformed snapshot: {0}")]
    MalformedSnapshot(String),

    #[error("File I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid exclusion pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl SurfaceDiffError {
    /// 构造重复身份错误
    pub fn duplicate(scope: impl Into<String>, key: impl Into<String>) -> Self {
        Self::DuplicateIdentity {
            scope: scope.into(),
            key: key.into(),
        }
    }
}

impl From<serde_json::Error> for SurfaceDiffError {
    fn from(err: serde_json::Error) -> Self {
        // 读写层面的 I/O 失败保持为 I/O 错误，其余都属于数据格式问题
        if err.is_io() {
            SurfaceDiffError::IoError(err.into())
        } else {
            SurfaceDiffError::MalformedSnapshot(err.to_string())
        }
    }
}

/// 项目通用的 Result 类型别名
pub type Result<T> = std::result::Result<T, SurfaceDiffError>;
