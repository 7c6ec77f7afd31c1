// ==========================================
// 员工导入系统 - API层错误类型
// ==========================================
// 职责: 将导入/仓储错误转换为边界错误（状态码 + 错误码 + 结构化响应）
// 状态码: 415 格式不支持 / 413 文件过大 / 400 其他预处理失败 / 500 存储与配置
// ==========================================

use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 预处理错误（零写入）
    // ==========================================
    #[error("文件格式不支持: {0}（仅支持 .xlsx/.csv）")]
    UnsupportedFormat(String),

    #[error("文件过大: {size} 字节，超过上限 {max} 字节")]
    FileTooLarge { size: u64, max: u64 },

    #[error("文件无法读取: {0}")]
    UnreadableFile(String),

    #[error("缺少必需列: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("文件不包含数据行")]
    EmptyData,

    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("记录未找到: {0}")]
    NotFound(String),

    // ==========================================
    // 数据访问/配置错误
    // ==========================================
    #[error("配置错误: {0}")]
    ConfigError(String),

    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// HTTP 状态码
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::UnsupportedFormat(_) => 415,
            ApiError::FileTooLarge { .. } => 413,
            ApiError::UnreadableFile(_)
            | ApiError::MissingColumns(_)
            | ApiError::EmptyData
            | ApiError::InvalidInput(_) => 400,
            ApiError::NotFound(_) => 404,
            ApiError::ConfigError(_)
            | ApiError::DatabaseError(_)
            | ApiError::DatabaseConnectionError(_)
            | ApiError::DatabaseTransactionError(_)
            | ApiError::Other(_) => 500,
        }
    }

    /// 错误码（前端/调用方据此分支处理）
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            ApiError::FileTooLarge { .. } => "FILE_TOO_LARGE",
            ApiError::UnreadableFile(_) => "UNREADABLE_FILE",
            ApiError::MissingColumns(_) => "MISSING_COLUMNS",
            ApiError::EmptyData => "EMPTY_DATA",
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::ConfigError(_) => "CONFIG_ERROR",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
            ApiError::DatabaseConnectionError(_) => "DATABASE_CONNECTION_ERROR",
            ApiError::DatabaseTransactionError(_) => "DATABASE_TRANSACTION_ERROR",
            ApiError::Other(_) => "OTHER_ERROR",
        }
    }

    /// 结构化错误响应
    pub fn to_response(&self) -> ErrorResponse {
        let details = match self {
            ApiError::MissingColumns(columns) => {
                Some(serde_json::json!({ "missingColumns": columns }))
            }
            ApiError::FileTooLarge { size, max } => {
                Some(serde_json::json!({ "size": size, "maxSize": max }))
            }
            ApiError::UnsupportedFormat(extension) => {
                Some(serde_json::json!({ "extension": extension }))
            }
            _ => None,
        };

        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details,
        }
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::UnsupportedFormat(ext) => ApiError::UnsupportedFormat(ext),
            ImportError::FileTooLarge { size, max } => ApiError::FileTooLarge { size, max },
            ImportError::UnreadableFile(msg) => ApiError::UnreadableFile(msg),
            ImportError::MissingColumns(columns) => ApiError::MissingColumns(columns),
            ImportError::EmptyData => ApiError::EmptyData,
            ImportError::Config(msg) => ApiError::ConfigError(msg),
            ImportError::Storage(err) => err.into(),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{} '{}'", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("连接锁不可用: {}", msg))
            }
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::DatabaseQueryError(msg)
            | RepositoryError::UniqueConstraintViolation(msg)
            | RepositoryError::ForeignKeyViolation(msg) => ApiError::DatabaseError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

// ==========================================
// ErrorResponse - 错误响应体
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// 错误代码
    pub code: String,

    /// 错误消息
    pub message: String,

    /// 详细信息（可选）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}
