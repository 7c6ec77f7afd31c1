// ==========================================
// 员工导入系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 分类:
// - ImportError: 预处理失败，整体中止且零写入
// - RowErrorKind: 行级失败，收集进报告，不中止批次
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型（中止整个导入）
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件格式不支持: {0}（仅支持 .xlsx/.csv）")]
    UnsupportedFormat(String),

    #[error("文件过大: {size} 字节，超过上限 {max} 字节")]
    FileTooLarge { size: u64, max: u64 },

    #[error("文件无法读取: {0}")]
    UnreadableFile(String),

    // ===== 表结构错误 =====
    #[error("缺少必需列: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("文件不包含数据行")]
    EmptyData,

    // ===== 配置/存储错误 =====
    #[error("配置读取失败: {0}")]
    Config(String),

    #[error("存储失败: {0}")]
    Storage(#[from] RepositoryError),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::UnreadableFile(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::UnreadableFile(format!("CSV: {}", err))
    }
}

// 实现 From<calamine::XlsxError>
impl From<calamine::XlsxError> for ImportError {
    fn from(err: calamine::XlsxError) -> Self {
        ImportError::UnreadableFile(format!("XLSX: {}", err))
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

/// 行级错误（收集进报告）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowErrorKind {
    #[error("公司名称无效: 须为非空字符串且不超过 255 个字符")]
    InvalidCompanyName,

    #[error("员工编号无效 ({value}): 须为正整数")]
    InvalidEmployeeId { value: String },

    #[error("薪资无效 ({value}): {reason}")]
    InvalidSalary { value: String, reason: String },

    #[error("字段值无效 (字段 {field}, 值 {value}): {reason}")]
    InvalidField {
        field: String,
        value: String,
        reason: String,
    },

    #[error("存储失败: {0}")]
    Storage(String),
}
