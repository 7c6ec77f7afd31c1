// ==========================================
// 员工导入系统 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::str::FromStr;

/// 默认文件大小上限: 10 MiB
pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;

/// 默认每批写入员工数
pub const DEFAULT_EMPLOYEE_BATCH_SIZE: usize = 500;

// ==========================================
// AtomicityPolicy - 落库原子性策略
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AtomicityPolicy {
    /// 部分成功：存储错误记入报告，已写入数据不回滚
    #[default]
    PartialSuccess,
    /// 全有或全无：任一存储错误回滚本次导入全部写入
    AllOrNothing,
}

impl AtomicityPolicy {
    pub fn is_all_or_nothing(self) -> bool {
        matches!(self, AtomicityPolicy::AllOrNothing)
    }
}

impl fmt::Display for AtomicityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AtomicityPolicy::PartialSuccess => write!(f, "PARTIAL_SUCCESS"),
            AtomicityPolicy::AllOrNothing => write!(f, "ALL_OR_NOTHING"),
        }
    }
}

impl FromStr for AtomicityPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PARTIAL_SUCCESS" => Ok(AtomicityPolicy::PartialSuccess),
            "ALL_OR_NOTHING" => Ok(AtomicityPolicy::AllOrNothing),
            other => Err(format!("未知的原子性策略: {}", other)),
        }
    }
}

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入模块所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 获取上传文件大小上限（字节）
    ///
    /// # 默认值
    /// - 10 MiB
    async fn get_max_file_size_bytes(&self) -> Result<u64, Box<dyn Error + Send + Sync>>;

    /// 获取落库原子性策略
    ///
    /// # 默认值
    /// - PARTIAL_SUCCESS
    async fn get_atomicity_policy(&self) -> Result<AtomicityPolicy, Box<dyn Error + Send + Sync>>;

    /// 获取每次 create_employees 的批大小
    ///
    /// # 默认值
    /// - 500
    async fn get_employee_batch_size(&self) -> Result<usize, Box<dyn Error + Send + Sync>>;
}
