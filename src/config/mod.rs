// ==========================================
// 员工导入系统 - 配置层
// ==========================================
// 职责: 导入参数（文件大小上限/原子性策略/批大小）
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod import_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use import_config_trait::{
    AtomicityPolicy, ImportConfigReader, DEFAULT_EMPLOYEE_BATCH_SIZE,
    DEFAULT_MAX_FILE_SIZE_BYTES,
};
