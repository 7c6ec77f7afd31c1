// ==========================================
// 员工导入系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 核心: 表格文件（Excel/CSV）→ 公司/员工记录 + 导入报告
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与报告类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 导入参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 导入/查询接口
pub mod api;

// 应用层 - 组件装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{Company, Employee, EmployeeView, ImportReport};

// 导入
pub use importer::{EmployeeImporter, EmployeeImporterImpl, ImportError};

// API
pub use api::{ApiError, ImportApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "员工导入系统";
