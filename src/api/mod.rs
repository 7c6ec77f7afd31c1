// ==========================================
// 员工导入系统 - API 层
// ==========================================
// 职责: 提供导入与查询接口,供 HTTP 层/CLI 调用
// ==========================================

pub mod error;
pub mod import_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult, ErrorResponse};
pub use import_api::ImportApi;
