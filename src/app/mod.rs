// ==========================================
// 员工导入系统 - 应用层
// ==========================================
// 职责: 组件装配（共享连接 → 仓储/配置 → API）
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
