// ==========================================
// 员工导入系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::ImportApi;
use crate::db::open_and_init;

/// 应用状态
///
/// 所有组件共享同一数据库连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 员工导入API
    pub import_api: Arc<ImportApi>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        // 打开连接并建表（共享连接）
        let conn = open_and_init(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        let import_api =
            ImportApi::new(conn).map_err(|e| format!("初始化导入API失败: {}", e))?;

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            import_api: Arc::new(import_api),
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级: EMPLOYEE_IMPORT_DB_PATH 环境变量 > 用户数据目录 > ./employee_import.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var("EMPLOYEE_IMPORT_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./employee_import.db");

    // 尝试获取用户数据目录
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("employee-import");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("employee_import.db");
        }
    }

    path.to_string_lossy().to_string()
}
