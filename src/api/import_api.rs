// ==========================================
// 员工导入API
// ==========================================
// 职责: 封装导入与只读查询，供 HTTP 层/CLI 调用
// 输出: ImportReport 或 ApiError（状态码 + 结构化错误）
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::company::{Company, EmployeeView};
use crate::domain::import::ImportReport;
use crate::importer::{EmployeeImporter, EmployeeImporterImpl};
use crate::repository::SqliteEmployeeRepository;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

type SqliteImporter = EmployeeImporterImpl<SqliteEmployeeRepository, ConfigManager>;

/// 导入API
pub struct ImportApi {
    importer: SqliteImporter,
}

impl ImportApi {
    /// 基于共享连接创建 ImportApi（调用方负责建表）
    pub fn new(conn: Arc<Mutex<Connection>>) -> ApiResult<Self> {
        let repo = SqliteEmployeeRepository::from_connection(conn.clone());
        let config = ConfigManager::from_connection(conn)
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;

        Ok(Self {
            importer: EmployeeImporterImpl::with_defaults(repo, config),
        })
    }

    /// 导入上传文件
    ///
    /// # 参数
    /// - file_bytes: 文件内容
    /// - file_name: 上传文件名
    ///
    /// # 返回
    /// - Ok(ImportReport): 导入报告（部分成功也返回 Ok）
    /// - Err(ApiError): 预处理失败或存储失败
    pub async fn import_file(&self, file_bytes: &[u8], file_name: &str) -> ApiResult<ImportReport> {
        self.importer
            .import(file_bytes, file_name)
            .await
            .map_err(|e| {
                warn!(file_name = %file_name, error = %e, "导入失败");
                ApiError::from(e)
            })
    }

    /// 从本地路径导入
    pub async fn import_path(&self, file_path: &Path) -> ApiResult<ImportReport> {
        self.importer.import_from_path(file_path).await.map_err(|e| {
            warn!(file_path = %file_path.display(), error = %e, "导入失败");
            ApiError::from(e)
        })
    }

    /// 查询全部公司（按创建顺序）
    pub fn list_companies(&self) -> ApiResult<Vec<Company>> {
        Ok(self.importer.repository().list_companies()?)
    }

    /// 查询全部员工（公司以名称展示）
    pub fn list_employees(&self) -> ApiResult<Vec<EmployeeView>> {
        Ok(self.importer.repository().list_employees()?)
    }

    /// 删除公司（级联删除其员工）
    pub fn delete_company(&self, name: &str) -> ApiResult<()> {
        if name.trim().is_empty() {
            return Err(ApiError::InvalidInput(
                "公司名称不能为空".to_string(),
            ));
        }

        if !self.importer.repository().delete_company(name)? {
            return Err(ApiError::NotFound(format!("公司 {}", name)));
        }

        info!(company = %name, "公司已删除");
        Ok(())
    }
}
