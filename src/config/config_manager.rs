// ==========================================
// 员工导入系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// 缺省: 键不存在时返回内置默认值
// ==========================================

use crate::config::import_config_trait::{
    AtomicityPolicy, ImportConfigReader, DEFAULT_EMPLOYEE_BATCH_SIZE,
    DEFAULT_MAX_FILE_SIZE_BYTES,
};
use crate::db::open_and_init;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::sync::{Arc, Mutex};

/// 配置键常量
pub mod config_keys {
    pub const MAX_FILE_SIZE_BYTES: &str = "import.max_file_size_bytes";
    pub const ATOMICITY_POLICY: &str = "import.atomicity_policy";
    pub const EMPLOYEE_BATCH_SIZE: &str = "import.employee_batch_size";
}

type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_and_init(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        Ok(value)
    }

    /// 写入 global scope 的配置值（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES ('global', ?1, ?2, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, value],
        )?;

        tracing::info!(key = %key, value = %value, "配置已更新");
        Ok(())
    }

    /// 读取并解析配置，缺失时返回默认值
    fn get_parsed<T>(&self, key: &str, default: T) -> ConfigResult<T>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get_global_config_value(key)? {
            None => Ok(default),
            Some(raw) => raw.trim().parse::<T>().map_err(|e| {
                format!("配置值格式错误 (key: {}, value: {}): {}", key, raw, e).into()
            }),
        }
    }
}

#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_max_file_size_bytes(&self) -> ConfigResult<u64> {
        self.get_parsed(config_keys::MAX_FILE_SIZE_BYTES, DEFAULT_MAX_FILE_SIZE_BYTES)
    }

    async fn get_atomicity_policy(&self) -> ConfigResult<AtomicityPolicy> {
        self.get_parsed(config_keys::ATOMICITY_POLICY, AtomicityPolicy::default())
    }

    async fn get_employee_batch_size(&self) -> ConfigResult<usize> {
        let size = self.get_parsed(config_keys::EMPLOYEE_BATCH_SIZE, DEFAULT_EMPLOYEE_BATCH_SIZE)?;
        if size == 0 {
            return Err(format!("{} 必须大于 0", config_keys::EMPLOYEE_BATCH_SIZE).into());
        }
        Ok(size)
    }
}
