// ==========================================
// 员工导入系统 - 表结构校验器
// ==========================================
// 职责: 必填列齐全 + 数据非空（顺序检查）
// 红线: 任一失败即中止导入，不进入行处理
// ==========================================

use crate::domain::import::REQUIRED_COLUMNS;
use crate::importer::error::{ImportError, ImportResult};
use std::collections::HashSet;

pub struct SchemaValidator;

impl SchemaValidator {
    /// 校验表头与数据行数
    ///
    /// # 检查顺序
    /// 1. 必填列全部存在，否则 MissingColumns（列出全部缺失列）
    /// 2. 数据行非空，否则 EmptyData
    pub fn validate(&self, headers: &[String], row_count: usize) -> ImportResult<()> {
        let missing = self.missing_columns(headers);
        if !missing.is_empty() {
            return Err(ImportError::MissingColumns(missing));
        }

        if row_count == 0 {
            return Err(ImportError::EmptyData);
        }

        Ok(())
    }

    /// 缺失的必填列（按必填列定义顺序）
    pub fn missing_columns(&self, headers: &[String]) -> Vec<String> {
        let present: HashSet<&str> = headers.iter().map(|h| h.as_str()).collect();
        REQUIRED_COLUMNS
            .iter()
            .filter(|col| !present.contains(**col))
            .map(|col| col.to_string())
            .collect()
    }
}
