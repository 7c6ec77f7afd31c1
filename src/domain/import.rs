// ==========================================
// 员工导入系统 - 导入管道领域模型
// ==========================================
// 职责: 原始行 / 候选记录 / 导入报告
// 生命周期: 仅在一次导入流程内
// ==========================================

use crate::domain::company::EmployeeFields;
use crate::importer::error::RowErrorKind;
use serde::{Serialize, Serializer};
use std::collections::HashMap;

/// 必填列（固定集合，顺序即报告顺序）
pub const REQUIRED_COLUMNS: [&str; 8] = [
    "COMPANY_NAME",
    "FIRST_NAME",
    "LAST_NAME",
    "PHONE_NUMBER",
    "EMPLOYEE_ID",
    "MANAGER_ID",
    "DEPARTMENT_ID",
    "SALARY",
];

/// 重复记录原因（固定文案）
pub const DUPLICATE_REASON: &str = "already exists";

// ==========================================
// FileFormat - 文件格式
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Xlsx,
    Csv,
}

// ==========================================
// CellValue - 单元格原始值
// ==========================================
// CSV 全部为 Text；XLSX 保留数值/布尔类型
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl CellValue {
    /// 是否为空白（Empty 或仅含空白字符的文本）
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// 用于报告展示的原始值
    pub fn display_value(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Int(i) => i.to_string(),
            CellValue::Float(f) => f.to_string(),
            CellValue::Bool(b) => b.to_string(),
        }
    }
}

// ==========================================
// RawRow - 原始数据行
// ==========================================
// row_number: 文件中的实际行号（表头为第 1 行，首个数据行为第 2 行）
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub row_number: usize,
    pub cells: HashMap<String, CellValue>,
}

impl RawRow {
    /// 取列值；缺失的列（短行）视为空
    pub fn get(&self, column: &str) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.cells.get(column).unwrap_or(&EMPTY)
    }
}

// ==========================================
// ParsedTable - 解析结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

// ==========================================
// CandidateRecord - 候选记录
// ==========================================
// 通过规范化、待身份解析的行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRecord {
    pub row_number: usize,
    pub company_name: String,
    pub fields: EmployeeFields,
}

// ==========================================
// RowError - 行级错误
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowError {
    pub row: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(serialize_with = "serialize_display")]
    pub error: RowErrorKind,
}

// ==========================================
// DuplicateRecord - 重复记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateRecord {
    pub row: usize,
    pub company: String,
    pub employee_id: i64,
    pub reason: String,
}

impl DuplicateRecord {
    pub fn new(row: usize, company: impl Into<String>, employee_id: i64) -> Self {
        Self {
            row,
            company: company.into(),
            employee_id,
            reason: DUPLICATE_REASON.to_string(),
        }
    }
}

// ==========================================
// ImportReport - 导入报告
// ==========================================
// errors / duplicates 为空时不输出
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub companies_created: usize,
    pub employees_created: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<RowError>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub duplicates: Vec<DuplicateRecord>,
}

impl ImportReport {
    /// 按行号排序（稳定排序，同一行保持发现顺序）
    pub fn sort_by_row(&mut self) {
        self.errors.sort_by_key(|e| e.row);
        self.duplicates.sort_by_key(|d| d.row);
    }
}

fn serialize_display<T: std::fmt::Display, S: Serializer>(
    value: &T,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_omits_empty_lists() {
        let report = ImportReport {
            companies_created: 1,
            employees_created: 1,
            ..Default::default()
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json, serde_json::json!({"companiesCreated": 1, "employeesCreated": 1}));
    }

    #[test]
    fn test_report_serializes_errors_and_duplicates() {
        let report = ImportReport {
            companies_created: 0,
            employees_created: 0,
            errors: vec![RowError {
                row: 3,
                company: None,
                error: RowErrorKind::InvalidCompanyName,
            }],
            duplicates: vec![DuplicateRecord::new(4, "Acme", 7)],
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["errors"][0]["row"], 3);
        assert!(json["errors"][0].get("company").is_none());
        assert!(json["errors"][0]["error"].as_str().unwrap().contains("公司名称"));
        assert_eq!(json["duplicates"][0]["employeeId"], 7);
        assert_eq!(json["duplicates"][0]["reason"], "already exists");
    }

    #[test]
    fn test_raw_row_missing_column_is_empty() {
        let row = RawRow {
            row_number: 2,
            cells: HashMap::new(),
        };
        assert_eq!(row.get("SALARY"), &CellValue::Empty);
        assert!(row.get("SALARY").is_blank());
    }
}
