// ==========================================
// 员工导入系统 - 行规范化器实现
// ==========================================
// 职责: 原始行 → 强类型候选记录（逐字段显式转换）
// 顺序: 公司名 → 员工号 → 薪资 → 经理/部门号 → 文本字段
// 约束: 任一字段失败即整行记为行级错误，批次继续
// ==========================================

use crate::domain::company::EmployeeFields;
use crate::domain::import::{CandidateRecord, CellValue, RawRow, RowError};
use crate::importer::error::RowErrorKind;
use crate::importer::importer_trait::RowNormalizer;
use rust_decimal::Decimal;
use std::str::FromStr;

// 字段长度/精度约束
pub const MAX_COMPANY_NAME_LEN: usize = 255;
pub const MAX_NAME_LEN: usize = 100;
pub const MAX_PHONE_LEN: usize = 20;
pub const SALARY_MAX_DIGITS: u32 = 10;
pub const SALARY_DECIMAL_PLACES: u32 = 2;

// 列名
pub mod columns {
    pub const COMPANY_NAME: &str = "COMPANY_NAME";
    pub const FIRST_NAME: &str = "FIRST_NAME";
    pub const LAST_NAME: &str = "LAST_NAME";
    pub const PHONE_NUMBER: &str = "PHONE_NUMBER";
    pub const EMPLOYEE_ID: &str = "EMPLOYEE_ID";
    pub const MANAGER_ID: &str = "MANAGER_ID";
    pub const DEPARTMENT_ID: &str = "DEPARTMENT_ID";
    pub const SALARY: &str = "SALARY";
}

pub struct RowNormalizerImpl;

impl RowNormalizer for RowNormalizerImpl {
    fn normalize(&self, row: &RawRow) -> Result<CandidateRecord, RowError> {
        let row_number = row.row_number;

        let company_name =
            coerce_company_name(row.get(columns::COMPANY_NAME)).map_err(|kind| RowError {
                row: row_number,
                company: None,
                error: kind,
            })?;

        let fail = |kind: RowErrorKind| RowError {
            row: row_number,
            company: Some(company_name.clone()),
            error: kind,
        };

        let employee_id = coerce_employee_id(row.get(columns::EMPLOYEE_ID)).map_err(&fail)?;
        let salary = coerce_salary(row.get(columns::SALARY)).map_err(&fail)?;
        let manager_id = coerce_int_field(row, columns::MANAGER_ID).map_err(&fail)?;
        let department_id = coerce_int_field(row, columns::DEPARTMENT_ID).map_err(&fail)?;
        let first_name = coerce_text_field(row, columns::FIRST_NAME, MAX_NAME_LEN).map_err(&fail)?;
        let last_name = coerce_text_field(row, columns::LAST_NAME, MAX_NAME_LEN).map_err(&fail)?;
        let phone_number =
            coerce_text_field(row, columns::PHONE_NUMBER, MAX_PHONE_LEN).map_err(&fail)?;

        Ok(CandidateRecord {
            row_number,
            company_name,
            fields: EmployeeFields {
                employee_id,
                first_name,
                last_name,
                phone_number,
                salary,
                manager_id,
                department_id,
            },
        })
    }
}

// ==========================================
// 单元格转换函数
// ==========================================

/// 浮点数是否为整数值（且在 i64 范围内）
fn whole_number(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15 {
        Some(f as i64)
    } else {
        None
    }
}

/// 单元格 → 去除首尾空白的文本
///
/// Excel 中的整数值浮点（如电话号码 5550100.0）输出为 "5550100"
pub fn cell_text(cell: &CellValue) -> String {
    match cell {
        CellValue::Empty => String::new(),
        CellValue::Text(s) => s.trim().to_string(),
        CellValue::Int(i) => i.to_string(),
        CellValue::Float(f) => match whole_number(*f) {
            Some(i) => i.to_string(),
            None => f.to_string(),
        },
        CellValue::Bool(b) => b.to_string(),
    }
}

/// 单元格 → 整数（接受 "42"、42、42.0、"42.0"）
pub fn cell_integer(cell: &CellValue) -> Option<i64> {
    match cell {
        CellValue::Int(i) => Some(*i),
        CellValue::Float(f) => whole_number(*f),
        CellValue::Text(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(whole_number))
        }
        CellValue::Empty | CellValue::Bool(_) => None,
    }
}

/// 公司名：非空字符串（TRIM 后），长度上限 255
pub fn coerce_company_name(cell: &CellValue) -> Result<String, RowErrorKind> {
    let name = match cell {
        CellValue::Empty | CellValue::Bool(_) => return Err(RowErrorKind::InvalidCompanyName),
        other => cell_text(other),
    };

    if name.is_empty() || name.chars().count() > MAX_COMPANY_NAME_LEN {
        return Err(RowErrorKind::InvalidCompanyName);
    }
    Ok(name)
}

/// 员工号：正整数
pub fn coerce_employee_id(cell: &CellValue) -> Result<i64, RowErrorKind> {
    match cell_integer(cell) {
        Some(id) if id > 0 => Ok(id),
        _ => Err(RowErrorKind::InvalidEmployeeId {
            value: cell.display_value(),
        }),
    }
}

/// 薪资：正数定点小数，最多 10 位有效数字、2 位小数，统一为 2 位小数
pub fn coerce_salary(cell: &CellValue) -> Result<Decimal, RowErrorKind> {
    let invalid = |reason: &str| RowErrorKind::InvalidSalary {
        value: cell.display_value(),
        reason: reason.to_string(),
    };

    let parsed = match cell {
        CellValue::Int(i) => Some(Decimal::from(*i)),
        // 经最短十进制表示转换，避免二进制浮点尾差
        CellValue::Float(f) if f.is_finite() => Decimal::from_str(&f.to_string()).ok(),
        CellValue::Text(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    };

    let salary = parsed
        .ok_or_else(|| invalid("须为十进制数"))?
        .normalize();

    if salary <= Decimal::ZERO {
        return Err(invalid("须大于 0"));
    }
    if salary.scale() > SALARY_DECIMAL_PLACES {
        return Err(invalid("小数位不能超过 2 位"));
    }
    let integer_limit = Decimal::from(10_i64.pow(SALARY_MAX_DIGITS - SALARY_DECIMAL_PLACES));
    if salary.trunc() >= integer_limit {
        return Err(invalid("总位数不能超过 10 位"));
    }

    let mut salary = salary;
    salary.rescale(SALARY_DECIMAL_PLACES);
    Ok(salary)
}

/// 整数字段（无正数约束）
fn coerce_int_field(row: &RawRow, column: &str) -> Result<i64, RowErrorKind> {
    let cell = row.get(column);
    cell_integer(cell).ok_or_else(|| RowErrorKind::InvalidField {
        field: column.to_string(),
        value: cell.display_value(),
        reason: "须为整数".to_string(),
    })
}

/// 文本字段（TRIM + 长度上限）
fn coerce_text_field(row: &RawRow, column: &str, max_len: usize) -> Result<String, RowErrorKind> {
    let text = cell_text(row.get(column));
    if text.chars().count() > max_len {
        return Err(RowErrorKind::InvalidField {
            field: column.to_string(),
            value: text,
            reason: format!("长度不能超过 {} 个字符", max_len),
        });
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn valid_row(row_number: usize) -> RawRow {
        let mut cells = HashMap::new();
        cells.insert(columns::COMPANY_NAME.to_string(), text("  Acme  "));
        cells.insert(columns::FIRST_NAME.to_string(), text(" Ada "));
        cells.insert(columns::LAST_NAME.to_string(), text("Lovelace"));
        cells.insert(columns::PHONE_NUMBER.to_string(), text("555-0100"));
        cells.insert(columns::EMPLOYEE_ID.to_string(), text("1"));
        cells.insert(columns::MANAGER_ID.to_string(), text("0"));
        cells.insert(columns::DEPARTMENT_ID.to_string(), text("10"));
        cells.insert(columns::SALARY.to_string(), text("50000"));
        RawRow { row_number, cells }
    }

    fn with(mut row: RawRow, column: &str, value: CellValue) -> RawRow {
        row.cells.insert(column.to_string(), value);
        row
    }

    #[test]
    fn test_normalize_valid_row() {
        let record = RowNormalizerImpl.normalize(&valid_row(2)).unwrap();

        assert_eq!(record.row_number, 2);
        assert_eq!(record.company_name, "Acme");
        assert_eq!(record.fields.employee_id, 1);
        assert_eq!(record.fields.first_name, "Ada");
        assert_eq!(record.fields.salary.to_string(), "50000.00");
        assert_eq!(record.fields.manager_id, 0);
        assert_eq!(record.fields.department_id, 10);
    }

    #[test]
    fn test_blank_company_name_has_no_company() {
        let row = with(valid_row(3), columns::COMPANY_NAME, text("   "));

        let err = RowNormalizerImpl.normalize(&row).unwrap_err();

        assert_eq!(err.row, 3);
        assert_eq!(err.company, None);
        assert_eq!(err.error, RowErrorKind::InvalidCompanyName);
    }

    #[test]
    fn test_company_name_too_long() {
        let row = with(valid_row(2), columns::COMPANY_NAME, text(&"x".repeat(256)));
        let err = RowNormalizerImpl.normalize(&row).unwrap_err();
        assert_eq!(err.error, RowErrorKind::InvalidCompanyName);
    }

    #[test]
    fn test_employee_id_must_be_positive_integer() {
        for bad in ["0", "-3", "abc", "1.5", ""] {
            let row = with(valid_row(4), columns::EMPLOYEE_ID, text(bad));
            let err = RowNormalizerImpl.normalize(&row).unwrap_err();
            assert!(
                matches!(err.error, RowErrorKind::InvalidEmployeeId { .. }),
                "value {:?} should be rejected",
                bad
            );
            assert_eq!(err.company.as_deref(), Some("Acme"));
        }
    }

    #[test]
    fn test_employee_id_accepts_spreadsheet_numbers() {
        assert_eq!(coerce_employee_id(&CellValue::Float(7.0)).unwrap(), 7);
        assert_eq!(coerce_employee_id(&CellValue::Int(8)).unwrap(), 8);
        assert_eq!(coerce_employee_id(&text("9.0")).unwrap(), 9);
    }

    #[test]
    fn test_negative_salary_rejected() {
        let row = with(valid_row(2), columns::SALARY, text("-5"));

        let err = RowNormalizerImpl.normalize(&row).unwrap_err();

        match err.error {
            RowErrorKind::InvalidSalary { value, reason } => {
                assert_eq!(value, "-5");
                assert!(reason.contains("大于 0"));
            }
            other => panic!("expected InvalidSalary, got {:?}", other),
        }
    }

    #[test]
    fn test_salary_precision_rules() {
        assert!(coerce_salary(&text("0")).is_err());
        assert!(coerce_salary(&text("abc")).is_err());
        assert!(coerce_salary(&text("10.123")).is_err());
        assert!(coerce_salary(&text("100000000")).is_err());
        assert_eq!(coerce_salary(&text("99999999.99")).unwrap().to_string(), "99999999.99");
        assert_eq!(coerce_salary(&text("10.50")).unwrap().to_string(), "10.50");
        assert_eq!(coerce_salary(&CellValue::Float(1234.5)).unwrap().to_string(), "1234.50");
        assert_eq!(coerce_salary(&CellValue::Float(0.1)).unwrap().to_string(), "0.10");
    }

    #[test]
    fn test_manager_id_allows_zero_and_negative() {
        let row = with(valid_row(2), columns::MANAGER_ID, text("-1"));
        let record = RowNormalizerImpl.normalize(&row).unwrap();
        assert_eq!(record.fields.manager_id, -1);
    }

    #[test]
    fn test_department_id_must_be_integer() {
        let row = with(valid_row(6), columns::DEPARTMENT_ID, text("sales"));

        let err = RowNormalizerImpl.normalize(&row).unwrap_err();

        match err.error {
            RowErrorKind::InvalidField { field, value, .. } => {
                assert_eq!(field, "DEPARTMENT_ID");
                assert_eq!(value, "sales");
            }
            other => panic!("expected InvalidField, got {:?}", other),
        }
    }

    #[test]
    fn test_phone_number_from_numeric_cell() {
        let row = with(valid_row(2), columns::PHONE_NUMBER, CellValue::Float(5550100.0));
        let record = RowNormalizerImpl.normalize(&row).unwrap();
        assert_eq!(record.fields.phone_number, "5550100");
    }

    #[test]
    fn test_phone_number_too_long() {
        let row = with(valid_row(2), columns::PHONE_NUMBER, text(&"9".repeat(21)));
        let err = RowNormalizerImpl.normalize(&row).unwrap_err();
        assert!(matches!(err.error, RowErrorKind::InvalidField { ref field, .. } if field == "PHONE_NUMBER"));
    }

    #[test]
    fn test_first_failing_field_is_reported() {
        // 员工号与薪资同时非法时报告员工号
        let row = with(valid_row(2), columns::EMPLOYEE_ID, text("x"));
        let row = with(row, columns::SALARY, text("-1"));

        let err = RowNormalizerImpl.normalize(&row).unwrap_err();

        assert!(matches!(err.error, RowErrorKind::InvalidEmployeeId { .. }));
    }
}
