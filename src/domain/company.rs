// ==========================================
// 员工导入系统 - 公司/员工领域模型
// ==========================================
// 职责: 持久化实体定义（Company / Employee）
// 约束: 公司名唯一（区分大小写，已 TRIM）
// 约束: (company, employee_id) 全局唯一
// ==========================================

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// Company - 公司
// ==========================================
// 生命周期: 导入时首次出现即创建，导入管道不更新
// 删除: 级联删除其下全部员工
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ==========================================
// Employee - 员工
// ==========================================
// 生命周期: 仅在导入时创建一次，导入管道不修改不删除
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: i64,
    pub company_id: i64,         // 所属公司（FK，ON DELETE CASCADE）
    pub employee_id: i64,        // 公司内唯一，> 0
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub salary: Decimal,         // 定点小数，> 0，两位小数
    pub manager_id: i64,         // 源组织外部标识，不校验引用
    pub department_id: i64,      // 源组织外部标识，不校验引用
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ==========================================
// EmployeeFields - 规范化后的员工字段
// ==========================================
// 用途: RowNormalizer 输出 → IdentityResolver → 落库
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeFields {
    pub employee_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub salary: Decimal,
    pub manager_id: i64,
    pub department_id: i64,
}

// ==========================================
// NewEmployee - 待创建员工
// ==========================================
// company_id 已解析；row_number 仅用于回溯报告，不落库
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEmployee {
    pub company_id: i64,
    pub row_number: usize,
    pub fields: EmployeeFields,
}

// ==========================================
// EmployeeView - 只读列表视图
// ==========================================
// 公司以名称展示（而非内部 id）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeView {
    pub id: i64,
    pub company: String,
    pub employee_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub salary: Decimal,
    pub manager_id: i64,
    pub department_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
