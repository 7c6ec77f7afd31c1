// ==========================================
// 员工导入系统 - 领域层
// ==========================================
// 职责: 实体与导入管道中间类型
// ==========================================

pub mod company;
pub mod import;

// 重导出核心类型
pub use company::{Company, Employee, EmployeeFields, EmployeeView, NewEmployee};
pub use import::{
    CandidateRecord, CellValue, DuplicateRecord, FileFormat, ImportReport, ParsedTable, RawRow,
    RowError, DUPLICATE_REASON, REQUIRED_COLUMNS,
};
