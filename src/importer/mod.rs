// ==========================================
// 员工导入系统 - 导入层
// ==========================================
// 职责: 上传文件 → 公司/员工记录 + 导入报告
// 支持: Excel (.xlsx), CSV (.csv)
// ==========================================

// 模块声明
pub mod employee_importer_impl;
pub mod error;
pub mod file_parser;
pub mod identity_resolver;
pub mod importer_trait;
pub mod row_normalizer;
pub mod schema_validator;

// 重导出核心类型
pub use employee_importer_impl::EmployeeImporterImpl;
pub use error::{ImportError, ImportResult, RowErrorKind};
pub use file_parser::{detect_format, CsvParser, ExcelParser};
pub use identity_resolver::IdentityResolver;
pub use row_normalizer::RowNormalizerImpl;
pub use schema_validator::SchemaValidator;

// 重导出 Trait 接口
pub use importer_trait::{EmployeeImporter, FileParser, RowNormalizer};
