// ==========================================
// 员工导入系统 - 导入组件 Trait
// ==========================================
// 职责: 定义导入管道各阶段接口（不包含实现）
// 流程: 读取 → 表结构校验 → 行规范化 → 身份解析 → 落库 → 报告
// ==========================================

use crate::domain::import::{CandidateRecord, ImportReport, ParsedTable, RawRow, RowError};
use crate::importer::error::ImportResult;
use async_trait::async_trait;
use std::path::Path;

// ==========================================
// EmployeeImporter Trait
// ==========================================
// 用途: 导入主接口（ImportCoordinator）
// 实现者: EmployeeImporterImpl
#[async_trait]
pub trait EmployeeImporter: Send + Sync {
    /// 导入上传文件
    ///
    /// # 参数
    /// - file_bytes: 文件内容（整体位于内存）
    /// - file_name: 上传文件名（用于判定格式）
    ///
    /// # 返回
    /// - Ok(ImportReport): 创建统计 + 行级错误 + 重复记录
    /// - Err(ImportError): 预处理失败（格式/大小/不可读/缺列/无数据），零写入
    async fn import(&self, file_bytes: &[u8], file_name: &str) -> ImportResult<ImportReport>;

    /// 从本地路径导入（读取前先按文件元数据校验大小）
    async fn import_from_path(&self, file_path: &Path) -> ImportResult<ImportReport>;
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: TabularReader（阶段 0）
// 实现者: CsvParser, ExcelParser
pub trait FileParser: Send + Sync {
    /// 解析文件字节为表头 + 有序数据行
    ///
    /// # 约定
    /// - 第一行为表头，不作为数据行输出
    /// - 保持源文件行序；行号为文件中的实际行号
    /// - 完全空白的行跳过，但不影响其他行的行号
    fn parse_table(&self, bytes: &[u8]) -> ImportResult<ParsedTable>;
}

// ==========================================
// RowNormalizer Trait
// ==========================================
// 用途: 原始行 → 强类型候选记录（阶段 2）
// 实现者: RowNormalizerImpl
pub trait RowNormalizer: Send + Sync {
    /// 规范化单行
    ///
    /// # 返回
    /// - Ok(CandidateRecord): 全部字段校验通过
    /// - Err(RowError): 首个失败字段的原因（含已知公司名）
    fn normalize(&self, row: &RawRow) -> Result<CandidateRecord, RowError>;
}
