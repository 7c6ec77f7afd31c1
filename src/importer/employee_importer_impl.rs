// ==========================================
// 员工导入系统 - 导入协调器实现
// ==========================================
// 职责: 整合导入流程，从上传文件到数据库
// 流程: 格式 → 大小 → 解析 → 表结构校验 → 行规范化 → 身份解析 → 落库 → 报告
// 红线: 预处理失败（格式/大小/不可读/缺列/无数据）零写入
// ==========================================

use crate::config::{AtomicityPolicy, ImportConfigReader};
use crate::domain::company::NewEmployee;
use crate::domain::import::{
    CandidateRecord, DuplicateRecord, FileFormat, ImportReport, RawRow, RowError,
};
use crate::importer::error::{ImportError, ImportResult, RowErrorKind};
use crate::importer::file_parser::{detect_format, CsvParser, ExcelParser};
use crate::importer::identity_resolver::{CompanyResolution, IdentityResolver};
use crate::importer::importer_trait::{EmployeeImporter, FileParser, RowNormalizer};
use crate::importer::row_normalizer::RowNormalizerImpl;
use crate::importer::schema_validator::SchemaValidator;
use crate::repository::{EmployeeImportRepository, EmployeeImportStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::error::Error;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn, Span};
use uuid::Uuid;

fn config_error(err: Box<dyn Error + Send + Sync>) -> ImportError {
    ImportError::Config(err.to_string())
}

fn check_size(size: u64, max: u64) -> ImportResult<()> {
    if size > max {
        return Err(ImportError::FileTooLarge { size, max });
    }
    Ok(())
}

// ==========================================
// EmployeeImporterImpl - 员工导入协调器
// ==========================================
pub struct EmployeeImporterImpl<R, C>
where
    R: EmployeeImportRepository,
    C: ImportConfigReader,
{
    // 数据访问层
    repo: R,

    // 配置读取器
    config: C,

    // 导入组件
    csv_parser: Box<dyn FileParser>,
    excel_parser: Box<dyn FileParser>,
    row_normalizer: Box<dyn RowNormalizer>,
    schema_validator: SchemaValidator,
}

impl<R, C> EmployeeImporterImpl<R, C>
where
    R: EmployeeImportRepository,
    C: ImportConfigReader,
{
    /// 创建导入协调器
    ///
    /// # 参数
    /// - repo: 导入数据仓储
    /// - config: 配置读取器
    /// - csv_parser / excel_parser: 文件解析器
    /// - row_normalizer: 行规范化器
    pub fn new(
        repo: R,
        config: C,
        csv_parser: Box<dyn FileParser>,
        excel_parser: Box<dyn FileParser>,
        row_normalizer: Box<dyn RowNormalizer>,
    ) -> Self {
        Self {
            repo,
            config,
            csv_parser,
            excel_parser,
            row_normalizer,
            schema_validator: SchemaValidator,
        }
    }

    /// 使用默认组件创建
    pub fn with_defaults(repo: R, config: C) -> Self {
        Self::new(
            repo,
            config,
            Box::new(CsvParser),
            Box::new(ExcelParser),
            Box::new(RowNormalizerImpl),
        )
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    fn parser_for(&self, format: FileFormat) -> &dyn FileParser {
        match format {
            FileFormat::Csv => self.csv_parser.as_ref(),
            FileFormat::Xlsx => self.excel_parser.as_ref(),
        }
    }

    /// 行规范化：通过的行进入候选，失败的行记入报告
    fn normalize_rows(
        &self,
        rows: &[RawRow],
        report: &mut ImportReport,
    ) -> Vec<CandidateRecord> {
        let mut candidates = Vec::with_capacity(rows.len());
        for row in rows {
            match self.row_normalizer.normalize(row) {
                Ok(candidate) => candidates.push(candidate),
                Err(row_error) => {
                    warn!(row = row_error.row, error = %row_error.error, "行校验失败");
                    report.errors.push(row_error);
                }
            }
        }
        candidates
    }

    /// 身份解析 + 落库
    async fn persist<S: EmployeeImportStore + ?Sized>(
        &self,
        store: &S,
        candidates: Vec<CandidateRecord>,
        policy: AtomicityPolicy,
        batch_size: usize,
        report: &mut ImportReport,
    ) -> ImportResult<()> {
        let resolver = IdentityResolver::new(policy);

        // === 公司 ===
        let names = IdentityResolver::distinct_company_names(&candidates);
        let companies = resolver.resolve_companies(store, &names).await?;
        report.companies_created = companies.created;
        info!(
            distinct = names.len(),
            existing = companies.existing,
            created = companies.created,
            failed = companies.failures.len(),
            "公司解析完成"
        );

        // === 员工 ===
        let employees = resolver
            .resolve_employees(store, candidates, &companies)
            .await?;
        report.errors.extend(employees.errors);
        report.duplicates.extend(employees.duplicates);

        self.write_employees(store, employees.to_create, &companies, policy, batch_size, report)
            .await
    }

    /// 分批写入员工；批失败时逐条重试以定位问题记录
    async fn write_employees<S: EmployeeImportStore + ?Sized>(
        &self,
        store: &S,
        records: Vec<NewEmployee>,
        companies: &CompanyResolution,
        policy: AtomicityPolicy,
        batch_size: usize,
        report: &mut ImportReport,
    ) -> ImportResult<()> {
        let company_names: HashMap<i64, &str> = companies
            .company_ids
            .iter()
            .map(|(name, id)| (*id, name.as_str()))
            .collect();
        let company_of = |record: &NewEmployee| {
            company_names
                .get(&record.company_id)
                .map(|name| name.to_string())
                .unwrap_or_default()
        };

        for (batch_no, chunk) in records.chunks(batch_size.max(1)).enumerate() {
            match store.create_employees(chunk).await {
                Ok(count) => {
                    report.employees_created += count;
                    debug!(batch_no, count, "员工批次写入完成");
                }
                Err(e) => {
                    warn!(batch_no, error = %e, "员工批次写入失败，改为逐条写入");
                    for record in chunk {
                        match store.create_employees(std::slice::from_ref(record)).await {
                            Ok(count) => report.employees_created += count,
                            Err(e) if e.is_unique_violation() => {
                                // 并发导入已写入同一员工
                                debug!(row = record.row_number, "员工已被并发创建");
                                report.duplicates.push(DuplicateRecord::new(
                                    record.row_number,
                                    company_of(record),
                                    record.fields.employee_id,
                                ));
                            }
                            Err(e) if policy.is_all_or_nothing() => return Err(e.into()),
                            Err(e) => {
                                warn!(row = record.row_number, error = %e, "员工写入失败");
                                report.errors.push(RowError {
                                    row: record.row_number,
                                    company: Some(company_of(record)),
                                    error: RowErrorKind::Storage(e.to_string()),
                                });
                            }
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// AllOrNothing: 整个落库阶段置于一个工作单元内
    async fn persist_in_unit(
        &self,
        candidates: Vec<CandidateRecord>,
        batch_size: usize,
        report: &mut ImportReport,
    ) -> ImportResult<()> {
        let mut unit = self.repo.begin_unit().await?;

        let outcome = self
            .persist(
                unit.as_ref(),
                candidates,
                AtomicityPolicy::AllOrNothing,
                batch_size,
                report,
            )
            .await;

        let outcome = match outcome {
            Ok(()) => unit.commit().await.map_err(ImportError::from),
            Err(e) => Err(e),
        };

        if let Err(e) = outcome {
            error!(error = %e, "落库失败，回滚本次导入");
            if let Err(rollback_err) = unit.rollback().await {
                error!(error = %rollback_err, "回滚失败");
            }
            return Err(e);
        }

        Ok(())
    }
}

#[async_trait]
impl<R, C> EmployeeImporter for EmployeeImporterImpl<R, C>
where
    R: EmployeeImportRepository,
    C: ImportConfigReader,
{
    #[instrument(skip(self, file_bytes), fields(batch_id))]
    async fn import(&self, file_bytes: &[u8], file_name: &str) -> ImportResult<ImportReport> {
        let start_time = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        Span::current().record("batch_id", batch_id.as_str());

        info!(size = file_bytes.len(), "开始导入员工数据");

        // === 步骤 1: 格式判定 ===
        let format = detect_format(file_name)?;

        // === 步骤 2: 读取配置 + 大小校验 ===
        let max_size = self
            .config
            .get_max_file_size_bytes()
            .await
            .map_err(config_error)?;
        let policy = self
            .config
            .get_atomicity_policy()
            .await
            .map_err(config_error)?;
        let batch_size = self
            .config
            .get_employee_batch_size()
            .await
            .map_err(config_error)?;
        check_size(file_bytes.len() as u64, max_size)?;
        debug!(?format, %policy, batch_size, "预处理检查通过");

        // === 步骤 3: 解析文件 ===
        let table = self.parser_for(format).parse_table(file_bytes).map_err(|e| {
            error!(error = %e, "文件解析失败");
            e
        })?;
        info!(
            columns = table.headers.len(),
            rows = table.rows.len(),
            "文件解析完成"
        );

        // === 步骤 4: 表结构校验 ===
        self.schema_validator
            .validate(&table.headers, table.rows.len())?;

        // === 步骤 5: 行规范化 ===
        let mut report = ImportReport::default();
        let candidates = self.normalize_rows(&table.rows, &mut report);
        info!(
            valid = candidates.len(),
            invalid = report.errors.len(),
            "行规范化完成"
        );

        // === 步骤 6: 身份解析 + 落库 ===
        if !candidates.is_empty() {
            if policy.is_all_or_nothing() {
                self.persist_in_unit(candidates, batch_size, &mut report)
                    .await?;
            } else {
                self.persist(&self.repo, candidates, policy, batch_size, &mut report)
                    .await?;
            }
        }

        // === 步骤 7: 报告 ===
        report.sort_by_row();

        info!(
            batch_id = %batch_id,
            companies_created = report.companies_created,
            employees_created = report.employees_created,
            errors = report.errors.len(),
            duplicates = report.duplicates.len(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "员工数据导入完成"
        );

        Ok(report)
    }

    async fn import_from_path(&self, file_path: &Path) -> ImportResult<ImportReport> {
        let file_name = file_path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_string();

        // 读取前先判定格式与大小，避免整体载入超大文件
        detect_format(&file_name)?;
        let max_size = self
            .config
            .get_max_file_size_bytes()
            .await
            .map_err(config_error)?;
        let metadata = tokio::fs::metadata(file_path).await?;
        check_size(metadata.len(), max_size)?;

        let bytes = tokio::fs::read(file_path).await?;
        self.import(&bytes, &file_name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_size_boundary() {
        assert!(check_size(10, 10).is_ok());
        assert!(matches!(
            check_size(11, 10),
            Err(ImportError::FileTooLarge { size: 11, max: 10 })
        ));
    }

    #[test]
    fn test_config_error_keeps_message() {
        let err = config_error("bad batch size".into());
        assert!(matches!(err, ImportError::Config(msg) if msg == "bad batch size"));
    }
}
