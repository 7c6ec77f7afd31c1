// ==========================================
// 员工导入系统 - 身份解析器实现
// ==========================================
// 职责: 对照已持久化数据，区分新/已存在的公司与员工
// 规则: 同一 (company, employee_id) 在文件内重复时，仅首次出现（按行序）写入
// 并发: 存储层唯一约束冲突视为“已存在”
// ==========================================

use crate::config::AtomicityPolicy;
use crate::domain::company::NewEmployee;
use crate::domain::import::{CandidateRecord, DuplicateRecord, RowError};
use crate::importer::error::RowErrorKind;
use crate::repository::{EmployeeImportStore, RepositoryError, RepositoryResult};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

// ==========================================
// CompanyResolution - 公司解析结果
// ==========================================
#[derive(Debug, Default)]
pub struct CompanyResolution {
    /// 公司名 → 公司 id（已存在 + 本次创建）
    pub company_ids: HashMap<String, i64>,
    /// 已存在（本次导入前）的公司数
    pub existing: usize,
    /// 本次创建的公司数
    pub created: usize,
    /// 解析失败的公司名 → 存储错误信息
    pub failures: HashMap<String, String>,
}

// ==========================================
// EmployeeResolution - 员工解析结果
// ==========================================
#[derive(Debug, Default)]
pub struct EmployeeResolution {
    /// 待创建（按行序）
    pub to_create: Vec<NewEmployee>,
    pub duplicates: Vec<DuplicateRecord>,
    pub errors: Vec<RowError>,
}

pub struct IdentityResolver {
    policy: AtomicityPolicy,
}

impl IdentityResolver {
    pub fn new(policy: AtomicityPolicy) -> Self {
        Self { policy }
    }

    /// 候选记录引用的不同公司名（按首次出现顺序）
    pub fn distinct_company_names(candidates: &[CandidateRecord]) -> Vec<String> {
        let mut seen = HashSet::new();
        candidates
            .iter()
            .filter(|c| seen.insert(c.company_name.as_str()))
            .map(|c| c.company_name.clone())
            .collect()
    }

    /// 存储错误处理：AllOrNothing 下向上传播，否则转为报告文案
    fn absorb(&self, err: RepositoryError) -> RepositoryResult<String> {
        if self.policy.is_all_or_nothing() {
            Err(err)
        } else {
            Ok(err.to_string())
        }
    }

    /// 解析公司：划分已存在/新建，创建新公司，并回读 id
    pub async fn resolve_companies<S: EmployeeImportStore + ?Sized>(
        &self,
        repo: &S,
        names: &[String],
    ) -> RepositoryResult<CompanyResolution> {
        let mut resolution = CompanyResolution::default();
        let mut new_names = Vec::new();

        // 步骤 1: 划分已存在 / 新建
        for name in names {
            match repo.find_company_by_name(name).await {
                Ok(Some(company)) => {
                    resolution.company_ids.insert(name.clone(), company.id);
                    resolution.existing += 1;
                }
                Ok(None) => new_names.push(name.clone()),
                Err(e) => {
                    let msg = self.absorb(e)?;
                    warn!(company = %name, error = %msg, "公司查询失败");
                    resolution.failures.insert(name.clone(), msg);
                }
            }
        }

        debug!(
            existing = resolution.existing,
            new = new_names.len(),
            "公司划分完成"
        );

        if new_names.is_empty() {
            return Ok(resolution);
        }

        // 步骤 2: 批量创建；失败时逐个重试以定位问题公司
        match repo.create_companies(&new_names).await {
            Ok(count) => resolution.created += count,
            Err(e) => {
                warn!(error = %e, "公司批量创建失败，改为逐个创建");
                for name in &new_names {
                    match repo.create_companies(std::slice::from_ref(name)).await {
                        Ok(count) => resolution.created += count,
                        Err(e) if e.is_unique_violation() => {
                            // 并发导入已创建，按已存在处理
                            debug!(company = %name, "公司已被并发创建");
                        }
                        Err(e) => {
                            let msg = self.absorb(e)?;
                            warn!(company = %name, error = %msg, "公司创建失败");
                            resolution.failures.insert(name.clone(), msg);
                        }
                    }
                }
            }
        }

        // 步骤 3: 回读新公司 id（读己之写）
        for name in new_names {
            if resolution.failures.contains_key(&name) {
                continue;
            }
            match repo.find_company_by_name(&name).await {
                Ok(Some(company)) => {
                    resolution.company_ids.insert(name, company.id);
                }
                Ok(None) => {
                    let err = RepositoryError::NotFound {
                        entity: "Company".to_string(),
                        id: name.clone(),
                    };
                    let msg = self.absorb(err)?;
                    resolution.failures.insert(name, msg);
                }
                Err(e) => {
                    let msg = self.absorb(e)?;
                    resolution.failures.insert(name, msg);
                }
            }
        }

        Ok(resolution)
    }

    /// 解析员工：已存在或文件内重复 → duplicate；否则排队创建
    pub async fn resolve_employees<S: EmployeeImportStore + ?Sized>(
        &self,
        repo: &S,
        candidates: Vec<CandidateRecord>,
        companies: &CompanyResolution,
    ) -> RepositoryResult<EmployeeResolution> {
        let mut resolution = EmployeeResolution::default();
        let mut queued: HashSet<(i64, i64)> = HashSet::new();

        for candidate in candidates {
            let row = candidate.row_number;
            let employee_id = candidate.fields.employee_id;

            let Some(&company_id) = companies.company_ids.get(&candidate.company_name) else {
                let msg = companies
                    .failures
                    .get(&candidate.company_name)
                    .cloned()
                    .unwrap_or_else(|| "公司解析失败".to_string());
                resolution.errors.push(RowError {
                    row,
                    company: Some(candidate.company_name),
                    error: RowErrorKind::Storage(msg),
                });
                continue;
            };

            // 文件内重复：首次出现已排队
            if queued.contains(&(company_id, employee_id)) {
                debug!(row, employee_id, "文件内重复员工");
                resolution
                    .duplicates
                    .push(DuplicateRecord::new(row, candidate.company_name, employee_id));
                continue;
            }

            match repo.find_employee(company_id, employee_id).await {
                Ok(Some(_)) => {
                    resolution
                        .duplicates
                        .push(DuplicateRecord::new(row, candidate.company_name, employee_id));
                }
                Ok(None) => {
                    queued.insert((company_id, employee_id));
                    resolution.to_create.push(NewEmployee {
                        company_id,
                        row_number: row,
                        fields: candidate.fields,
                    });
                }
                Err(e) => {
                    let msg = self.absorb(e)?;
                    warn!(row, error = %msg, "员工查询失败");
                    resolution.errors.push(RowError {
                        row,
                        company: Some(candidate.company_name),
                        error: RowErrorKind::Storage(msg),
                    });
                }
            }
        }

        debug!(
            to_create = resolution.to_create.len(),
            duplicates = resolution.duplicates.len(),
            errors = resolution.errors.len(),
            "员工解析完成"
        );

        Ok(resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::company::EmployeeFields;
    use rust_decimal::Decimal;

    fn candidate(row: usize, company: &str, employee_id: i64) -> CandidateRecord {
        CandidateRecord {
            row_number: row,
            company_name: company.to_string(),
            fields: EmployeeFields {
                employee_id,
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                phone_number: "555-0100".to_string(),
                salary: Decimal::new(100, 0),
                manager_id: 0,
                department_id: 1,
            },
        }
    }

    #[test]
    fn test_distinct_company_names_keeps_first_appearance_order() {
        let candidates = vec![
            candidate(2, "Globex", 1),
            candidate(3, "Acme", 1),
            candidate(4, "Globex", 2),
            candidate(5, "acme", 1),
        ];

        let names = IdentityResolver::distinct_company_names(&candidates);

        // 区分大小写
        assert_eq!(names, vec!["Globex", "Acme", "acme"]);
    }
}
