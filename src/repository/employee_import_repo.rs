// ==========================================
// 员工导入系统 - 导入 Repository Trait
// ==========================================
// 职责: 定义导入管道所需的存储接口（不包含业务逻辑）
// 红线: Repository 不含业务规则，只做数据 CRUD
// 一致性: 同一次导入内读写顺序执行，读己之写
// 隔离: 工作单元独占存储，其他导入的读写等待单元结束
// ==========================================

use crate::domain::company::{Company, Employee, NewEmployee};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// EmployeeImportStore Trait - 导入读写操作
// ==========================================
// 实现者: SqliteEmployeeRepository、SqliteImportUnit
// 测试: 内存 fake（tests/test_helpers.rs）
#[async_trait]
pub trait EmployeeImportStore: Send + Sync {
    // ===== 公司 =====

    /// 按名称查询公司（精确匹配，区分大小写）
    async fn find_company_by_name(&self, name: &str) -> RepositoryResult<Option<Company>>;

    /// 批量创建公司
    ///
    /// # 返回
    /// - Ok(usize): 创建数量
    /// - Err: 整批不落库（名称冲突时为 UniqueConstraintViolation）
    async fn create_companies(&self, names: &[String]) -> RepositoryResult<usize>;

    // ===== 员工 =====

    /// 按 (company, employee_id) 查询员工
    async fn find_employee(
        &self,
        company_id: i64,
        employee_id: i64,
    ) -> RepositoryResult<Option<Employee>>;

    /// 批量创建员工
    ///
    /// # 返回
    /// - Ok(usize): 创建数量
    /// - Err: 整批不落库（(company, employee_id) 冲突时为 UniqueConstraintViolation）
    async fn create_employees(&self, records: &[NewEmployee]) -> RepositoryResult<usize>;

}

// ==========================================
// EmployeeImportRepository Trait
// ==========================================
#[async_trait]
pub trait EmployeeImportRepository: EmployeeImportStore {
    /// 开启工作单元（仅 AllOrNothing 策略使用）
    ///
    /// 单元存续期间独占存储：经仓储发起的其他读写等待单元提交或回滚，
    /// 不会并入本单元的事务。
    async fn begin_unit(&self) -> RepositoryResult<Box<dyn EmployeeImportUnit>>;
}

// ==========================================
// EmployeeImportUnit Trait - 工作单元
// ==========================================
// 未提交即丢弃的单元按回滚处理
#[async_trait]
pub trait EmployeeImportUnit: EmployeeImportStore {
    async fn commit(&mut self) -> RepositoryResult<()>;

    async fn rollback(&mut self) -> RepositoryResult<()>;
}
