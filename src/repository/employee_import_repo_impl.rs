// ==========================================
// 员工导入系统 - 导入 Repository 实现
// ==========================================
// 职责: 实现导入/只读列表相关数据访问（使用 rusqlite）
// 红线: Repository 不含业务规则，只做数据 CRUD
// 说明: 批量写入包在 SAVEPOINT 中，失败时整批回滚
// 工作单元: BEGIN IMMEDIATE 期间由单元独占连接，其他导入等待
// ==========================================

use crate::db::open_and_init;
use crate::domain::company::{Company, Employee, EmployeeView, NewEmployee};
use crate::repository::employee_import_repo::{
    EmployeeImportRepository, EmployeeImportStore, EmployeeImportUnit,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{OwnedRwLockWriteGuard, RwLock, RwLockReadGuard};
use tracing::{debug, warn};

const EMPLOYEE_COLUMNS: &str = "id, company_id, employee_id, first_name, last_name, \
     phone_number, salary, manager_id, department_id, created_at, updated_at";

fn parse_salary(row: &Row, idx: usize) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(idx)?;
    Decimal::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn map_company(row: &Row) -> rusqlite::Result<Company> {
    Ok(Company {
        id: row.get(0)?,
        name: row.get(1)?,
        created_at: row.get(2)?,
        updated_at: row.get(3)?,
    })
}

fn map_employee(row: &Row) -> rusqlite::Result<Employee> {
    Ok(Employee {
        id: row.get(0)?,
        company_id: row.get(1)?,
        employee_id: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        phone_number: row.get(5)?,
        salary: parse_salary(row, 6)?,
        manager_id: row.get(7)?,
        department_id: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

// ==========================================
// 导入写入路径（单连接内执行）
// ==========================================

fn find_company(conn: &Connection, name: &str) -> RepositoryResult<Option<Company>> {
    let company = conn
        .query_row(
            "SELECT id, name, created_at, updated_at FROM companies WHERE name = ?1",
            params![name],
            map_company,
        )
        .optional()?;
    Ok(company)
}

fn insert_companies(conn: &mut Connection, names: &[String]) -> RepositoryResult<usize> {
    let sp = conn.savepoint()?;
    let now = Utc::now();

    let mut count = 0;
    {
        let mut stmt =
            sp.prepare("INSERT INTO companies (name, created_at, updated_at) VALUES (?1, ?2, ?2)")?;
        for name in names {
            stmt.execute(params![name, now])?;
            count += 1;
        }
    }

    sp.commit()?;
    Ok(count)
}

fn find_employee(
    conn: &Connection,
    company_id: i64,
    employee_id: i64,
) -> RepositoryResult<Option<Employee>> {
    let sql = format!(
        "SELECT {} FROM employees WHERE company_id = ?1 AND employee_id = ?2",
        EMPLOYEE_COLUMNS
    );
    let employee = conn
        .query_row(&sql, params![company_id, employee_id], map_employee)
        .optional()?;
    Ok(employee)
}

fn insert_employees(conn: &mut Connection, records: &[NewEmployee]) -> RepositoryResult<usize> {
    let sp = conn.savepoint()?;
    let now = Utc::now();

    let mut count = 0;
    {
        let mut stmt = sp.prepare(
            r#"
            INSERT INTO employees (
                company_id, employee_id, first_name, last_name, phone_number,
                salary, manager_id, department_id, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
            "#,
        )?;
        for record in records {
            let f = &record.fields;
            stmt.execute(params![
                record.company_id,
                f.employee_id,
                f.first_name,
                f.last_name,
                f.phone_number,
                f.salary.to_string(),
                f.manager_id,
                f.department_id,
                now,
            ])?;
            count += 1;
        }
    }

    sp.commit()?;
    Ok(count)
}

fn lock_conn(conn: &Mutex<Connection>) -> RepositoryResult<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|e| RepositoryError::LockError(e.to_string()))
}

fn execute_control(conn: &Mutex<Connection>, sql: &str) -> RepositoryResult<()> {
    lock_conn(conn)?
        .execute_batch(sql)
        .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))
}

// ==========================================
// SqliteEmployeeRepository
// ==========================================
// 克隆共享同一连接与单元闸门
#[derive(Clone)]
pub struct SqliteEmployeeRepository {
    conn: Arc<Mutex<Connection>>,
    // 工作单元持有写锁；仓储上的其他操作先取读锁
    unit_gate: Arc<RwLock<()>>,
}

impl SqliteEmployeeRepository {
    /// 创建新的 Repository 实例（打开连接并建表）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_and_init(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self::from_connection(Arc::new(Mutex::new(conn))))
    }

    /// 从已有连接创建仓储实例（调用方负责建表）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            conn,
            unit_gate: Arc::new(RwLock::new(())),
        }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        lock_conn(&self.conn)
    }

    /// 同步路径无法等待：工作单元进行中时直接报错，避免并入其事务
    fn shared_access(&self) -> RepositoryResult<RwLockReadGuard<'_, ()>> {
        self.unit_gate.try_read().map_err(|_| {
            RepositoryError::DatabaseTransactionError("整体导入事务进行中，请稍后重试".to_string())
        })
    }

    // ===== 导入写入路径（同步）=====

    pub fn find_company_by_name_sync(&self, name: &str) -> RepositoryResult<Option<Company>> {
        let _shared = self.shared_access()?;
        find_company(&*self.get_conn()?, name)
    }

    pub fn create_companies_sync(&self, names: &[String]) -> RepositoryResult<usize> {
        let _shared = self.shared_access()?;
        insert_companies(&mut *self.get_conn()?, names)
    }

    pub fn find_employee_sync(
        &self,
        company_id: i64,
        employee_id: i64,
    ) -> RepositoryResult<Option<Employee>> {
        let _shared = self.shared_access()?;
        find_employee(&*self.get_conn()?, company_id, employee_id)
    }

    pub fn create_employees_sync(&self, records: &[NewEmployee]) -> RepositoryResult<usize> {
        let _shared = self.shared_access()?;
        insert_employees(&mut *self.get_conn()?, records)
    }

    // ===== 只读列表 =====

    /// 列出全部公司（按创建顺序）
    pub fn list_companies(&self) -> RepositoryResult<Vec<Company>> {
        let _shared = self.shared_access()?;
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT id, name, created_at, updated_at FROM companies ORDER BY id")?;
        let companies = stmt
            .query_map([], map_company)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(companies)
    }

    /// 列出全部员工（公司以名称展示）
    pub fn list_employees(&self) -> RepositoryResult<Vec<EmployeeView>> {
        let _shared = self.shared_access()?;
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT e.id, c.name, e.employee_id, e.first_name, e.last_name, e.phone_number,
                   e.salary, e.manager_id, e.department_id, e.created_at, e.updated_at
            FROM employees e
            JOIN companies c ON c.id = e.company_id
            ORDER BY e.id
            "#,
        )?;
        let employees = stmt
            .query_map([], |row| {
                Ok(EmployeeView {
                    id: row.get(0)?,
                    company: row.get(1)?,
                    employee_id: row.get(2)?,
                    first_name: row.get(3)?,
                    last_name: row.get(4)?,
                    phone_number: row.get(5)?,
                    salary: parse_salary(row, 6)?,
                    manager_id: row.get(7)?,
                    department_id: row.get(8)?,
                    created_at: row.get(9)?,
                    updated_at: row.get(10)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(employees)
    }

    pub fn count_companies(&self) -> RepositoryResult<usize> {
        let _shared = self.shared_access()?;
        let conn = self.get_conn()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM companies", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    pub fn count_employees(&self) -> RepositoryResult<usize> {
        let _shared = self.shared_access()?;
        let conn = self.get_conn()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM employees", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    /// 删除公司（员工经外键级联删除）
    ///
    /// # 返回
    /// - Ok(true): 公司存在且已删除
    /// - Ok(false): 公司不存在
    pub fn delete_company(&self, name: &str) -> RepositoryResult<bool> {
        let _shared = self.shared_access()?;
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM companies WHERE name = ?1", params![name])?;
        Ok(affected > 0)
    }
}

#[async_trait]
impl EmployeeImportStore for SqliteEmployeeRepository {
    async fn find_company_by_name(&self, name: &str) -> RepositoryResult<Option<Company>> {
        let _shared = self.unit_gate.read().await;
        find_company(&*self.get_conn()?, name)
    }

    async fn create_companies(&self, names: &[String]) -> RepositoryResult<usize> {
        let _shared = self.unit_gate.read().await;
        insert_companies(&mut *self.get_conn()?, names)
    }

    async fn find_employee(
        &self,
        company_id: i64,
        employee_id: i64,
    ) -> RepositoryResult<Option<Employee>> {
        let _shared = self.unit_gate.read().await;
        find_employee(&*self.get_conn()?, company_id, employee_id)
    }

    async fn create_employees(&self, records: &[NewEmployee]) -> RepositoryResult<usize> {
        let _shared = self.unit_gate.read().await;
        insert_employees(&mut *self.get_conn()?, records)
    }
}

#[async_trait]
impl EmployeeImportRepository for SqliteEmployeeRepository {
    async fn begin_unit(&self) -> RepositoryResult<Box<dyn EmployeeImportUnit>> {
        // 先等待进行中的读写与其他单元结束
        let gate = self.unit_gate.clone().write_owned().await;
        execute_control(&self.conn, "BEGIN IMMEDIATE")?;
        debug!("工作单元已开启");

        Ok(Box::new(SqliteImportUnit {
            conn: self.conn.clone(),
            _gate: gate,
            finished: false,
        }))
    }
}

// ==========================================
// SqliteImportUnit - 工作单元
// ==========================================
// 持有单元闸门写锁直至结束，期间独占连接上的事务
pub struct SqliteImportUnit {
    conn: Arc<Mutex<Connection>>,
    _gate: OwnedRwLockWriteGuard<()>,
    finished: bool,
}

impl SqliteImportUnit {
    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        lock_conn(&self.conn)
    }

    fn ensure_open(&self) -> RepositoryResult<()> {
        if self.finished {
            return Err(RepositoryError::DatabaseTransactionError(
                "工作单元已结束".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl EmployeeImportStore for SqliteImportUnit {
    async fn find_company_by_name(&self, name: &str) -> RepositoryResult<Option<Company>> {
        self.ensure_open()?;
        find_company(&*self.get_conn()?, name)
    }

    async fn create_companies(&self, names: &[String]) -> RepositoryResult<usize> {
        self.ensure_open()?;
        insert_companies(&mut *self.get_conn()?, names)
    }

    async fn find_employee(
        &self,
        company_id: i64,
        employee_id: i64,
    ) -> RepositoryResult<Option<Employee>> {
        self.ensure_open()?;
        find_employee(&*self.get_conn()?, company_id, employee_id)
    }

    async fn create_employees(&self, records: &[NewEmployee]) -> RepositoryResult<usize> {
        self.ensure_open()?;
        insert_employees(&mut *self.get_conn()?, records)
    }
}

#[async_trait]
impl EmployeeImportUnit for SqliteImportUnit {
    async fn commit(&mut self) -> RepositoryResult<()> {
        self.ensure_open()?;
        execute_control(&self.conn, "COMMIT")?;
        self.finished = true;
        debug!("工作单元已提交");
        Ok(())
    }

    async fn rollback(&mut self) -> RepositoryResult<()> {
        self.ensure_open()?;
        // 无论 ROLLBACK 是否成功，单元都不再可用
        self.finished = true;
        execute_control(&self.conn, "ROLLBACK")?;
        debug!("工作单元已回滚");
        Ok(())
    }
}

impl Drop for SqliteImportUnit {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(e) = execute_control(&self.conn, "ROLLBACK") {
            warn!(error = %e, "未结束的工作单元回滚失败");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure_sqlite_connection, init_schema};
    use crate::domain::company::EmployeeFields;

    fn repo() -> SqliteEmployeeRepository {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        SqliteEmployeeRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn new_employee(company_id: i64, employee_id: i64) -> NewEmployee {
        NewEmployee {
            company_id,
            row_number: 2,
            fields: EmployeeFields {
                employee_id,
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                phone_number: "555-0100".to_string(),
                salary: Decimal::new(5000050, 2),
                manager_id: 0,
                department_id: 10,
            },
        }
    }

    #[test]
    fn test_create_and_find_company() {
        let repo = repo();
        let created = repo.create_companies_sync(&["Acme".to_string()]).unwrap();
        assert_eq!(created, 1);

        let company = repo.find_company_by_name_sync("Acme").unwrap().unwrap();
        assert_eq!(company.name, "Acme");
        assert!(repo.find_company_by_name_sync("acme").unwrap().is_none());
    }

    #[test]
    fn test_company_batch_is_atomic() {
        let repo = repo();
        repo.create_companies_sync(&["Acme".to_string()]).unwrap();

        let err = repo
            .create_companies_sync(&["Globex".to_string(), "Acme".to_string()])
            .unwrap_err();

        assert!(err.is_unique_violation());
        assert!(repo.find_company_by_name_sync("Globex").unwrap().is_none());
        assert_eq!(repo.count_companies().unwrap(), 1);
    }

    #[test]
    fn test_employee_round_trip_keeps_salary_scale() {
        let repo = repo();
        repo.create_companies_sync(&["Acme".to_string()]).unwrap();
        let acme = repo.find_company_by_name_sync("Acme").unwrap().unwrap();

        repo.create_employees_sync(&[new_employee(acme.id, 1)]).unwrap();

        let employee = repo.find_employee_sync(acme.id, 1).unwrap().unwrap();
        assert_eq!(employee.salary.to_string(), "50000.50");
        assert!(repo.find_employee_sync(acme.id, 2).unwrap().is_none());
    }

    #[test]
    fn test_employee_unique_per_company() {
        let repo = repo();
        repo.create_companies_sync(&["Acme".to_string(), "Globex".to_string()])
            .unwrap();
        let acme = repo.find_company_by_name_sync("Acme").unwrap().unwrap();
        let globex = repo.find_company_by_name_sync("Globex").unwrap().unwrap();

        // 同一 employee_id 可以出现在不同公司
        repo.create_employees_sync(&[new_employee(acme.id, 1), new_employee(globex.id, 1)])
            .unwrap();

        let err = repo
            .create_employees_sync(&[new_employee(acme.id, 2), new_employee(acme.id, 1)])
            .unwrap_err();
        assert!(err.is_unique_violation());
        // 整批回滚
        assert!(repo.find_employee_sync(acme.id, 2).unwrap().is_none());
        assert_eq!(repo.count_employees().unwrap(), 2);
    }

    #[test]
    fn test_delete_company_cascades() {
        let repo = repo();
        repo.create_companies_sync(&["Acme".to_string()]).unwrap();
        let acme = repo.find_company_by_name_sync("Acme").unwrap().unwrap();
        repo.create_employees_sync(&[new_employee(acme.id, 1), new_employee(acme.id, 2)])
            .unwrap();

        assert!(repo.delete_company("Acme").unwrap());
        assert_eq!(repo.count_employees().unwrap(), 0);
        assert!(!repo.delete_company("Acme").unwrap());
    }

    #[test]
    fn test_list_employees_shows_company_name() {
        let repo = repo();
        repo.create_companies_sync(&["Acme".to_string()]).unwrap();
        let acme = repo.find_company_by_name_sync("Acme").unwrap().unwrap();
        repo.create_employees_sync(&[new_employee(acme.id, 7)]).unwrap();

        let employees = repo.list_employees().unwrap();
        assert_eq!(employees.len(), 1);
        assert_eq!(employees[0].company, "Acme");
        assert_eq!(employees[0].employee_id, 7);
    }

    #[tokio::test]
    async fn test_unit_rollback_discards_writes() {
        let repo = repo();

        let mut unit = repo.begin_unit().await.unwrap();
        unit.create_companies(&["Acme".to_string()]).await.unwrap();
        assert!(unit.find_company_by_name("Acme").await.unwrap().is_some());
        unit.rollback().await.unwrap();
        drop(unit);

        assert!(repo.find_company_by_name("Acme").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_dropped_unit_is_rolled_back() {
        let repo = repo();

        {
            let unit = repo.begin_unit().await.unwrap();
            unit.create_companies(&["Acme".to_string()]).await.unwrap();
        }

        assert_eq!(repo.count_companies().unwrap(), 0);
        // 连接已退出事务，可再次开启单元
        let mut unit = repo.begin_unit().await.unwrap();
        unit.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_writes_outside_unit_wait_and_survive_rollback() {
        let repo = repo();

        let mut unit = repo.begin_unit().await.unwrap();
        unit.create_companies(&["Acme".to_string()]).await.unwrap();

        // 另一导入在单元进行中写入：等待单元结束，而不是并入其事务
        let other = {
            let repo = repo.clone();
            tokio::spawn(async move { repo.create_companies(&["Globex".to_string()]).await })
        };
        tokio::task::yield_now().await;
        assert!(!other.is_finished());
        assert!(repo.count_companies().is_err());

        unit.rollback().await.unwrap();
        drop(unit);

        assert_eq!(other.await.unwrap().unwrap(), 1);
        let names: Vec<String> = repo
            .list_companies()
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Globex"]);
    }

    #[tokio::test]
    async fn test_finished_unit_rejects_further_use() {
        let repo = repo();

        let mut unit = repo.begin_unit().await.unwrap();
        unit.commit().await.unwrap();

        assert!(unit.create_companies(&["Acme".to_string()]).await.is_err());
        assert!(unit.rollback().await.is_err());
    }
}
