// ==========================================
// GestiFiltres - 机器数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::machine::Machine;
use crate::domain::types::validate_service_hours;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    SELECT machine_id, name, model, serial_number, current_service_hours, created_at, updated_at
    FROM machine
"#;

// 数据库原始行 (未校验)
struct MachineRow {
    machine_id: String,
    name: String,
    model: Option<String>,
    serial_number: Option<String>,
    current_service_hours: i64,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl MachineRow {
    fn from_row(row: &Row<'_>) -> SqliteResult<Self> {
        Ok(Self {
            machine_id: row.get(0)?,
            name: row.get(1)?,
            model: row.get(2)?,
            serial_number: row.get(3)?,
            current_service_hours: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }

    fn into_machine(self) -> RepositoryResult<Machine> {
        let current_service_hours =
            validate_service_hours(self.current_service_hours).map_err(|e| {
                RepositoryError::FieldValueError {
                    field: "current_service_hours".to_string(),
                    message: format!("machine_id={}: {}", self.machine_id, e),
                }
            })?;

        Ok(Machine {
            machine_id: self.machine_id,
            name: self.name,
            model: self.model,
            serial_number: self.serial_number,
            current_service_hours,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

// ==========================================
// MachineRepository - 机器仓储
// ==========================================
/// 机器仓储
/// 职责: 管理 machine 表的 CRUD 操作
pub struct MachineRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MachineRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建机器
    pub fn create(&self, machine: &Machine) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO machine (
                machine_id, name, model, serial_number,
                current_service_hours, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                machine.machine_id,
                machine.name,
                machine.model,
                machine.serial_number,
                i64::from(machine.current_service_hours),
                machine.created_at,
                machine.updated_at,
            ],
        )?;
        Ok(())
    }

    /// 按主键查询
    ///
    /// # 返回
    /// - Ok(Some(Machine)): 找到
    /// - Ok(None): 未找到
    /// - Err: 数据库错误或存储值非法
    pub fn find_by_id(&self, machine_id: &str) -> RepositoryResult<Option<Machine>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!("{} WHERE machine_id = ?1", SELECT_COLUMNS))?;

        let row = stmt
            .query_row(params![machine_id], MachineRow::from_row)
            .optional()?;

        row.map(MachineRow::into_machine).transpose()
    }

    /// 查询全部机器 (按ID排序)
    pub fn list_all(&self) -> RepositoryResult<Vec<Machine>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!("{} ORDER BY machine_id ASC", SELECT_COLUMNS))?;

        let rows = stmt
            .query_map([], MachineRow::from_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        rows.into_iter().map(MachineRow::into_machine).collect()
    }

    /// 在给定连接 (或事务) 上推进服务小时数, 只增不减
    ///
    /// # 返回
    /// 受影响行数: 0 表示机器不存在或新值不大于当前值
    pub(crate) fn raise_hours_on(
        conn: &Connection,
        machine_id: &str,
        service_hours: u32,
    ) -> RepositoryResult<usize> {
        let affected = conn.execute(
            r#"
            UPDATE machine
            SET current_service_hours = ?1, updated_at = ?2
            WHERE machine_id = ?3 AND current_service_hours < ?1
            "#,
            params![i64::from(service_hours), Utc::now().naive_utc(), machine_id],
        )?;
        Ok(affected)
    }

    /// 推进当前服务小时数 (比较与写入在同一条 UPDATE 内完成)
    ///
    /// # 返回
    /// - Ok(true): 新值不小于当前值, 已生效
    /// - Ok(false): 新值小于当前值, 未写入
    /// - Err(NotFound): 机器不存在
    pub fn raise_service_hours(&self, machine_id: &str, service_hours: u32) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        if Self::raise_hours_on(&conn, machine_id, service_hours)? > 0 {
            return Ok(true);
        }

        let current: Option<i64> = conn
            .query_row(
                "SELECT current_service_hours FROM machine WHERE machine_id = ?1",
                params![machine_id],
                |row| row.get(0),
            )
            .optional()?;

        match current {
            None => Err(RepositoryError::NotFound {
                entity: "Machine".to_string(),
                id: machine_id.to_string(),
            }),
            Some(current) => Ok(current <= i64::from(service_hours)),
        }
    }

    /// 删除机器 (维保记录级联删除)
    pub fn delete(&self, machine_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM machine WHERE machine_id = ?1", params![machine_id])?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Machine".to_string(),
                id: machine_id.to_string(),
            });
        }
        Ok(())
    }
}
