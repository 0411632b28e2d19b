// ==========================================
// GestiFiltres - 维保记录数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 存储: filters_used 以 ';' 拼接存放
// ==========================================

use crate::domain::maintenance::MaintenanceRecord;
use crate::domain::types::{validate_service_hours, MaintenanceRange};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::machine_repo::MachineRepository;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

/// filters_used 列的分隔符
pub const FILTER_SEPARATOR: &str = ";";

const SELECT_COLUMNS: &str = r#"
    SELECT record_id, machine_id, service_hours, range_code, performed_on, filters_used
    FROM maintenance_record
"#;

/// 拆分存储的滤芯列表 (忽略空项)
pub fn split_filters(raw: &str) -> Vec<String> {
    raw.split(FILTER_SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// 拼接滤芯列表
pub fn join_filters(filters: &[String]) -> String {
    filters.join(FILTER_SEPARATOR)
}

// 数据库原始行 (未校验)
struct RecordRow {
    record_id: String,
    machine_id: String,
    service_hours: i64,
    range_code: String,
    performed_on: NaiveDate,
    filters_used: String,
}

impl RecordRow {
    fn from_row(row: &Row<'_>) -> SqliteResult<Self> {
        Ok(Self {
            record_id: row.get(0)?,
            machine_id: row.get(1)?,
            service_hours: row.get(2)?,
            range_code: row.get(3)?,
            performed_on: row.get(4)?,
            filters_used: row.get(5)?,
        })
    }

    fn into_record(self) -> RepositoryResult<MaintenanceRecord> {
        let service_hours = validate_service_hours(self.service_hours).map_err(|e| {
            RepositoryError::FieldValueError {
                field: "service_hours".to_string(),
                message: format!("record_id={}: {}", self.record_id, e),
            }
        })?;
        let range = self
            .range_code
            .parse::<MaintenanceRange>()
            .map_err(|e| RepositoryError::FieldValueError {
                field: "range_code".to_string(),
                message: format!("record_id={}: {}", self.record_id, e),
            })?;

        Ok(MaintenanceRecord {
            record_id: self.record_id,
            machine_id: self.machine_id,
            service_hours,
            range,
            performed_on: self.performed_on,
            filters_used: split_filters(&self.filters_used),
        })
    }
}

// ==========================================
// MaintenanceRecordRepository - 维保记录仓储
// ==========================================
/// 维保记录仓储
/// 职责: 管理 maintenance_record 表的 CRUD 操作
pub struct MaintenanceRecordRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MaintenanceRecordRepository {
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

    fn insert(conn: &Connection, record: &MaintenanceRecord) -> RepositoryResult<()> {
        conn.execute(
            r#"
            INSERT INTO maintenance_record (
                record_id, machine_id, service_hours, range_code, performed_on, filters_used
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                record.record_id,
                record.machine_id,
                i64::from(record.service_hours),
                record.range.as_str(),
                record.performed_on,
                join_filters(&record.filters_used),
            ],
        )?;
        Ok(())
    }

    /// 创建维保记录
    ///
    /// # 返回
    /// 机器读数是否因此被推进
    ///
    /// # 说明
    /// 写入记录与推进机器读数 (只增不减) 在同一事务内完成
    pub fn create(&self, record: &MaintenanceRecord) -> RepositoryResult<bool> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        Self::insert(&tx, record)?;
        let raised =
            MachineRepository::raise_hours_on(&tx, &record.machine_id, record.service_hours)? > 0;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(raised)
    }

    /// 批量创建 (单事务, 任一失败全部回滚)
    ///
    /// # 返回
    /// 写入条数
    ///
    /// # 说明
    /// 每台机器的读数推进到其记录中的最大服务小时数 (只增不减)
    pub fn batch_create(&self, records: &[MaintenanceRecord]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        for record in records {
            Self::insert(&tx, record)?;
            MachineRepository::raise_hours_on(&tx, &record.machine_id, record.service_hours)?;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(records.len())
    }

    /// 按主键查询
    pub fn find_by_id(&self, record_id: &str) -> RepositoryResult<Option<MaintenanceRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!("{} WHERE record_id = ?1", SELECT_COLUMNS))?;

        let row = stmt
            .query_row(params![record_id], RecordRow::from_row)
            .optional()?;

        row.map(RecordRow::into_record).transpose()
    }

    /// 查询机器的全部维保记录 (按服务小时数升序)
    pub fn find_by_machine(&self, machine_id: &str) -> RepositoryResult<Vec<MaintenanceRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE machine_id = ?1 ORDER BY service_hours ASC, performed_on ASC",
            SELECT_COLUMNS
        ))?;

        let rows = stmt
            .query_map(params![machine_id], RecordRow::from_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        rows.into_iter().map(RecordRow::into_record).collect()
    }

    /// 查询全部维保记录 (导出用)
    pub fn list_all(&self) -> RepositoryResult<Vec<MaintenanceRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} ORDER BY machine_id ASC, service_hours ASC",
            SELECT_COLUMNS
        ))?;

        let rows = stmt
            .query_map([], RecordRow::from_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        rows.into_iter().map(RecordRow::into_record).collect()
    }

    /// 统计机器的维保记录数
    pub fn count_by_machine(&self, machine_id: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM maintenance_record WHERE machine_id = ?1",
            params![machine_id],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as usize)
    }

    /// 删除维保记录
    pub fn delete(&self, record_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM maintenance_record WHERE record_id = ?1",
            params![record_id],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "MaintenanceRecord".to_string(),
                id: record_id.to_string(),
            });
        }
        Ok(())
    }
}
