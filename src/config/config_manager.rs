// ==========================================
// GestiFiltres - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::engine::maintenance_alert::{AlertThresholds, DEFAULT_UPCOMING_HOURS, DEFAULT_URGENT_HOURS};
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// 配置键
// ==========================================
pub mod config_keys {
    /// 紧急告警阈值 (剩余小时数)
    pub const ALERT_URGENT_HOURS: &str = "alert_urgent_hours";
    /// 即将到期告警阈值 (剩余小时数)
    pub const ALERT_UPCOMING_HOURS: &str = "alert_upcoming_hours";
}

const GLOBAL_SCOPE: &str = "global";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
            params![GLOBAL_SCOPE, key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值 (UPSERT)
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')",
            params![GLOBAL_SCOPE, key, value],
        )?;

        tracing::info!(config_key = key, value, "配置已更新");
        Ok(())
    }

    /// 读取整数配置, 缺失或格式错误时返回默认值
    fn get_i64_or_default(&self, key: &str, default: i64) -> Result<i64, Box<dyn Error>> {
        let Some(raw) = self.get_config_value(key)? else {
            return Ok(default);
        };

        match raw.trim().parse::<i64>() {
            Ok(value) => Ok(value),
            Err(_) => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %raw,
                    default,
                    "配置格式错误，使用默认值"
                );
                Ok(default)
            }
        }
    }

    // ===== 告警配置 =====

    /// 获取告警阈值
    ///
    /// # 返回
    /// - AlertThresholds: 默认 urgent=50, upcoming=100
    ///
    /// # 说明
    /// 阈值不自洽 (负数或 urgent > upcoming) 时整体回退到默认值
    pub fn get_alert_thresholds(&self) -> Result<AlertThresholds, Box<dyn Error>> {
        let thresholds = AlertThresholds {
            urgent_hours: self
                .get_i64_or_default(config_keys::ALERT_URGENT_HOURS, DEFAULT_URGENT_HOURS)?,
            upcoming_hours: self
                .get_i64_or_default(config_keys::ALERT_UPCOMING_HOURS, DEFAULT_UPCOMING_HOURS)?,
        };

        if !thresholds.is_consistent() {
            tracing::warn!(
                urgent_hours = thresholds.urgent_hours,
                upcoming_hours = thresholds.upcoming_hours,
                "告警阈值不自洽，使用默认值"
            );
            return Ok(AlertThresholds::default());
        }

        Ok(thresholds)
    }

    /// 获取所有配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map(params![GLOBAL_SCOPE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }
}
