// ==========================================
// GestiFiltres - 维保管理 API
// ==========================================
// 职责: 维保记录登记/删除、下次维保查询、历史标注、驾驶舱告警
// 架构: API 层 → Engine (纯计算) + Repository (数据访问)
// ==========================================

use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::api::error::{require_non_empty, ApiError, ApiResult};
use crate::config::config_manager::ConfigManager;
use crate::domain::machine::Machine;
use crate::domain::maintenance::{MaintenanceProjection, MaintenanceRecord};
use crate::domain::types::{validate_service_hours, AlertLevel, MaintenanceRange};
use crate::engine::maintenance_alert::MaintenanceAlertEngine;
use crate::engine::maintenance_scheduler::{compute_next_maintenance, compute_next_range_for_record};
use crate::importer::error::ImportError;
use crate::importer::history_csv::{parse_history_file, write_history_csv};
use crate::repository::machine_repo::MachineRepository;
use crate::repository::maintenance_repo::MaintenanceRecordRepository;

// ==========================================
// DTO
// ==========================================

/// 机器维保状态 (详情页 / 驾驶舱 / 告警共用)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineMaintenanceStatus {
    pub machine_id: String,
    pub machine_name: String,
    pub current_service_hours: u32,
    pub projection: MaintenanceProjection,
    pub alert_level: AlertLevel,
    pub reason: String, // JSON 原因
}

/// 维保历史行 (附带 "此次之后应做的范围")
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRowView {
    pub record: MaintenanceRecord,
    pub next_range: MaintenanceRange,
    pub next_due_hours: u64,
}

// ==========================================
// MaintenanceApi - 维保管理 API
// ==========================================
pub struct MaintenanceApi {
    machine_repo: Arc<MachineRepository>,
    record_repo: Arc<MaintenanceRecordRepository>,
    config_manager: Arc<ConfigManager>,
}

impl MaintenanceApi {
    /// 创建新的MaintenanceApi实例
    pub fn new(
        machine_repo: Arc<MachineRepository>,
        record_repo: Arc<MaintenanceRecordRepository>,
        config_manager: Arc<ConfigManager>,
    ) -> Self {
        Self {
            machine_repo,
            record_repo,
            config_manager,
        }
    }

    fn load_machine(&self, machine_id: &str) -> ApiResult<Machine> {
        let machine_id = require_non_empty(machine_id, "机器ID")?;

        self.machine_repo
            .find_by_id(machine_id)?
            .ok_or_else(|| ApiError::NotFound(format!("机器(id={})不存在", machine_id)))
    }

    fn alert_engine(&self) -> ApiResult<MaintenanceAlertEngine> {
        let thresholds = self
            .config_manager
            .get_alert_thresholds()
            .map_err(|e| ApiError::InternalError(format!("读取告警阈值失败: {}", e)))?;
        Ok(MaintenanceAlertEngine::with_thresholds(thresholds))
    }

    fn build_status(
        engine: &MaintenanceAlertEngine,
        machine: &Machine,
        history: &[MaintenanceRecord],
    ) -> MachineMaintenanceStatus {
        let projection = compute_next_maintenance(machine.current_service_hours, history);
        let alert_level = engine.classify(&projection);
        let reason = engine.generate_reason(machine, &projection, alert_level);

        MachineMaintenanceStatus {
            machine_id: machine.machine_id.clone(),
            machine_name: machine.name.clone(),
            current_service_hours: machine.current_service_hours,
            projection,
            alert_level,
            reason,
        }
    }

    // ==========================================
    // 维保记录登记
    // ==========================================

    /// 登记一次已完成的维保
    ///
    /// # 参数
    /// - machine_id: 机器ID
    /// - service_hours: 执行时服务小时数 (原始输入)
    /// - range: 维保范围 ("C"/"D"/"E"/"F")
    /// - performed_on: 执行日期
    /// - filters_used: 使用的滤芯
    ///
    /// # 返回
    /// 新记录ID
    ///
    /// # 说明
    /// 记录读数高于机器当前读数时, 在同一事务内推进机器读数 (只增不减)
    #[instrument(skip(self, filters_used), fields(filters = filters_used.len()))]
    pub fn log_maintenance(
        &self,
        machine_id: &str,
        service_hours: i64,
        range: &str,
        performed_on: NaiveDate,
        filters_used: Vec<String>,
    ) -> ApiResult<String> {
        let hours = validate_service_hours(service_hours)?;
        let range = range.parse::<MaintenanceRange>()?;
        let machine = self.load_machine(machine_id)?;

        let record = MaintenanceRecord::new(
            machine.machine_id.clone(),
            hours,
            range,
            performed_on,
            filters_used,
        );
        let raised = self.record_repo.create(&record)?;

        if raised {
            tracing::info!(
                machine_id = %machine.machine_id,
                hours,
                "维保读数高于机器读数，已同步机器服务小时数"
            );
        } else if machine.would_regress(hours) {
            tracing::debug!(
                machine_id = %machine.machine_id,
                record_hours = hours,
                current_hours = machine.current_service_hours,
                "补录历史维保"
            );
        }

        tracing::info!(record_id = %record.record_id, range = %range, hours, "维保记录已登记");
        Ok(record.record_id)
    }

    /// 删除维保记录 (后续查询基于剩余记录重新计算)
    #[instrument(skip(self))]
    pub fn delete_maintenance(&self, record_id: &str) -> ApiResult<()> {
        let record_id = require_non_empty(record_id, "维保记录ID")?;
        self.record_repo.delete(record_id)?;
        tracing::info!(record_id, "维保记录已删除");
        Ok(())
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 查询机器的下次维保
    #[instrument(skip(self))]
    pub fn get_next_maintenance(&self, machine_id: &str) -> ApiResult<MachineMaintenanceStatus> {
        let machine = self.load_machine(machine_id)?;
        let history = self.record_repo.find_by_machine(&machine.machine_id)?;
        let engine = self.alert_engine()?;

        Ok(Self::build_status(&engine, &machine, &history))
    }

    /// 查询维保历史, 每行附带 "此次之后应做的范围"
    ///
    /// # 返回
    /// 按服务小时数倒序 (最近的在前)
    #[instrument(skip(self))]
    pub fn list_history_with_next(&self, machine_id: &str) -> ApiResult<Vec<HistoryRowView>> {
        let machine = self.load_machine(machine_id)?;
        let history = self.record_repo.find_by_machine(&machine.machine_id)?;

        let mut rows: Vec<HistoryRowView> = history
            .iter()
            .map(|record| {
                let next = compute_next_range_for_record(record, &history);
                HistoryRowView {
                    record: record.clone(),
                    next_range: next.range,
                    next_due_hours: next.hours,
                }
            })
            .collect();
        rows.reverse();

        Ok(rows)
    }

    /// 驾驶舱告警列表
    ///
    /// # 返回
    /// 所有非 NORMAL 的机器, 先按等级降序, 再按剩余小时数升序
    #[instrument(skip(self))]
    pub fn list_dashboard_alerts(&self) -> ApiResult<Vec<MachineMaintenanceStatus>> {
        let engine = self.alert_engine()?;
        let machines = self.machine_repo.list_all()?;

        let mut alerts = Vec::new();
        for machine in &machines {
            let history = self.record_repo.find_by_machine(&machine.machine_id)?;
            let status = Self::build_status(&engine, machine, &history);
            if engine.should_notify(status.alert_level) {
                alerts.push(status);
            }
        }

        alerts.sort_by(|a, b| {
            b.alert_level
                .cmp(&a.alert_level)
                .then(a.projection.hours_remaining.cmp(&b.projection.hours_remaining))
                .then_with(|| a.machine_id.cmp(&b.machine_id))
        });

        tracing::info!(machines = machines.len(), alerts = alerts.len(), "驾驶舱告警已生成");
        Ok(alerts)
    }

    // ==========================================
    // CSV 导入/导出
    // ==========================================

    /// 从 CSV 导入维保历史
    ///
    /// # 规则
    /// - 任一行非法或引用未登记的机器 → 整体拒绝
    /// - 写入在单事务内完成, 机器读数推进到导入记录的最大服务小时数 (只增不减)
    ///
    /// # 返回
    /// 导入条数
    #[instrument(skip(self, path), fields(file = %path.display()))]
    pub fn import_history_csv(&self, path: &Path) -> ApiResult<usize> {
        let rows = parse_history_file(path)?;

        for row in &rows {
            if self.machine_repo.find_by_id(&row.record.machine_id)?.is_none() {
                return Err(ImportError::UnknownMachine {
                    row: row.line,
                    machine_id: row.record.machine_id.clone(),
                }
                .into());
            }
        }

        let records: Vec<MaintenanceRecord> = rows.into_iter().map(|row| row.record).collect();
        let count = self.record_repo.batch_create(&records)?;

        tracing::info!(count, "维保历史导入完成");
        Ok(count)
    }

    /// 导出全部维保历史为 CSV
    ///
    /// # 返回
    /// 导出条数
    #[instrument(skip(self, path), fields(file = %path.display()))]
    pub fn export_history_csv(&self, path: &Path) -> ApiResult<usize> {
        let records = self.record_repo.list_all()?;
        let file = std::fs::File::create(path).map_err(ImportError::from)?;
        write_history_csv(file, &records)?;

        tracing::info!(count = records.len(), "维保历史导出完成");
        Ok(records.len())
    }
}
