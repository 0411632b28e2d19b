// ==========================================
// GestiFiltres - 机器管理 API
// ==========================================
// 职责: 机器登记、查询、服务小时数更新
// ==========================================

use std::sync::Arc;
use tracing::instrument;

use crate::api::error::{require_non_empty, ApiError, ApiResult};
use crate::domain::machine::Machine;
use crate::domain::types::validate_service_hours;
use crate::repository::machine_repo::MachineRepository;

// ==========================================
// MachineApi - 机器管理 API
// ==========================================
pub struct MachineApi {
    machine_repo: Arc<MachineRepository>,
}

impl MachineApi {
    /// 创建新的MachineApi实例
    pub fn new(machine_repo: Arc<MachineRepository>) -> Self {
        Self { machine_repo }
    }

    /// 登记新机器
    ///
    /// # 参数
    /// - machine_id: 机器ID
    /// - name: 机器名称
    /// - current_service_hours: 当前服务小时数 (原始输入, 需非负)
    /// - model / serial_number: 可选描述
    #[instrument(skip(self))]
    pub fn register_machine(
        &self,
        machine_id: &str,
        name: &str,
        current_service_hours: i64,
        model: Option<String>,
        serial_number: Option<String>,
    ) -> ApiResult<Machine> {
        let machine_id = require_non_empty(machine_id, "机器ID")?;
        let name = require_non_empty(name, "机器名称")?;
        let hours = validate_service_hours(current_service_hours)?;

        let machine = Machine::new(machine_id.to_string(), name.to_string(), hours)
            .with_details(model, serial_number);
        self.machine_repo.create(&machine)?;

        tracing::info!(machine_id = %machine.machine_id, hours, "机器已登记");
        Ok(machine)
    }

    /// 查询机器
    pub fn get_machine(&self, machine_id: &str) -> ApiResult<Machine> {
        let machine_id = require_non_empty(machine_id, "机器ID")?;

        self.machine_repo
            .find_by_id(machine_id)?
            .ok_or_else(|| ApiError::NotFound(format!("机器(id={})不存在", machine_id)))
    }

    /// 查询全部机器
    pub fn list_machines(&self) -> ApiResult<Vec<Machine>> {
        Ok(self.machine_repo.list_all()?)
    }

    /// 更新服务小时数
    ///
    /// # 规则
    /// - 读数必须非负
    /// - 读数不得小于当前值 (里程单调不减, 比较与写入原子完成)
    #[instrument(skip(self))]
    pub fn update_service_hours(&self, machine_id: &str, service_hours: i64) -> ApiResult<Machine> {
        let hours = validate_service_hours(service_hours)?;
        let machine_id = require_non_empty(machine_id, "机器ID")?;

        if !self.machine_repo.raise_service_hours(machine_id, hours)? {
            let current = self.get_machine(machine_id)?.current_service_hours;
            return Err(ApiError::BusinessRuleViolation(format!(
                "服务小时数不可倒退: machine_id={}, current={}, new={}",
                machine_id, current, hours
            )));
        }

        self.get_machine(machine_id)
    }

    /// 删除机器 (连同维保记录)
    #[instrument(skip(self))]
    pub fn delete_machine(&self, machine_id: &str) -> ApiResult<()> {
        let machine_id = require_non_empty(machine_id, "机器ID")?;
        self.machine_repo.delete(machine_id)?;
        tracing::info!(machine_id, "机器已删除");
        Ok(())
    }
}
