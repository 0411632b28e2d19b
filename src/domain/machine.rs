// ==========================================
// GestiFiltres - 机器领域模型
// ==========================================
// 对齐: machine 表
// ==========================================

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Machine - 机器
// ==========================================
// 约束: current_service_hours 在正常运行中单调不减
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Machine {
    // ===== 主键 =====
    pub machine_id: String, // 机器ID

    // ===== 描述字段 =====
    pub name: String,                  // 机器名称
    pub model: Option<String>,         // 型号
    pub serial_number: Option<String>, // 序列号

    // ===== 里程 =====
    pub current_service_hours: u32, // 当前服务小时数

    // ===== 审计 =====
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Machine {
    /// 创建新机器
    ///
    /// # 参数
    /// - `machine_id`: 机器ID
    /// - `name`: 机器名称
    /// - `current_service_hours`: 初始服务小时数
    pub fn new(machine_id: String, name: String, current_service_hours: u32) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            machine_id,
            name,
            model: None,
            serial_number: None,
            current_service_hours,
            created_at: now,
            updated_at: now,
        }
    }

    /// 设置型号与序列号
    pub fn with_details(mut self, model: Option<String>, serial_number: Option<String>) -> Self {
        self.model = model;
        self.serial_number = serial_number;
        self
    }

    /// 判断新读数是否会使里程倒退
    pub fn would_regress(&self, new_service_hours: u32) -> bool {
        new_service_hours < self.current_service_hours
    }
}
