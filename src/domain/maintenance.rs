// ==========================================
// GestiFiltres - 维保领域模型
// ==========================================
// 对齐: maintenance_record 表
// 投影 (MaintenanceProjection) 为派生值, 不落库
// ==========================================

use crate::domain::types::MaintenanceRange;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==========================================
// MaintenanceRecord - 已执行的维保记录
// ==========================================
// 排程引擎只读取 service_hours 与 range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceRecord {
    // ===== 主键 =====
    pub record_id: String,  // 记录ID (UUID)
    pub machine_id: String, // 关联机器

    // ===== 维保内容 =====
    pub service_hours: u32,        // 执行时的服务小时数
    pub range: MaintenanceRange,   // 维保范围
    pub performed_on: NaiveDate,   // 执行日期
    pub filters_used: Vec<String>, // 使用的滤芯编号
}

impl MaintenanceRecord {
    /// 创建新的维保记录 (生成新 UUID)
    pub fn new(
        machine_id: String,
        service_hours: u32,
        range: MaintenanceRange,
        performed_on: NaiveDate,
        filters_used: Vec<String>,
    ) -> Self {
        Self {
            record_id: Uuid::new_v4().to_string(),
            machine_id,
            service_hours,
            range,
            performed_on,
            filters_used,
        }
    }
}

// ==========================================
// MaintenanceProjection - 下次维保投影
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceProjection {
    pub next_range: MaintenanceRange, // 下次维保范围
    pub due_at_hours: u64,            // 到期服务小时数
    pub hours_remaining: i64,         // 剩余小时数 (due_at_hours - 当前)
    pub cycle_position: usize,        // 周期位置 (0..8)
    pub skipped_intervals: u64,       // 快进跳过的区间数
}

impl MaintenanceProjection {
    /// 是否存在被跳过 (错过) 的维保区间
    pub fn has_missed_intervals(&self) -> bool {
        self.skipped_intervals > 0
    }
}

// ==========================================
// NextRangeForRecord - 单条历史记录之后的下一范围
// ==========================================
// 用途: 历史表格标注 "此次维保之后应做什么"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextRangeForRecord {
    pub range: MaintenanceRange,
    pub hours: u64,
}
