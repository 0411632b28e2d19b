// ==========================================
// GestiFiltres - 维保告警引擎
// ==========================================
// 职责: 根据维保投影判定告警等级, 生成可解释原因
// 输入: MaintenanceProjection + 告警阈值
// 输出: AlertLevel + reason (JSON)
// ==========================================

use crate::domain::machine::Machine;
use crate::domain::maintenance::MaintenanceProjection;
use crate::domain::types::AlertLevel;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// 默认紧急阈值 (剩余小时数)
pub const DEFAULT_URGENT_HOURS: i64 = 50;

/// 默认即将到期阈值 (剩余小时数)
pub const DEFAULT_UPCOMING_HOURS: i64 = 100;

// ==========================================
// AlertThresholds - 告警阈值
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertThresholds {
    pub urgent_hours: i64,   // 剩余 ≤ 此值 → URGENT
    pub upcoming_hours: i64, // 剩余 ≤ 此值 → UPCOMING
}

impl AlertThresholds {
    /// 阈值是否自洽 (非负且 urgent ≤ upcoming)
    pub fn is_consistent(&self) -> bool {
        self.urgent_hours >= 0 && self.urgent_hours <= self.upcoming_hours
    }
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            urgent_hours: DEFAULT_URGENT_HOURS,
            upcoming_hours: DEFAULT_UPCOMING_HOURS,
        }
    }
}

// ==========================================
// MaintenanceAlertEngine - 维保告警引擎
// ==========================================
/// 维保告警引擎
/// 职责: 判定告警等级、生成告警原因
pub struct MaintenanceAlertEngine {
    thresholds: AlertThresholds,
}

impl MaintenanceAlertEngine {
    /// 使用默认阈值创建
    pub fn new() -> Self {
        Self::with_thresholds(AlertThresholds::default())
    }

    /// 使用指定阈值创建
    pub fn with_thresholds(thresholds: AlertThresholds) -> Self {
        Self { thresholds }
    }

    /// 当前阈值
    pub fn thresholds(&self) -> AlertThresholds {
        self.thresholds
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 判定告警等级
    ///
    /// # 规则
    /// - 存在被跳过的区间, 或剩余 ≤ 0 → OVERDUE
    /// - 剩余 ≤ urgent_hours → URGENT
    /// - 剩余 ≤ upcoming_hours → UPCOMING
    /// - 否则 → NORMAL
    pub fn classify(&self, projection: &MaintenanceProjection) -> AlertLevel {
        if projection.has_missed_intervals() || projection.hours_remaining <= 0 {
            AlertLevel::Overdue
        } else if projection.hours_remaining <= self.thresholds.urgent_hours {
            AlertLevel::Urgent
        } else if projection.hours_remaining <= self.thresholds.upcoming_hours {
            AlertLevel::Upcoming
        } else {
            AlertLevel::Normal
        }
    }

    /// 是否需要发出通知
    pub fn should_notify(&self, level: AlertLevel) -> bool {
        level != AlertLevel::Normal
    }

    // ==========================================
    // 可解释性方法
    // ==========================================

    /// 生成告警原因 (JSON)
    pub fn generate_reason(
        &self,
        machine: &Machine,
        projection: &MaintenanceProjection,
        level: AlertLevel,
    ) -> String {
        let reason = match level {
            AlertLevel::Overdue => "已错过维保节点，需立即安排维保",
            AlertLevel::Urgent => "即将到达维保节点，请尽快安排",
            AlertLevel::Upcoming => "维保节点临近，建议提前备料",
            AlertLevel::Normal => "维保状态正常",
        };

        json!({
            "level": level.to_string(),
            "reason": reason,
            "machine_id": machine.machine_id,
            "machine_name": machine.name,
            "current_service_hours": machine.current_service_hours,
            "next_range": projection.next_range.as_str(),
            "due_at_hours": projection.due_at_hours,
            "hours_remaining": projection.hours_remaining,
            "skipped_intervals": projection.skipped_intervals,
        })
        .to_string()
    }
}

impl Default for MaintenanceAlertEngine {
    fn default() -> Self {
        Self::new()
    }
}
