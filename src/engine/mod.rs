// ==========================================
// GestiFiltres - 引擎层
// ==========================================
// 职责: 实现业务规则引擎,不拼 SQL
// 红线: Engine 不拼 SQL, 所有告警必须输出 reason
// ==========================================

pub mod maintenance_alert;
pub mod maintenance_scheduler;

// 重导出核心引擎
pub use maintenance_alert::{AlertThresholds, MaintenanceAlertEngine};
pub use maintenance_scheduler::{
    compute_next_maintenance, compute_next_range_for_record, replay_pointer, INTERVAL_HOURS,
    MAINTENANCE_CYCLE,
};
