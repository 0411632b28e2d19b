// ==========================================
// GestiFiltres - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod machine;
pub mod maintenance;
pub mod types;

// 重导出核心类型
pub use machine::Machine;
pub use maintenance::{MaintenanceProjection, MaintenanceRecord, NextRangeForRecord};
pub use types::{validate_service_hours, AlertLevel, MaintenanceRange, SchedulerError};
