// ==========================================
// GestiFiltres - API 层
// ==========================================
// 职责: 提供业务 API 接口,负责边界校验与编排
// ==========================================

pub mod error;
pub mod machine_api;
pub mod maintenance_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use machine_api::MachineApi;
pub use maintenance_api::{HistoryRowView, MachineMaintenanceStatus, MaintenanceApi};
