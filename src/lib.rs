// ==========================================
// GestiFiltres - 核心库
// ==========================================
// 系统定位: 设备滤芯维保排程计算
// 技术栈: Rust + SQLite
// 维保周期: C → D → C → E → C → D → C → F, 每 250 服务小时一次
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 排程计算与告警
pub mod engine;

// 导入层 - 维保历史 CSV
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 状态装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{AlertLevel, MaintenanceRange, SchedulerError};

// 领域实体
pub use domain::{Machine, MaintenanceProjection, MaintenanceRecord, NextRangeForRecord};

// 引擎
pub use engine::{
    compute_next_maintenance, compute_next_range_for_record, MaintenanceAlertEngine,
    INTERVAL_HOURS, MAINTENANCE_CYCLE,
};

// API
pub use api::{MachineApi, MaintenanceApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "GestiFiltres";
