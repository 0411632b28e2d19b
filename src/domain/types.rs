// ==========================================
// GestiFiltres - 领域类型定义
// ==========================================
// 维保范围 (C/D/E/F) 与告警等级
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ==========================================
// 输入校验错误 (边界层使用)
// ==========================================
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("无效的服务小时数: {value} (必须为非负整数且不超过 u32 上限)")]
    InvalidServiceHours { value: i64 },

    #[error("未知的维保范围: '{tag}' (仅支持 C/D/E/F)")]
    UnknownRange { tag: String },
}

/// 校验原始服务小时数
///
/// # 返回
/// - Ok(u32): 合法的服务小时数
/// - Err(SchedulerError::InvalidServiceHours): 负数或溢出
pub fn validate_service_hours(value: i64) -> Result<u32, SchedulerError> {
    u32::try_from(value).map_err(|_| SchedulerError::InvalidServiceHours { value })
}

// ==========================================
// 维保范围 (Maintenance Range)
// ==========================================
// C 最轻最频繁, F 最重最稀少
// 序列化格式: 单个字母 (与数据库一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaintenanceRange {
    C, // 基础保养
    D, // 中级保养
    E, // 深度保养
    F, // 大修级保养
}

impl MaintenanceRange {
    /// 所有范围，按维保深度递增
    pub const ALL: [MaintenanceRange; 4] = [
        MaintenanceRange::C,
        MaintenanceRange::D,
        MaintenanceRange::E,
        MaintenanceRange::F,
    ];

    /// 数据库存储字符串
    pub fn as_str(&self) -> &'static str {
        match self {
            MaintenanceRange::C => "C",
            MaintenanceRange::D => "D",
            MaintenanceRange::E => "E",
            MaintenanceRange::F => "F",
        }
    }
}

impl fmt::Display for MaintenanceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MaintenanceRange {
    type Err = SchedulerError;

    /// 从字符串解析 (忽略首尾空白与大小写)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "C" => Ok(MaintenanceRange::C),
            "D" => Ok(MaintenanceRange::D),
            "E" => Ok(MaintenanceRange::E),
            "F" => Ok(MaintenanceRange::F),
            _ => Err(SchedulerError::UnknownRange { tag: s.to_string() }),
        }
    }
}

// ==========================================
// 告警等级 (Alert Level)
// ==========================================
// 顺序: Normal < Upcoming < Urgent < Overdue
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertLevel {
    Normal,   // 正常
    Upcoming, // 即将到期
    Urgent,   // 紧急
    Overdue,  // 已超期
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertLevel::Normal => write!(f, "NORMAL"),
            AlertLevel::Upcoming => write!(f, "UPCOMING"),
            AlertLevel::Urgent => write!(f, "URGENT"),
            AlertLevel::Overdue => write!(f, "OVERDUE"),
        }
    }
}
