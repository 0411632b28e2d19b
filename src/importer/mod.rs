// ==========================================
// GestiFiltres - 导入层
// ==========================================
// 职责: 维保历史 CSV 导入/导出
// ==========================================

pub mod error;
pub mod history_csv;

pub use error::ImportError;
pub use history_csv::{parse_history_csv, parse_history_file, write_history_csv, ImportedRecord};
