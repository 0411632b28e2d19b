// ==========================================
// GestiFiltres - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error("CSV 写出失败: {0}")]
    CsvWriteError(String),

    // ===== 数据映射错误 =====
    #[error("行数据无效 (行 {row}): {message}")]
    InvalidRow { row: usize, message: String },

    #[error("类型转换失败 (行 {row}, 字段 {field}): {message}")]
    TypeConversionError {
        row: usize,
        field: String,
        message: String,
    },

    #[error("日期格式错误 (行 {row}, 字段 {field}): 期望 YYYY-MM-DD，实际 {value}")]
    DateFormatError {
        row: usize,
        field: String,
        value: String,
    },

    // ===== 关联错误 =====
    #[error("机器不存在 (行 {row}): machine_id={machine_id}")]
    UnknownMachine { row: usize, machine_id: String },
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}
