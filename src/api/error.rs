// ==========================================
// GestiFiltres - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换下层错误为用户友好的错误消息
// 所有错误信息必须包含显式原因
// ==========================================

use crate::domain::types::SchedulerError;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 导入错误
    // ==========================================
    #[error("文件导入失败: {0}")]
    ImportError(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::ValidationError(format!("存储字段{}非法: {}", field, message))
            }
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 SchedulerError 转换 (边界校验失败)
// ==========================================
impl From<SchedulerError> for ApiError {
    fn from(err: SchedulerError) -> Self {
        ApiError::InvalidInput(err.to_string())
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::InvalidRow { .. }
            | ImportError::TypeConversionError { .. }
            | ImportError::DateFormatError { .. }
            | ImportError::UnknownMachine { .. } => ApiError::ValidationError(err.to_string()),
            other => ApiError::ImportError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

/// 校验ID类参数非空, 返回去除首尾空白后的值
pub fn require_non_empty<'a>(value: &'a str, label: &str) -> ApiResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::InvalidInput(format!("{}不能为空", label)));
    }
    Ok(trimmed)
}
