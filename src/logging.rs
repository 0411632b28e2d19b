// ==========================================
// GestiFiltres - 日志系统初始化
// ==========================================
// 输出: 文本 (默认) 或 JSON 行, 由 GESTIFILTRES_LOG_FORMAT 选择
// 过滤: RUST_LOG 优先, 否则本 crate info、依赖库 warn
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 未设置 RUST_LOG 时的过滤规则
pub const DEFAULT_FILTER: &str = "warn,gestifiltres=info";

/// 测试环境过滤规则 (rusqlite 等依赖库保持安静)
pub const TEST_FILTER: &str = "warn,gestifiltres=debug";

/// 选择输出格式的环境变量
pub const LOG_FORMAT_ENV: &str = "GESTIFILTRES_LOG_FORMAT";

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// 解析环境变量取值, 无法识别时退回文本格式
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "json" => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

fn build_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// 初始化日志系统
///
/// # 环境变量
/// - RUST_LOG: 日志级别过滤器（默认: warn,gestifiltres=info）
/// - GESTIFILTRES_LOG_FORMAT: `json` 输出结构化 JSON 行, 其余为文本
///
/// # 示例
/// ```no_run
/// use gestifiltres::logging;
/// logging::init();
/// ```
pub fn init() {
    let format = LogFormat::from_env_value(std::env::var(LOG_FORMAT_ENV).ok().as_deref());

    match format {
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(build_filter())
            .with_target(true)
            .with_current_span(true)
            .init(),
        LogFormat::Text => fmt()
            .with_env_filter(build_filter())
            .with_target(true)
            .with_thread_ids(false)
            .with_line_number(true)
            .init(),
    }
}

/// 初始化测试日志, 重复调用安全
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new(TEST_FILTER))
        .with_test_writer()
        .try_init();
}
