// ==========================================
// 货架陈列系统 - 日志初始化
// ==========================================
// 使用 tracing + tracing-subscriber
// RUST_LOG: 过滤器（默认 info），如 RUST_LOG=shelf_planogram=debug,perf=debug
// SHELF_PLANOGRAM_LOG_JSON: 1/true 时输出 JSON 行
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    pub fn from_env() -> Self {
        match std::env::var("SHELF_PLANOGRAM_LOG_JSON") {
            Ok(v) if matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true") => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// 按环境变量选择格式并初始化
pub fn init_from_env() {
    match LogFormat::from_env() {
        LogFormat::Text => init(),
        LogFormat::Json => init_json(),
    }
}

/// 文本格式
///
/// ```no_run
/// shelf_planogram::logging::init();
/// ```
pub fn init() {
    fmt()
        .with_env_filter(env_filter())
        .with_target(true)
        .with_line_number(true)
        .init();
}

/// JSON 格式（附带当前 span，便于按 shelf_id 检索）
pub fn init_json() {
    fmt()
        .json()
        .with_env_filter(env_filter())
        .with_current_span(true)
        .with_span_list(false)
        .init();
}

/// 测试用：debug 级别，写入测试输出，重复调用无副作用
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("shelf_planogram=debug,perf=debug"))
        .with_test_writer()
        .try_init();
}
