// ==========================================
// 货架陈列系统 - 性能埋点
// ==========================================
// 职责: 读路径重建（网格/统计）与批量导入的耗时、SQL 语句数统计
// 开关: SHELF_PLANOGRAM_PERF_SQL / SHELF_PLANOGRAM_SLOW_SQL_MS
// ==========================================

use rusqlite::Connection;
use std::cell::Cell;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::domain::types::ShelfId;

static SQL_TRACING: AtomicBool = AtomicBool::new(false);
static SLOW_SQL_MS: AtomicU64 = AtomicU64::new(0);

/// 慢操作阈值：超过后以 warn 级别输出
const SLOW_OP_MS: u64 = 500;

thread_local! {
    // 仅统计处于 PerfGuard 作用域内的语句
    static OPEN_GUARDS: Cell<u32> = Cell::new(0);
    static STATEMENTS: Cell<u64> = Cell::new(0);
    static SLOW_STATEMENTS: Cell<u64> = Cell::new(0);
}

/// SQL 埋点设置（来自环境变量）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqlTraceSettings {
    pub enabled: bool,
    pub slow_sql_ms: u64,
}

impl SqlTraceSettings {
    pub fn from_env() -> Self {
        let enabled = std::env::var("SHELF_PLANOGRAM_PERF_SQL")
            .map(|v| flag_value(&v))
            .unwrap_or(cfg!(debug_assertions));
        let slow_sql_ms = std::env::var("SHELF_PLANOGRAM_SLOW_SQL_MS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(if cfg!(debug_assertions) { 50 } else { 200 });
        Self { enabled, slow_sql_ms }
    }
}

fn flag_value(v: &str) -> bool {
    matches!(
        v.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn one_line(sql: &str, max_chars: usize) -> String {
    let flat = sql.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars).collect();
    format!("{}…", cut)
}

/// 在连接上安装 profile 回调
pub fn install_sqlite_tracing(conn: &mut Connection) {
    apply_sql_tracing(conn, SqlTraceSettings::from_env());
}

pub fn apply_sql_tracing(conn: &mut Connection, settings: SqlTraceSettings) {
    SQL_TRACING.store(settings.enabled, Ordering::Relaxed);
    SLOW_SQL_MS.store(settings.slow_sql_ms, Ordering::Relaxed);

    // 旧式 profile 回调会覆盖 trace 回调，只注册 profile，语句完成时计数
    if settings.enabled {
        conn.profile(Some(on_statement_done));
    } else {
        conn.profile(None);
    }
}

fn guard_open() -> bool {
    OPEN_GUARDS.with(|d| d.get() > 0)
}

fn bump(counter: &'static std::thread::LocalKey<Cell<u64>>) {
    counter.with(|c| c.set(c.get().saturating_add(1)));
}

fn on_statement_done(sql: &str, duration: Duration) {
    if !SQL_TRACING.load(Ordering::Relaxed) {
        return;
    }
    if guard_open() {
        bump(&STATEMENTS);
    }
    let threshold = SLOW_SQL_MS.load(Ordering::Relaxed);
    let ms = duration.as_millis() as u64;
    if threshold == 0 || ms < threshold {
        return;
    }

    tracing::warn!(target: "slow_sql", duration_ms = ms, sql = %one_line(sql, 400), "慢 SQL");
    if guard_open() {
        bump(&SLOW_STATEMENTS);
    }
}

/// 作用域耗时统计
///
/// ```ignore
/// let _perf = PerfGuard::for_shelf("build_shelf_grid", shelf_id);
/// ```
pub struct PerfGuard {
    op: &'static str,
    shelf_id: Option<ShelfId>,
    started: Instant,
    statements_at_start: u64,
    slow_at_start: u64,
}

impl PerfGuard {
    pub fn new(op: &'static str) -> Self {
        OPEN_GUARDS.with(|d| d.set(d.get().saturating_add(1)));
        Self {
            op,
            shelf_id: None,
            started: Instant::now(),
            statements_at_start: STATEMENTS.with(Cell::get),
            slow_at_start: SLOW_STATEMENTS.with(Cell::get),
        }
    }

    pub fn for_shelf(op: &'static str, shelf_id: ShelfId) -> Self {
        let mut guard = Self::new(op);
        guard.shelf_id = Some(shelf_id);
        guard
    }

    /// 作用域内已执行的 SQL 语句数
    pub fn statements(&self) -> u64 {
        STATEMENTS
            .with(Cell::get)
            .saturating_sub(self.statements_at_start)
    }
}

impl Drop for PerfGuard {
    fn drop(&mut self) {
        let elapsed_ms = self.started.elapsed().as_millis() as u64;
        let sql_count = self.statements();
        let slow_sql_count = SLOW_STATEMENTS
            .with(Cell::get)
            .saturating_sub(self.slow_at_start);
        let shelf_id = self.shelf_id.unwrap_or_default();

        if elapsed_ms >= SLOW_OP_MS {
            tracing::warn!(target: "perf", op = self.op, shelf_id, elapsed_ms, sql_count, slow_sql_count, "慢操作");
        } else {
            tracing::debug!(target: "perf", op = self.op, shelf_id, elapsed_ms, sql_count, slow_sql_count, "done");
        }

        OPEN_GUARDS.with(|d| d.set(d.get().saturating_sub(1)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_value() {
        assert!(flag_value("1"));
        assert!(flag_value(" On "));
        assert!(!flag_value("0"));
        assert!(!flag_value("off"));
    }

    #[test]
    fn test_one_line() {
        assert_eq!(one_line("SELECT *\n  FROM shelf", 100), "SELECT * FROM shelf");
        assert_eq!(one_line("SELECT 货架", 8), "SELECT 货…");
    }

    #[test]
    fn test_guard_counts_statements_in_scope() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_sql_tracing(
            &mut conn,
            SqlTraceSettings {
                enabled: true,
                slow_sql_ms: 0,
            },
        );

        conn.execute_batch("CREATE TABLE t (x INTEGER);").unwrap();
        let guard = PerfGuard::for_shelf("test_op", 1);
        conn.execute("INSERT INTO t VALUES (1)", []).unwrap();
        conn.execute("INSERT INTO t VALUES (2)", []).unwrap();
        assert!(guard.statements() >= 2);
    }
}
