// ==========================================
// 货架陈列系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键级联依赖 foreign_keys=ON）
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 提供建表脚本（幂等），供应用启动与测试共用
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 建表脚本
///
/// 说明：
/// - shelf_placement / placement_cell 随货架删除级联删除
/// - placement_cell 以 (shelf_id, cell_row, cell_column) 为主键，数据库层面兜底单元唯一性；
///   强制陈列覆盖到已占用单元时不写入该单元（见 PlacementRepository）
/// - action_log 不设货架外键，删除货架后审计记录保留
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now', 'localtime'))
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id TEXT NOT NULL DEFAULT 'global',
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now', 'localtime')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS maker (
    maker_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS product (
    product_id INTEGER PRIMARY KEY AUTOINCREMENT,
    product_name TEXT NOT NULL,
    product_code TEXT NOT NULL UNIQUE,
    maker_id INTEGER NOT NULL REFERENCES maker(maker_id),
    width REAL,
    height REAL,
    depth REAL,
    is_own_product INTEGER NOT NULL DEFAULT 0,
    min_face_count INTEGER,
    max_face_count INTEGER,
    is_active INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS shelf (
    shelf_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    width REAL NOT NULL CHECK (width > 0),
    height REAL NOT NULL CHECK (height > 0),
    depth REAL NOT NULL CHECK (depth > 0),
    row_count INTEGER NOT NULL CHECK (row_count BETWEEN 1 AND 20),
    column_count INTEGER NOT NULL CHECK (column_count BETWEEN 1 AND 20),
    cell_width REAL,
    cell_height REAL,
    created_at TEXT NOT NULL,
    created_by TEXT
);

CREATE TABLE IF NOT EXISTS shelf_placement (
    placement_id INTEGER PRIMARY KEY AUTOINCREMENT,
    shelf_id INTEGER NOT NULL REFERENCES shelf(shelf_id) ON DELETE CASCADE,
    product_id INTEGER NOT NULL REFERENCES product(product_id),
    origin_row INTEGER NOT NULL CHECK (origin_row >= 0),
    origin_column INTEGER NOT NULL CHECK (origin_column >= 0),
    face_count INTEGER NOT NULL CHECK (face_count >= 1),
    span_rows INTEGER NOT NULL CHECK (span_rows >= 1),
    span_columns INTEGER NOT NULL CHECK (span_columns >= 1),
    display_width_ratio REAL NOT NULL DEFAULT 1.0,
    display_height_ratio REAL NOT NULL DEFAULT 1.0,
    force_override INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    created_by TEXT
);

CREATE INDEX IF NOT EXISTS idx_shelf_placement_shelf ON shelf_placement(shelf_id);

CREATE TABLE IF NOT EXISTS placement_cell (
    shelf_id INTEGER NOT NULL REFERENCES shelf(shelf_id) ON DELETE CASCADE,
    cell_row INTEGER NOT NULL,
    cell_column INTEGER NOT NULL,
    placement_id INTEGER NOT NULL REFERENCES shelf_placement(placement_id) ON DELETE CASCADE,
    PRIMARY KEY (shelf_id, cell_row, cell_column)
);

CREATE INDEX IF NOT EXISTS idx_placement_cell_placement ON placement_cell(placement_id);

CREATE TABLE IF NOT EXISTS action_log (
    action_id TEXT PRIMARY KEY,
    shelf_id INTEGER NOT NULL,
    placement_id INTEGER,
    action_type TEXT NOT NULL,
    action_ts TEXT NOT NULL,
    actor TEXT NOT NULL,
    payload_json TEXT,
    detail TEXT
);

CREATE INDEX IF NOT EXISTS idx_action_log_shelf ON action_log(shelf_id, action_ts);
"#;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 建表（幂等）并写入 schema_version
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}
