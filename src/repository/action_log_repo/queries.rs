use super::core::{ActionLogRepository, TS_FORMAT};
use crate::domain::action_log::ActionLog;
use crate::domain::types::{PlacementId, ShelfId};
use crate::repository::error::RepositoryResult;
use chrono::NaiveDateTime;
use rusqlite::{params, OptionalExtension, Result as SqliteResult, Row};

const SELECT_COLUMNS: &str = r#"
    SELECT action_id, shelf_id, placement_id, action_type, action_ts, actor,
           payload_json, detail
    FROM action_log
"#;

impl ActionLogRepository {
    // ==========================================
    // 查询操作
    // ==========================================

    /// 按 action_id 查询单个日志
    pub fn find_by_id(&self, action_id: &str) -> RepositoryResult<Option<ActionLog>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE action_id = ?", SELECT_COLUMNS);

        let log = conn
            .query_row(&sql, params![action_id], |row| self.map_row(row))
            .optional()?;
        Ok(log)
    }

    /// 查询货架的操作日志（最新在前）
    pub fn find_by_shelf(&self, shelf_id: ShelfId, limit: usize) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE shelf_id = ? ORDER BY action_ts DESC, rowid DESC LIMIT ?",
            SELECT_COLUMNS
        );

        let mut stmt = conn.prepare(&sql)?;
        let logs = stmt
            .query_map(params![shelf_id, limit as i64], |row| self.map_row(row))?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(logs)
    }

    /// 查询陈列位的操作日志（时间正序）
    pub fn find_by_placement(&self, placement_id: PlacementId) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE placement_id = ? ORDER BY action_ts ASC, rowid ASC",
            SELECT_COLUMNS
        );

        let mut stmt = conn.prepare(&sql)?;
        let logs = stmt
            .query_map(params![placement_id], |row| self.map_row(row))?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(logs)
    }

    /// 统计货架指定类型的日志数
    pub fn count_by_type(&self, shelf_id: ShelfId, action_type: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM action_log WHERE shelf_id = ? AND action_type = ?",
            params![shelf_id, action_type],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    // ==========================================
    // 辅助方法
    // ==========================================

    /// 映射数据库行到 ActionLog
    fn map_row(&self, row: &Row) -> SqliteResult<ActionLog> {
        let action_ts_str: String = row.get(4)?;
        let payload_json_str: Option<String> = row.get(6)?;

        // 解析时间戳
        let action_ts = NaiveDateTime::parse_from_str(&action_ts_str, TS_FORMAT).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?;

        // 解析 JSON 字段
        let payload_json = payload_json_str.and_then(|s| serde_json::from_str(&s).ok());

        Ok(ActionLog {
            action_id: row.get(0)?,
            shelf_id: row.get(1)?,
            placement_id: row.get(2)?,
            action_type: row.get(3)?,
            action_ts,
            actor: row.get(5)?,
            payload_json,
            detail: row.get(7)?,
        })
    }
}
