use crate::domain::action_log::ActionLog;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

pub(super) const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

const INSERT_SQL: &str = "INSERT INTO action_log (
    action_id, shelf_id, placement_id, action_type, action_ts, actor, payload_json, detail
) VALUES (?, ?, ?, ?, ?, ?, ?, ?)";

// ==========================================
// ActionLogRepository - 陈列操作审计
// ==========================================
// 不设货架外键：删除货架后记录仍可按 shelf_id 查询
pub struct ActionLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ActionLogRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    pub(super) fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入一条操作日志，返回 action_id
    pub fn insert(&self, log: &ActionLog) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        conn.execute(
            INSERT_SQL,
            params![
                log.action_id,
                log.shelf_id,
                log.placement_id,
                log.action_type,
                log.action_ts.format(TS_FORMAT).to_string(),
                log.actor,
                log.payload_json.as_ref().map(|v| v.to_string()),
                log.detail,
            ],
        )?;
        Ok(log.action_id.clone())
    }
}
