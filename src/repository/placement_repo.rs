// ==========================================
// 货架陈列系统 - 陈列位数据仓储
// ==========================================
// 对齐: shelf_placement 表 / placement_cell 表
// 红线: 陈列位与其占用记录必须在同一事务内写入
// 红线: Repository 不做冲突判定，只做数据映射（冲突判定在 PlacementStore 锁内完成）
// ==========================================

use crate::domain::placement::{CellDiff, OccupancyRecord, Placement};
use crate::domain::types::{CellPos, PlacementId, ShelfId};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row, Transaction};
use std::sync::{Arc, Mutex};

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SELECT_COLUMNS: &str = r#"
    placement_id, shelf_id, product_id, origin_row, origin_column, face_count,
    span_rows, span_columns, display_width_ratio, display_height_ratio,
    force_override, created_at, created_by
"#;

// ==========================================
// PlacementRepository - 陈列位仓储
// ==========================================
pub struct PlacementRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PlacementRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作（事务）
    // ==========================================

    /// 插入陈列位及其占用记录
    ///
    /// # 参数
    /// - `placement`: 陈列位（placement_id 忽略，由数据库分配）
    /// - `cells`: 归属该陈列位的单元（强制陈列时为未被他人占用的部分）
    ///
    /// # 返回
    /// - `Ok(placement_id)`
    pub fn insert_with_cells(
        &self,
        placement: &Placement,
        cells: &[CellPos],
    ) -> RepositoryResult<PlacementId> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO shelf_placement (
                shelf_id, product_id, origin_row, origin_column, face_count,
                span_rows, span_columns, display_width_ratio, display_height_ratio,
                force_override, created_at, created_by
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                placement.shelf_id,
                placement.product_id,
                placement.row,
                placement.column,
                placement.face_count,
                placement.span_rows,
                placement.span_columns,
                placement.display_width_ratio,
                placement.display_height_ratio,
                placement.force_override,
                placement.created_at.format(TS_FORMAT).to_string(),
                placement.created_by,
            ],
        )?;
        let placement_id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                "INSERT INTO placement_cell (shelf_id, cell_row, cell_column, placement_id) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for pos in cells {
                stmt.execute(params![placement.shelf_id, pos.row, pos.column, placement_id])?;
            }
        }

        tx.commit()?;
        Ok(placement_id)
    }

    /// 删除陈列位，并写入被遮挡陈列位接替后的单元所属
    ///
    /// # 返回
    /// - `Ok(rows)`: 被删除的陈列位行数（0 表示不存在）
    pub fn delete(
        &self,
        shelf_id: ShelfId,
        placement_id: PlacementId,
        diff: &CellDiff,
    ) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let rows = tx.execute(
            "DELETE FROM shelf_placement WHERE placement_id = ?1 AND shelf_id = ?2",
            params![placement_id, shelf_id],
        )?;
        if rows > 0 {
            apply_cell_diff(&tx, shelf_id, diff)?;
        }

        tx.commit()?;
        Ok(rows)
    }

    /// 更新陈列位几何（排面数/跨度/显示比例）并替换占用记录
    pub fn update_geometry(&self, placement: &Placement, diff: &CellDiff) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let rows = tx.execute(
            r#"
            UPDATE shelf_placement
            SET face_count = ?1, span_rows = ?2, span_columns = ?3,
                display_width_ratio = ?4, display_height_ratio = ?5
            WHERE placement_id = ?6 AND shelf_id = ?7
            "#,
            params![
                placement.face_count,
                placement.span_rows,
                placement.span_columns,
                placement.display_width_ratio,
                placement.display_height_ratio,
                placement.placement_id,
                placement.shelf_id,
            ],
        )?;
        if rows == 0 {
            return Err(RepositoryError::not_found(
                "shelf_placement",
                placement.placement_id,
            ));
        }

        apply_cell_diff(&tx, placement.shelf_id, diff)?;

        tx.commit()?;
        Ok(())
    }

    // ==========================================
    // 查询操作
    // ==========================================

    pub fn find_by_id(&self, placement_id: PlacementId) -> RepositoryResult<Option<Placement>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM shelf_placement WHERE placement_id = ?1",
            SELECT_COLUMNS
        );
        let placement = conn
            .query_row(&sql, params![placement_id], map_row)
            .optional()?;
        Ok(placement)
    }

    /// 查询货架的全部陈列位（按 placement_id 升序）
    pub fn find_by_shelf(&self, shelf_id: ShelfId) -> RepositoryResult<Vec<Placement>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM shelf_placement WHERE shelf_id = ?1 ORDER BY placement_id",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let placements = stmt
            .query_map(params![shelf_id], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(placements)
    }

    /// 读取货架的占用记录（按 row, column 排序）
    pub fn load_cells(&self, shelf_id: ShelfId) -> RepositoryResult<Vec<OccupancyRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT placement_id, cell_row, cell_column
            FROM placement_cell
            WHERE shelf_id = ?1
            ORDER BY cell_row, cell_column
            "#,
        )?;
        let records = stmt
            .query_map(params![shelf_id], |row| {
                Ok(OccupancyRecord {
                    placement_id: row.get(0)?,
                    row: row.get(1)?,
                    column: row.get(2)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(records)
    }

    pub fn count_by_shelf(&self, shelf_id: ShelfId) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM shelf_placement WHERE shelf_id = ?1",
            params![shelf_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

fn apply_cell_diff(tx: &Transaction, shelf_id: ShelfId, diff: &CellDiff) -> RepositoryResult<()> {
    let mut clear = tx.prepare(
        "DELETE FROM placement_cell WHERE shelf_id = ?1 AND cell_row = ?2 AND cell_column = ?3",
    )?;
    for pos in &diff.cleared {
        clear.execute(params![shelf_id, pos.row, pos.column])?;
    }

    let mut assign = tx.prepare(
        "INSERT OR REPLACE INTO placement_cell (shelf_id, cell_row, cell_column, placement_id) VALUES (?1, ?2, ?3, ?4)",
    )?;
    for rec in &diff.assigned {
        assign.execute(params![shelf_id, rec.row, rec.column, rec.placement_id])?;
    }
    Ok(())
}

fn map_row(row: &Row) -> SqliteResult<Placement> {
    let created_at_str: String = row.get(11)?;
    let created_at = NaiveDateTime::parse_from_str(&created_at_str, TS_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(11, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Placement {
        placement_id: row.get(0)?,
        shelf_id: row.get(1)?,
        product_id: row.get(2)?,
        row: row.get(3)?,
        column: row.get(4)?,
        face_count: row.get(5)?,
        span_rows: row.get(6)?,
        span_columns: row.get(7)?,
        display_width_ratio: row.get(8)?,
        display_height_ratio: row.get(9)?,
        force_override: row.get(10)?,
        created_at,
        created_by: row.get(12)?,
    })
}
