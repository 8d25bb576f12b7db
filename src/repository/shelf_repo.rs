// ==========================================
// 货架陈列系统 - 货架数据仓储
// ==========================================
// 对齐: shelf 表
// 红线: Repository 不含业务逻辑（参数校验在调用方完成）
// 说明: 删除货架依赖外键级联清理 shelf_placement / placement_cell
// ==========================================

use crate::domain::shelf::Shelf;
use crate::domain::types::ShelfId;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SELECT_COLUMNS: &str = r#"
    shelf_id, name, description, width, height, depth,
    row_count, column_count, cell_width, cell_height, created_at, created_by
"#;

// ==========================================
// ShelfRepository - 货架仓储
// ==========================================
pub struct ShelfRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ShelfRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入货架
    ///
    /// # 返回
    /// - `Ok(shelf_id)`: 新货架ID
    pub fn insert(&self, shelf: &Shelf) -> RepositoryResult<ShelfId> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"
            INSERT INTO shelf (
                name, description, width, height, depth,
                row_count, column_count, cell_width, cell_height, created_at, created_by
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                shelf.name,
                shelf.description,
                shelf.width,
                shelf.height,
                shelf.depth,
                shelf.rows,
                shelf.columns,
                shelf.cell_width,
                shelf.cell_height,
                shelf.created_at.format(TS_FORMAT).to_string(),
                shelf.created_by,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// 按ID查询
    pub fn find_by_id(&self, shelf_id: ShelfId) -> RepositoryResult<Option<Shelf>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM shelf WHERE shelf_id = ?1", SELECT_COLUMNS);

        let shelf = conn
            .query_row(&sql, params![shelf_id], map_row)
            .optional()?;
        Ok(shelf)
    }

    /// 查询全部货架（按ID升序）
    pub fn list_all(&self) -> RepositoryResult<Vec<Shelf>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM shelf ORDER BY shelf_id", SELECT_COLUMNS);

        let mut stmt = conn.prepare(&sql)?;
        let shelves = stmt
            .query_map([], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(shelves)
    }

    /// 删除货架（级联删除陈列位与占用记录）
    ///
    /// # 返回
    /// - `Ok(rows)`: 被删除的货架行数（0 表示不存在）
    pub fn delete(&self, shelf_id: ShelfId) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let rows = conn.execute("DELETE FROM shelf WHERE shelf_id = ?1", params![shelf_id])?;
        Ok(rows)
    }
}

fn map_row(row: &Row) -> SqliteResult<Shelf> {
    let created_at_str: String = row.get(10)?;
    let created_at = NaiveDateTime::parse_from_str(&created_at_str, TS_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(10, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Shelf {
        shelf_id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        width: row.get(3)?,
        height: row.get(4)?,
        depth: row.get(5)?,
        rows: row.get(6)?,
        columns: row.get(7)?,
        cell_width: row.get(8)?,
        cell_height: row.get(9)?,
        created_at,
        created_by: row.get(11)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> ShelfRepository {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        ShelfRepository::new(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_insert_and_find() {
        let repo = setup();
        let shelf = Shelf::new("A棚", 120.0, 180.0, 60.0, 6, 8).with_cell_size(Some(20.0), None);
        let id = repo.insert(&shelf).unwrap();

        let found = repo.find_by_id(id).unwrap().unwrap();
        assert_eq!(found.shelf_id, id);
        assert_eq!(found.name, "A棚");
        assert_eq!(found.rows, 6);
        assert_eq!(found.columns, 8);
        assert_eq!(found.cell_width, Some(20.0));
        assert_eq!(found.cell_height, None);
    }

    #[test]
    fn test_find_missing_returns_none() {
        let repo = setup();
        assert!(repo.find_by_id(999).unwrap().is_none());
        assert_eq!(repo.delete(999).unwrap(), 0);
    }

    #[test]
    fn test_grid_check_constraint() {
        let repo = setup();
        let shelf = Shelf::new("超大", 120.0, 180.0, 60.0, 21, 8);
        assert!(repo.insert(&shelf).is_err());
    }
}
