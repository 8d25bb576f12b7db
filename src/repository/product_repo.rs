// ==========================================
// 货架陈列系统 - 商品/厂商数据仓储
// ==========================================
// 对齐: product 表 / maker 表
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::product::{FaceCountBounds, Maker, Product};
use crate::domain::types::{MakerId, ProductId};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const SELECT_PRODUCT: &str = r#"
    SELECT p.product_id, p.product_name, p.product_code, p.maker_id, m.name,
           p.width, p.height, p.depth, p.is_own_product,
           p.min_face_count, p.max_face_count, p.is_active
    FROM product p
    JOIN maker m ON m.maker_id = p.maker_id
"#;

// ==========================================
// ProductRepository - 商品仓储
// ==========================================
pub struct ProductRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProductRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 厂商
    // ==========================================

    /// 插入厂商（同名已存在时返回既有ID）
    pub fn upsert_maker(&self, name: &str) -> RepositoryResult<MakerId> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO maker (name) VALUES (?1)",
            params![name],
        )?;
        let id = conn.query_row(
            "SELECT maker_id FROM maker WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    pub fn find_maker(&self, maker_id: MakerId) -> RepositoryResult<Option<Maker>> {
        let conn = self.get_conn()?;
        let maker = conn
            .query_row(
                "SELECT maker_id, name FROM maker WHERE maker_id = ?1",
                params![maker_id],
                |row| {
                    Ok(Maker {
                        maker_id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(maker)
    }

    // ==========================================
    // 商品
    // ==========================================

    /// 插入商品
    ///
    /// # 返回
    /// - `Ok(product_id)`
    /// - `Err(UniqueConstraintViolation)`: JAN码重复
    /// - `Err(ForeignKeyViolation)`: 厂商不存在
    pub fn insert(&self, product: &Product) -> RepositoryResult<ProductId> {
        let conn = self.get_conn()?;
        let (min, max) = match product.face_count_bounds {
            Some(b) => (b.min, b.max),
            None => (None, None),
        };

        conn.execute(
            r#"
            INSERT INTO product (
                product_name, product_code, maker_id, width, height, depth,
                is_own_product, min_face_count, max_face_count, is_active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                product.product_name,
                product.product_code,
                product.maker_id,
                product.width,
                product.height,
                product.depth,
                product.is_own_product,
                min,
                max,
                product.is_active,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    pub fn find_by_id(&self, product_id: ProductId) -> RepositoryResult<Option<Product>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE p.product_id = ?1", SELECT_PRODUCT);
        let product = conn
            .query_row(&sql, params![product_id], map_row)
            .optional()?;
        Ok(product)
    }

    /// 批量查询（统计/网格渲染用），返回 product_id -> Product
    pub fn find_by_ids(&self, product_ids: &[ProductId]) -> RepositoryResult<HashMap<ProductId, Product>> {
        if product_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let conn = self.get_conn()?;
        let placeholders = vec!["?"; product_ids.len()].join(", ");
        let sql = format!("{} WHERE p.product_id IN ({})", SELECT_PRODUCT, placeholders);

        let mut stmt = conn.prepare(&sql)?;
        let products = stmt
            .query_map(params_from_iter(product_ids.iter()), map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(products.into_iter().map(|p| (p.product_id, p)).collect())
    }

    /// 查询启用中的商品
    pub fn list_active(&self) -> RepositoryResult<Vec<Product>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE p.is_active = 1 ORDER BY p.product_id", SELECT_PRODUCT);
        let mut stmt = conn.prepare(&sql)?;
        let products = stmt
            .query_map([], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(products)
    }
}

fn map_row(row: &Row) -> SqliteResult<Product> {
    let min: Option<u32> = row.get(9)?;
    let max: Option<u32> = row.get(10)?;
    let face_count_bounds = if min.is_none() && max.is_none() {
        None
    } else {
        Some(FaceCountBounds { min, max })
    };

    Ok(Product {
        product_id: row.get(0)?,
        product_name: row.get(1)?,
        product_code: row.get(2)?,
        maker_id: row.get(3)?,
        maker_name: row.get(4)?,
        width: row.get(5)?,
        height: row.get(6)?,
        depth: row.get(7)?,
        is_own_product: row.get(8)?,
        face_count_bounds,
        is_active: row.get(11)?,
    })
}
