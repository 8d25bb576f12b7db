// ==========================================
// 货架陈列系统 - 货架领域模型
// ==========================================
// 职责: 货架物理尺寸与网格划分
// 红线: 创建后尺寸不可变（改尺寸 = 删除重建全部陈列）
// ==========================================

use crate::domain::types::ShelfId;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 货架段数/列数上限
pub const MAX_GRID_DIMENSION: u32 = 20;

// ==========================================
// Shelf - 货架
// ==========================================
// 对齐: shelf 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shelf {
    pub shelf_id: ShelfId,
    pub name: String,
    pub description: String,

    // ===== 物理尺寸 (cm) =====
    pub width: f64,
    pub height: f64,
    pub depth: f64,

    // ===== 网格 =====
    pub rows: u32,    // 段数
    pub columns: u32, // 列数

    // ===== 单元尺寸（可选，手动设置）=====
    pub cell_width: Option<f64>,
    pub cell_height: Option<f64>,

    pub created_at: NaiveDateTime,
    pub created_by: Option<String>,
}

/// 货架参数校验错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShelfError {
    #[error("货架尺寸必须为正数: {field}={value}")]
    NonPositiveDimension { field: &'static str, value: f64 },

    #[error("网格划分超出范围: {field}={value}（允许 1..={max}）")]
    GridOutOfRange {
        field: &'static str,
        value: u32,
        max: u32,
    },
}

impl Shelf {
    /// 创建货架（未持久化，shelf_id=0）
    pub fn new(name: &str, width: f64, height: f64, depth: f64, rows: u32, columns: u32) -> Self {
        Self {
            shelf_id: 0,
            name: name.to_string(),
            description: String::new(),
            width,
            height,
            depth,
            rows,
            columns,
            cell_width: None,
            cell_height: None,
            created_at: chrono::Local::now().naive_local(),
            created_by: None,
        }
    }

    /// 手动指定单元尺寸
    pub fn with_cell_size(mut self, cell_width: Option<f64>, cell_height: Option<f64>) -> Self {
        self.cell_width = cell_width;
        self.cell_height = cell_height;
        self
    }

    /// 校验货架不变量
    pub fn validate(&self) -> Result<(), ShelfError> {
        for (field, value) in [
            ("width", self.width),
            ("height", self.height),
            ("depth", self.depth),
        ] {
            if !(value > 0.0) || !value.is_finite() {
                return Err(ShelfError::NonPositiveDimension { field, value });
            }
        }

        for (field, value) in [("rows", self.rows), ("columns", self.columns)] {
            if value < 1 || value > MAX_GRID_DIMENSION {
                return Err(ShelfError::GridOutOfRange {
                    field,
                    value,
                    max: MAX_GRID_DIMENSION,
                });
            }
        }

        for (field, value) in [("cell_width", self.cell_width), ("cell_height", self.cell_height)] {
            if let Some(v) = value {
                if !(v > 0.0) || !v.is_finite() {
                    return Err(ShelfError::NonPositiveDimension { field, value: v });
                }
            }
        }

        Ok(())
    }

    pub fn total_cells(&self) -> u32 {
        self.rows * self.columns
    }

    /// 单元宽度（cm）：手动值优先，否则 width / columns
    pub fn calculated_cell_width(&self) -> f64 {
        match self.cell_width {
            Some(w) if w > 0.0 => w,
            _ => self.width / self.columns.max(1) as f64,
        }
    }

    /// 单元高度（cm）：手动值优先，否则 height / rows
    pub fn calculated_cell_height(&self) -> f64 {
        match self.cell_height {
            Some(h) if h > 0.0 => h,
            _ => self.height / self.rows.max(1) as f64,
        }
    }

    /// 货架正面面积（cm²）
    pub fn front_area(&self) -> f64 {
        self.width * self.height
    }

    /// 中间段（视线高度）
    pub fn middle_row(&self) -> f64 {
        (self.rows as f64 - 1.0) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculated_cell_size() {
        let shelf = Shelf::new("S1", 120.0, 180.0, 60.0, 6, 8);
        assert_eq!(shelf.calculated_cell_width(), 15.0);
        assert_eq!(shelf.calculated_cell_height(), 30.0);
        assert_eq!(shelf.total_cells(), 48);

        let manual = shelf.with_cell_size(Some(20.0), None);
        assert_eq!(manual.calculated_cell_width(), 20.0);
        assert_eq!(manual.calculated_cell_height(), 30.0);
    }

    #[test]
    fn test_validate() {
        assert!(Shelf::new("ok", 120.0, 180.0, 60.0, 6, 8).validate().is_ok());

        let err = Shelf::new("bad", 0.0, 180.0, 60.0, 6, 8).validate().unwrap_err();
        assert!(matches!(err, ShelfError::NonPositiveDimension { field: "width", .. }));

        let err = Shelf::new("bad", 120.0, 180.0, 60.0, 21, 8).validate().unwrap_err();
        assert!(matches!(err, ShelfError::GridOutOfRange { field: "rows", .. }));

        let err = Shelf::new("bad", 120.0, 180.0, 60.0, 6, 0).validate().unwrap_err();
        assert!(matches!(err, ShelfError::GridOutOfRange { field: "columns", .. }));
    }
}
