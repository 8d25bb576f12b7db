// ==========================================
// 货架陈列系统 - 陈列位领域模型
// ==========================================
// 职责: 陈列位（原点 + 占用跨度 + 排面数）
// 红线: span_rows / span_columns 只能由几何计算得出，不接受调用方传入
// ==========================================

use crate::domain::product::Product;
use crate::domain::types::{CellPos, CellRect, PlacementId, ProductId, ShelfId, SizeBucket};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// Placement - 陈列位
// ==========================================
// 对齐: shelf_placement 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub placement_id: PlacementId,
    pub shelf_id: ShelfId,
    pub product_id: ProductId,

    // ===== 原点 (0 起始) =====
    pub row: u32,
    pub column: u32,

    pub face_count: u32,

    // ===== 占用跨度（派生）=====
    pub span_rows: u32,
    pub span_columns: u32,

    // ===== 显示比例（仅渲染用，不参与占用判断）=====
    pub display_width_ratio: f64,
    pub display_height_ratio: f64,

    /// 强制陈列（跳过冲突校验，下游需视为不可信）
    pub force_override: bool,

    pub created_at: NaiveDateTime,
    pub created_by: Option<String>,
}

impl Placement {
    /// 占用矩形
    pub fn rect(&self) -> CellRect {
        CellRect::new(self.row, self.column, self.span_rows, self.span_columns)
    }

    /// 占用的全部单元坐标
    pub fn occupied_cells(&self) -> Vec<CellPos> {
        self.rect().cells().collect()
    }

    pub fn occupied_cell_count(&self) -> u32 {
        self.rect().area()
    }

    pub fn is_origin(&self, pos: CellPos) -> bool {
        self.row == pos.row && self.column == pos.column
    }

    pub fn size_bucket(&self) -> SizeBucket {
        self.rect().size_bucket()
    }

    /// 实际占用宽度（cm），宽度未知时为 0
    pub fn total_width_cm(&self, product: &Product) -> f64 {
        product
            .width
            .map(|w| w * self.face_count as f64)
            .unwrap_or(0.0)
    }

    /// 实际占用高度（cm），高度未知时为 0
    pub fn total_height_cm(&self, product: &Product) -> f64 {
        product.height.unwrap_or(0.0)
    }

    /// CSS grid 显示样式
    pub fn display_style(&self) -> DisplayStyle {
        DisplayStyle {
            grid_row_start: self.row + 1,
            grid_row_end: self.row + self.span_rows + 1,
            grid_column_start: self.column + 1,
            grid_column_end: self.column + self.span_columns + 1,
            width_pct: self.display_width_ratio * 100.0,
            height_pct: self.display_height_ratio * 100.0,
        }
    }
}

// ==========================================
// OccupancyRecord - 占用记录
// ==========================================
// 对齐: placement_cell 表
// 每个陈列位覆盖的每个单元各一条（不只原点）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OccupancyRecord {
    pub placement_id: PlacementId,
    pub row: u32,
    pub column: u32,
}

impl OccupancyRecord {
    pub fn pos(&self) -> CellPos {
        CellPos::new(self.row, self.column)
    }
}

// ==========================================
// CellDiff - 单元所属变更（占用记录增量）
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellDiff {
    /// 变为空闲的单元
    pub cleared: Vec<CellPos>,
    /// 新增或更换所属的单元
    pub assigned: Vec<OccupancyRecord>,
}

impl CellDiff {
    pub fn is_empty(&self) -> bool {
        self.cleared.is_empty() && self.assigned.is_empty()
    }
}

// ==========================================
// DisplayStyle - 渲染用网格样式
// ==========================================
// 行列为 1 起始，end 不含
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayStyle {
    pub grid_row_start: u32,
    pub grid_row_end: u32,
    pub grid_column_start: u32,
    pub grid_column_end: u32,
    pub width_pct: f64,
    pub height_pct: f64,
}
