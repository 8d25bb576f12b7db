// ==========================================
// 货架陈列系统 - 陈列网格物化
// ==========================================
// 职责: 由占用索引 + 陈列位 + 商品生成 rows × columns 的网格视图
// 说明: 单元所属以占用索引为准（强制陈列重叠时显示先到者）
// 用途: UI 渲染 / 报表，结果由 ShelfCache 缓存
// ==========================================

use crate::domain::placement::Placement;
use crate::domain::product::Product;
use crate::domain::shelf::Shelf;
use crate::domain::types::{CellPos, PlacementId, ProductId, ShelfId};
use crate::engine::occupancy::OccupancyIndex;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementSummary {
    pub placement_id: PlacementId,
    pub product_id: ProductId,
    pub product_name: String,
    pub maker_name: String,
    pub is_own_product: bool,
    pub face_count: u32,
    pub span_rows: u32,
    pub span_columns: u32,
    /// 原点
    pub row: u32,
    pub column: u32,
    /// 当前单元是否为该陈列位原点
    pub is_origin: bool,
    pub force_override: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    pub row: u32,
    pub column: u32,
    pub placement: Option<PlacementSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShelfInfo {
    pub shelf_id: ShelfId,
    pub name: String,
    pub rows: u32,
    pub columns: u32,
    pub cell_width: f64,
    pub cell_height: f64,
}

impl From<&Shelf> for ShelfInfo {
    fn from(shelf: &Shelf) -> Self {
        Self {
            shelf_id: shelf.shelf_id,
            name: shelf.name.clone(),
            rows: shelf.rows,
            columns: shelf.columns,
            cell_width: shelf.calculated_cell_width(),
            cell_height: shelf.calculated_cell_height(),
        }
    }
}

// ==========================================
// ShelfGrid - 网格视图
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShelfGrid {
    /// grid[row][column]
    pub grid: Vec<Vec<GridCell>>,
    pub shelf_info: ShelfInfo,
    pub generated_at: NaiveDateTime,
}

impl ShelfGrid {
    pub fn cell(&self, row: u32, column: u32) -> Option<&GridCell> {
        self.grid.get(row as usize)?.get(column as usize)
    }

    /// 被占用的单元数
    pub fn occupied_cells(&self) -> usize {
        self.grid
            .iter()
            .flatten()
            .filter(|c| c.placement.is_some())
            .count()
    }
}

/// 生成网格视图
///
/// # 参数
/// - `placements`: 货架上的陈列位及其商品（缺少商品信息的陈列位以空名称展示）
pub fn build<'a, I>(shelf: &Shelf, index: &OccupancyIndex, placements: I) -> ShelfGrid
where
    I: IntoIterator<Item = (&'a Placement, Option<&'a Product>)>,
{
    let lookup: HashMap<PlacementId, (&Placement, Option<&Product>)> = placements
        .into_iter()
        .map(|(p, prod)| (p.placement_id, (p, prod)))
        .collect();

    let grid = (0..shelf.rows)
        .map(|row| {
            (0..shelf.columns)
                .map(|column| {
                    let pos = CellPos::new(row, column);
                    let placement = index
                        .owner_at(pos)
                        .and_then(|id| lookup.get(&id))
                        .map(|(p, prod)| summarize(p, *prod, pos));
                    GridCell {
                        row,
                        column,
                        placement,
                    }
                })
                .collect()
        })
        .collect();

    ShelfGrid {
        grid,
        shelf_info: ShelfInfo::from(shelf),
        generated_at: chrono::Local::now().naive_local(),
    }
}

fn summarize(placement: &Placement, product: Option<&Product>, pos: CellPos) -> PlacementSummary {
    PlacementSummary {
        placement_id: placement.placement_id,
        product_id: placement.product_id,
        product_name: product.map(|p| p.product_name.clone()).unwrap_or_default(),
        maker_name: product.map(|p| p.maker_name.clone()).unwrap_or_default(),
        is_own_product: product.map_or(false, |p| p.is_own_product),
        face_count: placement.face_count,
        span_rows: placement.span_rows,
        span_columns: placement.span_columns,
        row: placement.row,
        column: placement.column,
        is_origin: placement.is_origin(pos),
        force_override: placement.force_override,
    }
}
