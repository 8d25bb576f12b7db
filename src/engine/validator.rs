// ==========================================
// 货架陈列系统 - 陈列校验
// ==========================================
// 职责: 判断候选陈列（原点 + 跨度）是否可接受
// 规则: 1) 跨度由几何计算得出 2) 不得越界 3) 矩形内任一单元已占用即整体拒绝
// 说明: 强制陈列不在此处放宽，由 PlacementStore::place_unchecked 显式提供
// ==========================================

use crate::domain::product::Product;
use crate::domain::shelf::Shelf;
use crate::domain::types::{CellRect, PlacementId};
use crate::engine::error::{PlacementError, PlacementResult};
use crate::engine::geometry::{required_span, SpanRequirement};
use crate::engine::occupancy::OccupancyIndex;

/// 陈列可行性（布尔形式）
pub fn can_place(
    shelf: &Shelf,
    index: &OccupancyIndex,
    product: &Product,
    origin_row: u32,
    origin_column: u32,
    face_count: u32,
) -> bool {
    check_placement(shelf, index, product, origin_row, origin_column, face_count, None).is_ok()
}

/// 陈列校验（详细形式）
///
/// # 参数
/// - `ignore`: 校验时视为不存在的陈列位（修改排面数时传入自身）
///
/// # 返回
/// - Ok(SpanRequirement): 可陈列，附带派生跨度
/// - Err(OutOfBounds | Overlap)
pub fn check_placement(
    shelf: &Shelf,
    index: &OccupancyIndex,
    product: &Product,
    origin_row: u32,
    origin_column: u32,
    face_count: u32,
    ignore: Option<PlacementId>,
) -> PlacementResult<SpanRequirement> {
    let span = required_span(product, shelf, face_count);
    let rect = CellRect::new(origin_row, origin_column, span.span_rows, span.span_columns);
    check_rect(shelf, index, rect, ignore)?;
    Ok(span)
}

/// 矩形校验：先查越界，再查重叠
pub fn check_rect(
    shelf: &Shelf,
    index: &OccupancyIndex,
    rect: CellRect,
    ignore: Option<PlacementId>,
) -> PlacementResult<()> {
    check_bounds(shelf, rect)?;

    if !index.is_rect_free(rect, ignore) {
        return Err(PlacementError::Overlap {
            rect,
            conflicting: index.conflicts(rect, ignore),
        });
    }

    Ok(())
}

/// 越界校验
pub fn check_bounds(shelf: &Shelf, rect: CellRect) -> PlacementResult<()> {
    if rect.fits_within(shelf.rows, shelf.columns) {
        Ok(())
    } else {
        Err(PlacementError::OutOfBounds {
            rect,
            rows: shelf.rows,
            columns: shelf.columns,
        })
    }
}

/// 原点校验（强制陈列也必须落在网格内）
pub fn check_origin(shelf: &Shelf, origin_row: u32, origin_column: u32) -> PlacementResult<()> {
    check_bounds(shelf, CellRect::new(origin_row, origin_column, 1, 1))
}
