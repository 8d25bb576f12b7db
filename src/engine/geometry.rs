// ==========================================
// 货架陈列系统 - 几何计算
// ==========================================
// 职责: 商品物理尺寸 + 排面数 -> 所需网格跨度
// 约定: 排面只沿水平方向展开（排面数只乘宽度，不乘高度/进深）
// 约定: 宽或高缺失时按 1×1 处理（兜底策略，不是错误）
// 纯函数，无状态
// ==========================================

use crate::domain::product::Product;
use crate::domain::shelf::Shelf;
use serde::{Deserialize, Serialize};

/// 浮点除法向上取整时的容差，避免 45.0/15.0 这类整除被误差抬高一格
const SPAN_EPSILON: f64 = 1e-9;

// ==========================================
// SpanRequirement - 跨度计算结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpanRequirement {
    pub span_rows: u32,
    pub span_columns: u32,
    /// 实际宽度 / 分配宽度，(0, 1]
    pub fit_ratio_width: f64,
    /// 实际高度 / 分配高度，(0, 1]
    pub fit_ratio_height: f64,
}

impl SpanRequirement {
    /// 尺寸缺失时的兜底跨度
    pub const UNIT: SpanRequirement = SpanRequirement {
        span_rows: 1,
        span_columns: 1,
        fit_ratio_width: 1.0,
        fit_ratio_height: 1.0,
    };

    pub fn required_cells(&self) -> u32 {
        self.span_rows * self.span_columns
    }
}

/// 计算商品在货架上所需的跨度
///
/// - span_columns = ceil(宽 × 排面数 / 单元宽)，裁剪到 [1, columns]
/// - span_rows = ceil(高 / 单元高)，裁剪到 [1, rows]
/// - fit_ratio = min(1, 实际尺寸 / 分配尺寸)
pub fn required_span(product: &Product, shelf: &Shelf, face_count: u32) -> SpanRequirement {
    let (width, height) = match (product.width, product.height) {
        (Some(w), Some(h)) if w > 0.0 && h > 0.0 => (w, h),
        _ => return SpanRequirement::UNIT,
    };

    let cell_width = shelf.calculated_cell_width();
    let cell_height = shelf.calculated_cell_height();
    let effective_width = width * face_count.max(1) as f64;

    let span_columns = ceil_cells(effective_width, cell_width).clamp(1, shelf.columns.max(1));
    let span_rows = ceil_cells(height, cell_height).clamp(1, shelf.rows.max(1));

    SpanRequirement {
        span_rows,
        span_columns,
        fit_ratio_width: fit_ratio(effective_width, span_columns, cell_width),
        fit_ratio_height: fit_ratio(height, span_rows, cell_height),
    }
}

fn ceil_cells(length: f64, cell: f64) -> u32 {
    if !(cell > 0.0) {
        return 1;
    }
    let cells = (length / cell - SPAN_EPSILON).ceil();
    if cells < 1.0 {
        1
    } else if cells >= u32::MAX as f64 {
        u32::MAX
    } else {
        cells as u32
    }
}

fn fit_ratio(length: f64, span: u32, cell: f64) -> f64 {
    let allotted = span as f64 * cell;
    if !(allotted > 0.0) {
        return 1.0;
    }
    (length / allotted).min(1.0)
}

// ==========================================
// ShelfCompatibility - 商品与货架适配性
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShelfCompatibility {
    /// 未裁剪跨度能否完整放入货架网格
    pub compatible: bool,
    /// 裁剪后所需单元数
    pub required_cells: u32,
    pub span: SpanRequirement,
    /// 未裁剪的行跨度
    pub natural_span_rows: u32,
    /// 未裁剪的列跨度
    pub natural_span_columns: u32,
}

/// 评估商品（单排面）在货架上的适配性
pub fn shelf_compatibility(product: &Product, shelf: &Shelf) -> ShelfCompatibility {
    let span = required_span(product, shelf, 1);

    let (natural_rows, natural_columns) = match (product.width, product.height) {
        (Some(w), Some(h)) if w > 0.0 && h > 0.0 => (
            ceil_cells(h, shelf.calculated_cell_height()),
            ceil_cells(w, shelf.calculated_cell_width()),
        ),
        _ => (1, 1),
    };

    ShelfCompatibility {
        compatible: natural_rows <= shelf.rows && natural_columns <= shelf.columns,
        required_cells: span.required_cells(),
        span,
        natural_span_rows: natural_rows,
        natural_span_columns: natural_columns,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shelf() -> Shelf {
        // 单元 15cm × 30cm
        Shelf::new("测试棚", 120.0, 180.0, 60.0, 6, 8)
    }

    fn product(width: Option<f64>, height: Option<f64>) -> Product {
        Product::new("p", "code", 1).with_size(width, height, None)
    }

    #[test]
    fn test_missing_size_falls_back_to_unit() {
        let s = shelf();
        for p in [
            product(None, None),
            product(Some(35.0), None),
            product(None, Some(45.0)),
        ] {
            for faces in [1, 3, 10] {
                assert_eq!(required_span(&p, &s, faces), SpanRequirement::UNIT);
            }
        }
    }

    #[test]
    fn test_small_product_single_cell() {
        let span = required_span(&product(Some(8.0), Some(12.0)), &shelf(), 1);
        assert_eq!((span.span_rows, span.span_columns), (1, 1));
        assert!((span.fit_ratio_width - 8.0 / 15.0).abs() < 1e-9);
        assert!((span.fit_ratio_height - 12.0 / 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_large_product_multi_cell() {
        let span = required_span(&product(Some(35.0), Some(45.0)), &shelf(), 1);
        assert_eq!((span.span_rows, span.span_columns), (2, 3));
        assert!((span.fit_ratio_width - 35.0 / 45.0).abs() < 1e-9);
        assert!((span.fit_ratio_height - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_faces_extend_width_only() {
        let p = product(Some(8.0), Some(12.0));
        let span = required_span(&p, &shelf(), 2);
        assert_eq!((span.span_rows, span.span_columns), (1, 2));
        let span = required_span(&p, &shelf(), 4);
        assert_eq!((span.span_rows, span.span_columns), (1, 3));
    }

    #[test]
    fn test_exact_multiple_does_not_round_up() {
        let span = required_span(&product(Some(15.0), Some(30.0)), &shelf(), 3);
        assert_eq!((span.span_rows, span.span_columns), (1, 3));
        assert_eq!(span.fit_ratio_width, 1.0);
        assert_eq!(span.fit_ratio_height, 1.0);
    }

    #[test]
    fn test_span_clamped_to_shelf() {
        let span = required_span(&product(Some(500.0), Some(900.0)), &shelf(), 1);
        assert_eq!((span.span_rows, span.span_columns), (6, 8));
        assert_eq!(span.fit_ratio_width, 1.0);
        assert_eq!(span.fit_ratio_height, 1.0);
    }

    #[test]
    fn test_explicit_cell_size() {
        let s = shelf().with_cell_size(Some(10.0), Some(10.0));
        let span = required_span(&product(Some(35.0), Some(45.0)), &s, 1);
        assert_eq!((span.span_rows, span.span_columns), (5, 4));
    }

    #[test]
    fn test_shelf_compatibility() {
        let s = shelf();
        let small = shelf_compatibility(&product(Some(8.0), Some(12.0)), &s);
        assert!(small.compatible);
        assert_eq!(small.required_cells, 1);

        let large = shelf_compatibility(&product(Some(35.0), Some(45.0)), &s);
        assert!(large.compatible);
        assert_eq!(large.required_cells, 6);

        let huge = shelf_compatibility(&product(Some(500.0), Some(45.0)), &s);
        assert!(!huge.compatible);
        assert_eq!(huge.natural_span_columns, 34);
        assert_eq!(huge.span.span_columns, 8);
    }
}
