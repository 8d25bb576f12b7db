// ==========================================
// 货架陈列系统 - 领域类型定义
// ==========================================
// 职责: 网格坐标、占用矩形、尺寸分档等基础值类型
// 约定: 行/列均为 0 起始，矩形为半开区间 [row, row+span_rows) × [column, column+span_columns)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 货架ID
pub type ShelfId = i64;

/// 商品ID
pub type ProductId = i64;

/// 厂商ID
pub type MakerId = i64;

/// 陈列位ID
pub type PlacementId = i64;

// ==========================================
// CellPos - 网格单元坐标
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellPos {
    pub row: u32,
    pub column: u32,
}

impl CellPos {
    pub fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }
}

impl fmt::Display for CellPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

// ==========================================
// CellRect - 占用矩形
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRect {
    pub row: u32,
    pub column: u32,
    pub span_rows: u32,
    pub span_columns: u32,
}

impl CellRect {
    pub fn new(row: u32, column: u32, span_rows: u32, span_columns: u32) -> Self {
        Self {
            row,
            column,
            span_rows,
            span_columns,
        }
    }

    /// 结束行（不含）
    pub fn row_end(&self) -> u32 {
        self.row.saturating_add(self.span_rows)
    }

    /// 结束列（不含）
    pub fn column_end(&self) -> u32 {
        self.column.saturating_add(self.span_columns)
    }

    /// 覆盖的单元数
    pub fn area(&self) -> u32 {
        self.span_rows * self.span_columns
    }

    /// 是否完全位于 rows × columns 网格内
    pub fn fits_within(&self, rows: u32, columns: u32) -> bool {
        self.row_end() <= rows && self.column_end() <= columns
    }

    pub fn contains(&self, pos: CellPos) -> bool {
        pos.row >= self.row
            && pos.row < self.row_end()
            && pos.column >= self.column
            && pos.column < self.column_end()
    }

    pub fn intersects(&self, other: &CellRect) -> bool {
        self.row < other.row_end()
            && other.row < self.row_end()
            && self.column < other.column_end()
            && other.column < self.column_end()
    }

    /// 行优先遍历矩形内全部单元
    pub fn cells(&self) -> impl Iterator<Item = CellPos> + '_ {
        (self.row..self.row_end())
            .flat_map(move |r| (self.column..self.column_end()).map(move |c| CellPos::new(r, c)))
    }

    /// 裁剪到 rows × columns 网格内的单元（强制陈列越界时使用）
    pub fn cells_within(&self, rows: u32, columns: u32) -> Vec<CellPos> {
        self.cells()
            .filter(|p| p.row < rows && p.column < columns)
            .collect()
    }

    /// 尺寸分档
    pub fn size_bucket(&self) -> SizeBucket {
        SizeBucket::classify(self.span_rows, self.span_columns)
    }
}

impl fmt::Display for CellRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}..{}) x [{}..{})",
            self.row,
            self.row_end(),
            self.column,
            self.column_end()
        )
    }
}

// ==========================================
// SizeBucket - 占用尺寸分档
// ==========================================
// small: 1×1
// medium: 行≤2 且 列≤2（不含 1×1）
// large: 其余
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeBucket {
    Small,
    Medium,
    Large,
}

impl SizeBucket {
    pub fn classify(span_rows: u32, span_columns: u32) -> Self {
        if span_rows == 1 && span_columns == 1 {
            SizeBucket::Small
        } else if span_rows <= 2 && span_columns <= 2 {
            SizeBucket::Medium
        } else {
            SizeBucket::Large
        }
    }
}

impl fmt::Display for SizeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeBucket::Small => write!(f, "small"),
            SizeBucket::Medium => write!(f, "medium"),
            SizeBucket::Large => write!(f, "large"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_cells_row_major() {
        let rect = CellRect::new(1, 2, 2, 2);
        let cells: Vec<CellPos> = rect.cells().collect();
        assert_eq!(
            cells,
            vec![
                CellPos::new(1, 2),
                CellPos::new(1, 3),
                CellPos::new(2, 2),
                CellPos::new(2, 3),
            ]
        );
        assert_eq!(rect.area(), 4);
    }

    #[test]
    fn test_rect_intersects() {
        let a = CellRect::new(0, 0, 2, 2);
        assert!(a.intersects(&CellRect::new(1, 1, 1, 1)));
        assert!(!a.intersects(&CellRect::new(0, 2, 1, 1)));
        assert!(!a.intersects(&CellRect::new(2, 0, 1, 3)));
    }

    #[test]
    fn test_rect_fits_and_clip() {
        let rect = CellRect::new(5, 7, 2, 3);
        assert!(!rect.fits_within(6, 8));
        assert_eq!(rect.cells_within(6, 8), vec![CellPos::new(5, 7)]);
    }

    #[test]
    fn test_size_bucket() {
        assert_eq!(SizeBucket::classify(1, 1), SizeBucket::Small);
        assert_eq!(SizeBucket::classify(1, 2), SizeBucket::Medium);
        assert_eq!(SizeBucket::classify(2, 2), SizeBucket::Medium);
        assert_eq!(SizeBucket::classify(3, 1), SizeBucket::Large);
        assert_eq!(SizeBucket::classify(1, 3), SizeBucket::Large);
    }
}
