// ==========================================
// 货架陈列系统 - 陈列位推荐（启发式）
// ==========================================
// 职责: 枚举可陈列原点并打分，返回前 N 个候选
// 说明: 启发式便利功能，不保证全局最优；正确性由校验器保证
// 打分:
// 1) 基础分
// 2) 自社商品：越接近中间段（视线高度）加分越高
// 3) 多单元商品：贴左/右边缘加分
// 4) 相邻单元存在同厂商商品加分
// 排序: 分数降序 → row 升序 → column 升序
// ==========================================

use crate::domain::product::Product;
use crate::domain::shelf::Shelf;
use crate::domain::types::{CellPos, CellRect, MakerId, PlacementId};
use crate::engine::geometry::{required_span, SpanRequirement};
use crate::engine::occupancy::OccupancyIndex;
use crate::engine::validator::check_rect;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

// ==========================================
// SuggestionWeights - 打分参数
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SuggestionWeights {
    pub top_n: usize,
    pub base_score: f64,
    pub eye_level_weight: f64,
    pub edge_bonus: f64,
    pub same_maker_bonus: f64,
}

impl Default for SuggestionWeights {
    fn default() -> Self {
        Self {
            top_n: 5,
            base_score: 100.0,
            eye_level_weight: 10.0,
            edge_bonus: 5.0,
            same_maker_bonus: 8.0,
        }
    }
}

// ==========================================
// PlacementSuggestion - 推荐结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementSuggestion {
    pub row: u32,
    pub column: u32,
    pub span: SpanRequirement,
    pub score: f64,
    pub eye_level_bonus: f64,
    pub edge_bonus: f64,
    pub same_maker_bonus: f64,
}

// ==========================================
// PlacementSuggester - 推荐引擎
// ==========================================
pub struct PlacementSuggester {
    weights: SuggestionWeights,
}

impl PlacementSuggester {
    pub fn new(weights: SuggestionWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &SuggestionWeights {
        &self.weights
    }

    /// 推荐陈列原点
    ///
    /// # 参数
    /// - `makers`: 货架上现有陈列位 → 厂商ID（同厂商相邻判定用）
    ///
    /// # 返回
    /// 至多 top_n 个候选（按分数降序）；无可陈列位置时为空
    pub fn suggest(
        &self,
        shelf: &Shelf,
        index: &OccupancyIndex,
        product: &Product,
        face_count: u32,
        makers: &HashMap<PlacementId, MakerId>,
    ) -> Vec<PlacementSuggestion> {
        let span = required_span(product, shelf, face_count);
        let mut candidates = Vec::new();

        for row in 0..shelf.rows {
            for column in 0..shelf.columns {
                let rect = CellRect::new(row, column, span.span_rows, span.span_columns);
                if check_rect(shelf, index, rect, None).is_err() {
                    continue;
                }
                candidates.push(self.score(shelf, index, product, rect, span, makers));
            }
        }

        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then(a.row.cmp(&b.row))
                .then(a.column.cmp(&b.column))
        });
        candidates.truncate(self.weights.top_n);
        candidates
    }

    fn score(
        &self,
        shelf: &Shelf,
        index: &OccupancyIndex,
        product: &Product,
        rect: CellRect,
        span: SpanRequirement,
        makers: &HashMap<PlacementId, MakerId>,
    ) -> PlacementSuggestion {
        let eye_level_bonus = if product.is_own_product {
            let center = rect.row as f64 + (rect.span_rows as f64 - 1.0) / 2.0;
            let distance = (center - shelf.middle_row()).abs();
            self.weights.eye_level_weight / (1.0 + distance)
        } else {
            0.0
        };

        let touches_edge = rect.column == 0 || rect.column_end() == shelf.columns;
        let edge_bonus = if rect.area() > 1 && touches_edge {
            self.weights.edge_bonus
        } else {
            0.0
        };

        let same_maker_bonus = if has_same_maker_neighbour(index, rect, product.maker_id, makers) {
            self.weights.same_maker_bonus
        } else {
            0.0
        };

        PlacementSuggestion {
            row: rect.row,
            column: rect.column,
            span,
            score: self.weights.base_score + eye_level_bonus + edge_bonus + same_maker_bonus,
            eye_level_bonus,
            edge_bonus,
            same_maker_bonus,
        }
    }
}

impl Default for PlacementSuggester {
    fn default() -> Self {
        Self::new(SuggestionWeights::default())
    }
}

/// 矩形四邻接单元中是否存在同厂商陈列
fn has_same_maker_neighbour(
    index: &OccupancyIndex,
    rect: CellRect,
    maker_id: MakerId,
    makers: &HashMap<PlacementId, MakerId>,
) -> bool {
    neighbour_cells(rect, index.rows(), index.columns())
        .into_iter()
        .filter_map(|pos| index.owner_at(pos))
        .any(|id| makers.get(&id) == Some(&maker_id))
}

/// 矩形外侧紧邻的单元（四邻接，限定在网格内）
fn neighbour_cells(rect: CellRect, rows: u32, columns: u32) -> Vec<CellPos> {
    let mut cells = Vec::new();
    for column in rect.column..rect.column_end() {
        if rect.row > 0 {
            cells.push(CellPos::new(rect.row - 1, column));
        }
        if rect.row_end() < rows {
            cells.push(CellPos::new(rect.row_end(), column));
        }
    }
    for row in rect.row..rect.row_end() {
        if rect.column > 0 {
            cells.push(CellPos::new(row, rect.column - 1));
        }
        if rect.column_end() < columns {
            cells.push(CellPos::new(row, rect.column_end()));
        }
    }
    cells
}
