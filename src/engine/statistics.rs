// ==========================================
// 货架陈列系统 - 陈列统计
// ==========================================
// 职责: 由当前陈列位集合派生占用率、自社/竞品排面占比、面积利用率、尺寸分布
// 口径: occupied_cells = Σ span_rows × span_columns（按矩形计，不按原点计）
// 口径: 所有百分比保留 1 位小数，四舍五入（half-up）
// 纯函数，无状态
// ==========================================

use crate::domain::placement::Placement;
use crate::domain::product::Product;
use crate::domain::shelf::Shelf;
use crate::domain::types::{ShelfId, SizeBucket};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// SizeDistribution - 尺寸分布
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeDistribution {
    pub small: u32,
    pub medium: u32,
    pub large: u32,
}

impl SizeDistribution {
    fn add(&mut self, bucket: SizeBucket) {
        match bucket {
            SizeBucket::Small => self.small += 1,
            SizeBucket::Medium => self.medium += 1,
            SizeBucket::Large => self.large += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.small + self.medium + self.large
    }
}

// ==========================================
// ShelfStatistics - 货架统计
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShelfStatistics {
    pub shelf_id: ShelfId,
    pub total_cells: u32,
    pub occupied_cells: u32,
    /// 占用率 (%)
    pub occupancy_rate: f64,

    pub own_products_count: u32,
    pub competitor_products_count: u32,
    pub own_faces: u32,
    pub competitor_faces: u32,
    /// 自社排面占比 (%)
    pub own_share: f64,

    /// 面积利用率 (%)，仅统计宽高已知的商品
    pub area_utilization: f64,

    pub size_distribution: SizeDistribution,

    /// 强制陈列数（不可信数据）
    pub forced_placements: u32,

    pub generated_at: NaiveDateTime,
}

/// 计算货架统计
pub fn compute<'a, I>(shelf: &Shelf, placements: I) -> ShelfStatistics
where
    I: IntoIterator<Item = (&'a Placement, &'a Product)>,
{
    let total_cells = shelf.total_cells();

    let mut occupied_cells = 0u32;
    let mut own_count = 0u32;
    let mut competitor_count = 0u32;
    let mut own_faces = 0u32;
    let mut competitor_faces = 0u32;
    let mut used_area = 0.0f64;
    let mut size_distribution = SizeDistribution::default();
    let mut forced = 0u32;

    for (placement, product) in placements {
        occupied_cells += placement.occupied_cell_count();

        if product.is_own_product {
            own_count += 1;
            own_faces += placement.face_count;
        } else {
            competitor_count += 1;
            competitor_faces += placement.face_count;
        }

        if let (Some(w), Some(h)) = (product.width, product.height) {
            used_area += w * h * placement.face_count as f64;
        }

        size_distribution.add(placement.size_bucket());

        if placement.force_override {
            forced += 1;
        }
    }

    let total_faces = own_faces + competitor_faces;
    let shelf_area = shelf.front_area();

    ShelfStatistics {
        shelf_id: shelf.shelf_id,
        total_cells,
        occupied_cells,
        occupancy_rate: percent(occupied_cells as f64, total_cells as f64),
        own_products_count: own_count,
        competitor_products_count: competitor_count,
        own_faces,
        competitor_faces,
        own_share: percent(own_faces as f64, total_faces as f64),
        area_utilization: percent(used_area, shelf_area),
        size_distribution,
        forced_placements: forced,
        generated_at: chrono::Local::now().naive_local(),
    }
}

/// 百分比（1 位小数），分母为 0 时返回 0
fn percent(numerator: f64, denominator: f64) -> f64 {
    if !(denominator > 0.0) {
        return 0.0;
    }
    round_half_up_1(numerator / denominator * 100.0)
}

/// 四舍五入到 1 位小数（half-up）
pub fn round_half_up_1(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let scaled = value * 10.0;
    let rounded = if scaled >= 0.0 {
        (scaled + 0.5 + 1e-9).floor()
    } else {
        -((-scaled) + 0.5 + 1e-9).floor()
    };
    rounded / 10.0
}
