// ==========================================
// 货架陈列系统 - 商品领域模型
// ==========================================
// 职责: 引擎所需的商品视图（尺寸、自社/竞品标记、排面数范围）
// 说明: 主数据维护不在本引擎范围内，这里只定义读取形态
// ==========================================

use crate::domain::types::{MakerId, ProductId};
use serde::{Deserialize, Serialize};

// ==========================================
// Maker - 厂商
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Maker {
    pub maker_id: MakerId,
    pub name: String,
}

// ==========================================
// FaceCountBounds - 排面数范围
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceCountBounds {
    pub min: Option<u32>,
    pub max: Option<u32>,
}

impl FaceCountBounds {
    pub fn contains(&self, face_count: u32) -> bool {
        self.min.map_or(true, |m| face_count >= m) && self.max.map_or(true, |m| face_count <= m)
    }
}

// ==========================================
// Product - 商品
// ==========================================
// 对齐: product 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub product_id: ProductId,
    pub product_name: String,
    pub product_code: String, // JAN码
    pub maker_id: MakerId,
    pub maker_name: String,

    // ===== 物理尺寸 (cm, 可缺失) =====
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub depth: Option<f64>,

    pub is_own_product: bool, // 自社商品
    pub face_count_bounds: Option<FaceCountBounds>,
    pub is_active: bool,
}

impl Product {
    /// 创建商品（未持久化，product_id=0）
    pub fn new(product_name: &str, product_code: &str, maker_id: MakerId) -> Self {
        Self {
            product_id: 0,
            product_name: product_name.to_string(),
            product_code: product_code.to_string(),
            maker_id,
            maker_name: String::new(),
            width: None,
            height: None,
            depth: None,
            is_own_product: false,
            face_count_bounds: None,
            is_active: true,
        }
    }

    pub fn with_size(mut self, width: Option<f64>, height: Option<f64>, depth: Option<f64>) -> Self {
        self.width = width;
        self.height = height;
        self.depth = depth;
        self
    }

    pub fn own(mut self, is_own_product: bool) -> Self {
        self.is_own_product = is_own_product;
        self
    }

    /// 宽、高均已知（尺寸感知计算的前提）
    pub fn has_front_size(&self) -> bool {
        matches!((self.width, self.height), (Some(w), Some(h)) if w > 0.0 && h > 0.0)
    }

    /// 排面数是否在商品允许范围内（未设置范围视为不限）
    pub fn allows_face_count(&self, face_count: u32) -> bool {
        self.face_count_bounds
            .map_or(true, |bounds| bounds.contains(face_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_front_size() {
        let p = Product::new("水", "4900000000001", 1);
        assert!(!p.has_front_size());
        let p = p.with_size(Some(8.0), None, None);
        assert!(!p.has_front_size());
        let p = p.with_size(Some(8.0), Some(12.0), None);
        assert!(p.has_front_size());
    }

    #[test]
    fn test_face_count_bounds() {
        let mut p = Product::new("茶", "4900000000002", 1);
        assert!(p.allows_face_count(99));

        p.face_count_bounds = Some(FaceCountBounds {
            min: Some(2),
            max: Some(4),
        });
        assert!(!p.allows_face_count(1));
        assert!(p.allows_face_count(2));
        assert!(p.allows_face_count(4));
        assert!(!p.allows_face_count(5));
    }
}
