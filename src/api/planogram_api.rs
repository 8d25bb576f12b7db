// ==========================================
// 货架陈列系统 - 陈列 API
// ==========================================
// 职责: 货架/商品主数据维护、陈列写入、网格与统计查询、陈列位推荐
// 红线: 强制陈列只能通过 force=true 显式请求
// 红线: 所有写入记录操作人（ActionLog 由 PlacementStore 写入）
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::action_log::ActionLog;
use crate::domain::placement::Placement;
use crate::domain::product::Product;
use crate::domain::shelf::Shelf;
use crate::domain::types::{MakerId, PlacementId, ProductId, ShelfId};
use crate::engine::geometry::{shelf_compatibility, ShelfCompatibility};
use crate::engine::grid::ShelfGrid;
use crate::engine::placement_store::{PlaceCommand, PlacementStore};
use crate::engine::statistics::ShelfStatistics;
use crate::engine::suggestion::{PlacementSuggestion, SuggestionWeights};
use crate::repository::{ActionLogRepository, ProductRepository, ShelfRepository};

/// 操作日志默认返回条数
pub const DEFAULT_ACTION_LOG_LIMIT: usize = 100;

// ==========================================
// PlacementRequest - 陈列请求
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementRequest {
    pub shelf_id: ShelfId,
    pub product_id: ProductId,
    pub row: u32,
    pub column: u32,
    #[serde(default = "default_face_count")]
    pub face_count: i64,
    /// 强制陈列（跳过越界/重叠校验）
    #[serde(default)]
    pub force: bool,
}

fn default_face_count() -> i64 {
    1
}

impl PlacementRequest {
    fn to_command(&self, operator: &str) -> PlaceCommand {
        PlaceCommand::new(self.shelf_id, self.product_id, self.row, self.column)
            .faces(self.face_count)
            .by(operator)
    }
}

// ==========================================
// PlanogramApi - 陈列 API
// ==========================================

/// 陈列API
///
/// 职责：
/// 1. 货架/厂商/商品主数据录入与查询
/// 2. 陈列、撤下、修改排面数、删除货架
/// 3. 网格视图、统计、推荐、适配性查询
/// 4. 操作日志查询
pub struct PlanogramApi {
    store: Arc<PlacementStore>,
    shelf_repo: Arc<ShelfRepository>,
    product_repo: Arc<ProductRepository>,
    action_log_repo: Arc<ActionLogRepository>,
    suggestion_weights: SuggestionWeights,
}

impl PlanogramApi {
    /// 创建新的PlanogramApi实例
    pub fn new(
        store: Arc<PlacementStore>,
        shelf_repo: Arc<ShelfRepository>,
        product_repo: Arc<ProductRepository>,
        action_log_repo: Arc<ActionLogRepository>,
        suggestion_weights: SuggestionWeights,
    ) -> Self {
        Self {
            store,
            shelf_repo,
            product_repo,
            action_log_repo,
            suggestion_weights,
        }
    }

    // ==========================================
    // 主数据
    // ==========================================

    /// 创建货架（校验尺寸与网格划分）
    #[instrument(skip(self, shelf), fields(name = %shelf.name))]
    pub fn create_shelf(&self, mut shelf: Shelf, operator: &str) -> ApiResult<Shelf> {
        validate_operator(operator)?;
        if shelf.name.trim().is_empty() {
            return Err(ApiError::InvalidInput("货架名称不能为空".to_string()));
        }
        shelf.validate()?;

        shelf.created_by = Some(operator.to_string());
        shelf.shelf_id = self.shelf_repo.insert(&shelf)?;

        info!(shelf_id = shelf.shelf_id, rows = shelf.rows, columns = shelf.columns, "货架已创建");
        Ok(shelf)
    }

    pub fn get_shelf(&self, shelf_id: ShelfId) -> ApiResult<Shelf> {
        Ok(self.store.shelf(shelf_id)?)
    }

    pub fn list_shelves(&self) -> ApiResult<Vec<Shelf>> {
        Ok(self.shelf_repo.list_all()?)
    }

    /// 启用中的商品（含厂商名）
    pub fn list_products(&self) -> ApiResult<Vec<Product>> {
        Ok(self.product_repo.list_active()?)
    }

    /// 登记厂商（同名返回既有ID）
    pub fn create_maker(&self, name: &str) -> ApiResult<MakerId> {
        if name.trim().is_empty() {
            return Err(ApiError::InvalidInput("厂商名称不能为空".to_string()));
        }
        Ok(self.product_repo.upsert_maker(name.trim())?)
    }

    /// 登记商品
    pub fn create_product(&self, mut product: Product) -> ApiResult<Product> {
        if product.product_name.trim().is_empty() {
            return Err(ApiError::InvalidInput("商品名称不能为空".to_string()));
        }
        if product.product_code.trim().is_empty() {
            return Err(ApiError::InvalidInput("商品编码不能为空".to_string()));
        }
        for (field, value) in [
            ("width", product.width),
            ("height", product.height),
            ("depth", product.depth),
        ] {
            if let Some(v) = value {
                if !(v > 0.0) || !v.is_finite() {
                    return Err(ApiError::InvalidInput(format!("商品尺寸必须为正数: {}={}", field, v)));
                }
            }
        }
        if let Some(bounds) = product.face_count_bounds {
            if let (Some(min), Some(max)) = (bounds.min, bounds.max) {
                if min > max {
                    return Err(ApiError::InvalidInput(format!(
                        "排面数范围无效: min={} > max={}",
                        min, max
                    )));
                }
            }
        }

        product.product_id = self.product_repo.insert(&product)?;
        Ok(self
            .product_repo
            .find_by_id(product.product_id)?
            .unwrap_or(product))
    }

    pub fn get_product(&self, product_id: ProductId) -> ApiResult<Product> {
        self.product_repo
            .find_by_id(product_id)?
            .ok_or_else(|| ApiError::NotFound(format!("product(id={})不存在", product_id)))
    }

    // ==========================================
    // 陈列写入
    // ==========================================

    /// 陈列商品（force=true 时跳过越界/重叠校验）
    pub fn place(&self, request: &PlacementRequest, operator: &str) -> ApiResult<Placement> {
        validate_operator(operator)?;
        let cmd = request.to_command(operator);

        let placement = if request.force {
            self.store.place_unchecked(&cmd)?
        } else {
            self.store.place(&cmd)?
        };
        Ok(placement)
    }

    /// 撤下陈列位
    pub fn remove_placement(&self, placement_id: PlacementId, operator: &str) -> ApiResult<()> {
        validate_operator(operator)?;
        Ok(self.store.remove(placement_id, operator)?)
    }

    /// 修改排面数
    pub fn update_face_count(
        &self,
        placement_id: PlacementId,
        face_count: i64,
        operator: &str,
    ) -> ApiResult<Placement> {
        validate_operator(operator)?;
        Ok(self.store.update_face_count(placement_id, face_count, operator)?)
    }

    /// 删除货架（级联删除全部陈列位）
    pub fn delete_shelf(&self, shelf_id: ShelfId, operator: &str) -> ApiResult<()> {
        validate_operator(operator)?;
        Ok(self.store.delete_shelf(shelf_id, operator)?)
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 陈列可行性（排面数无效时返回 false）
    pub fn can_place(
        &self,
        shelf_id: ShelfId,
        product_id: ProductId,
        row: u32,
        column: u32,
        face_count: i64,
    ) -> ApiResult<bool> {
        Ok(self.store.can_place(shelf_id, product_id, row, column, face_count)?)
    }

    pub fn list_placements(&self, shelf_id: ShelfId) -> ApiResult<Vec<Placement>> {
        Ok(self.store.placements(shelf_id)?)
    }

    pub fn get_placement(&self, placement_id: PlacementId) -> ApiResult<Placement> {
        Ok(self.store.placement(placement_id)?)
    }

    pub fn get_grid(&self, shelf_id: ShelfId) -> ApiResult<Arc<ShelfGrid>> {
        Ok(self.store.get_grid(shelf_id)?)
    }

    pub fn get_stats(&self, shelf_id: ShelfId) -> ApiResult<Arc<ShelfStatistics>> {
        Ok(self.store.get_stats(shelf_id)?)
    }

    /// 推荐陈列原点（按配置权重）
    pub fn suggest(
        &self,
        shelf_id: ShelfId,
        product_id: ProductId,
        face_count: u32,
    ) -> ApiResult<Vec<PlacementSuggestion>> {
        if face_count == 0 {
            return Err(ApiError::InvalidInput("排面数必须≥1".to_string()));
        }
        Ok(self
            .store
            .suggest(shelf_id, product_id, face_count, self.suggestion_weights)?)
    }

    /// 商品与货架适配性
    pub fn shelf_compatibility(
        &self,
        shelf_id: ShelfId,
        product_id: ProductId,
    ) -> ApiResult<ShelfCompatibility> {
        let shelf = self.store.shelf(shelf_id)?;
        let product = self.get_product(product_id)?;
        Ok(shelf_compatibility(&product, &shelf))
    }

    /// 货架操作日志（最新在前）
    pub fn list_action_logs(&self, shelf_id: ShelfId, limit: Option<usize>) -> ApiResult<Vec<ActionLog>> {
        let limit = limit.unwrap_or(DEFAULT_ACTION_LOG_LIMIT);
        Ok(self.action_log_repo.find_by_shelf(shelf_id, limit)?)
    }
}

fn validate_operator(operator: &str) -> ApiResult<()> {
    if operator.trim().is_empty() {
        return Err(ApiError::InvalidInput("操作人不能为空".to_string()));
    }
    Ok(())
}
