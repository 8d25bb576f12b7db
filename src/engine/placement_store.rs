// ==========================================
// 货架陈列系统 - 陈列位存储（写路径）
// ==========================================
// 职责: 陈列/撤下/修改排面数/删除货架，维护占用索引，触发缓存失效
// 并发: 每个货架一把锁，锁内持有该货架的占用索引（首次访问时从存储加载）
//       同一货架的写操作串行；不同货架互不阻塞（仅存储调用期间共享连接）
// 红线: 校验与提交在同一把货架锁内完成，两个重叠的并发陈列只有一个成功
// 红线: 存储提交成功后才更新内存索引；失败时内存与存储均保持原状
// 红线: 每个写操作返回前同步失效该货架缓存，并写入操作日志
// ==========================================

use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::placement::Placement;
use crate::domain::product::Product;
use crate::domain::shelf::Shelf;
use crate::domain::types::{CellRect, MakerId, PlacementId, ProductId, ShelfId};
use crate::engine::error::{PlacementError, PlacementResult};
use crate::engine::geometry::{required_span, SpanRequirement};
use crate::engine::grid::{self, ShelfGrid};
use crate::engine::occupancy::OccupancyIndex;
use crate::engine::shelf_cache::ShelfCache;
use crate::engine::statistics::{self, ShelfStatistics};
use crate::engine::suggestion::{PlacementSuggester, PlacementSuggestion, SuggestionWeights};
use crate::engine::validator;
use crate::perf::PerfGuard;
use crate::repository::{
    ActionLogRepository, PlacementRepository, ProductRepository, RepositoryError,
    ShelfRepository,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, instrument, warn};

// ==========================================
// PlaceCommand - 陈列请求
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceCommand {
    pub shelf_id: ShelfId,
    pub product_id: ProductId,
    pub row: u32,
    pub column: u32,
    /// 排面数（≥1，且在商品允许范围内）
    pub face_count: i64,
    pub actor: String,
}

impl PlaceCommand {
    pub fn new(shelf_id: ShelfId, product_id: ProductId, row: u32, column: u32) -> Self {
        Self {
            shelf_id,
            product_id,
            row,
            column,
            face_count: 1,
            actor: "system".to_string(),
        }
    }

    pub fn faces(mut self, face_count: i64) -> Self {
        self.face_count = face_count;
        self
    }

    pub fn by(mut self, actor: &str) -> Self {
        self.actor = actor.to_string();
        self
    }
}

/// 已加载的货架状态（货架锁保护）
struct ShelfSlot {
    shelf: Shelf,
    index: OccupancyIndex,
}

type ShelfLock = Arc<Mutex<Option<ShelfSlot>>>;

/// 读路径快照：同一把锁内取得，保证陈列位与占用索引一致
struct ShelfSnapshot {
    shelf: Shelf,
    index: OccupancyIndex,
    placements: Vec<Placement>,
}

// ==========================================
// PlacementStore
// ==========================================
pub struct PlacementStore {
    shelf_repo: Arc<ShelfRepository>,
    product_repo: Arc<ProductRepository>,
    placement_repo: Arc<PlacementRepository>,
    action_log_repo: Arc<ActionLogRepository>,
    cache: Arc<ShelfCache>,
    locks: Mutex<HashMap<ShelfId, ShelfLock>>,
}

impl PlacementStore {
    pub fn new(
        shelf_repo: Arc<ShelfRepository>,
        product_repo: Arc<ProductRepository>,
        placement_repo: Arc<PlacementRepository>,
        action_log_repo: Arc<ActionLogRepository>,
        cache: Arc<ShelfCache>,
    ) -> Self {
        Self {
            shelf_repo,
            product_repo,
            placement_repo,
            action_log_repo,
            cache,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn cache(&self) -> &Arc<ShelfCache> {
        &self.cache
    }

    // ==========================================
    // 写操作
    // ==========================================

    /// 陈列商品（校验越界与重叠）
    ///
    /// # 返回
    /// - Ok(Placement): 已提交的陈列位
    /// - Err(NotFound | InvalidFaceCount | OutOfBounds | Overlap | Storage)
    #[instrument(skip(self), fields(shelf_id = cmd.shelf_id, product_id = cmd.product_id))]
    pub fn place(&self, cmd: &PlaceCommand) -> PlacementResult<Placement> {
        let product = self.load_product(cmd.product_id)?;
        let face_count = validate_face_count(&product, cmd.face_count)?;

        self.with_shelf(cmd.shelf_id, |slot| {
            let span = match validator::check_placement(
                &slot.shelf,
                &slot.index,
                &product,
                cmd.row,
                cmd.column,
                face_count,
                None,
            ) {
                Ok(span) => span,
                Err(e) => {
                    warn!(row = cmd.row, column = cmd.column, error = %e, "陈列被拒绝");
                    return Err(e);
                }
            };

            let mut placement = new_placement(cmd, face_count, span, false);
            let rect = placement.rect();
            placement.placement_id = self
                .placement_repo
                .insert_with_cells(&placement, &rect.cells().collect::<Vec<_>>())?;

            let overlapped = slot.index.insert_unchecked(placement.placement_id, rect);
            debug_assert!(overlapped.is_empty());

            self.cache.invalidate(cmd.shelf_id);
            self.audit(
                ActionLog::new(
                    cmd.shelf_id,
                    Some(placement.placement_id),
                    ActionType::PlaceProduct,
                    &cmd.actor,
                )
                .with_payload(placement_payload(&placement)),
            );

            info!(
                placement_id = placement.placement_id,
                rect = %rect,
                face_count,
                "陈列已提交"
            );
            Ok(placement)
        })
    }

    /// 强制陈列（跳过越界/重叠校验）
    ///
    /// 原点仍须位于网格内；超出网格的部分不写入占用记录。
    /// 与既有陈列重叠的单元保持原所属，结果以 force_override=true 持久化。
    #[instrument(skip(self), fields(shelf_id = cmd.shelf_id, product_id = cmd.product_id))]
    pub fn place_unchecked(&self, cmd: &PlaceCommand) -> PlacementResult<Placement> {
        let product = self.load_product(cmd.product_id)?;
        let face_count = validate_face_count(&product, cmd.face_count)?;

        self.with_shelf(cmd.shelf_id, |slot| {
            validator::check_origin(&slot.shelf, cmd.row, cmd.column)?;

            let span = required_span(&product, &slot.shelf, face_count);
            let mut placement = new_placement(cmd, face_count, span, true);
            let rect = placement.rect();

            let conflicting = slot.index.conflicts(rect, None);
            let out_of_bounds = !rect.fits_within(slot.shelf.rows, slot.shelf.columns);
            let free_cells: Vec<_> = rect
                .cells_within(slot.shelf.rows, slot.shelf.columns)
                .into_iter()
                .filter(|pos| slot.index.is_free(*pos))
                .collect();

            placement.placement_id = self.placement_repo.insert_with_cells(&placement, &free_cells)?;
            slot.index.insert_unchecked(placement.placement_id, rect);

            self.cache.invalidate(cmd.shelf_id);
            self.audit(
                ActionLog::new(
                    cmd.shelf_id,
                    Some(placement.placement_id),
                    ActionType::ForcePlace,
                    &cmd.actor,
                )
                .with_payload(json!({
                    "placement": placement_payload(&placement),
                    "conflicting": conflicting,
                    "out_of_bounds": out_of_bounds,
                })),
            );

            warn!(
                placement_id = placement.placement_id,
                rect = %rect,
                conflicting = ?conflicting,
                out_of_bounds,
                actor = %cmd.actor,
                "强制陈列已提交（跳过冲突校验）"
            );
            Ok(placement)
        })
    }

    /// 撤下陈列位（陈列位与全部占用记录原子删除）
    #[instrument(skip(self))]
    pub fn remove(&self, placement_id: PlacementId, actor: &str) -> PlacementResult<()> {
        let shelf_id = self.load_placement(placement_id)?.shelf_id;

        self.with_shelf(shelf_id, |slot| {
            let mut after = slot.index.clone();
            let rect = after
                .remove(placement_id)
                .ok_or_else(|| PlacementError::not_found("shelf_placement", placement_id))?;
            let diff = slot.index.diff(&after);

            let rows = self.placement_repo.delete(shelf_id, placement_id, &diff)?;
            if rows == 0 {
                return Err(PlacementError::not_found("shelf_placement", placement_id));
            }
            slot.index = after;

            self.cache.invalidate(shelf_id);
            self.audit(
                ActionLog::new(shelf_id, Some(placement_id), ActionType::RemovePlacement, actor)
                    .with_payload(json!({ "rect": rect_payload(rect) })),
            );

            info!(placement_id, rect = %rect, "陈列位已撤下");
            Ok(())
        })
    }

    /// 修改排面数（重新计算跨度，排除自身后校验；失败时原跨度不变）
    #[instrument(skip(self))]
    pub fn update_face_count(
        &self,
        placement_id: PlacementId,
        face_count: i64,
        actor: &str,
    ) -> PlacementResult<Placement> {
        let current = self.load_placement(placement_id)?;
        let product = self.load_product(current.product_id)?;
        let face_count = validate_face_count(&product, face_count)?;

        self.with_shelf(current.shelf_id, |slot| {
            // 锁内重读，防止与并发修改交错
            let current = self.load_placement(placement_id)?;
            let span = validator::check_placement(
                &slot.shelf,
                &slot.index,
                &product,
                current.row,
                current.column,
                face_count,
                Some(placement_id),
            )
            .map_err(|e| {
                warn!(placement_id, face_count, error = %e, "排面数修改被拒绝");
                e
            })?;

            let mut updated = current.clone();
            updated.face_count = face_count;
            updated.span_rows = span.span_rows;
            updated.span_columns = span.span_columns;
            updated.display_width_ratio = span.fit_ratio_width;
            updated.display_height_ratio = span.fit_ratio_height;

            let mut after = slot.index.clone();
            after.remove(placement_id);
            after.insert_unchecked(placement_id, updated.rect());
            let diff = slot.index.diff(&after);

            self.placement_repo.update_geometry(&updated, &diff)?;
            slot.index = after;

            self.cache.invalidate(current.shelf_id);
            self.audit(
                ActionLog::new(
                    current.shelf_id,
                    Some(placement_id),
                    ActionType::UpdateFaceCount,
                    actor,
                )
                .with_payload(json!({
                    "from": { "face_count": current.face_count, "rect": rect_payload(current.rect()) },
                    "to": { "face_count": updated.face_count, "rect": rect_payload(updated.rect()) },
                })),
            );

            info!(
                placement_id,
                from = current.face_count,
                to = updated.face_count,
                rect = %updated.rect(),
                "排面数已修改"
            );
            Ok(updated)
        })
    }

    /// 删除货架（级联删除陈列位与占用记录）
    #[instrument(skip(self))]
    pub fn delete_shelf(&self, shelf_id: ShelfId, actor: &str) -> PlacementResult<()> {
        let lock = self.shelf_lock(shelf_id)?;
        let mut guard = lock_slot(&lock)?;

        let placement_count = self.placement_repo.count_by_shelf(shelf_id)?;
        let rows = self.shelf_repo.delete(shelf_id)?;
        if rows == 0 {
            return Err(PlacementError::not_found("shelf", shelf_id));
        }
        *guard = None;
        drop(guard);

        if let Ok(mut locks) = self.locks.lock() {
            locks.remove(&shelf_id);
        }

        self.cache.invalidate(shelf_id);
        self.audit(
            ActionLog::new(shelf_id, None, ActionType::DeleteShelf, actor)
                .with_payload(json!({ "placement_count": placement_count })),
        );

        info!(shelf_id, placement_count, "货架已删除");
        Ok(())
    }

    /// 丢弃已加载的占用索引，下次访问时从存储重建
    pub fn reload_shelf(&self, shelf_id: ShelfId) -> PlacementResult<()> {
        let lock = self.shelf_lock(shelf_id)?;
        let mut guard = lock_slot(&lock)?;
        *guard = None;
        self.cache.invalidate(shelf_id);
        Ok(())
    }

    // ==========================================
    // 读操作
    // ==========================================

    /// 陈列可行性（排面数不合法时为 false，与 place 的判定一致）
    pub fn can_place(
        &self,
        shelf_id: ShelfId,
        product_id: ProductId,
        row: u32,
        column: u32,
        face_count: i64,
    ) -> PlacementResult<bool> {
        let product = self.load_product(product_id)?;
        let face_count = match validate_face_count(&product, face_count) {
            Ok(n) => n,
            Err(_) => return Ok(false),
        };
        self.with_shelf(shelf_id, |slot| {
            Ok(validator::can_place(&slot.shelf, &slot.index, &product, row, column, face_count))
        })
    }

    /// 陈列校验（详细）
    pub fn check(
        &self,
        shelf_id: ShelfId,
        product_id: ProductId,
        row: u32,
        column: u32,
        face_count: i64,
    ) -> PlacementResult<SpanRequirement> {
        let product = self.load_product(product_id)?;
        let face_count = validate_face_count(&product, face_count)?;
        self.with_shelf(shelf_id, |slot| {
            validator::check_placement(&slot.shelf, &slot.index, &product, row, column, face_count, None)
        })
    }

    /// 网格视图（经缓存）
    pub fn get_grid(&self, shelf_id: ShelfId) -> PlacementResult<Arc<ShelfGrid>> {
        self.cache.get_grid(shelf_id, || {
            let _perf = PerfGuard::for_shelf("build_shelf_grid", shelf_id);
            let snapshot = self.snapshot(shelf_id)?;
            let products = self.products_of(&snapshot.placements)?;
            Ok(grid::build(
                &snapshot.shelf,
                &snapshot.index,
                snapshot
                    .placements
                    .iter()
                    .map(|p| (p, products.get(&p.product_id))),
            ))
        })
    }

    /// 货架统计（经缓存）
    pub fn get_stats(&self, shelf_id: ShelfId) -> PlacementResult<Arc<ShelfStatistics>> {
        self.cache.get_stats(shelf_id, || {
            let _perf = PerfGuard::for_shelf("build_shelf_stats", shelf_id);
            let snapshot = self.snapshot(shelf_id)?;
            let products = self.products_of(&snapshot.placements)?;
            let pairs = snapshot
                .placements
                .iter()
                .map(|p| {
                    products
                        .get(&p.product_id)
                        .map(|prod| (p, prod))
                        .ok_or_else(|| PlacementError::not_found("product", p.product_id))
                })
                .collect::<PlacementResult<Vec<_>>>()?;
            Ok(statistics::compute(&snapshot.shelf, pairs))
        })
    }

    /// 推荐陈列原点
    pub fn suggest(
        &self,
        shelf_id: ShelfId,
        product_id: ProductId,
        face_count: u32,
        weights: SuggestionWeights,
    ) -> PlacementResult<Vec<PlacementSuggestion>> {
        let product = self.load_product(product_id)?;
        let snapshot = self.snapshot(shelf_id)?;
        let products = self.products_of(&snapshot.placements)?;
        let makers: HashMap<PlacementId, MakerId> = snapshot
            .placements
            .iter()
            .filter_map(|p| products.get(&p.product_id).map(|prod| (p.placement_id, prod.maker_id)))
            .collect();

        Ok(PlacementSuggester::new(weights).suggest(
            &snapshot.shelf,
            &snapshot.index,
            &product,
            face_count,
            &makers,
        ))
    }

    pub fn shelf(&self, shelf_id: ShelfId) -> PlacementResult<Shelf> {
        self.with_shelf(shelf_id, |slot| Ok(slot.shelf.clone()))
    }

    pub fn placements(&self, shelf_id: ShelfId) -> PlacementResult<Vec<Placement>> {
        Ok(self.snapshot(shelf_id)?.placements)
    }

    pub fn placement(&self, placement_id: PlacementId) -> PlacementResult<Placement> {
        self.load_placement(placement_id)
    }

    /// 当前占用索引的副本
    pub fn occupancy(&self, shelf_id: ShelfId) -> PlacementResult<OccupancyIndex> {
        self.with_shelf(shelf_id, |slot| Ok(slot.index.clone()))
    }

    /// 校验内存占用索引与 placement_cell 记录一致
    pub fn verify_occupancy(&self, shelf_id: ShelfId) -> PlacementResult<bool> {
        self.with_shelf(shelf_id, |slot| {
            let stored = self.placement_repo.load_cells(shelf_id)?;
            Ok(stored == slot.index.owner_records())
        })
    }

    // ==========================================
    // 内部
    // ==========================================

    fn shelf_lock(&self, shelf_id: ShelfId) -> PlacementResult<ShelfLock> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        Ok(locks.entry(shelf_id).or_default().clone())
    }

    /// 在货架锁内执行；首次访问时加载货架与占用索引
    fn with_shelf<T, F>(&self, shelf_id: ShelfId, f: F) -> PlacementResult<T>
    where
        F: FnOnce(&mut ShelfSlot) -> PlacementResult<T>,
    {
        let lock = self.shelf_lock(shelf_id)?;
        let mut guard = lock_slot(&lock)?;

        if guard.is_none() {
            *guard = Some(self.load_slot(shelf_id)?);
        }
        match guard.as_mut() {
            Some(slot) => f(slot),
            None => Err(PlacementError::not_found("shelf", shelf_id)),
        }
    }

    fn load_slot(&self, shelf_id: ShelfId) -> PlacementResult<ShelfSlot> {
        let shelf = self
            .shelf_repo
            .find_by_id(shelf_id)?
            .ok_or_else(|| PlacementError::not_found("shelf", shelf_id))?;
        let placements = self.placement_repo.find_by_shelf(shelf_id)?;
        let index = OccupancyIndex::rebuild(shelf.rows, shelf.columns, &placements);

        if index.has_overlaps() {
            warn!(shelf_id, "占用索引包含强制陈列重叠");
        }
        tracing::debug!(shelf_id, placements = placements.len(), "占用索引已加载");
        Ok(ShelfSlot { shelf, index })
    }

    fn snapshot(&self, shelf_id: ShelfId) -> PlacementResult<ShelfSnapshot> {
        self.with_shelf(shelf_id, |slot| {
            Ok(ShelfSnapshot {
                shelf: slot.shelf.clone(),
                index: slot.index.clone(),
                placements: self.placement_repo.find_by_shelf(shelf_id)?,
            })
        })
    }

    fn products_of(&self, placements: &[Placement]) -> PlacementResult<HashMap<ProductId, Product>> {
        let mut ids: Vec<ProductId> = placements.iter().map(|p| p.product_id).collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(self.product_repo.find_by_ids(&ids)?)
    }

    fn load_product(&self, product_id: ProductId) -> PlacementResult<Product> {
        self.product_repo
            .find_by_id(product_id)?
            .ok_or_else(|| PlacementError::not_found("product", product_id))
    }

    fn load_placement(&self, placement_id: PlacementId) -> PlacementResult<Placement> {
        self.placement_repo
            .find_by_id(placement_id)?
            .ok_or_else(|| PlacementError::not_found("shelf_placement", placement_id))
    }

    /// 写入操作日志；变更已提交，日志失败只告警不回滚
    fn audit(&self, log: ActionLog) {
        if let Err(e) = self.action_log_repo.insert(&log) {
            warn!(
                action_type = %log.action_type,
                shelf_id = log.shelf_id,
                error = %e,
                "操作日志写入失败"
            );
        }
    }
}

fn lock_slot(lock: &ShelfLock) -> PlacementResult<MutexGuard<'_, Option<ShelfSlot>>> {
    lock.lock()
        .map_err(|e| PlacementError::Storage(RepositoryError::LockError(e.to_string())))
}

/// 排面数校验: ≥1 且在商品允许范围内
pub fn validate_face_count(product: &Product, face_count: i64) -> PlacementResult<u32> {
    let bounds = product.face_count_bounds;
    let invalid = || PlacementError::InvalidFaceCount {
        face_count,
        min: bounds.and_then(|b| b.min),
        max: bounds.and_then(|b| b.max),
    };

    if face_count < 1 {
        return Err(invalid());
    }
    let n = u32::try_from(face_count).map_err(|_| invalid())?;
    if !product.allows_face_count(n) {
        return Err(invalid());
    }
    Ok(n)
}

fn new_placement(cmd: &PlaceCommand, face_count: u32, span: SpanRequirement, forced: bool) -> Placement {
    Placement {
        placement_id: 0,
        shelf_id: cmd.shelf_id,
        product_id: cmd.product_id,
        row: cmd.row,
        column: cmd.column,
        face_count,
        span_rows: span.span_rows,
        span_columns: span.span_columns,
        display_width_ratio: span.fit_ratio_width,
        display_height_ratio: span.fit_ratio_height,
        force_override: forced,
        created_at: chrono::Local::now().naive_local(),
        created_by: Some(cmd.actor.clone()),
    }
}

fn rect_payload(rect: CellRect) -> serde_json::Value {
    json!({
        "row": rect.row,
        "column": rect.column,
        "span_rows": rect.span_rows,
        "span_columns": rect.span_columns,
    })
}

fn placement_payload(p: &Placement) -> serde_json::Value {
    json!({
        "product_id": p.product_id,
        "face_count": p.face_count,
        "rect": rect_payload(p.rect()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::product::FaceCountBounds;

    #[test]
    fn test_validate_face_count() {
        let mut product = Product::new("A", "A", 1);
        assert_eq!(validate_face_count(&product, 1).unwrap(), 1);
        assert!(matches!(
            validate_face_count(&product, 0),
            Err(PlacementError::InvalidFaceCount { face_count: 0, .. })
        ));
        assert!(validate_face_count(&product, -3).is_err());

        product.face_count_bounds = Some(FaceCountBounds {
            min: Some(2),
            max: Some(4),
        });
        assert!(validate_face_count(&product, 1).is_err());
        assert_eq!(validate_face_count(&product, 4).unwrap(), 4);
        match validate_face_count(&product, 5) {
            Err(PlacementError::InvalidFaceCount { min, max, .. }) => {
                assert_eq!((min, max), (Some(2), Some(4)));
            }
            other => panic!("Expected InvalidFaceCount, got {:?}", other),
        }
    }

    #[test]
    fn test_place_command_builder() {
        let cmd = PlaceCommand::new(1, 2, 3, 4).faces(2).by("alice");
        assert_eq!(cmd.face_count, 2);
        assert_eq!(cmd.actor, "alice");
    }
}
