// ==========================================
// 货架陈列系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、值类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod action_log;
pub mod placement;
pub mod product;
pub mod shelf;
pub mod types;

// 重导出核心类型
pub use action_log::{ActionLog, ActionType};
pub use placement::{CellDiff, DisplayStyle, OccupancyRecord, Placement};
pub use product::{FaceCountBounds, Maker, Product};
pub use shelf::{Shelf, ShelfError, MAX_GRID_DIMENSION};
pub use types::{
    CellPos, CellRect, MakerId, PlacementId, ProductId, ShelfId, SizeBucket,
};
