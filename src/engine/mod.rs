// ==========================================
// 货架陈列系统 - 引擎层
// ==========================================
// 职责: 跨度计算、陈列校验、占用索引、统计、缓存、推荐
// 红线: Engine 不拼 SQL，数据访问经由 repository
// 红线: 占用判定只有整矩形一种语义（不存在仅判原点的路径）
// ==========================================

pub mod error;
pub mod geometry;
pub mod grid;
pub mod occupancy;
pub mod placement_store;
pub mod shelf_cache;
pub mod statistics;
pub mod suggestion;
pub mod validator;

// 重导出核心引擎
pub use error::{PlacementError, PlacementErrorKind, PlacementResult};
pub use geometry::{required_span, shelf_compatibility, ShelfCompatibility, SpanRequirement};
pub use grid::{GridCell, PlacementSummary, ShelfGrid, ShelfInfo};
pub use occupancy::OccupancyIndex;
pub use placement_store::{PlaceCommand, PlacementStore};
pub use shelf_cache::{ShelfCache, DEFAULT_CACHE_TTL_SECS};
pub use statistics::{ShelfStatistics, SizeDistribution};
pub use suggestion::{PlacementSuggester, PlacementSuggestion, SuggestionWeights};
pub use validator::can_place;
