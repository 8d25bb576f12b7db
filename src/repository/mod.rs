// ==========================================
// 货架陈列系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// 约束: 多行写入使用事务
// ==========================================

pub mod action_log_repo;
pub mod error;
pub mod placement_repo;
pub mod product_repo;
pub mod shelf_repo;

// 重导出核心仓储
pub use action_log_repo::ActionLogRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use placement_repo::PlacementRepository;
pub use product_repo::ProductRepository;
pub use shelf_repo::ShelfRepository;
