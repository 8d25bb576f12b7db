// ==========================================
// 货架陈列系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口，供宿主应用调用
// ==========================================

pub mod error;
pub mod import_api;
pub mod planogram_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use import_api::ImportApi;
pub use planogram_api::{PlacementRequest, PlanogramApi};
