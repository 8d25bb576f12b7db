// ==========================================
// 货架陈列系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 货架陈列位几何计算与冲突检测引擎
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 跨度计算 / 陈列校验 / 占用索引 / 统计 / 缓存
pub mod engine;

// 导入层 - 批量陈列请求
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/表结构）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// 性能埋点
pub mod perf;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{CellPos, CellRect, MakerId, PlacementId, ProductId, ShelfId, SizeBucket};

// 领域实体
pub use domain::{ActionLog, ActionType, Placement, Product, Shelf};

// 引擎
pub use engine::{
    PlaceCommand, PlacementError, PlacementErrorKind, PlacementResult, PlacementStore,
    ShelfCache, ShelfGrid, ShelfStatistics,
};

// API
pub use api::{ImportApi, PlanogramApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "货架陈列系统";
