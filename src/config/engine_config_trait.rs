// ==========================================
// 货架陈列系统 - 引擎配置读取 Trait
// ==========================================
// 职责: 定义引擎所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::engine::suggestion::SuggestionWeights;
use async_trait::async_trait;
use std::error::Error;

// ==========================================
// EngineConfigReader Trait
// ==========================================
// 用途: 缓存与陈列位推荐所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait EngineConfigReader: Send + Sync {
    /// 获取缓存 TTL（秒）
    ///
    /// # 默认值
    /// - 3600
    async fn get_cache_ttl_secs(&self) -> Result<u64, Box<dyn Error>>;

    /// 获取陈列位推荐权重
    ///
    /// # 默认值
    /// - top_n=5, base_score=100, eye_level_weight=10, edge_bonus=5, same_maker_bonus=8
    async fn get_suggestion_weights(&self) -> Result<SuggestionWeights, Box<dyn Error>>;
}
