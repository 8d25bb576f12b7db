// ==========================================
// 货架陈列系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::engine_config_trait::EngineConfigReader;
use crate::db::open_sqlite_connection;
use crate::engine::shelf_cache::DEFAULT_CACHE_TTL_SECS;
use crate::engine::suggestion::SuggestionWeights;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ==========================================
// EngineConfig - 引擎配置快照
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub cache_ttl_secs: u64,
    pub suggestion: SuggestionWeights,
}

impl EngineConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            suggestion: SuggestionWeights::default(),
        }
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now', 'localtime')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 读取数值配置；值无法解析或不满足约束时回退默认值
    fn get_number_or_default<T>(
        &self,
        key: &str,
        default: T,
        valid: impl Fn(&T) -> bool,
    ) -> Result<T, Box<dyn Error>>
    where
        T: std::str::FromStr + ToString + Copy,
    {
        let raw = self.get_config_or_default(key, &default.to_string())?;
        match raw.trim().parse::<T>() {
            Ok(v) if valid(&v) => Ok(v),
            _ => {
                tracing::warn!(key, value = %raw, "配置值无效，使用默认值");
                Ok(default)
            }
        }
    }

    /// 获取所有配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        // 查询所有global scope的配置
        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key",
        )?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        let json_value = json!(config_map);
        Ok(serde_json::to_string(&json_value)?)
    }

    /// 加载引擎配置快照
    pub async fn load_engine_config(&self) -> Result<EngineConfig, Box<dyn Error>> {
        Ok(EngineConfig {
            cache_ttl_secs: self.get_cache_ttl_secs().await?,
            suggestion: self.get_suggestion_weights().await?,
        })
    }
}

// ==========================================
// EngineConfigReader 实现
// ==========================================
#[async_trait]
impl EngineConfigReader for ConfigManager {
    async fn get_cache_ttl_secs(&self) -> Result<u64, Box<dyn Error>> {
        self.get_number_or_default(config_keys::CACHE_TTL_SECS, DEFAULT_CACHE_TTL_SECS, |v| *v > 0)
    }

    async fn get_suggestion_weights(&self) -> Result<SuggestionWeights, Box<dyn Error>> {
        let defaults = SuggestionWeights::default();
        let finite = |v: &f64| v.is_finite();

        Ok(SuggestionWeights {
            top_n: self.get_number_or_default(config_keys::SUGGESTION_TOP_N, defaults.top_n, |v| *v > 0)?,
            base_score: self.get_number_or_default(
                config_keys::SUGGESTION_BASE_SCORE,
                defaults.base_score,
                finite,
            )?,
            eye_level_weight: self.get_number_or_default(
                config_keys::SUGGESTION_EYE_LEVEL_WEIGHT,
                defaults.eye_level_weight,
                finite,
            )?,
            edge_bonus: self.get_number_or_default(
                config_keys::SUGGESTION_EDGE_BONUS,
                defaults.edge_bonus,
                finite,
            )?,
            same_maker_bonus: self.get_number_or_default(
                config_keys::SUGGESTION_SAME_MAKER_BONUS,
                defaults.same_maker_bonus,
                finite,
            )?,
        })
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 缓存
    pub const CACHE_TTL_SECS: &str = "cache_ttl_secs";

    // 陈列位推荐
    pub const SUGGESTION_TOP_N: &str = "suggestion_top_n";
    pub const SUGGESTION_BASE_SCORE: &str = "suggestion_base_score";
    pub const SUGGESTION_EYE_LEVEL_WEIGHT: &str = "suggestion_eye_level_weight";
    pub const SUGGESTION_EDGE_BONUS: &str = "suggestion_edge_bonus";
    pub const SUGGESTION_SAME_MAKER_BONUS: &str = "suggestion_same_maker_bonus";
}
