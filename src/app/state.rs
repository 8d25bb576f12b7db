// ==========================================
// 货架陈列系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 说明: 全部仓储共享一个 SQLite 连接；PlacementStore 与缓存全局唯一
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{ImportApi, PlanogramApi};
use crate::config::{ConfigManager, EngineConfig};
use crate::db::{init_schema, open_sqlite_connection};
use crate::engine::{PlacementStore, ShelfCache};
use crate::importer::PlacementBatchImporter;
use crate::perf::install_sqlite_tracing;
use crate::repository::{
    ActionLogRepository, PlacementRepository, ProductRepository, ShelfRepository,
};

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 启动时加载的引擎配置
    pub engine_config: EngineConfig,

    /// 陈列API
    pub planogram_api: Arc<PlanogramApi>,

    /// 陈列导入API
    pub import_api: Arc<ImportApi>,

    /// 陈列位存储（写路径 + 缓存读路径）
    pub placement_store: Arc<PlacementStore>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 货架仓储（用于报表遍历）
    pub shelf_repo: Arc<ShelfRepository>,

    /// 操作日志仓储（用于审计追踪）
    pub action_log_repo: Arc<ActionLogRepository>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径（":memory:" 可用于临时实例）
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开数据库并初始化表结构（幂等）
    /// 2. 从 config_kv 读取引擎配置
    /// 3. 初始化所有Repository / Engine / API
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let mut conn =
            open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("无法初始化数据库表结构: {}", e))?;
        install_sqlite_tracing(&mut conn);
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 配置
        // ==========================================
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );
        let engine_config = futures::executor::block_on(config_manager.load_engine_config())
            .map_err(|e| format!("无法加载引擎配置: {}", e))?;
        tracing::info!(
            cache_ttl_secs = engine_config.cache_ttl_secs,
            suggestion_top_n = engine_config.suggestion.top_n,
            "引擎配置已加载"
        );

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let shelf_repo = Arc::new(ShelfRepository::new(conn.clone()));
        let product_repo = Arc::new(ProductRepository::new(conn.clone()));
        let placement_repo = Arc::new(PlacementRepository::new(conn.clone()));
        let action_log_repo = Arc::new(ActionLogRepository::new(conn.clone()));

        // ==========================================
        // 初始化Engine层
        // ==========================================
        let cache = Arc::new(ShelfCache::new(engine_config.cache_ttl()));
        let placement_store = Arc::new(PlacementStore::new(
            shelf_repo.clone(),
            product_repo.clone(),
            placement_repo,
            action_log_repo.clone(),
            cache,
        ));

        // ==========================================
        // 初始化API层
        // ==========================================
        let planogram_api = Arc::new(PlanogramApi::new(
            placement_store.clone(),
            shelf_repo.clone(),
            product_repo,
            action_log_repo.clone(),
            engine_config.suggestion,
        ));
        let import_api = Arc::new(ImportApi::new(Arc::new(PlacementBatchImporter::new(
            placement_store.clone(),
        ))));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            engine_config,
            planogram_api,
            import_api,
            placement_store,
            config_manager,
            shelf_repo,
            action_log_repo,
        })
    }

    /// 获取数据库路径
    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }
}

// ==========================================
// 默认数据库路径辅助函数
// ==========================================

/// 获取默认数据库路径
///
/// # 返回
/// - 环境变量 SHELF_PLANOGRAM_DB_PATH（非空时优先）
/// - 开发环境: 用户数据目录/shelf-planogram-dev/shelf_planogram.db
/// - 生产环境: 用户数据目录/shelf-planogram/shelf_planogram.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var("SHELF_PLANOGRAM_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./shelf_planogram.db");

    if let Some(data_dir) = dirs::data_dir() {
        // 开发环境使用独立目录，避免污染生产数据
        #[cfg(debug_assertions)]
        {
            path = data_dir.join("shelf-planogram-dev");
        }

        #[cfg(not(debug_assertions))]
        {
            path = data_dir.join("shelf-planogram");
        }

        // 确保目录存在
        std::fs::create_dir_all(&path).ok();
        path = path.join("shelf_planogram.db");
    }

    path.to_string_lossy().to_string()
}
