// ==========================================
// 配置集成测试
// ==========================================
// 职责: 验证 config_kv 中的配置在文件数据库上持久化，并被 AppState 启动时读取
// ==========================================


#[cfg(test)]
mod config_test {
    use crate::test_helpers::create_test_db;
    use shelf_planogram::app::AppState;
    use shelf_planogram::config::{config_keys, ConfigManager, EngineConfigReader};
    use std::time::Duration;

    #[tokio::test]
    async fn test_config_persists_across_managers() {
        let (_temp_file, db_path) = create_test_db().unwrap();

        {
            let cm = ConfigManager::new(&db_path).unwrap();
            cm.set_global_config_value(config_keys::CACHE_TTL_SECS, "120").unwrap();
            cm.set_global_config_value(config_keys::SUGGESTION_TOP_N, "3").unwrap();
        }

        let cm = ConfigManager::new(&db_path).unwrap();
        assert_eq!(cm.get_cache_ttl_secs().await.unwrap(), 120);
        let weights = cm.get_suggestion_weights().await.unwrap();
        assert_eq!(weights.top_n, 3);
        assert_eq!(weights.base_score, 100.0);
    }

    #[tokio::test]
    async fn test_invalid_ttl_falls_back_to_default() {
        let (_temp_file, db_path) = create_test_db().unwrap();
        let cm = ConfigManager::new(&db_path).unwrap();
        cm.set_global_config_value(config_keys::CACHE_TTL_SECS, "-5").unwrap();

        let config = cm.load_engine_config().await.unwrap();
        assert_eq!(config.cache_ttl(), Duration::from_secs(3600));
    }

    #[test]
    fn test_app_state_reads_engine_config() {
        let (_temp_file, db_path) = create_test_db().unwrap();
        let cm = ConfigManager::new(&db_path).unwrap();
        cm.set_global_config_value(config_keys::CACHE_TTL_SECS, "60").unwrap();
        cm.set_global_config_value(config_keys::SUGGESTION_TOP_N, "2").unwrap();
        drop(cm);

        let state = AppState::new(db_path).unwrap();
        assert_eq!(state.engine_config.cache_ttl_secs, 60);
        assert_eq!(state.engine_config.suggestion.top_n, 2);
        assert_eq!(state.placement_store.cache().ttl(), Duration::from_secs(60));
    }
}
