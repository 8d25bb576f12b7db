// ==========================================
// API集成测试辅助工具
// ==========================================
// 职责: 基于临时数据库组装完整 AppState
// ==========================================

use shelf_planogram::app::AppState;
use tempfile::NamedTempFile;

/// API测试环境
pub struct ApiTestEnv {
    pub _temp_file: NamedTempFile,
    pub state: AppState,
}

impl ApiTestEnv {
    pub fn new() -> Self {
        let temp_file = NamedTempFile::new().expect("创建临时文件失败");
        let db_path = temp_file.path().to_string_lossy().to_string();
        let state = AppState::new(db_path).expect("初始化AppState失败");
        Self {
            _temp_file: temp_file,
            state,
        }
    }
}
