// ==========================================
// 货架陈列系统 - 陈列导入 API
// ==========================================
// 职责: 封装陈列批量导入（CSV / Excel）
// ==========================================

use std::path::Path;
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::importer::{BatchReport, PlacementBatchImporter};

pub struct ImportApi {
    importer: Arc<PlacementBatchImporter>,
}

impl ImportApi {
    pub fn new(importer: Arc<PlacementBatchImporter>) -> Self {
        Self { importer }
    }

    /// 导入陈列文件
    ///
    /// # 返回
    /// - Ok(BatchReport): 逐行结果，被拒绝的行不影响其他行
    /// - Err(ApiError::ImportError): 文件级错误
    pub fn import_placements(&self, file_path: &str, operator: &str) -> ApiResult<BatchReport> {
        if file_path.trim().is_empty() {
            return Err(ApiError::InvalidInput("文件路径不能为空".to_string()));
        }
        if operator.trim().is_empty() {
            return Err(ApiError::InvalidInput("操作人不能为空".to_string()));
        }
        Ok(self.importer.import_file(Path::new(file_path), operator)?)
    }
}
