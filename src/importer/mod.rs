// ==========================================
// 货架陈列系统 - 导入层
// ==========================================
// 职责: 批量陈列请求导入（文件 -> PlacementStore）
// 支持: Excel, CSV
// ==========================================

pub mod error;
pub mod file_parser;
pub mod placement_batch;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, FileParser, RawRecord, UniversalFileParser};
pub use placement_batch::{
    BatchReport, PlacementBatchImporter, PlacementRow, RowOutcome, RowStatus,
};
