// ==========================================
// 货架陈列系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换引擎/仓储错误为用户友好的错误消息
// 红线: 陈列错误种类（越界/重叠/未找到/排面数/存储）转换后仍可区分
// ==========================================

use crate::domain::shelf::ShelfError;
use crate::domain::types::{CellRect, PlacementId};
use crate::engine::error::{PlacementError, PlacementErrorKind};
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 陈列约束错误
    // ==========================================
    #[error("陈列越界: 区域 {rect} 超出货架 {rows}段×{columns}列")]
    OutOfBounds {
        rect: CellRect,
        rows: u32,
        columns: u32,
    },

    #[error("陈列重叠: 区域 {rect} 与陈列位 {conflicting:?} 冲突")]
    Overlap {
        rect: CellRect,
        conflicting: Vec<PlacementId>,
    },

    #[error("无效的排面数: {face_count}")]
    InvalidFaceCount {
        face_count: i64,
        min: Option<u32>,
        max: Option<u32>,
    },

    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),


    // ==========================================
    // 导入错误
    // ==========================================
    #[error("文件导入失败: {0}")]
    ImportError(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),
}

impl ApiError {
    /// 对应的陈列错误种类（非陈列错误返回 None）
    pub fn placement_kind(&self) -> Option<PlacementErrorKind> {
        match self {
            ApiError::OutOfBounds { .. } => Some(PlacementErrorKind::OutOfBounds),
            ApiError::Overlap { .. } => Some(PlacementErrorKind::Overlap),
            ApiError::NotFound(_) => Some(PlacementErrorKind::NotFound),
            ApiError::InvalidFaceCount { .. } => Some(PlacementErrorKind::InvalidFaceCount),
            ApiError::DatabaseError(_) | ApiError::DatabaseConnectionError(_) => {
                Some(PlacementErrorKind::Storage)
            }
            _ => None,
        }
    }
}

// ==========================================
// 从 PlacementError 转换
// ==========================================
impl From<PlacementError> for ApiError {
    fn from(err: PlacementError) -> Self {
        match err {
            PlacementError::OutOfBounds { rect, rows, columns } => {
                ApiError::OutOfBounds { rect, rows, columns }
            }
            PlacementError::Overlap { rect, conflicting } => ApiError::Overlap { rect, conflicting },
            PlacementError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            PlacementError::InvalidFaceCount { face_count, min, max } => {
                ApiError::InvalidFaceCount { face_count, min, max }
            }
            PlacementError::Storage(e) => e.into(),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 将Repository层的技术错误转换为用户友好的业务错误
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }
            RepositoryError::CheckViolation(msg) => ApiError::ValidationError(msg),
            RepositoryError::CorruptRow { column, message } => {
                ApiError::DatabaseError(format!("数据行损坏 (column={}): {}", column, message))
            }
        }
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        ApiError::ImportError(err.to_string())
    }
}

impl From<ShelfError> for ApiError {
    fn from(err: ShelfError) -> Self {
        ApiError::InvalidInput(err.to_string())
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
