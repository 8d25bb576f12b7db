// ==========================================
// 货架陈列系统 - 陈列引擎错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 错误种类封闭且可区分，UI 可按种类渲染提示
// ==========================================

use crate::domain::types::{CellRect, PlacementId};
use crate::repository::error::RepositoryError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 陈列引擎错误类型
#[derive(Error, Debug)]
pub enum PlacementError {
    /// 原点 + 跨度超出货架网格
    #[error("陈列越界: 区域 {rect} 超出货架 {rows}段×{columns}列")]
    OutOfBounds {
        rect: CellRect,
        rows: u32,
        columns: u32,
    },

    /// 目标区域与既有陈列位重叠
    #[error("陈列重叠: 区域 {rect} 与陈列位 {conflicting:?} 冲突")]
    Overlap {
        rect: CellRect,
        conflicting: Vec<PlacementId>,
    },

    /// 引用的陈列位/货架/商品不存在
    #[error("记录未找到: {entity} id={id}")]
    NotFound { entity: &'static str, id: i64 },

    /// 排面数 ≤ 0 或超出商品允许范围
    #[error("无效的排面数: {face_count}")]
    InvalidFaceCount {
        face_count: i64,
        min: Option<u32>,
        max: Option<u32>,
    },

    /// 存储层失败（非业务错误，调用方可自行决定是否重试）
    #[error(transparent)]
    Storage(#[from] RepositoryError),
}

/// 错误种类（对外稳定标识）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlacementErrorKind {
    OutOfBounds,
    Overlap,
    NotFound,
    InvalidFaceCount,
    Storage,
}

impl PlacementErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlacementErrorKind::OutOfBounds => "OUT_OF_BOUNDS",
            PlacementErrorKind::Overlap => "OVERLAP",
            PlacementErrorKind::NotFound => "NOT_FOUND",
            PlacementErrorKind::InvalidFaceCount => "INVALID_FACE_COUNT",
            PlacementErrorKind::Storage => "STORAGE",
        }
    }

    /// i18n 消息键
    pub fn message_key(&self) -> &'static str {
        match self {
            PlacementErrorKind::OutOfBounds => "placement.out_of_bounds",
            PlacementErrorKind::Overlap => "placement.overlap",
            PlacementErrorKind::NotFound => "placement.not_found",
            PlacementErrorKind::InvalidFaceCount => "placement.invalid_face_count",
            PlacementErrorKind::Storage => "placement.storage",
        }
    }
}

impl PlacementError {
    pub fn kind(&self) -> PlacementErrorKind {
        match self {
            PlacementError::OutOfBounds { .. } => PlacementErrorKind::OutOfBounds,
            PlacementError::Overlap { .. } => PlacementErrorKind::Overlap,
            PlacementError::NotFound { .. } => PlacementErrorKind::NotFound,
            PlacementError::InvalidFaceCount { .. } => PlacementErrorKind::InvalidFaceCount,
            PlacementError::Storage(_) => PlacementErrorKind::Storage,
        }
    }

    pub fn not_found(entity: &'static str, id: i64) -> Self {
        PlacementError::NotFound { entity, id }
    }

    /// 本地化提示（供 UI 层直接展示）
    pub fn localized_message(&self) -> String {
        let key = self.kind().message_key();
        let args: Vec<(&str, String)> = match self {
            PlacementError::OutOfBounds { rect, rows, columns } => vec![
                ("rect", rect.to_string()),
                ("rows", rows.to_string()),
                ("columns", columns.to_string()),
            ],
            PlacementError::Overlap { rect, conflicting } => vec![
                ("rect", rect.to_string()),
                ("count", conflicting.len().to_string()),
            ],
            PlacementError::NotFound { entity, id } => {
                vec![("entity", entity.to_string()), ("id", id.to_string())]
            }
            PlacementError::InvalidFaceCount { face_count, .. } => {
                vec![("face_count", face_count.to_string())]
            }
            PlacementError::Storage(e) => vec![("reason", e.to_string())],
        };
        let borrowed: Vec<(&str, &str)> = args.iter().map(|(k, v)| (*k, v.as_str())).collect();
        crate::i18n::t_with_args(key, &borrowed)
    }
}

/// Result 类型别名
pub type PlacementResult<T> = Result<T, PlacementError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_are_distinct() {
        let errors = vec![
            PlacementError::OutOfBounds {
                rect: CellRect::new(5, 7, 2, 3),
                rows: 6,
                columns: 8,
            },
            PlacementError::Overlap {
                rect: CellRect::new(0, 0, 1, 1),
                conflicting: vec![1],
            },
            PlacementError::not_found("shelf_placement", 9),
            PlacementError::InvalidFaceCount {
                face_count: 0,
                min: None,
                max: None,
            },
            PlacementError::Storage(RepositoryError::LockError("poisoned".to_string())),
        ];

        let keys: std::collections::HashSet<&str> =
            errors.iter().map(|e| e.kind().message_key()).collect();
        assert_eq!(keys.len(), errors.len());
    }

    #[test]
    fn test_display_contains_context() {
        let err = PlacementError::OutOfBounds {
            rect: CellRect::new(5, 7, 2, 3),
            rows: 6,
            columns: 8,
        };
        let msg = err.to_string();
        assert!(msg.contains("6段"));
        assert!(msg.contains("[5..7)"));
        assert_eq!(err.kind().as_str(), "OUT_OF_BOUNDS");
    }
}
