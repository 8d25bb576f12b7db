// ==========================================
// 货架陈列系统 - 操作日志领域模型
// ==========================================
// 红线: 所有陈列写入必须记录（含强制陈列）
// 用途: 审计追踪
// ==========================================

use crate::domain::types::{PlacementId, ShelfId};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ==========================================
// ActionLog - 操作日志
// ==========================================
// 对齐: action_log 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,                // 日志ID (UUID)
    pub shelf_id: ShelfId,                // 关联货架
    pub placement_id: Option<PlacementId>, // 关联陈列位（删除货架等操作为 None）
    pub action_type: String,              // 操作类型 (存储为字符串)
    pub action_ts: NaiveDateTime,         // 操作时间戳
    pub actor: String,                    // 操作人
    pub payload_json: Option<JsonValue>,  // 操作参数 (JSON)
    pub detail: Option<String>,           // 详细描述
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    PlaceProduct,     // 陈列商品
    ForcePlace,       // 强制陈列（跳过冲突校验）
    RemovePlacement,  // 撤下陈列
    UpdateFaceCount,  // 修改排面数
    DeleteShelf,      // 删除货架（级联）
}

impl ActionType {
    /// 转换为字符串 (用于数据库存储)
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::PlaceProduct => "PlaceProduct",
            ActionType::ForcePlace => "ForcePlace",
            ActionType::RemovePlacement => "RemovePlacement",
            ActionType::UpdateFaceCount => "UpdateFaceCount",
            ActionType::DeleteShelf => "DeleteShelf",
        }
    }

    /// 从字符串解析
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PlaceProduct" => Some(ActionType::PlaceProduct),
            "ForcePlace" => Some(ActionType::ForcePlace),
            "RemovePlacement" => Some(ActionType::RemovePlacement),
            "UpdateFaceCount" => Some(ActionType::UpdateFaceCount),
            "DeleteShelf" => Some(ActionType::DeleteShelf),
            _ => None,
        }
    }
}

impl ActionLog {
    /// 创建新的操作日志（action_id 自动生成）
    pub fn new(
        shelf_id: ShelfId,
        placement_id: Option<PlacementId>,
        action_type: ActionType,
        actor: &str,
    ) -> Self {
        Self {
            action_id: uuid::Uuid::new_v4().to_string(),
            shelf_id,
            placement_id,
            action_type: action_type.as_str().to_string(),
            action_ts: chrono::Local::now().naive_local(),
            actor: actor.to_string(),
            payload_json: None,
            detail: None,
        }
    }

    pub fn with_payload(mut self, payload: JsonValue) -> Self {
        self.payload_json = Some(payload);
        self
    }

    pub fn with_detail(mut self, detail: String) -> Self {
        self.detail = Some(detail);
        self
    }

    pub fn parsed_action_type(&self) -> Option<ActionType> {
        ActionType::from_str(&self.action_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_type_roundtrip() {
        for t in [
            ActionType::PlaceProduct,
            ActionType::ForcePlace,
            ActionType::RemovePlacement,
            ActionType::UpdateFaceCount,
            ActionType::DeleteShelf,
        ] {
            assert_eq!(ActionType::from_str(t.as_str()), Some(t));
        }
        assert_eq!(ActionType::from_str("Recalc"), None);
    }

    #[test]
    fn test_new_action_log() {
        let log = ActionLog::new(3, Some(7), ActionType::ForcePlace, "tester")
            .with_detail("强制陈列".to_string());
        assert_eq!(log.shelf_id, 3);
        assert_eq!(log.placement_id, Some(7));
        assert_eq!(log.parsed_action_type(), Some(ActionType::ForcePlace));
        assert!(!log.action_id.is_empty());
        assert_eq!(log.detail.as_deref(), Some("强制陈列"));
    }
}
