// ==========================================
// 货架陈列系统 - 陈列批量导入
// ==========================================
// 职责: 文件 -> 陈列请求 -> PlacementStore，逐行生成结果报告
// 列: shelf_id, product_id, row, column, face_count(可选，默认 1), force(可选)
// 红线: 单行被拒绝（解析失败/校验失败）不中断批次
// 红线: 按文件行序逐行提交，后续行能看到前面行的陈列结果
// ==========================================

use crate::domain::types::{PlacementId, ProductId, ShelfId};
use crate::engine::error::PlacementErrorKind;
use crate::engine::placement_store::{PlaceCommand, PlacementStore};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{RawRecord, UniversalFileParser};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

const REQUIRED_COLUMNS: [&str; 4] = ["shelf_id", "product_id", "row", "column"];

// ==========================================
// PlacementRow - 解析后的陈列请求
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementRow {
    pub row_number: usize,
    pub shelf_id: ShelfId,
    pub product_id: ProductId,
    pub row: u32,
    pub column: u32,
    pub face_count: i64,
    pub force: bool,
}

impl PlacementRow {
    /// 从原始记录解析
    pub fn from_record(record: &RawRecord) -> ImportResult<Self> {
        let line = record.row_number;
        Ok(Self {
            row_number: line,
            shelf_id: parse_int(record, "shelf_id")?,
            product_id: parse_int(record, "product_id")?,
            row: parse_coordinate(record, "row")?,
            column: parse_coordinate(record, "column")?,
            face_count: match record.get("face_count") {
                Some(_) => parse_int(record, "face_count")?,
                None => 1,
            },
            force: match record.get("force") {
                Some(v) => parse_bool(line, "force", v)?,
                None => false,
            },
        })
    }

    fn to_command(&self, actor: &str) -> PlaceCommand {
        PlaceCommand::new(self.shelf_id, self.product_id, self.row, self.column)
            .faces(self.face_count)
            .by(actor)
    }
}

// ==========================================
// 结果报告
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowStatus {
    /// 已陈列
    Placed {
        placement_id: PlacementId,
        forced: bool,
    },
    /// 引擎拒绝（越界/重叠/未找到/排面数/存储）
    Rejected {
        kind: PlacementErrorKind,
        message: String,
    },
    /// 行内容无法解析
    Invalid { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowOutcome {
    pub row_number: usize,
    #[serde(flatten)]
    pub status: RowStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub batch_id: String,
    pub total_rows: usize,
    pub placed: usize,
    pub forced: usize,
    pub rejected: usize,
    pub invalid: usize,
    pub elapsed_ms: u64,
    pub outcomes: Vec<RowOutcome>,
}

impl BatchReport {
    fn new() -> Self {
        Self {
            batch_id: uuid::Uuid::new_v4().to_string(),
            total_rows: 0,
            placed: 0,
            forced: 0,
            rejected: 0,
            invalid: 0,
            elapsed_ms: 0,
            outcomes: Vec::new(),
        }
    }

    fn push(&mut self, row_number: usize, status: RowStatus) {
        self.total_rows += 1;
        match &status {
            RowStatus::Placed { forced, .. } => {
                self.placed += 1;
                if *forced {
                    self.forced += 1;
                }
            }
            RowStatus::Rejected { .. } => self.rejected += 1,
            RowStatus::Invalid { .. } => self.invalid += 1,
        }
        self.outcomes.push(RowOutcome { row_number, status });
    }

    pub fn outcome(&self, row_number: usize) -> Option<&RowStatus> {
        self.outcomes
            .iter()
            .find(|o| o.row_number == row_number)
            .map(|o| &o.status)
    }
}

// ==========================================
// PlacementBatchImporter
// ==========================================
pub struct PlacementBatchImporter {
    store: Arc<PlacementStore>,
}

impl PlacementBatchImporter {
    pub fn new(store: Arc<PlacementStore>) -> Self {
        Self { store }
    }

    /// 导入文件
    ///
    /// # 返回
    /// - Ok(BatchReport): 逐行结果（包含被拒绝的行）
    /// - Err(ImportError): 文件级错误（不存在/格式不支持/缺少必需列）
    #[instrument(skip(self, file_path), fields(file = %file_path.as_ref().display()))]
    pub fn import_file<P: AsRef<Path>>(&self, file_path: P, actor: &str) -> ImportResult<BatchReport> {
        let records = UniversalFileParser.parse(file_path.as_ref())?;
        self.import_records(&records, actor)
    }

    /// 导入已解析的原始记录
    pub fn import_records(&self, records: &[RawRecord], actor: &str) -> ImportResult<BatchReport> {
        check_columns(records)?;

        let started = Instant::now();
        let mut report = BatchReport::new();

        for record in records {
            let status = match PlacementRow::from_record(record) {
                Ok(row) => self.apply(&row, actor),
                Err(e) => {
                    warn!(row = record.row_number, error = %e, "导入行解析失败");
                    RowStatus::Invalid {
                        message: e.to_string(),
                    }
                }
            };
            report.push(record.row_number, status);
        }

        report.elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            batch_id = %report.batch_id,
            total = report.total_rows,
            placed = report.placed,
            forced = report.forced,
            rejected = report.rejected,
            invalid = report.invalid,
            elapsed_ms = report.elapsed_ms,
            "陈列批量导入完成"
        );
        Ok(report)
    }

    fn apply(&self, row: &PlacementRow, actor: &str) -> RowStatus {
        let cmd = row.to_command(actor);
        let result = if row.force {
            self.store.place_unchecked(&cmd)
        } else {
            self.store.place(&cmd)
        };

        match result {
            Ok(placement) => RowStatus::Placed {
                placement_id: placement.placement_id,
                forced: placement.force_override,
            },
            Err(e) => {
                warn!(row = row.row_number, kind = e.kind().as_str(), error = %e, "导入行被拒绝");
                RowStatus::Rejected {
                    kind: e.kind(),
                    message: e.localized_message(),
                }
            }
        }
    }
}

// ==========================================
// 解析辅助
// ==========================================

/// 检查必需列（以首条记录的表头为准；空文件视为无需检查）
fn check_columns(records: &[RawRecord]) -> ImportResult<()> {
    let Some(first) = records.first() else {
        return Ok(());
    };
    for column in REQUIRED_COLUMNS {
        if !first.fields.contains_key(column) {
            return Err(ImportError::MissingColumn(column.to_string()));
        }
    }
    Ok(())
}

fn parse_int(record: &RawRecord, field: &str) -> ImportResult<i64> {
    let value = record.get(field).ok_or_else(|| ImportError::MissingField {
        row: record.row_number,
        field: field.to_string(),
    })?;

    if let Ok(v) = value.parse::<i64>() {
        return Ok(v);
    }
    // Excel 数值单元格可能带小数点（如 "2.0"）
    match value.parse::<f64>() {
        Ok(v) if v.fract() == 0.0 && v.abs() < i64::MAX as f64 => Ok(v as i64),
        _ => Err(ImportError::TypeConversionError {
            row: record.row_number,
            field: field.to_string(),
            message: format!("期望整数，实际 {}", value),
        }),
    }
}

fn parse_coordinate(record: &RawRecord, field: &str) -> ImportResult<u32> {
    let value = parse_int(record, field)?;
    u32::try_from(value).map_err(|_| ImportError::TypeConversionError {
        row: record.row_number,
        field: field.to_string(),
        message: format!("坐标不能为负数: {}", value),
    })
}

fn parse_bool(row: usize, field: &str, value: &str) -> ImportResult<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "是" => Ok(true),
        "0" | "false" | "no" | "n" | "否" => Ok(false),
        _ => Err(ImportError::TypeConversionError {
            row,
            field: field.to_string(),
            message: format!("期望布尔值，实际 {}", value),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn record(row_number: usize, pairs: &[(&str, &str)]) -> RawRecord {
        RawRecord {
            row_number,
            fields: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
        }
    }

    #[test]
    fn test_parse_row_defaults() {
        let rec = record(
            2,
            &[("shelf_id", "1"), ("product_id", "10"), ("row", "0"), ("column", "3")],
        );
        let row = PlacementRow::from_record(&rec).unwrap();
        assert_eq!(row.face_count, 1);
        assert!(!row.force);
        assert_eq!((row.row, row.column), (0, 3));
    }

    #[test]
    fn test_parse_row_excel_numbers_and_force() {
        let rec = record(
            5,
            &[
                ("shelf_id", "1.0"),
                ("product_id", "10"),
                ("row", "2"),
                ("column", "4.0"),
                ("face_count", "3"),
                ("force", "TRUE"),
            ],
        );
        let row = PlacementRow::from_record(&rec).unwrap();
        assert_eq!(row.shelf_id, 1);
        assert_eq!(row.column, 4);
        assert_eq!(row.face_count, 3);
        assert!(row.force);
    }

    #[test]
    fn test_parse_row_errors_carry_row_number() {
        let rec = record(
            7,
            &[("shelf_id", "1"), ("product_id", "x"), ("row", "0"), ("column", "0")],
        );
        let err = PlacementRow::from_record(&rec).unwrap_err();
        assert_eq!(err.row(), Some(7));

        let rec = record(
            8,
            &[("shelf_id", "1"), ("product_id", "2"), ("row", "-1"), ("column", "0")],
        );
        assert!(matches!(
            PlacementRow::from_record(&rec),
            Err(ImportError::TypeConversionError { row: 8, .. })
        ));

        let rec = record(9, &[("shelf_id", "1"), ("product_id", ""), ("row", "0"), ("column", "0")]);
        assert!(matches!(
            PlacementRow::from_record(&rec),
            Err(ImportError::MissingField { row: 9, .. })
        ));
    }

    #[test]
    fn test_check_columns() {
        let rec = record(2, &[("shelf_id", "1"), ("product_id", "10"), ("row", "0")]);
        assert!(matches!(
            check_columns(&[rec]),
            Err(ImportError::MissingColumn(c)) if c == "column"
        ));
        assert!(check_columns(&[]).is_ok());
    }

    #[test]
    fn test_report_counters() {
        let mut report = BatchReport::new();
        report.push(2, RowStatus::Placed { placement_id: 1, forced: false });
        report.push(3, RowStatus::Placed { placement_id: 2, forced: true });
        report.push(
            4,
            RowStatus::Rejected {
                kind: PlacementErrorKind::Overlap,
                message: "overlap".into(),
            },
        );
        report.push(5, RowStatus::Invalid { message: "bad".into() });

        assert_eq!(report.total_rows, 4);
        assert_eq!(report.placed, 2);
        assert_eq!(report.forced, 1);
        assert_eq!(report.rejected, 1);
        assert_eq!(report.invalid, 1);
        assert!(matches!(report.outcome(4), Some(RowStatus::Rejected { .. })));
        assert!(report.outcome(6).is_none());
    }
}
