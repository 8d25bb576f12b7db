// ==========================================
// 货架陈列系统 - 国际化 (i18n)
// ==========================================
// 使用 rust-i18n；词条位于 locales/*.yml，默认 zh-CN
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

use crate::domain::shelf::Shelf;
use crate::engine::statistics::ShelfStatistics;
use crate::importer::BatchReport;

/// 支持的语言
pub const SUPPORTED_LOCALES: [&str; 2] = ["zh-CN", "en"];

pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 切换语言（不支持的语言代码返回 false 且不切换）
pub fn set_locale(locale: &str) -> bool {
    if !SUPPORTED_LOCALES.contains(&locale) {
        tracing::warn!(locale, "不支持的语言，保持 {}", current_locale());
        return false;
    }
    rust_i18n::set_locale(locale);
    true
}

pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 翻译并替换 `%{name}` 占位符
///
/// ```no_run
/// use shelf_planogram::i18n::t_with_args;
/// let msg = t_with_args("import.file_not_found", &[("path", "/tmp/layout.csv")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    args.iter()
        .fold(rust_i18n::t!(key).to_string(), |msg, (name, value)| {
            msg.replace(&format!("%{{{}}}", name), value)
        })
}

/// 批量导入摘要
pub fn import_summary(report: &BatchReport) -> String {
    t_with_args(
        "import.summary",
        &[
            ("total", &report.total_rows.to_string()),
            ("placed", &report.placed.to_string()),
            ("forced", &report.forced.to_string()),
            ("rejected", &report.rejected.to_string()),
            ("invalid", &report.invalid.to_string()),
        ],
    )
}

/// 单行导入错误
pub fn row_error(row: usize, reason: &str) -> String {
    t_with_args("import.row_error", &[("row", &row.to_string()), ("reason", reason)])
}

/// 货架统计摘要行
pub fn shelf_stats_line(shelf: &Shelf, stats: &ShelfStatistics) -> String {
    let pct = |v: f64| format!("{:.1}", v);
    t_with_args(
        "report.shelf_stats",
        &[
            ("id", &shelf.shelf_id.to_string()),
            ("name", &shelf.name),
            ("rows", &shelf.rows.to_string()),
            ("columns", &shelf.columns.to_string()),
            ("occupied", &stats.occupied_cells.to_string()),
            ("total", &stats.total_cells.to_string()),
            ("rate", &pct(stats.occupancy_rate)),
            ("own", &stats.own_products_count.to_string()),
            ("competitor", &stats.competitor_products_count.to_string()),
            ("own_share", &pct(stats.own_share)),
            ("area", &pct(stats.area_utilization)),
            ("forced", &stats.forced_placements.to_string()),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // locale 为进程级全局状态，相关测试串行执行
    static LOCALE_TEST_LOCK: Mutex<()> = Mutex::new(());

    fn report() -> BatchReport {
        BatchReport {
            batch_id: "b-1".to_string(),
            total_rows: 5,
            placed: 3,
            forced: 1,
            rejected: 1,
            invalid: 1,
            elapsed_ms: 0,
            outcomes: Vec::new(),
        }
    }

    #[test]
    fn test_set_locale_rejects_unknown() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        assert!(set_locale("en"));
        assert_eq!(current_locale(), "en");

        assert!(!set_locale("fr"));
        assert_eq!(current_locale(), "en");

        assert!(set_locale("zh-CN"));
    }

    #[test]
    fn test_placement_error_messages() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        use crate::domain::types::CellRect;
        use crate::engine::error::PlacementError;

        let err = PlacementError::OutOfBounds {
            rect: CellRect::new(5, 7, 2, 3),
            rows: 6,
            columns: 8,
        };

        set_locale("zh-CN");
        let msg = err.localized_message();
        assert!(msg.contains("陈列越界"));
        assert!(msg.contains("6段×8列"));

        set_locale("en");
        let msg = err.localized_message();
        assert!(msg.starts_with("Out of bounds"));
        assert!(!msg.contains("%{"));

        set_locale("zh-CN");
    }

    #[test]
    fn test_shelf_stats_line() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        let shelf = Shelf::new("饮料棚", 120.0, 180.0, 60.0, 6, 8);
        let stats = crate::engine::statistics::compute(&shelf, Vec::new());

        set_locale("zh-CN");
        let line = shelf_stats_line(&shelf, &stats);
        assert!(line.contains("饮料棚 (6段×8列)"));
        assert!(line.contains("占用 0/48 (0.0%)"));
        assert_eq!(t("report.no_shelves"), "暂无货架");

        set_locale("en");
        let line = shelf_stats_line(&shelf, &stats);
        assert!(line.contains("(6x8)"));
        assert!(!line.contains("%{"));

        set_locale("zh-CN");
    }

    #[test]
    fn test_import_messages() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();

        set_locale("zh-CN");
        let msg = import_summary(&report());
        assert!(msg.contains("共 5 行"));
        assert!(msg.contains("强制 1"));
        assert!(row_error(7, "重叠").contains("第 7 行"));

        set_locale("en");
        let msg = t_with_args("import.file_not_found", &[("path", "/tmp/layout.csv")]);
        assert!(msg.contains("/tmp/layout.csv"));
        assert!(msg.contains("File not found"));
        assert!(!import_summary(&report()).contains("%{"));

        set_locale("zh-CN");
    }
}
