// ==========================================
// 货架陈列系统 - 命令行入口
// ==========================================
// 用法: shelf-planogram [陈列导入文件.csv|.xlsx]
// 环境变量: SHELF_PLANOGRAM_DB_PATH / SHELF_PLANOGRAM_LOG_JSON / RUST_LOG
// 输出: 每个货架的统计摘要
// ==========================================

use shelf_planogram::app::{get_default_db_path, AppState};
use shelf_planogram::importer::RowStatus;
use shelf_planogram::{i18n, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_from_env();

    tracing::info!("==================================================");
    tracing::info!("{}", shelf_planogram::APP_NAME);
    tracing::info!("系统版本: {}", shelf_planogram::VERSION);
    tracing::info!("==================================================");

    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    let state = tokio::task::spawn_blocking(move || AppState::new(db_path))
        .await?
        .map_err(anyhow::Error::msg)?;

    if let Some(file) = std::env::args().nth(1) {
        let report = state.import_api.import_placements(&file, "cli")?;
        println!("{}", i18n::import_summary(&report));
        for outcome in &report.outcomes {
            if let RowStatus::Rejected { message, .. } | RowStatus::Invalid { message } = &outcome.status {
                println!("  {}", i18n::row_error(outcome.row_number, message));
            }
        }
    }

    let shelves = state.planogram_api.list_shelves()?;
    if shelves.is_empty() {
        println!("{}", i18n::t("report.no_shelves"));
        return Ok(());
    }

    for shelf in shelves {
        let stats = state.planogram_api.get_stats(shelf.shelf_id)?;
        println!("{}", i18n::shelf_stats_line(&shelf, &stats));
    }

    Ok(())
}
