// ==========================================
// GestiFiltres - 命令行入口
// ==========================================
// 用法:
//   gestifiltres                 输出驾驶舱告警
//   gestifiltres import <csv>    导入维保历史
//   gestifiltres export <csv>    导出维保历史
// 数据库路径: GESTIFILTRES_DB_PATH 或用户数据目录
// ==========================================

use std::path::Path;

use anyhow::{anyhow, bail, Context};
use gestifiltres::app::{get_default_db_path, AppState};
use gestifiltres::logging;

fn main() -> anyhow::Result<()> {
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} - 维保排程计算", gestifiltres::APP_NAME);
    tracing::info!("系统版本: {}", gestifiltres::VERSION);
    tracing::info!("==================================================");

    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    let state = AppState::new(db_path).map_err(|e| anyhow!("无法初始化AppState: {}", e))?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [] => print_dashboard(&state),
        [cmd, path] if cmd == "import" => {
            let count = state
                .maintenance_api
                .import_history_csv(Path::new(path))
                .with_context(|| format!("导入失败: {}", path))?;
            tracing::info!(count, "导入完成");
            Ok(())
        }
        [cmd, path] if cmd == "export" => {
            let count = state
                .maintenance_api
                .export_history_csv(Path::new(path))
                .with_context(|| format!("导出失败: {}", path))?;
            tracing::info!(count, "导出完成");
            Ok(())
        }
        other => bail!("无法识别的参数: {:?} (可用: import <csv> | export <csv>)", other),
    }
}

fn print_dashboard(state: &AppState) -> anyhow::Result<()> {
    let alerts = state.maintenance_api.list_dashboard_alerts()?;

    if alerts.is_empty() {
        tracing::info!("没有需要关注的机器");
        return Ok(());
    }

    for status in &alerts {
        tracing::warn!(
            machine_id = %status.machine_id,
            machine_name = %status.machine_name,
            level = %status.alert_level,
            next_range = %status.projection.next_range,
            due_at_hours = status.projection.due_at_hours,
            hours_remaining = status.projection.hours_remaining,
            skipped = status.projection.skipped_intervals,
            "维保告警"
        );
    }
    Ok(())
}
