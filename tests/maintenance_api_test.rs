// ==========================================
// MaintenanceApi / MachineApi 集成测试
// ==========================================
// 测试范围:
// 1. 维保登记与下次维保查询
// 2. 历史标注 (此次之后应做的范围)
// 3. 删除记录后重新计算
// 4. 驾驶舱告警排序与阈值配置
// 5. 边界校验 (负数小时数/未知范围/读数倒退)
// 6. CSV 导入/导出
// ==========================================


use std::io::Write;
use std::sync::Arc;
use std::thread;

use gestifiltres::api::ApiError;
use gestifiltres::config::config_keys;
use gestifiltres::{AlertLevel, MaintenanceRange};
use test_helpers::{date, TestEnv};

// ==========================================
// 登记与查询
// ==========================================

#[test]
fn test_next_maintenance_标准场景() {
    let env = TestEnv::new().expect("无法创建测试环境");
    env.register("M-01", 0);
    env.log("M-01", 250, "C");
    env.log("M-01", 500, "D");
    env.log("M-01", 750, "C");

    env.state
        .machine_api
        .update_service_hours("M-01", 900)
        .expect("更新失败");

    let status = env
        .state
        .maintenance_api
        .get_next_maintenance("M-01")
        .expect("查询失败");

    assert_eq!(status.projection.next_range, MaintenanceRange::E);
    assert_eq!(status.projection.due_at_hours, 1000);
    assert_eq!(status.projection.hours_remaining, 100);
    assert_eq!(status.projection.skipped_intervals, 0);
    assert_eq!(status.alert_level, AlertLevel::Upcoming);

    let reason: serde_json::Value = serde_json::from_str(&status.reason).expect("reason 不是 JSON");
    assert_eq!(reason["next_range"], "E");
    assert_eq!(reason["due_at_hours"], 1000);
}

#[test]
fn test_next_maintenance_无历史() {
    let env = TestEnv::new().expect("无法创建测试环境");
    env.register("M-01", 0);

    let status = env
        .state
        .maintenance_api
        .get_next_maintenance("M-01")
        .expect("查询失败");

    assert_eq!(status.projection.next_range, MaintenanceRange::C);
    assert_eq!(status.projection.due_at_hours, 250);
    assert_eq!(status.projection.hours_remaining, 250);
    assert_eq!(status.alert_level, AlertLevel::Normal);
}

#[test]
fn test_log_maintenance_推进机器读数() {
    let env = TestEnv::new().expect("无法创建测试环境");
    env.register("M-01", 100);

    env.log("M-01", 250, "C");
    let machine = env.state.machine_api.get_machine("M-01").unwrap();
    assert_eq!(machine.current_service_hours, 250);

    // 补录更早的记录不会让读数倒退
    env.log("M-01", 0, "C");
    let machine = env.state.machine_api.get_machine("M-01").unwrap();
    assert_eq!(machine.current_service_hours, 250);
}

#[test]
fn test_log_maintenance_补录不影响读数与投影() {
    let env = TestEnv::new().expect("无法创建测试环境");
    env.register("M-01", 0);
    env.log("M-01", 500, "C");
    env.log("M-01", 750, "D");

    let before = env.state.maintenance_api.get_next_maintenance("M-01").unwrap();

    // 补录一条更早的 C: 读数保持 750
    env.log("M-01", 250, "C");

    let machine = env.state.machine_api.get_machine("M-01").unwrap();
    assert_eq!(machine.current_service_hours, 750);

    let after = env.state.maintenance_api.get_next_maintenance("M-01").unwrap();
    assert_eq!(after.current_service_hours, 750);
    assert_eq!(after.projection.due_at_hours, before.projection.due_at_hours);
    assert_eq!(after.projection.hours_remaining, 250);
    assert_eq!(after.projection.skipped_intervals, 0);
    // 回放 C, C, D → 指针 6, 下一个 C
    assert_eq!(after.projection.next_range, MaintenanceRange::C);
}

#[test]
fn test_log_maintenance_并发读数只增不减() {
    let env = TestEnv::new().expect("无法创建测试环境");
    env.register("M-01", 500);

    let api = Arc::clone(&env.state.maintenance_api);
    let handles: Vec<_> = [1_000_i64, 900, 750, 1_000, 900]
        .into_iter()
        .map(|hours| {
            let api = Arc::clone(&api);
            thread::spawn(move || {
                api.log_maintenance("M-01", hours, "C", date(3), vec![])
                    .expect("登记维保失败");
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("线程异常退出");
    }

    let machine = env.state.machine_api.get_machine("M-01").unwrap();
    assert_eq!(machine.current_service_hours, 1_000);

    // 较小的读数随后写入也不会回退
    env.log("M-01", 900, "D");
    let machine = env.state.machine_api.get_machine("M-01").unwrap();
    assert_eq!(machine.current_service_hours, 1_000);
}

#[test]
fn test_machine_id_首尾空白() {
    let env = TestEnv::new().expect("无法创建测试环境");
    env.state
        .machine_api
        .register_machine("  M-01 ", "压缩机", 0, None, None)
        .unwrap();

    let machine = env.state.machine_api.get_machine(" M-01").unwrap();
    assert_eq!(machine.machine_id, "M-01");

    env.state
        .maintenance_api
        .log_maintenance("M-01 ", 250, "C", date(2), vec![])
        .unwrap();
    let status = env.state.maintenance_api.get_next_maintenance(" M-01 ").unwrap();
    assert_eq!(status.projection.next_range, MaintenanceRange::D);

    let rows = env.state.maintenance_api.list_history_with_next("\tM-01").unwrap();
    assert_eq!(rows.len(), 1);

    env.state.machine_api.update_service_hours(" M-01 ", 300).unwrap();
    env.state.machine_api.delete_machine(" M-01 ").unwrap();
    assert!(env.state.machine_api.list_machines().unwrap().is_empty());
}

#[test]
fn test_list_history_with_next() {
    let env = TestEnv::new().expect("无法创建测试环境");
    env.register("M-01", 0);
    env.log("M-01", 250, "C");
    env.log("M-01", 500, "D");
    env.log("M-01", 750, "C");

    let rows = env
        .state
        .maintenance_api
        .list_history_with_next("M-01")
        .expect("查询失败");

    let summary: Vec<(u32, MaintenanceRange, MaintenanceRange, u64)> = rows
        .iter()
        .map(|row| {
            (
                row.record.service_hours,
                row.record.range,
                row.next_range,
                row.next_due_hours,
            )
        })
        .collect();

    assert_eq!(
        summary,
        vec![
            (750, MaintenanceRange::C, MaintenanceRange::E, 1000),
            (500, MaintenanceRange::D, MaintenanceRange::C, 750),
            (250, MaintenanceRange::C, MaintenanceRange::D, 500),
        ]
    );
}

#[test]
fn test_delete_maintenance_重新计算() {
    let env = TestEnv::new().expect("无法创建测试环境");
    env.register("M-01", 0);
    env.log("M-01", 250, "C");
    env.log("M-01", 500, "D");
    let last = env.log("M-01", 750, "C");
    env.state.machine_api.update_service_hours("M-01", 900).unwrap();

    env.state
        .maintenance_api
        .delete_maintenance(&last)
        .expect("删除失败");

    let status = env.state.maintenance_api.get_next_maintenance("M-01").unwrap();

    // 剩余 C, D: 下一个 C 应在 750 完成, 已被跳过
    assert_eq!(status.projection.skipped_intervals, 1);
    assert_eq!(status.projection.next_range, MaintenanceRange::E);
    assert_eq!(status.projection.due_at_hours, 1000);
    assert_eq!(status.alert_level, AlertLevel::Overdue);

    let err = env.state.maintenance_api.delete_maintenance(&last).unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[test]
fn test_delete_machine_级联删除记录() {
    let env = TestEnv::new().expect("无法创建测试环境");
    env.register("M-01", 0);
    let record_id = env.log("M-01", 250, "C");

    env.state.machine_api.delete_machine("M-01").expect("删除失败");

    assert!(matches!(
        env.state.maintenance_api.get_next_maintenance("M-01"),
        Err(ApiError::NotFound(_))
    ));
    assert!(matches!(
        env.state.maintenance_api.delete_maintenance(&record_id),
        Err(ApiError::NotFound(_))
    ));
}

// ==========================================
// 驾驶舱告警
// ==========================================

#[test]
fn test_dashboard_alerts_排序() {
    let env = TestEnv::new().expect("无法创建测试环境");

    // UPCOMING: 剩余 100
    env.register("M-A", 0);
    env.log("M-A", 250, "C");
    env.log("M-A", 500, "D");
    env.log("M-A", 750, "C");
    env.state.machine_api.update_service_hours("M-A", 900).unwrap();

    // URGENT: 无历史, 1230 → 1250
    env.register("M-B", 1230);

    // NORMAL: 无历史, 100 → 250
    env.register("M-C", 100);

    // OVERDUE: C@250 后停在 1000
    env.register("M-D", 1000);
    env.log("M-D", 250, "C");

    let alerts = env
        .state
        .maintenance_api
        .list_dashboard_alerts()
        .expect("查询失败");

    let order: Vec<(&str, AlertLevel)> = alerts
        .iter()
        .map(|s| (s.machine_id.as_str(), s.alert_level))
        .collect();

    assert_eq!(
        order,
        vec![
            ("M-D", AlertLevel::Overdue),
            ("M-B", AlertLevel::Urgent),
            ("M-A", AlertLevel::Upcoming),
        ]
    );
    assert_eq!(alerts[0].projection.skipped_intervals, 3);
    assert_eq!(alerts[0].projection.due_at_hours, 1250);
    assert_eq!(alerts[1].projection.hours_remaining, 20);
}

#[test]
fn test_dashboard_alerts_阈值配置() {
    let env = TestEnv::new().expect("无法创建测试环境");
    env.register("M-01", 100);

    assert!(env.state.maintenance_api.list_dashboard_alerts().unwrap().is_empty());

    env.state
        .config_manager
        .set_global_config_value(config_keys::ALERT_UPCOMING_HOURS, "200")
        .expect("写配置失败");

    let alerts = env.state.maintenance_api.list_dashboard_alerts().unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].alert_level, AlertLevel::Upcoming);

    // 不自洽的阈值回退到默认值
    env.state
        .config_manager
        .set_global_config_value(config_keys::ALERT_URGENT_HOURS, "500")
        .unwrap();
    assert!(env.state.maintenance_api.list_dashboard_alerts().unwrap().is_empty());
}

// ==========================================
// 边界校验
// ==========================================

#[test]
fn test_invalid_input_拒绝() {
    let env = TestEnv::new().expect("无法创建测试环境");
    env.register("M-01", 0);
    let api = &env.state.maintenance_api;

    let err = api
        .log_maintenance("M-01", -5, "C", date(2), vec![])
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(ref msg) if msg.contains("-5")));

    let err = api
        .log_maintenance("M-01", 250, "X", date(2), vec![])
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(ref msg) if msg.contains("X")));

    let err = api
        .log_maintenance("M-404", 250, "C", date(2), vec![])
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    // 小写范围可被接受
    assert!(api.log_maintenance("M-01", 250, " c ", date(2), vec![]).is_ok());

    let err = env
        .state
        .machine_api
        .register_machine("M-02", "压缩机", -1, None, None)
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
}

#[test]
fn test_service_hours_不可倒退() {
    let env = TestEnv::new().expect("无法创建测试环境");
    env.register("M-01", 500);

    let err = env
        .state
        .machine_api
        .update_service_hours("M-01", 400)
        .unwrap_err();
    assert!(matches!(err, ApiError::BusinessRuleViolation(_)));

    let machine = env.state.machine_api.update_service_hours("M-01", 500).unwrap();
    assert_eq!(machine.current_service_hours, 500);
}

#[test]
fn test_register_machine_重复() {
    let env = TestEnv::new().expect("无法创建测试环境");
    env.register("M-01", 0);

    let err = env
        .state
        .machine_api
        .register_machine("M-01", "另一台", 0, None, None)
        .unwrap_err();
    assert!(matches!(err, ApiError::BusinessRuleViolation(_)));
}

// ==========================================
// CSV 导入/导出
// ==========================================

fn write_csv(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".csv")
        .tempfile()
        .expect("无法创建临时 CSV");
    file.write_all(content.as_bytes()).expect("写入失败");
    file
}

#[test]
fn test_import_history_csv() {
    let env = TestEnv::new().expect("无法创建测试环境");
    env.register("M-01", 600);

    let csv = write_csv(
        "machine_id,service_hours,range,performed_on,filters_used\n\
         M-01,250,C,2025-01-10,FH-1;FA-2\n\
         M-01,500,D,2025-02-10,\n",
    );

    let count = env
        .state
        .maintenance_api
        .import_history_csv(csv.path())
        .expect("导入失败");
    assert_eq!(count, 2);

    let status = env.state.maintenance_api.get_next_maintenance("M-01").unwrap();
    assert_eq!(status.projection.next_range, MaintenanceRange::C);
    assert_eq!(status.projection.due_at_hours, 750);

    let rows = env.state.maintenance_api.list_history_with_next("M-01").unwrap();
    assert_eq!(rows[1].record.filters_used, vec!["FH-1", "FA-2"]);
}

#[test]
fn test_import_与_log_投影一致() {
    let env = TestEnv::new().expect("无法创建测试环境");
    env.register("M-IMP", 0);
    env.register("M-LOG", 0);

    let csv = write_csv(
        "machine_id,service_hours,range,performed_on,filters_used\n\
         M-IMP,250,C,2025-01-01,FH-1\n\
         M-IMP,500,D,2025-01-01,FH-1\n",
    );
    env.state
        .maintenance_api
        .import_history_csv(csv.path())
        .expect("导入失败");

    env.log("M-LOG", 250, "C");
    env.log("M-LOG", 500, "D");

    let imported = env.state.maintenance_api.get_next_maintenance("M-IMP").unwrap();
    let logged = env.state.maintenance_api.get_next_maintenance("M-LOG").unwrap();

    assert_eq!(imported.current_service_hours, 500);
    assert_eq!(imported.current_service_hours, logged.current_service_hours);
    assert_eq!(imported.projection, logged.projection);
    assert_eq!(imported.alert_level, logged.alert_level);
    assert_eq!(imported.projection.hours_remaining, 250);
}

#[test]
fn test_import_history_csv_不回退读数() {
    let env = TestEnv::new().expect("无法创建测试环境");
    env.register("M-01", 1_100);

    let csv = write_csv(
        "machine_id,service_hours,range,performed_on,filters_used\n\
         M-01,250,C,2025-01-10,\n\
         M-01,500,D,2025-02-10,\n",
    );
    env.state
        .maintenance_api
        .import_history_csv(csv.path())
        .expect("导入失败");

    let status = env.state.maintenance_api.get_next_maintenance("M-01").unwrap();
    assert_eq!(status.current_service_hours, 1_100);
    // 750/1000 两个节点被跳过
    assert_eq!(status.projection.skipped_intervals, 2);
    assert_eq!(status.projection.due_at_hours, 1_250);
    assert_eq!(status.alert_level, AlertLevel::Overdue);
}

#[test]
fn test_import_history_csv_未知机器整体拒绝() {
    let env = TestEnv::new().expect("无法创建测试环境");
    env.register("M-01", 600);

    let csv = write_csv(
        "machine_id,service_hours,range,performed_on,filters_used\n\
         M-01,250,C,2025-01-10,\n\
         M-99,500,D,2025-02-10,\n",
    );

    let err = env
        .state
        .maintenance_api
        .import_history_csv(csv.path())
        .unwrap_err();
    assert!(matches!(err, ApiError::ValidationError(ref msg) if msg.contains("M-99")));

    let rows = env.state.maintenance_api.list_history_with_next("M-01").unwrap();
    assert!(rows.is_empty());
    let machine = env.state.machine_api.get_machine("M-01").unwrap();
    assert_eq!(machine.current_service_hours, 600);
}

#[test]
fn test_export_history_csv() {
    let env = TestEnv::new().expect("无法创建测试环境");
    env.register("M-01", 0);
    env.log("M-01", 250, "C");

    let out = tempfile::Builder::new()
        .suffix(".csv")
        .tempfile()
        .expect("无法创建临时 CSV");

    let count = env
        .state
        .maintenance_api
        .export_history_csv(out.path())
        .expect("导出失败");
    assert_eq!(count, 1);

    let text = std::fs::read_to_string(out.path()).unwrap();
    assert!(text.starts_with("machine_id,service_hours,range,performed_on,filters_used"));
    assert!(text.contains("M-01,250,C,2025-01-01,FH-1"));
}

#[test]
fn test_export_history_csv_空库仍有表头() {
    let env = TestEnv::new().expect("无法创建测试环境");
    env.register("M-01", 0);

    let out = tempfile::Builder::new()
        .suffix(".csv")
        .tempfile()
        .expect("无法创建临时 CSV");

    let count = env
        .state
        .maintenance_api
        .export_history_csv(out.path())
        .expect("导出失败");
    assert_eq!(count, 0);

    let text = std::fs::read_to_string(out.path()).unwrap();
    assert_eq!(
        text.trim_end(),
        "machine_id,service_hours,range,performed_on,filters_used"
    );

    // 导出的空文件可被重新导入
    let imported = env
        .state
        .maintenance_api
        .import_history_csv(out.path())
        .expect("导入失败");
    assert_eq!(imported, 0);
}
