// ==========================================
// GestiFiltres - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{MachineApi, MaintenanceApi};
use crate::config::config_manager::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection, read_schema_version, CURRENT_SCHEMA_VERSION};
use crate::repository::machine_repo::MachineRepository;
use crate::repository::maintenance_repo::MaintenanceRecordRepository;

/// 应用状态
///
/// 包含所有API实例和共享资源, 所有仓储共享同一个连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 机器管理API
    pub machine_api: Arc<MachineApi>,

    /// 维保管理API
    pub maintenance_api: Arc<MaintenanceApi>,

    /// 配置管理器 (告警阈值)
    pub config_manager: Arc<ConfigManager>,

    /// 打开时读到的 schema 版本
    pub schema_version: Option<i64>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径 (":memory:" 亦可)
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开连接并建表 (幂等)
    /// 2. 初始化所有Repository
    /// 3. 创建所有API实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;

        let schema_version =
            read_schema_version(&conn).map_err(|e| format!("读取schema版本失败: {}", e))?;
        if schema_version != Some(CURRENT_SCHEMA_VERSION) {
            tracing::warn!(
                found = ?schema_version,
                expected = CURRENT_SCHEMA_VERSION,
                "数据库 schema 版本与当前程序不一致"
            );
        }

        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let machine_repo = Arc::new(MachineRepository::from_connection(conn.clone()));
        let record_repo = Arc::new(MaintenanceRecordRepository::from_connection(conn.clone()));
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| format!("无法初始化ConfigManager: {}", e))?,
        );

        // ==========================================
        // 初始化API层
        // ==========================================
        let machine_api = Arc::new(MachineApi::new(machine_repo.clone()));
        let maintenance_api = Arc::new(MaintenanceApi::new(
            machine_repo,
            record_repo,
            config_manager.clone(),
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            machine_api,
            maintenance_api,
            config_manager,
            schema_version,
        })
    }
}

/// 获取默认数据库路径
///
/// # 优先级
/// 1. 环境变量 GESTIFILTRES_DB_PATH
/// 2. 用户数据目录下的 gestifiltres/gestifiltres.db
/// 3. 当前目录 ./gestifiltres.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("GESTIFILTRES_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./gestifiltres.db");

    if let Some(data_dir) = dirs::data_dir() {
        // 开发环境使用独立目录，避免污染生产数据
        #[cfg(debug_assertions)]
        let dir = data_dir.join("gestifiltres-dev");

        #[cfg(not(debug_assertions))]
        let dir = data_dir.join("gestifiltres");

        // 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("gestifiltres.db");
        }
    }

    path.to_string_lossy().to_string()
}
