// ==========================================
// 施工材料预测系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发读写时的偶发 busy 错误
// - 提供读模型建表（测试与命令行使用）
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 默认数据库路径
///
/// # 返回
/// - 环境变量 MATERIAL_FORECAST_DB_PATH（非空时）
/// - 否则: 用户数据目录/material-forecast-aps/material_forecast.db
/// - 取不到用户数据目录时: ./material_forecast.db
pub fn default_db_path() -> String {
    if let Ok(path) = std::env::var("MATERIAL_FORECAST_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    match dirs::data_dir() {
        Some(data_dir) => data_dir
            .join("material-forecast-aps")
            .join("material_forecast.db")
            .to_string_lossy()
            .to_string(),
        None => "./material_forecast.db".to_string(),
    }
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 初始化读模型 schema（幂等）
///
/// 说明：
/// - 数值列（提前期、数量、消耗率）不声明类型，保留录入时的原始值，
///   由仓储层做宽松解析
/// - 日期列统一为 TEXT (YYYY-MM-DD)
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_scope (
            scope_id TEXT PRIMARY KEY,
            scope_type TEXT NOT NULL,
            scope_key TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(scope_type, scope_key)
        );

        INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key)
        VALUES ('global', 'GLOBAL', 'global');

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL REFERENCES config_scope(scope_id) ON DELETE CASCADE,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS project (
            project_id INTEGER PRIMARY KEY,
            project_name TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS material (
            material_id INTEGER PRIMARY KEY,
            project_id INTEGER NOT NULL,
            code TEXT NOT NULL DEFAULT '',
            name TEXT NOT NULL DEFAULT '',
            unit TEXT NOT NULL DEFAULT '',
            default_lead_time_days,
            lead_time_days,
            unit_cost
        );

        CREATE TABLE IF NOT EXISTS material_vendor (
            vendor_id INTEGER PRIMARY KEY,
            project_id INTEGER NOT NULL,
            material_id INTEGER NOT NULL,
            vendor_name TEXT NOT NULL DEFAULT '',
            lead_time_days,
            project_lead_time_days,
            unit_price,
            priority TEXT,
            is_active INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS road_stretch (
            stretch_id INTEGER PRIMARY KEY,
            project_id INTEGER NOT NULL,
            stretch_code TEXT NOT NULL DEFAULT '',
            stretch_name TEXT NOT NULL DEFAULT '',
            sequence_no INTEGER NOT NULL DEFAULT 0,
            start_chainage TEXT NOT NULL DEFAULT '',
            end_chainage TEXT NOT NULL DEFAULT '',
            length_m,
            is_active INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS work_unit (
            work_unit_id INTEGER PRIMARY KEY,
            project_id INTEGER NOT NULL,
            activity_id INTEGER NOT NULL,
            stretch_id INTEGER,
            code TEXT NOT NULL DEFAULT '',
            name TEXT NOT NULL DEFAULT '',
            planned_quantity,
            planned_start TEXT,
            planned_end TEXT,
            progress_percent,
            is_active INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS activity_material (
            link_id INTEGER PRIMARY KEY,
            project_id INTEGER NOT NULL,
            activity_id INTEGER NOT NULL,
            material_id INTEGER NOT NULL,
            consumption_rate,
            vendor_id INTEGER,
            lead_time_days_override,
            order_date TEXT
        );

        CREATE TABLE IF NOT EXISTS material_stock (
            stock_id INTEGER PRIMARY KEY,
            project_id INTEGER NOT NULL,
            material_id INTEGER NOT NULL,
            stretch_id INTEGER,
            quantity_available,
            is_active INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS material_usage (
            usage_id INTEGER PRIMARY KEY,
            project_id INTEGER NOT NULL,
            material_id INTEGER NOT NULL,
            usage_date TEXT,
            quantity_used
        );

        CREATE INDEX IF NOT EXISTS idx_work_unit_project ON work_unit(project_id);
        CREATE INDEX IF NOT EXISTS idx_activity_material_project ON activity_material(project_id);
        CREATE INDEX IF NOT EXISTS idx_material_usage_project_date
            ON material_usage(project_id, usage_date);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}
