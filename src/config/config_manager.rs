// ==========================================
// 施工材料预测系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// 作用域: project/{id} 覆写优先，其次 global，最后代码默认值
// ==========================================

use crate::config::forecast_config::defaults;
use crate::config::forecast_config_trait::ForecastConfigReader;
use crate::db::open_sqlite_connection;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::BTreeMap;
use std::error::Error;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigScope - 配置作用域
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigScope {
    Global,                        // 全局
    Project { project_id: i64 },   // 项目
}

impl ConfigScope {
    /// config_kv.scope_id
    pub fn scope_id(&self) -> String {
        match self {
            ConfigScope::Global => "global".to_string(),
            ConfigScope::Project { project_id } => format!("project/{}", project_id),
        }
    }

    fn scope_type(&self) -> &'static str {
        match self {
            ConfigScope::Global => "GLOBAL",
            ConfigScope::Project { .. } => "PROJECT",
        }
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取指定作用域的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_scoped_value(
        &self,
        scope: ConfigScope,
        key: &str,
    ) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
            params![scope.scope_id(), key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取配置值：项目级覆写优先，其次 global
    fn get_config_value(
        &self,
        project_id: Option<i64>,
        key: &str,
    ) -> Result<Option<String>, Box<dyn Error>> {
        if let Some(project_id) = project_id {
            if let Some(value) = self.get_scoped_value(ConfigScope::Project { project_id }, key)? {
                return Ok(Some(value));
            }
        }
        self.get_scoped_value(ConfigScope::Global, key)
    }

    /// 读取并解析配置，缺失或格式错误时使用默认值
    fn get_parsed_or_default<T>(
        &self,
        project_id: Option<i64>,
        key: &str,
        default: T,
    ) -> Result<T, Box<dyn Error>>
    where
        T: FromStr + Copy,
    {
        let Some(raw) = self.get_config_value(project_id, key)? else {
            return Ok(default);
        };

        match raw.trim().parse::<T>() {
            Ok(value) => Ok(value),
            Err(_) => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %raw,
                    "配置值格式错误，使用默认值"
                );
                Ok(default)
            }
        }
    }

    /// 写入配置值（UPSERT），作用域不存在时自动登记
    pub fn set_config_value(
        &self,
        scope: ConfigScope,
        key: &str,
        value: &str,
    ) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let scope_id = scope.scope_id();

        conn.execute(
            "INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key) VALUES (?1, ?2, ?1)",
            params![scope_id, scope.scope_type()],
        )?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')",
            params![scope_id, key, value],
        )?;

        tracing::info!(scope_id = %scope_id, config_key = key, "配置已更新");
        Ok(())
    }

    /// 获取某作用域全部配置的快照（JSON格式，键有序）
    pub fn get_config_snapshot(&self, scope: ConfigScope) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;
        let rows = stmt.query_map(params![scope.scope_id()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }
}

// ==========================================
// ForecastConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ForecastConfigReader for ConfigManager {
    async fn get_lookahead_days(&self, project_id: Option<i64>) -> Result<i64, Box<dyn Error>> {
        self.get_parsed_or_default(project_id, config_keys::LOOKAHEAD_DAYS, defaults::LOOKAHEAD_DAYS)
    }

    async fn get_due_soon_days(&self, project_id: Option<i64>) -> Result<i64, Box<dyn Error>> {
        self.get_parsed_or_default(project_id, config_keys::DUE_SOON_DAYS, defaults::DUE_SOON_DAYS)
    }

    async fn get_max_rows(&self, project_id: Option<i64>) -> Result<usize, Box<dyn Error>> {
        self.get_parsed_or_default(project_id, config_keys::MAX_ROWS, defaults::MAX_ROWS)
    }

    async fn get_usage_window_days(&self, project_id: Option<i64>) -> Result<i64, Box<dyn Error>> {
        self.get_parsed_or_default(
            project_id,
            config_keys::USAGE_WINDOW_DAYS,
            defaults::USAGE_WINDOW_DAYS,
        )
    }

    async fn get_snapshot_window_days(
        &self,
        project_id: Option<i64>,
    ) -> Result<i64, Box<dyn Error>> {
        self.get_parsed_or_default(
            project_id,
            config_keys::SNAPSHOT_WINDOW_DAYS,
            defaults::SNAPSHOT_WINDOW_DAYS,
        )
    }

    async fn get_snapshot_max_rows(
        &self,
        project_id: Option<i64>,
    ) -> Result<usize, Box<dyn Error>> {
        self.get_parsed_or_default(
            project_id,
            config_keys::SNAPSHOT_MAX_ROWS,
            defaults::SNAPSHOT_MAX_ROWS,
        )
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 时间窗口
    pub const LOOKAHEAD_DAYS: &str = "forecast_lookahead_days";
    pub const DUE_SOON_DAYS: &str = "forecast_due_soon_days";
    pub const USAGE_WINDOW_DAYS: &str = "forecast_usage_window_days";
    pub const SNAPSHOT_WINDOW_DAYS: &str = "forecast_snapshot_window_days";

    // 输出上限
    pub const MAX_ROWS: &str = "forecast_max_rows";
    pub const SNAPSHOT_MAX_ROWS: &str = "forecast_snapshot_max_rows";
}
