// ==========================================
// 施工材料预测系统 - 项目快照数据仓储（只读）
// ==========================================
// 红线: Repository 不含业务逻辑，只读不写
// ==========================================
// 职责: 一次性读取某项目的材料/供应商/作业单元/消耗关联/
//       库存/消耗记录/路段，组装为引擎输入
// 约束: 数值列按 SQLite 原始值读取，再做宽松解析（无法解析 → 默认值）
// ==========================================

use crate::config::ForecastConfig;
use crate::db::{open_sqlite_connection, read_schema_version, CURRENT_SCHEMA_VERSION};
use crate::domain::forecast::ForecastInput;
use crate::domain::material::{Material, StockLevel, UsageRecord, Vendor};
use crate::domain::numeric::{parse_date, shift_days, RawNumber};
use crate::domain::work_unit::{ConsumptionLink, Stretch, WorkUnit};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};
use tracing::instrument;

// ==========================================
// 宽松取值
// ==========================================

/// SQLite 原始值 → RawNumber（空串/NULL/BLOB 视为缺失）
fn raw_number(value: Value) -> Option<RawNumber> {
    match value {
        Value::Integer(i) => Some(RawNumber::Int(i)),
        Value::Real(f) => Some(RawNumber::Float(f)),
        Value::Text(s) if !s.trim().is_empty() => Some(RawNumber::Text(s)),
        _ => None,
    }
}

fn loose_opt_f64(value: Value) -> Option<f64> {
    raw_number(value).and_then(|n| n.as_f64())
}

fn loose_f64(value: Value) -> f64 {
    loose_opt_f64(value).unwrap_or(0.0)
}

fn loose_date(value: Option<String>) -> Option<NaiveDate> {
    value.as_deref().and_then(parse_date)
}

// ==========================================
// ProjectSnapshotRepository - 项目快照仓储
// ==========================================
/// 项目快照仓储
/// 用途: API 层在一次读取中取得一致快照后交给引擎
pub struct ProjectSnapshotRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProjectSnapshotRepository {
    /// 创建新的 ProjectSnapshotRepository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        match read_schema_version(&conn)? {
            Some(v) if v == CURRENT_SCHEMA_VERSION => {}
            other => tracing::warn!(
                expected = CURRENT_SCHEMA_VERSION,
                actual = ?other,
                "schema_version 与代码不一致，继续以只读方式运行"
            ),
        }

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 项目是否存在
    pub fn project_exists(&self, project_id: i64) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM project WHERE project_id = ?1",
                params![project_id],
                |_row| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        Ok(found)
    }

    /// 组装引擎输入
    ///
    /// # 参数
    /// - project_id: 项目ID
    /// - today: 评估日期（消耗记录只取统计窗口内）
    /// - config: 预测参数（原样带入输入）
    ///
    /// # 返回
    /// - Err(NotFound): 项目不存在
    #[instrument(skip(self, config))]
    pub fn load_forecast_input(
        &self,
        project_id: i64,
        today: NaiveDate,
        config: ForecastConfig,
    ) -> RepositoryResult<ForecastInput> {
        if !self.project_exists(project_id)? {
            return Err(RepositoryError::NotFound {
                entity: "project".to_string(),
                id: project_id.to_string(),
            });
        }

        let usage_since =
            shift_days(today, -config.usage_window_days.max(1)).unwrap_or(NaiveDate::MIN);
        let input = ForecastInput {
            today,
            config,
            materials: self.list_materials(project_id)?,
            vendors: self.list_vendors(project_id)?,
            work_units: self.list_work_units(project_id)?,
            consumption_links: self.list_consumption_links(project_id)?,
            stock: self.list_stock(project_id)?,
            usage_history: self.list_usage_since(project_id, usage_since)?,
            stretches: self.list_stretches(project_id)?,
        };

        tracing::debug!(
            materials = input.materials.len(),
            work_units = input.work_units.len(),
            links = input.consumption_links.len(),
            stock = input.stock.len(),
            "项目快照读取完成"
        );
        Ok(input)
    }

    /// 材料主数据
    pub fn list_materials(&self, project_id: i64) -> RepositoryResult<Vec<Material>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT material_id, code, name, unit,
                   default_lead_time_days, lead_time_days, unit_cost
            FROM material
            WHERE project_id = ?1
            ORDER BY material_id
            "#,
        )?;

        let rows = stmt.query_map(params![project_id], |row| {
            Ok(Material {
                id: row.get(0)?,
                code: row.get(1)?,
                name: row.get(2)?,
                unit: row.get(3)?,
                default_lead_time_days: raw_number(row.get(4)?),
                lead_time_days: raw_number(row.get(5)?),
                unit_cost: loose_opt_f64(row.get(6)?),
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// 供应商（含停用，由引擎过滤）
    pub fn list_vendors(&self, project_id: i64) -> RepositoryResult<Vec<Vendor>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT vendor_id, material_id, vendor_name, lead_time_days,
                   project_lead_time_days, unit_price, priority, is_active
            FROM material_vendor
            WHERE project_id = ?1
            ORDER BY vendor_id
            "#,
        )?;

        let rows = stmt.query_map(params![project_id], |row| {
            Ok(Vendor {
                id: row.get(0)?,
                material_id: row.get(1)?,
                name: row.get(2)?,
                lead_time_days: raw_number(row.get(3)?),
                project_lead_time_days: raw_number(row.get(4)?),
                unit_price: loose_opt_f64(row.get(5)?),
                priority: row.get(6)?,
                is_active: row.get::<_, i64>(7)? != 0,
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// 作业单元
    pub fn list_work_units(&self, project_id: i64) -> RepositoryResult<Vec<WorkUnit>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT work_unit_id, activity_id, stretch_id, code, name,
                   planned_quantity, planned_start, planned_end, progress_percent, is_active
            FROM work_unit
            WHERE project_id = ?1
            ORDER BY work_unit_id
            "#,
        )?;

        let rows = stmt.query_map(params![project_id], |row| {
            Ok(WorkUnit {
                id: row.get(0)?,
                activity_id: row.get(1)?,
                stretch_id: row.get(2)?,
                code: row.get(3)?,
                name: row.get(4)?,
                planned_quantity: loose_f64(row.get(5)?),
                planned_start: loose_date(row.get(6)?),
                planned_end: loose_date(row.get(7)?),
                progress_percent: loose_f64(row.get(8)?),
                is_active: row.get::<_, i64>(9)? != 0,
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// 工序-材料消耗关联
    pub fn list_consumption_links(&self, project_id: i64) -> RepositoryResult<Vec<ConsumptionLink>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT activity_id, material_id, consumption_rate, vendor_id,
                   lead_time_days_override, order_date
            FROM activity_material
            WHERE project_id = ?1
            ORDER BY activity_id, material_id, link_id
            "#,
        )?;

        let rows = stmt.query_map(params![project_id], |row| {
            Ok(ConsumptionLink {
                activity_id: row.get(0)?,
                material_id: row.get(1)?,
                consumption_rate: loose_f64(row.get(2)?),
                vendor_id: row.get(3)?,
                lead_time_days_override: raw_number(row.get(4)?),
                order_date: loose_date(row.get(5)?),
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// 库存快照（项目级 + 路段级）
    pub fn list_stock(&self, project_id: i64) -> RepositoryResult<Vec<StockLevel>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT material_id, stretch_id, quantity_available, is_active
            FROM material_stock
            WHERE project_id = ?1
            ORDER BY stock_id
            "#,
        )?;

        let rows = stmt.query_map(params![project_id], |row| {
            Ok(StockLevel {
                material_id: row.get(0)?,
                stretch_id: row.get(1)?,
                quantity_available: loose_f64(row.get(2)?),
                is_active: row.get::<_, i64>(3)? != 0,
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// 某日期以来的消耗记录
    pub fn list_usage_since(
        &self,
        project_id: i64,
        since: NaiveDate,
    ) -> RepositoryResult<Vec<UsageRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT material_id, usage_date, quantity_used
            FROM material_usage
            WHERE project_id = ?1 AND usage_date >= ?2
            ORDER BY usage_date, usage_id
            "#,
        )?;

        let rows = stmt.query_map(params![project_id, since.to_string()], |row| {
            Ok(UsageRecord {
                material_id: row.get(0)?,
                usage_date: loose_date(row.get(1)?),
                quantity_used: loose_f64(row.get(2)?),
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// 路段
    pub fn list_stretches(&self, project_id: i64) -> RepositoryResult<Vec<Stretch>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT stretch_id, stretch_code, stretch_name, sequence_no,
                   start_chainage, end_chainage, length_m, is_active
            FROM road_stretch
            WHERE project_id = ?1
            ORDER BY sequence_no, stretch_id
            "#,
        )?;

        let rows = stmt.query_map(params![project_id], |row| {
            Ok(Stretch {
                id: row.get(0)?,
                code: row.get(1)?,
                name: row.get(2)?,
                sequence_no: row.get(3)?,
                start_chainage: row.get(4)?,
                end_chainage: row.get(5)?,
                length_m: loose_f64(row.get(6)?),
                is_active: row.get::<_, i64>(7)? != 0,
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_number_from_sqlite_values() {
        assert_eq!(raw_number(Value::Integer(5)), Some(RawNumber::Int(5)));
        assert_eq!(raw_number(Value::Real(2.5)), Some(RawNumber::Float(2.5)));
        assert_eq!(
            raw_number(Value::Text("7".to_string())),
            Some(RawNumber::Text("7".to_string()))
        );
        assert_eq!(raw_number(Value::Text("  ".to_string())), None);
        assert_eq!(raw_number(Value::Null), None);
        assert_eq!(loose_f64(Value::Text("abc".to_string())), 0.0);
    }
}
