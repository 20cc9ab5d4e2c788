// ==========================================
// 施工材料预测系统 - 材料/供应商/库存领域模型
// ==========================================
// 用途: 外部仓储提供的只读快照，引擎不修改
// ==========================================

use crate::domain::numeric::{
    default_true, lenient_date, lenient_f64, lenient_opt_f64, lenient_raw_number, RawNumber,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// Material - 材料主数据
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    pub id: i64,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub unit: String, // 计量单位（t / m3 / bag ...）

    // ===== 提前期（新旧两套字段）=====
    #[serde(default, deserialize_with = "lenient_raw_number")]
    pub default_lead_time_days: Option<RawNumber>, // 新字段
    #[serde(default, deserialize_with = "lenient_raw_number")]
    pub lead_time_days: Option<RawNumber>, // 旧字段（兼容）

    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub unit_cost: Option<f64>,
}

// ==========================================
// Vendor - 供应商报价（按材料）
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vendor {
    pub id: i64,
    pub material_id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_raw_number")]
    pub lead_time_days: Option<RawNumber>, // 供应商目录提前期
    #[serde(default, deserialize_with = "lenient_raw_number")]
    pub project_lead_time_days: Option<RawNumber>, // 项目级覆写
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub unit_price: Option<f64>,
    #[serde(default)]
    pub priority: Option<String>, // 优先级档位（字典序，越小越优先）
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Vendor {
    /// 项目级提前期优先，其次目录提前期
    pub fn effective_lead_time(&self) -> Option<&RawNumber> {
        self.project_lead_time_days
            .as_ref()
            .filter(|v| v.as_days().is_some())
            .or(self.lead_time_days.as_ref())
    }
}

// ==========================================
// StockLevel - 库存快照
// ==========================================
// stretch_id 为空表示项目级库存池
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockLevel {
    pub material_id: i64,
    #[serde(default)]
    pub stretch_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub quantity_available: f64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

// ==========================================
// UsageRecord - 日消耗记录
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    pub material_id: i64,
    #[serde(default, deserialize_with = "lenient_date")]
    pub usage_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub quantity_used: f64,
}
