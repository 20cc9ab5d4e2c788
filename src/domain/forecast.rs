// ==========================================
// 施工材料预测系统 - 预测输入/输出契约
// ==========================================
// 输入: 一次调用所需的全部只读快照
// 输出: 前瞻作业、订货明细、采购快照、路段卡片、告警、诊断
// 红线: 输出只含 Vec（有序），保证同输入逐字节一致
// ==========================================

use crate::config::ForecastConfig;
use crate::domain::material::{Material, StockLevel, UsageRecord, Vendor};
use crate::domain::types::{
    AlertKind, AlertSeverity, DeliveryStatus, DiagnosticKind, LeadTimeSource, MaterialRisk,
    OrderStatus, StretchStatus,
};
use crate::domain::work_unit::{ConsumptionLink, Stretch, WorkUnit};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// ForecastInput - 引擎输入
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastInput {
    pub today: NaiveDate,
    #[serde(flatten, default)]
    pub config: ForecastConfig,
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(default)]
    pub vendors: Vec<Vendor>,
    #[serde(default)]
    pub work_units: Vec<WorkUnit>,
    #[serde(default)]
    pub consumption_links: Vec<ConsumptionLink>,
    #[serde(default)]
    pub stock: Vec<StockLevel>,
    #[serde(default)]
    pub usage_history: Vec<UsageRecord>,
    #[serde(default)]
    pub stretches: Vec<Stretch>,
}

impl ForecastInput {
    /// 空快照（仅日期与参数）
    pub fn empty(today: NaiveDate, config: ForecastConfig) -> Self {
        Self {
            today,
            config,
            materials: Vec::new(),
            vendors: Vec::new(),
            work_units: Vec::new(),
            consumption_links: Vec::new(),
            stock: Vec::new(),
            usage_history: Vec::new(),
            stretches: Vec::new(),
        }
    }
}

// ==========================================
// 前瞻作业单元
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpcomingWorkUnit {
    pub work_unit_id: i64,
    pub activity_id: i64,
    pub stretch_id: Option<i64>,
    pub code: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub progress_percent: i32,
    pub remaining_factor: f64,
    pub remaining_quantity: f64,
}

// ==========================================
// AllocationResult - 顺序分配单步结果
// ==========================================
// 每个 (作业单元, 材料) 一条；need_date 为空表示缺少开工日期
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationResult {
    pub work_unit_id: i64,
    pub material_id: i64,
    pub required_qty: f64,
    pub available_before: f64, // 前序单元扣减后的剩余库存
    pub allocated_qty: f64,
    pub shortage_qty: f64,
    pub need_date: Option<NaiveDate>,
    pub order_by: Option<NaiveDate>,
    pub lead_time_days: i64,
    pub lead_time_source: LeadTimeSource,
    pub order_due_soon: bool, // 下单日落在 today+due_soon_days 以内（与缺口无关）
}

// ==========================================
// 供应商选项
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorOption {
    pub vendor_id: i64,
    pub vendor_name: String,
    pub lead_time_days: i64,
    pub unit_price: Option<f64>,
    pub priority: Option<String>,
}

// ==========================================
// 到货风险判定结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryCheck {
    pub expected_delivery: Option<NaiveDate>,
    pub is_risk: bool,
    pub days_late: i64,
    pub status: DeliveryStatus,
}

// ==========================================
// 订货明细行 (按 作业单元 × 材料)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialOrderRow {
    pub status_kind: OrderStatus,
    pub status_label: String,
    pub order_by: Option<NaiveDate>,
    pub lead_time_days: i64,
    pub lead_time_source: LeadTimeSource,
    pub explain: String,

    // ===== 作业单元 =====
    pub work_unit_id: i64,
    pub work_unit_code: String,
    pub work_unit_name: String,
    pub stretch_id: Option<i64>,
    pub work_unit_start: Option<NaiveDate>,

    // ===== 材料 =====
    pub material_id: i64,
    pub material_code: String,
    pub material_name: String,
    pub unit: String,

    // ===== 数量 =====
    pub required_qty: f64,
    pub available_qty: f64,
    pub allocated_qty: f64,
    pub to_order_qty: f64,
    pub order_due_soon: bool,

    // ===== 供应商 =====
    pub vendor_options: Vec<VendorOption>,
    pub recommended_vendor: Option<VendorOption>,

    // ===== 消耗与到货 =====
    pub avg_daily_usage: f64,
    pub stock_days: Option<f64>,
    pub reorder_hint: Option<String>,
    pub delivery: DeliveryCheck,
}

// ==========================================
// 采购快照行 (按材料聚合)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRow {
    pub material_id: i64,
    pub material_code: String,
    pub material_name: String,
    pub unit: String,
    pub total_to_order_qty: f64,
    pub earliest_order_by: Option<NaiveDate>,
    pub status_kind: OrderStatus,
    pub status_label: String,
}

// ==========================================
// 路段卡片
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalWorkUnit {
    pub work_unit_id: i64,
    pub code: String,
    pub name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub progress_percent: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StretchCard {
    pub stretch_id: i64,
    pub stretch_code: String,
    pub stretch_name: String,
    pub chainage: String,
    pub length_m: f64,
    pub planned_start: Option<NaiveDate>,
    pub planned_end: Option<NaiveDate>,
    pub planned_progress: Option<i32>,
    pub actual_progress: i32,
    pub status_kind: StretchStatus,
    pub status_label: String,
    pub critical_work_unit: Option<CriticalWorkUnit>,
    pub material_risk_kind: MaterialRisk,
    pub material_risk_label: String,
    pub shortage_count: usize,
}

// ==========================================
// 告警
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub title: String,
    pub detail: String,
    pub date: Option<NaiveDate>,
    pub stretch_id: Option<i64>,
    pub stretch_code: Option<String>,
    pub work_unit_id: Option<i64>,
    pub material_id: Option<i64>,
}

// ==========================================
// 诊断（输入数据问题）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub work_unit_id: Option<i64>,
    pub material_id: Option<i64>,
    pub vendor_id: Option<i64>,
}

// ==========================================
// ForecastOutput - 引擎输出
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastOutput {
    pub today: NaiveDate,
    pub next_work_unit: Option<UpcomingWorkUnit>,
    pub upcoming_work_units: Vec<UpcomingWorkUnit>,
    pub material_orders: Vec<MaterialOrderRow>,
    pub procurement_snapshot: Vec<SnapshotRow>,
    pub warnings_count: usize,
    pub has_stretches: bool,
    pub total_length_m: f64,
    pub stretch_cards: Vec<StretchCard>,
    pub alerts: Vec<Alert>,
    pub diagnostics: Vec<Diagnostic>,
    pub config: ForecastConfig,
}
