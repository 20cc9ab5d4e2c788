// ==========================================
// 施工材料预测系统 - 顺序库存分配模拟引擎
// ==========================================
// 职责: 按计划顺序遍历作业单元，从共享库存池逐个扣减，
//       输出每个 (作业单元, 材料) 的缺口、下单日与订货状态
// 输入: 计划抽取结果 + 消耗关联 + 材料/供应商 + 库存快照
// 输出: AllocationRun (分配步骤 + 诊断 + 期末库存池)
// ==========================================
// 红线:
// - 库存池永不为负；后序单元只能使用前序单元扣减后的剩余
// - 下单紧急度与瞬时缺口无关：库存已被前序单元占用时，
//   后序单元的点检查会"看似充足"，因此 DUE_SOON 单独标记
// - 输入缺陷只降级为诊断，永不中断
// ==========================================

use crate::domain::forecast::{AllocationResult, Diagnostic, MaterialOrderRow};
use crate::domain::material::{Material, StockLevel, Vendor};
use crate::domain::numeric::{round_to, shift_days};
use crate::domain::types::{DiagnosticKind, OrderStatus};
use crate::domain::work_unit::ConsumptionLink;
use crate::engine::delivery;
use crate::engine::lead_time::{LeadTimeCandidates, LeadTimeResolver};
use crate::engine::schedule::{links_by_activity, ScheduleExtraction, ScheduledWorkUnit};
use crate::engine::usage::{reorder_hint, UsageStats};
use crate::engine::vendor::VendorRecommender;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::instrument;

/// 数量比较容差
const QTY_EPSILON: f64 = 1e-9;

// ==========================================
// 订货状态判定
// ==========================================

/// 判定订货状态与看板标签
///
/// 顺序（命中即返回）:
/// 1) to_order_qty ≤ 0 → OK
/// 2) order_by 为空 → UNKNOWN
/// 3) order_by < today → LATE（days_late = today - order_by）
/// 4) order_by == today → DUE
/// 5) order_by ≤ today + due_soon_days → DUE_SOON
/// 6) 其他 → UPCOMING
pub fn classify_order_status(
    to_order_qty: f64,
    order_by: Option<NaiveDate>,
    today: NaiveDate,
    due_soon_days: i64,
) -> (OrderStatus, String) {
    if to_order_qty <= 0.0 {
        return (OrderStatus::Ok, "Stock OK".to_string());
    }

    let Some(order_by) = order_by else {
        return (OrderStatus::Unknown, "No start date".to_string());
    };

    if order_by < today {
        let days = (today - order_by).num_days();
        return (OrderStatus::Late, format!("Order Late by {}d", days));
    }

    if order_by == today {
        return (OrderStatus::Due, "Order Today".to_string());
    }

    let due_soon_limit = shift_days(today, due_soon_days.max(0));
    if due_soon_limit.map_or(true, |limit| order_by <= limit) {
        let days = (order_by - today).num_days();
        return (OrderStatus::DueSoon, format!("Order Due in {}d", days));
    }

    (OrderStatus::Upcoming, format!("Order by {}", order_by))
}

/// 下单日 = 需求日 - 提前期（日期越界时为空，按 UNKNOWN 处理）
pub fn order_by_date(need_date: Option<NaiveDate>, lead_time_days: i64) -> Option<NaiveDate> {
    need_date.and_then(|d| shift_days(d, -lead_time_days.max(0)))
}

/// 明细行说明: 开工 | 提前期 | 下单日 | 今天
pub fn explain_row(
    today: NaiveDate,
    start: Option<NaiveDate>,
    lead_time_days: i64,
    order_by: Option<NaiveDate>,
) -> String {
    let mut parts = Vec::with_capacity(4);
    if let Some(start) = start {
        parts.push(format!("Activity starts: {}", start));
    }
    parts.push(format!("Supply lead time: {}d", lead_time_days));
    if let Some(order_by) = order_by {
        parts.push(format!("Order-by date: {}", order_by));
    }
    parts.push(format!("Today: {}", today));
    parts.join(" | ")
}

// ==========================================
// StockPool - 共享库存池
// ==========================================
// 键: (作用域, 材料)；路段单元优先使用本路段库存，无则使用项目库存

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PoolScope {
    Project,
    Stretch(i64),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StockPool {
    levels: BTreeMap<(PoolScope, i64), f64>,
}

impl StockPool {
    /// 由库存快照初始化（仅活动行；同键累加；负数按 0）
    pub fn from_snapshot(stock: &[StockLevel]) -> Self {
        let mut levels = BTreeMap::new();
        for row in stock.iter().filter(|s| s.is_active) {
            let scope = match row.stretch_id {
                Some(sid) => PoolScope::Stretch(sid),
                None => PoolScope::Project,
            };
            *levels.entry((scope, row.material_id)).or_insert(0.0) +=
                row.quantity_available.max(0.0);
        }
        Self { levels }
    }

    fn scope_for(&self, stretch_id: Option<i64>, material_id: i64) -> PoolScope {
        match stretch_id {
            Some(sid) if self.levels.contains_key(&(PoolScope::Stretch(sid), material_id)) => {
                PoolScope::Stretch(sid)
            }
            _ => PoolScope::Project,
        }
    }

    /// 当前可用量（不扣减）
    pub fn available(&self, stretch_id: Option<i64>, material_id: i64) -> f64 {
        let scope = self.scope_for(stretch_id, material_id);
        self.levels.get(&(scope, material_id)).copied().unwrap_or(0.0)
    }

    /// 扣减: allocated = min(可用, 需求)
    ///
    /// # 返回
    /// (扣减前可用量, 实际分配量)
    pub fn draw(&mut self, stretch_id: Option<i64>, material_id: i64, required: f64) -> (f64, f64) {
        let scope = self.scope_for(stretch_id, material_id);
        let slot = self.levels.entry((scope, material_id)).or_insert(0.0);
        let before = *slot;
        let allocated = before.min(required.max(0.0));
        *slot = (before - allocated).max(0.0);
        (before, allocated)
    }

    /// 某作用域下的剩余量
    pub fn remaining(&self, scope: PoolScope, material_id: i64) -> f64 {
        self.levels.get(&(scope, material_id)).copied().unwrap_or(0.0)
    }
}

// ==========================================
// AllocationStep - 单步分配（含引用，便于组装明细行）
// ==========================================
#[derive(Debug, Clone)]
pub struct AllocationStep<'a> {
    pub scheduled: ScheduledWorkUnit<'a>,
    pub link: &'a ConsumptionLink,
    pub material: &'a Material,
    pub vendor: Option<&'a Vendor>,
    pub result: AllocationResult,
}

impl<'a> AllocationStep<'a> {
    /// 是否来自缺少开工日的单元
    pub fn is_undated(&self) -> bool {
        self.result.need_date.is_none()
    }

    /// 组装订货明细行
    pub fn to_order_row(
        &self,
        vendors: &VendorRecommender<'_>,
        usage: &UsageStats,
        today: NaiveDate,
        due_soon_days: i64,
    ) -> MaterialOrderRow {
        let r = &self.result;
        let unit = self.scheduled.unit;
        let material = self.material;

        let (status_kind, status_label) = if self.is_undated() {
            (OrderStatus::Unknown, "No start date".to_string())
        } else {
            classify_order_status(r.shortage_qty, r.order_by, today, due_soon_days)
        };

        let expected = delivery::expected_delivery(self.link.order_date, r.lead_time_days);
        let delivery = delivery::evaluate(r.need_date, self.link.order_date, expected, today);

        MaterialOrderRow {
            status_kind,
            status_label,
            order_by: r.order_by,
            lead_time_days: r.lead_time_days,
            lead_time_source: r.lead_time_source,
            explain: explain_row(today, r.need_date, r.lead_time_days, r.order_by),
            work_unit_id: unit.id,
            work_unit_code: unit.code.clone(),
            work_unit_name: unit.name.clone(),
            stretch_id: unit.stretch_id,
            work_unit_start: r.need_date,
            material_id: material.id,
            material_code: material.code.clone(),
            material_name: material.name.clone(),
            unit: material.unit.clone(),
            required_qty: round_to(r.required_qty, 3),
            available_qty: round_to(r.available_before, 3),
            allocated_qty: round_to(r.allocated_qty, 3),
            to_order_qty: round_to(r.shortage_qty, 3),
            order_due_soon: r.order_due_soon,
            vendor_options: vendors.options(material.id).to_vec(),
            recommended_vendor: vendors.recommend(self.vendor, material.id),
            avg_daily_usage: round_to(usage.avg_daily(material.id), 3),
            stock_days: usage.stock_days(material.id, r.available_before),
            reorder_hint: reorder_hint(r.available_before, r.required_qty, &material.unit),
            delivery,
        }
    }
}

// ==========================================
// AllocationRun - 模拟结果
// ==========================================
#[derive(Debug, Clone)]
pub struct AllocationRun<'a> {
    pub steps: Vec<AllocationStep<'a>>,
    pub diagnostics: Vec<Diagnostic>,
    pub final_pool: StockPool,
}

impl<'a> AllocationRun<'a> {
    /// 纯结果序列（去掉引用）
    pub fn results(&self) -> Vec<AllocationResult> {
        self.steps.iter().map(|s| s.result.clone()).collect()
    }
}

// ==========================================
// AllocationSimulator - 顺序分配模拟器
// ==========================================
pub struct AllocationSimulator {
    resolver: LeadTimeResolver,
}

impl AllocationSimulator {
    pub fn new() -> Self {
        Self {
            resolver: LeadTimeResolver::new(),
        }
    }

    /// 顺序分配模拟
    ///
    /// 伪代码:
    /// ```text
    /// for work_unit in schedule_order:
    ///     for (material, link) in work_unit 的消耗关联:
    ///         required  = 剩余计划量 × 消耗率
    ///         allocated = min(pool[material], required)
    ///         pool[material] -= allocated
    ///         shortage  = max(0, required - allocated)
    /// ```
    /// 缺少开工日的单元排在最后，不扣减库存，仅按当前剩余量估算缺口
    ///
    /// # 参数
    /// - `extraction`: 计划抽取结果（已排序）
    /// - `links`: 全部消耗关联
    /// - `materials`: 材料主数据
    /// - `vendors`: 供应商推荐器（用于查找指定供应商）
    /// - `stock`: 库存快照
    /// - `today` / `due_soon_days`: DUE_SOON 标记用
    #[instrument(skip_all, fields(dated = extraction.dated.len(), undated = extraction.undated.len()))]
    pub fn simulate<'a>(
        &self,
        extraction: &ScheduleExtraction<'a>,
        links: &'a [ConsumptionLink],
        materials: &'a [Material],
        vendors: &VendorRecommender<'a>,
        stock: &[StockLevel],
        today: NaiveDate,
        due_soon_days: i64,
    ) -> AllocationRun<'a> {
        let materials_by_id: BTreeMap<i64, &'a Material> =
            materials.iter().map(|m| (m.id, m)).collect();
        let links_by_activity = links_by_activity(links);
        let due_soon_limit = shift_days(today, due_soon_days.max(0));

        let mut pool = StockPool::from_snapshot(stock);
        let mut steps = Vec::new();
        let mut diagnostics = Vec::new();

        let ordered = extraction
            .dated
            .iter()
            .map(|s| (s, true))
            .chain(extraction.undated.iter().map(|s| (s, false)));

        for (scheduled, draws_stock) in ordered {
            let unit = scheduled.unit;
            if !draws_stock {
                diagnostics.push(Diagnostic {
                    kind: DiagnosticKind::IncompleteSchedule,
                    message: format!("work unit {} has no planned start date", unit.id),
                    work_unit_id: Some(unit.id),
                    material_id: None,
                    vendor_id: None,
                });
            }

            let Some(unit_links) = links_by_activity.get(&unit.activity_id) else {
                continue;
            };

            for link in unit_links.iter().copied() {
                let Some(material) = materials_by_id.get(&link.material_id).copied() else {
                    tracing::warn!(
                        work_unit_id = unit.id,
                        material_id = link.material_id,
                        "消耗关联引用的材料不存在，跳过"
                    );
                    diagnostics.push(Diagnostic {
                        kind: DiagnosticKind::MissingReferenceData,
                        message: format!(
                            "consumption link of activity {} references missing material {}",
                            link.activity_id, link.material_id
                        ),
                        work_unit_id: Some(unit.id),
                        material_id: Some(link.material_id),
                        vendor_id: None,
                    });
                    continue;
                };

                let vendor = match link.vendor_id {
                    Some(vid) => {
                        let found = vendors.vendor(vid);
                        if found.is_none() {
                            diagnostics.push(Diagnostic {
                                kind: DiagnosticKind::MissingReferenceData,
                                message: format!(
                                    "consumption link of activity {} references missing vendor {}",
                                    link.activity_id, vid
                                ),
                                work_unit_id: Some(unit.id),
                                material_id: Some(material.id),
                                vendor_id: Some(vid),
                            });
                        }
                        found
                    }
                    None => None,
                };

                let required = scheduled.required_for(link);
                if required <= 0.0 {
                    continue;
                }

                let candidates = LeadTimeCandidates::collect(link, vendor, material);
                for source in candidates.unparseable_sources() {
                    diagnostics.push(Diagnostic {
                        kind: DiagnosticKind::InvalidNumericInput,
                        message: format!(
                            "unparseable {} lead time for material {}, falling through",
                            source, material.id
                        ),
                        work_unit_id: Some(unit.id),
                        material_id: Some(material.id),
                        vendor_id: vendor.map(|v| v.id),
                    });
                }
                let (lead_time_days, lead_time_source) =
                    self.resolver.resolve_with_source(&candidates);

                let need_date = scheduled.start;
                let order_by = order_by_date(need_date, lead_time_days);

                let (available_before, allocated) = if draws_stock {
                    pool.draw(unit.stretch_id, material.id, required)
                } else {
                    (pool.available(unit.stretch_id, material.id), 0.0)
                };

                let mut shortage = (required - allocated).max(0.0);
                if !draws_stock {
                    shortage = (required - available_before).max(0.0);
                }
                if shortage < QTY_EPSILON {
                    shortage = 0.0;
                }

                let order_due_soon = order_by
                    .map_or(false, |ob| due_soon_limit.map_or(true, |limit| ob <= limit));

                if shortage > 0.0 {
                    tracing::debug!(
                        work_unit_id = unit.id,
                        material_id = material.id,
                        required,
                        allocated,
                        shortage,
                        "分配出现缺口"
                    );
                }

                steps.push(AllocationStep {
                    scheduled: *scheduled,
                    link,
                    material,
                    vendor,
                    result: AllocationResult {
                        work_unit_id: unit.id,
                        material_id: material.id,
                        required_qty: required,
                        available_before,
                        allocated_qty: allocated,
                        shortage_qty: shortage,
                        need_date,
                        order_by,
                        lead_time_days,
                        lead_time_source,
                        order_due_soon,
                    },
                });
            }
        }

        AllocationRun {
            steps,
            diagnostics,
            final_pool: pool,
        }
    }
}

impl Default for AllocationSimulator {
    fn default() -> Self {
        Self::new()
    }
}
