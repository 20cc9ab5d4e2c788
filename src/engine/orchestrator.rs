// ==========================================
// 施工材料预测系统 - 引擎编排器
// ==========================================
// 用途: 协调各引擎的执行顺序，输出一次完整预测
// 流程: 计划抽取 → 顺序分配(提前期/到货风险) → 供应商推荐
//       → 路段评估 → 告警汇总
// ==========================================
// 红线:
// - 纯计算: 不做 I/O，不加锁，同输入逐字节一致
// - 不预留库存: 针对同一库存池的并发调用各自假定整池可用
// ==========================================

use crate::config::forecast_config::defaults;
use crate::domain::forecast::{ForecastInput, ForecastOutput};
use crate::engine::alerts::AlertAggregator;
use crate::engine::allocation::AllocationSimulator;
use crate::engine::schedule::ScheduleExtractor;
use crate::engine::stretch::StretchEvaluator;
use crate::engine::usage::UsageStats;
use crate::engine::vendor::VendorRecommender;
use tracing::{debug, info, info_span};

// ==========================================
// ForecastEngine - 预测编排器
// ==========================================
pub struct ForecastEngine {
    extractor: ScheduleExtractor,
    simulator: AllocationSimulator,
    stretches: StretchEvaluator,
    aggregator: AlertAggregator,
}

impl ForecastEngine {
    pub fn new() -> Self {
        Self {
            extractor: ScheduleExtractor::new(),
            simulator: AllocationSimulator::new(),
            stretches: StretchEvaluator::new(),
            aggregator: AlertAggregator::new(),
        }
    }

    /// 执行一次完整预测
    ///
    /// # 参数
    /// - input: 一个项目的只读快照（调用方负责快照一致性）
    ///
    /// # 返回
    /// 预测输出；输入缺陷只体现为诊断，不会失败
    pub fn run(&self, input: &ForecastInput) -> ForecastOutput {
        let span = info_span!(
            "forecast_run",
            today = %input.today,
            work_units = input.work_units.len(),
            materials = input.materials.len(),
            links = input.consumption_links.len(),
        );
        let _guard = span.enter();

        let config = input.config.normalized();
        let today = input.today;

        // ==========================================
        // 步骤1: 计划抽取
        // ==========================================
        let extraction = self
            .extractor
            .extract(&input.work_units, today, config.lookahead_days);
        let mut upcoming = extraction.upcoming();
        let next_work_unit = upcoming.first().cloned();
        upcoming.truncate(defaults::UPCOMING_MAX_ROWS);

        // ==========================================
        // 步骤2: 顺序分配模拟
        // ==========================================
        let vendors = VendorRecommender::new(&input.vendors);
        let run = self.simulator.simulate(
            &extraction,
            &input.consumption_links,
            &input.materials,
            &vendors,
            &input.stock,
            today,
            config.due_soon_days,
        );
        debug!(
            steps = run.steps.len(),
            diagnostics = run.diagnostics.len(),
            "分配模拟完成"
        );

        // ==========================================
        // 步骤3: 订货明细（供应商推荐 + 消耗统计 + 到货风险）
        // ==========================================
        let usage = UsageStats::from_history(&input.usage_history, today, config.usage_window_days);
        let rows = run
            .steps
            .iter()
            .map(|step| step.to_order_row(&vendors, &usage, today, config.due_soon_days))
            .collect();

        // ==========================================
        // 步骤4: 路段评估
        // ==========================================
        let stretch_eval =
            self.stretches
                .evaluate(&input.stretches, &input.work_units, &run.steps, today);
        let has_stretches = !stretch_eval.cards.is_empty();

        // ==========================================
        // 步骤5: 告警汇总
        // ==========================================
        let aggregated = self.aggregator.aggregate(
            rows,
            stretch_eval.alerts,
            &input.stretches,
            today,
            &config,
        );

        info!(
            orders = aggregated.material_orders.len(),
            warnings = aggregated.warnings_count,
            alerts = aggregated.alerts.len(),
            diagnostics = run.diagnostics.len(),
            "预测完成"
        );

        ForecastOutput {
            today,
            next_work_unit,
            upcoming_work_units: upcoming,
            material_orders: aggregated.material_orders,
            procurement_snapshot: aggregated.procurement_snapshot,
            warnings_count: aggregated.warnings_count,
            has_stretches,
            total_length_m: stretch_eval.total_length_m,
            stretch_cards: stretch_eval.cards,
            alerts: aggregated.alerts,
            diagnostics: run.diagnostics,
            config,
        }
    }
}

impl Default for ForecastEngine {
    fn default() -> Self {
        Self::new()
    }
}
