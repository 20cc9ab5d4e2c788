// ==========================================
// 施工材料预测系统 - 引擎层
// ==========================================
// 职责: 实现预测与分配规则，不拼 SQL，不做 I/O
// 红线: 输入缺陷降级为诊断，任何输入都不 panic
// ==========================================

pub mod alerts;
pub mod allocation;
pub mod delivery;
pub mod lead_time;
pub mod orchestrator;
pub mod schedule;
pub mod stretch;
pub mod usage;
pub mod vendor;

// 重导出核心引擎
pub use alerts::{AggregatedAlerts, AlertAggregator};
pub use allocation::{
    classify_order_status, AllocationRun, AllocationSimulator, AllocationStep, PoolScope,
    StockPool,
};
pub use lead_time::{resolve_effective_lead_time, LeadTimeCandidates, LeadTimeResolver};
pub use orchestrator::ForecastEngine;
pub use schedule::{ScheduleExtraction, ScheduleExtractor, ScheduledWorkUnit};
pub use stretch::{StretchEvaluation, StretchEvaluator};
pub use usage::UsageStats;
pub use vendor::VendorRecommender;
