// ==========================================
// 施工材料预测系统 - 领域层
// ==========================================
// 职责: 定义实体与值类型，不含业务规则
// ==========================================

pub mod forecast;
pub mod material;
pub mod numeric;
pub mod types;
pub mod work_unit;

// 重导出核心实体
pub use forecast::{
    Alert, AllocationResult, CriticalWorkUnit, DeliveryCheck, Diagnostic, ForecastInput,
    ForecastOutput, MaterialOrderRow, SnapshotRow, StretchCard, UpcomingWorkUnit, VendorOption,
};
pub use material::{Material, StockLevel, UsageRecord, Vendor};
pub use numeric::RawNumber;
pub use work_unit::{ConsumptionLink, Stretch, WorkUnit};
