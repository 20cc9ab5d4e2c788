// ==========================================
// 施工材料预测系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 决策支持系统（给出订货建议，不自动下单）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 只读快照
pub mod repository;

// 引擎层 - 预测与分配规则
pub mod engine;

// 配置层 - 预测参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    AlertKind, AlertSeverity, DeliveryStatus, DiagnosticKind, LeadTimeSource, MaterialRisk,
    OrderStatus, StretchStatus,
};

// 领域实体
pub use domain::{
    Alert, AllocationResult, ConsumptionLink, Diagnostic, ForecastInput, ForecastOutput,
    Material, MaterialOrderRow, SnapshotRow, StockLevel, Stretch, StretchCard, UsageRecord,
    Vendor, WorkUnit,
};

// 引擎
pub use engine::{
    AlertAggregator, AllocationSimulator, ForecastEngine, LeadTimeResolver, ScheduleExtractor,
    StretchEvaluator, VendorRecommender,
};

// 配置
pub use config::{ConfigManager, ForecastConfig, ForecastConfigReader};

// API
pub use api::{ApiError, ForecastApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "施工材料预测系统";
