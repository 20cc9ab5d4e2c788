// ==========================================
// 施工材料预测系统 - 配置层
// ==========================================
// 职责: 预测参数管理，支持项目级覆写
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod forecast_config;
pub mod forecast_config_trait;

// 重导出核心配置
pub use config_manager::{config_keys, ConfigManager, ConfigScope};
pub use forecast_config::ForecastConfig;
pub use forecast_config_trait::ForecastConfigReader;
