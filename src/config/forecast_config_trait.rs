// ==========================================
// 施工材料预测系统 - 预测配置读取 Trait
// ==========================================
// 职责: 定义预测引擎所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::forecast_config::ForecastConfig;
use async_trait::async_trait;
use std::error::Error;

// ==========================================
// ForecastConfigReader Trait
// ==========================================
// 用途: API 层在调用引擎前读取参数
// 实现者: ConfigManager（从 config_kv 表读取，项目级覆写优先）
#[async_trait]
pub trait ForecastConfigReader: Send + Sync {
    /// 前瞻窗口（天）
    ///
    /// # 默认值
    /// - 30
    async fn get_lookahead_days(&self, project_id: Option<i64>) -> Result<i64, Box<dyn Error>>;

    /// 临近下单阈值（天）
    ///
    /// # 默认值
    /// - 7
    async fn get_due_soon_days(&self, project_id: Option<i64>) -> Result<i64, Box<dyn Error>>;

    /// 订货明细输出上限
    ///
    /// # 默认值
    /// - 30
    async fn get_max_rows(&self, project_id: Option<i64>) -> Result<usize, Box<dyn Error>>;

    /// 日均消耗统计窗口（天），默认 14
    async fn get_usage_window_days(&self, project_id: Option<i64>) -> Result<i64, Box<dyn Error>>;

    /// 采购快照窗口（天），默认 7
    async fn get_snapshot_window_days(
        &self,
        project_id: Option<i64>,
    ) -> Result<i64, Box<dyn Error>>;

    /// 采购快照上限，默认 8
    async fn get_snapshot_max_rows(&self, project_id: Option<i64>)
        -> Result<usize, Box<dyn Error>>;

    /// 组装完整参数（已规范化）
    async fn load_forecast_config(
        &self,
        project_id: Option<i64>,
    ) -> Result<ForecastConfig, Box<dyn Error>> {
        let lookahead_days = self.get_lookahead_days(project_id).await?;
        let due_soon_days = self.get_due_soon_days(project_id).await?;
        let max_rows = self.get_max_rows(project_id).await?;
        let usage_window_days = self.get_usage_window_days(project_id).await?;
        let snapshot_window_days = self.get_snapshot_window_days(project_id).await?;
        let snapshot_max_rows = self.get_snapshot_max_rows(project_id).await?;

        let config = ForecastConfig {
            lookahead_days,
            due_soon_days,
            max_rows,
            usage_window_days,
            snapshot_window_days,
            snapshot_max_rows,
        };
        Ok(config.normalized())
    }
}
