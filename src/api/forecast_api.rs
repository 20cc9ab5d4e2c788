// ==========================================
// 施工材料预测系统 - 预测 API
// ==========================================
// 职责: 读取配置 → 读取项目快照 → 调用引擎
// 架构: API 层 → Repository (只读快照) + ConfigReader → ForecastEngine
// ==========================================
// 并发说明:
// - 引擎不预留、不锁定库存；对同一库存池的并发预测各自假定整池可用
// - 不同项目之间无共享可变状态，可并行评估
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, ForecastConfigReader};
use crate::db::open_sqlite_connection;
use crate::domain::forecast::ForecastOutput;
use crate::engine::ForecastEngine;
use crate::repository::ProjectSnapshotRepository;
use chrono::NaiveDate;
use futures::future::join_all;
use std::sync::{Arc, Mutex};
use tracing::instrument;

// ==========================================
// ForecastApi - 预测 API
// ==========================================
pub struct ForecastApi<C>
where
    C: ForecastConfigReader,
{
    config: Arc<C>,
    repo: Arc<ProjectSnapshotRepository>,
    engine: ForecastEngine,
}

impl ForecastApi<ConfigManager> {
    /// 按数据库路径创建（配置与仓储共享同一连接）
    pub fn open(db_path: &str) -> ApiResult<Self> {
        let conn = Arc::new(Mutex::new(open_sqlite_connection(db_path)?));
        let config = ConfigManager::from_connection(conn.clone())
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;
        let repo = ProjectSnapshotRepository::from_connection(conn);
        Ok(Self::new(Arc::new(config), Arc::new(repo)))
    }
}

impl<C> ForecastApi<C>
where
    C: ForecastConfigReader,
{
    /// 创建新的 ForecastApi 实例
    ///
    /// # 参数
    /// - config: 配置读取器
    /// - repo: 项目快照仓储
    pub fn new(config: Arc<C>, repo: Arc<ProjectSnapshotRepository>) -> Self {
        Self {
            config,
            repo,
            engine: ForecastEngine::new(),
        }
    }

    /// 单项目预测
    ///
    /// # 参数
    /// - project_id: 项目ID（> 0）
    /// - today: 评估日期
    ///
    /// # 返回
    /// - Ok(ForecastOutput): 预测结果
    /// - Err(ApiError::NotFound): 项目不存在
    #[instrument(skip(self))]
    pub async fn project_forecast(
        &self,
        project_id: i64,
        today: NaiveDate,
    ) -> ApiResult<ForecastOutput> {
        if project_id <= 0 {
            return Err(ApiError::InvalidInput(format!(
                "project_id 必须为正数: {}",
                project_id
            )));
        }

        let config = self
            .config
            .load_forecast_config(Some(project_id))
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;

        let input = self.repo.load_forecast_input(project_id, today, config)?;
        let output = self.engine.run(&input);

        tracing::info!(
            project_id,
            warnings = output.warnings_count,
            orders = output.material_orders.len(),
            "项目预测完成"
        );
        Ok(output)
    }

    /// 多项目预测（并发评估，结果顺序与输入一致）
    pub async fn project_forecasts(
        &self,
        project_ids: &[i64],
        today: NaiveDate,
    ) -> Vec<(i64, ApiResult<ForecastOutput>)> {
        let tasks = project_ids
            .iter()
            .map(|&id| async move { (id, self.project_forecast(id, today).await) });
        join_all(tasks).await
    }
}
