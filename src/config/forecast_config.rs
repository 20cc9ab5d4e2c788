// ==========================================
// 施工材料预测系统 - 预测参数
// ==========================================
// 职责: 时间窗口与输出上限参数（值对象）
// 来源: ConfigManager (config_kv) 或调用方直接构造
// ==========================================

use crate::domain::numeric::MAX_DAYS;
use serde::{Deserialize, Serialize};

/// 预测参数默认值
pub mod defaults {
    pub const LOOKAHEAD_DAYS: i64 = 30;
    pub const DUE_SOON_DAYS: i64 = 7;
    pub const MAX_ROWS: usize = 30;
    pub const USAGE_WINDOW_DAYS: i64 = 14;
    pub const SNAPSHOT_WINDOW_DAYS: i64 = 7;
    pub const SNAPSHOT_MAX_ROWS: usize = 8;
    pub const UPCOMING_MAX_ROWS: usize = 10;
}

// ==========================================
// ForecastConfig - 预测参数
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// 前瞻窗口（天）：计划开工落在 [today, today+N] 的作业单元参与计算
    pub lookahead_days: i64,
    /// 临近下单阈值（天）
    pub due_soon_days: i64,
    /// 明细输出上限
    pub max_rows: usize,
    /// 日均消耗统计窗口（天）
    pub usage_window_days: i64,
    /// 采购快照窗口（天）
    pub snapshot_window_days: i64,
    /// 采购快照上限（实际取 min(此值, max_rows)）
    pub snapshot_max_rows: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            lookahead_days: defaults::LOOKAHEAD_DAYS,
            due_soon_days: defaults::DUE_SOON_DAYS,
            max_rows: defaults::MAX_ROWS,
            usage_window_days: defaults::USAGE_WINDOW_DAYS,
            snapshot_window_days: defaults::SNAPSHOT_WINDOW_DAYS,
            snapshot_max_rows: defaults::SNAPSHOT_MAX_ROWS,
        }
    }
}

impl ForecastConfig {
    /// 规范化: 窗口限制在 [0, MAX_DAYS]，统计窗口至少 1 天
    pub fn normalized(self) -> Self {
        Self {
            lookahead_days: self.lookahead_days.clamp(0, MAX_DAYS),
            due_soon_days: self.due_soon_days.clamp(0, MAX_DAYS),
            max_rows: self.max_rows,
            usage_window_days: self.usage_window_days.clamp(1, MAX_DAYS),
            snapshot_window_days: self.snapshot_window_days.clamp(0, MAX_DAYS),
            snapshot_max_rows: self.snapshot_max_rows,
        }
    }

    /// 采购快照实际上限
    pub fn snapshot_cap(&self) -> usize {
        self.snapshot_max_rows.min(self.max_rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = ForecastConfig::default();
        assert_eq!(cfg.lookahead_days, 30);
        assert_eq!(cfg.due_soon_days, 7);
        assert_eq!(cfg.max_rows, 30);
        assert_eq!(cfg.snapshot_cap(), 8);
    }

    #[test]
    fn test_normalized_and_cap() {
        let cfg = ForecastConfig {
            lookahead_days: -5,
            usage_window_days: 0,
            max_rows: 3,
            ..ForecastConfig::default()
        }
        .normalized();
        assert_eq!(cfg.lookahead_days, 0);
        assert_eq!(cfg.usage_window_days, 1);
        assert_eq!(cfg.snapshot_cap(), 3);
    }

    #[test]
    fn test_normalized_caps_huge_windows() {
        let cfg = ForecastConfig {
            lookahead_days: i64::MAX,
            due_soon_days: i64::MAX,
            usage_window_days: i64::MAX,
            snapshot_window_days: i64::MAX,
            ..ForecastConfig::default()
        }
        .normalized();
        assert_eq!(cfg.lookahead_days, MAX_DAYS);
        assert_eq!(cfg.due_soon_days, MAX_DAYS);
        assert_eq!(cfg.usage_window_days, MAX_DAYS);
        assert_eq!(cfg.snapshot_window_days, MAX_DAYS);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg: ForecastConfig = serde_json::from_str(r#"{"max_rows": 12}"#).unwrap();
        assert_eq!(cfg.max_rows, 12);
        assert_eq!(cfg.lookahead_days, 30);
    }
}
