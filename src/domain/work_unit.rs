// ==========================================
// 施工材料预测系统 - 作业单元领域模型
// ==========================================
// 作业单元: 计划施工项（工序 / 路段工序），带计划量、计划窗口、进度
// 消耗关联: (工序类型, 材料) -> 单位消耗率 + 可选供应商/提前期覆写
// ==========================================

use crate::domain::numeric::{
    default_true, lenient_date, lenient_f64, lenient_raw_number, RawNumber,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// WorkUnit - 作业单元
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkUnit {
    pub id: i64,
    pub activity_id: i64, // 工序类型（消耗关联的键）
    #[serde(default)]
    pub stretch_id: Option<i64>, // 所属路段（道路项目）
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub name: String,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub planned_quantity: f64,
    #[serde(default, deserialize_with = "lenient_date")]
    pub planned_start: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub planned_end: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub progress_percent: f64, // 0..100

    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl WorkUnit {
    /// 剩余系数 = max(0, 1 - progress/100)
    pub fn remaining_factor(&self) -> f64 {
        (1.0 - self.progress_percent / 100.0).max(0.0)
    }

    /// 剩余计划量
    pub fn remaining_quantity(&self) -> f64 {
        self.planned_quantity.max(0.0) * self.remaining_factor()
    }

    pub fn is_complete(&self) -> bool {
        self.progress_percent >= 100.0
    }

    /// 进度取整（看板口径，限制在 [0, 100]）
    pub fn progress_rounded(&self) -> i32 {
        self.progress_percent.clamp(0.0, 100.0).round() as i32
    }
}

// ==========================================
// ConsumptionLink - 工序材料消耗关联
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumptionLink {
    pub activity_id: i64,
    pub material_id: i64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub consumption_rate: f64, // 每单位计划量消耗的材料量
    #[serde(default)]
    pub vendor_id: Option<i64>, // 指定供应商
    #[serde(default, deserialize_with = "lenient_raw_number")]
    pub lead_time_days_override: Option<RawNumber>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub order_date: Option<NaiveDate>, // 人工录入的下单日
}

impl ConsumptionLink {
    /// 消耗率（负数按 0 处理）
    pub fn effective_rate(&self) -> f64 {
        self.consumption_rate.max(0.0)
    }
}

// ==========================================
// Stretch - 路段
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stretch {
    pub id: i64,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sequence_no: i64,
    #[serde(default)]
    pub start_chainage: String,
    #[serde(default)]
    pub end_chainage: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub length_m: f64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(progress: f64) -> WorkUnit {
        WorkUnit {
            id: 1,
            activity_id: 10,
            stretch_id: None,
            code: "A-1".to_string(),
            name: "Base course".to_string(),
            planned_quantity: 200.0,
            planned_start: None,
            planned_end: None,
            progress_percent: progress,
            is_active: true,
        }
    }

    #[test]
    fn test_remaining_quantity() {
        assert_eq!(unit(0.0).remaining_quantity(), 200.0);
        assert_eq!(unit(25.0).remaining_quantity(), 150.0);
        assert_eq!(unit(100.0).remaining_quantity(), 0.0);
        // 超报进度不产生负数
        assert_eq!(unit(130.0).remaining_quantity(), 0.0);
    }

    #[test]
    fn test_is_complete() {
        assert!(unit(100.0).is_complete());
        assert!(!unit(99.5).is_complete());
    }

    #[test]
    fn test_progress_rounded_is_clamped() {
        assert_eq!(unit(49.5).progress_rounded(), 50);
        assert_eq!(unit(1e12).progress_rounded(), 100);
        assert_eq!(unit(-20.0).progress_rounded(), 0);
    }
}
