// ==========================================
// 施工材料预测系统 - 消耗统计
// ==========================================
// 职责: 近 N 天日均消耗、库存可用天数、补货提示文案
// ==========================================

use crate::domain::material::UsageRecord;
use crate::domain::numeric::{round_to, shift_days};
use chrono::NaiveDate;
use std::collections::BTreeMap;

// ==========================================
// UsageStats - 按材料的日均消耗
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct UsageStats {
    avg_daily_by_material: BTreeMap<i64, f64>,
}

impl UsageStats {
    /// 统计 [today - window_days, today] 内的消耗，除以窗口天数
    pub fn from_history(history: &[UsageRecord], today: NaiveDate, window_days: i64) -> Self {
        let window_days = window_days.max(1);
        let window_start = shift_days(today, -window_days).unwrap_or(NaiveDate::MIN);

        let mut totals: BTreeMap<i64, f64> = BTreeMap::new();
        for record in history {
            let Some(date) = record.usage_date else {
                continue;
            };
            if date < window_start || date > today {
                continue;
            }
            *totals.entry(record.material_id).or_insert(0.0) += record.quantity_used.max(0.0);
        }

        let avg_daily_by_material = totals
            .into_iter()
            .map(|(mid, total)| (mid, total / window_days as f64))
            .collect();

        Self {
            avg_daily_by_material,
        }
    }

    /// 日均消耗（无记录为 0）
    pub fn avg_daily(&self, material_id: i64) -> f64 {
        self.avg_daily_by_material
            .get(&material_id)
            .copied()
            .unwrap_or(0.0)
    }

    /// 库存可用天数 = 可用量 / 日均消耗（日均为 0 时为空），保留 1 位小数
    pub fn stock_days(&self, material_id: i64, available: f64) -> Option<f64> {
        let avg = self.avg_daily(material_id);
        (avg > 0.0).then(|| round_to(available.max(0.0) / avg, 1))
    }
}

/// 补货提示: 可用量不足需求量时给出简短文案
pub fn reorder_hint(available: f64, required: f64, unit: &str) -> Option<String> {
    if required <= 0.0 || available + 1e-9 >= required {
        return None;
    }

    let shortage = (required - available).max(0.0);
    let available = round_to(available, 3);
    let required = round_to(required, 3);
    let shortage = round_to(shortage, 3);
    let unit = unit.trim();

    if unit.is_empty() {
        Some(format!(
            "You have only {}. Required: {}. Order at least {} more.",
            available, required, shortage
        ))
    } else {
        Some(format!(
            "You have only {} {}. Required: {}. Order at least {} more.",
            available, unit, required, shortage
        ))
    }
}
