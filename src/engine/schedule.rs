// ==========================================
// 施工材料预测系统 - 作业计划抽取引擎
// ==========================================
// 职责: 从作业单元快照中筛出前瞻窗口内、未完工的单元，
//       计算剩余系数与按材料的剩余需求量
// 排序: (planned_start, work_unit_id) 升序，保证分配顺序确定
// ==========================================

use crate::domain::forecast::UpcomingWorkUnit;
use crate::domain::numeric::shift_days;
use crate::domain::work_unit::{ConsumptionLink, WorkUnit};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::instrument;

// ==========================================
// ScheduledWorkUnit - 参与计算的作业单元
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct ScheduledWorkUnit<'a> {
    pub unit: &'a WorkUnit,
    pub start: Option<NaiveDate>,
    pub remaining_factor: f64,
    pub remaining_quantity: f64,
}

impl<'a> ScheduledWorkUnit<'a> {
    fn from_unit(unit: &'a WorkUnit) -> Self {
        Self {
            unit,
            start: unit.planned_start,
            remaining_factor: unit.remaining_factor(),
            remaining_quantity: unit.remaining_quantity(),
        }
    }

    /// 某消耗关联下的剩余材料需求 = 剩余计划量 × 消耗率
    pub fn required_for(&self, link: &ConsumptionLink) -> f64 {
        (self.remaining_quantity * link.effective_rate()).max(0.0)
    }

    /// 转为看板的前瞻作业行（仅限有开工日的单元）
    pub fn to_upcoming(&self) -> Option<UpcomingWorkUnit> {
        let start = self.start?;
        Some(UpcomingWorkUnit {
            work_unit_id: self.unit.id,
            activity_id: self.unit.activity_id,
            stretch_id: self.unit.stretch_id,
            code: self.unit.code.clone(),
            name: self.unit.name.clone(),
            start_date: start,
            end_date: self.unit.planned_end,
            progress_percent: self.unit.progress_rounded(),
            remaining_factor: self.remaining_factor,
            remaining_quantity: self.remaining_quantity,
        })
    }
}

// ==========================================
// ScheduleExtraction - 抽取结果
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ScheduleExtraction<'a> {
    /// 有开工日、在前瞻窗口内（含已开工未完工），按 (start, id) 排序
    pub dated: Vec<ScheduledWorkUnit<'a>>,
    /// 缺少开工日的活动单元（按 id 排序），仅保留为 UNKNOWN
    pub undated: Vec<ScheduledWorkUnit<'a>>,
}

impl<'a> ScheduleExtraction<'a> {
    /// 看板前瞻作业列表（有开工日的单元，保持抽取顺序）
    pub fn upcoming(&self) -> Vec<UpcomingWorkUnit> {
        self.dated
            .iter()
            .filter_map(ScheduledWorkUnit::to_upcoming)
            .collect()
    }
}

// ==========================================
// ScheduleExtractor - 计划抽取器
// ==========================================
pub struct ScheduleExtractor {
    // 无状态
}

impl ScheduleExtractor {
    pub fn new() -> Self {
        Self {}
    }

    /// 抽取前瞻窗口内的作业单元
    ///
    /// 纳入条件:
    /// - is_active 且 progress < 100
    /// - planned_start ≤ today + lookahead_days（已过开工日但未完工的也纳入）
    #[instrument(skip(self, units), fields(count = units.len()))]
    pub fn extract<'a>(
        &self,
        units: &'a [WorkUnit],
        today: NaiveDate,
        lookahead_days: i64,
    ) -> ScheduleExtraction<'a> {
        // 越界时不设上限
        let horizon = shift_days(today, lookahead_days.max(0));

        let mut extraction = ScheduleExtraction::default();
        for unit in units.iter().filter(|u| u.is_active && !u.is_complete()) {
            match unit.planned_start {
                Some(start) if horizon.map_or(true, |h| start <= h) => {
                    extraction.dated.push(ScheduledWorkUnit::from_unit(unit));
                }
                Some(_) => {}
                None => extraction.undated.push(ScheduledWorkUnit::from_unit(unit)),
            }
        }

        extraction
            .dated
            .sort_by(|a, b| (a.start, a.unit.id).cmp(&(b.start, b.unit.id)));
        extraction.undated.sort_by_key(|s| s.unit.id);

        tracing::debug!(
            dated = extraction.dated.len(),
            undated = extraction.undated.len(),
            "作业计划抽取完成"
        );
        extraction
    }
}

impl Default for ScheduleExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// 按工序类型分组消耗关联（组内按 material_id 排序，保证确定性）
pub fn links_by_activity(links: &[ConsumptionLink]) -> BTreeMap<i64, Vec<&ConsumptionLink>> {
    let mut grouped: BTreeMap<i64, Vec<&ConsumptionLink>> = BTreeMap::new();
    for link in links {
        grouped.entry(link.activity_id).or_default().push(link);
    }
    for group in grouped.values_mut() {
        group.sort_by_key(|l| l.material_id);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn unit(id: i64, start: Option<NaiveDate>, progress: f64) -> WorkUnit {
        WorkUnit {
            id,
            activity_id: 100 + id,
            stretch_id: None,
            code: format!("WU-{}", id),
            name: format!("Work unit {}", id),
            planned_quantity: 100.0,
            planned_start: start,
            planned_end: None,
            progress_percent: progress,
            is_active: true,
        }
    }

    #[test]
    fn test_window_and_order() {
        let today = d(2026, 3, 10);
        let units = vec![
            unit(3, Some(d(2026, 3, 20)), 0.0),
            unit(1, Some(d(2026, 3, 20)), 0.0),
            unit(2, Some(d(2026, 3, 1)), 40.0), // 已开工未完工
            unit(4, Some(d(2026, 5, 1)), 0.0),  // 超出窗口
            unit(5, Some(d(2026, 3, 12)), 100.0), // 已完工
            unit(6, None, 0.0),
        ];

        let extraction = ScheduleExtractor::new().extract(&units, today, 30);
        let ids: Vec<i64> = extraction.dated.iter().map(|s| s.unit.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
        assert_eq!(extraction.undated.len(), 1);
        assert_eq!(extraction.undated[0].unit.id, 6);
        assert!((extraction.dated[0].remaining_quantity - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_huge_lookahead_has_no_horizon() {
        let today = d(2026, 3, 10);
        let units = vec![
            unit(1, Some(d(2090, 1, 1)), 0.0),
            unit(2, Some(d(2026, 3, 11)), 0.0),
        ];
        let extraction = ScheduleExtractor::new().extract(&units, today, i64::MAX);
        let ids: Vec<i64> = extraction.dated.iter().map(|s| s.unit.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn test_upcoming_skips_undated() {
        let units = vec![
            unit(2, Some(d(2026, 3, 12)), 25.0),
            unit(1, None, 0.0),
        ];
        let extraction = ScheduleExtractor::new().extract(&units, d(2026, 3, 10), 30);
        let upcoming = extraction.upcoming();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].work_unit_id, 2);
        assert_eq!(upcoming[0].start_date, d(2026, 3, 12));
        assert_eq!(upcoming[0].progress_percent, 25);
    }

    #[test]
    fn test_inactive_excluded() {
        let mut u = unit(1, Some(d(2026, 3, 11)), 0.0);
        u.is_active = false;
        let units = vec![u];
        let extraction = ScheduleExtractor::new().extract(&units, d(2026, 3, 10), 30);
        assert!(extraction.dated.is_empty());
    }

    #[test]
    fn test_required_for_link() {
        let units = vec![unit(1, Some(d(2026, 3, 11)), 50.0)];
        let extraction = ScheduleExtractor::new().extract(&units, d(2026, 3, 10), 30);
        let link = ConsumptionLink {
            activity_id: 101,
            material_id: 7,
            consumption_rate: 0.4,
            vendor_id: None,
            lead_time_days_override: None,
            order_date: None,
        };
        assert!((extraction.dated[0].required_for(&link) - 20.0).abs() < 1e-9);
    }
}
