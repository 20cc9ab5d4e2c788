// ==========================================
// 施工材料预测系统 - 路段评估引擎
// ==========================================
// 职责: 按路段汇总作业单元，给出计划/实际进度、路段状态、
//       关键作业、材料风险，并产出路段级告警
// 输入: 路段 + 作业单元 + 分配步骤（路段风险复用同一次分配模拟）
// 输出: StretchEvaluation (卡片 + 告警)
// ==========================================

use crate::domain::forecast::{Alert, CriticalWorkUnit, StretchCard};
use crate::domain::types::{AlertKind, AlertSeverity, MaterialRisk, StretchStatus};
use crate::domain::work_unit::{Stretch, WorkUnit};
use crate::engine::allocation::AllocationStep;
use chrono::NaiveDate;
use std::collections::BTreeSet;
use tracing::instrument;

/// 计划进度: 计划窗口内按已过天数线性插值，取整
///
/// - 缺少开始或结束 → None
/// - end ≤ start → today ≥ end 时 100，否则 0
/// - today ≤ start → 0；today ≥ end → 100
pub fn planned_progress(
    today: NaiveDate,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Option<i32> {
    let (start, end) = (start?, end?);
    if end <= start {
        return Some(if today >= end { 100 } else { 0 });
    }
    if today <= start {
        return Some(0);
    }
    if today >= end {
        return Some(100);
    }
    let total = (end - start).num_days() as f64;
    let done = (today - start).num_days() as f64;
    Some((100.0 * done / total).round() as i32)
}

/// 路段状态判定
///
/// 顺序:
/// 1) actual ≥ 100 → COMPLETED
/// 2) actual > 0 或 today ≥ planned_start → IN_PROGRESS，否则 NOT_STARTED
/// 3) 未完成且 today ≥ planned_start 且 actual + 1 < planned → DELAYED
pub fn stretch_status(
    today: NaiveDate,
    planned_start: Option<NaiveDate>,
    planned: Option<i32>,
    actual: i32,
) -> StretchStatus {
    if actual >= 100 {
        return StretchStatus::Completed;
    }

    let started = planned_start.map_or(false, |s| today >= s);
    let mut status = if actual > 0 || started {
        StretchStatus::InProgress
    } else {
        StretchStatus::NotStarted
    };

    if let Some(planned) = planned {
        // 容差 1 个百分点
        if today >= planned_start.unwrap_or(today) && actual + 1 < planned {
            status = StretchStatus::Delayed;
        }
    }

    status
}

// ==========================================
// StretchEvaluation - 评估结果
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct StretchEvaluation {
    pub cards: Vec<StretchCard>,
    pub alerts: Vec<Alert>,
    pub total_length_m: f64,
}

// ==========================================
// StretchEvaluator - 路段评估器
// ==========================================
pub struct StretchEvaluator {
    // 无状态
}

impl StretchEvaluator {
    pub fn new() -> Self {
        Self {}
    }

    /// 评估全部活动路段
    ///
    /// # 参数
    /// - `stretches`: 路段快照（按 sequence_no, id 输出）
    /// - `units`: 全部作业单元（含已完工，用于进度汇总）
    /// - `steps`: 分配模拟步骤（用于材料风险）
    /// - `today`: 评估日期
    #[instrument(skip(self, stretches, units, steps), fields(stretches = stretches.len()))]
    pub fn evaluate(
        &self,
        stretches: &[Stretch],
        units: &[WorkUnit],
        steps: &[AllocationStep<'_>],
        today: NaiveDate,
    ) -> StretchEvaluation {
        let mut ordered: Vec<&Stretch> = stretches.iter().filter(|s| s.is_active).collect();
        ordered.sort_by_key(|s| (s.sequence_no, s.id));

        let mut evaluation = StretchEvaluation::default();
        for stretch in ordered {
            let members: Vec<&WorkUnit> = units
                .iter()
                .filter(|u| u.is_active && u.stretch_id == Some(stretch.id))
                .collect();
            let stretch_steps: Vec<&AllocationStep<'_>> = steps
                .iter()
                .filter(|s| !s.is_undated() && s.scheduled.unit.stretch_id == Some(stretch.id))
                .collect();

            let card = self.build_card(stretch, &members, &stretch_steps, today);
            self.push_alerts(&card, &stretch_steps, &mut evaluation.alerts);
            evaluation.total_length_m += card.length_m;
            evaluation.cards.push(card);
        }

        tracing::debug!(
            cards = evaluation.cards.len(),
            alerts = evaluation.alerts.len(),
            "路段评估完成"
        );
        evaluation
    }

    fn build_card(
        &self,
        stretch: &Stretch,
        members: &[&WorkUnit],
        steps: &[&AllocationStep<'_>],
        today: NaiveDate,
    ) -> StretchCard {
        let planned_start = members.iter().filter_map(|u| u.planned_start).min();
        let planned_end = members.iter().filter_map(|u| u.planned_end).max();

        let actual = if members.is_empty() {
            0
        } else {
            let sum: f64 = members.iter().map(|u| f64::from(u.progress_rounded())).sum();
            (sum / members.len() as f64).round() as i32
        };
        let planned = planned_progress(today, planned_start, planned_end);
        let status = stretch_status(today, planned_start, planned, actual);

        let short_materials: BTreeSet<i64> = steps
            .iter()
            .filter(|s| s.result.shortage_qty > 0.0)
            .map(|s| s.result.material_id)
            .collect();
        let risk = if !short_materials.is_empty() {
            MaterialRisk::Shortage
        } else if steps.iter().any(|s| s.result.order_due_soon) {
            MaterialRisk::DueSoon
        } else {
            MaterialRisk::Ok
        };

        StretchCard {
            stretch_id: stretch.id,
            stretch_code: stretch.code.clone(),
            stretch_name: stretch.name.clone(),
            chainage: format!("{} - {}", stretch.start_chainage, stretch.end_chainage),
            length_m: stretch.length_m.max(0.0),
            planned_start,
            planned_end,
            planned_progress: planned,
            actual_progress: actual,
            status_kind: status,
            status_label: status.label().to_string(),
            critical_work_unit: critical_work_unit(members),
            material_risk_kind: risk,
            material_risk_label: risk.label().to_string(),
            shortage_count: short_materials.len(),
        }
    }

    fn push_alerts(&self, card: &StretchCard, steps: &[&AllocationStep<'_>], alerts: &mut Vec<Alert>) {
        let alert = |kind, severity, title: String, detail: String, date| Alert {
            kind,
            severity,
            title,
            detail,
            date,
            stretch_id: Some(card.stretch_id),
            stretch_code: Some(card.stretch_code.clone()),
            work_unit_id: None,
            material_id: None,
        };

        if card.status_kind == StretchStatus::Delayed {
            let planned = card
                .planned_progress
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-".to_string());
            alerts.push(alert(
                AlertKind::Delay,
                AlertSeverity::Warning,
                format!("Stretch {} is DELAYED", card.stretch_code),
                format!("Actual {}% vs Planned {}%", card.actual_progress, planned),
                card.planned_end,
            ));
        }

        if card.material_risk_kind == MaterialRisk::Shortage {
            let earliest = steps
                .iter()
                .filter(|s| s.result.shortage_qty > 0.0)
                .filter_map(|s| s.result.order_by)
                .min();
            alerts.push(alert(
                AlertKind::MaterialRisk,
                AlertSeverity::Warning,
                format!("Material shortage risk in {}", card.stretch_code),
                format!("{} material(s) short", card.shortage_count),
                earliest,
            ));
        }

        if card.status_kind == StretchStatus::Completed {
            alerts.push(alert(
                AlertKind::Completed,
                AlertSeverity::Info,
                format!("Stretch {} completed", card.stretch_code),
                "Release resources and move forward".to_string(),
                None,
            ));
        }
    }
}

impl Default for StretchEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

/// 关键作业: 按 (开工日[空值最后], id) 排序后第一个未完工单元
fn critical_work_unit(members: &[&WorkUnit]) -> Option<CriticalWorkUnit> {
    let mut ordered: Vec<&&WorkUnit> = members.iter().collect();
    ordered.sort_by_key(|u| (u.planned_start.is_none(), u.planned_start, u.id));

    ordered
        .into_iter()
        .find(|u| u.progress_rounded() < 100)
        .map(|u| CriticalWorkUnit {
            work_unit_id: u.id,
            code: u.code.clone(),
            name: u.name.clone(),
            start_date: u.planned_start,
            end_date: u.planned_end,
            progress_percent: u.progress_rounded(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn stretch(id: i64, seq: i64) -> Stretch {
        Stretch {
            id,
            code: format!("S{}", id),
            name: format!("Stretch {}", id),
            sequence_no: seq,
            start_chainage: "0+000".to_string(),
            end_chainage: "1+000".to_string(),
            length_m: 1000.0,
            is_active: true,
        }
    }

    fn member(id: i64, stretch_id: i64, start: Option<NaiveDate>, end: Option<NaiveDate>, progress: f64) -> WorkUnit {
        WorkUnit {
            id,
            activity_id: id,
            stretch_id: Some(stretch_id),
            code: format!("WU-{}", id),
            name: format!("Unit {}", id),
            planned_quantity: 10.0,
            planned_start: start,
            planned_end: end,
            progress_percent: progress,
            is_active: true,
        }
    }

    #[test]
    fn test_planned_progress_interpolation() {
        let start = Some(d(2026, 3, 1));
        let end = Some(d(2026, 3, 11));
        assert_eq!(planned_progress(d(2026, 2, 20), start, end), Some(0));
        assert_eq!(planned_progress(d(2026, 3, 6), start, end), Some(50));
        assert_eq!(planned_progress(d(2026, 3, 20), start, end), Some(100));
        assert_eq!(planned_progress(d(2026, 3, 6), start, None), None);
        // 退化窗口
        assert_eq!(planned_progress(d(2026, 3, 1), start, start), Some(100));
        assert_eq!(planned_progress(d(2026, 2, 28), start, start), Some(0));
    }

    #[test]
    fn test_status_rules() {
        let today = d(2026, 3, 10);
        let start = Some(d(2026, 3, 1));
        assert_eq!(stretch_status(today, start, Some(50), 100), StretchStatus::Completed);
        assert_eq!(stretch_status(today, start, Some(50), 30), StretchStatus::Delayed);
        // 差 1 个百分点不算延误
        assert_eq!(stretch_status(today, start, Some(50), 49), StretchStatus::InProgress);
        assert_eq!(
            stretch_status(today, Some(d(2026, 4, 1)), Some(0), 0),
            StretchStatus::NotStarted
        );
        assert_eq!(stretch_status(today, None, None, 5), StretchStatus::InProgress);
    }

    #[test]
    fn test_cards_ordered_and_alerts() {
        let today = d(2026, 3, 10);
        let stretches = vec![stretch(2, 2), stretch(1, 1), {
            let mut s = stretch(3, 0);
            s.is_active = false;
            s
        }];
        let units = vec![
            member(10, 1, Some(d(2026, 3, 1)), Some(d(2026, 3, 11)), 100.0),
            member(20, 2, Some(d(2026, 3, 1)), Some(d(2026, 3, 11)), 10.0),
            member(21, 2, None, None, 0.0),
        ];

        let evaluation = StretchEvaluator::new().evaluate(&stretches, &units, &[], today);
        let ids: Vec<i64> = evaluation.cards.iter().map(|c| c.stretch_id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(evaluation.total_length_m, 2000.0);

        let s1 = &evaluation.cards[0];
        assert_eq!(s1.status_kind, StretchStatus::Completed);
        assert!(s1.critical_work_unit.is_none());

        let s2 = &evaluation.cards[1];
        assert_eq!(s2.actual_progress, 5);
        assert_eq!(s2.planned_progress, Some(90));
        assert_eq!(s2.status_kind, StretchStatus::Delayed);
        assert_eq!(s2.critical_work_unit.as_ref().map(|c| c.work_unit_id), Some(20));
        assert_eq!(s2.material_risk_kind, MaterialRisk::Ok);

        let kinds: Vec<AlertKind> = evaluation.alerts.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![AlertKind::Completed, AlertKind::Delay]);
        assert_eq!(evaluation.alerts[1].detail, "Actual 5% vs Planned 90%");
    }

    #[test]
    fn test_huge_progress_is_completed() {
        let today = d(2026, 3, 10);
        let units = vec![
            member(10, 1, Some(d(2026, 3, 1)), Some(d(2026, 3, 11)), 1e12),
            member(11, 1, Some(d(2026, 3, 1)), Some(d(2026, 3, 11)), 1e12),
        ];

        let evaluation = StretchEvaluator::new().evaluate(&[stretch(1, 1)], &units, &[], today);
        let card = &evaluation.cards[0];
        assert_eq!(card.actual_progress, 100);
        assert_eq!(card.status_kind, StretchStatus::Completed);
    }
}
