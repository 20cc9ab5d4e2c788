// ==========================================
// 施工材料预测系统 - 告警汇总引擎
// ==========================================
// 职责: 订货明细排序截断、本周采购快照、告警流排序
// 排序: 状态严重度 → order_by 升序(空值最后) → to_order_qty 降序
// 快照: 仅 LATE/DUE/DUE_SOON 且 to_order > 0 且 order_by 在窗口内，
//       按材料合并（数量求和、最早下单日、保留最严重状态）
// ==========================================

use crate::config::ForecastConfig;
use crate::domain::forecast::{Alert, MaterialOrderRow, SnapshotRow};
use crate::domain::numeric::{round_to, shift_days};
use crate::domain::types::{AlertKind, AlertSeverity, DeliveryStatus, OrderStatus};
use crate::domain::work_unit::Stretch;
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::instrument;

// ==========================================
// AggregatedAlerts - 汇总结果
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct AggregatedAlerts {
    pub material_orders: Vec<MaterialOrderRow>,
    pub procurement_snapshot: Vec<SnapshotRow>,
    pub warnings_count: usize,
    pub alerts: Vec<Alert>,
}

// ==========================================
// AlertAggregator - 告警汇总器
// ==========================================
pub struct AlertAggregator {
    // 无状态
}

impl AlertAggregator {
    pub fn new() -> Self {
        Self {}
    }

    /// 汇总订货明细与告警
    ///
    /// # 参数
    /// - `rows`: 分配模拟产出的全部订货明细（未排序）
    /// - `stretch_alerts`: 路段评估产出的告警
    /// - `stretches`: 路段快照（用于给行级告警打路段标签）
    /// - `today` / `config`: 评估日期与参数
    #[instrument(skip_all, fields(rows = rows.len()))]
    pub fn aggregate(
        &self,
        mut rows: Vec<MaterialOrderRow>,
        stretch_alerts: Vec<Alert>,
        stretches: &[Stretch],
        today: NaiveDate,
        config: &ForecastConfig,
    ) -> AggregatedAlerts {
        rank_order_rows(&mut rows);

        let procurement_snapshot = build_snapshot(
            &rows,
            today,
            config.snapshot_window_days,
            config.snapshot_cap(),
        );

        let mut alerts = row_alerts(&rows, stretches, today);
        alerts.extend(stretch_alerts);
        rank_alerts(&mut alerts, config.max_rows);

        rows.truncate(config.max_rows);
        let warnings_count = count_warnings(&rows);

        tracing::info!(
            rows = rows.len(),
            snapshot = procurement_snapshot.len(),
            alerts = alerts.len(),
            warnings_count,
            "告警汇总完成"
        );

        AggregatedAlerts {
            material_orders: rows,
            procurement_snapshot,
            warnings_count,
            alerts,
        }
    }
}

impl Default for AlertAggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// 空值排最后的日期比较
fn cmp_date_nulls_last(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// 订货明细排序（稳定排序，同键保持分配顺序）
pub fn rank_order_rows(rows: &mut [MaterialOrderRow]) {
    rows.sort_by(|a, b| {
        a.status_kind
            .severity_rank()
            .cmp(&b.status_kind.severity_rank())
            .then_with(|| cmp_date_nulls_last(a.order_by, b.order_by))
            .then_with(|| b.to_order_qty.total_cmp(&a.to_order_qty))
    });
}

/// 截断后明细中的待处理条数
pub fn count_warnings(rows: &[MaterialOrderRow]) -> usize {
    rows.iter()
        .filter(|r| r.status_kind.is_actionable() && r.to_order_qty > 0.0)
        .count()
}

/// 本周采购快照
///
/// # 参数
/// - `rows`: 已排序的全部订货明细（截断前）
/// - `window_days`: 下单日窗口
/// - `cap`: 输出上限
pub fn build_snapshot(
    rows: &[MaterialOrderRow],
    today: NaiveDate,
    window_days: i64,
    cap: usize,
) -> Vec<SnapshotRow> {
    let window_end = shift_days(today, window_days.max(0));
    let mut by_material: BTreeMap<i64, SnapshotRow> = BTreeMap::new();

    for row in rows {
        if row.to_order_qty <= 0.0 || !row.status_kind.is_actionable() {
            continue;
        }
        // 窗口上限越界时不限制
        let beyond_window = match (row.order_by, window_end) {
            (Some(ob), Some(end)) => ob > end,
            _ => false,
        };
        if beyond_window {
            continue;
        }

        match by_material.get_mut(&row.material_id) {
            None => {
                by_material.insert(
                    row.material_id,
                    SnapshotRow {
                        material_id: row.material_id,
                        material_code: row.material_code.clone(),
                        material_name: row.material_name.clone(),
                        unit: row.unit.clone(),
                        total_to_order_qty: row.to_order_qty,
                        earliest_order_by: row.order_by,
                        status_kind: row.status_kind,
                        status_label: row.status_label.clone(),
                    },
                );
            }
            Some(existing) => {
                existing.total_to_order_qty += row.to_order_qty;
                if cmp_date_nulls_last(row.order_by, existing.earliest_order_by) == Ordering::Less {
                    existing.earliest_order_by = row.order_by;
                }
                if row.status_kind.severity_rank() < existing.status_kind.severity_rank() {
                    existing.status_kind = row.status_kind;
                    existing.status_label = row.status_label.clone();
                }
            }
        }
    }

    let mut snapshot: Vec<SnapshotRow> = by_material
        .into_values()
        .map(|mut s| {
            s.total_to_order_qty = round_to(s.total_to_order_qty, 3);
            s
        })
        .collect();
    snapshot.sort_by(|a, b| {
        a.status_kind
            .severity_rank()
            .cmp(&b.status_kind.severity_rank())
            .then_with(|| cmp_date_nulls_last(a.earliest_order_by, b.earliest_order_by))
            .then_with(|| b.total_to_order_qty.total_cmp(&a.total_to_order_qty))
            .then_with(|| a.material_id.cmp(&b.material_id))
    });
    snapshot.truncate(cap);
    snapshot
}

/// 行级告警: SHORTAGE（需求日未过）与 DELIVERY_LATE
pub fn row_alerts(rows: &[MaterialOrderRow], stretches: &[Stretch], today: NaiveDate) -> Vec<Alert> {
    let stretch_codes: BTreeMap<i64, &str> =
        stretches.iter().map(|s| (s.id, s.code.as_str())).collect();
    let code_of = |row: &MaterialOrderRow| {
        row.stretch_id
            .and_then(|sid| stretch_codes.get(&sid))
            .map(|c| c.to_string())
    };

    let mut alerts = Vec::new();
    for row in rows {
        let need_not_past = row.work_unit_start.map_or(false, |start| start >= today);
        if row.to_order_qty > 0.0 && need_not_past && row.status_kind != OrderStatus::Unknown {
            let severity = if row.status_kind == OrderStatus::Late {
                AlertSeverity::Critical
            } else {
                AlertSeverity::Warning
            };
            let order_by = row
                .order_by
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string());
            let need = row
                .work_unit_start
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string());

            alerts.push(Alert {
                kind: AlertKind::Shortage,
                severity,
                title: format!(
                    "{} {} shortage of {} for {}",
                    row.to_order_qty, row.unit, row.material_name, row.work_unit_code
                ),
                detail: format!("Required by {} (order by {})", need, order_by),
                date: row.order_by,
                stretch_id: row.stretch_id,
                stretch_code: code_of(row),
                work_unit_id: Some(row.work_unit_id),
                material_id: Some(row.material_id),
            });
        }

        if row.delivery.status == DeliveryStatus::Late {
            let expected = row
                .delivery
                .expected_delivery
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string());
            alerts.push(Alert {
                kind: AlertKind::DeliveryLate,
                severity: AlertSeverity::Critical,
                title: format!(
                    "{} delivery late for {}",
                    row.material_name, row.work_unit_code
                ),
                detail: format!(
                    "Expected {} is {}d after work starts",
                    expected, row.delivery.days_late
                ),
                date: row.delivery.expected_delivery,
                stretch_id: row.stretch_id,
                stretch_code: code_of(row),
                work_unit_id: Some(row.work_unit_id),
                material_id: Some(row.material_id),
            });
        }
    }
    alerts
}

/// 告警流排序: 级别 → 日期升序(空值最后) → 类型 → 标题，截断到 max_rows
pub fn rank_alerts(alerts: &mut Vec<Alert>, max_rows: usize) {
    alerts.sort_by(|a, b| {
        a.severity
            .cmp(&b.severity)
            .then_with(|| cmp_date_nulls_last(a.date, b.date))
            .then_with(|| a.kind.cmp(&b.kind))
            .then_with(|| a.title.cmp(&b.title))
    });
    alerts.truncate(max_rows);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::forecast::DeliveryCheck;
    use crate::domain::types::LeadTimeSource;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn row(
        wu: i64,
        mid: i64,
        status: OrderStatus,
        order_by: Option<NaiveDate>,
        to_order: f64,
    ) -> MaterialOrderRow {
        MaterialOrderRow {
            status_kind: status,
            status_label: status.to_string(),
            order_by,
            lead_time_days: 3,
            lead_time_source: LeadTimeSource::MaterialDefault,
            explain: String::new(),
            work_unit_id: wu,
            work_unit_code: format!("WU-{}", wu),
            work_unit_name: String::new(),
            stretch_id: None,
            work_unit_start: order_by.map(|d| d + chrono::Duration::days(3)),
            material_id: mid,
            material_code: format!("M{}", mid),
            material_name: format!("Material {}", mid),
            unit: "t".to_string(),
            required_qty: to_order,
            available_qty: 0.0,
            allocated_qty: 0.0,
            to_order_qty: to_order,
            order_due_soon: false,
            vendor_options: Vec::new(),
            recommended_vendor: None,
            avg_daily_usage: 0.0,
            stock_days: None,
            reorder_hint: None,
            delivery: DeliveryCheck {
                expected_delivery: None,
                is_risk: false,
                days_late: 0,
                status: DeliveryStatus::Unknown,
            },
        }
    }

    #[test]
    fn test_rank_order_rows() {
        let today = d(2026, 3, 10);
        let mut rows = vec![
            row(1, 1, OrderStatus::Ok, Some(today), 0.0),
            row(2, 1, OrderStatus::Upcoming, Some(d(2026, 3, 30)), 5.0),
            row(3, 2, OrderStatus::Late, Some(d(2026, 3, 8)), 1.0),
            row(4, 3, OrderStatus::Late, Some(d(2026, 3, 8)), 9.0),
            row(5, 3, OrderStatus::Due, Some(today), 2.0),
            row(6, 4, OrderStatus::Unknown, None, 3.0),
        ];
        rank_order_rows(&mut rows);
        let ids: Vec<i64> = rows.iter().map(|r| r.work_unit_id).collect();
        assert_eq!(ids, vec![4, 3, 5, 2, 6, 1]);
    }

    #[test]
    fn test_snapshot_merges_by_material() {
        let today = d(2026, 3, 10);
        let mut rows = vec![
            row(1, 1, OrderStatus::DueSoon, Some(d(2026, 3, 14)), 5.0),
            row(2, 1, OrderStatus::Late, Some(d(2026, 3, 5)), 2.5),
            row(3, 2, OrderStatus::Due, Some(today), 1.0),
            row(4, 3, OrderStatus::Upcoming, Some(d(2026, 3, 30)), 7.0),
            row(5, 4, OrderStatus::DueSoon, Some(d(2026, 3, 16)), 0.0),
        ];
        rank_order_rows(&mut rows);
        let snapshot = build_snapshot(&rows, today, 7, 8);

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].material_id, 1);
        assert_eq!(snapshot[0].status_kind, OrderStatus::Late);
        assert_eq!(snapshot[0].total_to_order_qty, 7.5);
        assert_eq!(snapshot[0].earliest_order_by, Some(d(2026, 3, 5)));
        assert_eq!(snapshot[1].material_id, 2);

        assert_eq!(build_snapshot(&rows, today, 7, 1).len(), 1);
    }

    #[test]
    fn test_warnings_count_after_truncation() {
        let today = d(2026, 3, 10);
        let rows = vec![
            row(1, 1, OrderStatus::Late, Some(d(2026, 3, 1)), 5.0),
            row(2, 2, OrderStatus::Late, Some(d(2026, 3, 2)), 5.0),
            row(3, 3, OrderStatus::Upcoming, Some(d(2026, 4, 2)), 5.0),
        ];
        let config = ForecastConfig {
            max_rows: 1,
            ..ForecastConfig::default()
        };
        let out = AlertAggregator::new().aggregate(rows, Vec::new(), &[], today, &config);
        assert_eq!(out.material_orders.len(), 1);
        assert_eq!(out.warnings_count, 1);
        assert_eq!(out.procurement_snapshot.len(), 1);
    }

    #[test]
    fn test_shortage_alert_severity_and_past_need() {
        let today = d(2026, 3, 10);
        let late = row(1, 1, OrderStatus::Late, Some(d(2026, 3, 9)), 4.0);
        let soon = row(2, 1, OrderStatus::DueSoon, Some(d(2026, 3, 12)), 4.0);
        let mut past = row(3, 1, OrderStatus::Late, Some(d(2026, 3, 1)), 4.0);
        past.work_unit_start = Some(d(2026, 3, 5));

        let alerts = row_alerts(&[late, soon, past], &[], today);
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].severity, AlertSeverity::Critical);
        assert_eq!(alerts[1].severity, AlertSeverity::Warning);
    }

    #[test]
    fn test_rank_alerts_order_and_cap() {
        let mk = |kind, severity, date: Option<NaiveDate>, title: &str| Alert {
            kind,
            severity,
            title: title.to_string(),
            detail: String::new(),
            date,
            stretch_id: None,
            stretch_code: None,
            work_unit_id: None,
            material_id: None,
        };
        let mut alerts = vec![
            mk(AlertKind::Completed, AlertSeverity::Info, None, "c"),
            mk(AlertKind::Delay, AlertSeverity::Warning, None, "b"),
            mk(AlertKind::Shortage, AlertSeverity::Warning, Some(d(2026, 3, 2)), "a"),
            mk(AlertKind::DeliveryLate, AlertSeverity::Critical, Some(d(2026, 3, 9)), "z"),
        ];
        rank_alerts(&mut alerts, 3);
        let titles: Vec<&str> = alerts.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["z", "a", "b"]);
    }
}
