// ==========================================
// 施工材料预测系统 - 到货风险判定引擎
// ==========================================
// 职责: 按下单日 + 提前期推算到货日，并与开工日比较
// 状态: UNKNOWN / LATE / AVAILABLE / PENDING（按此顺序判定，命中即返回）
// 红线: 边界不等式决定告警分级，不可随意改成 >= / <
// ==========================================

use crate::domain::forecast::DeliveryCheck;
use crate::domain::numeric::shift_days;
use crate::domain::types::DeliveryStatus;
use chrono::NaiveDate;

/// 预计到货日 = 下单日 + 提前期（负提前期按 0 处理，日期越界为空）
pub fn expected_delivery(order_date: Option<NaiveDate>, lead_time_days: i64) -> Option<NaiveDate> {
    order_date.and_then(|d| shift_days(d, lead_time_days.max(0)))
}

/// 判定到货风险
///
/// 规则:
/// 1) 缺少开工日 → UNKNOWN
/// 2) 缺少下单日或预计到货日 → UNKNOWN
/// 3) 预计到货 > 开工日 → LATE，days_late = 到货 - 开工
/// 4) 预计到货 ≤ today → AVAILABLE
/// 5) 其他 → PENDING
pub fn evaluate(
    work_unit_start: Option<NaiveDate>,
    order_date: Option<NaiveDate>,
    expected_delivery: Option<NaiveDate>,
    today: NaiveDate,
) -> DeliveryCheck {
    let unknown = DeliveryCheck {
        expected_delivery,
        is_risk: false,
        days_late: 0,
        status: DeliveryStatus::Unknown,
    };

    let Some(start) = work_unit_start else {
        return unknown;
    };
    let (Some(_), Some(expected)) = (order_date, expected_delivery) else {
        return unknown;
    };

    if expected > start {
        return DeliveryCheck {
            expected_delivery,
            is_risk: true,
            days_late: (expected - start).num_days().max(0),
            status: DeliveryStatus::Late,
        };
    }

    let status = if expected <= today {
        DeliveryStatus::Available
    } else {
        DeliveryStatus::Pending
    };

    DeliveryCheck {
        expected_delivery,
        is_risk: false,
        days_late: 0,
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_expected_delivery() {
        assert_eq!(expected_delivery(Some(d(2026, 3, 1)), 5), Some(d(2026, 3, 6)));
        assert_eq!(expected_delivery(Some(d(2026, 3, 1)), -2), Some(d(2026, 3, 1)));
        assert_eq!(expected_delivery(None, 5), None);
        // 越过日期上限时视为未知
        assert_eq!(expected_delivery(Some(NaiveDate::MAX), 1), None);
        assert_eq!(expected_delivery(Some(d(2026, 3, 1)), i64::MAX), None);
    }

    #[test]
    fn test_unknown_without_start_or_order() {
        let today = d(2026, 3, 10);
        let check = evaluate(None, Some(today), Some(today), today);
        assert_eq!(check.status, DeliveryStatus::Unknown);

        let check = evaluate(Some(today), None, Some(today), today);
        assert_eq!(check.status, DeliveryStatus::Unknown);
        assert!(!check.is_risk);
    }

    #[test]
    fn test_late_when_delivery_after_start() {
        let today = d(2026, 3, 10);
        let check = evaluate(Some(d(2026, 3, 12)), Some(today), Some(d(2026, 3, 15)), today);
        assert_eq!(check.status, DeliveryStatus::Late);
        assert!(check.is_risk);
        assert_eq!(check.days_late, 3);
    }

    #[test]
    fn test_boundaries() {
        let today = d(2026, 3, 10);
        // 到货日 == 开工日: 不算迟到
        let check = evaluate(Some(d(2026, 3, 15)), Some(today), Some(d(2026, 3, 15)), today);
        assert_eq!(check.status, DeliveryStatus::Pending);

        // 到货日 == today: 已到货
        let check = evaluate(Some(d(2026, 3, 15)), Some(d(2026, 3, 1)), Some(today), today);
        assert_eq!(check.status, DeliveryStatus::Available);
    }
}
